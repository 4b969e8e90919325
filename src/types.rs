//! Core data types for the feedback dashboard
//!
//! Facet value types (rating, sentiment, aspect, month) and the read-only
//! records served by the feedback backend.

use crate::error::DashboardError;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Shown in place of the weekly insight until one is available
pub const INSIGHT_PLACEHOLDER: &str = "Generating weekly comparison...";

/// Star rating, always within 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Construct a rating, rejecting values outside 1..=5
    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// All ratings, highest first (the order the facet selector offers them)
    pub fn all_descending() -> impl Iterator<Item = Rating> {
        (Self::MIN..=Self::MAX).rev().map(Rating)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Rating {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(Rating::new)
            .ok_or_else(|| DashboardError::validation(format!("invalid rating: {s:?}")))
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Rating::new(value)
            .ok_or_else(|| de::Error::custom(format!("rating {value} out of range 1..=5")))
    }
}

/// Display tone derived from a star rating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingTone {
    Positive,
    Neutral,
    Negative,
}

impl RatingTone {
    pub fn of(rating: u8) -> Self {
        match rating {
            4..=u8::MAX => Self::Positive,
            3 => Self::Neutral,
            _ => Self::Negative,
        }
    }
}

/// Server-assigned sentiment label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Self::Positive, Self::Neutral, Self::Negative];

    /// Wire value, as the backend stores it
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Neutral => "Neutral",
            Self::Negative => "Negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DashboardError::validation(format!("unknown sentiment: {s:?}")))
    }
}

/// Server-assigned topic tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Aspect {
    Service,
    Food,
    Ambience,
    Time,
    Price,
}

impl Aspect {
    pub const ALL: [Aspect; 5] = [
        Self::Service,
        Self::Food,
        Self::Ambience,
        Self::Time,
        Self::Price,
    ];

    /// Wire value, matched as a substring of the encoded aspect list server-side
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Service => "Service",
            Self::Food => "Food",
            Self::Ambience => "Ambience",
            Self::Time => "Time",
            Self::Price => "Price",
        }
    }

    /// Human-facing label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Time => "Waiting Time",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aspect {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s) || v.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| DashboardError::validation(format!("unknown aspect: {s:?}")))
    }
}

/// Calendar month in `YYYY-MM` form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The month immediately before this one
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || DashboardError::validation(format!("invalid month {s:?}, expected YYYY-MM"));
        if s.len() != 7 || s.as_bytes()[4] != b'-' {
            return Err(invalid());
        }
        NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
            .map(Month::from_date)
            .map_err(|_| invalid())
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Review identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(pub i64);

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Admin note identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub i64);

/// Decoded aspect tags of a review
///
/// The backend stores aspects as a JSON-encoded string; anything that does
/// not decode to a list of strings yields [`AspectTags::Empty`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AspectTags {
    Decoded(Vec<String>),
    Empty,
}

impl AspectTags {
    pub fn decode(encoded: Option<&str>) -> Self {
        let Some(raw) = encoded.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::Empty;
        };
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(tags) if !tags.is_empty() => Self::Decoded(tags),
            Ok(_) => Self::Empty,
            Err(e) => {
                debug!("Ignoring malformed aspect list {:?}: {}", raw, e);
                Self::Empty
            }
        }
    }

    pub fn tags(&self) -> &[String] {
        match self {
            Self::Decoded(tags) => tags,
            Self::Empty => &[],
        }
    }
}

/// A customer review as served to the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub rating: u8,
    pub content: String,
    #[serde(default)]
    pub sentiment: Option<String>,
    /// JSON-encoded list of aspect tags
    #[serde(default)]
    pub aspects: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default, rename = "suggestedAction")]
    pub suggested_action: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: NaiveDateTime,
}

impl Review {
    pub fn aspect_tags(&self) -> AspectTags {
        AspectTags::decode(self.aspects.as_deref())
    }

    /// Parsed sentiment label, `None` when missing or unrecognized
    pub fn sentiment_label(&self) -> Option<Sentiment> {
        self.sentiment.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn tone(&self) -> RatingTone {
        RatingTone::of(self.rating)
    }
}

/// Private admin annotation attached to a review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub review_id: ReviewId,
    #[serde(default)]
    pub admin_id: Option<i64>,
    pub content: String,
    pub created_at: NaiveDateTime,
}

impl Note {
    pub fn formatted_timestamp(&self) -> String {
        self.created_at.format("%Y-%m-%d %H:%M").to_string()
    }
}

/// One month of the sentiment trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentBucket {
    pub month: String,
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub avg_rating: f64,
}

impl SentimentBucket {
    pub fn total(&self) -> u64 {
        self.positive + self.neutral + self.negative
    }
}

/// Aggregate analytics for the current facet selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_reviews: u64,
    pub average_rating: f64,
    #[serde(deserialize_with = "deserialize_distribution")]
    pub rating_distribution: BTreeMap<Rating, u64>,
    #[serde(default)]
    pub monthly_trend: Vec<SentimentBucket>,
}

impl DashboardMetrics {
    /// Count for a rating, zero when the server omitted it
    pub fn count_for(&self, rating: Rating) -> u64 {
        self.rating_distribution.get(&rating).copied().unwrap_or(0)
    }
}

fn deserialize_distribution<'de, D>(deserializer: D) -> Result<BTreeMap<Rating, u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, u64>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, count)| {
            let rating = key.parse::<Rating>().map_err(de::Error::custom)?;
            Ok((rating, count))
        })
        .collect()
}

/// AI-generated week-over-week summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyInsight {
    pub summary: String,
}

/// Review submitted by an end user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewReview {
    pub rating: u8,
    pub content: String,
}

impl NewReview {
    pub fn validate(&self) -> crate::Result<()> {
        if Rating::new(self.rating).is_none() {
            return Err(DashboardError::validation("Rating must be between 1 and 5"));
        }
        if self.content.trim().is_empty() {
            return Err(DashboardError::validation("Review content is required"));
        }
        Ok(())
    }
}
