//! Facet filter state for the dashboard
//!
//! [`FilterState`] is an immutable snapshot of the active facet selection.
//! Every setter returns a new snapshot; the snapshot is the sole input to the
//! metrics and review queries and to the report export.
//!
//! Unset facets are `None` (or an empty search string) and are never turned
//! into query parameters.

use crate::types::{Aspect, Month, Rating, Sentiment};
use chrono::NaiveDate;
use std::fmt;
use tracing::debug;

/// Outgoing query parameters, in a stable order
pub type QueryParams = Vec<(&'static str, String)>;

/// One independent filter dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    MinRating,
    Search,
    Month,
    Sentiment,
    Aspect,
}

impl Facet {
    pub const ALL: [Facet; 5] = [
        Self::MinRating,
        Self::Search,
        Self::Month,
        Self::Sentiment,
        Self::Aspect,
    ];

    /// Query-string parameter name
    pub fn param_name(&self) -> &'static str {
        match self {
            Self::MinRating => "min_rating",
            Self::Search => "search",
            Self::Month => "month",
            Self::Sentiment => "sentiment",
            Self::Aspect => "aspect",
        }
    }
}

/// Immutable snapshot of the facet selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterState {
    min_rating: Option<Rating>,
    search: String,
    month: Option<Month>,
    sentiment: Option<Sentiment>,
    aspect: Option<Aspect>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_rating(&self) -> Option<Rating> {
        self.min_rating
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn month(&self) -> Option<Month> {
        self.month
    }

    pub fn sentiment(&self) -> Option<Sentiment> {
        self.sentiment
    }

    pub fn aspect(&self) -> Option<Aspect> {
        self.aspect
    }

    pub fn with_min_rating(&self, min_rating: Option<Rating>) -> Self {
        Self {
            min_rating,
            ..self.clone()
        }
    }

    pub fn with_search(&self, search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..self.clone()
        }
    }

    pub fn with_month(&self, month: Option<Month>) -> Self {
        Self {
            month,
            ..self.clone()
        }
    }

    pub fn with_sentiment(&self, sentiment: Option<Sentiment>) -> Self {
        Self {
            sentiment,
            ..self.clone()
        }
    }

    pub fn with_aspect(&self, aspect: Option<Aspect>) -> Self {
        Self {
            aspect,
            ..self.clone()
        }
    }

    /// Set the rating facet from raw input; anything unparseable means unset
    pub fn with_min_rating_text(&self, text: &str) -> Self {
        self.with_min_rating(coerce(Facet::MinRating, text))
    }

    /// Set the month facet from raw input; anything unparseable means unset
    pub fn with_month_text(&self, text: &str) -> Self {
        self.with_month(coerce(Facet::Month, text))
    }

    /// Set the sentiment facet from raw input; anything unparseable means unset
    pub fn with_sentiment_text(&self, text: &str) -> Self {
        self.with_sentiment(coerce(Facet::Sentiment, text))
    }

    /// Set the aspect facet from raw input; anything unparseable means unset
    pub fn with_aspect_text(&self, text: &str) -> Self {
        self.with_aspect(coerce(Facet::Aspect, text))
    }

    /// Snapshot with every facet unset
    pub fn cleared(&self) -> Self {
        Self::default()
    }

    pub fn is_set(&self, facet: Facet) -> bool {
        match facet {
            Facet::MinRating => self.min_rating.is_some(),
            Facet::Search => !self.search.is_empty(),
            Facet::Month => self.month.is_some(),
            Facet::Sentiment => self.sentiment.is_some(),
            Facet::Aspect => self.aspect.is_some(),
        }
    }

    /// Facets currently constraining the selection
    pub fn set_facets(&self) -> Vec<Facet> {
        Facet::ALL.into_iter().filter(|f| self.is_set(*f)).collect()
    }

    /// Facets whose value differs between two snapshots
    pub fn changed_facets(&self, other: &FilterState) -> Vec<Facet> {
        Facet::ALL
            .into_iter()
            .filter(|facet| match facet {
                Facet::MinRating => self.min_rating != other.min_rating,
                Facet::Search => self.search != other.search,
                Facet::Month => self.month != other.month,
                Facet::Sentiment => self.sentiment != other.sentiment,
                Facet::Aspect => self.aspect != other.aspect,
            })
            .collect()
    }

    fn param_value(&self, facet: Facet) -> Option<String> {
        match facet {
            Facet::MinRating => self.min_rating.map(|r| r.to_string()),
            Facet::Search => (!self.search.is_empty()).then(|| self.search.clone()),
            Facet::Month => self.month.map(|m| m.to_string()),
            Facet::Sentiment => self.sentiment.map(|s| s.as_str().to_string()),
            Facet::Aspect => self.aspect.map(|a| a.as_str().to_string()),
        }
    }

    fn params_for(&self, facets: &[Facet]) -> QueryParams {
        facets
            .iter()
            .filter_map(|f| self.param_value(*f).map(|v| (f.param_name(), v)))
            .collect()
    }

    /// Parameters for the metrics and review list endpoints
    pub fn query_params(&self) -> QueryParams {
        self.params_for(&Facet::ALL)
    }

    /// Parameters for the report endpoint; the month travels in the path
    pub fn report_params(&self) -> QueryParams {
        self.params_for(&[
            Facet::MinRating,
            Facet::Search,
            Facet::Sentiment,
            Facet::Aspect,
        ])
    }
}

impl fmt::Display for FilterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self.query_params();
        if params.is_empty() {
            return f.write_str("no filters");
        }
        let parts: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        f.write_str(&parts.join(", "))
    }
}

fn coerce<T>(facet: Facet, text: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match text.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!("Treating unparseable {} input {:?} as unset", facet.param_name(), text);
            None
        }
    }
}

/// The month containing `today` followed by the preceding months, newest first
pub fn recent_months(today: NaiveDate, count: usize) -> Vec<Month> {
    std::iter::successors(Some(Month::from_date(today)), |m| Some(m.previous()))
        .take(count)
        .collect()
}

/// Step a selector through `None` and each option in turn
pub fn cycle<T: Copy + PartialEq>(options: &[T], current: Option<T>) -> Option<T> {
    match current.and_then(|c| options.iter().position(|o| *o == c)) {
        None => options.first().copied(),
        Some(i) => options.get(i + 1).copied(),
    }
}
