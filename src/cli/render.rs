//! Plain-text rendering for CLI output

use feedback_dash_core::types::{RatingTone, SentimentBucket};
use feedback_dash_core::{DashboardMetrics, Note, Rating, Review};
use std::fmt::Write;

const BAR_WIDTH: u64 = 30;

pub fn metrics(metrics: &DashboardMetrics) -> String {
    format!(
        "Total reviews:  {}\nAverage rating: {:.1} / 5\n",
        metrics.total_reviews, metrics.average_rating
    )
}

/// Horizontal bar per rating, 5 stars first
pub fn distribution(metrics: &DashboardMetrics) -> String {
    let max = Rating::all_descending()
        .map(|r| metrics.count_for(r))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for rating in Rating::all_descending() {
        let count = metrics.count_for(rating);
        let width = if max == 0 { 0 } else { count * BAR_WIDTH / max };
        let _ = writeln!(
            out,
            "{} star  {:<width$} {}",
            rating,
            "#".repeat(width as usize),
            count,
            width = BAR_WIDTH as usize
        );
    }
    out
}

pub fn trend(buckets: &[SentimentBucket]) -> String {
    if buckets.is_empty() {
        return "No trend data\n".to_string();
    }
    let mut out = String::new();
    for bucket in buckets {
        let _ = writeln!(
            out,
            "{}  positive {:>4}  neutral {:>4}  negative {:>4}",
            bucket.month, bucket.positive, bucket.neutral, bucket.negative
        );
    }
    out
}

fn tone_marker(tone: RatingTone) -> &'static str {
    match tone {
        RatingTone::Positive => "+",
        RatingTone::Neutral => "~",
        RatingTone::Negative => "-",
    }
}

pub fn review(review: &Review) -> String {
    let mut out = format!(
        "#{} [{}{} stars] {}  {}\n  {}\n",
        review.id,
        tone_marker(review.tone()),
        review.rating,
        review.sentiment.as_deref().unwrap_or("Unknown"),
        review.created_at.format("%Y-%m-%d"),
        review.content
    );

    let tags = review.aspect_tags();
    if !tags.tags().is_empty() {
        let _ = writeln!(out, "  Aspects: {}", tags.tags().join(", "));
    }
    if let Some(summary) = review.summary.as_deref().filter(|s| !s.is_empty()) {
        let _ = writeln!(out, "  Summary: {summary}");
    }
    if let Some(action) = review.suggested_action.as_deref().filter(|s| !s.is_empty()) {
        let _ = writeln!(out, "  Suggested action: {action}");
    }
    out
}

pub fn note(note: &Note) -> String {
    format!("[{}] {}", note.formatted_timestamp(), note.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use feedback_dash_core::types::{NoteId, ReviewId};
    use std::collections::BTreeMap;

    fn sample_metrics() -> DashboardMetrics {
        DashboardMetrics {
            total_reviews: 6,
            average_rating: 3.66,
            rating_distribution: BTreeMap::from([
                (Rating::new(5).unwrap(), 4),
                (Rating::new(1).unwrap(), 2),
            ]),
            monthly_trend: vec![],
        }
    }

    #[test]
    fn test_metrics_block() {
        let text = metrics(&sample_metrics());
        assert!(text.contains("Total reviews:  6"));
        assert!(text.contains("3.7 / 5"));
    }

    #[test]
    fn test_distribution_scales_to_max() {
        let text = distribution(&sample_metrics());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("5 star"));
        assert_eq!(lines[0].matches('#').count(), 30);
        assert_eq!(lines[4].matches('#').count(), 15);
        assert!(lines[2].ends_with(" 0"));
    }

    #[test]
    fn test_review_with_extras() {
        let r = Review {
            id: ReviewId(7),
            rating: 2,
            content: "Waited an hour".into(),
            sentiment: Some("Negative".into()),
            aspects: Some(r#"["Time","Service"]"#.into()),
            summary: Some("Long wait".into()),
            response: None,
            suggested_action: Some("Add staff at peak".into()),
            created_at: NaiveDate::from_ymd_opt(2024, 3, 4)
                .unwrap()
                .and_hms_opt(18, 0, 0)
                .unwrap(),
        };
        let text = review(&r);
        assert!(text.starts_with("#7 [-2 stars] Negative  2024-03-04"));
        assert!(text.contains("Aspects: Time, Service"));
        assert!(text.contains("Suggested action: Add staff at peak"));
    }

    #[test]
    fn test_note_line() {
        let n = Note {
            id: NoteId(1),
            review_id: ReviewId(7),
            admin_id: None,
            content: "Called back".into(),
            created_at: NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_opt(9, 5, 0)
                .unwrap(),
        };
        assert_eq!(note(&n), "[2024-03-05 09:05] Called back");
    }
}
