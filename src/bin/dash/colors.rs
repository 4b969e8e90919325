//! Consistent color palette for the dashboard

use feedback_dash_core::types::RatingTone;
use feedback_dash_core::Sentiment;
use ratatui::style::Color;

/// Color palette for dashboard elements
pub struct DashboardColors;

impl DashboardColors {
    // === Tone Colors ===

    /// Positive sentiment, ratings of 4 and above (Green)
    pub const POSITIVE: Color = Color::Green;

    /// Neutral sentiment, 3-star ratings (Yellow)
    pub const NEUTRAL: Color = Color::Yellow;

    /// Negative sentiment, ratings of 2 and below (Red)
    pub const NEGATIVE: Color = Color::Red;

    // === UI Elements ===

    /// Panel borders (Cyan)
    pub const BORDER: Color = Color::Cyan;

    /// Headers and labels (Yellow)
    pub const HEADER: Color = Color::Yellow;

    /// Loading indicators (Blue)
    pub const LOADING: Color = Color::Blue;

    /// Secondary text (DarkGray)
    pub const SECONDARY: Color = Color::DarkGray;

    /// Primary text (White)
    pub const TEXT: Color = Color::White;

    /// Selection and focused input (Cyan)
    pub const HIGHLIGHT: Color = Color::Cyan;

    /// Alerts and failures (Red)
    pub const ERROR: Color = Color::Red;

    pub fn tone(tone: RatingTone) -> Color {
        match tone {
            RatingTone::Positive => Self::POSITIVE,
            RatingTone::Neutral => Self::NEUTRAL,
            RatingTone::Negative => Self::NEGATIVE,
        }
    }

    pub fn sentiment(sentiment: Option<Sentiment>) -> Color {
        match sentiment {
            Some(Sentiment::Positive) => Self::POSITIVE,
            Some(Sentiment::Neutral) => Self::NEUTRAL,
            Some(Sentiment::Negative) => Self::NEGATIVE,
            None => Self::SECONDARY,
        }
    }
}
