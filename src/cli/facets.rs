//! Facet flags shared by the dashboard-scoped subcommands

use clap::Args;
use feedback_dash_core::FilterState;

/// Facet selection; unparseable values are treated as unset
#[derive(Args, Debug, Clone, Default)]
pub struct FacetArgs {
    /// Minimum star rating (1-5)
    #[arg(long)]
    pub min_rating: Option<String>,

    /// Free-text search over review content
    #[arg(long)]
    pub search: Option<String>,

    /// Month as YYYY-MM
    #[arg(long)]
    pub month: Option<String>,

    /// Positive, Neutral or Negative
    #[arg(long)]
    pub sentiment: Option<String>,

    /// Service, Food, Ambience, Time or Price
    #[arg(long)]
    pub aspect: Option<String>,
}

impl FacetArgs {
    pub fn to_filters(&self) -> FilterState {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        FilterState::new()
            .with_min_rating_text(&text(&self.min_rating))
            .with_search(text(&self.search).trim())
            .with_month_text(&text(&self.month))
            .with_sentiment_text(&text(&self.sentiment))
            .with_aspect_text(&text(&self.aspect))
    }
}
