//! Dashboard panels
//!
//! Each panel borrows the data it shows and renders itself into an area.
//!
//! Current panels:
//! - Login: credential form shown while unauthenticated
//! - Status: full-view loading and error states
//! - Header: title, session and export button state
//! - Filter bar: active facets and the search input
//! - Overview: KPIs and the weekly insight
//! - Trend: monthly sentiment breakdown
//! - Distribution: rating histogram
//! - Reviews: review list with per-row note threads

pub mod distribution;
pub mod filter_bar;
pub mod header;
pub mod login;
pub mod overview;
pub mod reviews;
pub mod status;
pub mod trend;

pub use distribution::DistributionPanel;
pub use filter_bar::FilterBar;
pub use header::HeaderPanel;
pub use login::LoginPanel;
pub use overview::OverviewPanel;
pub use reviews::ReviewsPanel;
pub use status::{ErrorScreen, LoadingScreen};
pub use trend::TrendPanel;
