//! Feedback Dash - admin analytics client for the customer-feedback service
//!
//! Client-side orchestration for a faceted review analytics dashboard:
//! - Facet filter state and query-parameter derivation
//! - Three independently cached, generation-tagged dashboard queries
//! - Lazily loaded per-review admin note threads
//! - Single-flight monthly report export
//! - A session guard that forces logout when the backend rejects the token
//!
//! # Architecture
//!
//! - **Types**: facet values and server records
//! - **Filters**: immutable [`FilterState`] snapshots
//! - **Query / Notes / Export**: orchestration over the [`FeedbackApi`] seam
//! - **Client**: reqwest implementation of [`FeedbackApi`]
//! - **Session**: bearer token lifecycle
//!
//! # Example
//!
//! ```ignore
//! use feedback_dash_core::{DashboardQueries, FilterState, HttpFeedbackApi, SessionGuard};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let session = Arc::new(SessionGuard::in_memory());
//!     let api = Arc::new(HttpFeedbackApi::new(
//!         "http://localhost:8000",
//!         std::time::Duration::from_secs(30),
//!         session.clone(),
//!     )?);
//!     api.login("admin", "secret").await?;
//!
//!     let queries = DashboardQueries::new(api, session, 32);
//!     queries.mount(FilterState::new()).await?;
//!     println!("{:?}", queries.snapshot().await.view());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod filters;
pub mod logging;
pub mod notes;
pub mod query;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use client::{FeedbackApi, HttpFeedbackApi};
pub use config::DashboardConfig;
pub use error::{DashboardError, ErrorKind, Result};
pub use export::{ExportedReport, ReportExporter};
pub use filters::{Facet, FilterState};
pub use notes::{NotesBook, ThreadState, ThreadView};
pub use query::{DashboardQueries, DashboardSnapshot, DashboardView, QueryKind, QueryState};
pub use session::{SessionGuard, SessionState};
pub use types::{
    Aspect, DashboardMetrics, Month, NewReview, Note, Rating, Review, ReviewId, Sentiment,
    WeeklyInsight,
};
