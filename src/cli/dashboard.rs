//! Dashboard, review list and weekly insight commands

use super::context::Context;
use super::facets::FacetArgs;
use super::render;
use feedback_dash_core::{
    DashboardError, DashboardQueries, DashboardView, QueryKind, QueryState, Result,
};
use tracing::debug;

fn queries(ctx: &Context) -> DashboardQueries {
    DashboardQueries::new(
        ctx.api.clone(),
        ctx.session.clone(),
        ctx.config.cache_capacity,
    )
}

/// Handle `feedback dashboard`
pub async fn show(ctx: &Context, facets: &FacetArgs) -> Result<()> {
    let filters = facets.to_filters();
    debug!("Mounting dashboard with {}", filters);

    let queries = queries(ctx);
    queries.mount(filters.clone()).await?;
    let snapshot = queries.snapshot().await;

    match snapshot.view() {
        DashboardView::Loading => Err(DashboardError::Other(
            "Dashboard did not finish loading".to_string(),
        )),
        DashboardView::Failed { message } => {
            eprintln!("Retry with `feedback dashboard` or sign out with `feedback logout`.");
            Err(DashboardError::Other(format!(
                "Error loading dashboard: {message}"
            )))
        }
        DashboardView::Ready(view) => {
            println!("Filters: {}\n", filters);
            print!("{}", render::metrics(view.metrics));
            println!("\nWeekly insight:\n  {}\n", view.insight);
            println!("Sentiment trend:");
            print!("{}", render::trend(&view.metrics.monthly_trend));
            println!("\nRating distribution:");
            print!("{}", render::distribution(view.metrics));
            println!("\nRecent reviews ({}):", view.reviews.len());
            for review in view.reviews {
                print!("{}", render::review(review));
            }
            Ok(())
        }
    }
}

/// Handle `feedback reviews`
pub async fn reviews(ctx: &Context, facets: &FacetArgs) -> Result<()> {
    let filters = facets.to_filters();
    let queries = queries(ctx);
    queries.load(&filters, &[QueryKind::Reviews]).await?;

    match queries.snapshot().await.reviews {
        QueryState::Ready(reviews) if reviews.is_empty() => {
            println!("No reviews match {}", filters);
            Ok(())
        }
        QueryState::Ready(reviews) => {
            for review in &reviews {
                print!("{}", render::review(review));
            }
            Ok(())
        }
        QueryState::Failed { message } => Err(DashboardError::Other(message)),
        _ => Ok(()),
    }
}

/// Handle `feedback insight`
pub async fn insight(ctx: &Context, refresh: bool) -> Result<()> {
    let queries = queries(ctx);
    if refresh {
        queries.refresh_insight().await?;
    } else {
        queries.load_insight().await?;
    }

    let snapshot = queries.snapshot().await;
    if let Some(message) = snapshot.insight.error() {
        return Err(DashboardError::Other(message.to_string()));
    }
    let summary = snapshot
        .insight
        .value()
        .map(|i| i.summary.clone())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| feedback_dash_core::types::INSIGHT_PLACEHOLDER.to_string());
    println!("{summary}");
    Ok(())
}
