//! Public review submission command

use super::context::Context;
use feedback_dash_core::{NewReview, Result};

/// Handle `feedback submit`
pub async fn handle(ctx: &Context, rating: u8, content: String) -> Result<()> {
    let review = ctx.api.submit_review(&NewReview { rating, content }).await?;

    println!("Thanks! Review #{} recorded.", review.id);
    if let Some(sentiment) = &review.sentiment {
        println!("  Sentiment: {sentiment}");
    }
    if let Some(summary) = review.summary.as_deref().filter(|s| !s.is_empty()) {
        println!("  Summary:   {summary}");
    }
    if let Some(response) = review.response.as_deref().filter(|s| !s.is_empty()) {
        println!("\n{response}");
    }
    Ok(())
}
