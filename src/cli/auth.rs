//! Login, logout and session status commands

use super::context::Context;
use feedback_dash_core::{DashboardError, Result, SessionState};
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Handle `feedback login`
pub async fn login(ctx: &Context, username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_password()?,
    };
    if password.is_empty() {
        return Err(DashboardError::Validation("Password is required".into()));
    }

    ctx.api.login(username, &password).await?;
    println!("Logged in as {} at {}", username, ctx.api.base_url());
    if let Some(path) = ctx.session.store_path() {
        debug!("Session stored at {}", path.display());
    }
    Ok(())
}

fn prompt_password() -> Result<String> {
    print!("Password: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

/// Handle `feedback logout`
pub fn logout(ctx: &Context) -> Result<()> {
    ctx.session.logout()?;
    println!("Logged out");
    Ok(())
}

/// Handle `feedback status`
pub fn status(ctx: &Context) -> Result<()> {
    println!("Feedback Dash v{}", env!("CARGO_PKG_VERSION"));
    println!("  API:     {}", ctx.api.base_url());
    let state = match ctx.session.state() {
        SessionState::Authenticated => "logged in",
        SessionState::Unauthenticated => "not logged in",
    };
    println!("  Session: {}", state);
    if let Some(path) = ctx.session.store_path() {
        println!("  Token:   {}", path.display());
    }
    Ok(())
}
