//! Effective configuration command

use super::context::Context;
use feedback_dash_core::Result;

/// Handle `feedback config`
pub fn handle(ctx: &Context) -> Result<()> {
    print!("{}", ctx.config.to_toml()?);
    Ok(())
}
