//! Shared state for CLI command handlers

use feedback_dash_core::{DashboardConfig, HttpFeedbackApi, Result, SessionGuard};
use std::sync::Arc;

pub struct Context {
    pub config: DashboardConfig,
    pub session: Arc<SessionGuard>,
    pub api: Arc<HttpFeedbackApi>,
}

impl Context {
    /// Restore the persisted session and build the client
    pub fn new(config: DashboardConfig) -> Result<Self> {
        let session = Arc::new(SessionGuard::persistent(&config.session_file)?);
        let api = Arc::new(HttpFeedbackApi::from_config(&config, session.clone())?);
        Ok(Self {
            config,
            session,
            api,
        })
    }
}
