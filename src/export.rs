//! Monthly report export
//!
//! Exports are gated on the month facet and single-flight: while one download
//! is outstanding further attempts are refused without a request. The other
//! set facets travel along as extra filters. The document is written to the
//! download directory as `report_<month>.pdf`.

use crate::client::FeedbackApi;
use crate::error::{DashboardError, Result};
use crate::filters::FilterState;
use crate::session::SessionGuard;
use crate::types::Month;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

pub const MONTH_REQUIRED: &str = "Please select a month first";
pub const EXPORT_FAILED: &str = "Failed to download report";

/// Artifact name for a month's report
pub fn artifact_name(month: Month) -> String {
    format!("report_{month}.pdf")
}

/// A report written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedReport {
    pub month: Month,
    pub path: PathBuf,
    pub bytes: usize,
}

/// Resets the in-flight flag when the export finishes
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ReportExporter {
    api: Arc<dyn FeedbackApi>,
    session: Arc<SessionGuard>,
    download_dir: PathBuf,
    in_flight: AtomicBool,
}

impl ReportExporter {
    pub fn new(
        api: Arc<dyn FeedbackApi>,
        session: Arc<SessionGuard>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            api,
            session,
            download_dir: download_dir.into(),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Whether the export action can currently be triggered
    pub fn is_enabled(&self, filters: &FilterState) -> bool {
        filters.month().is_some() && !self.is_busy()
    }

    pub fn button_label(&self, filters: &FilterState) -> String {
        match filters.month() {
            _ if self.is_busy() => "Downloading...".to_string(),
            Some(month) => format!("Download {month} Report"),
            None => "Select Month to Download Report".to_string(),
        }
    }

    /// Download the report for the selected month
    ///
    /// Fails with a validation error when no month is selected and with
    /// [`DashboardError::InFlight`] while another export is running. The
    /// filter state is never modified.
    pub async fn export(&self, filters: &FilterState) -> Result<ExportedReport> {
        let Some(month) = filters.month() else {
            return Err(DashboardError::validation(MONTH_REQUIRED));
        };
        self.session.admit()?;
        let generation = self.session.generation();

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Export for {} ignored, another is running", month);
            return Err(DashboardError::InFlight("report export"));
        }
        let _flight = InFlight(&self.in_flight);

        info!("Exporting report for {} ({})", month, filters);
        let bytes = match self.api.fetch_report(month, filters).await {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!("{} for {}: {}", EXPORT_FAILED, month, error);
                if error.is_auth() {
                    self.session.expire(generation, "report export was rejected");
                }
                return Err(error);
            }
        };

        fs::create_dir_all(&self.download_dir).await?;
        let path = self.download_dir.join(artifact_name(month));
        fs::write(&path, &bytes).await?;
        info!("Saved {} ({} bytes)", path.display(), bytes.len());

        Ok(ExportedReport {
            month,
            path,
            bytes: bytes.len(),
        })
    }
}
