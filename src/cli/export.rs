//! Monthly report export command

use super::context::Context;
use super::facets::FacetArgs;
use feedback_dash_core::export::EXPORT_FAILED;
use feedback_dash_core::{ErrorKind, ReportExporter, Result};
use std::path::PathBuf;

/// Handle `feedback export`
pub async fn handle(ctx: &Context, facets: &FacetArgs, out: Option<PathBuf>) -> Result<()> {
    let filters = facets.to_filters();
    let dir = out.unwrap_or_else(|| ctx.config.download_dir.clone());
    let exporter = ReportExporter::new(ctx.api.clone(), ctx.session.clone(), dir);

    match exporter.export(&filters).await {
        Ok(report) => {
            println!(
                "Saved {} ({} bytes)",
                report.path.display(),
                report.bytes
            );
            Ok(())
        }
        Err(e) => {
            if e.kind() == ErrorKind::Service {
                eprintln!("{EXPORT_FAILED}");
            }
            Err(e)
        }
    }
}
