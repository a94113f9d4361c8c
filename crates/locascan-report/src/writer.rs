//! Writing reports to disk.

use crate::error::{ReportError, Result};
use crate::html::ASSETS_DIR;
use crate::{render_html, render_issues_csv, render_json, render_summary_csv};
use locascan_core::{ReportFormat, ScanRun};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File name for one report format, stamped with the run's start time.
#[must_use]
pub fn report_file_name(run: &ScanRun, format: ReportFormat) -> String {
    let stamp = run.started_at.format("%Y%m%d_%H%M%S");
    match format {
        ReportFormat::Csv => format!("localization_report_{stamp}.csv"),
        ReportFormat::SummaryCsv => format!("localization_report_{stamp}_summary.csv"),
        ReportFormat::Html => format!("localization_report_{stamp}.html"),
        ReportFormat::Json => format!("localization_report_{stamp}.json"),
    }
}

/// Write the requested formats into `dir`, creating it if needed.
///
/// A format that fails is logged and skipped; the others are still written.
/// Returns the paths written, in request order.
///
/// # Errors
/// Returns error if `dir` cannot be created or every requested format failed.
pub async fn write_reports(
    run: &ScanRun,
    dir: &Path,
    formats: &[ReportFormat],
    title: &str,
) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ReportError::io(dir, e))?;

    let mut seen = HashSet::new();
    let mut written = Vec::new();
    let mut failed = 0;

    for &format in formats {
        if !seen.insert(format) {
            continue;
        }
        let path = dir.join(report_file_name(run, format));
        match write_one(run, &path, format, title).await {
            Ok(()) => {
                tracing::info!("{:?} report written to {}", format, path.display());
                written.push(path);
            }
            Err(e) => {
                tracing::error!("Could not write {:?} report: {}", format, e);
                failed += 1;
            }
        }
    }

    if written.is_empty() && failed > 0 {
        return Err(ReportError::AllFailed(failed));
    }
    Ok(written)
}

async fn write_one(run: &ScanRun, path: &Path, format: ReportFormat, title: &str) -> Result<()> {
    let content = match format {
        ReportFormat::Csv => render_issues_csv(run),
        ReportFormat::SummaryCsv => render_summary_csv(run),
        ReportFormat::Json => render_json(run)?,
        ReportFormat::Html => {
            let parent = path.parent().unwrap_or_else(|| Path::new("."));
            copy_screenshots(run, &parent.join(ASSETS_DIR)).await?;
            render_html(run, title)
        }
    };
    tokio::fs::write(path, content)
        .await
        .map_err(|e| ReportError::io(path, e))
}

/// Copy screenshots of states with issues next to the HTML report.
async fn copy_screenshots(run: &ScanRun, assets: &Path) -> Result<()> {
    tokio::fs::create_dir_all(assets)
        .await
        .map_err(|e| ReportError::io(assets, e))?;

    for state in &run.states {
        if run
            .issues_for(&state.page_name, state.modal_name.as_deref())
            .next()
            .is_none()
        {
            continue;
        }
        let source = state.screenshot_ref.path();
        let Some(name) = source.file_name() else {
            continue;
        };
        if let Err(e) = tokio::fs::copy(source, assets.join(name)).await {
            tracing::warn!("Could not copy screenshot {}: {}", source.display(), e);
        }
    }
    Ok(())
}
