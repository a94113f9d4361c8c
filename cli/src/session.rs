//! One scan session: browser lifecycle, login, scan, reports.

use anyhow::Context;
use chrono::Local;
use locascan_browser::{BrowserActions, BrowserEngine, LaunchOptions};
use locascan_core::{RunSummary, ScanConfig, ScanRun};
use locascan_scanner::{ScanOrchestrator, ScreenshotStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// What a finished session produced.
pub struct SessionOutcome {
    run: ScanRun,
    reports: Vec<PathBuf>,
    screenshots: PathBuf,
}

impl SessionOutcome {
    /// Print the summary for the operator.
    pub fn print(&self) {
        let RunSummary {
            pages_attempted,
            states_captured,
            issues,
            failed_states,
            skipped_states,
        } = self.run.summary();

        println!();
        println!(
            "Scan {}{}",
            self.run.run_id,
            if self.run.cancelled { " (cancelled)" } else { "" }
        );
        println!("  pages attempted:  {pages_attempted}");
        println!("  states captured:  {states_captured}");
        println!("  missing translations: {issues}");
        println!("  failed states:    {failed_states}");
        println!("  skipped states:   {skipped_states}");

        let unscanned: Vec<_> = self.run.unsuccessful().collect();
        if !unscanned.is_empty() {
            println!("\nNot fully scanned:");
            for entry in unscanned {
                let state = match &entry.modal_name {
                    Some(modal) => format!("{} / {}", entry.page_name, modal),
                    None => entry.page_name.clone(),
                };
                let reason = entry.reason.map(|r| r.to_string()).unwrap_or_default();
                println!("  {state:<40} {:?} {reason}", entry.phase);
            }
        }

        println!("\nScreenshots: {}", self.screenshots.display());
        for report in &self.reports {
            println!("Report: {}", report.display());
        }
    }
}

/// `<root>/<timestamp>`, so every session gets its own directory.
pub fn session_dir(root: &str, stamp: &str) -> PathBuf {
    Path::new(root).join(stamp)
}

/// Navigate to the login page and wait for the operator to press Enter.
async fn manual_login(browser: &BrowserEngine, url: &str) -> anyhow::Result<()> {
    info!("Opening login page {}", url);
    browser
        .navigate(url)
        .await
        .with_context(|| format!("opening login page {url}"))?;

    println!("\nLog in in the browser window, then press Enter to start the scan.");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("reading from stdin")?;
    info!("Login confirmed, starting scan");
    Ok(())
}

/// Launch the browser, scan, close the browser, write reports.
///
/// The browser is closed on every path once it has been launched.
pub async fn run(config: &ScanConfig, login: bool) -> anyhow::Result<SessionOutcome> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let screenshots = session_dir(&config.output.screenshot_dir, &stamp);
    let reports_dir = session_dir(&config.output.reports_dir, &stamp);

    let engine = BrowserEngine::launch(LaunchOptions::from_config(config))
        .await
        .context("launching browser")?;
    let browser = Arc::new(engine);

    let scanned = scan(config, login, browser.clone(), &screenshots).await;

    match Arc::try_unwrap(browser) {
        Ok(engine) => {
            if let Err(e) = engine.close().await {
                warn!("Browser did not shut down cleanly: {}", e);
            }
        }
        Err(_) => warn!("Browser still in use, leaving it to be dropped"),
    }

    let run = scanned?;
    let reports = locascan_report::write_reports(
        &run,
        &reports_dir,
        &config.output.formats,
        &config.application.name,
    )
    .await
    .context("writing reports")?;

    Ok(SessionOutcome {
        run,
        reports,
        screenshots,
    })
}

async fn scan(
    config: &ScanConfig,
    login: bool,
    browser: Arc<BrowserEngine>,
    screenshots: &Path,
) -> anyhow::Result<ScanRun> {
    match (&config.application.login_url, login) {
        (Some(url), true) if config.application.headless => {
            warn!("Headless browser, skipping manual login at {}", url);
        }
        (Some(url), true) => manual_login(&browser, url).await?,
        _ => {}
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    let signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing the current state and stopping");
            on_signal.cancel();
        }
    });

    let orchestrator =
        ScanOrchestrator::from_config(browser, config, ScreenshotStore::new(screenshots))
            .context("setting up scanner")?
            .with_cancellation(cancel);
    let run = orchestrator.run(config).await;
    signal.abort();
    Ok(run?)
}
