//! `locascan`: scan a web application for text that was never translated.

mod session;

use anyhow::Context;
use clap::Parser;
use locascan_core::ScanConfig;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Find untranslated UI text by screenshotting pages and modals and running OCR.
#[derive(Debug, Parser)]
#[command(name = "locascan", version, about)]
pub struct Cli {
    /// Scan configuration (.toml, .yaml or .yml)
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: PathBuf,

    /// Log polling and classification detail
    #[arg(short, long)]
    pub verbose: bool,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,

    /// Skip the manual login step
    #[arg(long)]
    pub no_login: bool,

    /// Secrets file (e.g. `GOOGLE_VISION_API_KEY`); existing variables win
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,
}

/// Initialize tracing subscriber for logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = if verbose {
        "debug"
    } else {
        "info,locascan=debug"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(verbose))
        .with(filter)
        .init();
}

/// Load variables from an env file. Returns whether the file was read.
fn load_env_file(path: &Path) -> bool {
    match dotenvy::from_path(path) {
        Ok(()) => {
            info!("Loaded environment from {}", path.display());
            true
        }
        Err(e) if e.not_found() => {
            debug!("No env file at {}, using the process environment", path.display());
            false
        }
        Err(e) => {
            warn!("Could not read env file {}: {}", path.display(), e);
            false
        }
    }
}

/// Load, override and validate the configuration.
fn load_config(cli: &Cli) -> anyhow::Result<ScanConfig> {
    let mut config = ScanConfig::load_with_env(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if cli.headless {
        config.application.headless = true;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    info!("Starting locascan v{}", env!("CARGO_PKG_VERSION"));

    load_env_file(&cli.env_file);
    let config = load_config(&cli)?;
    match session::run(&config, !cli.no_login).await {
        Ok(outcome) => {
            outcome.print();
            Ok(())
        }
        Err(e) => {
            error!("Scan failed: {:#}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["locascan"]).expect("parse");
        assert_eq!(cli.config, PathBuf::from("config/config.yaml"));
        assert!(!cli.verbose);
        assert!(!cli.headless);
        assert!(!cli.no_login);
        assert_eq!(cli.env_file, PathBuf::from(".env"));
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "locascan",
            "--config",
            "scan.toml",
            "-v",
            "--headless",
            "--no-login",
        ])
        .expect("parse");
        assert_eq!(cli.config, PathBuf::from("scan.toml"));
        assert!(cli.verbose && cli.headless && cli.no_login);
    }

    #[test]
    fn test_load_config_applies_headless_flag() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scan.toml");
        std::fs::write(
            &path,
            "[application]\nbase_url = \"https://app.example.com\"\n\n\
             [[pages]]\nname = \"Dashboard\"\nurl_path = \"/dashboard\"\n",
        )
        .expect("write config");

        let cli = Cli::try_parse_from([
            "locascan",
            "--config",
            path.to_str().expect("utf-8 path"),
            "--headless",
        ])
        .expect("parse");
        let config = load_config(&cli).expect("load");
        assert!(config.application.headless);
        assert_eq!(config.pages.len(), 1);
    }

    #[test]
    fn test_env_file_is_loaded_without_overriding() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "LOCASCAN_ENV_FILE_MARKER=from-file\nPATH=from-file\n",
        )
        .expect("write env file");

        assert!(load_env_file(&path));
        assert_eq!(
            std::env::var("LOCASCAN_ENV_FILE_MARKER").as_deref(),
            Ok("from-file")
        );
        assert_ne!(std::env::var("PATH").as_deref(), Ok("from-file"));

        assert!(!load_env_file(&dir.path().join("missing.env")));
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scan.yaml");
        std::fs::write(&path, "application:\n  base_url: \"\"\n").expect("write config");

        let cli = Cli::try_parse_from(["locascan", "-c", path.to_str().expect("utf-8 path")])
            .expect("parse");
        let err = load_config(&cli).expect_err("invalid");
        assert!(format!("{err:#}").contains("invalid configuration"));
    }
}
