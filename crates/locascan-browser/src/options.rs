use locascan_core::ScanConfig;
use std::time::Duration;

/// Launch settings for the browser engine
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: Option<String>,
    pub navigation_timeout: Duration,
}

impl LaunchOptions {
    /// Derive launch settings from the scan configuration
    #[must_use]
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            headless: config.application.headless,
            viewport_width: config.browser.width,
            viewport_height: config.browser.height,
            user_agent: config.browser.user_agent.clone(),
            navigation_timeout: Duration::from_millis(config.application.default_timeout_ms),
        }
    }

    /// Extra Chromium command-line arguments
    pub(crate) fn chromium_args(&self) -> Vec<String> {
        let mut args = vec!["--disable-gpu".to_string()];
        if let Some(ua) = &self.user_agent {
            args.push(format!("--user-agent={ua}"));
        }
        args
    }
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            user_agent: None,
            navigation_timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let mut config = ScanConfig::default();
        config.application.headless = true;
        config.browser.width = 1366;
        config.browser.user_agent = Some("LocascanBot/1.0".to_string());

        let opts = LaunchOptions::from_config(&config);
        assert!(opts.headless);
        assert_eq!(opts.viewport_width, 1366);
        assert_eq!(opts.navigation_timeout, Duration::from_secs(30));
        assert!(opts
            .chromium_args()
            .contains(&"--user-agent=LocascanBot/1.0".to_string()));
    }

    #[test]
    fn test_default_has_no_user_agent_arg() {
        let opts = LaunchOptions::default();
        assert!(!opts.chromium_args().iter().any(|a| a.starts_with("--user-agent")));
    }
}
