use crate::actions::{BrowserActions, ElementInfo};
use crate::error::{BrowserError, Result};
use crate::options::LaunchOptions;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::stream::StreamExt;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;

/// Collects element descriptions for `query_elements`. `__SELECTOR__` is
/// replaced with a JSON string literal.
const QUERY_ELEMENTS_JS: &str = r"(() => {
  const visible = (el) => {
    const r = el.getBoundingClientRect();
    const s = window.getComputedStyle(el);
    return r.width > 0 && r.height > 0 && s.visibility !== 'hidden'
      && s.display !== 'none' && s.opacity !== '0';
  };
  const path = (el) => {
    const parts = [];
    while (el && el.nodeType === 1 && el !== document.documentElement) {
      if (el.id) { parts.unshift('#' + CSS.escape(el.id)); return parts.join(' > '); }
      let i = 1, sib = el;
      while ((sib = sib.previousElementSibling)) { if (sib.tagName === el.tagName) i++; }
      parts.unshift(el.tagName.toLowerCase() + ':nth-of-type(' + i + ')');
      el = el.parentElement;
    }
    parts.unshift('html');
    return parts.join(' > ');
  };
  const attr = (el, name) => el.getAttribute(name);
  return Array.from(document.querySelectorAll(__SELECTOR__)).map((el) => ({
    path: path(el),
    tag: el.tagName.toLowerCase(),
    text: (el.innerText || el.textContent || '').trim().slice(0, 200),
    id: el.id || null,
    classes: attr(el, 'class'),
    aria_label: attr(el, 'aria-label'),
    title: attr(el, 'title'),
    test_id: attr(el, 'data-testid'),
    role: attr(el, 'role'),
    href: attr(el, 'href'),
    visible: visible(el),
  }));
})()";

const VISIBLE_COUNT_JS: &str = r"(() => Array.from(document.querySelectorAll(__SELECTOR__))
  .filter((el) => {
    const r = el.getBoundingClientRect();
    const s = window.getComputedStyle(el);
    return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none';
  }).length)()";

/// Browser automation engine backed by Chromium over CDP.
///
/// One engine owns one browser process and one tab for the whole scan. Call
/// [`BrowserEngine::close`] when done; dropping the engine stops the event
/// handler and lets chromiumoxide kill the process.
pub struct BrowserEngine {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    options: LaunchOptions,
}

impl BrowserEngine {
    /// Launch a browser with default options
    pub async fn new() -> Result<Self> {
        Self::launch(LaunchOptions::default()).await
    }

    /// Launch a browser with specific options
    pub async fn launch(options: LaunchOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(options.viewport_width, options.viewport_height)
            .args(options.chromium_args());
        if !options.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(BrowserError::ChromiumError)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        // Spawn browser handler
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler event error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        tracing::info!(
            "Browser launched (headless={}, viewport={}x{})",
            options.headless,
            options.viewport_width,
            options.viewport_height
        );

        Ok(Self {
            browser,
            page,
            handler,
            options,
        })
    }

    /// Close the browser and wait for the process to exit
    pub async fn close(mut self) -> Result<()> {
        tracing::info!("Tearing down browser");
        let closed = self
            .browser
            .close()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()));
        let _ = self.browser.wait().await;
        self.handler.abort();
        closed.map(|_| ())
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))?;
        result
            .into_value()
            .map_err(|e| BrowserError::Script(e.to_string()))
    }

    fn with_selector(template: &str, selector: &str) -> Result<String> {
        let literal =
            serde_json::to_string(selector).map_err(|e| BrowserError::Script(e.to_string()))?;
        Ok(template.replace("__SELECTOR__", &literal))
    }
}

impl Drop for BrowserEngine {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait::async_trait]
impl BrowserActions for BrowserEngine {
    async fn navigate(&self, url: &str) -> Result<()> {
        tracing::debug!("Navigating to {}", url);
        let goto = self.page.goto(url);
        match tokio::time::timeout(self.options.navigation_timeout, goto).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::NavigationError(format!("{url}: {e}"))),
            Err(_) => Err(BrowserError::Timeout(format!(
                "navigation to {url} exceeded {:?}",
                self.options.navigation_timeout
            ))),
        }
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::SelectorNotFound(selector.to_string()))?;
        element
            .click()
            .await
            .map_err(|e| BrowserError::NotInteractable(format!("{selector}: {e}")))?;
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<()> {
        let body = self
            .page
            .find_element("body")
            .await
            .map_err(|_| BrowserError::SelectorNotFound("body".to_string()))?;
        body.press_key(key)
            .await
            .map_err(|e| BrowserError::NotInteractable(format!("key {key}: {e}")))?;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .map_err(|e| BrowserError::ChromiumError(format!("screenshot: {e}")))
    }

    async fn current_url(&self) -> Result<String> {
        self.page
            .url()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))
            .map(Option::unwrap_or_default)
    }

    async fn ready_state(&self) -> Result<String> {
        self.eval("document.readyState".to_string()).await
    }

    async fn resource_count(&self) -> Result<u64> {
        self.eval("performance.getEntriesByType('resource').length".to_string())
            .await
    }

    async fn visible_count(&self, selector: &str) -> Result<usize> {
        self.eval(Self::with_selector(VISIBLE_COUNT_JS, selector)?)
            .await
    }

    async fn query_elements(&self, selector: &str) -> Result<Vec<ElementInfo>> {
        self.eval(Self::with_selector(QUERY_ELEMENTS_JS, selector)?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_is_json_quoted() {
        let script = BrowserEngine::with_selector(VISIBLE_COUNT_JS, r#"[aria-label="Close"]"#)
            .expect("build script");
        assert!(script.contains(r#""[aria-label=\"Close\"]""#));
        assert!(!script.contains("__SELECTOR__"));
    }

    #[test]
    fn test_query_script_placeholder() {
        let script =
            BrowserEngine::with_selector(QUERY_ELEMENTS_JS, "button").expect("build script");
        assert!(script.contains(r#"querySelectorAll("button")"#));
    }
}
