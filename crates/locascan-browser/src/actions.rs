use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Browser actions the scanner needs.
///
/// Everything the page load verifier and modal discovery engine know about
/// the live page comes through these calls.
#[async_trait::async_trait]
pub trait BrowserActions: Send + Sync {
    /// Navigate to a URL and wait for the load event
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Click the first element matching a selector
    async fn click(&self, selector: &str) -> Result<()>;

    /// Press a key on the focused document (e.g. `Escape`)
    async fn press_key(&self, key: &str) -> Result<()>;

    /// Take a full-page PNG screenshot
    async fn screenshot(&self) -> Result<Vec<u8>>;

    /// URL currently loaded
    async fn current_url(&self) -> Result<String>;

    /// `document.readyState`
    async fn ready_state(&self) -> Result<String>;

    /// Number of network resources the page has finished loading so far
    async fn resource_count(&self) -> Result<u64>;

    /// Number of visible elements matching a selector
    async fn visible_count(&self, selector: &str) -> Result<usize>;

    /// Describe every element matching a selector, in document order
    async fn query_elements(&self, selector: &str) -> Result<Vec<ElementInfo>>;
}

/// Snapshot of a DOM element as seen by discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementInfo {
    /// Selector that uniquely addresses this element in the current DOM
    pub path: String,
    /// Lowercase tag name
    pub tag: String,
    /// Trimmed inner text (truncated)
    pub text: String,
    /// `id` attribute
    pub id: Option<String>,
    /// `class` attribute
    pub classes: Option<String>,
    /// `aria-label` attribute
    pub aria_label: Option<String>,
    /// `title` attribute
    pub title: Option<String>,
    /// `data-testid` attribute
    pub test_id: Option<String>,
    /// `role` attribute
    pub role: Option<String>,
    /// `href` attribute
    pub href: Option<String>,
    /// Rendered with a non-empty box and not hidden
    pub visible: bool,
}

/// Resolve a link found on `page_url` and return its path when it points to
/// a scannable page of the application at `base_url`.
///
/// Anchors, `mailto:`/`tel:`/`javascript:` links, other origins, links with a
/// query string and paths over 100 characters are rejected.
#[must_use]
pub fn same_origin_path(base_url: &str, page_url: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
        || href.contains('?')
    {
        return None;
    }

    let base = url::Url::parse(base_url).ok()?;
    let page = url::Url::parse(page_url).unwrap_or_else(|_| base.clone());
    let resolved = page.join(href).ok()?;
    if resolved.scheme() != base.scheme()
        || resolved.host_str() != base.host_str()
        || resolved.port_or_known_default() != base.port_or_known_default()
    {
        return None;
    }

    let path = resolved.path();
    if path.len() > 100 {
        return None;
    }
    Some(path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_origin_path() {
        let base = "https://app.example.com";
        assert_eq!(
            same_origin_path(base, base, "/reservations").as_deref(),
            Some("/reservations")
        );
        assert_eq!(
            same_origin_path(base, base, "https://app.example.com/guests").as_deref(),
            Some("/guests")
        );
        assert_eq!(same_origin_path(base, base, "rooms").as_deref(), Some("/rooms"));
    }

    #[test]
    fn test_relative_links_resolve_against_current_page() {
        let base = "https://app.example.com";
        let page = "https://app.example.com/settings/profile";
        assert_eq!(
            same_origin_path(base, page, "security").as_deref(),
            Some("/settings/security")
        );
        assert_eq!(
            same_origin_path(base, page, "../rooms").as_deref(),
            Some("/rooms")
        );
        assert_eq!(
            same_origin_path(base, "", "rooms").as_deref(),
            Some("/rooms")
        );
    }

    #[test]
    fn test_same_origin_path_rejects() {
        let base = "https://app.example.com";
        assert!(same_origin_path(base, base, "#top").is_none());
        assert!(same_origin_path(base, base, "mailto:a@b.c").is_none());
        assert!(same_origin_path(base, base, "javascript:void(0)").is_none());
        assert!(same_origin_path(base, base, "/search?q=1").is_none());
        assert!(same_origin_path(base, base, "https://other.example.com/x").is_none());
        assert!(same_origin_path(base, base, &format!("/{}", "a".repeat(120))).is_none());
        assert!(same_origin_path("not-a-url", "not-a-url", "/x").is_none());
        // A page on another origin cannot pull links off the application.
        assert!(same_origin_path(base, "https://cdn.example.com/a", "b").is_none());
    }

    #[test]
    fn test_element_info_from_script_json() {
        let json = r##"{"path":"#save","tag":"button","text":"Save","id":"save","classes":null,
            "aria_label":null,"title":null,"test_id":null,"role":null,"href":null,"visible":true}"##;
        let info: ElementInfo = serde_json::from_str(json).expect("parse element info");
        assert_eq!(info.tag, "button");
        assert!(info.visible);
        assert!(info.classes.is_none());
    }
}
