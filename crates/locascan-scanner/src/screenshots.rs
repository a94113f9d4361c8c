//! Screenshot persistence for captured visual states.

use crate::error::{Result, ScanError};
use locascan_core::ScreenshotRef;
use std::path::{Path, PathBuf};

/// Writes PNG screenshots into a session directory.
///
/// Page screenshots go in the root, modal screenshots in `modals/`. File
/// names are the sanitized state name plus a timestamp; a counter is added
/// if two states land in the same millisecond.
#[derive(Debug, Clone)]
pub struct ScreenshotStore {
    root: PathBuf,
}

impl ScreenshotStore {
    /// Create a store rooted at `root`. Directories are created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Session directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a screenshot and return its reference.
    ///
    /// # Errors
    /// Returns [`ScanError::Capture`] if the file cannot be written.
    pub async fn save(&self, name: &str, modal: bool, png: &[u8]) -> Result<ScreenshotRef> {
        let dir = if modal {
            self.root.join("modals")
        } else {
            self.root.clone()
        };
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ScanError::Capture(format!("create {}: {e}", dir.display())))?;

        let stem = format!(
            "{}_{}",
            sanitize_file_name(name),
            chrono::Local::now().format("%Y%m%d_%H%M%S_%3f")
        );
        let mut path = dir.join(format!("{stem}.png"));
        let mut counter = 1;
        while tokio::fs::try_exists(&path).await.unwrap_or(false) {
            counter += 1;
            path = dir.join(format!("{stem}_{counter}.png"));
        }

        tokio::fs::write(&path, png)
            .await
            .map_err(|e| ScanError::Capture(format!("write {}: {e}", path.display())))?;

        tracing::info!("Screenshot saved to: {}", path.display());
        Ok(ScreenshotRef::new(path))
    }
}

/// Replace everything except ASCII letters and digits with `_`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if sanitized.is_empty() {
        "state".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Dashboard / Modal_Save"), "Dashboard___Modal_Save");
        assert_eq!(sanitize_file_name("Réservations"), "R_servations");
        assert_eq!(sanitize_file_name(""), "state");
    }

    #[tokio::test]
    async fn test_save_page_and_modal() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScreenshotStore::new(dir.path().join("session"));

        let page = store.save("Dashboard", false, b"\x89PNG").await.unwrap();
        assert_eq!(page.path().parent(), Some(store.root()));
        assert!(page
            .path()
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("Dashboard_") && n.ends_with(".png")));
        assert_eq!(std::fs::read(page.path()).unwrap(), b"\x89PNG");

        let modal = store.save("Dashboard_Modal_Save", true, b"png").await.unwrap();
        assert_eq!(modal.path().parent(), Some(store.root().join("modals").as_path()));
    }

    #[tokio::test]
    async fn test_same_name_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScreenshotStore::new(dir.path());
        let first = store.save("Home", false, b"one").await.unwrap();
        let second = store.save("Home", false, b"two").await.unwrap();
        assert_ne!(first.path(), second.path());
        assert_eq!(std::fs::read(first.path()).unwrap(), b"one");
    }
}
