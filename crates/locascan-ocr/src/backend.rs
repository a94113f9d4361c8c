//! Core OCR backend trait.

use crate::error::Result;
use async_trait::async_trait;
use locascan_core::TextBlock;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Trait for OCR backends.
///
/// Implementations map an image file to raw text blocks. They must report
/// confidence in `[0, 1]` and pixel regions relative to the image; cleaning
/// and deduplication happen in the adapter.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Extract raw text blocks from an image.
    ///
    /// # Errors
    /// Returns error if the backend fails, times out, or its output cannot be parsed.
    async fn extract(&self, image: &Path) -> Result<Vec<TextBlock>>;

    /// Get the capabilities of this backend.
    fn capabilities(&self) -> BackendCapabilities;

    /// Get the unique identifier for this backend.
    fn backend_id(&self) -> &str;
}

/// Capabilities of an OCR backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendCapabilities {
    /// Whether images stay on this machine
    pub is_local: bool,

    /// Whether blocks are single words that need merging into lines
    pub word_level: bool,
}
