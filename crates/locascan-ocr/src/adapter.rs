//! OCR adapter: backend selection, timeout and normalization.

use crate::backend::OcrBackend;
use crate::backends::{GoogleVisionBackend, TesseractBackend};
use crate::error::{OcrError, Result};
use crate::normalize::Normalizer;
use locascan_core::{OcrConfig, OcrEngineKind, ScreenshotRef, TextBlock};
use std::sync::Arc;
use std::time::Duration;

/// Uniform text extraction over one configured backend.
pub struct OcrAdapter {
    backend: Arc<dyn OcrBackend>,
    normalizer: Normalizer,
    timeout: Duration,
}

impl OcrAdapter {
    /// Wrap an existing backend.
    #[must_use]
    pub fn new(backend: Arc<dyn OcrBackend>, normalizer: Normalizer, timeout: Duration) -> Self {
        Self {
            backend,
            normalizer,
            timeout,
        }
    }

    /// Build the adapter selected by configuration.
    ///
    /// Google Vision without an API key falls back to Tesseract when
    /// `fallback_to_local` is set.
    ///
    /// # Errors
    /// Returns [`OcrError::BackendUnavailable`] if the configured backend cannot
    /// be constructed and no fallback applies.
    pub fn from_config(config: &OcrConfig) -> Result<Self> {
        let backend: Arc<dyn OcrBackend> = match config.engine {
            OcrEngineKind::Tesseract => Arc::new(TesseractBackend::new(&config.tesseract)),
            OcrEngineKind::GoogleVision => {
                match GoogleVisionBackend::from_config(&config.google_vision) {
                    Ok(backend) => Arc::new(backend),
                    Err(OcrError::BackendUnavailable { message, .. })
                        if config.google_vision.fallback_to_local =>
                    {
                        tracing::warn!(
                            "Google Vision unavailable ({}), falling back to local Tesseract",
                            message
                        );
                        Arc::new(TesseractBackend::new(&config.tesseract))
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        tracing::info!(
            "OCR backend: {} ({})",
            backend.backend_id(),
            if backend.capabilities().is_local {
                "local"
            } else {
                "cloud"
            }
        );
        Ok(Self::new(
            backend,
            Normalizer::new(config.confidence_threshold, config.merge_lines),
            Duration::from_millis(config.timeout_ms),
        ))
    }

    /// Identifier of the active backend.
    #[must_use]
    pub fn backend_id(&self) -> &str {
        self.backend.backend_id()
    }

    /// Extract normalized text blocks from a screenshot.
    ///
    /// # Errors
    /// Returns error if the file is missing, the backend fails, or the call
    /// exceeds the configured timeout.
    pub async fn extract(&self, screenshot: &ScreenshotRef) -> Result<Vec<TextBlock>> {
        let path = screenshot.path();
        if !path.is_file() {
            return Err(OcrError::ImageNotFound(path.display().to_string()));
        }

        let raw = tokio::time::timeout(self.timeout, self.backend.extract(path))
            .await
            .map_err(|_| OcrError::Timeout {
                millis: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            })??;

        let word_level = self.backend.capabilities().word_level;
        let blocks = self.normalizer.normalize(raw, word_level);
        tracing::debug!(
            "OCR extracted {} blocks from {}",
            blocks.len(),
            screenshot
        );
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendCapabilities;
    use async_trait::async_trait;
    use locascan_core::{BoundingRegion, GoogleVisionConfig};
    use std::path::Path;

    struct ScriptedBackend {
        blocks: Vec<TextBlock>,
        delay: Duration,
        word_level: bool,
    }

    #[async_trait]
    impl OcrBackend for ScriptedBackend {
        async fn extract(&self, _image: &Path) -> Result<Vec<TextBlock>> {
            tokio::time::sleep(self.delay).await;
            Ok(self.blocks.clone())
        }

        fn capabilities(&self) -> BackendCapabilities {
            BackendCapabilities {
                is_local: true,
                word_level: self.word_level,
            }
        }

        fn backend_id(&self) -> &str {
            "scripted"
        }
    }

    fn screenshot() -> (tempfile::TempDir, ScreenshotRef) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.png");
        std::fs::write(&path, b"png").expect("write screenshot");
        (dir, ScreenshotRef::new(path))
    }

    fn adapter(backend: ScriptedBackend) -> OcrAdapter {
        OcrAdapter::new(Arc::new(backend), Normalizer::default(), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_extract_normalizes_backend_output() {
        let (_dir, shot) = screenshot();
        let region = BoundingRegion::new(0.0, 0.0, 40.0, 20.0);
        let adapter = adapter(ScriptedBackend {
            blocks: vec![
                TextBlock::new(" Dashboard ", region, 0.9),
                TextBlock::new("dashboard", region, 0.7),
                TextBlock::new("", region, 0.9),
            ],
            delay: Duration::ZERO,
            word_level: false,
        });

        let blocks = adapter.extract(&shot).await.expect("extract");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].raw_text, "Dashboard");
        assert_eq!(adapter.backend_id(), "scripted");
    }

    #[tokio::test]
    async fn test_missing_image() {
        let adapter = adapter(ScriptedBackend {
            blocks: Vec::new(),
            delay: Duration::ZERO,
            word_level: false,
        });
        let err = adapter
            .extract(&ScreenshotRef::new("/nonexistent/state.png"))
            .await
            .expect_err("missing image");
        assert!(matches!(err, OcrError::ImageNotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_backend_times_out() {
        let (_dir, shot) = screenshot();
        let adapter = adapter(ScriptedBackend {
            blocks: Vec::new(),
            delay: Duration::from_secs(120),
            word_level: false,
        });
        let err = adapter.extract(&shot).await.expect_err("timeout");
        assert!(matches!(err, OcrError::Timeout { millis: 60_000 }));
    }

    #[test]
    fn test_from_config_falls_back_without_key() {
        let config = OcrConfig {
            engine: OcrEngineKind::GoogleVision,
            ..OcrConfig::default()
        };
        let adapter = OcrAdapter::from_config(&config).expect("fallback adapter");
        assert_eq!(adapter.backend_id(), "tesseract");

        let config = OcrConfig {
            engine: OcrEngineKind::GoogleVision,
            google_vision: GoogleVisionConfig {
                fallback_to_local: false,
                ..GoogleVisionConfig::default()
            },
            ..OcrConfig::default()
        };
        assert!(matches!(
            OcrAdapter::from_config(&config),
            Err(OcrError::BackendUnavailable { .. })
        ));
    }
}
