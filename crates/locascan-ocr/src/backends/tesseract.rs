//! Local Tesseract OCR backend.

use crate::backend::{BackendCapabilities, OcrBackend};
use crate::error::{OcrError, Result};
use async_trait::async_trait;
use locascan_core::{BoundingRegion, TesseractConfig, TextBlock};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

const BACKEND_ID: &str = "tesseract";

/// Tesseract OCR backend.
///
/// Runs the `tesseract` binary with TSV output and groups recognized words
/// into lines, so blocks arrive line-level.
pub struct TesseractBackend {
    binary: String,
    languages: Vec<String>,
    psm: u8,
}

impl TesseractBackend {
    /// Create a backend from configuration.
    #[must_use]
    pub fn new(config: &TesseractConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            languages: config.languages.clone(),
            psm: config.psm,
        }
    }

    fn args(&self, image: &Path) -> Vec<String> {
        let mut args = vec![image.display().to_string(), "stdout".to_string()];
        if !self.languages.is_empty() {
            args.push("-l".to_string());
            args.push(self.languages.join("+"));
        }
        args.push("--psm".to_string());
        args.push(self.psm.to_string());
        args.push("tsv".to_string());
        args
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new(&TesseractConfig::default())
    }
}

#[async_trait]
impl OcrBackend for TesseractBackend {
    async fn extract(&self, image: &Path) -> Result<Vec<TextBlock>> {
        tracing::debug!("Running {} on {}", self.binary, image.display());

        let output = Command::new(&self.binary)
            .args(self.args(image))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => OcrError::BackendUnavailable {
                    backend: BACKEND_ID.to_string(),
                    message: format!("binary '{}' not found", self.binary),
                },
                _ => OcrError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ExtractionFailed {
                backend: BACKEND_ID.to_string(),
                message: stderr.trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let blocks = parse_tsv(&stdout)?;
        tracing::debug!("Tesseract produced {} lines", blocks.len());
        Ok(blocks)
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            is_local: true,
            word_level: false,
        }
    }

    fn backend_id(&self) -> &str {
        BACKEND_ID
    }
}

/// Words of one line, accumulated while scanning TSV rows.
struct LineAccumulator {
    key: (u32, u32, u32, u32),
    words: Vec<String>,
    region: BoundingRegion,
    confidence_sum: f32,
}

impl LineAccumulator {
    fn into_block(self) -> TextBlock {
        #[allow(clippy::cast_precision_loss)]
        let confidence = self.confidence_sum / self.words.len() as f32 / 100.0;
        TextBlock::new(self.words.join(" "), self.region, confidence)
    }
}

fn parse_field<T: std::str::FromStr>(cols: &[&str], idx: usize, row: usize) -> Result<T> {
    cols.get(idx)
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| OcrError::ParseError {
            backend: BACKEND_ID.to_string(),
            message: format!("row {row}: bad column {idx}"),
        })
}

/// Parse Tesseract TSV output into line-level blocks.
///
/// Columns: level, page, block, paragraph, line, word, left, top, width,
/// height, conf, text. Only word rows (level 5) with non-empty text count.
pub(crate) fn parse_tsv(tsv: &str) -> Result<Vec<TextBlock>> {
    let mut blocks = Vec::new();
    let mut current: Option<LineAccumulator> = None;

    for (row, line) in tsv.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let cols: Vec<&str> = line.splitn(12, '\t').collect();
        if cols.len() < 12 {
            return Err(OcrError::ParseError {
                backend: BACKEND_ID.to_string(),
                message: format!("row {row}: expected 12 columns, got {}", cols.len()),
            });
        }

        let level: u32 = parse_field(&cols, 0, row)?;
        let text = cols[11].trim();
        if level != 5 || text.is_empty() {
            continue;
        }

        let key: (u32, u32, u32, u32) = (
            parse_field(&cols, 1, row)?,
            parse_field(&cols, 2, row)?,
            parse_field(&cols, 3, row)?,
            parse_field(&cols, 4, row)?,
        );
        let region = BoundingRegion::new(
            parse_field(&cols, 6, row)?,
            parse_field(&cols, 7, row)?,
            parse_field(&cols, 8, row)?,
            parse_field(&cols, 9, row)?,
        );
        let conf: f32 = parse_field::<f32>(&cols, 10, row)?.max(0.0);

        match current.as_mut() {
            Some(acc) if acc.key == key => {
                acc.words.push(text.to_string());
                acc.region = acc.region.union(&region);
                acc.confidence_sum += conf;
            }
            _ => {
                if let Some(done) = current.take() {
                    blocks.push(done.into_block());
                }
                current = Some(LineAccumulator {
                    key,
                    words: vec![text.to_string()],
                    region,
                    confidence_sum: conf,
                });
            }
        }
    }

    if let Some(done) = current {
        blocks.push(done.into_block());
    }
    Ok(blocks)
}
