//! Cleanup and deduplication of raw OCR output.

use locascan_core::TextBlock;
use std::collections::HashMap;

/// Vertical tolerance for "same line", as a fraction of block height.
const SAME_LINE_TOLERANCE: f32 = 0.5;

/// Largest horizontal gap between merged words, as a multiple of block height.
const MAX_WORD_GAP: f32 = 1.0;

/// Cleans backend output before classification.
///
/// Steps, in order: collapse whitespace, drop empty text, drop blocks under
/// the confidence threshold, clamp confidence to `[0, 1]`, merge words on the
/// same visual line (word-level backends only), then deduplicate by
/// case-folded text keeping the most confident occurrence in first-seen order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    /// Blocks below this confidence are dropped
    pub confidence_threshold: f32,
    /// Merge word-level blocks into lines
    pub merge_lines: bool,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            merge_lines: true,
        }
    }
}

impl Normalizer {
    /// Create a normalizer.
    #[must_use]
    pub fn new(confidence_threshold: f32, merge_lines: bool) -> Self {
        Self {
            confidence_threshold,
            merge_lines,
        }
    }

    /// Normalize a batch of blocks from one screenshot.
    #[must_use]
    pub fn normalize(&self, blocks: Vec<TextBlock>, word_level: bool) -> Vec<TextBlock> {
        let cleaned: Vec<TextBlock> = blocks
            .into_iter()
            .filter_map(|mut block| {
                block.raw_text = collapse_whitespace(&block.raw_text);
                if block.raw_text.is_empty()
                    || !block.ocr_confidence.is_finite()
                    || block.ocr_confidence < self.confidence_threshold
                {
                    return None;
                }
                block.ocr_confidence = block.ocr_confidence.clamp(0.0, 1.0);
                Some(block)
            })
            .collect();

        let lines = if self.merge_lines && word_level {
            merge_lines(cleaned)
        } else {
            cleaned
        };

        dedupe(lines)
    }
}

/// Collapse runs of whitespace into single spaces and trim.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn same_line(line: &TextBlock, word: &TextBlock) -> bool {
    let a = &line.bounding_region;
    let b = &word.bounding_region;
    let height = a.height.max(b.height);
    if height <= 0.0 {
        return false;
    }
    let gap = b.x - a.right();
    (a.center_y() - b.center_y()).abs() <= SAME_LINE_TOLERANCE * height
        && gap >= -height
        && gap <= MAX_WORD_GAP * height
}

/// Join consecutive words that sit on the same visual line.
///
/// Confidence of a merged line is the mean of its words.
fn merge_lines(words: Vec<TextBlock>) -> Vec<TextBlock> {
    let mut lines: Vec<(TextBlock, usize, f32)> = Vec::new();

    for word in words {
        match lines.last_mut() {
            Some((line, count, sum)) if same_line(line, &word) => {
                line.raw_text.push(' ');
                line.raw_text.push_str(&word.raw_text);
                line.bounding_region = line.bounding_region.union(&word.bounding_region);
                *count += 1;
                *sum += word.ocr_confidence;
            }
            _ => {
                let confidence = word.ocr_confidence;
                lines.push((word, 1, confidence));
            }
        }
    }

    lines
        .into_iter()
        .map(|(mut line, count, sum)| {
            #[allow(clippy::cast_precision_loss)]
            let mean = sum / count as f32;
            line.ocr_confidence = mean;
            line
        })
        .collect()
}

fn dedupe(blocks: Vec<TextBlock>) -> Vec<TextBlock> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<TextBlock> = Vec::with_capacity(blocks.len());

    for block in blocks {
        let key = block.raw_text.to_lowercase();
        match seen.get(&key) {
            Some(&idx) => {
                if block.ocr_confidence > out[idx].ocr_confidence {
                    out[idx] = block;
                }
            }
            None => {
                seen.insert(key, out.len());
                out.push(block);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use locascan_core::BoundingRegion;

    fn block(text: &str, x: f32, y: f32, conf: f32) -> TextBlock {
        TextBlock::new(text, BoundingRegion::new(x, y, 50.0, 20.0), conf)
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Check \n\t availability  "), "Check availability");
        assert_eq!(collapse_whitespace(" \n "), "");
    }

    #[test]
    fn test_drops_empty_and_low_confidence() {
        let normalizer = Normalizer::default();
        let blocks = vec![
            block("   ", 0.0, 0.0, 0.9),
            block("Faint", 0.0, 50.0, 0.3),
            block("Réserver", 0.0, 100.0, 0.8),
        ];
        let out = normalizer.normalize(blocks, false);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].raw_text, "Réserver");
    }

    #[test]
    fn test_drops_non_finite_confidence() {
        let blocks = vec![
            block("Garbled", 0.0, 0.0, f32::NAN),
            block("Overflow", 0.0, 50.0, f32::INFINITY),
            block("Accueil", 0.0, 100.0, 0.9),
        ];
        let out = Normalizer::default().normalize(blocks, false);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].raw_text, "Accueil");
    }

    #[test]
    fn test_clamps_confidence() {
        let out = Normalizer::default().normalize(vec![block("Accueil", 0.0, 0.0, 1.7)], false);
        assert!((out[0].ocr_confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_dedupe_keeps_highest_confidence_in_first_seen_order() {
        let blocks = vec![
            block("Save", 0.0, 0.0, 0.6),
            block("Annuler", 0.0, 100.0, 0.9),
            block("SAVE", 0.0, 200.0, 0.95),
        ];
        let out = Normalizer::default().normalize(blocks, false);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].raw_text, "SAVE");
        assert_eq!(out[0].bounding_region.y, 200.0);
        assert_eq!(out[1].raw_text, "Annuler");
    }

    #[test]
    fn test_merges_words_on_same_line() {
        let blocks = vec![
            block("Check", 10.0, 100.0, 0.9),
            block("availability", 70.0, 102.0, 0.9),
            block("Suivant", 10.0, 300.0, 0.9),
        ];
        let out = Normalizer::default().normalize(blocks, true);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].raw_text, "Check availability");
        assert_eq!(out[0].bounding_region.right(), 120.0);
        assert_eq!(out[1].raw_text, "Suivant");
    }

    #[test]
    fn test_no_merge_across_wide_gap_or_for_line_level() {
        let blocks = vec![block("Left", 10.0, 100.0, 0.9), block("Right", 500.0, 100.0, 0.9)];
        assert_eq!(Normalizer::default().normalize(blocks.clone(), true).len(), 2);

        let adjacent = vec![block("Check", 10.0, 100.0, 0.9), block("in", 70.0, 100.0, 0.9)];
        assert_eq!(Normalizer::default().normalize(adjacent.clone(), false).len(), 2);
        assert_eq!(Normalizer::new(0.5, false).normalize(adjacent, true).len(), 2);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let normalizer = Normalizer::default();
        let blocks = vec![
            block("  Check   in ", 0.0, 0.0, 0.8),
            block("check in", 0.0, 40.0, 0.9),
            block("Départ", 0.0, 80.0, 0.7),
        ];
        let once = normalizer.normalize(blocks, false);
        let twice = normalizer.normalize(once.clone(), false);
        assert_eq!(once, twice);
    }
}
