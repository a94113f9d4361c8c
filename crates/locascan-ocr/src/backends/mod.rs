//! OCR backend implementations.

pub mod google_vision;
pub mod tesseract;

pub use google_vision::GoogleVisionBackend;
pub use tesseract::TesseractBackend;
