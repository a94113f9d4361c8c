//! Google Cloud Vision OCR backend.
//!
//! Screenshots are sent to a third-party service. Only use this backend when
//! the pages under test may leave the machine.

use crate::backend::{BackendCapabilities, OcrBackend};
use crate::error::{OcrError, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use locascan_core::{BoundingRegion, GoogleVisionConfig, TextBlock};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;

const BACKEND_ID: &str = "google_vision";

/// Vision does not score individual annotations.
const DEFAULT_CONFIDENCE: f32 = 0.9;

/// Google Cloud Vision `TEXT_DETECTION` backend.
pub struct GoogleVisionBackend {
    api_key: String,
    endpoint: String,
    client: Client,
}

impl GoogleVisionBackend {
    /// Create a backend with the given API key and the public endpoint.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_endpoint(api_key, GoogleVisionConfig::default().endpoint)
    }

    /// Create a backend against a specific endpoint.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| OcrError::BackendUnavailable {
                backend: BACKEND_ID.to_string(),
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            client,
        })
    }

    /// Create a backend from configuration.
    ///
    /// # Errors
    /// Returns [`OcrError::BackendUnavailable`] when no API key is configured.
    pub fn from_config(config: &GoogleVisionConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| OcrError::BackendUnavailable {
                backend: BACKEND_ID.to_string(),
                message: "no API key configured".to_string(),
            })?;
        Self::with_endpoint(api_key, config.endpoint.clone())
    }

    fn to_api_request(image: &[u8]) -> AnnotateRequest {
        AnnotateRequest {
            requests: vec![ImageRequest {
                image: ImageContent {
                    content: STANDARD.encode(image),
                },
                features: vec![Feature {
                    kind: "TEXT_DETECTION".to_string(),
                }],
            }],
        }
    }
}

#[async_trait]
impl OcrBackend for GoogleVisionBackend {
    async fn extract(&self, image: &Path) -> Result<Vec<TextBlock>> {
        let bytes = tokio::fs::read(image).await?;
        tracing::debug!("Sending {} bytes to Google Vision", bytes.len());

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", &self.api_key)])
            .json(&Self::to_api_request(&bytes))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(OcrError::QuotaExceeded {
                    backend: BACKEND_ID.to_string(),
                    message: error_text,
                });
            }
            return Err(OcrError::ApiError {
                backend: BACKEND_ID.to_string(),
                status: status.as_u16(),
                message: error_text,
            });
        }

        let api_response: AnnotateResponse =
            response.json().await.map_err(|e| OcrError::ParseError {
                backend: BACKEND_ID.to_string(),
                message: format!("Failed to parse response: {e}"),
            })?;

        parse_response(api_response)
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            is_local: false,
            word_level: true,
        }
    }

    fn backend_id(&self) -> &str {
        BACKEND_ID
    }
}

/// Convert an annotate response into word-level blocks.
///
/// The first annotation is the whole-image text and is skipped; the rest are
/// individual words.
pub(crate) fn parse_response(response: AnnotateResponse) -> Result<Vec<TextBlock>> {
    let Some(result) = response.responses.into_iter().next() else {
        return Ok(Vec::new());
    };

    if let Some(error) = result.error {
        return Err(OcrError::ApiError {
            backend: BACKEND_ID.to_string(),
            status: u16::try_from(error.code).unwrap_or(500),
            message: error.message,
        });
    }

    let blocks = result
        .text_annotations
        .into_iter()
        .skip(1)
        .filter(|a| !a.description.trim().is_empty())
        .map(|a| {
            let points: Vec<(f32, f32)> = a
                .bounding_poly
                .map(|p| {
                    p.vertices
                        .iter()
                        .map(|v| (v.x.unwrap_or(0.0), v.y.unwrap_or(0.0)))
                        .collect()
                })
                .unwrap_or_default();
            TextBlock::new(
                a.description,
                BoundingRegion::from_points(&points),
                DEFAULT_CONFIDENCE,
            )
        })
        .collect();

    Ok(blocks)
}

// Vision API types

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<ImageRequest>,
}

#[derive(Debug, Serialize)]
struct ImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateResult {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    error: Option<ApiStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextAnnotation {
    #[serde(default)]
    description: String,
    bounding_poly: Option<BoundingPoly>,
}

#[derive(Debug, Deserialize)]
struct BoundingPoly {
    #[serde(default)]
    vertices: Vec<Vertex>,
}

#[derive(Debug, Deserialize)]
struct Vertex {
    x: Option<f32>,
    y: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}
