//! Vision inference HTTP client
//!
//! One request/response round trip per image against a `generateContent`
//! style endpoint, plus the strict positional parser for the line-labeled
//! response format the instruction template demands.

use crate::services::image_loader::PreparedImage;
use crate::types::AttributeField;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const USER_AGENT: &str = concat!("shoebox/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Vision client errors
#[derive(Debug, Error)]
pub enum VisionError {
    /// Transport-level failure (DNS, connect, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Service rejected the request outright
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Non-success HTTP status
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Response carried no candidate text
    #[error("Empty response from inference service")]
    EmptyResponse,

    /// Response text deviates from the expected line-labeled format
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Inference service client
pub struct VisionClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl VisionClient {
    pub fn new(api_key: String) -> Result<Self, VisionError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| VisionError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Override the endpoint (self-hosted gateways, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// One classification round trip; returns the raw response text
    pub async fn generate(
        &self,
        instruction: &str,
        image: &PreparedImage,
    ) -> Result<String, VisionError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: instruction.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: PreparedImage::MIME_TYPE.to_string(),
                            data: general_purpose::STANDARD.encode(&image.data),
                        },
                    },
                ],
            }],
        };

        tracing::debug!(url = %url, image_bytes = image.data.len(), "Querying inference service");

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| VisionError::Network(e.to_string()))?;

        let status = response.status();

        if status.as_u16() == 429 {
            return Err(VisionError::RateLimitExceeded);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(VisionError::Api(status.as_u16(), error_text));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| VisionError::MalformedResponse(e.to_string()))?;

        body.candidates
            .into_iter()
            .flatten()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .into_iter()
            .flatten()
            .find_map(|part| part.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or(VisionError::EmptyResponse)
    }
}

/// Decode the fixed line-labeled response format
///
/// The non-empty trimmed lines must number exactly `fields.len()`, and
/// line *i* must begin with field *i*'s literal `Label:` prefix. Anything
/// else (missing line, reordered lines, preamble) is a malformed response;
/// fields are never silently misassigned.
pub fn parse_labeled_response(
    text: &str,
    fields: &[AttributeField],
) -> Result<Vec<String>, VisionError> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() != fields.len() {
        return Err(VisionError::MalformedResponse(format!(
            "expected {} labeled lines, got {}",
            fields.len(),
            lines.len()
        )));
    }

    let mut values = Vec::with_capacity(fields.len());
    for (line, field) in lines.iter().zip(fields) {
        let prefix = format!("{}:", field.label);
        match line.strip_prefix(&prefix) {
            Some(rest) => values.push(rest.trim().to_string()),
            None => {
                return Err(VisionError::MalformedResponse(format!(
                    "line {:?} does not start with {:?}",
                    line, prefix
                )));
            }
        }
    }

    Ok(values)
}
