//! Response normalization
//!
//! The generation endpoint answers either with a JSON envelope or with raw
//! image bytes. Both become a uniform list of [`GenerationResult`]s.

use crate::models::{Advisory, GenerationResult};
use crate::objects::ObjectStore;
use crate::{Error, Result};
use serde::Deserialize;

pub const RESULT_DESCRIPTION: &str = "Generated design";

/// A successful (2xx) reply from the generation endpoint, body unread.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body,
        }
    }

    pub fn json(value: serde_json::Value) -> Self {
        Self::new(200, "application/json", value.to_string().into_bytes())
    }

    pub fn image(content_type: &str, body: Vec<u8>) -> Self {
        Self::new(200, content_type, body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedResponse {
    pub results: Vec<GenerationResult>,
    pub advisory: Option<Advisory>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    result: Option<String>,
    error: Option<serde_json::Value>,
    message: Option<serde_json::Value>,
    not_placed: Option<Vec<String>>,
    report: Option<String>,
}

pub fn normalize(raw: &RawResponse, objects: &mut ObjectStore) -> Result<NormalizedResponse> {
    let content_type = raw.content_type.to_ascii_lowercase();
    tracing::debug!(
        "Generation response: status {}, content type '{}', {} bytes",
        raw.status,
        raw.content_type,
        raw.body.len()
    );

    if content_type.contains("application/json") {
        return normalize_json(&raw.body);
    }

    if content_type.contains("image/") {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or(&content_type)
            .trim();
        let url = objects.create(mime, raw.body.clone());
        return Ok(NormalizedResponse {
            results: vec![described(url)],
            advisory: None,
        });
    }

    tracing::error!("Unexpected response content type: '{}'", raw.content_type);
    Err(Error::UnexpectedFormat(raw.content_type.clone()))
}

fn normalize_json(body: &[u8]) -> Result<NormalizedResponse> {
    let text = std::str::from_utf8(body)
        .map_err(|e| Error::UnexpectedFormat(format!("JSON body is not UTF-8: {}", e)))?;
    let api: ApiResponse = serde_json::from_str(text)?;

    let reported = api
        .error
        .as_ref()
        .and_then(reported_message)
        .or_else(|| api.message.as_ref().and_then(reported_message));
    if let Some(message) = reported {
        return Err(Error::BackendReported(message));
    }

    let result = non_empty(api.result).ok_or(Error::EmptyResult)?;
    let image = if result.starts_with("data:") {
        result
    } else {
        format!("data:image/jpeg;base64,{}", result)
    };

    let advisory = match api.not_placed.filter(|items| !items.is_empty()) {
        Some(items) => Some(Advisory::NotPlaced(items)),
        None => non_empty(api.report).map(Advisory::Report),
    };

    Ok(NormalizedResponse {
        results: vec![described(image)],
        advisory,
    })
}

fn described(image: String) -> GenerationResult {
    GenerationResult {
        image,
        description: RESULT_DESCRIPTION.to_string(),
    }
}

/// Text of an `error`/`message` field, or `None` when the field is unset.
///
/// `null`, `false`, `0` and `""` count as unset. Strings are used as-is and
/// any other value is reported as its JSON text.
pub(crate) fn reported_message(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;

    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
