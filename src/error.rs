//! Error handling and custom error types
//!
//! Provides unified error handling across the client using thiserror, plus the
//! single place where errors are turned into user-facing messages.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Rate limit reached: at most {max_calls} generation requests per minute")]
    RateLimited { max_calls: u32 },

    #[error("Upload failed: {message}")]
    UploadFailed {
        status: Option<u16>,
        message: String,
    },

    #[error("Generation request rejected (status {status}): {message}")]
    GenerationRejected { status: u16, message: String },

    #[error("Request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("Backend unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("Backend reported an error: {0}")]
    BackendReported(String),

    #[error("Response did not contain a result")]
    EmptyResult,

    #[error("Unexpected response format: {0}")]
    UnexpectedFormat(String),

    #[error("Invalid image data: {0}")]
    InvalidImage(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("All {attempted} variations failed, last error: {last}")]
    AllVariationsFailed { attempted: u32, last: Box<Error> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// HTTP status attached to the error, when the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::UploadFailed { status, .. } => *status,
            Error::GenerationRejected { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            Error::AllVariationsFailed { last, .. } => last.status(),
            _ => None,
        }
    }

    /// Message shown to the user for a failed generation.
    pub fn user_message(&self) -> String {
        match self.status() {
            Some(429) => {
                return "The API rate limit was reached. Please wait a moment and try again."
                    .to_string()
            }
            Some(400) => {
                return "The image format is not valid. Please try a different image.".to_string()
            }
            Some(500) => {
                return "The backend hit an internal error. Check the server logs.".to_string()
            }
            _ => {}
        }

        match self {
            Error::RateLimited { .. } => {
                "API call limit reached. Please try again in one minute.".to_string()
            }
            Error::Timeout { .. } => {
                "The request timed out. Try again with a smaller image.".to_string()
            }
            Error::NetworkUnreachable(_) => {
                "The backend API server is not running. Start it and try again.".to_string()
            }
            Error::BackendReported(message) => format!("Backend error: {}", message),
            Error::GenerationRejected { message, .. } | Error::UploadFailed { message, .. } => {
                format!("Backend error: {}", message)
            }
            Error::AllVariationsFailed { last, .. } => last.user_message(),
            other => format!("API error: {}", other),
        }
    }
}
