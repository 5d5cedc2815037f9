//! Data models and structures
//!
//! Defines the generation request/result types, the session error state,
//! advisories returned next to a successful render, and client configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// How furniture is chosen for the render.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoomMode {
    #[default]
    Auto,
    Manual,
}

/// One user-initiated generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Room photo as a data URI.
    pub image: String,
    pub furniture: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<RoomMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_type_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_variations: Option<i64>,
}

impl GenerationRequest {
    pub fn new(image: String, furniture: Vec<String>) -> Self {
        Self {
            image,
            furniture,
            image_width: None,
            image_height: None,
            mode: None,
            room_type_hint: None,
            num_variations: None,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.image_width = Some(width);
        self.image_height = Some(height);
        self
    }

    pub fn with_mode(mut self, mode: RoomMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_room_type(mut self, hint: impl Into<String>) -> Self {
        self.room_type_hint = Some(hint.into());
        self
    }

    pub fn with_variations(mut self, count: i64) -> Self {
        self.num_variations = Some(count);
        self
    }
}

/// A rendered image ready for display.
///
/// `image` is either a `data:` URI or a `blob:` URL owned by the session's
/// [`ObjectStore`](crate::objects::ObjectStore).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationResult {
    pub image: String,
    pub description: String,
}

/// Non-fatal information returned alongside a successful render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    NotPlaced(Vec<String>),
    Report(String),
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::NotPlaced(items) => {
                write!(f, "Furniture that could not be placed: {}", items.join(", "))
            }
            Advisory::Report(report) => f.write_str(report),
        }
    }
}

/// Outcome of the last attempt, kept for display until the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorState {
    pub message: Option<String>,
    pub not_placed: Vec<String>,
    pub notice: Option<String>,
}

impl ErrorState {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn apply_advisory(&mut self, advisory: &Advisory) {
        if let Advisory::NotPlaced(items) = advisory {
            self.not_placed = items.clone();
        }
        self.notice = Some(advisory.to_string());
    }
}

/// Which multipart field carries the photo on upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadField {
    File,
    Image,
}

impl UploadField {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadField::File => "file",
            UploadField::Image => "image",
        }
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub image_make_path: String,
    pub upload_path: String,
    pub timeout: Duration,
    /// The backend wants a server-side image path rather than inline data.
    pub expects_image_path: bool,
    pub fallback_image_path: String,
    pub upload_field: UploadField,
    /// Fail the whole request when no variation succeeds.
    pub strict_variations: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            image_make_path: "/api/imageMake".to_string(),
            upload_path: "/api/upload".to_string(),
            timeout: Duration::from_millis(30_000),
            expects_image_path: true,
            fallback_image_path: "images/sample.png".to_string(),
            upload_field: UploadField::File,
            strict_variations: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup, falling back to defaults for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let timeout = match get("API_TIMEOUT_MS") {
            Some(raw) => Duration::from_millis(raw.parse::<u64>().map_err(|_| {
                Error::Config(format!("API_TIMEOUT_MS must be a number, got '{}'", raw))
            })?),
            None => defaults.timeout,
        };

        let upload_field = match get("API_UPLOAD_FIELD").as_deref() {
            None | Some("file") => UploadField::File,
            Some("image") => UploadField::Image,
            Some(other) => {
                return Err(Error::Config(format!(
                    "API_UPLOAD_FIELD must be 'file' or 'image', got '{}'",
                    other
                )))
            }
        };

        Ok(Self {
            base_url: get("API_BASE_URL").unwrap_or(defaults.base_url),
            image_make_path: get("API_IMAGE_MAKE_PATH").unwrap_or(defaults.image_make_path),
            upload_path: get("API_UPLOAD_PATH").unwrap_or(defaults.upload_path),
            timeout,
            expects_image_path: parse_bool(
                "API_EXPECTS_PATH",
                get("API_EXPECTS_PATH"),
                defaults.expects_image_path,
            )?,
            fallback_image_path: get("API_IMAGE_PATH").unwrap_or(defaults.fallback_image_path),
            upload_field,
            strict_variations: parse_bool(
                "STRICT_VARIATIONS",
                get("STRICT_VARIATIONS"),
                defaults.strict_variations,
            )?,
        })
    }

    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn image_make_url(&self) -> String {
        self.endpoint_url(&self.image_make_path)
    }

    pub fn upload_url(&self) -> String {
        self.endpoint_url(&self.upload_path)
    }
}

fn parse_bool(key: &str, raw: Option<String>, default: bool) -> Result<bool> {
    match raw.as_deref() {
        None => Ok(default),
        Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(other) => Err(Error::Config(format!(
            "{} must be true or false, got '{}'",
            key, other
        ))),
    }
}
