//! Transport to the rendering backend
//!
//! Two endpoints: a multipart upload that stores the room photo server-side,
//! and a JSON generation endpoint that references or inlines the photo.

pub mod http;
pub mod mock;

pub use http::HttpBackend;
pub use mock::MockBackend;

use crate::image::ImagePayload;
use crate::response::RawResponse;
use crate::Result;
use async_trait::async_trait;
use serde::Serialize;

/// How the generation request points at the room photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ImageSource {
    /// Server-relative path of an image the backend already has.
    #[serde(rename = "imagePath")]
    Path(String),
    /// The photo itself, as sent by the caller.
    #[serde(rename = "imageBase64")]
    Inline(String),
}

/// JSON body of the generation endpoint: `{ imagePath | imageBase64, prompt }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateRequest {
    #[serde(flatten)]
    pub image: ImageSource,
    pub prompt: String,
}

impl GenerateRequest {
    pub fn by_path(path: impl Into<String>, prompt: &str) -> Self {
        Self {
            image: ImageSource::Path(path.into()),
            prompt: prompt.to_string(),
        }
    }

    pub fn inline(image: impl Into<String>, prompt: &str) -> Self {
        Self {
            image: ImageSource::Inline(image.into()),
            prompt: prompt.to_string(),
        }
    }
}

#[async_trait]
pub trait InteriorBackend: Send + Sync {
    /// Upload the room photo; returns the server-side file name.
    async fn upload(&self, image: &ImagePayload, prompt: &str) -> Result<String>;

    /// Ask for a render; non-2xx replies are errors.
    async fn generate(&self, request: &GenerateRequest) -> Result<RawResponse>;
}
