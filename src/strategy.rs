//! Submission strategies, tried in order until one succeeds.
//!
//! The backend's accepted request shape is not known up front, so the chain
//! starts with the upload path (which uses the caller's actual photo) and
//! falls back to either a server-side reference image or inline image data.

use crate::backend::{GenerateRequest, InteriorBackend};
use crate::image::ImagePayload;
use crate::models::Config;
use crate::objects::ObjectStore;
use crate::response::{normalize, NormalizedResponse};
use crate::Result;

/// Directory the backend stores uploads under.
pub const UPLOAD_DIR: &str = "images";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Multipart upload of the photo, then a generation request referencing it.
    UploadThenReference,
    /// Generation request referencing an image already on the server.
    Reference(String),
    /// Generation request carrying the photo inline.
    Inline,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::UploadThenReference => "upload-then-reference",
            Strategy::Reference(_) => "reference",
            Strategy::Inline => "inline",
        }
    }

    /// Run this strategy once. `image` is the caller's data URI.
    pub async fn attempt(
        &self,
        backend: &dyn InteriorBackend,
        image: &str,
        prompt: &str,
        objects: &mut ObjectStore,
    ) -> Result<NormalizedResponse> {
        let request = match self {
            Strategy::UploadThenReference => {
                let payload = ImagePayload::from_data_uri(image)?;
                let filename = backend.upload(&payload, prompt).await?;
                GenerateRequest::by_path(format!("{}/{}", UPLOAD_DIR, filename), prompt)
            }
            Strategy::Reference(path) => GenerateRequest::by_path(path.clone(), prompt),
            Strategy::Inline => GenerateRequest::inline(image, prompt),
        };

        let raw = backend.generate(&request).await?;
        normalize(&raw, objects)
    }
}

/// Strategies for one variation, in the order they are tried.
pub fn fallback_chain(config: &Config) -> Vec<Strategy> {
    let mut chain = vec![Strategy::UploadThenReference];

    if config.expects_image_path {
        let path = config.fallback_image_path.clone();
        let png = png_variant(&path);
        chain.push(Strategy::Reference(path));
        if let Some(png) = png {
            chain.push(Strategy::Reference(png));
        }
    } else {
        chain.push(Strategy::Inline);
    }

    chain
}

/// `.jpg`/`.jpeg` path with a `.png` extension instead; `None` for anything else.
pub fn png_variant(path: &str) -> Option<String> {
    let lower = path.to_ascii_lowercase();
    [".jpeg", ".jpg"]
        .iter()
        .find(|ext| lower.ends_with(*ext))
        .map(|ext| format!("{}.png", &path[..path.len() - ext.len()]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ImageSource, MockBackend};
    use crate::response::RawResponse;
    use crate::Error;
    use serde_json::json;

    const IMAGE: &str = "data:image/png;base64,iVBORw0KGgo=";

    fn config(expects_image_path: bool, fallback: &str) -> Config {
        Config {
            expects_image_path,
            fallback_image_path: fallback.to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_png_variant() {
        assert_eq!(png_variant("images/room.jpg"), Some("images/room.png".to_string()));
        assert_eq!(png_variant("images/room.JPEG"), Some("images/room.png".to_string()));
        assert_eq!(png_variant("images/room.png"), None);
        assert_eq!(png_variant("images/room.webp"), None);
        assert_eq!(png_variant("images/jpg"), None);
    }

    #[test]
    fn test_chain_with_image_path_and_jpg_fallback() {
        let chain = fallback_chain(&config(true, "images/sample.jpg"));
        assert_eq!(
            chain,
            vec![
                Strategy::UploadThenReference,
                Strategy::Reference("images/sample.jpg".to_string()),
                Strategy::Reference("images/sample.png".to_string()),
            ]
        );
    }

    #[test]
    fn test_chain_with_image_path_and_png_fallback() {
        let chain = fallback_chain(&config(true, "images/sample.png"));
        assert_eq!(
            chain,
            vec![
                Strategy::UploadThenReference,
                Strategy::Reference("images/sample.png".to_string()),
            ]
        );
    }

    #[test]
    fn test_chain_without_image_path() {
        let chain = fallback_chain(&config(false, "images/sample.jpg"));
        assert_eq!(chain, vec![Strategy::UploadThenReference, Strategy::Inline]);
    }

    #[tokio::test]
    async fn test_upload_strategy_references_uploaded_file() {
        let backend = MockBackend::new()
            .with_upload_reply(Ok("abc123.png".to_string()))
            .with_generate_reply(Ok(RawResponse::json(json!({ "result": "AAAA" }))));
        let mut objects = ObjectStore::new();

        let normalized = Strategy::UploadThenReference
            .attempt(&backend, IMAGE, "prompt", &mut objects)
            .await
            .unwrap();

        assert_eq!(normalized.results.len(), 1);
        let uploads = backend.get_uploads();
        assert_eq!(uploads[0].0.mime_type, "image/png");
        assert_eq!(uploads[0].1, "prompt");
        assert_eq!(
            backend.get_generate_requests()[0].image,
            ImageSource::Path("images/abc123.png".to_string())
        );
    }

    #[tokio::test]
    async fn test_upload_strategy_fails_before_network_on_bad_image() {
        let backend = MockBackend::new();
        let mut objects = ObjectStore::new();

        let err = Strategy::UploadThenReference
            .attempt(&backend, "data:image/png;base64,%%%", "p", &mut objects)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidImage(_)));
        assert_eq!(backend.get_upload_count(), 0);
        assert_eq!(backend.get_generate_count(), 0);
    }

    #[tokio::test]
    async fn test_inline_strategy_sends_original_data_uri() {
        let backend = MockBackend::new()
            .with_generate_reply(Ok(RawResponse::image("image/jpeg", vec![0xFF, 0xD8])));
        let mut objects = ObjectStore::new();

        let normalized = Strategy::Inline
            .attempt(&backend, IMAGE, "p", &mut objects)
            .await
            .unwrap();

        assert_eq!(
            backend.get_generate_requests()[0].image,
            ImageSource::Inline(IMAGE.to_string())
        );
        assert!(objects.resolve(&normalized.results[0].image).is_some());
    }
}
