//! Image payload handling
//!
//! Decodes data URIs into raw bytes for multipart upload, sniffs MIME types
//! from magic bytes, and probes dimensions for prompt construction.

use crate::{Error, Result};
use base64::Engine as _;
use std::io::Cursor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Wrap raw bytes, taking the MIME type from the bytes themselves.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let mime_type = detect_image_mime(&data);
        Self::new(mime_type, data)
    }

    /// Decode a `data:<mime>;base64,<payload>` URI.
    ///
    /// A bare base64 string is accepted too; its MIME type is sniffed.
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(Error::InvalidImage("image data is empty".to_string()));
        }

        let (declared, payload) = match uri.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest.split_once(',').ok_or_else(|| {
                    Error::InvalidImage("data URI has no ',' separator".to_string())
                })?;
                let mut params = header.split(';');
                let mime = params.next().unwrap_or_default().trim();
                if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
                    return Err(Error::InvalidImage(
                        "only base64-encoded data URIs are supported".to_string(),
                    ));
                }
                ((!mime.is_empty()).then(|| mime.to_ascii_lowercase()), payload)
            }
            None => (None, uri),
        };

        let data = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| Error::InvalidImage(format!("failed to decode base64 image: {}", e)))?;

        let mime_type = declared.unwrap_or_else(|| detect_image_mime(&data).to_string());
        Ok(Self { mime_type, data })
    }

    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }

    /// File extension matching the MIME type (`jpg` for JPEG, `png` when unknown).
    pub fn extension(&self) -> &str {
        if self.mime_type.contains("jpeg") {
            return "jpg";
        }
        self.mime_type
            .split_once('/')
            .map(|(_, subtype)| subtype)
            .filter(|subtype| !subtype.is_empty())
            .unwrap_or("png")
    }

    /// File name used for the multipart upload part.
    pub fn upload_file_name(&self) -> String {
        format!("upload.{}", self.extension())
    }

    pub fn dimensions(&self) -> Result<(u32, u32)> {
        let dimensions = image::ImageReader::new(Cursor::new(&self.data))
            .with_guessed_format()
            .map_err(|e| Error::InvalidImage(format!("failed to read image header: {}", e)))?
            .into_dimensions()?;
        Ok(dimensions)
    }
}

pub fn detect_image_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, 0x50, 0x4E, 0x47, ..] => "image/png",
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => "image/webp",
        [0x47, 0x49, 0x46, 0x38, ..] => "image/gif",
        _ => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), falling back to image/png",
                &bytes[..bytes.len().min(4)]
            );
            "image/png"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        image::RgbImage::new(width, height)
            .write_to(&mut buffer, image::ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_detect_png() {
        assert_eq!(
            detect_image_mime(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]),
            "image/png"
        );
    }

    #[test]
    fn test_detect_jpeg() {
        assert_eq!(detect_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
    }

    #[test]
    fn test_unknown_falls_back_to_png() {
        assert_eq!(detect_image_mime(&[]), "image/png");
    }

    #[test]
    fn test_from_data_uri_uses_declared_mime() {
        let payload = ImagePayload::from_data_uri("data:image/jpeg;base64,/9j/4AAQ").unwrap();
        assert_eq!(payload.mime_type, "image/jpeg");
        assert_eq!(&payload.data[..3], &[0xFF, 0xD8, 0xFF]);
        assert_eq!(payload.upload_file_name(), "upload.jpg");
    }

    #[test]
    fn test_from_bare_base64_sniffs_mime() {
        let payload = ImagePayload::from_data_uri("iVBORw0KGgo=").unwrap();
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(payload.upload_file_name(), "upload.png");
    }

    #[test]
    fn test_from_data_uri_rejects_garbage() {
        assert!(matches!(
            ImagePayload::from_data_uri(""),
            Err(Error::InvalidImage(_))
        ));
        assert!(matches!(
            ImagePayload::from_data_uri("data:image/png;base64"),
            Err(Error::InvalidImage(_))
        ));
        assert!(matches!(
            ImagePayload::from_data_uri("data:text/plain,hello"),
            Err(Error::InvalidImage(_))
        ));
        assert!(matches!(
            ImagePayload::from_data_uri("data:image/png;base64,!!!"),
            Err(Error::InvalidImage(_))
        ));
    }

    #[test]
    fn test_data_uri_round_trip_keeps_bytes() {
        let original = ImagePayload::new("image/webp", vec![1, 2, 3, 4]);
        let decoded = ImagePayload::from_data_uri(&original.to_data_uri()).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(decoded.extension(), "webp");
    }

    #[test]
    fn test_dimensions_from_png() {
        let payload = ImagePayload::from_bytes(png_bytes(4, 3));
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(payload.dimensions().unwrap(), (4, 3));
    }

    #[test]
    fn test_dimensions_of_non_image_fails() {
        let payload = ImagePayload::new("image/png", b"not an image".to_vec());
        assert!(payload.dimensions().is_err());
    }
}
