use super::{GenerateRequest, InteriorBackend};
use crate::image::ImagePayload;
use crate::models::{Config, UploadField};
use crate::response::{reported_message, RawResponse};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    filename: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<serde_json::Value>,
    message: Option<serde_json::Value>,
}

/// reqwest-backed client for the upload and generation endpoints.
pub struct HttpBackend {
    client: Client,
    upload_url: String,
    generate_url: String,
    upload_field: UploadField,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Self {
        Self::new_with_client(config, Client::new())
    }

    pub fn new_with_client(config: &Config, client: Client) -> Self {
        Self {
            client,
            upload_url: config.upload_url(),
            generate_url: config.image_make_url(),
            upload_field: config.upload_field,
            timeout: config.timeout,
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else if e.is_connect() {
            Error::NetworkUnreachable(e.to_string())
        } else {
            Error::Http(e)
        }
    }
}

/// Best human-readable message from a failed reply.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        if let Some(message) = parsed
            .error
            .as_ref()
            .and_then(reported_message)
            .or_else(|| parsed.message.as_ref().and_then(reported_message))
        {
            return message;
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if !text.is_empty() {
        return text.to_string();
    }

    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

#[async_trait]
impl InteriorBackend for HttpBackend {
    async fn upload(&self, image: &ImagePayload, prompt: &str) -> Result<String> {
        let file_name = image.upload_file_name();
        tracing::debug!(
            "Uploading room photo as '{}' field '{}' ({} bytes, {})",
            file_name,
            self.upload_field.as_str(),
            image.data.len(),
            image.mime_type
        );

        let part = Part::bytes(image.data.clone())
            .file_name(file_name)
            .mime_str(&image.mime_type)?;
        let form = Form::new()
            .text("prompt", prompt.to_string())
            .part(self.upload_field.as_str(), part);

        let response = self
            .client
            .post(&self.upload_url)
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send upload request: {}", e);
                self.transport_error(e)
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let message = error_message(status, &body);
            tracing::error!("Upload rejected (status {}): {}", status, message);
            return Err(Error::UploadFailed {
                status: Some(status.as_u16()),
                message,
            });
        }

        let parsed: UploadResponse =
            serde_json::from_slice(&body).map_err(|e| Error::UploadFailed {
                status: None,
                message: format!("invalid upload response: {}", e),
            })?;

        parsed
            .filename
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::UploadFailed {
                status: None,
                message: "upload response did not include a filename".to_string(),
            })
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<RawResponse> {
        let response = self
            .client
            .post(&self.generate_url)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send generation request: {}", e);
                self.transport_error(e)
            })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?
            .to_vec();

        if !status.is_success() {
            let message = error_message(status, &body);
            tracing::error!("Generation rejected (status {}): {}", status, message);
            return Err(Error::GenerationRejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(RawResponse::new(status.as_u16(), content_type, body))
    }
}
