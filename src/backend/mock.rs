use super::{GenerateRequest, InteriorBackend};
use crate::image::ImagePayload;
use crate::response::RawResponse;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Scripted backend. Replies are consumed in order; once a queue runs dry
/// every further call fails.
#[derive(Clone)]
pub struct MockBackend {
    upload_replies: Arc<Mutex<VecDeque<Result<String>>>>,
    generate_replies: Arc<Mutex<VecDeque<Result<RawResponse>>>>,
    uploads: Arc<Mutex<Vec<(ImagePayload, String)>>>,
    generate_requests: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            upload_replies: Arc::new(Mutex::new(VecDeque::new())),
            generate_replies: Arc::new(Mutex::new(VecDeque::new())),
            uploads: Arc::new(Mutex::new(Vec::new())),
            generate_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_upload_reply(self, reply: Result<String>) -> Self {
        self.upload_replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_generate_reply(self, reply: Result<RawResponse>) -> Self {
        self.generate_replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn get_upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn get_generate_count(&self) -> usize {
        self.generate_requests.lock().unwrap().len()
    }

    pub fn get_uploads(&self) -> Vec<(ImagePayload, String)> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn get_generate_requests(&self) -> Vec<GenerateRequest> {
        self.generate_requests.lock().unwrap().clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InteriorBackend for MockBackend {
    async fn upload(&self, image: &ImagePayload, prompt: &str) -> Result<String> {
        self.uploads
            .lock()
            .unwrap()
            .push((image.clone(), prompt.to_string()));

        self.upload_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(Error::UploadFailed {
                    status: Some(503),
                    message: "no scripted upload reply".to_string(),
                })
            })
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<RawResponse> {
        self.generate_requests.lock().unwrap().push(request.clone());

        self.generate_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(Error::GenerationRejected {
                    status: 503,
                    message: "no scripted generate reply".to_string(),
                })
            })
    }
}
