//! In-memory store behind `blob:` image references.
//!
//! Binary renders are kept here and handed out as opaque URLs. Whoever holds
//! the URL last is responsible for revoking it.

use std::collections::HashMap;
use uuid::Uuid;

pub const BLOB_URL_PREFIX: &str = "blob:interior-stager/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct ObjectStore {
    objects: HashMap<String, StoredObject>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, content_type: &str, data: Vec<u8>) -> String {
        let url = format!("{}{}", BLOB_URL_PREFIX, Uuid::new_v4());
        self.objects.insert(
            url.clone(),
            StoredObject {
                content_type: content_type.to_string(),
                data,
            },
        );
        url
    }

    pub fn resolve(&self, url: &str) -> Option<&StoredObject> {
        self.objects.get(url)
    }

    /// Release an object. Returns false for unknown or non-blob URLs.
    pub fn revoke(&mut self, url: &str) -> bool {
        self.objects.remove(url).is_some()
    }

    pub fn is_blob_url(url: &str) -> bool {
        url.starts_with(BLOB_URL_PREFIX)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
