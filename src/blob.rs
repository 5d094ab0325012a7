//! Revocable in-memory object URLs
//!
//! A generated image is held in a [`BlobStore`] and addressed by a
//! `blob:<uuid>` URL, the same way a browser hands out object URLs. The bytes
//! stay alive until the URL is revoked, so whoever creates a URL owns its
//! release.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

const URL_SCHEME: &str = "blob:";

#[derive(Clone, Default)]
pub struct BlobStore {
    entries: Arc<Mutex<HashMap<String, Arc<Vec<u8>>>>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Arc<Vec<u8>>>> {
        // A poisoned map is still a consistent map; no invariant spans entries.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn create_object_url(&self, data: Arc<Vec<u8>>) -> String {
        let url = format!("{}{}", URL_SCHEME, Uuid::new_v4());
        self.entries().insert(url.clone(), data);
        tracing::debug!("Allocated object URL {}", url);
        url
    }

    /// Releases the bytes behind `url`. Unknown or already revoked URLs are
    /// ignored.
    pub fn revoke_object_url(&self, url: &str) {
        if self.entries().remove(url).is_some() {
            tracing::debug!("Revoked object URL {}", url);
        }
    }

    pub fn resolve(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        self.entries().get(url).cloned()
    }

    pub fn live_handles(&self) -> usize {
        self.entries().len()
    }
}

impl std::fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore")
            .field("live_handles", &self.live_handles())
            .finish()
    }
}
