//! Temporary byte staging between a fetch and the parser.
//!
//! Every model payload is parked under a unique `blob:` address while it is
//! parsed. The address is revoked when the [`StagedBlob`] drops, so the
//! parse path releases it on success, failure and unwind alike.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use uuid::Uuid;

/// Registry of live staged payloads.
#[derive(Debug, Clone, Default)]
pub struct StagingArea {
    live: Arc<Mutex<FxHashSet<String>>>,
}

impl StagingArea {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `bytes` under a fresh `blob:` address.
    #[must_use]
    pub fn stage(&self, bytes: Vec<u8>) -> StagedBlob {
        let url = format!("blob:animsync/{}", Uuid::new_v4());
        self.live.lock().insert(url.clone());
        log::trace!("Staged {} bytes at {url}", bytes.len());
        StagedBlob {
            url,
            bytes,
            live: Arc::clone(&self.live),
        }
    }

    /// Number of staged payloads not yet revoked.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }
}

/// Bytes parked under a `blob:` address until dropped.
#[derive(Debug)]
pub struct StagedBlob {
    url: String,
    bytes: Vec<u8>,
    live: Arc<Mutex<FxHashSet<String>>>,
}

impl StagedBlob {
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for StagedBlob {
    fn drop(&mut self) {
        if self.live.lock().remove(&self.url) {
            log::trace!("Revoked {}", self.url);
        }
    }
}
