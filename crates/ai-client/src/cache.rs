//! Content-hash response cache.
//!
//! Summaries and embeddings are cached by sha256 of their input text, with
//! LRU eviction at a fixed capacity. Injected as a dependency of the OpenAI
//! client rather than living in process-wide state, so pipelines stay
//! testable in isolation.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use sha2::{Digest, Sha256};

/// Bounded LRU cache keyed by content hash.
pub struct HashCache<V> {
    inner: Mutex<LruCache<String, V>>,
}

impl<V: Clone> HashCache<V> {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1");
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Cache key for a piece of input text.
    pub fn key_for(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hex_string(&hasher.finalize())
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.get(key).cloned()
    }

    pub fn put(&self, key: String, value: V) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.put(key, value);
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
