//! Keyed rate gate: enforces a minimum spacing between consecutive calls
//! sharing a logical key (one in-flight generative call per key).

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Enforces minimum spacing between calls that share a key.
pub struct RateGate {
    min_interval: Duration,
    next_allowed: Mutex<HashMap<String, Instant>>,
}

impl RateGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_allowed: Mutex::new(HashMap::new()),
        }
    }

    /// Waits until the key's slot opens, then claims the next slot.
    ///
    /// The slot is reserved under the lock and the sleep happens outside it,
    /// so gating one key never stalls calls on other keys.
    pub async fn wait(&self, key: &str) {
        let reserved = {
            let mut next_allowed = self.next_allowed.lock().await;
            let now = Instant::now();
            let slot = match next_allowed.get(key) {
                Some(at) if *at > now => *at,
                _ => now,
            };
            next_allowed.insert(key.to_string(), slot + self.min_interval);
            slot
        };

        let now = Instant::now();
        if reserved > now {
            debug!(key = %key, wait_ms = (reserved - now).as_millis() as u64, "rate gate waiting");
            tokio::time::sleep_until(reserved).await;
        }
    }
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spaces_calls_on_the_same_key() {
        let gate = RateGate::new(Duration::from_millis(50));
        let start = Instant::now();
        gate.wait("summarize").await;
        gate.wait("summarize").await;
        gate.wait("summarize").await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn different_keys_do_not_block_each_other() {
        let gate = RateGate::new(Duration::from_millis(200));
        gate.wait("summarize").await;
        let start = Instant::now();
        gate.wait("embed").await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
