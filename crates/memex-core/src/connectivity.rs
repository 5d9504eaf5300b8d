//! Connectivity probe interface.
//!
//! Both pipelines refuse to run without a live connection so that an empty
//! outcome is never silently reported when the real cause is network
//! unavailability. The probe is injected so pipelines stay testable offline.

use async_trait::async_trait;

/// Reports whether the network is reachable right now.
#[async_trait]
pub trait Connectivity: Send + Sync {
    /// Short bounded probe against a known-reachable host. Never errors;
    /// any failure means "offline".
    async fn is_online(&self) -> bool;
}
