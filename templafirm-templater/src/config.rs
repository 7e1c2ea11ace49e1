//! Templater configuration.

use std::time::Duration;

/// Provider activated by a fresh [`crate::Templater`].
pub const DEFAULT_PROVIDER: &str = "gke";

/// How long a render waits for its provider's lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-instance settings for a [`crate::Templater`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplaterConfig {
    /// Registry key activated on construction.
    pub default_provider: String,
    /// Upper bound on waiting for the active provider's lock.
    pub lock_timeout: Duration,
}

impl Default for TemplaterConfig {
    fn default() -> Self {
        Self {
            default_provider: DEFAULT_PROVIDER.to_string(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

impl TemplaterConfig {
    pub fn with_default_provider(mut self, provider_key: impl Into<String>) -> Self {
        self.default_provider = provider_key.into();
        self
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }
}
