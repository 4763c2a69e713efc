//! Runtime configuration.

use std::time::Duration;

use reqwest::Url;

use crate::error::AccessKitError;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;
/// Default retries for transient HTTP failures (total attempts = retries + 1).
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default number of access attempts kept on the device.
pub const DEFAULT_MAX_LOG_ENTRIES: u32 = 100;
/// Default number of log entries waiting for upload.
pub const DEFAULT_OUTBOX_CAPACITY: u32 = 50;
/// Credentials expiring within this window should be refreshed.
pub const DEFAULT_REFRESH_THRESHOLD_SECS: u64 = 24 * 60 * 60;

/// Settings for an [`crate::AccessKit`] instance.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct AccessKitConfig {
    /// Base URL of the access API, e.g. `https://api.example.com`.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Retries for timeouts, connection errors, 429 and 5xx responses.
    pub max_retries: u32,
    /// Access attempts kept in the local log.
    pub max_log_entries: u32,
    /// Log entries queued for upload before the oldest are dropped.
    pub outbox_capacity: u32,
    /// Refresh window for expiring credentials, in seconds.
    pub refresh_threshold_secs: u64,
}

impl AccessKitConfig {
    /// Configuration with default limits for the given API base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            max_log_entries: DEFAULT_MAX_LOG_ENTRIES,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
            refresh_threshold_secs: DEFAULT_REFRESH_THRESHOLD_SECS,
        }
    }

    /// Checks the base URL and limits.
    ///
    /// Plain `http` is only accepted for loopback hosts.
    ///
    /// # Errors
    ///
    /// Returns [`AccessKitError::InvalidInput`] naming the offending field.
    pub fn validate(&self) -> Result<(), AccessKitError> {
        let url = Url::parse(&self.base_url).map_err(|e| AccessKitError::InvalidInput {
            attribute: "base_url".to_string(),
            reason: e.to_string(),
        })?;

        let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));
        match url.scheme() {
            "https" => {}
            "http" if loopback => {}
            scheme => {
                return Err(AccessKitError::InvalidInput {
                    attribute: "base_url".to_string(),
                    reason: format!("scheme `{scheme}` is not allowed, use https"),
                })
            }
        }

        if self.max_log_entries == 0 {
            return Err(AccessKitError::InvalidInput {
                attribute: "max_log_entries".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Refresh window as a signed duration for date arithmetic.
    #[must_use]
    pub fn refresh_threshold(&self) -> chrono::Duration {
        i64::try_from(self.refresh_threshold_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    /// API base URL without a trailing slash.
    #[must_use]
    pub fn api_base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
