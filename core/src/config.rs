//! Client configuration.

use std::time::Duration;

/// How long an error banner stays visible.
pub const DEFAULT_ERROR_BANNER_TTL: Duration = Duration::from_secs(5);
/// How long a success banner stays visible.
pub const DEFAULT_SUCCESS_BANNER_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server origin. Empty means the page's own origin.
    pub base_url: String,
    pub error_banner_ttl: Duration,
    pub success_banner_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            error_banner_ttl: DEFAULT_ERROR_BANNER_TTL,
            success_banner_ttl: DEFAULT_SUCCESS_BANNER_TTL,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }
}
