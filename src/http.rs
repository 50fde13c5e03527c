//! Shared HTTP client construction for adapters and the page downloader.
//!
//! Both sides send the same User-Agent and use the same timeout policy so
//! traffic to one site looks consistent regardless of which stage issued it.

use std::time::Duration;

use reqwest::Client;

/// Default connect timeout in seconds.
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default read timeout in seconds. Applies per read, so large pages are not
/// cut off as long as bytes keep arriving.
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Connect/read timeout pair for HTTP clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// Seconds allowed to establish a connection.
    pub connect_secs: u64,
    /// Seconds allowed between reads.
    pub read_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: CONNECT_TIMEOUT_SECS,
            read_secs: READ_TIMEOUT_SECS,
        }
    }
}

/// User-Agent sent on every request.
#[must_use]
pub fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("manga-pipeline/{version}")
}

/// Builds a client with gzip, a per-client cookie store and `timeouts`.
///
/// # Errors
///
/// Returns the builder error if the TLS backend or system configuration
/// cannot be initialised.
pub fn build_client(timeouts: HttpTimeouts) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .read_timeout(Duration::from_secs(timeouts.read_secs))
        .gzip(true)
        .cookie_store(true)
        .user_agent(default_user_agent())
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_carries_crate_version() {
        let ua = default_user_agent();
        assert_eq!(
            ua.strip_prefix("manga-pipeline/").unwrap(),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn test_default_timeouts() {
        let timeouts = HttpTimeouts::default();
        assert_eq!(timeouts.connect_secs, 30);
        assert_eq!(timeouts.read_secs, 300);
    }

    #[test]
    fn test_build_client_succeeds() {
        assert!(build_client(HttpTimeouts::default()).is_ok());
    }
}
