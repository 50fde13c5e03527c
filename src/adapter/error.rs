//! Error types for adapter operations.

use std::fmt;

use thiserror::Error;

/// One of the three operations an adapter exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// [`Adapter::search`](super::Adapter::search).
    Search,
    /// [`Adapter::fetch_manga_info`](super::Adapter::fetch_manga_info).
    FetchMangaInfo,
    /// [`Adapter::fetch_chapter_images`](super::Adapter::fetch_chapter_images).
    FetchChapterImages,
}

impl Capability {
    /// Returns the snake-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::FetchMangaInfo => "fetch_manga_info",
            Self::FetchChapterImages => "fetch_chapter_images",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors an adapter can report.
///
/// Fields are plain strings so errors can be cloned into events and
/// compared in tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// Transport failure (DNS, connection refused, TLS, reset).
    #[error("[{adapter}] network error fetching {url}: {message}")]
    Network {
        /// Adapter identifier.
        adapter: String,
        /// URL being fetched.
        url: String,
        /// Underlying error message.
        message: String,
    },

    /// The site did not answer in time.
    #[error("[{adapter}] timeout fetching {url}")]
    Timeout {
        /// Adapter identifier.
        adapter: String,
        /// URL being fetched.
        url: String,
    },

    /// The site answered with a non-success status.
    #[error("[{adapter}] HTTP {status} fetching {url}")]
    HttpStatus {
        /// Adapter identifier.
        adapter: String,
        /// URL being fetched.
        url: String,
        /// Status code.
        status: u16,
    },

    /// The response body did not have the expected shape.
    #[error("[{adapter}] could not decode response from {url}: {message}")]
    Decode {
        /// Adapter identifier.
        adapter: String,
        /// URL being fetched.
        url: String,
        /// Decoder message.
        message: String,
    },

    /// Adapter metadata or configuration is invalid.
    #[error("invalid adapter metadata: {field} {reason}\n  Suggestion: Provide a non-empty {field}")]
    InvalidMetadata {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The adapter does not provide this capability.
    #[error(
        "[{adapter}] does not implement {capability}\n  Suggestion: Disable this adapter or use one that supports {capability}"
    )]
    NotImplemented {
        /// Adapter identifier.
        adapter: String,
        /// Missing capability.
        capability: Capability,
    },

    /// Site-specific failure reported by a third-party adapter.
    #[error("[{adapter}] {message}")]
    Failed {
        /// Adapter identifier.
        adapter: String,
        /// Failure description.
        message: String,
    },
}

impl AdapterError {
    /// Maps a reqwest error to `Timeout`, `Decode` or `Network`.
    pub fn from_reqwest(adapter: &str, url: &str, error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                adapter: adapter.to_string(),
                url: url.to_string(),
            }
        } else if error.is_decode() {
            Self::decode(adapter, url, error.to_string())
        } else {
            Self::Network {
                adapter: adapter.to_string(),
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }

    /// Creates a decode error.
    pub fn decode(adapter: &str, url: &str, message: impl Into<String>) -> Self {
        Self::Decode {
            adapter: adapter.to_string(),
            url: url.to_string(),
            message: message.into(),
        }
    }

    /// Creates a not-implemented error.
    pub fn not_implemented(adapter: &str, capability: Capability) -> Self {
        Self::NotImplemented {
            adapter: adapter.to_string(),
            capability,
        }
    }

    /// Creates a generic site failure.
    pub fn failed(adapter: &str, message: impl Into<String>) -> Self {
        Self::Failed {
            adapter: adapter.to_string(),
            message: message.into(),
        }
    }

    /// Returns true if retrying the pipeline cannot help.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NotImplemented { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_implemented_is_fatal() {
        let err = AdapterError::not_implemented("mangadex", Capability::Search);
        assert!(err.is_fatal());
        let msg = err.to_string();
        assert!(msg.contains("mangadex"));
        assert!(msg.contains("search"));
    }

    #[test]
    fn test_http_status_is_not_fatal() {
        let err = AdapterError::HttpStatus {
            adapter: "a".to_string(),
            url: "http://x/manga/1".to_string(),
            status: 503,
        };
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[test]
    fn test_invalid_metadata_message_has_suggestion() {
        let err = AdapterError::InvalidMetadata {
            field: "id",
            reason: "must not be empty".to_string(),
        };
        assert!(err.to_string().contains("Suggestion: Provide a non-empty id"));
    }
}
