// src/error.rs
// =============================================================================
// Error types for the fetch → render pipeline.
//
// Only the fetch step can really fail. Everything downstream (front-matter,
// rendering, image rewriting) fails open and just leaves its input alone.
//
// Two families matter to callers:
// - network errors: bad HTTP status, connection problems, unreadable files
// - decode errors: malformed GitHub JSON, bad Base64, invalid UTF-8
// =============================================================================

use std::path::PathBuf;
use std::string::FromUtf8Error;

use thiserror::Error;

/// Everything that can go wrong while producing a rendered page.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The server answered with a non-success status
    #[error("failed to fetch {url}: HTTP {status}")]
    Network { url: String, status: u16 },

    /// The request never produced a response (DNS, TLS, timeout, ...)
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A local document could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The contents API response was not the JSON envelope we expected
    #[error("malformed contents envelope: {0}")]
    Envelope(#[from] serde_json::Error),

    /// The envelope declared an encoding we don't understand
    #[error("unsupported content encoding: {0}")]
    Encoding(String),

    #[error("invalid base64 content: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("content is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The page template has no element with the requested id
    #[error("template has no container element with id \"{0}\"")]
    Template(String),
}

impl ViewerError {
    /// True for the network family (status, transport and I/O failures)
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ViewerError::Network { .. } | ViewerError::Request(_) | ViewerError::Io { .. }
        )
    }

    /// True for the decode family (envelope, Base64 and UTF-8 failures)
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            ViewerError::Envelope(_)
                | ViewerError::Encoding(_)
                | ViewerError::Decode(_)
                | ViewerError::Utf8(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;
