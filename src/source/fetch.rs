// src/source/fetch.rs
// =============================================================================
// This module turns a DocumentSource into raw Markdown text.
//
// Strategy:
// - Local names become `<md-root>/<name>.md`. The root is either a directory
//   on disk or an http(s) base URL, in which case the file is requested over
//   HTTP just like a remote source.
// - Remote URLs are requested as-is and the body is the document.
// - GitHub contents API URLs return a JSON envelope; its `content` field is
//   Base64 (wrapped with newlines) and decodes to UTF-8 text.
//
// The result is always UTF-8. Plain bodies are decoded lossily so a stray
// byte in someone's README doesn't sink the whole page; the Base64 path is
// strict because a bad decode there means the envelope itself is broken.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::DocumentSource;
use crate::error::{Result, ViewerError};

// The GitHub API rejects requests without a User-Agent
const USER_AGENT: &str = concat!("mdview/", env!("CARGO_PKG_VERSION"));

/// Shape of a GitHub contents API response (only the fields we use)
#[derive(Debug, Deserialize)]
struct ContentsEnvelope {
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

/// Where a local name ends up after resolution
#[derive(Debug, Clone, PartialEq, Eq)]
enum LocalTarget {
    Path(PathBuf),
    Url(String),
}

/// Fetches documents for every kind of DocumentSource
///
/// Holds one HTTP client so connection setup is shared between requests.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    md_root: String,
}

impl Fetcher {
    // Creates a fetcher resolving local names against `md_root`
    //
    // Parameters:
    //   md_root: directory (e.g. "public/md") or base URL (e.g.
    //            "https://example.com/public/md")
    pub fn new(md_root: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            md_root: md_root.into(),
        })
    }

    // Fetches the raw document text for a source
    //
    // Returns: the document as UTF-8 text, or the first error hit on the way
    pub async fn fetch(&self, source: &DocumentSource) -> Result<String> {
        match source {
            DocumentSource::Local { name } => match resolve_local(&self.md_root, name)? {
                LocalTarget::Path(path) => {
                    info!(path = %path.display(), "reading local document");
                    read_file(path).await
                }
                LocalTarget::Url(url) => {
                    info!(%url, "fetching local document over HTTP");
                    fetch_text(&self.client, &url).await
                }
            },
            DocumentSource::Remote { url } => {
                info!(%url, "fetching remote document");
                fetch_text(&self.client, url).await
            }
            DocumentSource::GithubContents { url } => {
                info!(%url, "fetching GitHub contents envelope");
                let body = fetch_text(&self.client, url).await?;
                decode_contents_envelope(&body)
            }
        }
    }
}

// Resolves a local name to `<root>/<name>.md`
//
// Examples:
//   ("public/md", "foo")               -> Path("public/md/foo.md")
//   ("https://example.com/md", "foo")  -> Url("https://example.com/md/foo.md")
fn resolve_local(md_root: &str, name: &str) -> Result<LocalTarget> {
    let file_name = format!("{}.md", name);

    if md_root.starts_with("http://") || md_root.starts_with("https://") {
        // Url::join replaces the last segment unless the base ends with '/'
        let base = if md_root.ends_with('/') {
            md_root.to_string()
        } else {
            format!("{}/", md_root)
        };
        let joined = Url::parse(&base)
            .and_then(|base| base.join(&file_name))
            .map_err(|source| ViewerError::InvalidUrl {
                url: base.clone(),
                source,
            })?;
        return Ok(LocalTarget::Url(joined.to_string()));
    }

    Ok(LocalTarget::Path(PathBuf::from(md_root).join(file_name)))
}

async fn read_file(path: PathBuf) -> Result<String> {
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(source) => Err(ViewerError::Io { path, source }),
    }
}

// Fetches a URL and returns its body as text
//
// Any non-2xx status is a network error; the body is not looked at.
async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ViewerError::Network {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().await?;
    debug!(%url, bytes = bytes.len(), "response received");
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// Decodes a GitHub contents API response body into the document text
//
// The API wraps the Base64 payload at 60 columns, so whitespace is dropped
// before decoding.
pub fn decode_contents_envelope(body: &str) -> Result<String> {
    let envelope: ContentsEnvelope = serde_json::from_str(body)?;

    if let Some(encoding) = envelope.encoding.as_deref() {
        if !encoding.eq_ignore_ascii_case("base64") {
            return Err(ViewerError::Encoding(encoding.to_string()));
        }
    }

    let compact: String = envelope
        .content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD.decode(compact.as_bytes())?;

    Ok(String::from_utf8(bytes)?)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why `use base64::Engine as _`?
//    - decode() is a trait method on Engine
//    - Importing the trait "as _" brings the method into scope without
//      taking up the name `Engine`
//
// 2. What does `?` do with different error types here?
//    - serde_json, base64 and UTF-8 errors each have a #[from] conversion
//      into ViewerError (see src/error.rs)
//    - So `?` converts them automatically while returning early
//
// 3. Why from_utf8_lossy for plain bodies but from_utf8 for Base64?
//    - Lossy decoding swaps bad bytes for U+FFFD and never fails
//    - Strict decoding fails, which is what we want when the envelope
//      itself is corrupt
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_local_path() {
        let target = resolve_local("public/md", "foo").unwrap();
        assert_eq!(target, LocalTarget::Path(PathBuf::from("public/md/foo.md")));
    }

    #[test]
    fn test_resolve_local_url() {
        let target = resolve_local("https://example.com/public/md", "foo").unwrap();
        assert_eq!(
            target,
            LocalTarget::Url("https://example.com/public/md/foo.md".to_string())
        );
    }

    #[test]
    fn test_decode_envelope() {
        // "# Héllo 世界\n" in UTF-8, wrapped like the API does
        let encoded = STANDARD.encode("# Héllo 世界\n".as_bytes());
        let (head, tail) = encoded.split_at(8);
        let body = format!(
            r#"{{"name":"README.md","encoding":"base64","content":"{}\n{}\n"}}"#,
            head, tail
        );
        assert_eq!(decode_contents_envelope(&body).unwrap(), "# Héllo 世界\n");
    }

    #[test]
    fn test_decode_envelope_without_encoding_field() {
        let body = format!(r#"{{"content":"{}"}}"#, STANDARD.encode("plain"));
        assert_eq!(decode_contents_envelope(&body).unwrap(), "plain");
    }

    #[test]
    fn test_malformed_json() {
        let err = decode_contents_envelope("<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, ViewerError::Envelope(_)));
        assert!(err.is_decode());
    }

    #[test]
    fn test_bad_base64() {
        let err = decode_contents_envelope(r#"{"content":"***"}"#).unwrap_err();
        assert!(matches!(err, ViewerError::Decode(_)));
    }

    #[test]
    fn test_invalid_utf8() {
        let body = format!(r#"{{"content":"{}"}}"#, STANDARD.encode([0xff, 0xfe, 0xfd]));
        let err = decode_contents_envelope(&body).unwrap_err();
        assert!(matches!(err, ViewerError::Utf8(_)));
    }

    #[test]
    fn test_unsupported_encoding() {
        let err = decode_contents_envelope(r#"{"content":"","encoding":"none"}"#).unwrap_err();
        assert!(matches!(err, ViewerError::Encoding(_)));
    }

    #[tokio::test]
    async fn test_missing_local_file() {
        let fetcher = Fetcher::new("/definitely/not/here").unwrap();
        let err = fetcher
            .fetch(&DocumentSource::local("readme"))
            .await
            .unwrap_err();
        assert!(matches!(err, ViewerError::Io { .. }));
        assert!(err.is_network());
    }
}
