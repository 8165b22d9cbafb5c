// src/source/mod.rs
// =============================================================================
// This module knows where a Markdown document comes from and how to get it.
//
// A document source is one of:
// - a local name, resolved to `<md-root>/<name>.md`
// - a remote URL, requested as-is and read as plain text
// - a GitHub contents API URL, whose JSON envelope carries Base64 content
//
// The GitHub case is its own variant instead of a "does the URL contain
// github.com" check at fetch time. Classification happens once, up front.
// =============================================================================

mod fetch;

use serde::Serialize;
use url::Url;

pub use fetch::{decode_contents_envelope, Fetcher};

/// Host serving the GitHub contents API
const GITHUB_API_HOST: &str = "api.github.com";

/// Where the raw Markdown text comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentSource {
    /// A document under the local Markdown root
    Local { name: String },
    /// Any URL whose body is the Markdown text itself
    Remote { url: String },
    /// A GitHub contents API URL (JSON envelope, Base64 `content`)
    GithubContents { url: String },
}

impl DocumentSource {
    pub fn local(name: impl Into<String>) -> Self {
        DocumentSource::Local { name: name.into() }
    }

    // Builds a remote source, classifying GitHub API URLs by host
    //
    // `force_github` lets the caller declare the envelope format explicitly,
    // e.g. for a GitHub Enterprise host we can't recognise.
    pub fn remote(url: impl Into<String>, force_github: bool) -> Self {
        let url = url.into();
        if force_github || is_github_api_url(&url) {
            DocumentSource::GithubContents { url }
        } else {
            DocumentSource::Remote { url }
        }
    }

    /// Human-readable description for log lines
    pub fn describe(&self) -> String {
        match self {
            DocumentSource::Local { name } => format!("local:{}", name),
            DocumentSource::Remote { url } => url.clone(),
            DocumentSource::GithubContents { url } => format!("github:{}", url),
        }
    }
}

// Checks whether a URL points at the GitHub contents API
//
// Only the host is compared, so a raw.githubusercontent.com or github.com
// page URL stays a plain remote source. Unparsable URLs are not GitHub.
fn is_github_api_url(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.eq_ignore_ascii_case(GITHUB_API_HOST)))
        .unwrap_or(false)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why an enum with data inside each variant?
//    - Each kind of source needs different data (a name vs. a URL)
//    - `match` on the enum makes the fetcher handle every kind; adding a new
//      variant becomes a compile error until it's handled everywhere
//
// 2. What does #[serde(tag = "kind")] do?
//    - It serialises the variant name as a field next to the data:
//      {"kind": "local", "name": "readme"}
//    - That's the shape that shows up in the --json report
//
// 3. What is `impl Into<String>`?
//    - The parameter accepts anything convertible to a String (&str,
//      String, ...)
//    - Callers can write DocumentSource::local("readme") without
//      .to_string()
// -----------------------------------------------------------------------------
