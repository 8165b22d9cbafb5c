// src/lib.rs
// =============================================================================
// mdview: fetch a Markdown document, render it into a page, lazy-load images.
//
// Module map (data flows top to bottom):
// - source:   DocumentSource + Fetcher (local file, URL, GitHub contents API)
// - pipeline: front matter, Markdown rendering, highlighting, <img> rewrite
// - page:     the host Page and the lazy-load observer
// - service:  init_service, which runs all of the above in order
//
// Plus the ambient pieces: cli, config, error, logging.
// =============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod page;
pub mod pipeline;
pub mod service;
pub mod source;

pub use config::{RenderOptions, ServiceConfig};
pub use error::{Result, ViewerError};
pub use page::Page;
pub use service::{init_service, Rendered};
pub use source::{DocumentSource, Fetcher};
