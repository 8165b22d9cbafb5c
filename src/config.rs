// src/config.rs
// =============================================================================
// Configuration values for the pipeline.
//
// Rendering options are a plain value handed to every render call instead of
// process-wide state, so two renders with different options never interfere
// (tests rely on this). The CLI is the only place these get built from user
// input; see the From<&Cli> impls at the bottom.
// =============================================================================

use crate::cli::{Cli, RenderFlags};

/// Default directory (or base URL) local document names resolve against
pub const DEFAULT_MD_ROOT: &str = "public/md";

/// Default id of the element the rendered document is written into
pub const DEFAULT_CONTAINER_ID: &str = "view";

/// Language used for code blocks with a missing or unknown tag
pub const DEFAULT_LANGUAGE: &str = "javascript";

/// How Markdown is turned into HTML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// GitHub-flavored extensions: tables, strikethrough, task lists, footnotes
    pub gfm: bool,
    /// Single newlines inside a paragraph become `<br />`
    pub breaks: bool,
    /// Curly quotes, en/em dashes and ellipses
    pub smartypants: bool,
    /// Clean the output HTML (drops scripts, event handlers, js: URLs)
    pub sanitize: bool,
    /// Run code blocks through the highlighter while rendering
    pub highlight: bool,
    pub default_language: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            breaks: true,
            smartypants: true,
            sanitize: true,
            highlight: true,
            default_language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Everything one pipeline run needs besides the source itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub render: RenderOptions,
    /// Prefix for local names: a directory or an http(s) base URL
    pub md_root: String,
    pub container_id: String,
    /// Leading images the viewport reports as fully visible after activation
    pub visible: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            render: RenderOptions::default(),
            md_root: DEFAULT_MD_ROOT.to_string(),
            container_id: DEFAULT_CONTAINER_ID.to_string(),
            visible: 0,
        }
    }
}

impl From<&RenderFlags> for RenderOptions {
    fn from(flags: &RenderFlags) -> Self {
        Self {
            gfm: !flags.no_gfm,
            breaks: !flags.no_breaks,
            smartypants: !flags.no_smartypants,
            sanitize: !flags.no_sanitize,
            highlight: !flags.no_highlight,
            default_language: flags.default_language.clone(),
        }
    }
}

impl From<&Cli> for ServiceConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            render: RenderOptions::from(&cli.render),
            md_root: cli.md_root.clone(),
            container_id: cli.container.clone(),
            visible: cli.visible,
        }
    }
}
