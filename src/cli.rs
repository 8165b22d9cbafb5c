// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands pick the document source:
//   mdview local readme                          -> public/md/readme.md
//   mdview remote https://example.com/notes.md
//   mdview remote https://api.github.com/repos/OWNER/REPO/readme
//
// Every other flag is global, so it can go before or after the subcommand.
// =============================================================================

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::{DEFAULT_CONTAINER_ID, DEFAULT_LANGUAGE, DEFAULT_MD_ROOT};
use crate::source::DocumentSource;

// The whole CLI: a subcommand plus global options
#[derive(Parser, Debug)]
#[command(
    name = "mdview",
    version,
    about = "Render a Markdown document into an HTML page",
    long_about = "mdview fetches a Markdown document (a local file, any URL, or a GitHub \
                  contents API response), strips its front matter, renders it with \
                  highlighted code blocks and writes it into a page container with \
                  lazy-loading images."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory or http(s) base URL that local names resolve against
    #[arg(long, global = true, default_value = DEFAULT_MD_ROOT)]
    pub md_root: String,

    /// HTML template holding the output container (a minimal page otherwise)
    #[arg(long, global = true)]
    pub template: Option<PathBuf>,

    /// Id of the element the document is written into
    #[arg(long, global = true, default_value = DEFAULT_CONTAINER_ID)]
    pub container: String,

    /// Write the page to this file instead of stdout
    #[arg(long, global = true)]
    pub out: Option<PathBuf>,

    /// Number of leading images treated as fully visible on first paint
    #[arg(long, global = true, default_value_t = 0)]
    pub visible: usize,

    /// Print a JSON report (front matter, image states) instead of the page
    #[arg(long, global = true)]
    pub json: bool,

    /// More logging (-v debug, -vv trace); RUST_LOG wins when set
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(flatten)]
    pub render: RenderFlags,
}

// Switches for the Markdown renderer; everything is on by default
#[derive(Args, Debug)]
pub struct RenderFlags {
    /// Disable tables, strikethrough, task lists and footnotes
    #[arg(long, global = true)]
    pub no_gfm: bool,

    /// Keep single newlines as soft breaks
    #[arg(long, global = true)]
    pub no_breaks: bool,

    /// Keep straight quotes and plain dashes
    #[arg(long, global = true)]
    pub no_smartypants: bool,

    /// Pass embedded HTML through unchanged
    #[arg(long, global = true)]
    pub no_sanitize: bool,

    /// Leave code blocks unhighlighted while rendering
    #[arg(long, global = true)]
    pub no_highlight: bool,

    /// Language for code blocks with a missing or unknown tag
    #[arg(long, global = true, default_value = DEFAULT_LANGUAGE)]
    pub default_language: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a document from the local Markdown root
    ///
    /// Example: mdview local readme --out index.html
    Local {
        /// Document name without the .md suffix
        name: String,
    },

    /// Render a document fetched from a URL
    ///
    /// Example: mdview remote https://api.github.com/repos/rust-lang/rust/readme
    Remote {
        /// URL of the document (or of a GitHub contents API entry)
        url: String,

        /// Treat the response as a GitHub contents API envelope even if the
        /// host isn't api.github.com
        #[arg(long)]
        github: bool,
    },
}

impl Commands {
    pub fn source(&self) -> DocumentSource {
        match self {
            Commands::Local { name } => DocumentSource::local(name.clone()),
            Commands::Remote { url, github } => DocumentSource::remote(url.clone(), *github),
        }
    }
}
