// src/pipeline/mod.rs
// =============================================================================
// The synchronous part of the pipeline, run once the document text is in hand:
//
//   raw text → strip front matter → render Markdown → rewrite <img> tags
//
// Submodules:
// - frontmatter: finds and removes the leading `---` block
// - render: pulldown-cmark + ammonia with explicit RenderOptions
// - highlight: syntect, used by render and by Page::highlight_all
// - lazy: turns `src` into `data-src` for lazy loading
// - markup: finds the real <img> tags (skipping <script>, comments, ...)
// =============================================================================

mod frontmatter;
mod highlight;
mod lazy;
mod markup;
mod render;

pub use frontmatter::{split as split_front_matter, strip as strip_front_matter, FrontMatter};
pub use highlight::Highlighter;
pub use lazy::{rewrite as rewrite_images, DATA_SRC_ATTR, LAZY_FLAG_ATTR};
pub use render::render;

pub(crate) use highlight::escape_html;
pub(crate) use markup::replace_img_tags;
