// src/page/document.rs
// =============================================================================
// The host page: an HTML template with one container element that receives
// the rendered document.
//
// The page is kept as three strings: markup before the container's content,
// the content itself, and markup after it. Replacing the content is then a
// plain assignment and the rest of the template is never reparsed or
// reformatted.
//
// Reading the container (finding images, code blocks) goes through `scraper`;
// writing back is done on the tag text so untouched markup stays byte-for-byte
// what the renderer produced.
// =============================================================================

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Result, ViewerError};
use crate::pipeline::{
    escape_html, replace_img_tags, Highlighter, DATA_SRC_ATTR, LAZY_FLAG_ATTR,
};

// Selector is a constant and known to be valid
static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("img selector is valid"));

// 1: name, 2/3/4: double-quoted, single-quoted or bare value
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s([^\s"'=/>]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("attribute pattern is valid")
});

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<pre>(\s*)<code([^>]*)>(.*?)</code>(\s*)</pre>")
        .expect("code block pattern is valid")
});

static CLASS_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\sclass="([^"]*)""#).expect("class pattern is valid"));

const HIGHLIGHTED_MARKER: &str = r#"data-highlighted="yes""#;

/// An <img> element inside the container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageElement {
    /// Position among the container's images, in document order
    pub index: usize,
    pub attributes: BTreeMap<String, String>,
}

impl ImageElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attributes.remove(name)
    }
}

/// A page template with a single output container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    container_id: String,
    before: String,
    inner: String,
    after: String,
}

impl Page {
    // Wraps a template, locating the element whose id is `container_id`
    //
    // Returns: Template error when no such element exists (or it's never
    // closed)
    pub fn new(template: &str, container_id: &str) -> Result<Self> {
        let (content_start, content_end) = locate_container(template, container_id)
            .ok_or_else(|| ViewerError::Template(container_id.to_string()))?;

        Ok(Self {
            container_id: container_id.to_string(),
            before: template[..content_start].to_string(),
            inner: template[content_start..content_end].to_string(),
            after: template[content_end..].to_string(),
        })
    }

    /// Minimal standalone document with an empty container
    pub fn blank(container_id: &str, stylesheet: &str) -> Self {
        Self {
            container_id: container_id.to_string(),
            before: format!(
                "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
                 <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
                 <style>\n{}</style>\n</head>\n<body>\n<div id=\"{}\">",
                stylesheet,
                escape_html(container_id)
            ),
            inner: String::new(),
            after: "</div>\n</body>\n</html>\n".to_string(),
        }
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn inner_html(&self) -> &str {
        &self.inner
    }

    /// Replaces the entire content of the container
    pub fn set_inner_html(&mut self, html: impl Into<String>) {
        self.inner = html.into();
    }

    /// The full document
    pub fn to_html(&self) -> String {
        let mut html =
            String::with_capacity(self.before.len() + self.inner.len() + self.after.len());
        html.push_str(&self.before);
        html.push_str(&self.inner);
        html.push_str(&self.after);
        html
    }

    // Every <img> in the container, in document order
    pub fn images(&self) -> Vec<ImageElement> {
        let fragment = Html::parse_fragment(&self.inner);
        fragment
            .select(&IMG_SELECTOR)
            .enumerate()
            .map(|(index, element)| ImageElement {
                index,
                attributes: element
                    .value()
                    .attrs()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect(),
            })
            .collect()
    }

    // Writes image attributes back into the container markup
    //
    // Each image replaces the tag at the same position; attributes keep
    // their original order, removed ones disappear and new ones are appended.
    // Positions are counted by the same rules the parser in images() uses,
    // so an `<img` inside a <script> string or a comment is never patched.
    pub fn sync_images(&mut self, images: &[ImageElement]) {
        // Look up images by position instead of assuming a full, sorted slice
        let by_index: BTreeMap<usize, &ImageElement> =
            images.iter().map(|image| (image.index, image)).collect();

        let mut seen = 0;
        let updated = replace_img_tags(&self.inner, |position, tag| {
            seen += 1;
            by_index.get(&position).map(|image| patch_tag(tag, image))
        });

        // Only possible if `images` came from a different page
        if let Some(last) = by_index.keys().next_back() {
            if *last >= seen {
                warn!(images = seen, index = *last, "image index beyond the container's images");
            }
        }

        self.inner = updated;
    }

    // Global highlighting pass over the container
    //
    // Every <pre><code> block not yet marked gets the `hljs` class and a
    // `data-highlighted="yes"` marker. Blocks whose body hasn't been
    // highlighted already (rendered with highlighting off, or raw HTML from
    // the document) are highlighted from their text content. Running it twice
    // changes nothing.
    pub fn highlight_all(&mut self, highlighter: &Highlighter) -> usize {
        let mut count = 0;
        let updated = CODE_BLOCK.replace_all(&self.inner, |caps: &Captures| {
            let attributes = &caps[2];
            if attributes.contains(HIGHLIGHTED_MARKER) {
                return caps[0].to_string();
            }
            count += 1;

            let language = language_of(attributes);
            let body = &caps[3];
            let body = if body.contains(r#"<span class="hljs-"#) {
                body.to_string()
            } else {
                let text = text_content(body);
                match language.as_deref() {
                    Some(language) => highlighter.highlight(&text, Some(language), ""),
                    None => highlighter.highlight_auto(&text),
                }
            };

            format!(
                "<pre>{}<code{} {}>{}</code>{}</pre>",
                &caps[1],
                with_hljs_class(attributes),
                HIGHLIGHTED_MARKER,
                body,
                &caps[4]
            )
        });

        self.inner = updated.into_owned();
        debug!(blocks = count, "highlighted code blocks");
        count
    }
}

// Finds the byte range of the container's content inside the template
fn locate_container(template: &str, container_id: &str) -> Option<(usize, usize)> {
    let open = Regex::new(&format!(
        r#"(?i)<([a-z][a-z0-9-]*)\b[^>]*\sid\s*=\s*["']{}["'][^>]*>"#,
        regex::escape(container_id)
    ))
    .ok()?;
    // The first element carrying the id wins, like getElementById
    let caps = open.captures(template)?;
    let whole = caps.get(0)?;
    let tag_name = caps.get(1)?.as_str();
    let content_start = whole.end();

    // Walk same-name tags to find the matching close, allowing nesting
    let same_name = Regex::new(&format!(r"(?i)<(/?){}\b[^>]*>", regex::escape(tag_name))).ok()?;
    // depth 1 = inside the container; it drops to 0 at our closing tag
    let mut depth = 1usize;
    for tag in same_name.captures_iter(&template[content_start..]) {
        let matched = tag.get(0)?;
        if tag.get(1).is_some_and(|slash| !slash.as_str().is_empty()) {
            depth -= 1;
            if depth == 0 {
                return Some((content_start, content_start + matched.start()));
            }
        } else if !matched.as_str().ends_with("/>") {
            // A nested element of the same name opens another level
            depth += 1;
        }
    }

    None
}

// Rebuilds one <img> tag from the element's current attributes
fn patch_tag(tag: &str, image: &ImageElement) -> String {
    // Keep the author's `<img ... />` spelling if they used it
    let self_closing = tag.trim_end_matches('>').trim_end().ends_with('/');

    // Attributes not yet written out; whatever is left at the end is new
    let mut remaining = image.attributes.clone();
    let mut out = String::from("<img");

    let attributes_text = tag
        .get(4..)
        .unwrap_or("")
        .trim_end_matches('>')
        .trim_end_matches('/');
    // First pass: walk the original attributes in order. A name that is gone
    // from the element (e.g. data-src after loading) is dropped, and a
    // duplicate is written once
    for caps in ATTRIBUTE.captures_iter(attributes_text) {
        let name = caps[1].to_ascii_lowercase();
        if let Some(value) = remaining.remove(&name) {
            push_attribute(&mut out, &name, &value);
        }
    }
    // Second pass: attributes the element gained (sorted, BTreeMap order)
    for (name, value) in &remaining {
        push_attribute(&mut out, name, value);
    }

    out.push_str(if self_closing { " />" } else { ">" });
    out
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_html(value));
    out.push('"');
}

fn language_of(attributes: &str) -> Option<String> {
    let classes = CLASS_ATTR.captures(attributes)?;
    classes[1]
        .split_whitespace()
        .find_map(|class| class.strip_prefix("language-"))
        .map(str::to_string)
}

fn with_hljs_class(attributes: &str) -> String {
    if CLASS_ATTR.is_match(attributes) {
        CLASS_ATTR
            .replace(attributes, |caps: &Captures| {
                if caps[1].split_whitespace().any(|class| class == "hljs") {
                    caps[0].to_string()
                } else {
                    format!(" class=\"hljs {}\"", &caps[1])
                }
            })
            .into_owned()
    } else {
        format!("{} class=\"hljs\"", attributes)
    }
}

// Text of an HTML fragment with tags dropped and entities decoded
fn text_content(html: &str) -> String {
    Html::parse_fragment(html).root_element().text().collect()
}

/// Is this image still waiting for its real source?
pub fn is_pending(image: &ImageElement) -> bool {
    image.attr(LAZY_FLAG_ATTR) == Some("false")
}

/// Does this image still carry its URL in the data attribute?
pub fn has_data_src(image: &ImageElement) -> bool {
    image.attr(DATA_SRC_ATTR).is_some()
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why both scraper and regex in one file?
//    - scraper builds a real DOM, which is the right way to *read* HTML
//      (attributes decoded, <script> text not mistaken for tags)
//    - But serialising that DOM back would reformat the whole container
//    - So writes go through targeted text edits, and the tag scanner in
//      pipeline/markup.rs makes sure they count images the same way scraper
//      does
//
// 2. What is LazyLock?
//    - A value built the first time it's used, then shared
//    - Compiling a Regex is not free, so each pattern is compiled once for
//      the whole program instead of on every call
//
// 3. Why does sync_images take &mut self but images() only &self?
//    - images() just looks; sync_images changes the container text
//    - The borrow checker then guarantees nobody holds a reference into the
//      old text while it is replaced
//
// 4. What does BTreeMap give us over HashMap here?
//    - Keys come out sorted, so new attributes and the JSON report have a
//      stable order from run to run
// -----------------------------------------------------------------------------
