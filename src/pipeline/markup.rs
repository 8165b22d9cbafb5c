// src/pipeline/markup.rs
// =============================================================================
// A small tag scanner for rewriting <img> tags in HTML text.
//
// Both the lazy-load rewrite and Page::sync_images edit <img> tags in place.
// They must agree with the HTML parser (scraper) about which `<img` text is a
// real element, or a write-back lands on the wrong tag. So the scanner walks
// the markup the way a parser sees it:
// - comments are skipped whole
// - raw-text elements (<script>, <style>, <textarea>, ...) are skipped whole,
//   including anything that looks like a tag inside them
// - every other tag is consumed with its quoted attribute values, so a `<img`
//   inside `title="..."` is never mistaken for an element
// - what's left are the real <img> tags, numbered in document order
// =============================================================================

use std::sync::LazyLock;

use regex::{Captures, Regex};

// Elements whose content the HTML parser treats as text, not markup
const RAW_TEXT_ELEMENTS: [&str; 8] = [
    "script", "style", "textarea", "title", "xmp", "iframe", "noembed", "noscript",
];

// Attribute-aware "anything up to the closing >" (quoted values may hold '>')
const TAG_BODY: &str = r#"(?:[^>"']|"[^"]*"|'[^']*')*"#;

static MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    let mut alternatives = vec![r"<!--.*?(?:-->|\z)".to_string()];

    // An unclosed raw-text element runs to the end of the input, like in a
    // browser
    for name in RAW_TEXT_ELEMENTS {
        alternatives.push(format!(
            r"<{name}\b{body}>(?:.*?</{name}\s*>|.*\z)",
            name = name,
            body = TAG_BODY
        ));
    }

    // Must come before the generic tag alternative
    alternatives.push(format!(r"(?P<img><img\b{}>)", TAG_BODY));
    alternatives.push(format!(r"<[a-z/!?]{}>", TAG_BODY));

    let pattern = format!("(?is){}", alternatives.join("|"));
    Regex::new(&pattern).expect("markup pattern is valid")
});

// Calls `edit(index, tag)` for every real <img> tag, in document order
//
// Parameters:
//   html: the markup to scan
//   edit: returns Some(new_tag) to replace the tag, None to keep it
//
// Returns: the markup with the edits applied; everything else byte-for-byte
pub(crate) fn replace_img_tags<F>(html: &str, mut edit: F) -> String
where
    F: FnMut(usize, &str) -> Option<String>,
{
    let mut index = 0;

    MARKUP
        .replace_all(html, |caps: &Captures| {
            // Comments, raw-text elements and other tags go back untouched
            let Some(tag) = caps.name("img") else {
                return caps[0].to_string();
            };

            let replaced = edit(index, tag.as_str()).unwrap_or_else(|| tag.as_str().to_string());
            index += 1;
            replaced
        })
        .into_owned()
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why not just search for `<img` with a regex?
//    - In `<script>var s = '<img src="x">';</script>` the `<img` is part of a
//      JavaScript string, not an element
//    - An HTML parser knows that; a plain search doesn't
//    - Skipping the same regions the parser skips keeps both in agreement
//
// 2. How does one regex skip things?
//    - The alternatives are tried left to right at each position
//    - A comment or <script>...</script> block is matched as one piece, so the
//      search resumes after it
//    - The closure gets every piece, but only touches the `img` group
//
// 3. What is `FnMut`?
//    - A closure that may change variables it captured (here: the caller's
//      own counters or lookups)
//    - replace_all calls our closure many times, so it must be FnMut, not
//      FnOnce
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn img_tags(html: &str) -> Vec<String> {
        let mut found = Vec::new();
        replace_img_tags(html, |_, tag| {
            found.push(tag.to_string());
            None
        });
        found
    }

    #[test]
    fn test_finds_plain_images() {
        let html = r#"<p><img src="a.png"></p><IMG alt="b" src="b.png" />"#;
        assert_eq!(img_tags(html), vec![r#"<img src="a.png">"#, r#"<IMG alt="b" src="b.png" />"#]);
    }

    #[test]
    fn test_skips_script_and_comments() {
        let html = r#"<script>var s = '<img src="fake.png">';</script><!-- <img src="old.png"> --><img src="real.png">"#;
        assert_eq!(img_tags(html), vec![r#"<img src="real.png">"#]);
    }

    #[test]
    fn test_skips_img_inside_attribute_value() {
        let html = r#"<a title="<img src=x>" href="/">link</a><img src="real.png">"#;
        assert_eq!(img_tags(html), vec![r#"<img src="real.png">"#]);
    }

    #[test]
    fn test_unclosed_script_runs_to_end() {
        let html = r#"<img src="a.png"><script>'<img src="b.png">'"#;
        assert_eq!(img_tags(html), vec![r#"<img src="a.png">"#]);
    }

    #[test]
    fn test_quoted_greater_than_inside_img() {
        let html = r#"<img alt="a > b" src="a.png"><p>after</p>"#;
        assert_eq!(img_tags(html), vec![r#"<img alt="a > b" src="a.png">"#]);
    }

    #[test]
    fn test_edit_only_touches_images() {
        let html = r#"<p class="x">hi</p><img src="a.png"><style>img{}</style>"#;
        let out = replace_img_tags(html, |index, _| Some(format!("<img data-i=\"{}\">", index)));
        assert_eq!(out, r#"<p class="x">hi</p><img data-i="0"><style>img{}</style>"#);
    }
}
