// src/pipeline/lazy.rs
// =============================================================================
// Rewrites <img> tags in rendered HTML for lazy loading.
//
//   <img src="a.png" alt="x">
// becomes
//   <img data-has-lazy-src="false" data-src="a.png" src="" alt="x">
//
// The browser sees an empty `src` and loads nothing; the observer (see
// src/page/observer.rs) moves the URL back once the image is on screen.
//
// Tags that don't fit the pattern (no src, single quotes, ...) are left
// alone, and so is anything that only looks like a tag (inside <script>,
// comments, attribute values; see markup.rs).
//
// Running the rewrite on its own output changes nothing: a tag that already
// carries `data-has-lazy-src` is skipped as a whole, so even a tag with two
// `src` attributes is only ever rewritten once.
// =============================================================================

use std::sync::LazyLock;

use regex::Regex;

use super::markup::replace_img_tags;

/// Attribute holding "false" until the real source has been restored
pub const LAZY_FLAG_ATTR: &str = "data-has-lazy-src";

/// Attribute carrying the real image URL while the image is pending
pub const DATA_SRC_ATTR: &str = "data-src";

// 1: the whitespace before `src`, 2: the URL.
// Requiring whitespace keeps `data-src="..."` from matching.
static SRC_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\s)src="([^"]+)""#).expect("src pattern is valid"));

static HAS_LAZY_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\sdata-has-lazy-src\b").expect("lazy flag pattern is valid")
});

// Converts every `<img ... src="URL" ...>` into its deferred-loading form
pub fn rewrite(html: &str) -> String {
    replace_img_tags(html, |_, tag| rewrite_tag(tag))
}

// Rewrites one <img> tag; None leaves it as it is
fn rewrite_tag(tag: &str) -> Option<String> {
    // Already deferred (by us or by the author)
    if HAS_LAZY_FLAG.is_match(tag) {
        return None;
    }

    // Browsers honour the first of duplicate attributes, so that's the URL
    let caps = SRC_ATTR.captures(tag)?;
    let whole = caps.get(0)?;

    Some(format!(
        "{}{}{}=\"false\" {}=\"{}\" src=\"\"{}",
        &tag[..whole.start()],
        &caps[1],
        LAZY_FLAG_ATTR,
        DATA_SRC_ATTR,
        &caps[2],
        &tag[whole.end()..]
    ))
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why return Option<String> from rewrite_tag?
//    - None means "nothing to do here", and the scanner keeps the original
//      tag text
//    - The `?` operator works on Option too: SRC_ATTR.captures(tag)? returns
//      None early when the tag has no double-quoted src
//
// 2. What is &tag[..whole.start()]?
//    - A slice of the tag up to (not including) the byte where the match
//      begins
//    - Regex match positions are byte offsets, which is exactly what string
//      slicing takes
//
// 3. Why check for the flag instead of only looking at `src`?
//    - A tag like <img src="a" src="b"> still has a `src` with a URL after
//      one pass
//    - Looking for the flag makes "already processed" explicit, so a second
//      pass can't pick up the leftover attribute
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_single_image() {
        let html = r#"<p><img src="a.png"></p>"#;
        assert_eq!(
            rewrite(html),
            r#"<p><img data-has-lazy-src="false" data-src="a.png" src=""></p>"#
        );
    }

    #[test]
    fn test_other_attributes_kept() {
        let html = r#"<img alt="cat" src="https://example.com/cat.jpg" title="t" />"#;
        let out = rewrite(html);
        assert_eq!(
            out,
            r#"<img alt="cat" data-has-lazy-src="false" data-src="https://example.com/cat.jpg" src="" title="t" />"#
        );
    }

    #[test]
    fn test_multiple_images() {
        let html = r#"<img src="1.png"><p>text</p><img src="2.png">"#;
        let out = rewrite(html);
        assert!(out.contains(r#"data-src="1.png""#));
        assert!(out.contains(r#"data-src="2.png""#));
        assert_eq!(out.matches(r#"src="""#).count(), 2);
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            r#"<h1>Hi</h1><img src="a.png" alt="a"><img alt="b" src="b.png">"#,
            r#"<img src="a.png" src="b.png">"#,
            r#"<img data-has-lazy-src="false" data-src="a.png" src=""><img src="b.png">"#,
            r#"<img src="first.png" alt="first">"#,
            r#"<img alt="last" src="last.png">"#,
            r#"<img alt="x" src="closing.png" />"#,
            r#"<script>'<img src="s.png">'</script><img src="r.png">"#,
            r#"<IMG SRC="upper.png"><img src='single.png'>"#,
            "<p>no images at all</p>",
        ];
        for html in inputs {
            let once = rewrite(html);
            assert_eq!(rewrite(&once), once, "second pass changed {}", html);
        }
    }

    #[test]
    fn test_duplicate_src_uses_first() {
        let out = rewrite(r#"<img src="a.png" src="b.png">"#);
        assert_eq!(
            out,
            r#"<img data-has-lazy-src="false" data-src="a.png" src="" src="b.png">"#
        );
    }

    #[test]
    fn test_already_flagged_tag_untouched() {
        let html = r#"<img data-has-lazy-src="true" src="loaded.png">"#;
        assert_eq!(rewrite(html), html);
    }

    #[test]
    fn test_script_text_untouched() {
        let html = r#"<script>var s = '<img src="fake.png">';</script><img src="real.png">"#;
        assert_eq!(
            rewrite(html),
            r#"<script>var s = '<img src="fake.png">';</script><img data-has-lazy-src="false" data-src="real.png" src="">"#
        );
    }

    #[test]
    fn test_non_matching_tags_untouched() {
        let html = r#"<img alt="no source"><img src='single.png'><img src="">"#;
        assert_eq!(rewrite(html), html);
    }

    #[test]
    fn test_text_without_images() {
        let html = "<p>src=\"x\" is not an image</p>";
        assert_eq!(rewrite(html), html);
    }
}
