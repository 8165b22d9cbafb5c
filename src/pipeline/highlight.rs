// src/pipeline/highlight.rs
// =============================================================================
// Code-block syntax highlighting with syntect.
//
// Output is class-based HTML (`<span class="hljs-source hljs-js">`) rather
// than inline colours, so the page decides the theme through one stylesheet.
//
// Language lookup:
// 1. the block's own tag ("rust", "js", "py", ...)
// 2. the configured default language
// 3. plain text
// =============================================================================

use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use tracing::warn;

/// Prefix of every CSS class emitted for highlighted tokens
pub const CSS_PREFIX: &str = "hljs-";

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: CSS_PREFIX };

pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl Highlighter {
    pub fn new() -> Self {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let theme_set = ThemeSet::load_defaults();
        let theme = theme_set
            .themes
            .get("InspiredGitHub")
            .cloned()
            .or_else(|| theme_set.themes.values().next().cloned())
            .unwrap_or_default();
        Self { syntax_set, theme }
    }

    // Highlights one code block and returns the HTML body for its <code>
    //
    // Parameters:
    //   code: raw (unescaped) source text
    //   language: the fence tag, if any
    //   default_language: used when the tag is missing or unknown
    pub fn highlight(&self, code: &str, language: Option<&str>, default_language: &str) -> String {
        let syntax = self.syntax_for(language, default_language);
        self.highlight_with(code, syntax)
    }

    // Highlights text whose language is unknown, guessing from the first line
    // (shebangs, `<?xml`, ...) and falling back to plain text
    pub fn highlight_auto(&self, code: &str) -> String {
        let syntax = self
            .syntax_set
            .find_syntax_by_first_line(code)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());
        self.highlight_with(code, syntax)
    }

    /// Stylesheet matching the emitted classes
    pub fn stylesheet(&self) -> String {
        match css_for_theme_with_class_style(&self.theme, CLASS_STYLE) {
            Ok(css) => css,
            Err(e) => {
                warn!(error = %e, "could not build highlight stylesheet");
                String::new()
            }
        }
    }

    fn syntax_for(&self, language: Option<&str>, default_language: &str) -> &SyntaxReference {
        language
            .filter(|lang| !lang.is_empty())
            .and_then(|lang| self.syntax_set.find_syntax_by_token(lang))
            .or_else(|| self.syntax_set.find_syntax_by_token(default_language))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }

    fn highlight_with(&self, code: &str, syntax: &SyntaxReference) -> String {
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, CLASS_STYLE);

        for line in LinesWithEndings::from(code) {
            if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
                warn!(error = %e, syntax = %syntax.name, "highlighting failed, emitting plain text");
                return escape_html(code);
            }
        }

        generator.finalize()
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Writing into a String cannot fail
    let _ = pulldown_cmark::escape::escape_html(&mut out, text);
    out
}
