// src/pipeline/frontmatter.rs
// =============================================================================
// Front-matter handling.
//
// A document may start with a metadata block:
//
//   ---
//   title: Hello
//   author: someone
//   ---
//   # The actual document
//
// Only a block at the very start of the text counts, and the match is
// non-greedy: the block ends at the first closing `---`. Anything that looks
// like a delimiter later in the body is left alone.
// =============================================================================

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

// \A anchors at the start of input (not at line starts, even in multi-line
// mode), (?s) lets `.` cross newlines
static FRONT_MATTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A---(.*?)---").expect("front-matter pattern is valid"));

/// A leading metadata block and the fields parsed out of it
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrontMatter {
    /// The matched block, delimiters included
    pub block: String,
    /// YAML fields (title, author, date, ...); empty when unparsable
    pub fields: BTreeMap<String, serde_yaml::Value>,
}

// Removes a leading front-matter block, returning the rest of the text
//
// Text without a leading block comes back unchanged.
pub fn strip(text: &str) -> &str {
    split(text).1
}

// Splits a document into its front matter (if any) and the body
pub fn split(text: &str) -> (Option<FrontMatter>, &str) {
    let Some(captures) = FRONT_MATTER.captures(text) else {
        return (None, text);
    };

    // Group 0 always exists on a successful match
    let Some(whole) = captures.get(0) else {
        return (None, text);
    };
    let inner = captures.get(1).map_or("", |m| m.as_str());

    debug!(block = whole.as_str(), "stripped front-matter block");

    let front_matter = FrontMatter {
        block: whole.as_str().to_string(),
        fields: parse_fields(inner),
    };

    (Some(front_matter), &text[whole.end()..])
}

fn parse_fields(inner: &str) -> BTreeMap<String, serde_yaml::Value> {
    if inner.trim().is_empty() {
        return BTreeMap::new();
    }

    match serde_yaml::from_str::<BTreeMap<String, serde_yaml::Value>>(inner) {
        Ok(fields) => fields,
        Err(e) => {
            warn!(error = %e, "front-matter is not a YAML mapping, ignoring its fields");
            BTreeMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_front_matter_is_unchanged() {
        let text = "# Title\n\nSome text --- with dashes\n\n---\n";
        assert_eq!(strip(text), text);
        assert!(split(text).0.is_none());
    }

    #[test]
    fn test_leading_block_removed() {
        let text = "---\ntitle: x\n---\n# Hi";
        assert_eq!(strip(text), "\n# Hi");
    }

    #[test]
    fn test_body_delimiters_untouched() {
        let text = "---\ntitle: x\n---\nabove\n\n---\n\nbelow ---";
        assert_eq!(strip(text), "\nabove\n\n---\n\nbelow ---");
    }

    #[test]
    fn test_delimiter_not_at_start_is_ignored() {
        let text = "intro\n---\ntitle: x\n---\nbody";
        assert_eq!(strip(text), text);
    }

    #[test]
    fn test_only_first_block_removed() {
        let text = "---a---b---c---";
        assert_eq!(strip(text), "b---c---");
    }

    #[test]
    fn test_fields_parsed() {
        let text = "---\ntitle: Hello\nauthor: someone\n---\nbody";
        let (front_matter, body) = split(text);
        let front_matter = front_matter.unwrap();
        assert_eq!(body, "\nbody");
        assert_eq!(front_matter.block, "---\ntitle: Hello\nauthor: someone\n---");
        assert_eq!(
            front_matter.fields.get("title"),
            Some(&serde_yaml::Value::String("Hello".to_string()))
        );
        assert_eq!(front_matter.fields.len(), 2);
    }

    #[test]
    fn test_unparsable_fields_fail_open() {
        let (front_matter, body) = split("---[not: yaml: map---rest");
        assert_eq!(body, "rest");
        assert!(front_matter.unwrap().fields.is_empty());
    }
}
