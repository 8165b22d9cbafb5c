// src/pipeline/render.rs
// =============================================================================
// Markdown → HTML.
//
// We use `pulldown-cmark`, which produces a stream of events (start heading,
// text, end heading, ...). Instead of rendering that stream directly we pass
// it through a small adapter that:
// - swaps soft breaks for hard breaks (when `breaks` is on)
// - collects each code block's text and replaces the block with highlighted
//   HTML (when `highlight` is on)
//
// The resulting HTML is then cleaned with `ammonia` when `sanitize` is on.
// Rendering is a pure function of (text, options): no state survives a call.
// =============================================================================

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag};

use super::highlight::{escape_html, Highlighter};
use crate::config::RenderOptions;

// Renders Markdown text to an HTML fragment
//
// Parameters:
//   text: Markdown with any front matter already removed
//   options: rendering switches (see RenderOptions)
//   highlighter: used for code blocks when options.highlight is set
pub fn render(text: &str, options: &RenderOptions, highlighter: &Highlighter) -> String {
    // Create a Markdown parser with the extensions the options ask for
    // It produces an iterator of events as it parses the text
    let parser = Parser::new_ext(text, parser_options(options));

    // The events we hand to the HTML writer, after our adjustments
    let mut events: Vec<Event> = Vec::new();

    // (language tag, collected code) while inside a code block
    let mut code_block: Option<(Option<String>, String)> = None;

    for event in parser {
        match event {
            // A code block starts: remember its language and start collecting
            // The block itself is not forwarded; we emit our own HTML at the end
            Event::Start(Tag::CodeBlock(kind)) if options.highlight => {
                // "rust ignore" or "rust" -> Some("rust"); indented blocks have no tag
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info.split_whitespace().next().map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                code_block = Some((language, String::new()));
            }
            // Inside a code block the text arrives in pieces (often one per line)
            Event::Text(text) if code_block.is_some() => {
                if let Some((_, code)) = code_block.as_mut() {
                    code.push_str(&text);
                }
            }
            // The block ends: highlight what we collected and emit it as raw HTML
            // (take() also resets code_block to None for the next block)
            Event::End(Tag::CodeBlock(_)) if code_block.is_some() => {
                if let Some((language, code)) = code_block.take() {
                    let body = highlighter.highlight(
                        &code,
                        language.as_deref(),
                        &options.default_language,
                    );
                    events.push(Event::Html(CowStr::from(code_block_html(
                        language.as_deref(),
                        &body,
                    ))));
                }
            }
            // A single newline inside a paragraph becomes <br />
            Event::SoftBreak if options.breaks => events.push(Event::HardBreak),

            // Everything else (headings, links, images, raw HTML...) passes through
            other => events.push(other),
        }
    }

    // HTML is usually a bit longer than its Markdown source
    let mut output = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut output, events.into_iter());

    if options.sanitize {
        sanitize(&output)
    } else {
        output
    }
}

fn parser_options(options: &RenderOptions) -> Options {
    let mut parser_options = Options::empty();
    if options.gfm {
        parser_options.insert(Options::ENABLE_TABLES);
        parser_options.insert(Options::ENABLE_STRIKETHROUGH);
        parser_options.insert(Options::ENABLE_TASKLISTS);
        parser_options.insert(Options::ENABLE_FOOTNOTES);
    }
    if options.smartypants {
        parser_options.insert(Options::ENABLE_SMART_PUNCTUATION);
    }
    parser_options
}

fn code_block_html(language: Option<&str>, body: &str) -> String {
    match language {
        Some(language) => format!(
            "<pre><code class=\"language-{}\">{}</code></pre>\n",
            escape_html(language),
            body
        ),
        None => format!("<pre><code>{}</code></pre>\n", body),
    }
}

// Cleans rendered HTML
//
// Embedded HTML from the document survives as long as it's harmless: images,
// tables and formatting stay, scripts and `on*=` handlers go. Classes are kept
// because the highlighter communicates through them.
fn sanitize(html: &str) -> String {
    ammonia::Builder::default()
        .add_generic_attributes(&["class"])
        .add_tags(&["input"])
        .add_tag_attributes("input", &["type", "checked", "disabled"])
        .clean(html)
        .to_string()
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is a match guard (`if options.highlight`)?
//    - An extra condition on a match arm
//    - If it's false, matching continues with the next arm, so with
//      highlighting off a code block simply falls through to `other`
//
// 2. Why collect events into a Vec first?
//    - The code block's HTML can only be built once all of its text has
//      arrived
//    - Collecting keeps the loop simple; documents are small enough that the
//      extra memory doesn't matter
//
// 3. What is CowStr?
//    - pulldown-cmark's string type: borrowed from the input when possible,
//      owned when it had to build something new
//    - Our highlighted HTML is new, so CowStr::from(String) wraps the owned
//      string
//
// 4. Why sanitize after rendering instead of dropping Html events?
//    - Dropping them would also drop harmless HTML like <img> or <kbd>
//    - ammonia understands the full output and removes only what's dangerous
//      (scripts, on* handlers, javascript: links)
// -----------------------------------------------------------------------------
