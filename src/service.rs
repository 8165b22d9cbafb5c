// src/service.rs
// =============================================================================
// The entry operation: one full pipeline run for one document source.
//
//   fetch → strip front matter → render → rewrite <img> → write container
//         → highlight all code blocks → activate lazy-load observer
//
// The only await point is the fetch. Everything after it is synchronous, and
// the page is only touched once the fetch has succeeded, so a failed run leaves
// the container exactly as it was.
// =============================================================================

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::error::Result;
use crate::page::{ImageElement, ImageState, IntersectionEntry, LazyLoadObserver, Page};
use crate::pipeline::{self, Highlighter};
use crate::source::{DocumentSource, Fetcher};

/// Outcome of a successful run, for reporting
#[derive(Debug, Clone, Serialize)]
pub struct Rendered {
    pub source: DocumentSource,
    /// Fields of the stripped front-matter block (empty when there was none)
    pub front_matter: BTreeMap<String, serde_yaml::Value>,
    pub images: Vec<ImageReport>,
}

/// One image of the rendered document and where it stands
#[derive(Debug, Clone, Serialize)]
pub struct ImageReport {
    pub index: usize,
    pub state: ImageState,
    /// The real URL, wherever it currently lives
    pub url: Option<String>,
}

impl ImageReport {
    fn from_element(image: &ImageElement) -> Self {
        let state = ImageState::of(image);
        let url = match state {
            ImageState::Pending => image.attr(pipeline::DATA_SRC_ATTR),
            ImageState::Loaded | ImageState::Eager => image.attr("src"),
        };
        Self {
            index: image.index,
            state,
            url: url.map(str::to_string),
        }
    }
}

// Runs the whole pipeline for `source`, writing the result into `page`
//
// Parameters:
//   source: where the document comes from
//   config: rendering options, local root and viewport size
//   fetcher / highlighter: shared collaborators, reusable across runs
//   page: the host page; only its container content is replaced
//
// Returns: a report of what was rendered, or the fetch error
pub async fn init_service(
    source: &DocumentSource,
    config: &ServiceConfig,
    fetcher: &Fetcher,
    highlighter: &Highlighter,
    page: &mut Page,
) -> Result<Rendered> {
    let raw = fetcher.fetch(source).await?;
    info!(source = %source.describe(), bytes = raw.len(), "document fetched");

    let (front_matter, body) = pipeline::split_front_matter(&raw);
    let html = pipeline::render(body, &config.render, highlighter);
    let html = pipeline::rewrite_images(&html);

    page.set_inner_html(html);
    page.highlight_all(highlighter);

    let images = match LazyLoadObserver::activate(page) {
        Some(mut observer) => {
            let entries: Vec<IntersectionEntry> = (0..config.visible.min(observer.images().len()))
                .map(IntersectionEntry::visible)
                .collect();
            if !entries.is_empty() {
                let loaded = observer.on_intersection(&entries);
                debug!(loaded, "initial viewport applied");
                observer.apply(page);
            }
            observer.images().iter().map(ImageReport::from_element).collect()
        }
        None => Vec::new(),
    };

    Ok(Rendered {
        source: source.clone(),
        front_matter: front_matter.map(|fm| fm.fields).unwrap_or_default(),
        images,
    })
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why does init_service take `&mut Page`?
//    - The page is the one piece of shared, mutable state in the pipeline
//    - A mutable borrow means only one run can write to a given page at a
//      time; the compiler enforces it
//
// 2. Why fetch first and touch the page later?
//    - `?` returns early on a fetch error
//    - At that point set_inner_html hasn't run yet, so the page keeps its
//      previous content
//
// 3. Why pass the Highlighter in instead of creating it here?
//    - Loading syntect's syntax definitions takes a moment
//    - Creating it once and borrowing it is cheaper for repeated runs
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    // Writes `content` to <tmp>/<unique dir>/<name>.md and returns the dir
    fn fixture(test: &str, name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mdview-{}-{}", test, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{}.md", name)), content).unwrap();
        dir
    }

    fn config_for(dir: &PathBuf) -> ServiceConfig {
        ServiceConfig {
            md_root: dir.to_string_lossy().into_owned(),
            ..ServiceConfig::default()
        }
    }

    #[tokio::test]
    async fn test_local_readme_end_to_end() {
        let dir = fixture(
            "e2e",
            "readme",
            "---\ntitle: x\n---\n# Hi\n<img src=\"a.png\">",
        );
        let config = config_for(&dir);
        let fetcher = Fetcher::new(config.md_root.clone()).unwrap();
        let highlighter = Highlighter::new();
        let mut page = Page::blank("view", "");

        let rendered = init_service(
            &DocumentSource::local("readme"),
            &config,
            &fetcher,
            &highlighter,
            &mut page,
        )
        .await
        .unwrap();

        let html = page.inner_html();
        assert!(html.contains("<h1>Hi</h1>"));
        assert!(html.contains(r#"data-has-lazy-src="false""#));
        assert!(html.contains(r#"data-src="a.png""#));
        assert!(html.contains(r#"src="""#));
        assert!(!html.contains("title: x"));
        assert!(!html.contains("---"));

        assert_eq!(
            rendered.front_matter.get("title"),
            Some(&serde_yaml::Value::String("x".to_string()))
        );
        assert_eq!(rendered.images.len(), 1);
        assert_eq!(rendered.images[0].state, ImageState::Pending);
        assert_eq!(rendered.images[0].url.as_deref(), Some("a.png"));
    }

    #[tokio::test]
    async fn test_visible_images_are_loaded() {
        let dir = fixture(
            "visible",
            "gallery",
            "![one](1.png)\n\n![two](2.png)\n\n![three](3.png)\n",
        );
        let config = ServiceConfig {
            visible: 2,
            ..config_for(&dir)
        };
        let fetcher = Fetcher::new(config.md_root.clone()).unwrap();
        let highlighter = Highlighter::new();
        let mut page = Page::blank("view", "");

        let rendered = init_service(
            &DocumentSource::local("gallery"),
            &config,
            &fetcher,
            &highlighter,
            &mut page,
        )
        .await
        .unwrap();

        let states: Vec<ImageState> = rendered.images.iter().map(|i| i.state).collect();
        assert_eq!(
            states,
            vec![ImageState::Loaded, ImageState::Loaded, ImageState::Pending]
        );
        let html = page.inner_html();
        assert!(html.contains(r#"src="1.png""#));
        assert!(html.contains(r#"src="2.png""#));
        assert!(html.contains(r#"data-src="3.png""#));
    }

    #[tokio::test]
    async fn test_img_text_in_raw_script_is_not_an_image() {
        let dir = fixture(
            "script",
            "script",
            "<script>var s = '<img src=\"fake.png\">';</script>\n\n![real](real.png)\n",
        );
        let mut config = ServiceConfig {
            visible: 1,
            ..config_for(&dir)
        };
        config.render.sanitize = false;
        let fetcher = Fetcher::new(config.md_root.clone()).unwrap();
        let highlighter = Highlighter::new();
        let mut page = Page::blank("view", "");

        let rendered = init_service(
            &DocumentSource::local("script"),
            &config,
            &fetcher,
            &highlighter,
            &mut page,
        )
        .await
        .unwrap();

        let html = page.inner_html();
        // The script text is left exactly as written
        assert!(html.contains(r#"var s = '<img src="fake.png">';"#));
        // The real image was loaded in the markup, not just in the report
        assert!(html.contains(r#"src="real.png""#));
        assert!(!html.contains(r#"data-src="real.png""#));

        assert_eq!(rendered.images.len(), 1);
        assert_eq!(rendered.images[0].state, ImageState::Loaded);
        assert_eq!(rendered.images[0].url.as_deref(), Some("real.png"));
    }

    #[tokio::test]
    async fn test_code_blocks_marked_highlighted() {
        let dir = fixture("code", "code", "```rust\nfn main() {}\n```\n");
        let config = config_for(&dir);
        let fetcher = Fetcher::new(config.md_root.clone()).unwrap();
        let highlighter = Highlighter::new();
        let mut page = Page::blank("view", "");

        init_service(
            &DocumentSource::local("code"),
            &config,
            &fetcher,
            &highlighter,
            &mut page,
        )
        .await
        .unwrap();

        let html = page.inner_html();
        assert!(html.contains(r#"data-highlighted="yes""#));
        assert!(html.contains("hljs-rust"));
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_page_alone() {
        let config = ServiceConfig {
            md_root: "/definitely/not/here".to_string(),
            ..ServiceConfig::default()
        };
        let fetcher = Fetcher::new(config.md_root.clone()).unwrap();
        let highlighter = Highlighter::new();
        let mut page = Page::blank("view", "");
        page.set_inner_html("<p>previous</p>");

        let result = init_service(
            &DocumentSource::local("missing"),
            &config,
            &fetcher,
            &highlighter,
            &mut page,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(page.inner_html(), "<p>previous</p>");
    }
}
