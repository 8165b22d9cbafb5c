// src/page/observer.rs
// =============================================================================
// Lazy-load observer.
//
// After the rendered HTML is in the page, every <img> is registered with a
// viewport-intersection watcher. The host (a browser, or the CLI's `--visible`
// option) reports intersection entries; when a pending image is fully inside
// the viewport its real URL moves from `data-src` back to `src`.
//
// Per image the life cycle is one-way:
//
//   pending (data-has-lazy-src="false") ──intersection──▶ loaded ("true")
//
// A loaded image is never touched again.
// =============================================================================

use serde::Serialize;
use tracing::{debug, trace, warn};

use super::document::{has_data_src, is_pending, ImageElement, Page};
use crate::pipeline::{DATA_SRC_ATTR, LAZY_FLAG_ATTR};

/// An image must be entirely inside the viewport to count
pub const FULL_VISIBILITY: f64 = 1.0;

/// One report from the viewport about an observed image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    /// Index of the image among the observed ones
    pub target: usize,
    /// Visible fraction of the image, 0.0 ..= 1.0
    pub intersection_ratio: f64,
}

impl IntersectionEntry {
    /// The image is completely on screen
    pub fn visible(target: usize) -> Self {
        Self {
            target,
            intersection_ratio: 1.0,
        }
    }
}

/// Where an image is in its lazy-loading life cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageState {
    /// Real URL still parked in `data-src`
    Pending,
    /// Real URL restored to `src`
    Loaded,
    /// Never rewritten for lazy loading (e.g. src in single quotes)
    Eager,
}

impl ImageState {
    pub fn of(image: &ImageElement) -> Self {
        match image.attr(LAZY_FLAG_ATTR) {
            Some("false") => ImageState::Pending,
            Some(_) => ImageState::Loaded,
            None => ImageState::Eager,
        }
    }
}

/// Watches the container's images and restores their sources on intersection
#[derive(Debug, Clone)]
pub struct LazyLoadObserver {
    threshold: f64,
    targets: Vec<ImageElement>,
}

impl LazyLoadObserver {
    // Registers every image currently in the page's container
    //
    // Returns: None when there is nothing to observe
    pub fn activate(page: &Page) -> Option<Self> {
        let targets = page.images();
        if targets.is_empty() {
            debug!("no images in container, observer not created");
            return None;
        }

        debug!(images = targets.len(), "observing images");
        Some(Self {
            threshold: FULL_VISIBILITY,
            targets,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn images(&self) -> &[ImageElement] {
        &self.targets
    }

    // Handles one batch of intersection entries
    //
    // Returns: how many images switched from pending to loaded
    pub fn on_intersection(&mut self, entries: &[IntersectionEntry]) -> usize {
        let mut loaded = 0;

        for entry in entries {
            // Partly visible doesn't count
            if entry.intersection_ratio < self.threshold {
                continue;
            }
            let Some(image) = self.targets.get_mut(entry.target) else {
                trace!(index = entry.target, "entry for unknown image ignored");
                continue;
            };
            // Loaded (or never lazy) images are done for good
            if !is_pending(image) {
                continue;
            }

            // A pending image without a URL to restore stays pending; flipping
            // the flag would leave it "loaded" with an empty src
            if !has_data_src(image) {
                warn!(index = image.index, "pending image has no data-src, leaving it pending");
                continue;
            }

            // pending → loaded: move the URL back and mark the image
            let source = image.remove_attr(DATA_SRC_ATTR).unwrap_or_default();
            image.set_attr("src", source);
            image.set_attr(LAZY_FLAG_ATTR, "true");
            loaded += 1;

            debug!(index = image.index, src = image.attr("src").unwrap_or(""), "image loaded");
        }

        loaded
    }

    /// Writes the observed images' current state back into the page
    pub fn apply(&self, page: &mut Page) {
        page.sync_images(&self.targets);
    }

    pub fn states(&self) -> Vec<ImageState> {
        self.targets.iter().map(ImageState::of).collect()
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why does activate() return Option<Self>?
//    - With no images there is nothing to watch, so no observer exists
//    - Option makes the caller handle that case explicitly with match
//
// 2. What is `let Some(image) = ... else { continue; }`?
//    - "let-else": bind the value if the pattern matches, otherwise run the
//      else block, which must leave the current scope (continue, return, ...)
//    - It keeps the happy path unindented
//
// 3. Why is the state a string attribute and not a Rust enum field?
//    - The attribute is what ends up in the HTML and what a browser script
//      would check
//    - ImageState::of() derives the enum from it whenever we need one
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with(html: &str) -> Page {
        let mut page = Page::blank("view", "");
        page.set_inner_html(html);
        page
    }

    #[test]
    fn test_no_images_no_observer() {
        let page = page_with("<p>nothing to see</p>");
        assert!(LazyLoadObserver::activate(&page).is_none());
    }

    #[test]
    fn test_threshold_is_full_visibility() {
        let page = page_with(r#"<img src="a.png">"#);
        let observer = LazyLoadObserver::activate(&page).unwrap();
        assert_eq!(observer.threshold(), 1.0);
    }

    #[test]
    fn test_intersection_restores_source() {
        let mut page = page_with(r#"<img data-has-lazy-src="false" data-src="b.png" src="">"#);
        let mut observer = LazyLoadObserver::activate(&page).unwrap();

        assert_eq!(observer.on_intersection(&[IntersectionEntry::visible(0)]), 1);
        let image = &observer.images()[0];
        assert_eq!(image.attr("src"), Some("b.png"));
        assert_eq!(image.attr("data-src"), None);
        assert_eq!(image.attr("data-has-lazy-src"), Some("true"));

        // Second event on the same element is a no-op
        assert_eq!(observer.on_intersection(&[IntersectionEntry::visible(0)]), 0);
        assert_eq!(observer.images()[0].attr("src"), Some("b.png"));

        observer.apply(&mut page);
        assert_eq!(
            page.inner_html(),
            r#"<img data-has-lazy-src="true" src="b.png">"#
        );
    }

    #[test]
    fn test_partial_visibility_is_ignored() {
        let page = page_with(r#"<img data-has-lazy-src="false" data-src="b.png" src="">"#);
        let mut observer = LazyLoadObserver::activate(&page).unwrap();
        let entry = IntersectionEntry {
            target: 0,
            intersection_ratio: 0.99,
        };
        assert_eq!(observer.on_intersection(&[entry]), 0);
        assert_eq!(observer.states(), vec![ImageState::Pending]);
    }

    #[test]
    fn test_eager_images_untouched() {
        let page = page_with(r#"<img src='plain.png'>"#);
        let mut observer = LazyLoadObserver::activate(&page).unwrap();
        assert_eq!(observer.on_intersection(&[IntersectionEntry::visible(0)]), 0);
        assert_eq!(observer.states(), vec![ImageState::Eager]);
        assert_eq!(observer.images()[0].attr("src"), Some("plain.png"));
    }

    #[test]
    fn test_pending_without_data_src_stays_pending() {
        let mut page = page_with(r#"<img data-has-lazy-src="false" src="">"#);
        let mut observer = LazyLoadObserver::activate(&page).unwrap();

        assert_eq!(observer.on_intersection(&[IntersectionEntry::visible(0)]), 0);
        assert_eq!(observer.states(), vec![ImageState::Pending]);
        assert_eq!(observer.images()[0].attr("src"), Some(""));

        observer.apply(&mut page);
        assert_eq!(page.inner_html(), r#"<img data-has-lazy-src="false" src="">"#);
    }

    #[test]
    fn test_unknown_target_ignored() {
        let page = page_with(r#"<img data-has-lazy-src="false" data-src="b.png" src="">"#);
        let mut observer = LazyLoadObserver::activate(&page).unwrap();
        assert_eq!(observer.on_intersection(&[IntersectionEntry::visible(7)]), 0);
    }

    #[test]
    fn test_batch_only_loads_visible_entries() {
        let page = page_with(
            r#"<img data-has-lazy-src="false" data-src="1.png" src=""><img data-has-lazy-src="false" data-src="2.png" src="">"#,
        );
        let mut observer = LazyLoadObserver::activate(&page).unwrap();
        let entries = [
            IntersectionEntry::visible(1),
            IntersectionEntry {
                target: 0,
                intersection_ratio: 0.0,
            },
        ];
        assert_eq!(observer.on_intersection(&entries), 1);
        assert_eq!(observer.states(), vec![ImageState::Pending, ImageState::Loaded]);
    }
}
