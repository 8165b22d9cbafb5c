// src/page/mod.rs
// =============================================================================
// The page side of the pipeline: where rendered HTML ends up and what happens
// to it afterwards.
//
// Submodules:
// - document: the Page (template + container) and its <img>/<pre><code> views
// - observer: the lazy-load observer driven by intersection entries
// =============================================================================

mod document;
mod observer;

pub use document::{ImageElement, Page};
pub use observer::{ImageState, IntersectionEntry, LazyLoadObserver, FULL_VISIBILITY};
