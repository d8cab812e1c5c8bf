//! Document model
//!
//! The in-memory annotation graph the editor mutates: an ordered sequence
//! of pages (each with a fixed media box) plus the annotation store.
//! Page content itself is owned by the persistence backend; this model
//! only ever changes through annotation add/remove and bounds/content
//! mutation.

use crate::annotation::{Annotation, AnnotationId, AnnotationStore};
use crate::geometry::{PagePoint, PageRect};

/// A single page: fixed media box, annotations live in the document store
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PageModel {
    /// Media box in page-space coordinates; origin is normally (0, 0)
    pub media_box: PageRect,
}

impl PageModel {
    /// Create a page with the given media box
    pub fn new(media_box: PageRect) -> Self {
        Self { media_box }
    }

    /// US Letter page (612 x 792 points)
    pub fn letter() -> Self {
        Self::new(PageRect::new(0.0, 0.0, 612.0, 792.0))
    }
}

/// In-memory document: pages plus annotations
#[derive(Debug, Clone, Default)]
pub struct DocumentModel {
    pages: Vec<PageModel>,
    annotations: AnnotationStore,
}

impl DocumentModel {
    /// Create an empty document with no pages
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document from a list of page media boxes
    pub fn with_pages(pages: Vec<PageModel>) -> Self {
        Self {
            pages,
            annotations: AnnotationStore::new(),
        }
    }

    /// Number of pages
    pub fn page_count(&self) -> u16 {
        self.pages.len() as u16
    }

    /// Get a page by index
    pub fn page(&self, page_index: u16) -> Option<&PageModel> {
        self.pages.get(page_index as usize)
    }

    /// Media box for a page, if the index is valid
    pub fn media_box(&self, page_index: u16) -> Option<PageRect> {
        self.page(page_index).map(|p| p.media_box)
    }

    /// Shared access to the annotation store
    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    /// Mutable access to the annotation store
    pub fn annotations_mut(&mut self) -> &mut AnnotationStore {
        &mut self.annotations
    }

    /// Add an annotation, returning its ID
    pub fn add_annotation(&mut self, annotation: Annotation) -> AnnotationId {
        self.annotations.add(annotation)
    }

    /// Remove an annotation by ID
    pub fn remove_annotation(&mut self, id: AnnotationId) -> Option<Annotation> {
        self.annotations.remove(id)
    }

    /// Total number of annotations across all pages
    pub fn annotation_count(&self) -> usize {
        self.annotations.len()
    }

    /// Topmost FreeText annotation at a page point
    pub fn free_text_at(&self, page_index: u16, point: &PagePoint) -> Option<&Annotation> {
        self.annotations.free_text_at(page_index, point)
    }
}
