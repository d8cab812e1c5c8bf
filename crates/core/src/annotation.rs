//! Annotation data model
//!
//! Annotations are the only mutation the document ever sees: opaque cover
//! rectangles that hide original glyphs, and free-text overlays carrying
//! the replacement text. Kinds are a tagged enum rather than a type
//! hierarchy, so callers match instead of downcasting.
//! All coordinates are stored in page-local coordinate space.

use crate::geometry::{Color, PagePoint, PageRect};
use std::collections::HashMap;

/// Unique identifier for an annotation
///
/// Stable across document lifetime, persists in saved files.
/// Generated using UUID v4 for guaranteed uniqueness.
pub type AnnotationId = uuid::Uuid;

/// Font reference for free-text annotations: family name plus point size
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FontSpec {
    /// Font family name (e.g. "Helvetica", "Times-Roman")
    pub family: String,

    /// Size in page-space points
    pub size: f32,
}

impl FontSpec {
    /// Create a new font spec
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }

    /// Default overlay font (Helvetica 12pt)
    pub fn default_font() -> Self {
        Self::new("Helvetica", 12.0)
    }

    /// Copy of this spec with a different point size
    pub fn with_size(&self, size: f32) -> Self {
        Self::new(self.family.clone(), size)
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::default_font()
    }
}

/// The two annotation kinds the editor produces
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum AnnotationKind {
    /// Opaque rectangle used to visually hide original page content
    /// without altering the content stream. Zero border width.
    Cover {
        bounds: PageRect,
        fill: Color,
    },

    /// Text-bearing overlay with position, font, and color. The only
    /// kind the user edits interactively.
    FreeText {
        bounds: PageRect,
        contents: String,
        font: FontSpec,
        color: Color,
        read_only: bool,
    },
}

impl AnnotationKind {
    /// Bounding rectangle of this annotation
    pub fn bounds(&self) -> PageRect {
        match self {
            AnnotationKind::Cover { bounds, .. } => *bounds,
            AnnotationKind::FreeText { bounds, .. } => *bounds,
        }
    }
}

/// A single annotation, owned by exactly one page
///
/// Moving an annotation is a bounds mutation; annotations are never
/// re-parented to another page.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Annotation {
    /// Stable unique identifier
    id: AnnotationId,

    /// Page index this annotation belongs to (0-based)
    page_index: u16,

    /// Kind-specific payload (bounds, contents, style)
    pub kind: AnnotationKind,

    /// Whether this annotation is rendered; the overlay editor hides the
    /// annotation it is editing and restores it on commit
    visible: bool,
}

impl Annotation {
    /// Create a new annotation with a generated ID
    pub fn new(page_index: u16, kind: AnnotationKind) -> Self {
        Self {
            id: AnnotationId::new_v4(),
            page_index,
            kind,
            visible: true,
        }
    }

    /// Create an annotation with a specific ID (for deserialization)
    pub fn with_id(id: AnnotationId, page_index: u16, kind: AnnotationKind) -> Self {
        Self {
            id,
            page_index,
            kind,
            visible: true,
        }
    }

    /// Opaque white cover with zero border width
    pub fn cover(page_index: u16, bounds: PageRect) -> Self {
        Self::new(
            page_index,
            AnnotationKind::Cover {
                bounds,
                fill: Color::WHITE,
            },
        )
    }

    /// Free-text overlay with transparent fill and black text
    pub fn free_text(
        page_index: u16,
        bounds: PageRect,
        contents: impl Into<String>,
        font: FontSpec,
    ) -> Self {
        Self::new(
            page_index,
            AnnotationKind::FreeText {
                bounds,
                contents: contents.into(),
                font,
                color: Color::BLACK,
                read_only: false,
            },
        )
    }

    /// Get the annotation ID
    pub fn id(&self) -> AnnotationId {
        self.id
    }

    /// Get the page index
    pub fn page_index(&self) -> u16 {
        self.page_index
    }

    /// Bounding rectangle in page coordinates
    pub fn bounds(&self) -> PageRect {
        self.kind.bounds()
    }

    /// Replace the bounding rectangle, keeping everything else
    pub fn set_bounds(&mut self, bounds: PageRect) {
        match &mut self.kind {
            AnnotationKind::Cover { bounds: b, .. } => *b = bounds,
            AnnotationKind::FreeText { bounds: b, .. } => *b = bounds,
        }
    }

    /// True for the FreeText kind
    pub fn is_free_text(&self) -> bool {
        matches!(self.kind, AnnotationKind::FreeText { .. })
    }

    /// Text contents, if this is a FreeText annotation
    pub fn contents(&self) -> Option<&str> {
        match &self.kind {
            AnnotationKind::FreeText { contents, .. } => Some(contents),
            AnnotationKind::Cover { .. } => None,
        }
    }

    /// Font, if this is a FreeText annotation
    pub fn font(&self) -> Option<&FontSpec> {
        match &self.kind {
            AnnotationKind::FreeText { font, .. } => Some(font),
            AnnotationKind::Cover { .. } => None,
        }
    }

    /// Check if annotation is visible
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Set visibility
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Check if a point hits this annotation (bounds containment)
    ///
    /// Hidden annotations never hit.
    pub fn hit_test(&self, point: &PagePoint) -> bool {
        self.visible && self.bounds().contains_point(point)
    }
}

/// Per-document annotation store
///
/// Indexed by ID with per-page insertion order; the most recently added
/// annotation on a page is considered topmost for hit testing.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    /// All annotations indexed by ID
    annotations: HashMap<AnnotationId, Annotation>,

    /// Annotation IDs organized by page, in insertion order
    by_page: HashMap<u16, Vec<AnnotationId>>,
}

impl AnnotationStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an annotation to the store
    pub fn add(&mut self, annotation: Annotation) -> AnnotationId {
        let id = annotation.id();
        let page_index = annotation.page_index();

        self.annotations.insert(id, annotation);
        self.by_page.entry(page_index).or_default().push(id);
        id
    }

    /// Remove an annotation by ID
    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let annotation = self.annotations.remove(&id)?;
        let page_index = annotation.page_index();
        if let Some(page_annotations) = self.by_page.get_mut(&page_index) {
            page_annotations.retain(|&aid| aid != id);
            if page_annotations.is_empty() {
                self.by_page.remove(&page_index);
            }
        }
        Some(annotation)
    }

    /// Get an annotation by ID
    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.get(&id)
    }

    /// Get a mutable reference to an annotation by ID
    pub fn get_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.annotations.get_mut(&id)
    }

    /// All annotations for a page, in insertion order
    pub fn page_annotations(&self, page_index: u16) -> Vec<&Annotation> {
        self.by_page
            .get(&page_index)
            .map(|ids| ids.iter().filter_map(|id| self.annotations.get(id)).collect())
            .unwrap_or_default()
    }

    /// All annotations in the store, unordered
    pub fn all(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.values()
    }

    /// Number of annotations in the store
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Topmost annotation at a point on a page
    pub fn annotation_at(&self, page_index: u16, point: &PagePoint) -> Option<&Annotation> {
        self.by_page.get(&page_index).and_then(|ids| {
            ids.iter()
                .rev()
                .filter_map(|id| self.annotations.get(id))
                .find(|a| a.hit_test(point))
        })
    }

    /// Topmost FreeText annotation at a point on a page
    ///
    /// Covers never intercept edit gestures.
    pub fn free_text_at(&self, page_index: u16, point: &PagePoint) -> Option<&Annotation> {
        self.by_page.get(&page_index).and_then(|ids| {
            ids.iter()
                .rev()
                .filter_map(|id| self.annotations.get(id))
                .find(|a| a.is_free_text() && a.hit_test(point))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free_text_at_origin(page: u16) -> Annotation {
        Annotation::free_text(
            page,
            PageRect::new(0.0, 0.0, 100.0, 20.0),
            "hello",
            FontSpec::default_font(),
        )
    }

    #[test]
    fn test_annotation_creation() {
        let annotation = free_text_at_origin(0);
        assert_eq!(annotation.page_index(), 0);
        assert!(annotation.is_visible());
        assert!(annotation.is_free_text());
        assert_eq!(annotation.contents(), Some("hello"));
        assert_eq!(annotation.font().unwrap().family, "Helvetica");
    }

    #[test]
    fn test_cover_has_no_contents() {
        let cover = Annotation::cover(0, PageRect::new(0.0, 0.0, 50.0, 10.0));
        assert!(!cover.is_free_text());
        assert!(cover.contents().is_none());
        assert!(cover.font().is_none());
        match cover.kind {
            AnnotationKind::Cover { fill, .. } => assert_eq!(fill, Color::WHITE),
            _ => panic!("expected cover"),
        }
    }

    #[test]
    fn test_set_bounds() {
        let mut annotation = free_text_at_origin(0);
        annotation.set_bounds(PageRect::new(10.0, 10.0, 40.0, 15.0));
        assert_eq!(annotation.bounds(), PageRect::new(10.0, 10.0, 40.0, 15.0));
    }

    #[test]
    fn test_store_add_remove() {
        let mut store = AnnotationStore::new();
        let a1 = free_text_at_origin(0);
        let a2 = free_text_at_origin(1);
        let id1 = store.add(a1);
        store.add(a2);

        assert_eq!(store.len(), 2);
        assert_eq!(store.page_annotations(0).len(), 1);
        assert_eq!(store.page_annotations(1).len(), 1);

        let removed = store.remove(id1).unwrap();
        assert_eq!(removed.id(), id1);
        assert_eq!(store.len(), 1);
        assert!(store.page_annotations(0).is_empty());
    }

    #[test]
    fn test_hit_testing_topmost() {
        let mut store = AnnotationStore::new();
        let below = free_text_at_origin(0);
        let above = free_text_at_origin(0);
        let above_id = above.id();
        store.add(below);
        store.add(above);

        let hit = store.annotation_at(0, &PagePoint::new(50.0, 10.0)).unwrap();
        assert_eq!(hit.id(), above_id);

        assert!(store.annotation_at(0, &PagePoint::new(500.0, 500.0)).is_none());
        assert!(store.annotation_at(1, &PagePoint::new(50.0, 10.0)).is_none());
    }

    #[test]
    fn test_free_text_at_skips_covers() {
        let mut store = AnnotationStore::new();
        let text = free_text_at_origin(0);
        let text_id = text.id();
        store.add(text);
        // Cover stacked on top of the text annotation
        store.add(Annotation::cover(0, PageRect::new(0.0, 0.0, 100.0, 20.0)));

        let hit = store.free_text_at(0, &PagePoint::new(50.0, 10.0)).unwrap();
        assert_eq!(hit.id(), text_id);
    }

    #[test]
    fn test_annotation_serialization() {
        let annotation = free_text_at_origin(3);
        let json = serde_json::to_string(&annotation).unwrap();
        let back: Annotation = serde_json::from_str(&json).unwrap();

        assert_eq!(back, annotation);
        assert_eq!(back.id(), annotation.id());
        assert_eq!(back.page_index(), 3);
    }

    #[test]
    fn test_hidden_annotation_does_not_hit() {
        let mut store = AnnotationStore::new();
        let mut annotation = free_text_at_origin(0);
        annotation.set_visible(false);
        store.add(annotation);

        assert!(store.annotation_at(0, &PagePoint::new(50.0, 10.0)).is_none());
    }
}
