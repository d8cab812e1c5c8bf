//! Overtype Core Library
//!
//! Document and annotation model plus the selection-to-replacement
//! pipeline: translating a text selection into per-page cover rectangles,
//! synthesizing the free-text overlay with inferred font and indent, and
//! journaling every mutation for undo/redo.

pub mod annotation;
pub mod document;
pub mod geometry;
pub mod journal;
pub mod layout;
pub mod selection;
pub mod synthesize;
pub mod translate;

pub use annotation::{Annotation, AnnotationId, AnnotationKind, AnnotationStore, FontSpec};
pub use document::{DocumentModel, PageModel};
pub use geometry::{Color, PagePoint, PageRect};
pub use journal::{FreeTextState, Transaction, UndoEntry, UndoJournal, UndoOp};
pub use layout::{layout_paragraph, widest_line, wrapped_height, EstimatedMetrics, TextMetrics};
pub use selection::{dominant_font, LineSelection, PageSelection, Selection, TextRun};
pub use synthesize::{
    replace_selection, synthesize_replacements, PageSynthesis, SynthesisOutcome,
};
pub use translate::{translate_selection, PageReplacement};
