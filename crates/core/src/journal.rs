//! Undo/redo journal
//!
//! An explicit tagged operation log instead of captured closures: each
//! entry stores the data needed to replay its ops in either direction, so
//! undo and redo are the same mechanism run on inverted entries and
//! entries compose indefinitely. The journal owns snapshots, never
//! references into the model.
//!
//! Ops from one user gesture (a replacement across pages, a commit, a
//! move) are grouped into a single entry through [`Transaction`], so one
//! undo reverses the whole gesture.

use crate::annotation::{Annotation, AnnotationId, AnnotationKind, FontSpec};
use crate::document::DocumentModel;
use crate::geometry::PageRect;

/// Snapshot of a FreeText annotation's mutable state
#[derive(Debug, Clone, PartialEq)]
pub struct FreeTextState {
    pub contents: String,
    pub bounds: PageRect,
    pub font: FontSpec,
}

impl FreeTextState {
    /// Capture the state of a FreeText annotation; `None` for covers
    pub fn capture(annotation: &Annotation) -> Option<Self> {
        match &annotation.kind {
            AnnotationKind::FreeText {
                bounds,
                contents,
                font,
                ..
            } => Some(Self {
                contents: contents.clone(),
                bounds: *bounds,
                font: font.clone(),
            }),
            AnnotationKind::Cover { .. } => None,
        }
    }

    /// Write this state back into a FreeText annotation
    fn restore(&self, annotation: &mut Annotation) {
        if let AnnotationKind::FreeText {
            bounds,
            contents,
            font,
            ..
        } = &mut annotation.kind
        {
            *bounds = self.bounds;
            *contents = self.contents.clone();
            *font = self.font.clone();
        }
    }
}

/// One reversible mutation of the annotation graph
#[derive(Debug, Clone)]
pub enum UndoOp {
    /// An annotation was added; inverse removes it
    Add { annotation: Annotation },

    /// An annotation was removed; inverse re-adds it
    Remove { annotation: Annotation },

    /// A FreeText annotation's content/bounds/font changed;
    /// inverse swaps the two states
    Rewrite {
        id: AnnotationId,
        before: FreeTextState,
        after: FreeTextState,
    },
}

impl UndoOp {
    /// The op that exactly reverses this one
    fn inverted(&self) -> UndoOp {
        match self {
            UndoOp::Add { annotation } => UndoOp::Remove {
                annotation: annotation.clone(),
            },
            UndoOp::Remove { annotation } => UndoOp::Add {
                annotation: annotation.clone(),
            },
            UndoOp::Rewrite { id, before, after } => UndoOp::Rewrite {
                id: *id,
                before: after.clone(),
                after: before.clone(),
            },
        }
    }

    /// Replay this op against the model
    fn apply(&self, model: &mut DocumentModel) {
        match self {
            UndoOp::Add { annotation } => {
                model.add_annotation(annotation.clone());
            }
            UndoOp::Remove { annotation } => {
                model.remove_annotation(annotation.id());
            }
            UndoOp::Rewrite { id, after, .. } => {
                if let Some(annotation) = model.annotations_mut().get_mut(*id) {
                    after.restore(annotation);
                } else {
                    log::warn!("undo journal: annotation {} no longer exists", id);
                }
            }
        }
    }
}

/// A group of ops recorded by one user gesture, stored in its forward
/// orientation on both stacks
#[derive(Debug, Clone)]
pub struct UndoEntry {
    ops: Vec<UndoOp>,
}

impl UndoEntry {
    fn inverted(&self) -> UndoEntry {
        UndoEntry {
            ops: self.ops.iter().rev().map(UndoOp::inverted).collect(),
        }
    }

    fn apply(&self, model: &mut DocumentModel) {
        for op in &self.ops {
            op.apply(model);
        }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Undo/redo stacks for one document
///
/// No depth limit; recording a new entry clears the redo stack.
#[derive(Debug, Default)]
pub struct UndoJournal {
    undo_stack: Vec<UndoEntry>,
    redo_stack: Vec<UndoEntry>,
}

impl UndoJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a transaction that groups ops into one entry
    pub fn begin(&mut self) -> Transaction<'_> {
        Transaction {
            journal: self,
            ops: Vec::new(),
        }
    }

    fn record(&mut self, entry: UndoEntry) {
        self.redo_stack.clear();
        self.undo_stack.push(entry);
    }

    /// Reverse the most recent entry. Returns false when there is
    /// nothing to undo.
    pub fn undo(&mut self, model: &mut DocumentModel) -> bool {
        match self.undo_stack.pop() {
            Some(entry) => {
                entry.inverted().apply(model);
                self.redo_stack.push(entry);
                true
            }
            None => false,
        }
    }

    /// Reapply the most recently undone entry. Returns false when there
    /// is nothing to redo.
    pub fn redo(&mut self, model: &mut DocumentModel) -> bool {
        match self.redo_stack.pop() {
            Some(entry) => {
                entry.apply(model);
                self.undo_stack.push(entry);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of entries available to undo
    pub fn depth(&self) -> usize {
        self.undo_stack.len()
    }
}

/// Applies mutations to the model while accumulating their ops; commit
/// records them as one journal entry. Dropping without commit keeps the
/// mutations but records nothing (callers always commit).
pub struct Transaction<'a> {
    journal: &'a mut UndoJournal,
    ops: Vec<UndoOp>,
}

impl Transaction<'_> {
    /// Add an annotation to the model and record the inverse
    pub fn add_annotation(
        &mut self,
        model: &mut DocumentModel,
        annotation: Annotation,
    ) -> AnnotationId {
        let id = model.add_annotation(annotation.clone());
        self.ops.push(UndoOp::Add { annotation });
        id
    }

    /// Remove an annotation from the model and record the inverse
    pub fn remove_annotation(&mut self, model: &mut DocumentModel, id: AnnotationId) -> bool {
        match model.remove_annotation(id) {
            Some(annotation) => {
                self.ops.push(UndoOp::Remove { annotation });
                true
            }
            None => false,
        }
    }

    /// Rewrite a FreeText annotation's state and record before/after.
    ///
    /// No-ops (after equals the current state) are not recorded.
    pub fn rewrite(
        &mut self,
        model: &mut DocumentModel,
        id: AnnotationId,
        after: FreeTextState,
    ) -> bool {
        let Some(annotation) = model.annotations_mut().get_mut(id) else {
            return false;
        };
        let Some(before) = FreeTextState::capture(annotation) else {
            return false;
        };
        if before == after {
            return false;
        }

        after.restore(annotation);
        self.ops.push(UndoOp::Rewrite { id, before, after });
        true
    }

    /// Record a rewrite whose `after` state has already been applied to
    /// the model (live-mutation flows: drag-move, overlay commit).
    ///
    /// No-ops are not recorded.
    pub fn record_rewrite(
        &mut self,
        id: AnnotationId,
        before: FreeTextState,
        after: FreeTextState,
    ) -> bool {
        if before == after {
            return false;
        }
        self.ops.push(UndoOp::Rewrite { id, before, after });
        true
    }

    /// Record the accumulated ops as one undo entry. Empty transactions
    /// record nothing.
    pub fn commit(self) {
        if !self.ops.is_empty() {
            self.journal.record(UndoEntry { ops: self.ops });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PageModel;

    fn letter_doc() -> DocumentModel {
        DocumentModel::with_pages(vec![PageModel::letter()])
    }

    fn sample_free_text() -> Annotation {
        Annotation::free_text(
            0,
            PageRect::new(50.0, 700.0, 100.0, 20.0),
            "original",
            FontSpec::default_font(),
        )
    }

    #[test]
    fn test_add_then_undo_removes() {
        let mut model = letter_doc();
        let mut journal = UndoJournal::new();

        let mut tx = journal.begin();
        let id = tx.add_annotation(&mut model, sample_free_text());
        tx.commit();
        assert_eq!(model.annotation_count(), 1);

        assert!(journal.undo(&mut model));
        assert_eq!(model.annotation_count(), 0);

        assert!(journal.redo(&mut model));
        assert_eq!(model.annotation_count(), 1);
        assert!(model.annotations().get(id).is_some());
    }

    #[test]
    fn test_grouped_ops_undo_together() {
        let mut model = letter_doc();
        let mut journal = UndoJournal::new();

        let mut tx = journal.begin();
        tx.add_annotation(&mut model, Annotation::cover(0, PageRect::new(0.0, 0.0, 10.0, 10.0)));
        tx.add_annotation(&mut model, Annotation::cover(0, PageRect::new(0.0, 20.0, 10.0, 10.0)));
        tx.add_annotation(&mut model, sample_free_text());
        tx.commit();
        assert_eq!(model.annotation_count(), 3);
        assert_eq!(journal.depth(), 1);

        assert!(journal.undo(&mut model));
        assert_eq!(model.annotation_count(), 0);
    }

    #[test]
    fn test_rewrite_round_trips() {
        let mut model = letter_doc();
        let mut journal = UndoJournal::new();
        let annotation = sample_free_text();
        let id = annotation.id();
        model.add_annotation(annotation);

        let mut tx = journal.begin();
        let after = FreeTextState {
            contents: "edited".to_string(),
            bounds: PageRect::new(50.0, 690.0, 120.0, 30.0),
            font: FontSpec::new("Helvetica", 14.0),
        };
        assert!(tx.rewrite(&mut model, id, after.clone()));
        tx.commit();

        assert_eq!(model.annotations().get(id).unwrap().contents(), Some("edited"));

        journal.undo(&mut model);
        let annotation = model.annotations().get(id).unwrap();
        assert_eq!(annotation.contents(), Some("original"));
        assert_eq!(annotation.bounds(), PageRect::new(50.0, 700.0, 100.0, 20.0));

        journal.redo(&mut model);
        assert_eq!(
            FreeTextState::capture(model.annotations().get(id).unwrap()).unwrap(),
            after
        );
    }

    #[test]
    fn test_noop_rewrite_not_recorded() {
        let mut model = letter_doc();
        let mut journal = UndoJournal::new();
        let annotation = sample_free_text();
        let id = annotation.id();
        let state = FreeTextState::capture(&annotation).unwrap();
        model.add_annotation(annotation);

        let mut tx = journal.begin();
        assert!(!tx.rewrite(&mut model, id, state));
        tx.commit();

        assert!(!journal.can_undo());
    }

    #[test]
    fn test_undo_redo_compose_indefinitely() {
        let mut model = letter_doc();
        let mut journal = UndoJournal::new();

        let mut tx = journal.begin();
        tx.add_annotation(&mut model, sample_free_text());
        tx.commit();

        for _ in 0..4 {
            assert!(journal.undo(&mut model));
            assert_eq!(model.annotation_count(), 0);
            assert!(journal.redo(&mut model));
            assert_eq!(model.annotation_count(), 1);
        }
    }

    #[test]
    fn test_new_entry_clears_redo() {
        let mut model = letter_doc();
        let mut journal = UndoJournal::new();

        let mut tx = journal.begin();
        tx.add_annotation(&mut model, sample_free_text());
        tx.commit();
        journal.undo(&mut model);
        assert!(journal.can_redo());

        let mut tx = journal.begin();
        tx.add_annotation(&mut model, sample_free_text());
        tx.commit();
        assert!(!journal.can_redo());
    }

    #[test]
    fn test_remove_then_undo_restores() {
        let mut model = letter_doc();
        let mut journal = UndoJournal::new();
        let annotation = sample_free_text();
        let id = annotation.id();
        model.add_annotation(annotation);

        let mut tx = journal.begin();
        assert!(tx.remove_annotation(&mut model, id));
        tx.commit();
        assert_eq!(model.annotation_count(), 0);

        journal.undo(&mut model);
        assert_eq!(model.annotation_count(), 1);
        assert_eq!(model.annotations().get(id).unwrap().contents(), Some("original"));
    }
}
