//! Replacement synthesis
//!
//! Consumes the per-page plans from the selection translator and creates
//! the actual annotations: white covers over every source line rectangle
//! and a free-text overlay whose bounds come from measured text extents
//! and wrap re-flow. All annotations for one replacement land in one
//! journal entry, so a single undo restores the prior annotation set on
//! every affected page.

use crate::annotation::{Annotation, AnnotationId};
use crate::document::DocumentModel;
use crate::geometry::PageRect;
use crate::journal::UndoJournal;
use crate::layout::{layout_paragraph, widest_line, TextMetrics};
use crate::selection::Selection;
use crate::translate::{translate_selection, PageReplacement};

/// Extra width beyond the measured text, so the caret has room
pub const EXTRA_WIDTH: f32 = 20.0;

/// Horizontal inset between overlay bounds and the wrap width
pub const WRAP_INSET: f32 = 8.0;

/// Vertical padding beyond the wrapped text height
pub const HEIGHT_PAD: f32 = 8.0;

/// Annotations created for one page
#[derive(Debug, Clone)]
pub struct PageSynthesis {
    pub page_index: u16,
    pub cover_ids: Vec<AnnotationId>,
    pub free_text_id: AnnotationId,
}

/// Result of synthesizing a whole selection
#[derive(Debug, Clone, Default)]
pub struct SynthesisOutcome {
    /// Per-page annotations, in plan order
    pub pages: Vec<PageSynthesis>,

    /// The first page's free-text annotation, which receives focus and
    /// an immediate edit session
    pub focus: Option<AnnotationId>,
}

impl SynthesisOutcome {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Overlay bounds for a plan: width grows to fit the measured text plus
/// padding, height grows to fit the wrapped block, and the top-left
/// corner stays anchored on the union bounds.
pub fn overlay_bounds(plan: &PageReplacement, metrics: &dyn TextMetrics) -> PageRect {
    let measured = widest_line(&plan.text, &plan.font, metrics);
    let width = plan.union_bounds.width.max(measured + EXTRA_WIDTH);

    let layout = layout_paragraph(
        &plan.text,
        &plan.font,
        width - WRAP_INSET,
        plan.first_line_indent,
        metrics,
    );
    let height = plan.union_bounds.height.max(layout.height + HEIGHT_PAD);

    PageRect::new(
        plan.union_bounds.x,
        plan.union_bounds.max_y() - height,
        width,
        height,
    )
}

/// Create covers and free-text overlays for the given plans inside one
/// journal entry.
pub fn synthesize_replacements(
    model: &mut DocumentModel,
    journal: &mut UndoJournal,
    plans: &[PageReplacement],
    metrics: &dyn TextMetrics,
) -> SynthesisOutcome {
    let mut outcome = SynthesisOutcome::default();
    let mut tx = journal.begin();

    for plan in plans {
        let cover_ids: Vec<AnnotationId> = plan
            .cover_rects
            .iter()
            .map(|rect| tx.add_annotation(model, Annotation::cover(plan.page_index, *rect)))
            .collect();

        let bounds = overlay_bounds(plan, metrics);
        let free_text_id = tx.add_annotation(
            model,
            Annotation::free_text(plan.page_index, bounds, plan.text.clone(), plan.font.clone()),
        );

        if outcome.focus.is_none() {
            outcome.focus = Some(free_text_id);
        }
        outcome.pages.push(PageSynthesis {
            page_index: plan.page_index,
            cover_ids,
            free_text_id,
        });
    }

    tx.commit();
    outcome
}

/// Full pipeline: translate a selection and synthesize its replacements.
///
/// The caller is responsible for clearing the host selection and marking
/// the document dirty when the outcome is non-empty, and for handing the
/// focus annotation to the overlay editor.
pub fn replace_selection(
    model: &mut DocumentModel,
    journal: &mut UndoJournal,
    selection: &Selection,
    replacement: &str,
    metrics: &dyn TextMetrics,
) -> SynthesisOutcome {
    let plans = translate_selection(selection, replacement);
    synthesize_replacements(model, journal, &plans, metrics)
}
