//! Overlay text editor
//!
//! An in-place editing surface bound 1:1 to a free-text annotation. The
//! gesture state machine is:
//!
//! ```text
//! Idle -> PendingClick -> (Editing | DraggingMove) -> Idle
//! ```
//!
//! Double-clicks create a new annotation, open an existing one, or mask a
//! word selection through the replacement pipeline. A single mouse-down
//! on an annotation is ambiguous until the pointer either exceeds the
//! drag threshold (move) or is released (edit). While editing, resize and
//! font-size handle drags are sub-gestures tracked on the session.
//!
//! There is no cancel path: every interaction that would abandon a
//! session commits it instead. Commit is the only transition that clears
//! the session.

use crate::transform::{ViewPoint, ViewTransform};
use overtype_core::annotation::{Annotation, AnnotationId, AnnotationKind, FontSpec};
use overtype_core::document::DocumentModel;
use overtype_core::geometry::{PagePoint, PageRect};
use overtype_core::journal::{FreeTextState, UndoJournal};
use overtype_core::layout::{wrapped_height, EstimatedMetrics, TextMetrics};
use overtype_core::selection::Selection;
use overtype_core::synthesize::{self, replace_selection};

/// Tunable editor geometry and gesture parameters
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Size of a newly created annotation box, in view units
    pub default_box_view: (f32, f32),

    /// Pointer travel (view units) before a pending click becomes a move
    pub drag_threshold_view: f32,

    /// Minimum overlay width in page points
    pub min_width: f32,

    /// Horizontal inset between overlay bounds and the wrap width
    pub wrap_inset: f32,

    /// Vertical padding added to the wrapped text height
    pub text_padding: f32,

    /// Font size change per view unit of handle drag
    pub font_step: f32,

    /// Font size clamp, in page points
    pub font_min: f32,
    pub font_max: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_box_view: (160.0, 30.0),
            drag_threshold_view: 2.0,
            min_width: 40.0,
            wrap_inset: synthesize::WRAP_INSET,
            text_padding: synthesize::HEIGHT_PAD,
            font_step: 0.5,
            font_min: 6.0,
            font_max: 72.0,
        }
    }
}

/// Which handle a sub-gesture is dragging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    /// Horizontal-only width adjustment
    Resize,

    /// Vertical font-size adjustment
    FontSize,
}

#[derive(Debug, Clone, Copy)]
struct HandleDrag {
    handle: Handle,
    start_view: ViewPoint,
    /// Width (Resize) or font size (FontSize) at drag start
    start_value: f32,
}

/// Live state of one in-place edit
#[derive(Debug, Clone)]
pub struct EditSession {
    pub annotation_id: AnnotationId,
    pub page_index: u16,

    /// Live text buffer; written back to the annotation on commit
    pub buffer: String,

    /// Live font; handle drags mutate this before commit
    pub font: FontSpec,

    /// Live overlay geometry; re-flowed on every buffer change
    pub bounds: PageRect,

    /// Pre-edit state, for the undo entry pushed at commit
    snapshot: FreeTextState,

    drag: Option<HandleDrag>,
}

/// Decorative geometry derived from the live session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayChrome {
    pub outline: PageRect,

    /// Right edge midpoint; horizontal drags resize
    pub resize_handle: PagePoint,

    /// Bottom-right corner; vertical drags change font size
    pub font_size_handle: PagePoint,
}

/// What a gesture did to the document
#[derive(Debug, Clone, Copy, Default)]
pub struct EditorEffect {
    /// The document changed in a way the dirty indicator must reflect
    pub dirty: bool,
}

#[derive(Debug)]
enum EditorState {
    Idle,
    PendingClick {
        annotation_id: AnnotationId,
        start_view: ViewPoint,
    },
    DraggingMove {
        annotation_id: AnnotationId,
        original: FreeTextState,
        last_view: ViewPoint,
    },
    Editing(EditSession),
}

/// The overlay editor: gesture state plus measurement strategy
pub struct OverlayEditor {
    state: EditorState,
    config: EditorConfig,
    metrics: Box<dyn TextMetrics>,
}

impl Default for OverlayEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayEditor {
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        Self {
            state: EditorState::Idle,
            config,
            metrics: Box::new(EstimatedMetrics::default()),
        }
    }

    /// Substitute a measurement implementation (e.g. real font metrics)
    pub fn with_metrics(mut self, metrics: Box<dyn TextMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// The live edit session, if any
    pub fn session(&self) -> Option<&EditSession> {
        match &self.state {
            EditorState::Editing(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.session().is_some()
    }

    /// Outline and handle geometry tracking the live overlay
    pub fn chrome(&self) -> Option<OverlayChrome> {
        self.session().map(|session| OverlayChrome {
            outline: session.bounds,
            resize_handle: PagePoint::new(
                session.bounds.max_x(),
                session.bounds.y + session.bounds.height / 2.0,
            ),
            font_size_handle: PagePoint::new(session.bounds.max_x(), session.bounds.y),
        })
    }

    /// Double-click: edit the annotation under the pointer, mask the word
    /// selection under it, or create a fresh annotation on empty page
    /// area. Any in-flight session commits first.
    pub fn double_click(
        &mut self,
        model: &mut DocumentModel,
        journal: &mut UndoJournal,
        transform: &ViewTransform,
        page_index: u16,
        view: ViewPoint,
        word_selection: Option<&Selection>,
    ) -> EditorEffect {
        let point = transform.to_page(view);

        // Double-clicks inside the live overlay select words in the text
        // view; the state machine stays put.
        if let EditorState::Editing(session) = &self.state {
            if session.page_index == page_index && session.bounds.contains_point(&point) {
                return EditorEffect::default();
            }
        }

        let hit = model.free_text_at(page_index, &point).map(|a| a.id());
        if let Some(id) = hit {
            let effect = self.commit(model, journal);
            self.begin_session(model, id);
            return effect;
        }

        if let Some(selection) = word_selection {
            return self.replace_selection_with(model, journal, selection, "");
        }

        self.create_at(model, journal, transform, page_index, point, "")
    }

    /// Run the full mask-and-overlay pipeline for a selection, then begin
    /// editing the focused free-text annotation. An empty `replacement`
    /// keeps the selection's own text.
    pub fn replace_selection_with(
        &mut self,
        model: &mut DocumentModel,
        journal: &mut UndoJournal,
        selection: &Selection,
        replacement: &str,
    ) -> EditorEffect {
        let mut effect = self.commit(model, journal);
        let outcome = replace_selection(model, journal, selection, replacement, self.metrics.as_ref());
        if let Some(focus) = outcome.focus {
            effect.dirty = true;
            self.begin_session(model, focus);
        }
        effect
    }

    /// Take the live buffer for a cut, leaving the session editing an
    /// empty buffer. `None` when no session is live.
    pub fn cut_buffer(&mut self) -> Option<String> {
        match &mut self.state {
            EditorState::Editing(session) => {
                let text = std::mem::take(&mut session.buffer);
                reflow_session(session, &self.config, self.metrics.as_ref());
                Some(text)
            }
            _ => None,
        }
    }

    /// Create a new free-text annotation at `point` (its top-left corner),
    /// sized to the default box scaled by the current zoom and clamped
    /// inside the page, then begin editing it with `text` as the buffer.
    ///
    /// Also the paste insertion point for the clipboard surface.
    pub fn create_at(
        &mut self,
        model: &mut DocumentModel,
        journal: &mut UndoJournal,
        transform: &ViewTransform,
        page_index: u16,
        point: PagePoint,
        text: &str,
    ) -> EditorEffect {
        let mut effect = self.commit(model, journal);

        let Some(media_box) = model.media_box(page_index) else {
            log::warn!("create_at: page {} does not exist", page_index);
            return effect;
        };

        let width = transform.len_to_page(self.config.default_box_view.0);
        let height = transform.len_to_page(self.config.default_box_view.1);
        let bounds =
            PageRect::new(point.x, point.y - height, width, height).clamped_within(&media_box);

        let annotation = Annotation::free_text(page_index, bounds, text, FontSpec::default_font());
        let id = annotation.id();

        let mut tx = journal.begin();
        tx.add_annotation(model, annotation);
        tx.commit();

        effect.dirty = true;
        self.begin_session(model, id);
        effect
    }

    /// Single mouse-down. On a free-text annotation this is ambiguous
    /// (edit vs. move) and parks in `PendingClick`; anywhere else it
    /// commits the in-flight session.
    pub fn mouse_down(
        &mut self,
        model: &mut DocumentModel,
        journal: &mut UndoJournal,
        transform: &ViewTransform,
        page_index: u16,
        view: ViewPoint,
    ) -> EditorEffect {
        let point = transform.to_page(view);

        // Clicks inside the live overlay belong to the text view (caret
        // placement), not the state machine.
        if let EditorState::Editing(session) = &self.state {
            if session.page_index == page_index && session.bounds.contains_point(&point) {
                return EditorEffect::default();
            }
        }

        let effect = self.commit(model, journal);

        if let Some(id) = model.free_text_at(page_index, &point).map(|a| a.id()) {
            self.state = EditorState::PendingClick {
                annotation_id: id,
                start_view: view,
            };
        }
        effect
    }

    /// Pointer motion: promotes a pending click to a live move once the
    /// threshold is exceeded, and translates the annotation while moving.
    pub fn mouse_moved(
        &mut self,
        model: &mut DocumentModel,
        transform: &ViewTransform,
        view: ViewPoint,
    ) {
        match &mut self.state {
            EditorState::PendingClick {
                annotation_id,
                start_view,
            } => {
                if start_view.distance_to(&view) <= self.config.drag_threshold_view {
                    return;
                }
                let id = *annotation_id;
                let start = *start_view;

                let Some(original) = model
                    .annotations()
                    .get(id)
                    .and_then(FreeTextState::capture)
                else {
                    self.state = EditorState::Idle;
                    return;
                };

                translate_annotation(model, id, transform, start, view);
                self.state = EditorState::DraggingMove {
                    annotation_id: id,
                    original,
                    last_view: view,
                };
            }
            EditorState::DraggingMove {
                annotation_id,
                last_view,
                ..
            } => {
                let id = *annotation_id;
                let last = *last_view;
                *last_view = view;
                translate_annotation(model, id, transform, last, view);
            }
            _ => {}
        }
    }

    /// Mouse release: a pending click becomes an edit session; a move
    /// finishes and records its undo entry.
    pub fn mouse_up(
        &mut self,
        model: &mut DocumentModel,
        journal: &mut UndoJournal,
    ) -> EditorEffect {
        match std::mem::replace(&mut self.state, EditorState::Idle) {
            EditorState::PendingClick { annotation_id, .. } => {
                self.begin_session(model, annotation_id);
                EditorEffect::default()
            }
            EditorState::DraggingMove {
                annotation_id,
                original,
                ..
            } => {
                let after = model
                    .annotations()
                    .get(annotation_id)
                    .and_then(FreeTextState::capture);
                let mut effect = EditorEffect::default();
                if let Some(after) = after {
                    let mut tx = journal.begin();
                    effect.dirty = tx.record_rewrite(annotation_id, original, after);
                    tx.commit();
                }
                effect
            }
            other => {
                self.state = other;
                EditorEffect::default()
            }
        }
    }

    /// Append typed text to the live buffer and re-flow
    pub fn insert_text(&mut self, text: &str) {
        if let EditorState::Editing(session) = &mut self.state {
            session.buffer.push_str(text);
            reflow_session(session, &self.config, self.metrics.as_ref());
        }
    }

    /// Delete the last character of the live buffer and re-flow
    pub fn backspace(&mut self) {
        if let EditorState::Editing(session) = &mut self.state {
            session.buffer.pop();
            reflow_session(session, &self.config, self.metrics.as_ref());
        }
    }

    /// Enter/Return commits the session
    pub fn key_enter(
        &mut self,
        model: &mut DocumentModel,
        journal: &mut UndoJournal,
    ) -> EditorEffect {
        self.commit(model, journal)
    }

    /// Focus loss always flushes the buffer, never discards it
    pub fn focus_lost(
        &mut self,
        model: &mut DocumentModel,
        journal: &mut UndoJournal,
    ) -> EditorEffect {
        self.commit(model, journal)
    }

    /// Start a resize-handle drag
    pub fn begin_resize_drag(&mut self, view: ViewPoint) {
        if let EditorState::Editing(session) = &mut self.state {
            session.drag = Some(HandleDrag {
                handle: Handle::Resize,
                start_view: view,
                start_value: session.bounds.width,
            });
        }
    }

    /// Start a font-size-handle drag
    pub fn begin_font_drag(&mut self, view: ViewPoint) {
        if let EditorState::Editing(session) = &mut self.state {
            session.drag = Some(HandleDrag {
                handle: Handle::FontSize,
                start_view: view,
                start_value: session.font.size,
            });
        }
    }

    /// Update the active handle drag. Resize is horizontal-only with a
    /// width floor; font size is vertical with a fixed step per view
    /// unit, clamped to the configured range. Both re-flow.
    pub fn drag_handle_to(&mut self, transform: &ViewTransform, view: ViewPoint) {
        if let EditorState::Editing(session) = &mut self.state {
            let Some(drag) = session.drag else { return };
            match drag.handle {
                Handle::Resize => {
                    let delta = transform.len_to_page(view.x - drag.start_view.x);
                    session.bounds.width = (drag.start_value + delta).max(self.config.min_width);
                }
                Handle::FontSize => {
                    let delta = (view.y - drag.start_view.y) * self.config.font_step;
                    session.font.size =
                        (drag.start_value + delta).clamp(self.config.font_min, self.config.font_max);
                }
            }
            reflow_session(session, &self.config, self.metrics.as_ref());
        }
    }

    /// Finish the active handle drag; its result folds into the commit
    pub fn end_handle_drag(&mut self) {
        if let EditorState::Editing(session) = &mut self.state {
            session.drag = None;
        }
    }

    /// Commit the live session: write the buffer and live geometry back
    /// to the annotation, restore its visibility, and record one undo
    /// entry. Dirty only when the content changed; an unchanged session
    /// records nothing.
    pub fn commit(
        &mut self,
        model: &mut DocumentModel,
        journal: &mut UndoJournal,
    ) -> EditorEffect {
        match std::mem::replace(&mut self.state, EditorState::Idle) {
            EditorState::Editing(session) => finish_session(session, model, journal),
            other => {
                self.state = other;
                EditorEffect::default()
            }
        }
    }

    /// Open an edit session on an annotation. The annotation is hidden
    /// while the overlay shows its live buffer.
    fn begin_session(&mut self, model: &mut DocumentModel, id: AnnotationId) {
        let Some(annotation) = model.annotations_mut().get_mut(id) else {
            return;
        };
        let Some(snapshot) = FreeTextState::capture(annotation) else {
            return;
        };
        annotation.set_visible(false);

        self.state = EditorState::Editing(EditSession {
            annotation_id: id,
            page_index: annotation.page_index(),
            buffer: snapshot.contents.clone(),
            font: snapshot.font.clone(),
            bounds: snapshot.bounds,
            snapshot,
            drag: None,
        });
    }
}

fn translate_annotation(
    model: &mut DocumentModel,
    id: AnnotationId,
    transform: &ViewTransform,
    from: ViewPoint,
    to: ViewPoint,
) {
    let dx = transform.len_to_page(to.x - from.x);
    let dy = transform.len_to_page(to.y - from.y);
    if let Some(annotation) = model.annotations_mut().get_mut(id) {
        let bounds = annotation.bounds().translated(dx, dy);
        annotation.set_bounds(bounds);
    }
}

/// Recompute the overlay height for the current buffer, keeping the top
/// edge fixed while the bottom grows or shrinks.
fn reflow_session(session: &mut EditSession, config: &EditorConfig, metrics: &dyn TextMetrics) {
    let top = session.bounds.max_y();
    let wrap_width = (session.bounds.width - config.wrap_inset).max(1.0);
    let text_height = wrapped_height(&session.buffer, &session.font, wrap_width, metrics);
    let min_height = metrics.line_height(&session.font) + config.text_padding;
    let height = (text_height + config.text_padding).max(min_height);

    session.bounds = PageRect::new(
        session.bounds.x,
        top - height,
        session.bounds.width,
        height,
    );
}

fn finish_session(
    session: EditSession,
    model: &mut DocumentModel,
    journal: &mut UndoJournal,
) -> EditorEffect {
    let Some(annotation) = model.annotations_mut().get_mut(session.annotation_id) else {
        log::warn!("commit: annotation {} disappeared", session.annotation_id);
        return EditorEffect::default();
    };

    let after = FreeTextState {
        contents: session.buffer,
        bounds: session.bounds,
        font: session.font,
    };

    if let AnnotationKind::FreeText {
        bounds,
        contents,
        font,
        ..
    } = &mut annotation.kind
    {
        *bounds = after.bounds;
        *contents = after.contents.clone();
        *font = after.font.clone();
    }
    annotation.set_visible(true);

    let content_changed = session.snapshot.contents != after.contents;
    let mut tx = journal.begin();
    tx.record_rewrite(session.annotation_id, session.snapshot, after);
    tx.commit();

    EditorEffect {
        dirty: content_changed,
    }
}
