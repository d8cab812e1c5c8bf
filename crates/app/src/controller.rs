//! Document controller
//!
//! Owns one open document and everything around it: the persistence
//! backend, the in-memory model, the undo journal, the overlay editor,
//! and the external surfaces (open/save, drag-and-drop, clipboard, menu
//! commands). The windowing host forwards events here and renders from
//! the model; all outcomes are reported through a single human-readable
//! status string plus the dirty flag.

use crate::clipboard;
use overtype_core::document::{DocumentModel, PageModel};
use overtype_core::geometry::{PagePoint, PageRect};
use overtype_core::journal::UndoJournal;
use overtype_core::selection::Selection;
use overtype_engine::PdfBackend;
use overtype_ui::editor::OverlayEditor;
use overtype_ui::transform::{ViewPoint, ViewTransform};
use std::path::{Path, PathBuf};

/// Sandboxed file access grant
///
/// Models a security-scoped resource: acquired on open, released exactly
/// once. The controller holds at most one at a time and releases the old
/// grant before acquiring a new one.
#[derive(Debug)]
pub struct AccessScope {
    path: PathBuf,
    released: bool,
}

impl AccessScope {
    fn acquire(path: &Path) -> Self {
        log::debug!("acquiring access scope for {}", path.display());
        Self {
            path: path.to_path_buf(),
            released: false,
        }
    }

    fn release(&mut self) {
        if !self.released {
            log::debug!("releasing access scope for {}", self.path.display());
            self.released = true;
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AccessScope {
    fn drop(&mut self) {
        self.release();
    }
}

/// A drag-and-drop payload offered by the host
#[derive(Debug, Clone)]
pub enum DropPayload {
    /// A dropped file-system reference
    Path(PathBuf),

    /// Raw PDF bytes
    Bytes(Vec<u8>),

    /// Anything else; rejected
    Other,
}

/// Host menu commands routed to the focused document
#[derive(Debug, Clone)]
pub enum MenuCommand {
    Open(PathBuf),
    Save,
    SaveAs(PathBuf),
    CloseWindow,
    Undo,
    Redo,
    Cut,
    Copy,
    Paste,
}

/// Controller for one document view
pub struct DocumentController {
    backend: Option<PdfBackend>,
    model: DocumentModel,
    journal: UndoJournal,
    editor: OverlayEditor,
    transform: ViewTransform,

    /// View size in view units, for deriving the viewport center
    viewport: (f32, f32),

    path: Option<PathBuf>,
    access: Option<AccessScope>,
    selection: Option<Selection>,

    status: String,
    dirty: bool,
}

impl Default for DocumentController {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentController {
    pub fn new() -> Self {
        Self {
            backend: None,
            model: DocumentModel::new(),
            journal: UndoJournal::new(),
            editor: OverlayEditor::new(),
            transform: ViewTransform::identity(),
            viewport: (800.0, 1000.0),
            path: None,
            access: None,
            selection: None,
            status: "No document".to_string(),
            dirty: false,
        }
    }

    /// Human-readable outcome of the last surface operation
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Whether the document has unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn has_document(&self) -> bool {
        self.backend.is_some()
    }

    pub fn model(&self) -> &DocumentModel {
        &self.model
    }

    pub fn editor(&self) -> &OverlayEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut OverlayEditor {
        &mut self.editor
    }

    pub fn journal_mut(&mut self) -> &mut UndoJournal {
        &mut self.journal
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Update the view transform (zoom/scroll changes)
    pub fn set_transform(&mut self, transform: ViewTransform) {
        self.transform = transform;
    }

    pub fn transform(&self) -> &ViewTransform {
        &self.transform
    }

    /// Update the view size (window resize)
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = (width, height);
    }

    /// Open a document from a file-system path.
    ///
    /// On failure the previously open document (if any) is untouched.
    pub fn open_path(&mut self, path: &Path) -> bool {
        let name = display_name(path);
        match PdfBackend::open_path(path) {
            Ok(backend) => {
                self.install(backend, Some(path));
                self.status = name;
                true
            }
            Err(err) => {
                log::error!("open failed for {}: {}", path.display(), err);
                self.status = format!("Failed to open {}: {}", name, err);
                false
            }
        }
    }

    /// Open a document from raw in-memory bytes.
    pub fn open_bytes(&mut self, bytes: &[u8]) -> bool {
        match PdfBackend::open_bytes(bytes) {
            Ok(backend) => {
                self.install(backend, None);
                self.status = "untitled".to_string();
                true
            }
            Err(err) => {
                log::error!("open from memory failed: {}", err);
                self.status = format!("Failed to open dropped data: {}", err);
                false
            }
        }
    }

    /// Replace the current document with a freshly opened one
    fn install(&mut self, mut backend: PdfBackend, path: Option<&Path>) {
        match backend.load_model() {
            Ok(model) => self.model = model,
            Err(err) => {
                // Pages opened but annotations did not parse: keep the
                // document usable with an empty annotation set.
                log::warn!("annotation import failed: {}", err);
                self.model = DocumentModel::with_pages(vec![
                    PageModel::letter();
                    backend.page_count() as usize
                ]);
            }
        }

        // Release the old grant before acquiring the new one
        if let Some(access) = &mut self.access {
            access.release();
        }
        self.access = path.map(AccessScope::acquire);

        self.backend = Some(backend);
        self.path = path.map(Path::to_path_buf);
        self.journal = UndoJournal::new();
        self.editor = OverlayEditor::new();
        self.selection = None;
        self.dirty = false;
    }

    /// Write to the previously opened path. Silent no-op with nothing
    /// open; reports through the status string otherwise. The dirty flag
    /// clears only on success.
    pub fn save(&mut self) -> bool {
        self.editor.focus_lost(&mut self.model, &mut self.journal);

        let Some(backend) = &self.backend else {
            return false;
        };
        let Some(path) = self.path.clone() else {
            self.status = "No file path; use Save As".to_string();
            return false;
        };

        // Re-acquire sandbox access for the duration of the write
        let mut scope = AccessScope::acquire(&path);
        let result = backend.save(&self.model, &path);
        scope.release();

        match result {
            Ok(()) => {
                self.dirty = false;
                self.status = format!("Saved {}", display_name(&path));
                true
            }
            Err(err) => {
                log::error!("save failed for {}: {}", path.display(), err);
                self.status = format!("Failed to save {}: {}", display_name(&path), err);
                false
            }
        }
    }

    /// Write a full copy to `path` and adopt it as the document's path.
    pub fn save_as(&mut self, path: &Path) -> bool {
        self.editor.focus_lost(&mut self.model, &mut self.journal);

        let Some(backend) = &self.backend else {
            return false;
        };

        match backend.save(&self.model, path) {
            Ok(()) => {
                if let Some(access) = &mut self.access {
                    access.release();
                }
                self.access = Some(AccessScope::acquire(path));
                self.path = Some(path.to_path_buf());
                self.dirty = false;
                self.status = format!("Saved {}", display_name(path));
                true
            }
            Err(err) => {
                log::error!("save-as failed for {}: {}", path.display(), err);
                self.status = format!("Failed to save {}: {}", display_name(path), err);
                false
            }
        }
    }

    /// Accept or reject a drag-and-drop payload
    pub fn handle_drop(&mut self, payload: DropPayload) -> bool {
        match payload {
            DropPayload::Path(path) => self.open_path(&path),
            DropPayload::Bytes(bytes) => self.open_bytes(&bytes),
            DropPayload::Other => {
                self.status = "Unsupported drop payload".to_string();
                false
            }
        }
    }

    /// Current text selection, set by the host's text layout
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Mask the current selection and overlay replacement text, entering
    /// an edit session on the first synthesized annotation. Clears the
    /// selection and marks dirty when anything was created.
    pub fn replace_selection(&mut self, replacement: &str) -> bool {
        let Some(selection) = self.selection.take() else {
            return false;
        };

        let effect = self.editor.replace_selection_with(
            &mut self.model,
            &mut self.journal,
            &selection,
            replacement,
        );
        if effect.dirty {
            self.dirty = true;
        }
        self.editor.is_editing()
    }

    /// Plain-text export of the focused editing surface or the current
    /// selection
    pub fn copy_text(&self) -> Option<String> {
        if let Some(session) = self.editor.session() {
            return Some(session.buffer.clone());
        }
        self.selection.as_ref().map(Selection::plain_text)
    }

    /// Copy to the system clipboard
    pub fn copy(&mut self) {
        if let Some(text) = self.copy_text() {
            if let Err(err) = clipboard::copy_to_clipboard(&text) {
                log::warn!("clipboard copy failed: {}", err);
                self.status = err.to_string();
            }
        }
    }

    /// Cut: copy, then empty the live buffer when a session is focused
    pub fn cut(&mut self) {
        self.copy();
        if self.editor.cut_buffer().is_some() {
            self.dirty = true;
        }
    }

    /// Insert pasted text. When an edit session is live the text goes
    /// into its buffer; otherwise a new free-text annotation is created
    /// at the pointer's page point (or the viewport-center page point
    /// when the pointer is outside the page) and editing begins with the
    /// pasted buffer.
    pub fn paste_text(&mut self, text: &str, pointer: Option<ViewPoint>) -> bool {
        if text.is_empty() || !self.has_document() {
            return false;
        }

        if self.editor.is_editing() {
            self.editor.insert_text(text);
            self.dirty = true;
            return true;
        }

        let point = self.paste_target(pointer);
        let transform = self.transform;
        let effect = self
            .editor
            .create_at(&mut self.model, &mut self.journal, &transform, 0, point, text);
        if effect.dirty {
            self.dirty = true;
        }
        self.editor.is_editing()
    }

    /// Paste from the system clipboard
    pub fn paste(&mut self, pointer: Option<ViewPoint>) -> bool {
        match clipboard::read_from_clipboard() {
            Ok(text) => self.paste_text(&text, pointer),
            Err(err) => {
                log::warn!("clipboard paste failed: {}", err);
                false
            }
        }
    }

    /// Pointer page point for paste insertion, falling back to the
    /// viewport center clamped inside the page
    fn paste_target(&self, pointer: Option<ViewPoint>) -> PagePoint {
        let media = self
            .model
            .media_box(0)
            .unwrap_or(PageRect::new(0.0, 0.0, 612.0, 792.0));

        if let Some(view) = pointer {
            let point = self.transform.to_page(view);
            if media.contains_point(&point) {
                return point;
            }
        }

        let center = self
            .transform
            .to_page(ViewPoint::new(self.viewport.0 / 2.0, self.viewport.1 / 2.0));
        PagePoint::new(
            center.x.clamp(media.x, media.max_x()),
            center.y.clamp(media.y, media.max_y()),
        )
    }

    /// Undo the most recent journal entry, committing any live session
    /// first
    pub fn undo(&mut self) -> bool {
        self.editor.focus_lost(&mut self.model, &mut self.journal);
        let undone = self.journal.undo(&mut self.model);
        if undone {
            self.dirty = true;
        }
        undone
    }

    /// Redo the most recently undone entry
    pub fn redo(&mut self) -> bool {
        self.editor.focus_lost(&mut self.model, &mut self.journal);
        let redone = self.journal.redo(&mut self.model);
        if redone {
            self.dirty = true;
        }
        redone
    }

    /// Route a host menu command
    pub fn handle_command(&mut self, command: MenuCommand) {
        match command {
            MenuCommand::Open(path) => {
                self.open_path(&path);
            }
            MenuCommand::Save => {
                self.save();
            }
            MenuCommand::SaveAs(path) => {
                self.save_as(&path);
            }
            MenuCommand::CloseWindow => {
                // Flush the buffer; the host tears the window down
                self.editor.focus_lost(&mut self.model, &mut self.journal);
            }
            MenuCommand::Undo => {
                self.undo();
            }
            MenuCommand::Redo => {
                self.redo();
            }
            MenuCommand::Cut => self.cut(),
            MenuCommand::Copy => self.copy(),
            MenuCommand::Paste => {
                self.paste(None);
            }
        }
    }

    /// Mark the document dirty (gesture effects from the editor surface)
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[cfg(test)]
    fn access(&self) -> Option<&AccessScope> {
        self.access.as_ref()
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
