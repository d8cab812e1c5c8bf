//! Overtype application shell
//!
//! The document controller plus the external surfaces the windowing host
//! plugs into: open/save, drag-and-drop payload routing, the system
//! clipboard, and menu command dispatch.

pub mod clipboard;
pub mod controller;

pub use clipboard::{copy_to_clipboard, read_from_clipboard, ClipboardError};
pub use controller::{AccessScope, DocumentController, DropPayload, MenuCommand};
