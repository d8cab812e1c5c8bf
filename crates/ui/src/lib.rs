//! Overtype UI Library
//!
//! View/page coordinate conversion and the overlay text editor state
//! machine. Pure interaction logic: the host owns the actual windowing,
//! rendering, and text-caret handling.

pub mod editor;
pub mod transform;

pub use editor::{
    EditSession, EditorConfig, EditorEffect, Handle, OverlayChrome, OverlayEditor,
};
pub use transform::{ViewPoint, ViewTransform};
