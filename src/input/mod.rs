//! Input handling: platform-agnostic pointer events.

/// Platform-agnostic input events.
pub mod event;

pub use event::{InputEvent, MouseButton};
