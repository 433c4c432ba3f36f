//! Native-side GUI layer: a wry webview hosting the parameter panel.
//!
//! The webview is created as a child of the winit window and talks to the
//! stage through a small JSON IPC bridge.

pub(crate) mod panel;
/// Wry webview creation, IPC parsing and state push helpers.
pub mod webview;
