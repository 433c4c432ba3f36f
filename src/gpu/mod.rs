//! GPU resource management utilities.
//!
//! Provides wgpu device/surface initialization, depth and shadow
//! attachments, and shared pipeline boilerplate.

/// Shared wgpu boilerplate helpers for bind groups and depth state.
pub mod pipeline_helpers;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// Scene depth buffer and shadow map textures.
pub mod texture;
