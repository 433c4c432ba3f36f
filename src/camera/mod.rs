//! Camera system for 3D scene viewing.
//!
//! Provides a perspective camera and an orbit controller with damping,
//! distance bounds, and a polar-angle ceiling.

/// Orbit controller: pointer input to rotation/dolly about a fixed target.
pub mod controller;
/// Core camera struct and GPU uniform type.
pub mod core;

pub use controller::{InteractionState, OrbitController};
pub use self::core::{CameraUniform, PerspectiveCamera};
