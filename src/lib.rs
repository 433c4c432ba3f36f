// -- Lint policy ---------------------------------------------------------
// Clippy policy lives here; rustc lints are set in Cargo.toml.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Function signature hygiene
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Tests may unwrap.
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

//! Interactive wgpu viewer for a single animated glTF diorama.
//!
//! The viewer shows one model on a shadow-receiving ground plane, lit by a
//! shadow-casting spot light and a point light whose position and
//! intensity are editable from a parameter panel. The camera orbits the
//! origin with damped pointer controls.
//!
//! # Key entry points
//!
//! - [`Viewer`] - window + event loop (feature `viewer`)
//! - [`engine::Engine`] - render surface, renderer and stage
//! - [`engine::Stage`] - headless frame state: scene, camera, controls,
//!   panel, model slot
//! - [`loader::AssetLoader`] - background glTF/GLB loading
//! - [`animation::AnimationMixer`] - keyframe playback onto scene nodes
//! - [`options::Options`] - TOML configuration
//!
//! # Frame
//!
//! Each frame updates the orbit controller, measures the elapsed time,
//! polls the in-flight model load (grafting it into the scene on
//! completion), advances the mixer and renders a shadow pass followed by
//! the lit scene pass. Nothing on the main thread waits for the loader.

pub mod animation;
pub mod camera;
pub mod engine;
pub mod error;
pub mod gpu;
#[cfg(feature = "gui")]
pub mod gui;
pub mod input;
pub mod loader;
pub mod options;
pub mod panel;
pub mod renderer;
pub mod scene;
pub mod util;
#[cfg(feature = "viewer")]
pub mod viewer;

pub use engine::{Engine, Stage};
pub use error::DioramaError;
pub use input::{InputEvent, MouseButton};
pub use options::Options;
#[cfg(feature = "viewer")]
pub use viewer::Viewer;
