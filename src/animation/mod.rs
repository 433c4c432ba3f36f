//! Keyframe animation: clips sampled by a mixer onto scene nodes.

pub mod clip;
pub mod mixer;

pub use clip::{AnimationClip, Interpolation, Track, TrackValue, TrackValues};
pub use mixer::{AnimationAction, AnimationMixer, LoopMode};
