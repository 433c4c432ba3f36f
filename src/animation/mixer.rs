//! Clip playback against scene nodes.
//!
//! A mixer owns the clips of one loaded model plus a binding table mapping
//! each model-local node index to the [`NodeId`] it was attached as. Actions
//! are created lazily per clip; `update` advances every running action and
//! writes the sampled pose into the scene graph. Overlapping actions on the
//! same property resolve last-writer-wins.

use super::clip::{AnimationClip, TrackValue};
use crate::scene::{NodeId, SceneGraph};

/// What happens when an action's time passes the end of its clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Stop at the last frame.
    Once,
    /// Wrap back to the start.
    #[default]
    Repeat,
    /// Alternate forward and backward.
    PingPong,
}

/// Playback state of one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationAction {
    clip: usize,
    /// Local time in seconds, in `[0, duration]` after wrapping.
    time: f32,
    /// Unwrapped playback time; never decreases.
    elapsed: f32,
    /// Playback speed multiplier.
    pub time_scale: f32,
    /// Loop behavior at the clip end.
    pub loop_mode: LoopMode,
    playing: bool,
    paused: bool,
}

impl AnimationAction {
    fn new(clip: usize) -> Self {
        Self {
            clip,
            time: 0.0,
            elapsed: 0.0,
            time_scale: 1.0,
            loop_mode: LoopMode::Repeat,
            playing: false,
            paused: false,
        }
    }

    /// Index of the clip this action plays.
    #[must_use]
    pub fn clip(&self) -> usize {
        self.clip
    }

    /// Position within the clip in seconds.
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Total seconds of playback since `play`, ignoring loops.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Whether the action advances on `update`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.playing && !self.paused
    }

    /// Start (or resume) playback.
    pub fn play(&mut self) -> &mut Self {
        self.playing = true;
        self.paused = false;
        self
    }

    /// Freeze at the current time.
    pub fn pause(&mut self) -> &mut Self {
        self.paused = true;
        self
    }

    /// Stop and rewind.
    pub fn stop(&mut self) -> &mut Self {
        self.playing = false;
        self.paused = false;
        self.time = 0.0;
        self.elapsed = 0.0;
        self
    }

    fn advance(&mut self, delta: f32, duration: f32) {
        let step = delta * self.time_scale.max(0.0);
        self.elapsed += step;
        if duration <= 0.0 {
            self.time = 0.0;
            return;
        }
        match self.loop_mode {
            LoopMode::Repeat => {
                self.time = (self.time + step).rem_euclid(duration);
            }
            LoopMode::Once => {
                self.time = (self.time + step).min(duration);
                if self.time >= duration {
                    self.playing = false;
                }
            }
            LoopMode::PingPong => {
                let phase = self.elapsed.rem_euclid(duration * 2.0);
                self.time = if phase > duration {
                    duration * 2.0 - phase
                } else {
                    phase
                };
            }
        }
    }
}

/// Plays clips of one model.
#[derive(Debug, Clone, Default)]
pub struct AnimationMixer {
    clips: Vec<AnimationClip>,
    bindings: Vec<NodeId>,
    actions: Vec<AnimationAction>,
    time: f32,
}

impl AnimationMixer {
    /// Create a mixer for `clips`; `bindings[i]` is the scene node for
    /// model node `i`.
    #[must_use]
    pub fn new(clips: Vec<AnimationClip>, bindings: Vec<NodeId>) -> Self {
        Self {
            clips,
            bindings,
            actions: Vec::new(),
            time: 0.0,
        }
    }

    /// Loaded clips.
    #[must_use]
    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    /// Total seconds this mixer has been advanced.
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// The action for clip `index`, created on first request.
    ///
    /// Returns `None` if the model has no such clip.
    pub fn clip_action(&mut self, index: usize) -> Option<&mut AnimationAction> {
        if index >= self.clips.len() {
            return None;
        }
        let pos = match self.actions.iter().position(|a| a.clip == index) {
            Some(pos) => pos,
            None => {
                self.actions.push(AnimationAction::new(index));
                self.actions.len() - 1
            }
        };
        self.actions.get_mut(pos)
    }

    /// Existing action for clip `index`, if one was created.
    #[must_use]
    pub fn existing_action(&self, index: usize) -> Option<&AnimationAction> {
        self.actions.iter().find(|a| a.clip == index)
    }

    /// Number of actions currently advancing.
    #[must_use]
    pub fn running_actions(&self) -> usize {
        self.actions.iter().filter(|a| a.is_running()).count()
    }

    /// Advance running actions by `delta` seconds and pose the bound nodes.
    ///
    /// Negative or non-finite deltas advance by zero. Tracks whose bound
    /// node has been removed from the scene are skipped.
    pub fn update(&mut self, delta: f32, scene: &mut SceneGraph) {
        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        self.time += delta;

        for action in &mut self.actions {
            if !action.is_running() {
                continue;
            }
            let Some(clip) = self.clips.get(action.clip) else {
                continue;
            };
            action.advance(delta, clip.duration);

            for track in &clip.tracks {
                let Some(&node_id) = self.bindings.get(track.target) else {
                    continue;
                };
                let Some(node) = scene.get_mut(node_id) else {
                    continue;
                };
                match track.sample(action.time) {
                    Some(TrackValue::Translation(v)) => {
                        node.transform.position = v;
                    }
                    Some(TrackValue::Rotation(q)) => node.transform.rotation = q,
                    Some(TrackValue::Scale(s)) => node.transform.scale = s,
                    None => {}
                }
            }
        }
    }
}
