use serde::{Deserialize, Serialize};

/// Where the model lives and how it is placed once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelOptions {
    /// Directory holding the model and its external buffers.
    pub dir: String,
    /// Model file name inside `dir` (`.glb` or `.gltf`).
    pub file: String,
    /// Geometry decoder directory. Holds uncompressed
    /// `<stem>.decompressed.glb` copies used when the model needs a codec
    /// this build lacks. When set, it must exist or the load fails.
    pub decoder_dir: Option<String>,
    /// Translation applied to the model root.
    pub position: [f32; 3],
    /// Uniform scale applied to the model root.
    pub scale: f32,
    /// Rotation about Y in radians applied to the model root.
    pub rotation_y: f32,
    /// Mark every model mesh as a shadow caster.
    pub cast_shadow: bool,
    /// Index of the clip to start playing, if the model has clips.
    pub autoplay_clip: Option<usize>,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            dir: "assets/models".into(),
            file: "LittlestTokyo.glb".into(),
            decoder_dir: Some("assets/draco".into()),
            position: [-0.2, 1.3, -0.3],
            scale: 0.01,
            rotation_y: 1.99,
            cast_shadow: true,
            autoplay_clip: Some(0),
        }
    }
}
