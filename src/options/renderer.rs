use serde::{Deserialize, Serialize};

/// Tone mapping curve applied before the swapchain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToneMapping {
    /// Clamp only.
    None,
    /// ACES filmic approximation.
    #[default]
    AcesFilmic,
}

impl ToneMapping {
    /// Shader selector value.
    #[must_use]
    pub fn as_u32(self) -> u32 {
        match self {
            Self::None => 0,
            Self::AcesFilmic => 1,
        }
    }
}

/// Frame-level rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RendererOptions {
    /// Clear color as `0xRRGGBB` (sRGB).
    pub background: u32,
    /// Render the spot light's shadow map.
    pub shadows: bool,
    /// Shadow map edge length in texels.
    pub shadow_map_size: u32,
    /// Tone mapping curve.
    pub tone_mapping: ToneMapping,
    /// Exposure multiplier applied before tone mapping.
    pub exposure: f32,
    /// Flat ambient term so unlit sides are not pitch black.
    pub ambient: f32,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            background: 0x00_0000,
            shadows: true,
            shadow_map_size: 1024,
            tone_mapping: ToneMapping::AcesFilmic,
            exposure: 1.0,
            ambient: 0.02,
        }
    }
}
