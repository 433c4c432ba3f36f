use serde::{Deserialize, Serialize};

/// Key spot light above the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpotLightOptions {
    /// Color as `0xRRGGBB` (sRGB).
    pub color: u32,
    /// Luminous intensity.
    pub intensity: f32,
    /// World position.
    pub position: [f32; 3],
    /// Point the cone aims at.
    pub target: [f32; 3],
    /// Cone half-angle in radians.
    pub angle: f32,
    /// Soft edge fraction.
    pub penumbra: f32,
    /// Falloff exponent.
    pub decay: f32,
    /// Cutoff range; 0 = unlimited.
    pub distance: f32,
    /// Render a shadow map from this light.
    pub cast_shadow: bool,
    /// Shadow camera near plane.
    pub shadow_near: f32,
    /// Shadow camera far plane.
    pub shadow_far: f32,
    /// Shadow frustum coverage of the cone.
    pub shadow_focus: f32,
    /// Depth bias for the shadow comparison.
    pub shadow_bias: f32,
}

impl Default for SpotLightOptions {
    fn default() -> Self {
        Self {
            color: 0xff_ffff,
            intensity: 180.0,
            position: [0.0, 8.0, 0.0],
            target: [0.0, 0.0, 0.0],
            angle: std::f32::consts::FRAC_PI_6,
            penumbra: 0.5,
            decay: 1.99,
            distance: 90.0,
            cast_shadow: true,
            shadow_near: 1.0,
            shadow_far: 10.0,
            shadow_focus: 1.0,
            shadow_bias: 0.0005,
        }
    }
}

/// Movable point light driven by the parameter panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PointLightOptions {
    /// Color as `0xRRGGBB` (sRGB).
    pub color: u32,
    /// Luminous intensity.
    pub intensity: f32,
    /// Cutoff range; 0 = unlimited.
    pub distance: f32,
    /// Falloff exponent.
    pub decay: f32,
    /// World position.
    pub position: [f32; 3],
    /// Draw a small marker at the light.
    pub helper: bool,
    /// Marker radius.
    pub helper_size: f32,
}

impl Default for PointLightOptions {
    fn default() -> Self {
        Self {
            color: 0xff_ffff,
            intensity: 1.0,
            distance: 10.0,
            decay: 2.0,
            position: [0.0, 0.0, 0.0],
            helper: true,
            helper_size: 0.1,
        }
    }
}

/// All scene lights.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct LightsOptions {
    /// Shadow-casting key light.
    pub spot: SpotLightOptions,
    /// Panel-controlled point light.
    pub point: PointLightOptions,
}

/// Floor under the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GroundOptions {
    /// Add the ground plane.
    pub enabled: bool,
    /// Edge length of the square plane.
    pub size: f32,
    /// Color as `0xRRGGBB` (sRGB).
    pub color: u32,
    /// Height of the plane.
    pub height: f32,
    /// Darken the plane where the spot light is blocked.
    pub receive_shadow: bool,
}

impl Default for GroundOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            size: 100.0,
            color: 0xcb_cbcb,
            height: -0.6,
            receive_shadow: true,
        }
    }
}
