use std::f32::consts::PI;

use glam::Vec3;

/// Shadow camera parameters for a shadow-casting spot light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowCamera {
    /// Near plane of the light's projection.
    pub near: f32,
    /// Far plane of the light's projection.
    pub far: f32,
    /// Fraction of the cone angle covered by the shadow frustum (0, 1].
    pub focus: f32,
    /// Depth bias applied when comparing against the shadow map.
    pub bias: f32,
}

impl Default for ShadowCamera {
    fn default() -> Self {
        Self {
            near: 0.5,
            far: 500.0,
            focus: 1.0,
            bias: 0.0,
        }
    }
}

/// Cone light aimed at a world-space target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Luminous intensity (candela).
    pub intensity: f32,
    /// Cutoff range; 0 means unlimited.
    pub distance: f32,
    /// Physical falloff exponent.
    pub decay: f32,
    /// Cone half-angle in radians.
    pub angle: f32,
    /// Fraction of the cone that fades out at the edge, 0..=1.
    pub penumbra: f32,
    /// World-space point the cone points at.
    pub target: Vec3,
    /// Whether the light renders a shadow map.
    pub cast_shadow: bool,
    /// Shadow projection parameters.
    pub shadow: ShadowCamera,
}

/// Omnidirectional light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Luminous intensity (candela).
    pub intensity: f32,
    /// Cutoff range; 0 means unlimited.
    pub distance: f32,
    /// Physical falloff exponent.
    pub decay: f32,
    /// Point-light shadows are not rendered; the flag is kept for parity
    /// with the scene description.
    pub cast_shadow: bool,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            color: [1.0; 3],
            intensity: 1.0,
            distance: 0.0,
            decay: 2.0,
            cast_shadow: false,
        }
    }
}

impl PointLight {
    /// Luminous power in lumens: `intensity * 4π`.
    #[must_use]
    pub fn power(&self) -> f32 {
        self.intensity * 4.0 * PI
    }

    /// Set intensity from a luminous power in lumens.
    pub fn set_power(&mut self, power: f32) {
        self.intensity = power / (4.0 * PI);
    }
}

/// A light payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    /// Cone light, optionally shadowed.
    Spot(SpotLight),
    /// Omni light.
    Point(PointLight),
}

impl Light {
    /// Intensity regardless of light type.
    #[must_use]
    pub fn intensity(&self) -> f32 {
        match self {
            Self::Spot(s) => s.intensity,
            Self::Point(p) => p.intensity,
        }
    }

    /// Set intensity regardless of light type. No clamping.
    pub fn set_intensity(&mut self, value: f32) {
        match self {
            Self::Spot(s) => s.intensity = value,
            Self::Point(p) => p.intensity = value,
        }
    }
}
