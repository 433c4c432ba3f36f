use serde::{Deserialize, Serialize};

/// Orbit controller limits and feel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlsOptions {
    /// Smooth the orbit with exponential damping.
    pub enable_damping: bool,
    /// Fraction of the pending rotation applied per frame.
    pub damping_factor: f32,
    /// Closest allowed eye-to-target distance.
    pub min_distance: f32,
    /// Farthest allowed eye-to-target distance.
    pub max_distance: f32,
    /// Smallest polar angle in degrees (0 = looking straight down).
    pub min_polar_deg: f32,
    /// Largest polar angle in degrees.
    pub max_polar_deg: f32,
    /// Rotation sensitivity multiplier.
    pub rotate_speed: f32,
    /// Zoom sensitivity multiplier.
    pub zoom_speed: f32,
}

impl Default for ControlsOptions {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.12,
            min_distance: 6.3,
            max_distance: 6.5,
            min_polar_deg: 0.0,
            max_polar_deg: 70.0,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
        }
    }
}

impl ControlsOptions {
    /// Fix non-finite values, inverted bounds and out-of-range damping,
    /// logging each fix.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        for (name, value, default) in [
            ("damping_factor", &mut self.damping_factor, defaults.damping_factor),
            ("min_distance", &mut self.min_distance, defaults.min_distance),
            ("max_distance", &mut self.max_distance, defaults.max_distance),
            ("min_polar_deg", &mut self.min_polar_deg, defaults.min_polar_deg),
            ("max_polar_deg", &mut self.max_polar_deg, defaults.max_polar_deg),
            ("rotate_speed", &mut self.rotate_speed, defaults.rotate_speed),
            ("zoom_speed", &mut self.zoom_speed, defaults.zoom_speed),
        ] {
            if !value.is_finite() {
                log::warn!("controls: {name} {value} is not finite, using {default}");
                *value = default;
            }
        }
        if self.min_distance > self.max_distance {
            log::warn!(
                "controls: min_distance {} > max_distance {}, swapping",
                self.min_distance,
                self.max_distance
            );
            std::mem::swap(&mut self.min_distance, &mut self.max_distance);
        }
        if self.min_polar_deg > self.max_polar_deg {
            log::warn!(
                "controls: min_polar_deg {} > max_polar_deg {}, swapping",
                self.min_polar_deg,
                self.max_polar_deg
            );
            std::mem::swap(&mut self.min_polar_deg, &mut self.max_polar_deg);
        }
        self.min_polar_deg = self.min_polar_deg.clamp(0.0, 180.0);
        self.max_polar_deg = self.max_polar_deg.clamp(0.0, 180.0);
        self.min_distance = self.min_distance.max(0.0);
        if !(0.0..=1.0).contains(&self.damping_factor) {
            log::warn!(
                "controls: damping_factor {} outside 0..=1, clamping",
                self.damping_factor
            );
            self.damping_factor = self.damping_factor.clamp(0.0, 1.0);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_values_fall_back_to_defaults() {
        let opts = ControlsOptions {
            damping_factor: f32::NAN,
            min_distance: f32::NEG_INFINITY,
            max_distance: f32::NAN,
            max_polar_deg: f32::INFINITY,
            zoom_speed: f32::NAN,
            ..ControlsOptions::default()
        }
        .normalized();
        assert_eq!(opts, ControlsOptions::default());
    }

    #[test]
    fn inverted_bounds_are_swapped() {
        let opts = ControlsOptions {
            min_distance: 9.0,
            max_distance: 3.0,
            min_polar_deg: 120.0,
            max_polar_deg: 30.0,
            ..ControlsOptions::default()
        }
        .normalized();
        assert_eq!((opts.min_distance, opts.max_distance), (3.0, 9.0));
        assert_eq!((opts.min_polar_deg, opts.max_polar_deg), (30.0, 120.0));
    }
}
