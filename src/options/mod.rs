//! Viewer configuration with TOML file support.
//!
//! Everything the composition root needs to build the scene (renderer
//! settings, camera, orbit limits, model location and placement, lights,
//! ground) lives here. Options serialize to/from TOML; every section uses
//! `#[serde(default)]` so a file only needs the keys it overrides.

mod camera;
mod controls;
mod lights;
mod model;
mod renderer;

use std::path::Path;

pub use camera::CameraOptions;
pub use controls::ControlsOptions;
pub use lights::{
    GroundOptions, LightsOptions, PointLightOptions, SpotLightOptions,
};
pub use model::ModelOptions;
pub use renderer::{RendererOptions, ToneMapping};
use serde::{Deserialize, Serialize};

use crate::error::DioramaError;

/// Top-level options container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Options {
    /// Frame-level rendering settings.
    pub renderer: RendererOptions,
    /// Camera projection and starting placement.
    pub camera: CameraOptions,
    /// Orbit controller limits.
    pub controls: ControlsOptions,
    /// Model location and placement.
    pub model: ModelOptions,
    /// Scene lights.
    pub lights: LightsOptions,
    /// Ground plane.
    pub ground: GroundOptions,
}

impl Options {
    /// Load options from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, DioramaError> {
        let content = std::fs::read_to_string(path).map_err(DioramaError::Io)?;
        Self::from_toml(&content)
    }

    /// Parse options from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, DioramaError> {
        toml::from_str(content)
            .map_err(|e| DioramaError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<(), DioramaError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DioramaError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(DioramaError::Io)?;
        }
        std::fs::write(path, content).map_err(DioramaError::Io)
    }

    /// Copy with inconsistent values repaired (inverted orbit bounds,
    /// non-positive model scale, zero shadow map size).
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.controls = self.controls.normalized();
        if !self.model.scale.is_finite() || self.model.scale <= 0.0 {
            log::warn!(
                "model: scale {} is not a positive number, using 1.0",
                self.model.scale
            );
            self.model.scale = 1.0;
        }
        if self.renderer.shadow_map_size == 0 {
            self.renderer.shadow_map_size =
                RendererOptions::default().shadow_map_size;
        }
        self
    }

    /// Full path of the model file.
    #[must_use]
    pub fn model_path(&self) -> std::path::PathBuf {
        Path::new(&self.model.dir).join(&self.model.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = Options::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed: Options = toml::from_str(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r"
[lights.point]
intensity = 4.0
";
        let opts = Options::from_toml(toml_str).unwrap();
        assert_eq!(opts.lights.point.intensity, 4.0);
        // Everything else should be default
        assert_eq!(opts.lights.spot.intensity, 180.0);
        assert_eq!(opts.controls.damping_factor, 0.12);
        assert_eq!(opts.renderer.tone_mapping, ToneMapping::AcesFilmic);
    }

    #[test]
    fn bad_toml_is_an_options_error() {
        let err = Options::from_toml("[camera]\nfovy = \"wide\"").unwrap_err();
        assert!(matches!(err, DioramaError::OptionsParse(_)));
    }

    #[test]
    fn normalization_swaps_inverted_distances() {
        let mut opts = Options::default();
        opts.controls.min_distance = 6.5;
        opts.controls.max_distance = 6.3;
        let fixed = opts.normalized();
        assert_eq!(fixed.controls.min_distance, 6.3);
        assert_eq!(fixed.controls.max_distance, 6.5);
    }

    #[test]
    fn normalization_repairs_scale_and_damping() {
        let mut opts = Options::default();
        opts.model.scale = 0.0;
        opts.controls.damping_factor = 3.0;
        let fixed = opts.normalized();
        assert_eq!(fixed.model.scale, 1.0);
        assert_eq!(fixed.controls.damping_factor, 1.0);
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir()
            .join(format!("diorama-options-{}", std::process::id()));
        let path = dir.join("view.toml");
        let mut opts = Options::default();
        opts.renderer.exposure = 1.5;
        opts.save(&path).unwrap();
        let loaded = Options::load(&path).unwrap();
        assert_eq!(loaded, opts);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn model_path_joins_dir_and_file() {
        let opts = Options::default();
        assert_eq!(
            opts.model_path(),
            Path::new("assets/models").join("LittlestTokyo.glb")
        );
    }
}
