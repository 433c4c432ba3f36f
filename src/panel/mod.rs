//! Numeric parameter panel bound to light properties.
//!
//! The panel is a fixed table of [`Binding`]s. Each binding names a folder,
//! a field, the light node it edits and which property of that node. Writes
//! go straight to the scene with no validation or clamping.

use serde::Serialize;

use crate::scene::{Light, NodeId, SceneGraph};

/// Folder holding the point light position fields.
pub const COORDINATES_FOLDER: &str = "Coordinates";
/// Folder holding the point light intensity fields.
pub const LIGHT_SETTINGS_FOLDER: &str = "Light settings";

/// Property of a light node a binding reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LightField {
    /// Local X position.
    X,
    /// Local Y position.
    Y,
    /// Local Z position.
    Z,
    /// Light intensity.
    Intensity,
    /// Point light luminous power (intensity * 4π).
    Power,
}

/// One panel field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binding {
    /// Folder title.
    pub folder: &'static str,
    /// Field name, unique within the panel.
    pub name: &'static str,
    /// Light node edited by this field.
    pub light: NodeId,
    /// Edited property.
    pub field: LightField,
    /// Suggested input step for frontends.
    pub step: f32,
}

/// Serializable view of one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSnapshot {
    /// Field name.
    pub name: &'static str,
    /// Bound property.
    pub field: LightField,
    /// Current value, `None` if the light is gone.
    pub value: Option<f32>,
    /// Suggested input step.
    pub step: f32,
}

/// Serializable view of one folder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FolderSnapshot {
    /// Folder title.
    pub title: &'static str,
    /// Fields in declaration order.
    pub fields: Vec<FieldSnapshot>,
}

/// Whole panel state for frontends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelSnapshot {
    /// Folders in declaration order.
    pub folders: Vec<FolderSnapshot>,
}

/// Binding table plus visibility.
#[derive(Debug, Clone)]
pub struct ParameterPanel {
    bindings: Vec<Binding>,
    visible: bool,
}

impl ParameterPanel {
    /// Empty panel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
            visible: true,
        }
    }

    /// The viewer's table: position and intensity of one point light.
    #[must_use]
    pub fn for_point_light(light: NodeId) -> Self {
        let mut panel = Self::new();
        panel.bind(COORDINATES_FOLDER, "x", light, LightField::X, 0.1);
        panel.bind(COORDINATES_FOLDER, "y", light, LightField::Y, 0.1);
        panel.bind(COORDINATES_FOLDER, "z", light, LightField::Z, 0.1);
        panel.bind(
            LIGHT_SETTINGS_FOLDER,
            "intensity",
            light,
            LightField::Intensity,
            0.1,
        );
        panel.bind(LIGHT_SETTINGS_FOLDER, "power", light, LightField::Power, 1.0);
        panel
    }

    /// Append a binding. A field name already in use is replaced.
    pub fn bind(
        &mut self,
        folder: &'static str,
        name: &'static str,
        light: NodeId,
        field: LightField,
        step: f32,
    ) {
        let binding = Binding {
            folder,
            name,
            light,
            field,
            step,
        };
        match self.bindings.iter_mut().find(|b| b.name == name) {
            Some(existing) => *existing = binding,
            None => self.bindings.push(binding),
        }
    }

    /// All bindings in declaration order.
    #[must_use]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Whether frontends should show the panel.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Flip visibility; returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.name == name)
    }

    /// Live value of field `name`.
    #[must_use]
    pub fn get(&self, scene: &SceneGraph, name: &str) -> Option<f32> {
        read(scene, self.binding(name)?)
    }

    /// Write `value` to field `name`.
    ///
    /// Returns `false` if the field is unknown, its light is gone, or the
    /// light kind has no such property.
    pub fn set(&self, scene: &mut SceneGraph, name: &str, value: f32) -> bool {
        let Some(binding) = self.binding(name) else {
            log::debug!("unknown panel field {name}");
            return false;
        };
        let Some(node) = scene.get_mut(binding.light) else {
            return false;
        };
        match binding.field {
            LightField::X => node.transform.position.x = value,
            LightField::Y => node.transform.position.y = value,
            LightField::Z => node.transform.position.z = value,
            LightField::Intensity => match node.light_mut() {
                Some(light) => light.set_intensity(value),
                None => return false,
            },
            LightField::Power => match node.light_mut() {
                Some(Light::Point(point)) => point.set_power(value),
                _ => return false,
            },
        }
        true
    }

    /// Current state grouped by folder.
    #[must_use]
    pub fn snapshot(&self, scene: &SceneGraph) -> PanelSnapshot {
        let mut folders: Vec<FolderSnapshot> = Vec::new();
        for binding in &self.bindings {
            let field = FieldSnapshot {
                name: binding.name,
                field: binding.field,
                value: read(scene, binding),
                step: binding.step,
            };
            match folders.iter_mut().find(|f| f.title == binding.folder) {
                Some(folder) => folder.fields.push(field),
                None => folders.push(FolderSnapshot {
                    title: binding.folder,
                    fields: vec![field],
                }),
            }
        }
        PanelSnapshot { folders }
    }
}

impl Default for ParameterPanel {
    fn default() -> Self {
        Self::new()
    }
}

fn read(scene: &SceneGraph, binding: &Binding) -> Option<f32> {
    let node = scene.get(binding.light)?;
    match binding.field {
        LightField::X => Some(node.transform.position.x),
        LightField::Y => Some(node.transform.position.y),
        LightField::Z => Some(node.transform.position.z),
        LightField::Intensity => node.light().map(Light::intensity),
        LightField::Power => match node.light()? {
            Light::Point(point) => Some(point.power()),
            Light::Spot(_) => None,
        },
    }
}
