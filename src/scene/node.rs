use glam::{Mat4, Quat, Vec3};

use super::light::Light;
use super::mesh::MeshInstance;

/// Handle to a node in a [`SceneGraph`](super::SceneGraph).
///
/// Carries the slot generation so a handle to a removed node never aliases
/// a node that later reuses the same slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(super) index: u32,
    pub(super) generation: u32,
}

/// Local translation / rotation / scale of a node relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Translation in parent space.
    pub position: Vec3,
    /// Orientation in parent space.
    pub rotation: Quat,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// No translation, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Transform with only a translation.
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Local-to-parent matrix (scale, then rotate, then translate).
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale,
            self.rotation,
            self.position,
        )
    }

    /// Replace the rotation with an Euler XYZ rotation in radians.
    pub fn set_euler(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Quat::from_euler(glam::EulerRot::XYZ, x, y, z);
    }
}

/// What a node draws or emits, if anything.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A drawable mesh instance.
    Mesh(MeshInstance),
    /// A light source positioned by the node transform.
    Light(Light),
}

/// A spatial node in the scene tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Human-readable name (glTF node name, or a fixed label).
    pub name: String,
    /// Local transform.
    pub transform: Transform,
    /// Optional mesh or light.
    pub payload: Option<Payload>,
    /// Hidden nodes and their subtrees are skipped by the renderer.
    pub visible: bool,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
}

impl Node {
    /// An empty group node.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            payload: None,
            visible: true,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Builder-style transform override.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Builder-style payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Parent node, `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The mesh instance carried by this node.
    pub fn mesh(&self) -> Option<&MeshInstance> {
        match &self.payload {
            Some(Payload::Mesh(m)) => Some(m),
            _ => None,
        }
    }

    /// Mutable mesh instance.
    pub fn mesh_mut(&mut self) -> Option<&mut MeshInstance> {
        match &mut self.payload {
            Some(Payload::Mesh(m)) => Some(m),
            _ => None,
        }
    }

    /// The light carried by this node.
    pub fn light(&self) -> Option<&Light> {
        match &self.payload {
            Some(Payload::Light(l)) => Some(l),
            _ => None,
        }
    }

    /// Mutable light.
    pub fn light_mut(&mut self) -> Option<&mut Light> {
        match &mut self.payload {
            Some(Payload::Light(l)) => Some(l),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_applies_scale_before_translation() {
        let t = Transform {
            position: Vec3::new(1.0, 0.0, 0.0),
            rotation: Quat::IDENTITY,
            scale: Vec3::splat(2.0),
        };
        let p = t.matrix().transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!((p - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn euler_y_matches_axis_rotation() {
        let mut t = Transform::IDENTITY;
        t.set_euler(0.0, 1.99, 0.0);
        assert!(t.rotation.abs_diff_eq(Quat::from_rotation_y(1.99), 1e-6));
    }
}
