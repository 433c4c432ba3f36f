//! Scene graph: an arena-backed tree of spatial nodes.
//!
//! Nodes are owned by the [`SceneGraph`] and addressed by generational
//! [`NodeId`] handles. Geometry lives in a separate mesh store so a mesh
//! can be instanced by several nodes; the renderer uploads new meshes as
//! they appear.

mod light;
mod mesh;
mod node;

use glam::Mat4;
pub use light::{Light, PointLight, ShadowCamera, SpotLight};
pub use mesh::{Material, MeshData, MeshId, MeshInstance};
pub use node::{Node, NodeId, Payload, Transform};

/// A mesh instance resolved to world space, ready to draw.
#[derive(Debug, Clone, Copy)]
pub struct Drawable {
    /// Node carrying the instance.
    pub node: NodeId,
    /// Accumulated local-to-world matrix.
    pub world: Mat4,
    /// The instance itself.
    pub instance: MeshInstance,
}

/// A light resolved to world space.
#[derive(Debug, Clone, Copy)]
pub struct PlacedLight {
    /// Node carrying the light.
    pub node: NodeId,
    /// Accumulated local-to-world matrix.
    pub world: Mat4,
    /// Light parameters.
    pub light: Light,
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// The authoritative scene tree.
pub struct SceneGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    meshes: Vec<MeshData>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// A scene holding only its root node.
    #[must_use]
    pub fn new() -> Self {
        let root = NodeId {
            index: 0,
            generation: 0,
        };
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(Node::new("scene")),
            }],
            free: Vec::new(),
            root,
            meshes: Vec::new(),
        }
    }

    /// The root node. It cannot be removed.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    /// Whether only the root remains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    // -- Node access --

    /// Whether the handle refers to a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Borrow a node.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    /// Mutably borrow a node.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    /// Children of a node (empty if the node is gone).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], Node::children)
    }

    /// First node named `name` in the subtree rooted at `from`
    /// (depth-first, pre-order).
    pub fn find_by_name(&self, from: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(from)
            .into_iter()
            .find(|&id| self.get(id).is_some_and(|n| n.name == name))
    }

    // -- Tree mutation --

    /// Attach `node` as the last child of `parent`.
    ///
    /// Returns `None` when `parent` is not a live node. Any parent/children
    /// links already present on `node` are discarded.
    pub fn add(&mut self, parent: NodeId, mut node: Node) -> Option<NodeId> {
        if !self.contains(parent) {
            return None;
        }
        node.parent = Some(parent);
        node.children.clear();

        let id = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index,
                generation: 0,
            }
        };

        if let Some(p) = self.get_mut(parent) {
            p.children.push(id);
        }
        Some(id)
    }

    /// Detach and drop `id` together with its whole subtree.
    ///
    /// Returns the number of nodes removed (0 for a stale handle or the
    /// root).
    pub fn remove(&mut self, id: NodeId) -> usize {
        if id == self.root || !self.contains(id) {
            return 0;
        }
        let parent = self.get(id).and_then(Node::parent);
        if let Some(p) = parent.and_then(|p| self.get_mut(p)) {
            p.children.retain(|&c| c != id);
        }

        let doomed = self.descendants(id);
        for dead in &doomed {
            let slot = &mut self.slots[dead.index as usize];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(dead.index);
        }
        doomed.len()
    }

    // -- Mesh store --

    /// Store geometry and return its handle.
    pub fn add_mesh(&mut self, mesh: MeshData) -> MeshId {
        let id = MeshId(self.meshes.len() as u32);
        self.meshes.push(mesh);
        id
    }

    /// Look up stored geometry.
    pub fn mesh(&self, id: MeshId) -> Option<&MeshData> {
        self.meshes.get(id.index())
    }

    /// All stored geometry in [`MeshId`] order.
    pub fn meshes(&self) -> &[MeshData] {
        &self.meshes
    }

    // -- Traversal --

    /// `from` and every node below it, depth-first pre-order.
    pub fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(from) {
            return out;
        }
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            out.push(id);
            // Reverse so the first child is visited first.
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Apply `f` to every node in the subtree rooted at `from`.
    pub fn for_each_mut(
        &mut self,
        from: NodeId,
        mut f: impl FnMut(NodeId, &mut Node),
    ) {
        for id in self.descendants(from) {
            if let Some(node) = self.get_mut(id) {
                f(id, node);
            }
        }
    }

    /// Local-to-world matrix of a node (identity for a stale handle).
    #[must_use]
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.get(current) else {
                break;
            };
            matrix = node.transform.matrix() * matrix;
            cursor = node.parent;
        }
        matrix
    }

    /// Walk visible nodes top-down, accumulating world matrices.
    fn walk_visible(&self, mut visit: impl FnMut(NodeId, Mat4, &Node)) {
        let mut stack = vec![(self.root, Mat4::IDENTITY)];
        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            let world = parent_world * node.transform.matrix();
            visit(id, world, node);
            stack.extend(node.children.iter().rev().map(|&c| (c, world)));
        }
    }

    /// Every visible mesh instance with its world matrix.
    pub fn drawables(&self) -> Vec<Drawable> {
        let mut out = Vec::new();
        self.walk_visible(|id, world, node| {
            if let Some(instance) = node.mesh() {
                out.push(Drawable {
                    node: id,
                    world,
                    instance: *instance,
                });
            }
        });
        out
    }

    /// Every visible light with its world matrix.
    pub fn lights(&self) -> Vec<PlacedLight> {
        let mut out = Vec::new();
        self.walk_visible(|id, world, node| {
            if let Some(light) = node.light() {
                out.push(PlacedLight {
                    node: id,
                    world,
                    light: *light,
                });
            }
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn offset(x: f32) -> Node {
        Node::new("n").with_transform(Transform::from_position(Vec3::X * x))
    }

    #[test]
    fn add_and_remove_subtree() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let a = scene.add(root, Node::new("a")).unwrap_or(root);
        let b = scene.add(a, Node::new("b")).unwrap_or(root);
        let _c = scene.add(b, Node::new("c"));
        assert_eq!(scene.len(), 4);

        assert_eq!(scene.remove(a), 3);
        assert_eq!(scene.len(), 1);
        assert!(scene.is_empty());
        assert!(!scene.contains(b));
        assert!(scene.children(root).is_empty());
    }

    #[test]
    fn stale_handle_does_not_alias_reused_slot() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let old = scene.add(root, Node::new("old")).unwrap_or(root);
        let _ = scene.remove(old);
        let new = scene.add(root, Node::new("new")).unwrap_or(root);
        assert_eq!(old.index, new.index);
        assert!(scene.get(old).is_none());
        assert_eq!(scene.get(new).map(|n| n.name.as_str()), Some("new"));
    }

    #[test]
    fn root_cannot_be_removed() {
        let mut scene = SceneGraph::new();
        assert_eq!(scene.remove(scene.root()), 0);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn world_matrix_accumulates_parents() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let a = scene.add(root, offset(1.0)).unwrap_or(root);
        let b = scene.add(a, offset(2.0)).unwrap_or(root);
        let p = scene.world_matrix(b).transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn drawables_skip_hidden_subtrees() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let mesh = scene.add_mesh(MeshData::plane(1.0, 1.0));
        let payload =
            Payload::Mesh(MeshInstance::new(mesh, Material::default()));
        let group = scene.add(root, offset(1.0)).unwrap_or(root);
        let _ = scene.add(group, Node::new("m").with_payload(payload.clone()));
        let _ = scene.add(root, Node::new("m2").with_payload(payload));
        assert_eq!(scene.drawables().len(), 2);

        if let Some(g) = scene.get_mut(group) {
            g.visible = false;
        }
        assert_eq!(scene.drawables().len(), 1);
    }

    #[test]
    fn descendants_are_preorder() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let a = scene.add(root, Node::new("a")).unwrap_or(root);
        let _ = scene.add(a, Node::new("a1"));
        let _ = scene.add(root, Node::new("b"));
        let names: Vec<String> = scene
            .descendants(root)
            .into_iter()
            .filter_map(|id| scene.get(id).map(|n| n.name.clone()))
            .collect();
        assert_eq!(names, ["scene", "a", "a1", "b"]);
        assert!(scene.find_by_name(root, "a1").is_some());
    }
}
