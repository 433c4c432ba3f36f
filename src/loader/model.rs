use crate::animation::{AnimationClip, AnimationMixer};
use crate::scene::{
    Material, MeshData, MeshInstance, Node, NodeId, Payload, SceneGraph,
    Transform,
};

/// One drawable part of a model node.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPrimitive {
    /// Index into [`LoadedModel::meshes`].
    pub mesh: usize,
    /// Surface appearance.
    pub material: Material,
}

/// A node of the loaded hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelNode {
    /// Name from the asset, or a generated one.
    pub name: String,
    /// Index of the parent in [`LoadedModel::nodes`]; `None` for roots.
    pub parent: Option<usize>,
    /// Local transform.
    pub transform: Transform,
    /// Geometry drawn by this node.
    pub primitives: Vec<ModelPrimitive>,
}

/// A decoded model, not yet part of any scene.
///
/// Nodes are stored parents-first. Clip tracks target indices into
/// `nodes`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedModel {
    /// Flattened node hierarchy.
    pub nodes: Vec<ModelNode>,
    /// Geometry shared by node primitives.
    pub meshes: Vec<MeshData>,
    /// Animation clips in asset order.
    pub clips: Vec<AnimationClip>,
}

/// Handles produced by grafting a model into a scene.
pub struct Instantiated {
    /// The model's root node.
    pub root: NodeId,
    /// Scene node for each model node, by model index.
    pub nodes: Vec<NodeId>,
    /// Mixer bound to those nodes.
    pub mixer: AnimationMixer,
}

impl LoadedModel {
    /// Total triangle count across all meshes.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.indices.len() / 3).sum()
    }

    /// Graft the model under a new node named `root_name` below `parent`.
    ///
    /// Nodes with one primitive carry it directly; nodes with several get
    /// one child per primitive. Returns `None` if `parent` is not in the
    /// scene.
    pub fn instantiate(
        self,
        scene: &mut SceneGraph,
        parent: NodeId,
        root_name: &str,
    ) -> Option<Instantiated> {
        let root = scene.add(parent, Node::new(root_name))?;
        let mesh_ids: Vec<_> =
            self.meshes.into_iter().map(|m| scene.add_mesh(m)).collect();

        let mut ids: Vec<NodeId> = Vec::with_capacity(self.nodes.len());
        for model_node in self.nodes {
            let parent_id = model_node
                .parent
                .and_then(|p| ids.get(p).copied())
                .unwrap_or(root);
            let mut node =
                Node::new(model_node.name.clone()).with_transform(model_node.transform);

            let mut parts = model_node.primitives.iter().filter_map(|p| {
                let mesh = *mesh_ids.get(p.mesh)?;
                Some(MeshInstance::new(mesh, p.material))
            });
            let split = model_node.primitives.len() > 1;
            if !split {
                if let Some(instance) = parts.next() {
                    node = node.with_payload(Payload::Mesh(instance));
                }
            }
            let id = scene.add(parent_id, node)?;
            if split {
                for (i, instance) in parts.enumerate() {
                    let child = Node::new(format!("{}#{i}", model_node.name))
                        .with_payload(Payload::Mesh(instance));
                    scene.add(id, child)?;
                }
            }
            ids.push(id);
        }

        let mixer = AnimationMixer::new(self.clips, ids.clone());
        Some(Instantiated {
            root,
            nodes: ids,
            mixer,
        })
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn two_level_model() -> LoadedModel {
        LoadedModel {
            nodes: vec![
                ModelNode {
                    name: "base".into(),
                    parent: None,
                    transform: Transform::from_position(Vec3::Y),
                    primitives: Vec::new(),
                },
                ModelNode {
                    name: "roof".into(),
                    parent: Some(0),
                    transform: Transform::IDENTITY,
                    primitives: vec![
                        ModelPrimitive {
                            mesh: 0,
                            material: Material::default(),
                        },
                        ModelPrimitive {
                            mesh: 0,
                            material: Material::default(),
                        },
                    ],
                },
                ModelNode {
                    name: "door".into(),
                    parent: Some(0),
                    transform: Transform::IDENTITY,
                    primitives: vec![ModelPrimitive {
                        mesh: 0,
                        material: Material::default(),
                    }],
                },
            ],
            meshes: vec![MeshData::plane(1.0, 1.0)],
            clips: Vec::new(),
        }
    }

    #[test]
    fn instantiate_preserves_hierarchy() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let inst = two_level_model()
            .instantiate(&mut scene, root, "model")
            .unwrap();

        assert_eq!(inst.nodes.len(), 3);
        assert_eq!(scene.get(inst.nodes[0]).unwrap().parent(), Some(inst.root));
        assert_eq!(scene.get(inst.nodes[1]).unwrap().parent(), Some(inst.nodes[0]));
        // root + model root + 3 nodes + 2 primitive children
        assert_eq!(scene.len(), 7);
        assert_eq!(scene.meshes().len(), 1);
    }

    #[test]
    fn single_primitive_sits_on_the_node() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let inst = two_level_model()
            .instantiate(&mut scene, root, "model")
            .unwrap();
        assert!(scene.get(inst.nodes[2]).unwrap().mesh().is_some());
        assert!(scene.get(inst.nodes[1]).unwrap().mesh().is_none());
        assert_eq!(scene.children(inst.nodes[1]).len(), 2);
        assert_eq!(scene.drawables().len(), 3);
    }

    #[test]
    fn triangle_count_sums_meshes() {
        assert_eq!(two_level_model().triangle_count(), 2);
    }
}
