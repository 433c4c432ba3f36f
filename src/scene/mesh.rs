use glam::Vec3;

/// Index of a mesh in the scene's mesh store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub(super) u32);

impl MeshId {
    /// Position in [`SceneGraph::meshes`](super::SceneGraph::meshes).
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Surface appearance shared by every triangle of a mesh instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Linear RGBA base color.
    pub base_color: [f32; 4],
    /// Perceptual roughness, 0 = mirror, 1 = matte.
    pub roughness: f32,
    /// Metalness, 0 = dielectric, 1 = metal.
    pub metalness: f32,
    /// Linear RGB emissive color.
    pub emissive: [f32; 3],
    /// Skip lighting entirely (helpers).
    pub unlit: bool,
    /// Write to the depth buffer.
    pub depth_write: bool,
    /// Render both faces.
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            roughness: 1.0,
            metalness: 0.0,
            emissive: [0.0; 3],
            unlit: false,
            depth_write: true,
            double_sided: false,
        }
    }
}

/// Triangle geometry on the CPU.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertex positions.
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals (same length as `positions`).
    pub normals: Vec<[f32; 3]>,
    /// Optional linear RGBA vertex colors.
    pub colors: Option<Vec<[f32; 4]>>,
    /// Triangle list indices.
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Whether there is nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    /// Axis-aligned bounds, `None` for an empty mesh.
    #[must_use]
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.positions.iter().map(|p| Vec3::from_array(*p));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    /// Fill `normals` with area-weighted vertex normals.
    pub fn compute_normals(&mut self) {
        let mut acc = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if a >= acc.len() || b >= acc.len() || c >= acc.len() {
                continue;
            }
            let pa = Vec3::from_array(self.positions[a]);
            let pb = Vec3::from_array(self.positions[b]);
            let pc = Vec3::from_array(self.positions[c]);
            let n = (pb - pa).cross(pc - pa);
            acc[a] += n;
            acc[b] += n;
            acc[c] += n;
        }
        self.normals = acc
            .into_iter()
            .map(|n| n.normalize_or(Vec3::Y).to_array())
            .collect();
    }

    /// Plane in the XY plane facing +Z, centered on the origin.
    #[must_use]
    pub fn plane(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        Self {
            positions: vec![
                [-hw, -hh, 0.0],
                [hw, -hh, 0.0],
                [hw, hh, 0.0],
                [-hw, hh, 0.0],
            ],
            normals: vec![[0.0, 0.0, 1.0]; 4],
            colors: None,
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    /// Eight-faced marker used for light helpers.
    #[must_use]
    pub fn octahedron(radius: f32) -> Self {
        let r = radius;
        let verts = [
            [r, 0.0, 0.0],
            [-r, 0.0, 0.0],
            [0.0, r, 0.0],
            [0.0, -r, 0.0],
            [0.0, 0.0, r],
            [0.0, 0.0, -r],
        ];
        let faces: [[u32; 3]; 8] = [
            [0, 2, 4],
            [2, 1, 4],
            [1, 3, 4],
            [3, 0, 4],
            [2, 0, 5],
            [1, 2, 5],
            [3, 1, 5],
            [0, 3, 5],
        ];
        let mut mesh = Self {
            positions: verts.to_vec(),
            normals: Vec::new(),
            colors: None,
            indices: faces.iter().flatten().copied().collect(),
        };
        mesh.compute_normals();
        mesh
    }
}

/// A mesh placed in the scene by a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshInstance {
    /// Geometry in the mesh store.
    pub mesh: MeshId,
    /// Appearance.
    pub material: Material,
    /// Rendered into the spot light's shadow map.
    pub cast_shadow: bool,
    /// Darkened by the spot light's shadow map.
    pub receive_shadow: bool,
}

impl MeshInstance {
    /// Instance with default shadow flags (neither casts nor receives).
    #[must_use]
    pub fn new(mesh: MeshId, material: Material) -> Self {
        Self {
            mesh,
            material,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_faces_positive_z() {
        let plane = MeshData::plane(100.0, 100.0);
        assert_eq!(plane.vertex_count(), 4);
        assert_eq!(plane.indices.len(), 6);
        let (lo, hi) = plane.bounds().unwrap_or_default();
        assert_eq!(lo, Vec3::new(-50.0, -50.0, 0.0));
        assert_eq!(hi, Vec3::new(50.0, 50.0, 0.0));
    }

    #[test]
    fn octahedron_normals_point_outward() {
        let mesh = MeshData::octahedron(1.0);
        assert_eq!(mesh.normals.len(), mesh.positions.len());
        for (p, n) in mesh.positions.iter().zip(&mesh.normals) {
            assert!(Vec3::from_array(*p).dot(Vec3::from_array(*n)) > 0.0);
        }
    }

    #[test]
    fn empty_mesh_has_no_bounds() {
        assert!(MeshData::default().bounds().is_none());
        assert!(MeshData::default().is_empty());
    }
}
