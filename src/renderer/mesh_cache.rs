//! GPU copies of scene meshes.
//!
//! The scene's mesh store is append-only, so syncing uploads whatever was
//! added since the last frame and nothing else.

use wgpu::util::DeviceExt;

use crate::scene::{MeshData, MeshId};

/// Interleaved vertex: position, normal, linear RGBA color (40 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x4,
    ];
    const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
        wgpu::vertex_attr_array![0 => Float32x3];

    /// Full layout for the scene pass.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    /// Position-only view of the same buffer for the shadow pass.
    pub fn position_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::POSITION_ATTRIBUTES,
        }
    }
}

/// Interleave a mesh; missing normals or colors fall back to +Y and white.
pub fn interleave(mesh: &MeshData) -> Vec<Vertex> {
    mesh.positions
        .iter()
        .enumerate()
        .map(|(i, &position)| Vertex {
            position,
            normal: mesh.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            color: mesh
                .colors
                .as_ref()
                .and_then(|c| c.get(i).copied())
                .unwrap_or([1.0; 4]),
        })
        .collect()
}

/// One uploaded mesh.
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

/// Uploaded meshes in [`MeshId`] order.
#[derive(Default)]
pub struct MeshCache {
    meshes: Vec<Option<GpuMesh>>,
}

impl MeshCache {
    /// Upload meshes added to the store since the last call.
    pub fn sync(&mut self, device: &wgpu::Device, store: &[MeshData]) {
        for (index, mesh) in store.iter().enumerate().skip(self.meshes.len()) {
            self.meshes.push(upload(device, index, mesh));
        }
    }

    /// GPU mesh for `id`, `None` if empty or not yet uploaded.
    pub fn get(&self, id: MeshId) -> Option<&GpuMesh> {
        self.meshes.get(id.index())?.as_ref()
    }

    /// Number of meshes seen.
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// Whether nothing was uploaded yet.
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

fn upload(device: &wgpu::Device, index: usize, mesh: &MeshData) -> Option<GpuMesh> {
    if mesh.is_empty() {
        return None;
    }
    let vertices = interleave(mesh);
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("Mesh {index} Vertices")),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("Mesh {index} Indices")),
        contents: bytemuck::cast_slice(&mesh.indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    log::debug!(
        "uploaded mesh {index}: {} vertices, {} triangles",
        vertices.len(),
        mesh.indices.len() / 3
    );
    Some(GpuMesh {
        vertex_buffer,
        index_buffer,
        index_count: mesh.indices.len() as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_forty_bytes() {
        assert_eq!(size_of::<Vertex>(), 40);
    }

    #[test]
    fn interleave_fills_defaults() {
        let mut mesh = MeshData::plane(2.0, 2.0);
        mesh.normals.clear();
        let verts = interleave(&mesh);
        assert_eq!(verts.len(), 4);
        assert_eq!(verts[0].normal, [0.0, 1.0, 0.0]);
        assert_eq!(verts[0].color, [1.0; 4]);
        assert_eq!(verts[2].position, [1.0, 1.0, 0.0]);
    }

    #[test]
    fn interleave_keeps_vertex_colors() {
        let mut mesh = MeshData::plane(1.0, 1.0);
        mesh.colors = Some(vec![[0.5, 0.25, 0.0, 1.0]; 4]);
        assert_eq!(interleave(&mesh)[3].color, [0.5, 0.25, 0.0, 1.0]);
    }
}
