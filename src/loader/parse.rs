//! glTF / GLB document to [`LoadedModel`].

use std::path::Path;

use glam::{Quat, Vec3};
use gltf::animation::util::ReadOutputs;
use gltf::buffer::Data;
use rustc_hash::FxHashMap;

use super::decoder::{GeometryDecoder, Prepared};
use super::error::LoadError;
use super::model::{LoadedModel, ModelNode, ModelPrimitive};
use crate::animation::{AnimationClip, Interpolation, Track, TrackValues};
use crate::scene::{Material, MeshData, Transform};

/// Read, check and decode a model file.
pub fn load_file(
    path: &Path,
    decoder: &GeometryDecoder,
) -> Result<LoadedModel, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    // Validation runs after the decoder stage has accepted the required
    // extensions; gltf rejects any it does not know itself.
    let gltf::Gltf { document, blob } =
        gltf::Gltf::from_slice_without_validation(&bytes)?;
    let document = match decoder.prepare(path, document)? {
        Prepared::Ready(document) => document,
        Prepared::Substitute(copy) => {
            log::info!(
                "{} needs a codec this build lacks, loading {}",
                path.display(),
                copy.display()
            );
            // No fallback directory for the copy itself.
            return load_file(&copy, &GeometryDecoder::default());
        }
    };
    let buffers = gltf::import_buffers(&document, path.parent(), blob)?;
    parse_document(&document, &buffers)
}

/// Convert a validated document with resolved buffers.
pub fn parse_document(
    document: &gltf::Document,
    buffers: &[Data],
) -> Result<LoadedModel, LoadError> {
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(LoadError::NoScene)?;

    let mut model = LoadedModel::default();
    // gltf mesh index -> (model mesh index, material) per primitive
    let mut mesh_cache: FxHashMap<usize, Vec<ModelPrimitive>> = FxHashMap::default();
    // gltf node index -> model node index
    let mut node_map: FxHashMap<usize, usize> = FxHashMap::default();

    let mut stack: Vec<(gltf::Node, Option<usize>)> = scene
        .nodes()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .map(|n| (n, None))
        .collect();
    while let Some((node, parent)) = stack.pop() {
        let primitives = match node.mesh() {
            Some(mesh) => mesh_cache
                .entry(mesh.index())
                .or_insert_with(|| {
                    read_mesh(document, &mesh, buffers, &mut model.meshes)
                })
                .clone(),
            None => Vec::new(),
        };
        let (t, r, s) = node.transform().decomposed();
        let index = model.nodes.len();
        model.nodes.push(ModelNode {
            name: node
                .name()
                .map_or_else(|| format!("node{}", node.index()), str::to_owned),
            parent,
            transform: Transform {
                position: Vec3::from_array(t),
                rotation: Quat::from_array(r),
                scale: Vec3::from_array(s),
            },
            primitives,
        });
        node_map.insert(node.index(), index);
        for child in node.children().collect::<Vec<_>>().into_iter().rev() {
            stack.push((child, Some(index)));
        }
    }

    model.clips = document
        .animations()
        .map(|anim| read_clip(&anim, buffers, &node_map))
        .collect();

    log::debug!(
        "parsed {} nodes, {} meshes, {} clips",
        model.nodes.len(),
        model.meshes.len(),
        model.clips.len()
    );
    Ok(model)
}

fn read_mesh(
    document: &gltf::Document,
    mesh: &gltf::Mesh,
    buffers: &[Data],
    meshes: &mut Vec<MeshData>,
) -> Vec<ModelPrimitive> {
    let mut out = Vec::new();
    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::debug!(
                "skipping {:?} primitive in mesh {}",
                primitive.mode(),
                mesh.index()
            );
            continue;
        }
        let data = match read_compressed(document, buffers, &primitive) {
            Ok(Some(data)) => data,
            Ok(None) => match read_primitive(buffers, &primitive) {
                Some(data) => data,
                None => continue,
            },
            Err(e) => {
                log::warn!(
                    "skipping primitive {} of mesh {}: {e}",
                    primitive.index(),
                    mesh.index()
                );
                continue;
            }
        };

        out.push(ModelPrimitive {
            mesh: meshes.len(),
            material: read_material(&primitive.material()),
        });
        meshes.push(data);
    }
    out
}

#[cfg(feature = "draco")]
fn read_compressed(
    document: &gltf::Document,
    buffers: &[Data],
    primitive: &gltf::Primitive,
) -> Result<Option<MeshData>, LoadError> {
    super::draco::decode_primitive(document, buffers, primitive)
}

#[cfg(not(feature = "draco"))]
#[allow(clippy::unnecessary_wraps)]
fn read_compressed(
    _document: &gltf::Document,
    _buffers: &[Data],
    _primitive: &gltf::Primitive,
) -> Result<Option<MeshData>, LoadError> {
    Ok(None)
}

/// Uncompressed primitive through the accessor readers. `None` without
/// positions.
fn read_primitive(buffers: &[Data], primitive: &gltf::Primitive) -> Option<MeshData> {
    let reader =
        primitive.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    let colors = reader
        .read_colors(0)
        .map(|c| c.into_rgba_f32().collect::<Vec<_>>());

    let mut data = MeshData {
        normals: Vec::new(),
        positions,
        colors,
        indices,
    };
    match reader.read_normals() {
        Some(normals) => data.normals = normals.collect(),
        None => data.compute_normals(),
    }
    if data.normals.len() != data.positions.len() {
        data.compute_normals();
    }
    Some(data)
}

fn read_material(material: &gltf::Material) -> Material {
    let pbr = material.pbr_metallic_roughness();
    Material {
        base_color: pbr.base_color_factor(),
        roughness: pbr.roughness_factor(),
        metalness: pbr.metallic_factor(),
        emissive: material.emissive_factor(),
        double_sided: material.double_sided(),
        ..Material::default()
    }
}

fn read_clip(
    anim: &gltf::Animation,
    buffers: &[Data],
    node_map: &FxHashMap<usize, usize>,
) -> AnimationClip {
    let mut tracks = Vec::new();
    for channel in anim.channels() {
        // Channels targeting nodes outside the instantiated scene are dropped.
        let Some(&target) = node_map.get(&channel.target().node().index())
        else {
            continue;
        };
        let reader =
            channel.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
        let (Some(inputs), Some(outputs)) =
            (reader.read_inputs(), reader.read_outputs())
        else {
            continue;
        };
        let values = match outputs {
            ReadOutputs::Translations(v) => {
                TrackValues::Translation(v.map(Vec3::from_array).collect())
            }
            ReadOutputs::Rotations(v) => TrackValues::Rotation(
                v.into_f32().map(Quat::from_array).collect(),
            ),
            ReadOutputs::Scales(v) => {
                TrackValues::Scale(v.map(Vec3::from_array).collect())
            }
            ReadOutputs::MorphTargetWeights(_) => continue,
        };
        let interpolation = match channel.sampler().interpolation() {
            gltf::animation::Interpolation::Linear => Interpolation::Linear,
            gltf::animation::Interpolation::Step => Interpolation::Step,
            gltf::animation::Interpolation::CubicSpline => {
                Interpolation::CubicSpline
            }
        };
        tracks.push(Track {
            target,
            times: inputs.collect(),
            values,
            interpolation,
        });
    }
    AnimationClip::new(anim.name().unwrap_or_default(), tracks)
}
