//! In-place expansion of `KHR_draco_mesh_compression` primitives.
//!
//! The native decoder returns one flat little-endian stream: the index
//! block first (u16 when the index count fits, u32 otherwise), then every
//! compressed attribute in ascending Draco attribute id, each
//! `vertex_count * components * component_size` bytes long.

use draco_decoder::{decode_mesh, AttributeDataType, MeshDecodeConfig};
use gltf::accessor::DataType;
use gltf::buffer::Data;
use rustc_hash::FxHashMap;

use super::decoder::DRACO_EXTENSION;
use super::error::LoadError;
use crate::scene::MeshData;

/// One compressed attribute, in stream order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct StreamAttribute {
    /// glTF semantic name (`POSITION`, `NORMAL`, `COLOR_0`, ...).
    pub name: String,
    /// Components per vertex.
    pub components: usize,
    /// Component type.
    pub data_type: DataType,
}

/// Shape of a decoded stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct StreamLayout {
    pub vertex_count: usize,
    pub index_count: usize,
    pub attributes: Vec<StreamAttribute>,
}

/// Decode a compressed primitive. `Ok(None)` if it is not compressed.
pub(super) fn decode_primitive(
    document: &gltf::Document,
    buffers: &[Data],
    primitive: &gltf::Primitive,
) -> Result<Option<MeshData>, LoadError> {
    let Some(ext) = primitive.extension_value(DRACO_EXTENSION) else {
        return Ok(None);
    };
    let decode_err = |msg: &str| LoadError::Decode(msg.to_owned());

    let view_index = ext
        .get("bufferView")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| decode_err("bufferView missing"))?;
    let ids = ext
        .get("attributes")
        .and_then(serde_json::Value::as_object)
        .ok_or_else(|| decode_err("attributes missing"))?;

    let view = document
        .views()
        .nth(view_index as usize)
        .ok_or_else(|| decode_err("bufferView out of range"))?;
    let compressed = buffers
        .get(view.buffer().index())
        .and_then(|data| data.0.get(view.offset()..view.offset() + view.length()))
        .ok_or_else(|| decode_err("bufferView outside its buffer"))?;

    let accessors: FxHashMap<String, gltf::Accessor> = primitive
        .attributes()
        .map(|(semantic, accessor)| (semantic.to_string(), accessor))
        .collect();
    let mut ordered: Vec<(u64, &str)> = ids
        .iter()
        .filter_map(|(name, id)| id.as_u64().map(|id| (id, name.as_str())))
        .collect();
    ordered.sort_unstable_by_key(|&(id, _)| id);

    let mut attributes = Vec::with_capacity(ordered.len());
    for (_, name) in ordered {
        let accessor = accessors
            .get(name)
            .ok_or_else(|| LoadError::Decode(format!("no accessor for {name}")))?;
        attributes.push(StreamAttribute {
            name: name.to_owned(),
            components: accessor.dimensions().multiplicity(),
            data_type: accessor.data_type(),
        });
    }
    let layout = StreamLayout {
        vertex_count: accessors
            .get("POSITION")
            .map(gltf::Accessor::count)
            .ok_or_else(|| decode_err("POSITION missing"))?,
        index_count: primitive.indices().map_or(0, |a| a.count()),
        attributes,
    };

    let mut config =
        MeshDecodeConfig::new(layout.vertex_count as u32, layout.index_count as u32);
    for attribute in &layout.attributes {
        config.add_attribute(
            attribute.components as u32,
            codec_type(attribute.data_type),
        );
    }
    let stream = pollster::block_on(decode_mesh(compressed, &config))
        .ok_or_else(|| decode_err("decoder rejected the bitstream"))?;
    split_stream(&stream, &layout).map(Some)
}

fn codec_type(data_type: DataType) -> AttributeDataType {
    match data_type {
        DataType::I8 => AttributeDataType::Int8,
        DataType::U8 => AttributeDataType::UInt8,
        DataType::I16 => AttributeDataType::Int16,
        DataType::U16 => AttributeDataType::UInt16,
        DataType::U32 => AttributeDataType::UInt32,
        DataType::F32 => AttributeDataType::Float32,
    }
}

/// Cut a decoded stream into mesh data. Float positions are required;
/// float normals and colours are kept; everything else is skipped.
pub(super) fn split_stream(
    stream: &[u8],
    layout: &StreamLayout,
) -> Result<MeshData, LoadError> {
    let mut cursor = Cursor { stream, offset: 0 };

    let indices: Vec<u32> = if layout.index_count == 0 {
        (0..layout.vertex_count as u32).collect()
    } else if u16::try_from(layout.index_count).is_ok() {
        cursor
            .take(layout.index_count * 2)?
            .chunks_exact(2)
            .map(|c| u32::from(u16::from_le_bytes([c[0], c[1]])))
            .collect()
    } else {
        cursor
            .take(layout.index_count * 4)?
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    };

    let mut positions = None;
    let mut normals = None;
    let mut colors = None;
    for attribute in &layout.attributes {
        let len = layout.vertex_count
            * attribute.components
            * attribute.data_type.size();
        let bytes = cursor.take(len)?;
        if attribute.data_type != DataType::F32 {
            continue;
        }
        let floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        match (attribute.name.as_str(), attribute.components) {
            ("POSITION", 3) => positions = Some(vec3s(&floats)),
            ("NORMAL", 3) => normals = Some(vec3s(&floats)),
            ("COLOR_0", 3) => {
                colors = Some(
                    floats
                        .chunks_exact(3)
                        .map(|c| [c[0], c[1], c[2], 1.0])
                        .collect(),
                );
            }
            ("COLOR_0", 4) => {
                colors = Some(
                    floats
                        .chunks_exact(4)
                        .map(|c| [c[0], c[1], c[2], c[3]])
                        .collect(),
                );
            }
            _ => {}
        }
    }

    let positions: Vec<[f32; 3]> = positions
        .ok_or_else(|| LoadError::Decode("no float POSITION in stream".into()))?;
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
        return Err(LoadError::Decode(format!(
            "index {bad} out of range for {} vertices",
            positions.len()
        )));
    }
    let mut data = MeshData {
        positions,
        normals: normals.unwrap_or_default(),
        colors,
        indices,
    };
    if data.normals.len() != data.positions.len() {
        data.compute_normals();
    }
    Ok(data)
}

fn vec3s(floats: &[f32]) -> Vec<[f32; 3]> {
    floats.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
}

struct Cursor<'a> {
    stream: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], LoadError> {
        let bytes = self
            .stream
            .get(self.offset..self.offset + len)
            .ok_or_else(|| {
                LoadError::Decode(format!(
                    "stream ends at {} bytes, needed {}",
                    self.stream.len(),
                    self.offset + len
                ))
            })?;
        self.offset += len;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute(name: &str, components: usize, data_type: DataType) -> StreamAttribute {
        StreamAttribute {
            name: name.into(),
            components,
            data_type,
        }
    }

    fn push_f32s(out: &mut Vec<u8>, values: &[f32]) {
        for v in values {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }

    #[test]
    fn splits_indices_then_attributes_in_order() {
        let layout = StreamLayout {
            vertex_count: 3,
            index_count: 3,
            attributes: vec![
                attribute("POSITION", 3, DataType::F32),
                attribute("TEXCOORD_0", 2, DataType::U16),
                attribute("NORMAL", 3, DataType::F32),
            ],
        };
        let mut stream = Vec::new();
        for i in [2u16, 1, 0] {
            stream.extend_from_slice(&i.to_le_bytes());
        }
        push_f32s(&mut stream, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        stream.extend_from_slice(&[0u8; 3 * 2 * 2]);
        push_f32s(&mut stream, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);

        let mesh = split_stream(&stream, &layout).unwrap();
        assert_eq!(mesh.indices, vec![2, 1, 0]);
        assert_eq!(mesh.positions[1], [1.0, 0.0, 0.0]);
        assert_eq!(mesh.normals, vec![[0.0, 0.0, 1.0]; 3]);
        assert!(mesh.colors.is_none());
    }

    #[test]
    fn large_index_counts_use_u32() {
        let index_count = usize::from(u16::MAX) + 3;
        let layout = StreamLayout {
            vertex_count: 3,
            index_count,
            attributes: vec![attribute("POSITION", 3, DataType::F32)],
        };
        let mut stream = Vec::new();
        for i in 0..index_count as u32 {
            stream.extend_from_slice(&(i % 3).to_le_bytes());
        }
        push_f32s(&mut stream, &[0.0; 9]);

        let mesh = split_stream(&stream, &layout).unwrap();
        assert_eq!(mesh.indices.len(), index_count);
        assert_eq!(mesh.indices[4], 1);
        // Normals are generated when the stream has none.
        assert_eq!(mesh.normals.len(), 3);
    }

    #[test]
    fn short_stream_is_a_decode_error() {
        let layout = StreamLayout {
            vertex_count: 3,
            index_count: 0,
            attributes: vec![attribute("POSITION", 3, DataType::F32)],
        };
        let err = split_stream(&[0u8; 20], &layout).unwrap_err();
        assert!(matches!(err, LoadError::Decode(_)));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let layout = StreamLayout {
            vertex_count: 1,
            index_count: 3,
            attributes: vec![attribute("POSITION", 3, DataType::F32)],
        };
        let mut stream = Vec::new();
        for i in [0u16, 0, 7] {
            stream.extend_from_slice(&i.to_le_bytes());
        }
        push_f32s(&mut stream, &[0.0; 3]);
        assert!(split_stream(&stream, &layout).is_err());
    }
}
