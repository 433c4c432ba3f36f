use std::path::{Path, PathBuf};

use super::error::LoadError;

/// Mesh-compression extension expanded by the decoder stage.
pub const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

/// Suffix of pre-decompressed copies kept in the decoder directory.
pub const DECOMPRESSED_SUFFIX: &str = ".decompressed";

/// Required extensions this build expands in place.
#[cfg(feature = "draco")]
const CODECS: &[&str] = &[DRACO_EXTENSION];
#[cfg(not(feature = "draco"))]
const CODECS: &[&str] = &[];

/// Outcome of running the decoder stage over a document.
#[derive(Debug)]
pub enum Prepared {
    /// Validated document; compressed primitives are expanded while the
    /// meshes are read.
    Ready(gltf::Document),
    /// The document needs a codec this build lacks; load this
    /// uncompressed copy from the decoder directory instead.
    Substitute(PathBuf),
}

/// Geometry decoder stage run before a model is parsed.
///
/// With the `draco` feature, `KHR_draco_mesh_compression` primitives are
/// decoded natively. The decoder directory holds uncompressed fallbacks
/// named `<stem>.decompressed.glb` (or `.gltf`) for builds or extensions
/// without a codec.
#[derive(Debug, Clone, Default)]
pub struct GeometryDecoder {
    dir: Option<PathBuf>,
}

impl GeometryDecoder {
    /// Initialize the stage.
    ///
    /// # Errors
    ///
    /// [`LoadError::DecoderUnavailable`] if `decoder_dir` is set but is not
    /// a directory.
    pub fn init(decoder_dir: Option<&Path>) -> Result<Self, LoadError> {
        if let Some(dir) = decoder_dir {
            if !dir.is_dir() {
                return Err(LoadError::DecoderUnavailable(dir.to_path_buf()));
            }
        }
        let decoder = Self {
            dir: decoder_dir.map(Path::to_path_buf),
        };
        log::debug!(
            "geometry decoder: codecs {:?}, fallback dir {:?}",
            CODECS,
            decoder.dir()
        );
        Ok(decoder)
    }

    /// Directory searched for uncompressed fallbacks.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Whether this build can expand `extension` in place.
    pub fn can_expand(extension: &str) -> bool {
        CODECS.contains(&extension)
    }

    /// Uncompressed copy of `model` in the decoder directory, if present.
    pub fn fallback_for(&self, model: &Path) -> Option<PathBuf> {
        let dir = self.dir()?;
        let stem = model.file_stem()?.to_string_lossy();
        ["glb", "gltf"]
            .iter()
            .map(|ext| dir.join(format!("{stem}{DECOMPRESSED_SUFFIX}.{ext}")))
            .find(|path| path.is_file())
    }

    /// Check the required extensions of `document`, read from `model`.
    ///
    /// Extensions this build expands are removed from the required list
    /// before the document is validated. Anything else switches to the
    /// fallback copy.
    ///
    /// # Errors
    ///
    /// [`LoadError::UnsupportedExtension`] when no codec or fallback exists,
    /// [`LoadError::Gltf`] when the document fails validation.
    pub fn prepare(
        &self,
        model: &Path,
        document: gltf::Document,
    ) -> Result<Prepared, LoadError> {
        let mut root = document.into_json();
        let unsupported = root
            .extensions_required
            .iter()
            .find(|ext| !Self::can_expand(ext))
            .cloned();
        if let Some(ext) = unsupported {
            if let Some(copy) = self.fallback_for(model) {
                return Ok(Prepared::Substitute(copy));
            }
            if ext == DRACO_EXTENSION {
                log::warn!(
                    "{} is Draco-compressed: build with the `draco` feature \
                     or put an uncompressed {}{DECOMPRESSED_SUFFIX}.glb in \
                     the decoder directory",
                    model.display(),
                    model
                        .file_stem()
                        .map_or_else(String::new, |s| s.to_string_lossy().into_owned()),
                );
            }
            return Err(LoadError::UnsupportedExtension(ext));
        }
        root.extensions_required.clear();
        Ok(Prepared::Ready(gltf::Document::from_json(root)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("diorama-decoder-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn document(required: &[&str]) -> gltf::Document {
        let json = serde_json::json!({
            "asset": { "version": "2.0" },
            "extensionsUsed": required,
            "extensionsRequired": required,
        });
        let gltf = gltf::Gltf::from_slice_without_validation(
            json.to_string().as_bytes(),
        )
        .unwrap();
        gltf.document
    }

    #[test]
    fn missing_dir_is_unavailable() {
        let err = GeometryDecoder::init(Some(Path::new("/no/such/decoder/dir")))
            .unwrap_err();
        assert!(matches!(err, LoadError::DecoderUnavailable(_)));
    }

    #[test]
    fn plain_document_is_ready() {
        let decoder = GeometryDecoder::default();
        let prepared = decoder.prepare(Path::new("a.glb"), document(&[])).unwrap();
        assert!(matches!(prepared, Prepared::Ready(_)));
    }

    #[test]
    fn unknown_extension_without_fallback_is_rejected() {
        let decoder = GeometryDecoder::default();
        let err = decoder
            .prepare(Path::new("a.glb"), document(&["EXT_meshopt_compression"]))
            .unwrap_err();
        assert!(
            matches!(err, LoadError::UnsupportedExtension(ext) if ext == "EXT_meshopt_compression")
        );
    }

    #[test]
    fn fallback_copy_replaces_compressed_model() {
        let dir = scratch_dir("fallback");
        let copy = dir.join("tokyo.decompressed.glb");
        std::fs::write(&copy, b"glTF").unwrap();
        let decoder = GeometryDecoder::init(Some(&dir)).unwrap();

        assert_eq!(decoder.fallback_for(Path::new("models/tokyo.glb")), Some(copy.clone()));
        assert_eq!(decoder.fallback_for(Path::new("models/other.glb")), None);
        let prepared = decoder
            .prepare(Path::new("models/tokyo.glb"), document(&["EXT_meshopt_compression"]))
            .unwrap();
        assert!(matches!(prepared, Prepared::Substitute(path) if path == copy));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[cfg(feature = "draco")]
    #[test]
    fn draco_is_expanded_in_place() {
        assert!(GeometryDecoder::can_expand(DRACO_EXTENSION));
        let prepared = GeometryDecoder::default()
            .prepare(Path::new("a.glb"), document(&[DRACO_EXTENSION]))
            .unwrap();
        let Prepared::Ready(doc) = prepared else {
            panic!("expected a ready document");
        };
        assert!(doc.extensions_required().next().is_none());
    }

    #[cfg(not(feature = "draco"))]
    #[test]
    fn draco_without_codec_or_fallback_is_rejected() {
        assert!(!GeometryDecoder::can_expand(DRACO_EXTENSION));
        let err = GeometryDecoder::default()
            .prepare(Path::new("a.glb"), document(&[DRACO_EXTENSION]))
            .unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedExtension(_)));
    }
}
