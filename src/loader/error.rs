use std::fmt;
use std::path::PathBuf;

/// Why a model failed to load.
///
/// Loading failures never stop the viewer; the frame loop logs them and
/// keeps rendering the scene without the model.
#[derive(Debug)]
pub enum LoadError {
    /// The model file (or an external buffer) could not be read.
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The glTF document is malformed or failed validation.
    Gltf(gltf::Error),
    /// A decoder directory is configured but does not exist.
    DecoderUnavailable(PathBuf),
    /// The file requires an extension the decoder stage cannot expand.
    UnsupportedExtension(String),
    /// Compressed geometry could not be expanded.
    Decode(String),
    /// The document contains no scene to instantiate.
    NoScene,
    /// The loader thread exited without reporting a result.
    Disconnected,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            Self::Gltf(e) => write!(f, "invalid glTF: {e}"),
            Self::DecoderUnavailable(dir) => {
                write!(f, "decoder directory {} not found", dir.display())
            }
            Self::UnsupportedExtension(ext) => {
                write!(f, "required extension {ext} is not supported")
            }
            Self::Decode(msg) => write!(f, "geometry decode failed: {msg}"),
            Self::NoScene => write!(f, "document has no scene"),
            Self::Disconnected => write!(f, "loader thread disconnected"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Gltf(e) => Some(e),
            _ => None,
        }
    }
}

impl From<gltf::Error> for LoadError {
    fn from(e: gltf::Error) -> Self {
        Self::Gltf(e)
    }
}
