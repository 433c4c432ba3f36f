//! Asynchronous model loading.
//!
//! [`AssetLoader::load`] runs the decoder stage and glTF parse on a named
//! background thread and returns a [`PendingLoad`] the frame loop polls
//! without blocking. The worker owns only its request and sends exactly
//! one result.

mod decoder;
#[cfg(feature = "draco")]
mod draco;
mod error;
mod model;
mod parse;

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::JoinHandle;

pub use decoder::{
    GeometryDecoder, Prepared, DECOMPRESSED_SUFFIX, DRACO_EXTENSION,
};
pub use error::LoadError;
pub use model::{Instantiated, LoadedModel, ModelNode, ModelPrimitive};
pub use parse::parse_document;

use crate::options::ModelOptions;

/// What to load and where the decoder resources live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Directory the model (and its external buffers) live in.
    pub dir: PathBuf,
    /// File name within `dir`.
    pub file: String,
    /// Geometry decoder directory (uncompressed fallbacks), if any.
    pub decoder_dir: Option<PathBuf>,
}

impl LoadRequest {
    /// Request for `file` inside `dir` with no decoder resources.
    pub fn new(dir: impl Into<PathBuf>, file: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file: file.into(),
            decoder_dir: None,
        }
    }

    /// Request built from the `[model]` options section.
    pub fn from_options(options: &ModelOptions) -> Self {
        Self {
            dir: PathBuf::from(&options.dir),
            file: options.file.clone(),
            decoder_dir: options.decoder_dir.as_ref().map(PathBuf::from),
        }
    }

    /// Request for a full file path.
    pub fn from_path(path: &Path) -> Self {
        Self {
            dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            file: path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default(),
            decoder_dir: None,
        }
    }

    /// Full path of the model file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file)
    }
}

/// Result of a load, delivered once.
pub type LoadResult = Result<LoadedModel, LoadError>;

/// Entry point for model loads.
pub struct AssetLoader;

impl AssetLoader {
    /// Start loading on a background thread.
    pub fn load(request: LoadRequest) -> PendingLoad {
        let (tx, rx) = mpsc::channel::<LoadResult>();
        let path = request.path();
        log::info!("loading model {}", path.display());

        let spawned = std::thread::Builder::new()
            .name("asset-loader".into())
            .spawn(move || {
                let result = Self::load_blocking(&request);
                // Receiver may be gone if the viewer closed first.
                let _ = tx.send(result);
            });

        match spawned {
            Ok(handle) => PendingLoad {
                rx,
                thread: Some(handle),
                path,
            },
            Err(source) => {
                log::error!("failed to spawn loader thread: {source}");
                PendingLoad::resolved(path.clone(), Err(LoadError::Io { path, source }))
            }
        }
    }

    /// Run the whole load on the calling thread.
    pub fn load_blocking(request: &LoadRequest) -> LoadResult {
        let decoder = GeometryDecoder::init(request.decoder_dir.as_deref())?;
        parse::load_file(&request.path(), &decoder)
    }
}

/// An in-flight load.
pub struct PendingLoad {
    rx: mpsc::Receiver<LoadResult>,
    thread: Option<JoinHandle<()>>,
    path: PathBuf,
}

impl PendingLoad {
    /// A load that has already finished with `result`.
    pub fn resolved(path: PathBuf, result: LoadResult) -> Self {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(result);
        Self {
            rx,
            thread: None,
            path,
        }
    }

    /// File being loaded.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Non-blocking check for the result.
    ///
    /// Returns `None` while the worker is still running. A worker that
    /// exits without sending yields [`LoadError::Disconnected`].
    pub fn try_recv(&mut self) -> Option<LoadResult> {
        let result = match self.rx.try_recv() {
            Ok(result) => result,
            Err(mpsc::TryRecvError::Empty) => return None,
            Err(mpsc::TryRecvError::Disconnected) => Err(LoadError::Disconnected),
        };
        self.join();
        Some(result)
    }

    /// Block until the result arrives.
    pub fn wait(mut self) -> LoadResult {
        let result = self.rx.recv().unwrap_or(Err(LoadError::Disconnected));
        self.join();
        result
    }

    fn join(&mut self) {
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::error!("loader thread panicked");
            }
        }
    }
}
