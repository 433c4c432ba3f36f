//! Crate-level error types.

use std::fmt;

use crate::gpu::render_context::SurfaceInitError;

/// Errors produced by the diorama crate.
///
/// Model loading failures are deliberately absent: a
/// [`LoadError`](crate::loader::LoadError) never escapes the frame loop.
#[derive(Debug)]
pub enum DioramaError {
    /// No usable graphics context. Fatal at startup.
    Surface(SurfaceInitError),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Viewer event-loop failure.
    Viewer(String),
}

impl fmt::Display for DioramaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surface(e) => write!(f, "surface init error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Viewer(msg) => write!(f, "viewer error: {msg}"),
        }
    }
}

impl std::error::Error for DioramaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Surface(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SurfaceInitError> for DioramaError {
    fn from(e: SurfaceInitError) -> Self {
        Self::Surface(e)
    }
}

impl From<std::io::Error> for DioramaError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn surface_error_keeps_its_source() {
        let err = DioramaError::from(SurfaceInitError::UnsupportedSurface);
        assert!(err.to_string().starts_with("surface init error"));
        assert!(err.source().is_some());
    }

    #[test]
    fn options_error_has_no_source() {
        let err = DioramaError::OptionsParse("bad key".into());
        assert_eq!(err.to_string(), "options parse error: bad key");
        assert!(err.source().is_none());
    }
}
