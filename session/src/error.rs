use std::path::PathBuf;

use frames::FrameError;
use thiserror::Error;

/// Errors surfaced by a [`Session`](crate::Session).
#[derive(Debug, Error)]
pub enum SessionError {
    /// A tree or caret operation was rejected. The session is unchanged.
    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("invalid session configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl SessionError {
    /// The underlying frame error, if this is one.
    pub fn as_frame_error(&self) -> Option<&FrameError> {
        match self {
            SessionError::Frame(error) => Some(error),
            _ => None,
        }
    }
}
