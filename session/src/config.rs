use std::fs;
use std::path::Path;

use frames::ReorderPolicy;
use serde::Deserialize;

use crate::error::SessionError;

/// Where the caret starts when a session opens a document that carries no
/// caret marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaretStart {
    /// Top of the main code container.
    #[default]
    MainBody,
    /// Top of the root body, before the imports container.
    RootBody,
}

/// Per-session settings, read from TOML.
///
/// ```toml
/// reorder_policy = "validate"
/// caret_start = "main-body"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub reorder_policy: ReorderPolicy,
    pub caret_start: CaretStart,
}

impl SessionConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, SessionError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}
