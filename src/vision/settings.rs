//! Settings sources accepted by `load_model`

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Where recognition settings come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsSource {
    /// Settings file on disk
    File(PathBuf),
    /// Settings text passed inline
    Inline(String),
}

impl SettingsSource {
    /// Classify a caller string: JSON-looking text is inline, anything else a path
    pub fn detect(value: &str) -> Self {
        match value.trim_start().chars().next() {
            Some('{') | Some('[') => SettingsSource::Inline(value.to_string()),
            _ => SettingsSource::File(PathBuf::from(value)),
        }
    }

    /// Settings text, reading the file if needed
    pub fn read(&self) -> Result<Cow<'_, str>> {
        match self {
            SettingsSource::File(path) => Ok(Cow::Owned(std::fs::read_to_string(path)?)),
            SettingsSource::Inline(text) => Ok(Cow::Borrowed(text)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            SettingsSource::File(path) => Some(path),
            SettingsSource::Inline(_) => None,
        }
    }
}

impl From<&str> for SettingsSource {
    fn from(value: &str) -> Self {
        Self::detect(value)
    }
}

impl From<PathBuf> for SettingsSource {
    fn from(path: PathBuf) -> Self {
        SettingsSource::File(path)
    }
}
