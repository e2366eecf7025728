//! Loading the binary's input document.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::calendar::TrainVariant;
use crate::feed::Feed;

/// Errors that can occur while reading an input document.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// File could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Contents are not a valid input document
    #[error("invalid input JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything one run works on. Every part may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReconcileInput {
    /// Feed whose route short names carry train labels
    pub authoritative: Feed,
    /// Feed whose rail trips get labels assigned
    pub target: Feed,
    /// Train variants to convert into service calendars
    pub variants: Vec<TrainVariant>,
}

impl ReconcileInput {
    pub fn from_json(text: &str) -> Result<Self, InputError> {
        Ok(serde_json::from_str(text)?)
    }
}

pub fn load_input(path: impl AsRef<Path>) -> Result<ReconcileInput, InputError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ReconcileInput::from_json(&text)
}
