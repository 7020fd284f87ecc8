//! Normalized results of hub requests.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use crate::enhance::StateResult;
use crate::error::{HaError, Result};

const OUTPUT_FILE_KEY: &str = "output_file";
const TEMP_PREFIX: &str = "homehub-";
const TEMP_SUFFIX: &str = ".jpg";

/// The outcome of a request, shaped by the response content type
#[derive(Debug, Clone, PartialEq)]
pub enum HaResult {
    /// Decoded JSON, raw mode
    Json(Value),
    /// Decoded JSON with unit-aware state
    State(StateResult),
    /// JPEG payload stored on disk
    Image(ImageFile),
    /// JPEG payload, raw mode
    Bytes(Vec<u8>),
}

impl HaResult {
    /// Mapping view of the result.
    ///
    /// Images become `{"output_file": "<path>"}`. Raw bytes have no JSON form.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            HaResult::Json(value) => Some(value.clone()),
            HaResult::State(state) => Some(state.as_value().clone()),
            HaResult::Image(image) => Some(image.to_json()),
            HaResult::Bytes(_) => None,
        }
    }

    pub fn as_state(&self) -> Option<&StateResult> {
        match self {
            HaResult::State(state) => Some(state),
            _ => None,
        }
    }

    pub fn into_state(self) -> Option<StateResult> {
        match self {
            HaResult::State(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageFile> {
        match self {
            HaResult::Image(image) => Some(image),
            _ => None,
        }
    }
}

/// A JPEG written by the client.
///
/// Temporary files are kept on disk after the result is dropped; removing them is up
/// to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    path: PathBuf,
    temporary: bool,
}

impl ImageFile {
    /// Write `bytes` to `output`, or to a fresh temporary file when `output` is `None`
    pub(crate) fn store(bytes: &[u8], output: Option<&Path>) -> Result<Self> {
        match output {
            Some(path) => {
                std::fs::write(path, bytes).map_err(HaError::Image)?;
                Ok(Self {
                    path: path.to_path_buf(),
                    temporary: false,
                })
            }
            None => {
                let mut file = tempfile::Builder::new()
                    .prefix(TEMP_PREFIX)
                    .suffix(TEMP_SUFFIX)
                    .tempfile()
                    .map_err(HaError::Image)?;
                file.write_all(bytes).map_err(HaError::Image)?;
                let (_, path) = file.keep().map_err(|e| HaError::Image(e.error))?;
                Ok(Self {
                    path,
                    temporary: true,
                })
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the client picked the location
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    pub fn read(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }

    pub fn to_json(&self) -> Value {
        json!({ OUTPUT_FILE_KEY: self.path.display().to_string() })
    }

    /// The mapping view passed through the enhancer; a no-op since it has no `state`
    pub fn to_state(&self) -> StateResult {
        StateResult::new(self.to_json())
    }
}
