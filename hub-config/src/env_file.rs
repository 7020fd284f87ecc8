//! Parsing of the fallback `KEY=VALUE` env file.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{ConfigError, Result};

/// Parse env file content into key/value pairs, in file order.
///
/// Blank lines and lines starting with `#` are skipped. Every other line is split on the
/// first `=`; anything after it (including further `=`) is the value. Lines without `=`
/// are skipped with a warning.
pub fn parse(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            match line.split_once('=') {
                Some((key, value)) => Some((key.to_string(), value.to_string())),
                None => {
                    warn!(line = idx + 1, "skipping env file line without '='");
                    None
                }
            }
        })
        .collect()
}

/// Read and parse the env file at `path`.
///
/// A missing file yields `Ok(None)`; any other I/O failure is an error. When a key occurs
/// more than once the last occurrence wins.
pub fn read(path: &Path) -> Result<Option<HashMap<String, String>>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "env file not present");
            return Ok(None);
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    Ok(Some(parse(&content).into_iter().collect()))
}
