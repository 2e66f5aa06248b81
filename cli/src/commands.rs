pub mod aggregate;
pub mod divisions;
pub mod refresh;
pub mod resolve;

use std::{fs, io::Write, path::Path};

use anyhow::{Context as _, Result};
use serde_json::Value;

/// Read a JSON document from disk.
pub(crate) fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Pretty-print `value` to `path`, or to stdout when no path is given.
pub(crate) fn write_json(value: &Value, path: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => fs::write(path, text + "\n").with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let mut out = std::io::stdout().lock();
            writeln!(out, "{text}")?;
            Ok(())
        }
    }
}
