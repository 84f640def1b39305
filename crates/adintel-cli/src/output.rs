//! JSON result files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Filesystem-safe form of a keyword: alphanumerics kept, everything else
/// `_`, at most 50 characters.
pub(crate) fn slug(text: &str) -> String {
    text.trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .take(50)
        .collect()
}

/// Write `value` as pretty JSON to `<dir>/<kind>_<slug>_<timestamp>.json`
/// and return the path.
pub(crate) fn write_json<T: Serialize>(
    dir: &Path,
    kind: &str,
    subject: &str,
    at: DateTime<Utc>,
    value: &T,
) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let path = dir.join(format!(
        "{kind}_{}_{}.json",
        slug(subject),
        at.format("%Y%m%d_%H%M%S")
    ));
    let body = serde_json::to_string_pretty(value).context("failed to serialize result")?;
    std::fs::write(&path, body)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
