use crate::constants::EXPORT_PREFIX;
use crate::core::LogLine;
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

pub fn export_file_name(day: NaiveDate) -> String {
    format!("{}{}.txt", EXPORT_PREFIX, day.format("%Y-%m-%d"))
}

/// Write the unfiltered lines, newline separated, to
/// `<dir>/bot-logs-YYYY-MM-DD.txt`.
pub fn export_lines(lines: &[LogLine], dir: &Path, day: NaiveDate) -> Result<PathBuf> {
    if lines.is_empty() {
        bail!("No logs available to download.");
    }
    let path = dir.join(export_file_name(day));
    let content = lines
        .iter()
        .map(|l| l.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
