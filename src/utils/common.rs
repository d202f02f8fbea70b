//! Common utility functions used across the application

use std::path::Path;

/// Check if a file exists and has valid content (non-zero size)
pub async fn check_file_exists_and_valid(path: &Path) -> bool {
    if let Ok(metadata) = tokio::fs::metadata(path).await {
        if metadata.is_file() && metadata.len() > 0 {
            return true;
        }
    }
    false
}

/// Create the directory (and parents) if it does not exist yet
pub async fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    tokio::fs::create_dir_all(path).await
}

/// Last `max_lines` non-empty lines of a tool's output, for error messages.
///
/// ffmpeg prints its banner and the full stream map before the actual error,
/// so only the tail is worth surfacing.
pub fn tail_lines(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}

/// Shorten text for log output without splitting a UTF-8 character
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}...", cut)
}
