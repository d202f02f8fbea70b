use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;

use crate::errors::{AppError, AppResult};

// Structure to represent an external tool
#[derive(Debug, Clone)]
pub struct ExternalTool {
    pub name: String,
    pub path: PathBuf,
    pub version: Version,
}

// Global storage for tools
static TOOLS: Lazy<Mutex<Vec<ExternalTool>>> = Lazy::new(|| Mutex::new(Vec::new()));

static FFMPEG_VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:ffmpeg|ffprobe) version n?(\d+)(?:\.(\d+))?(?:\.(\d+))?")
        .expect("valid ffmpeg version regex")
});

const MIN_FFMPEG_VERSION: Version = Version::new(4, 0, 0);

/// Locate ffmpeg and ffprobe and check their versions.
///
/// Composition shells out to both, so the run is refused up front when either is missing.
pub fn init_tools() -> Result<Vec<ExternalTool>> {
    info!("Checking external tools...");

    let mut found = Vec::new();
    for name in ["ffmpeg", "ffprobe"] {
        let path = check_command_in_path(name)?;
        debug!("Found {} at {}", name, path.display());

        let version = check_ffmpeg_version(&path)?;
        if version < MIN_FFMPEG_VERSION {
            return Err(anyhow!(
                "{} {} is too old, version {} or newer is required",
                name,
                version,
                MIN_FFMPEG_VERSION
            ));
        }

        found.push(ExternalTool {
            name: name.to_string(),
            path,
            version,
        });
    }

    let mut tools = TOOLS
        .lock()
        .map_err(|e| anyhow!("Tool registry lock poisoned: {}", e))?;
    tools.clear();
    tools.extend(found.iter().cloned());

    Ok(found)
}

/// `init_tools` off the async runtime; a failed check becomes `ToolNotFound`
pub async fn ensure_tools() -> AppResult<Vec<ExternalTool>> {
    tokio::task::spawn_blocking(init_tools)
        .await
        .map_err(anyhow::Error::from)?
        .map_err(|e| AppError::ToolNotFound(e.to_string()))
}

/// Check if a command is available in PATH
pub fn check_command_in_path(command: &str) -> Result<PathBuf> {
    which::which(command).map_err(|_| anyhow!("Command {} not found in PATH", command))
}

/// Check ffmpeg (or ffprobe) version
fn check_ffmpeg_version(path: &Path) -> Result<Version> {
    let output = Command::new(path)
        .args(["-version"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("Failed to execute {}", path.display()))?;

    if !output.status.success() {
        return Err(anyhow!("Failed to get version of {}", path.display()));
    }

    let version_str = String::from_utf8_lossy(&output.stdout);
    match parse_ffmpeg_version(&version_str) {
        Some(version) => Ok(version),
        None => {
            // Сборки из git (например "ffmpeg version N-113684-g...") не содержат semver
            debug!("Could not parse ffmpeg version, assuming minimum");
            Ok(MIN_FFMPEG_VERSION)
        }
    }
}

/// Extract a semver from the first line of `ffmpeg -version`
pub fn parse_ffmpeg_version(output: &str) -> Option<Version> {
    let caps = FFMPEG_VERSION_RE.captures(output)?;
    let part = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    Some(Version::new(part(1), part(2), part(3)))
}

/// Get tool path by name, falling back to the bare command name
pub fn get_tool_path(name: &str) -> PathBuf {
    TOOLS
        .lock()
        .ok()
        .and_then(|tools| {
            tools
                .iter()
                .find(|tool| tool.name == name)
                .map(|tool| tool.path.clone())
        })
        .unwrap_or_else(|| PathBuf::from(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_release_versions() {
        let out = "ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023 the FFmpeg developers";
        assert_eq!(parse_ffmpeg_version(out), Some(Version::new(6, 1, 1)));

        let out = "ffprobe version 7.0 Copyright (c) 2007-2024 the FFmpeg developers";
        assert_eq!(parse_ffmpeg_version(out), Some(Version::new(7, 0, 0)));

        let out = "ffmpeg version n5.1.4 Copyright (c) 2000-2023";
        assert_eq!(parse_ffmpeg_version(out), Some(Version::new(5, 1, 4)));
    }

    #[test]
    fn test_parse_git_build_is_unknown() {
        let out = "ffmpeg version N-113684-gd3f8b5e Copyright (c) 2000-2024";
        assert_eq!(parse_ffmpeg_version(out), None);
    }

    #[tokio::test]
    async fn test_ensure_tools_registers_or_reports_missing() {
        match ensure_tools().await {
            Ok(tools) => {
                let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
                assert_eq!(names, ["ffmpeg", "ffprobe"]);
                assert!(tools.iter().all(|t| t.version >= MIN_FFMPEG_VERSION));
                assert_eq!(get_tool_path("ffprobe"), tools[1].path);
            }
            Err(e) => assert!(matches!(e, AppError::ToolNotFound(_))),
        }
    }

    #[test]
    fn test_unknown_tool_falls_back_to_name() {
        assert_eq!(get_tool_path("not-a-real-tool"), PathBuf::from("not-a-real-tool"));
    }
}
