//! Running ffmpeg / ffprobe as child processes

use async_trait::async_trait;
use log::{debug, error};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::errors::{AppError, AppResult};
use crate::utils::common::tail_lines;
use crate::utils::tools::get_tool_path;

/// ffmpeg gets ten minutes per invocation
pub const FFMPEG_TIMEOUT: Duration = Duration::from_secs(600);
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Media operations the composition step needs
#[async_trait]
pub trait MediaProcessor: Send + Sync {
    /// Duration of a media file in seconds
    async fn probe_duration(&self, path: &Path) -> AppResult<f64>;

    /// Run ffmpeg with the given arguments, failing on timeout or a non-zero exit
    async fn run_ffmpeg(&self, args: &[String]) -> AppResult<()>;
}

/// ffmpeg and ffprobe as child processes
#[derive(Debug, Clone)]
pub struct FfmpegProcessor {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl FfmpegProcessor {
    /// Use the binaries found by `init_tools`, or the bare names from PATH
    pub fn from_registry() -> Self {
        Self {
            ffmpeg: get_tool_path("ffmpeg"),
            ffprobe: get_tool_path("ffprobe"),
        }
    }
}

/// Spawn errors name the binary; a missing one is a `ToolNotFound`
fn spawn_error(tool: &str, program: &Path, err: io::Error) -> AppError {
    if err.kind() == io::ErrorKind::NotFound {
        AppError::ToolNotFound(format!("{} ({})", tool, program.display()))
    } else {
        AppError::Composition(format!(
            "Failed to start {} ({}): {}",
            tool,
            program.display(),
            err
        ))
    }
}

async fn output_with_timeout(
    tool: &str,
    program: &Path,
    cmd: &mut Command,
    limit: Duration,
) -> AppResult<Output> {
    match timeout(limit, cmd.output()).await {
        Ok(result) => result.map_err(|e| spawn_error(tool, program, e)),
        Err(_) => {
            error!("{} process timed out after {} seconds", tool, limit.as_secs());
            Err(AppError::Composition(format!(
                "{} timed out after {} seconds",
                tool,
                limit.as_secs()
            )))
        }
    }
}

#[async_trait]
impl MediaProcessor for FfmpegProcessor {
    async fn probe_duration(&self, path: &Path) -> AppResult<f64> {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .kill_on_drop(true);

        let output = output_with_timeout("ffprobe", &self.ffprobe, &mut cmd, PROBE_TIMEOUT).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Composition(format!(
                "ffprobe failed on {}: {}",
                path.display(),
                tail_lines(&stderr, 4)
            )));
        }

        parse_duration(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            AppError::Composition(format!("Failed to parse duration of {}", path.display()))
        })
    }

    async fn run_ffmpeg(&self, args: &[String]) -> AppResult<()> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Executing ffmpeg command: {:?}", cmd);

        let output = output_with_timeout("ffmpeg", &self.ffmpeg, &mut cmd, FFMPEG_TIMEOUT).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail = tail_lines(&stderr, 8);
            error!("ffmpeg failed ({}): {}", output.status, tail);
            return Err(AppError::Composition(format!(
                "ffmpeg exited with {}: {}",
                output.status, tail
            )));
        }

        Ok(())
    }
}

/// Parse ffprobe's bare `format=duration` output
pub fn parse_duration(output: &str) -> Option<f64> {
    output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .and_then(|l| l.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
}

/// Format seconds the way ffmpeg's `-t` and lavfi `d=` expect
pub fn format_seconds(secs: f64) -> String {
    format!("{:.3}", secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("12.345000\n"), Some(12.345));
        assert_eq!(parse_duration("\n  7.5 \n"), Some(7.5));
        assert_eq!(parse_duration("N/A\n"), None);
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("0.000000"), None);
    }

    #[tokio::test]
    async fn test_missing_binaries_are_reported_by_name() {
        let processor = FfmpegProcessor {
            ffmpeg: PathBuf::from("/nonexistent/bin/ffmpeg"),
            ffprobe: PathBuf::from("/nonexistent/bin/ffprobe"),
        };

        match processor.probe_duration(Path::new("voice.mp3")).await {
            Err(AppError::ToolNotFound(msg)) => assert!(msg.contains("ffprobe")),
            other => panic!("unexpected result: {other:?}"),
        }

        match processor.run_ffmpeg(&["-version".to_string()]).await {
            Err(AppError::ToolNotFound(msg)) => assert!(msg.contains("ffmpeg")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_other_spawn_errors_name_the_tool() {
        let err = spawn_error(
            "ffmpeg",
            Path::new("/usr/bin/ffmpeg"),
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(&err, AppError::Composition(msg) if msg.contains("ffmpeg")));
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(8.0), "8.000");
        assert_eq!(format_seconds(12.34567), "12.346");
    }
}
