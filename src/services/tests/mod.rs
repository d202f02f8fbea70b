//! HTTP-level tests of the services against a local mock server

mod test_script;

use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::config::{AppConfig, Endpoints, VOICE_FILE};
use crate::errors::{AppError, AppResult};
use crate::utils::ffmpeg::MediaProcessor;

pub(super) fn test_config(base_url: &str, output_dir: &Path) -> AppConfig {
    AppConfig {
        gemini_api_key: "gm-key".to_string(),
        pexels_api_key: "px-key".to_string(),
        openai_api_key: Some("sk-test".to_string()),
        gemini_model: "test-model".to_string(),
        output_dir: output_dir.to_path_buf(),
        endpoints: Endpoints::all(base_url),
        ..AppConfig::default()
    }
}

pub(super) fn gemini_body(text: &str) -> String {
    serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

/// Stand-in for ffmpeg/ffprobe: fixed durations, writes the output file it is asked for
#[derive(Clone)]
pub(super) struct FakeMedia {
    pub audio_duration: f64,
    /// Probing anything but the voice track fails when `None`
    pub clip_duration: Option<f64>,
    pub ffmpeg_calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FakeMedia {
    pub fn new(audio_duration: f64, clip_duration: Option<f64>) -> Self {
        Self {
            audio_duration,
            clip_duration,
            ffmpeg_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.ffmpeg_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaProcessor for FakeMedia {
    async fn probe_duration(&self, path: &Path) -> AppResult<f64> {
        if path.file_name() == Some(OsStr::new(VOICE_FILE)) {
            return Ok(self.audio_duration);
        }
        self.clip_duration.ok_or_else(|| {
            AppError::Composition(format!("ffprobe failed on {}", path.display()))
        })
    }

    async fn run_ffmpeg(&self, args: &[String]) -> AppResult<()> {
        if let Some(output) = args.last() {
            tokio::fs::write(output, b"rendered").await?;
        }
        self.ffmpeg_calls.lock().unwrap().push(args.to_vec());
        Ok(())
    }
}
