//! Pexels video search
//!
//! Any failure here is non-fatal: the caller renders over a solid background
//! instead. Only local file errors are reported as errors.

use futures::StreamExt;
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use crate::config::AppConfig;
use crate::errors::AppResult;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Deserialize)]
pub struct VideoSearchResponse {
    #[serde(default)]
    pub videos: Vec<PexelsVideo>,
}

#[derive(Debug, Deserialize)]
pub struct PexelsVideo {
    pub id: u64,
    pub duration: Option<f64>,
    #[serde(default)]
    pub video_files: Vec<VideoFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoFile {
    pub quality: Option<String>,
    pub file_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub link: String,
}

/// Pick the download link of the first result.
///
/// The first `video/mp4` rendition wins, otherwise whatever file is listed first.
pub fn select_video_file(response: &VideoSearchResponse) -> Option<&VideoFile> {
    let video = response.videos.first()?;
    video
        .video_files
        .iter()
        .find(|f| f.file_type.as_deref() == Some("video/mp4"))
        .or_else(|| video.video_files.first())
}

pub struct PexelsClient {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl PexelsClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.pexels_api_key.clone(),
            base_url: config.endpoints.pexels.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// Search for `topic` and download the first clip to `output_path`.
    ///
    /// Returns `Ok(None)` when nothing usable was found.
    pub async fn fetch_video(&self, topic: &str, output_path: &Path) -> AppResult<Option<PathBuf>> {
        info!("Fetching video from Pexels for '{}'", topic);

        let Some(file) = self.search(topic).await else {
            return Ok(None);
        };

        debug!(
            "Selected {} rendition {}x{} ({})",
            file.quality.as_deref().unwrap_or("unknown"),
            file.width.unwrap_or(0),
            file.height.unwrap_or(0),
            file.link
        );

        match self.download(&file.link, output_path).await {
            Ok(written) => {
                info!("Video downloaded as {} ({} bytes)", output_path.display(), written);
                Ok(Some(output_path.to_path_buf()))
            }
            Err(DownloadError::Remote(msg)) => {
                warn!("Error downloading video: {}. Using solid background.", msg);
                // Недокачанный файл не должен попасть в композицию
                if tokio::fs::try_exists(output_path).await.unwrap_or(false) {
                    tokio::fs::remove_file(output_path).await?;
                }
                Ok(None)
            }
            Err(DownloadError::Local(e)) => Err(e.into()),
        }
    }

    async fn search(&self, topic: &str) -> Option<VideoFile> {
        let url = format!("{}/videos/search", self.base_url);

        let response = match self
            .client
            .get(&url)
            .header("Authorization", &self.api_key)
            .query(&[("query", topic), ("per_page", "1")])
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Error fetching video: {}", e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("Pexels search failed with HTTP {}", status);
            return None;
        }

        let data: VideoSearchResponse = match response.json().await {
            Ok(d) => d,
            Err(e) => {
                warn!("Unexpected Pexels response: {}", e);
                return None;
            }
        };

        match select_video_file(&data) {
            Some(file) => Some(file.clone()),
            None => {
                warn!("No Pexels video found. Using solid background.");
                None
            }
        }
    }

    async fn download(&self, link: &str, output_path: &Path) -> Result<u64, DownloadError> {
        let response = self
            .client
            .get(link)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| DownloadError::Remote(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Remote(format!("HTTP {}", status)));
        }

        let mut file = tokio::fs::File::create(output_path)
            .await
            .map_err(DownloadError::Local)?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DownloadError::Remote(e.to_string()))?;
            file.write_all(&chunk).await.map_err(DownloadError::Local)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(DownloadError::Local)?;

        if written == 0 {
            return Err(DownloadError::Remote("empty response body".to_string()));
        }

        Ok(written)
    }
}

enum DownloadError {
    Remote(String),
    Local(std::io::Error),
}

/// Convenience wrapper used by the pipeline
pub async fn fetch_video_from_pexels(
    config: &AppConfig,
    topic: &str,
) -> AppResult<Option<PathBuf>> {
    PexelsClient::new(config)
        .fetch_video(topic, &config.background_path())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> VideoSearchResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_select_prefers_mp4() {
        let response = parse(
            r#"{"videos":[{"id":1,"duration":12,"video_files":[
                {"quality":null,"file_type":"application/x-mpegURL","width":null,"height":null,"link":"https://cdn/x.m3u8"},
                {"quality":"hd","file_type":"video/mp4","width":1920,"height":1080,"link":"https://cdn/x.mp4"}
            ]}]}"#,
        );
        assert_eq!(select_video_file(&response).unwrap().link, "https://cdn/x.mp4");
    }

    #[test]
    fn test_select_falls_back_to_first_file() {
        let response = parse(
            r#"{"videos":[{"id":1,"video_files":[{"file_type":"video/webm","link":"https://cdn/a.webm"}]}]}"#,
        );
        assert_eq!(select_video_file(&response).unwrap().link, "https://cdn/a.webm");
    }

    #[test]
    fn test_select_without_results() {
        assert!(select_video_file(&parse(r#"{"videos":[]}"#)).is_none());
        assert!(select_video_file(&parse(r#"{"total_results":0}"#)).is_none());
        assert!(select_video_file(&parse(r#"{"videos":[{"id":3,"video_files":[]}]}"#)).is_none());
    }
}
