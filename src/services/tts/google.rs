use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use reqwest::header::USER_AGENT;
use std::time::Duration;

use super::{SpeechSynthesizer, split_text};
use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};

/// The endpoint rejects longer inputs
pub const MAX_CHUNK_CHARS: usize = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Google Translate speech endpoint, the same one gTTS uses
pub struct GoogleTts {
    client: Client,
    base_url: String,
    language: String,
    slow: bool,
}

impl GoogleTts {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.endpoints.google_tts.trim_end_matches('/').to_string(),
            language: config.tts.language.clone(),
            slow: config.tts.slow,
        }
    }

    async fn fetch_chunk(&self, chunk: &str, idx: usize, total: usize) -> AppResult<Vec<u8>> {
        let url = format!("{}/translate_tts", self.base_url);
        let speed = if self.slow { "0.3" } else { "1" };
        let query = [
            ("ie", "UTF-8".to_string()),
            ("q", chunk.to_string()),
            ("tl", self.language.clone()),
            ("total", total.to_string()),
            ("idx", idx.to_string()),
            ("textlen", chunk.chars().count().to_string()),
            ("client", "tw-ob".to_string()),
            ("ttsspeed", speed.to_string()),
        ];

        debug!("Requesting speech chunk {}/{}", idx + 1, total);
        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .query(&query)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| AppError::SpeechSynthesis(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Google TTS error for chunk {}: HTTP {}", idx + 1, status);
            return Err(AppError::SpeechSynthesis(format!(
                "HTTP {} for chunk {}/{}: {}",
                status,
                idx + 1,
                total,
                body.trim()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::SpeechSynthesis(format!("Failed to read audio: {}", e)))?;
        if bytes.is_empty() {
            return Err(AppError::SpeechSynthesis(format!(
                "Empty audio for chunk {}/{}",
                idx + 1,
                total
            )));
        }

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn synthesize(&self, text: &str) -> AppResult<Vec<u8>> {
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(AppError::SpeechSynthesis("No text to speak".to_string()));
        }

        info!(
            "Synthesizing {} chunk(s) with Google TTS ({})",
            chunks.len(),
            self.language
        );

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let bytes = self.fetch_chunk(chunk, idx, chunks.len()).await?;
            audio.extend_from_slice(&bytes);
        }

        Ok(audio)
    }
}
