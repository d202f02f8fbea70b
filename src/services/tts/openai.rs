use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use super::{SpeechSynthesizer, split_text};
use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};

/// Input limit of `/v1/audio/speech`
pub const MAX_INPUT_CHARS: usize = 4096;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Клиент для работы с OpenAI TTS API
pub struct OpenAiTts {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    voice: String,
}

impl OpenAiTts {
    pub fn new(config: &AppConfig, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: config.endpoints.openai.trim_end_matches('/').to_string(),
            model: config.tts.openai_model.clone(),
            voice: config.tts.openai_voice.clone(),
        }
    }

    async fn speech(&self, input: &str) -> AppResult<Vec<u8>> {
        let response = self
            .client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "voice": self.voice,
                "input": input,
                "response_format": "mp3",
            }))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| AppError::SpeechSynthesis(format!("Request failed: {}", e)))?;

        let status = response.status();
        debug!("OpenAI TTS response status: {}", status);

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {}", e));
            error!("OpenAI API error (status {}): {}", status, error_text);
            return Err(AppError::SpeechSynthesis(format!(
                "OpenAI API error (status {}): {}",
                status, error_text
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::SpeechSynthesis(format!("Failed to read audio: {}", e)))?;
        if bytes.is_empty() {
            return Err(AppError::SpeechSynthesis(
                "OpenAI returned an empty audio body".to_string(),
            ));
        }

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiTts {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn synthesize(&self, text: &str) -> AppResult<Vec<u8>> {
        let chunks = split_text(text, MAX_INPUT_CHARS);
        if chunks.is_empty() {
            return Err(AppError::SpeechSynthesis("No text to speak".to_string()));
        }

        info!(
            "Generating speech using OpenAI TTS (model: {}, voice: {})",
            self.model, self.voice
        );

        let mut audio = Vec::new();
        for chunk in &chunks {
            audio.extend(self.speech(chunk).await?);
        }
        Ok(audio)
    }
}
