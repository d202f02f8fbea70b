//! Narration script generation with the Gemini `generateContent` API

use log::{debug, error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::utils::common::preview;

const GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

// Gemini API request
#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

// Gemini API response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    status: Option<String>,
}

/// Prompt sent to the text model for a given topic
pub fn build_prompt(topic: &str, words: u32) -> String {
    format!(
        "Write a short {}-word YouTube narration script about {}. No markdown.",
        words,
        topic.trim()
    )
}

/// Client for the generative text model
pub struct ScriptGenerator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    words: u32,
}

impl ScriptGenerator {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            base_url: config.endpoints.gemini.trim_end_matches('/').to_string(),
            words: config.script_words,
        }
    }

    /// Request a narration script for `topic` and save it to `output_path`
    pub async fn generate_script(&self, topic: &str, output_path: &Path) -> AppResult<String> {
        info!("Generating script with {}", self.model);

        let prompt = build_prompt(topic, self.words);
        debug!("Prompt: {}", prompt);

        let script = self.request_text(&prompt).await?;
        if script.is_empty() {
            error!("Text model returned an empty script");
            return Err(AppError::EmptyScript);
        }

        tokio::fs::write(output_path, script.as_bytes()).await?;
        info!(
            "Script saved to {}: {}",
            output_path.display(),
            preview(&script, 120)
        );

        Ok(script)
    }

    async fn request_text(&self, prompt: &str) -> AppResult<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .timeout(GENERATION_TIMEOUT)
            .send()
            .await
            .map_err(|e| AppError::ScriptGeneration(format!("Request failed: {}", e)))?;

        let status = response.status();
        debug!("Gemini API response status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| AppError::ScriptGeneration(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|env| match env.error.status {
                    Some(code) => format!("{} ({})", env.error.message, code),
                    None => env.error.message,
                })
                .unwrap_or(body);
            error!("Gemini API error: HTTP {}, {}", status, message);
            return Err(AppError::ScriptGeneration(format!(
                "HTTP {}: {}",
                status, message
            )));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::ScriptGeneration(format!("Unexpected response: {}", e)))?;

        extract_text(parsed)
    }
}

fn extract_text(response: GenerateContentResponse) -> AppResult<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(AppError::ScriptGeneration(format!(
            "Prompt was blocked: {}",
            reason
        )));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AppError::ScriptGeneration("Response contained no candidates".to_string()))?;

    if let Some(reason) = &candidate.finish_reason {
        debug!("Finish reason: {}", reason);
    }

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    Ok(text.trim().to_string())
}
