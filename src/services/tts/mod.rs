//! Text-to-speech services
//!
//! Both engines return MP3 data. Long text is cut into chunks the remote
//! service accepts and the returned MP3 frames are appended in order.

use async_trait::async_trait;
use log::info;
use std::path::Path;

use crate::config::{AppConfig, TtsEngine};
use crate::errors::{AppError, AppResult};

pub mod google;
pub mod openai;

pub use google::GoogleTts;
pub use openai::OpenAiTts;

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Engine name for logs
    fn name(&self) -> &'static str;

    /// Synthesize `text`, returning MP3 bytes
    async fn synthesize(&self, text: &str) -> AppResult<Vec<u8>>;

    /// Synthesize `text` and write it to `output_path`
    async fn save(&self, text: &str, output_path: &Path) -> AppResult<()> {
        let audio = self.synthesize(text).await?;
        tokio::fs::write(output_path, &audio).await?;
        info!(
            "Voice saved as {} ({} bytes)",
            output_path.display(),
            audio.len()
        );
        Ok(())
    }
}

/// Build the synthesizer selected in the configuration
pub fn create_synthesizer(config: &AppConfig) -> AppResult<Box<dyn SpeechSynthesizer>> {
    match config.tts.engine {
        TtsEngine::Google => Ok(Box::new(GoogleTts::new(config))),
        TtsEngine::OpenAI => {
            let api_key = config.openai_api_key.clone().ok_or_else(|| {
                AppError::Configuration("OPENAI_API_KEY is not set".to_string())
            })?;
            Ok(Box::new(OpenAiTts::new(config, api_key)))
        }
    }
}

/// Split text into chunks of at most `max_chars` characters.
///
/// Breaks after clause punctuation when possible, otherwise between words.
/// A single word longer than `max_chars` is cut mid-word.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);

    // Клаузы: последовательности слов, заканчивающиеся знаком препинания
    let mut clauses: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for word in text.split_whitespace() {
        current.push(word);
        if word.ends_with(['.', '!', '?', ';', ':', ',', '…']) {
            clauses.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        clauses.push(current);
    }

    let mut chunks = Vec::new();
    let mut buffer = String::new();

    for clause in clauses {
        let joined = clause.join(" ");
        if fits(&buffer, &joined, max_chars) {
            push_word(&mut buffer, &joined);
            continue;
        }

        if !buffer.is_empty() {
            chunks.push(std::mem::take(&mut buffer));
        }

        if joined.chars().count() <= max_chars {
            buffer = joined;
            continue;
        }

        // Клауза длиннее лимита: режем по словам
        for word in clause {
            if fits(&buffer, word, max_chars) {
                push_word(&mut buffer, word);
                continue;
            }
            if !buffer.is_empty() {
                chunks.push(std::mem::take(&mut buffer));
            }
            let chars: Vec<char> = word.chars().collect();
            let mut pieces = chars.chunks(max_chars).map(|c| c.iter().collect::<String>()).peekable();
            while let Some(piece) = pieces.next() {
                if pieces.peek().is_some() {
                    chunks.push(piece);
                } else {
                    buffer = piece;
                }
            }
        }
    }

    if !buffer.is_empty() {
        chunks.push(buffer);
    }

    chunks
}

fn fits(buffer: &str, addition: &str, max_chars: usize) -> bool {
    let extra = if buffer.is_empty() { 0 } else { 1 };
    buffer.chars().count() + extra + addition.chars().count() <= max_chars
}

fn push_word(buffer: &mut String, word: &str) {
    if !buffer.is_empty() {
        buffer.push(' ');
    }
    buffer.push_str(word);
}
