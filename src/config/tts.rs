use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Доступные движки TTS
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TtsEngine {
    /// Google Translate speech endpoint, no key required
    #[default]
    Google,
    OpenAI,
}

impl TtsEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            TtsEngine::Google => "google",
            TtsEngine::OpenAI => "openai",
        }
    }
}

impl fmt::Display for TtsEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TtsEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" | "gtts" => Ok(TtsEngine::Google),
            "openai" => Ok(TtsEngine::OpenAI),
            other => Err(format!(
                "Unknown TTS engine '{}', expected 'google' or 'openai'",
                other
            )),
        }
    }
}

// Конфигурация TTS
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    // Выбранный движок
    pub engine: TtsEngine,

    // Google настройки
    pub language: String,
    pub slow: bool,

    // OpenAI настройки
    pub openai_model: String,
    pub openai_voice: String,
}

impl Default for TtsConfig {
    fn default() -> Self {
        TtsConfig {
            engine: TtsEngine::default(),
            language: "en".to_string(),
            slow: false,
            openai_model: "tts-1".to_string(),
            openai_voice: "alloy".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_parsing() {
        assert_eq!("google".parse::<TtsEngine>().unwrap(), TtsEngine::Google);
        assert_eq!("gTTS".parse::<TtsEngine>().unwrap(), TtsEngine::Google);
        assert_eq!(" OpenAI ".parse::<TtsEngine>().unwrap(), TtsEngine::OpenAI);
        assert!("festival".parse::<TtsEngine>().is_err());
    }

    #[test]
    fn test_engine_serde_is_lowercase() {
        let json = serde_json::to_string(&TtsEngine::OpenAI).unwrap();
        assert_eq!(json, "\"openai\"");
        let engine: TtsEngine = serde_json::from_str("\"google\"").unwrap();
        assert_eq!(engine, TtsEngine::Google);
    }
}
