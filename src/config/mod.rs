// Configuration module
// Credentials come from the environment (or a .env file), everything else has defaults

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::{AppError, AppResult};

pub mod tts; // TTS configuration

pub use tts::{TtsConfig, TtsEngine};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const PEXELS_BASE_URL: &str = "https://api.pexels.com";
pub const GOOGLE_TTS_BASE_URL: &str = "https://translate.google.com";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

// Имена артефактов пайплайна
pub const SCRIPT_FILE: &str = "script.txt";
pub const VOICE_FILE: &str = "voice.mp3";
pub const BACKGROUND_FILE: &str = "background.mp4";
pub const FINAL_VIDEO_FILE: &str = "final_video.mp4";
pub const MANIFEST_FILE: &str = "run.json";

/// Base URLs of the remote services, swapped for a local mock in tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoints {
    pub gemini: String,
    pub pexels: String,
    pub google_tts: String,
    pub openai: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            gemini: GEMINI_BASE_URL.to_string(),
            pexels: PEXELS_BASE_URL.to_string(),
            google_tts: GOOGLE_TTS_BASE_URL.to_string(),
            openai: OPENAI_BASE_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Point every service at the same base URL
    pub fn all(base_url: &str) -> Self {
        Self {
            gemini: base_url.to_string(),
            pexels: base_url.to_string(),
            google_tts: base_url.to_string(),
            openai: base_url.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    #[serde(skip_serializing)]
    pub gemini_api_key: String,
    #[serde(skip_serializing)]
    pub pexels_api_key: String,
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,
    pub gemini_model: String,
    /// Target length of the narration, in words
    pub script_words: u32,
    pub tts: TtsConfig,
    pub output_dir: PathBuf,
    /// Timeout of the stock video search request
    pub request_timeout_secs: u64,
    pub video_width: u32,
    pub video_height: u32,
    pub background_color: String,
    pub endpoints: Endpoints,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            pexels_api_key: String::new(),
            openai_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            script_words: 20,
            tts: TtsConfig::default(),
            output_dir: PathBuf::from("."),
            request_timeout_secs: 10,
            video_width: 1280,
            video_height: 720,
            background_color: "black".to_string(),
            endpoints: Endpoints::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment, reading `.env` first if it exists
    pub fn from_env() -> AppResult<Self> {
        match dotenvy::dotenv() {
            Ok(path) => log::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => log::debug!("No .env file found"),
            Err(e) => {
                return Err(AppError::Configuration(format!(
                    "Failed to read .env file: {}",
                    e
                )));
            }
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut config = AppConfig {
            gemini_api_key: get("GEMINI_API_KEY").unwrap_or_default(),
            pexels_api_key: get("PEXELS_API_KEY").unwrap_or_default(),
            openai_api_key: get("OPENAI_API_KEY"),
            ..AppConfig::default()
        };

        if let Some(model) = get("GEMINI_MODEL") {
            config.gemini_model = model;
        }
        if let Some(engine) = get("SHORTNOVA_TTS_ENGINE") {
            config.tts.engine = engine.parse().map_err(AppError::Configuration)?;
        }
        if let Some(lang) = get("SHORTNOVA_TTS_LANG") {
            config.tts.language = lang;
        }
        if let Some(dir) = get("SHORTNOVA_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Check that every credential needed by the selected services is present
    pub fn validate(&self) -> AppResult<()> {
        if self.gemini_api_key.is_empty() {
            return Err(AppError::Configuration(
                "GEMINI_API_KEY not found in environment or .env".to_string(),
            ));
        }
        if self.pexels_api_key.is_empty() {
            return Err(AppError::Configuration(
                "PEXELS_API_KEY not found in environment or .env".to_string(),
            ));
        }
        if self.tts.engine == TtsEngine::OpenAI && self.openai_api_key.is_none() {
            return Err(AppError::Configuration(
                "OPENAI_API_KEY is required when the openai TTS engine is selected".to_string(),
            ));
        }
        if self.script_words == 0 {
            return Err(AppError::Configuration(
                "Script length must be at least one word".to_string(),
            ));
        }
        Ok(())
    }

    pub fn script_path(&self) -> PathBuf {
        self.output_dir.join(SCRIPT_FILE)
    }

    pub fn voice_path(&self) -> PathBuf {
        self.output_dir.join(VOICE_FILE)
    }

    pub fn background_path(&self) -> PathBuf {
        self.output_dir.join(BACKGROUND_FILE)
    }

    pub fn final_video_path(&self) -> PathBuf {
        self.output_dir.join(FINAL_VIDEO_FILE)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(MANIFEST_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_gemini_key_is_rejected() {
        let config = AppConfig::from_lookup(lookup_from(&[("PEXELS_API_KEY", "px")])).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_missing_pexels_key_is_rejected() {
        let config = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "gm")])).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("PEXELS_API_KEY"));
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "   "),
            ("PEXELS_API_KEY", "px"),
        ]))
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "gm"),
            ("PEXELS_API_KEY", "px"),
            ("GEMINI_MODEL", "gemini-2.5-flash"),
            ("SHORTNOVA_TTS_LANG", "de"),
            ("SHORTNOVA_OUTPUT_DIR", "out"),
        ]))
        .unwrap();

        config.validate().unwrap();
        assert_eq!(config.gemini_model, "gemini-2.5-flash");
        assert_eq!(config.tts.language, "de");
        assert_eq!(config.final_video_path(), PathBuf::from("out").join(FINAL_VIDEO_FILE));
    }

    #[test]
    fn test_openai_engine_requires_key() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "gm"),
            ("PEXELS_API_KEY", "px"),
            ("SHORTNOVA_TTS_ENGINE", "openai"),
        ]))
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_unknown_engine_is_a_configuration_error() {
        let result = AppConfig::from_lookup(lookup_from(&[("SHORTNOVA_TTS_ENGINE", "espeak")]));
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_keys_are_not_serialized() {
        let config = AppConfig {
            gemini_api_key: "secret-gemini".to_string(),
            pexels_api_key: "secret-pexels".to_string(),
            ..AppConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
