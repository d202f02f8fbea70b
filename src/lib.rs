//! shortnova: turn a topic into a narrated short video.
//!
//! A script comes from Gemini, the voice from a TTS engine, the footage from
//! Pexels, and ffmpeg puts them together.

pub mod config;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;

pub use config::AppConfig;
pub use errors::{AppError, AppResult};
pub use pipeline::Pipeline;
