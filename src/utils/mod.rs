pub mod common;
pub mod ffmpeg;
pub mod logger;
pub mod tools;
