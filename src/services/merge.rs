//! Composition of the narration over the background with ffmpeg

use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::models::Background;
use crate::utils::common::check_file_exists_and_valid;
use crate::utils::ffmpeg::{MediaProcessor, format_seconds};

const FALLBACK_FPS: u32 = 24;

/// Everything ffmpeg needs to render the final video
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionPlan {
    pub background: Background,
    /// Duration of the background clip; `None` for a solid background
    pub background_duration: Option<f64>,
    pub audio_path: PathBuf,
    pub audio_duration: f64,
    pub output_path: PathBuf,
}

impl CompositionPlan {
    /// The clip must be repeated when it ends before the narration does
    pub fn needs_loop(&self) -> bool {
        matches!(self.background_duration, Some(d) if d < self.audio_duration)
    }

    /// ffmpeg command line for this plan
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let duration = format_seconds(self.audio_duration);
        let mut args: Vec<String> = vec!["-y".to_string()];

        match &self.background {
            Background::StockFootage { path } => {
                if self.needs_loop() {
                    args.push("-stream_loop".to_string());
                    args.push("-1".to_string());
                }
                args.push("-i".to_string());
                args.push(path.to_string_lossy().into_owned());
            }
            Background::SolidColor {
                width,
                height,
                color,
            } => {
                for arg in ["-f", "lavfi", "-i"] {
                    args.push(arg.to_string());
                }
                args.push(format!(
                    "color=c={}:s={}x{}:r={}:d={}",
                    color, width, height, FALLBACK_FPS, duration
                ));
            }
        }

        args.push("-i".to_string());
        args.push(self.audio_path.to_string_lossy().into_owned());

        // Видео из первого входа, звук только из озвучки
        for arg in [
            "-map", "0:v:0", "-map", "1:a:0", "-c:v", "libx264", "-pix_fmt", "yuv420p", "-c:a",
            "aac", "-b:a", "192k", "-movflags", "+faststart", "-t",
        ] {
            args.push(arg.to_string());
        }
        args.push(duration);
        args.push(self.output_path.to_string_lossy().into_owned());

        args
    }
}

/// Decide what goes under the narration.
///
/// A clip that is missing, empty or unreadable by ffprobe is replaced by a
/// solid background of the configured size.
pub async fn plan_composition(
    media: &dyn MediaProcessor,
    config: &AppConfig,
    video_file: Option<&Path>,
    audio_path: &Path,
    output_path: &Path,
) -> AppResult<CompositionPlan> {
    let audio_duration = media.probe_duration(audio_path).await?;
    info!("Narration length: {:.2}s", audio_duration);

    let mut stock = None;
    if let Some(path) = video_file {
        if check_file_exists_and_valid(path).await {
            match media.probe_duration(path).await {
                Ok(d) => stock = Some((path.to_path_buf(), d)),
                Err(e) => warn!("Background clip is unreadable ({}), using solid background", e),
            }
        } else {
            warn!("Background clip {} is missing, using solid background", path.display());
        }
    }

    let (background, background_duration) = match stock {
        Some((path, d)) => (Background::StockFootage { path }, Some(d)),
        None => (solid_background(config), None),
    };

    Ok(CompositionPlan {
        background,
        background_duration,
        audio_path: audio_path.to_path_buf(),
        audio_duration,
        output_path: output_path.to_path_buf(),
    })
}

pub fn solid_background(config: &AppConfig) -> Background {
    Background::SolidColor {
        width: config.video_width,
        height: config.video_height,
        color: config.background_color.clone(),
    }
}

/// Render the final video and return the plan it was rendered from
pub async fn create_video(
    media: &dyn MediaProcessor,
    config: &AppConfig,
    video_file: Option<&Path>,
    audio_path: &Path,
) -> AppResult<CompositionPlan> {
    info!("Creating final video...");

    let output_path = config.final_video_path();
    let plan = plan_composition(media, config, video_file, audio_path, &output_path).await?;

    if plan.needs_loop() {
        info!(
            "Background clip ({:.2}s) is shorter than the narration, looping it",
            plan.background_duration.unwrap_or_default()
        );
    }

    media.run_ffmpeg(&plan.ffmpeg_args()).await?;

    if !check_file_exists_and_valid(&output_path).await {
        return Err(AppError::Composition(format!(
            "ffmpeg finished but {} was not written",
            output_path.display()
        )));
    }

    info!("Final video saved as {}", output_path.display());
    Ok(plan)
}
