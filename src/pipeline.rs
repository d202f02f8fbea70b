//! The topic-to-video pipeline
//!
//! Four steps, strictly in order: script, voice, background, composition.
//! A script failure stops the run before any audio or video is produced.
//! A failed background fetch never does.

use chrono::Local;
use log::{error, info};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{PipelineArtifacts, PipelineProgress, PipelineStep};
use crate::services::merge::create_video;
use crate::services::script::ScriptGenerator;
use crate::services::tts::{SpeechSynthesizer, create_synthesizer};
use crate::services::video::fetch_video_from_pexels;
use crate::utils::common::ensure_dir;
use crate::utils::ffmpeg::{FfmpegProcessor, MediaProcessor};

/// Written next to the artifacts as `run.json`; credentials are never serialized
#[derive(Serialize)]
struct RunManifest<'a> {
    artifacts: &'a PipelineArtifacts,
    config: &'a AppConfig,
}

pub struct Pipeline {
    config: AppConfig,
    script_generator: ScriptGenerator,
    synthesizer: Box<dyn SpeechSynthesizer>,
    media: Box<dyn MediaProcessor>,
    progress_sender: Option<mpsc::Sender<PipelineProgress>>,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        let script_generator = ScriptGenerator::new(&config);
        let synthesizer = create_synthesizer(&config)?;
        Ok(Self {
            config,
            script_generator,
            synthesizer,
            media: Box::new(FfmpegProcessor::from_registry()),
            progress_sender: None,
        })
    }

    pub fn with_progress(mut self, sender: mpsc::Sender<PipelineProgress>) -> Self {
        self.progress_sender = Some(sender);
        self
    }

    /// Replace the ffmpeg/ffprobe backend
    pub fn with_media(mut self, media: Box<dyn MediaProcessor>) -> Self {
        self.media = media;
        self
    }

    async fn report(&self, step: PipelineStep, status: impl Into<String>, fraction: f32) -> AppResult<()> {
        if let Some(sender) = &self.progress_sender {
            sender
                .send(PipelineProgress::new(step, status, fraction))
                .await?;
        }
        Ok(())
    }

    /// Run every step for `topic`
    pub async fn run(&self, topic: &str) -> AppResult<PipelineArtifacts> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(AppError::Configuration("Topic must not be empty".to_string()));
        }

        let started_at = Local::now();
        info!("=== Pipeline started for topic '{}' ===", topic);
        ensure_dir(&self.config.output_dir).await?;

        // 1. Сценарий
        self.report(PipelineStep::ScriptGeneration, "Generating script...", 0.0)
            .await?;
        let script_path = self.config.script_path();
        let script = match self
            .script_generator
            .generate_script(topic, &script_path)
            .await
        {
            Ok(script) => script,
            Err(e) => {
                error!("Error generating script: {}", e);
                return Err(e);
            }
        };
        self.report(PipelineStep::ScriptGeneration, "Script generated", 1.0)
            .await?;

        // 2. Озвучка
        self.report(
            PipelineStep::SpeechSynthesis,
            format!("Generating voice ({})...", self.synthesizer.name()),
            0.0,
        )
        .await?;
        let voice_path = self.config.voice_path();
        self.synthesizer.save(&script, &voice_path).await?;
        self.report(PipelineStep::SpeechSynthesis, "Voice generated", 1.0)
            .await?;

        // 3. Фоновое видео
        self.report(PipelineStep::BackgroundFetch, "Fetching video from Pexels...", 0.0)
            .await?;
        let video_file = fetch_video_from_pexels(&self.config, topic).await?;
        let status = if video_file.is_some() {
            "Background video downloaded"
        } else {
            "No background video, using solid background"
        };
        self.report(PipelineStep::BackgroundFetch, status, 1.0).await?;

        // 4. Сборка
        self.report(PipelineStep::Composition, "Creating final video...", 0.0)
            .await?;
        let plan = create_video(
            self.media.as_ref(),
            &self.config,
            video_file.as_deref(),
            &voice_path,
        )
        .await?;
        self.report(PipelineStep::Composition, "Final video rendered", 1.0)
            .await?;

        let artifacts = PipelineArtifacts {
            topic: topic.to_string(),
            script,
            script_path,
            voice_path,
            background: plan.background,
            final_path: plan.output_path,
            audio_duration_secs: plan.audio_duration,
            started_at,
            finished_at: Local::now(),
        };

        self.write_manifest(&artifacts).await?;

        info!(
            "=== Pipeline finished in {}s ({}) ===",
            (artifacts.finished_at - artifacts.started_at).num_seconds(),
            if artifacts.background.is_stock() { "stock footage" } else { "solid background" }
        );
        Ok(artifacts)
    }

    async fn write_manifest(&self, artifacts: &PipelineArtifacts) -> AppResult<()> {
        let manifest = RunManifest {
            artifacts,
            config: &self.config,
        };
        let path = self.config.manifest_path();
        tokio::fs::write(&path, serde_json::to_vec_pretty(&manifest)?).await?;
        info!("Run manifest written to {}", path.display());
        Ok(())
    }
}
