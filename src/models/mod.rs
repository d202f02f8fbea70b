// Data models shared between pipeline steps

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Этапы пайплайна, в порядке выполнения
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    ScriptGeneration,
    SpeechSynthesis,
    BackgroundFetch,
    Composition,
}

impl PipelineStep {
    pub const ALL: [PipelineStep; 4] = [
        PipelineStep::ScriptGeneration,
        PipelineStep::SpeechSynthesis,
        PipelineStep::BackgroundFetch,
        PipelineStep::Composition,
    ];

    /// 1-based position, used in "[2/4]" style status lines
    pub fn ordinal(&self) -> usize {
        match self {
            PipelineStep::ScriptGeneration => 1,
            PipelineStep::SpeechSynthesis => 2,
            PipelineStep::BackgroundFetch => 3,
            PipelineStep::Composition => 4,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PipelineStep::ScriptGeneration => "Generating script",
            PipelineStep::SpeechSynthesis => "Generating voice",
            PipelineStep::BackgroundFetch => "Fetching background video",
            PipelineStep::Composition => "Creating final video",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.ordinal(), Self::ALL.len(), self.description())
    }
}

/// Progress of a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineProgress {
    pub step: PipelineStep,
    pub status: String,
    /// Overall progress, 0.0 - 100.0
    pub progress: f32,
}

impl PipelineProgress {
    pub fn new(step: PipelineStep, status: impl Into<String>, step_fraction: f32) -> Self {
        let done = (step.ordinal() - 1) as f32;
        let total = PipelineStep::ALL.len() as f32;
        let progress = ((done + step_fraction.clamp(0.0, 1.0)) / total) * 100.0;
        Self {
            step,
            status: status.into(),
            progress,
        }
    }
}

/// What the narration is laid over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Background {
    /// Downloaded stock clip
    StockFootage { path: PathBuf },
    /// Flat color frame, used when no clip could be fetched
    SolidColor {
        width: u32,
        height: u32,
        color: String,
    },
}

impl Background {
    pub fn is_stock(&self) -> bool {
        matches!(self, Background::StockFootage { .. })
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineArtifacts {
    pub topic: String,
    pub script: String,
    pub script_path: PathBuf,
    pub voice_path: PathBuf,
    pub background: Background,
    pub final_path: PathBuf,
    pub audio_duration_secs: f64,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_spans_steps() {
        let first = PipelineProgress::new(PipelineStep::ScriptGeneration, "start", 0.0);
        assert_eq!(first.progress, 0.0);

        let mid = PipelineProgress::new(PipelineStep::SpeechSynthesis, "half", 0.5);
        assert!((mid.progress - 37.5).abs() < f32::EPSILON);

        let last = PipelineProgress::new(PipelineStep::Composition, "done", 1.0);
        assert_eq!(last.progress, 100.0);
    }

    #[test]
    fn test_step_display() {
        assert_eq!(
            PipelineStep::BackgroundFetch.to_string(),
            "[3/4] Fetching background video"
        );
    }

    #[test]
    fn test_background_serializes_with_kind_tag() {
        let bg = Background::SolidColor {
            width: 1280,
            height: 720,
            color: "black".to_string(),
        };
        let json = serde_json::to_value(&bg).unwrap();
        assert_eq!(json["kind"], "solid_color");
        assert_eq!(json["width"], 1280);
        assert!(!bg.is_stock());
    }
}
