use clap::Parser;
use log::{error, info};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use shortnova::config::{AppConfig, TtsEngine};
use shortnova::errors::{AppError, AppResult};
use shortnova::models::PipelineProgress;
use shortnova::utils::{logger, tools};
use shortnova::Pipeline;

#[derive(Parser, Debug)]
#[command(name = "shortnova")]
#[command(about = "Generate a narrated short video about a topic")]
#[command(version)]
struct Cli {
    /// Topic of the video; asked interactively when omitted
    #[arg(short, long)]
    topic: Option<String>,

    /// Directory for script.txt, voice.mp3, background.mp4 and final_video.mp4
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Speech engine: google or openai
    #[arg(long)]
    tts_engine: Option<TtsEngine>,

    /// Language code for the google engine
    #[arg(long)]
    lang: Option<String>,

    /// Slower speech (google engine)
    #[arg(long)]
    slow: bool,

    /// Gemini model used for the script
    #[arg(long)]
    model: Option<String>,

    /// Approximate script length in words
    #[arg(long)]
    words: Option<u32>,

    /// Do not look for ffmpeg/ffprobe before starting
    #[arg(long)]
    skip_tool_check: bool,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(engine) = self.tts_engine {
            config.tts.engine = engine;
        }
        if let Some(lang) = &self.lang {
            config.tts.language = lang.clone();
        }
        if self.slow {
            config.tts.slow = true;
        }
        if let Some(model) = &self.model {
            config.gemini_model = model.clone();
        }
        if let Some(words) = self.words {
            config.script_words = words;
        }
    }
}

async fn prompt_topic() -> AppResult<String> {
    print!("Enter topic for video: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;

    let topic = line.trim().to_string();
    if topic.is_empty() {
        return Err(AppError::Configuration("Topic must not be empty".to_string()));
    }
    Ok(topic)
}

async fn run(cli: Cli) -> AppResult<PathBuf> {
    let mut config = AppConfig::from_env()?;
    cli.apply(&mut config);
    config.validate()?;

    if !cli.skip_tool_check {
        for tool in tools::ensure_tools().await? {
            info!("Using {} {} ({})", tool.name, tool.version, tool.path.display());
        }
    }

    let topic = match cli.topic {
        Some(topic) => topic,
        None => prompt_topic().await?,
    };

    let (tx, mut rx) = mpsc::channel::<PipelineProgress>(16);
    let printer = tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            println!("{} - {} ({:.0}%)", update.step, update.status, update.progress);
        }
    });

    let pipeline = Pipeline::new(config)?.with_progress(tx);
    let result = pipeline.run(&topic).await;

    // Дожидаемся вывода оставшихся сообщений о прогрессе
    drop(pipeline);
    let _ = printer.await;

    let artifacts = result?;
    info!("Script: {}", artifacts.script);
    Ok(artifacts.final_path)
}

#[tokio::main]
async fn main() -> ExitCode {
    logger::init_logger();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(final_path) => {
            println!("Pipeline complete! Check {}", final_path.display());
            ExitCode::SUCCESS
        }
        Err(e @ (AppError::ScriptGeneration(_) | AppError::EmptyScript)) => {
            error!("{}", e);
            println!("Script generation failed. Exiting.");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
