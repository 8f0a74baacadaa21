//! gen-narration - Turn PDF and Word documents into narrated chapter audio

mod audio;
mod config;
mod document;
mod error;
mod pipeline;
mod text;
mod tts;

use anyhow::{Context, Result};
use audio::{AudioAssembler, AudioLookup, AudioStore, RetryPolicy};
use clap::{Parser, Subcommand};
use config::GenNarrationConfig;
use document::Document;
use indicatif::{ProgressBar, ProgressStyle};
use pipeline::{JobFailure, JobResult, NarrationPipeline};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tts::{AudioEncoding, VoiceConfig};

#[derive(Parser, Debug)]
#[command(name = "gen-narration")]
#[command(about = "Turn PDF and Word documents into narrated chapter audio", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the PDF or Word document
    document: Option<PathBuf>,

    /// Directory for chapter audio (default: from config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the MIME type inferred from the file extension
    #[arg(long)]
    mime: Option<String>,

    /// Voice name (e.g., en-US-Wavenet-D)
    #[arg(long)]
    voice: Option<String>,

    /// Voice language code (e.g., en-GB)
    #[arg(long)]
    language: Option<String>,

    /// Audio encoding (mp3, ogg_opus, linear16)
    #[arg(long)]
    encoding: Option<String>,

    /// Speaking rate (0.25-4.0)
    #[arg(long)]
    rate: Option<f32>,

    /// Maximum bytes of text per synthesis request
    #[arg(long)]
    max_chunk_chars: Option<usize>,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Look up the audio generated for a chapter
    Audio {
        /// Chapter id (e.g., chapter-3)
        id: String,

        /// Audio directory (default: from config)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default voice name
    SetVoice {
        /// Voice name (e.g., en-US-Standard-C)
        name: String,
    },
    /// Set default language code
    SetLanguage {
        /// Language code (e.g., en-US)
        code: String,
    },
    /// Set default audio encoding
    SetEncoding {
        /// mp3, ogg_opus or linear16
        encoding: String,
    },
    /// Set maximum bytes of text per synthesis request
    SetChunkSize {
        /// Bytes per request
        chars: usize,
    },
    /// Store the Google Cloud TTS API key
    SetApiKey {
        /// API key
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    // Handle subcommands
    match &args.command {
        Some(Commands::Config { action }) => {
            return handle_config_command(action);
        }
        Some(Commands::Audio { id, dir }) => {
            return handle_audio_command(id, dir.as_deref());
        }
        None => {}
    }

    match run_job(&args).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&JobFailure::new(format!("{:#}", e)))?
            );
            std::process::exit(1);
        }
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

/// Narrate one document and return the job result.
async fn run_job(args: &Args) -> Result<JobResult> {
    let document_path = args.document.clone().ok_or_else(|| {
        anyhow::anyhow!("Document path is required. Run 'gen-narration --help' for usage.")
    })?;

    if !document_path.exists() {
        anyhow::bail!("Document not found: {}", document_path.display());
    }

    // Load configuration and apply command-line overrides
    let mut config = GenNarrationConfig::load().context("Failed to load configuration")?;
    apply_overrides(&mut config, args)?;

    let output_dir = match &args.output {
        Some(dir) => dir.clone(),
        None => config.resolve_output_dir()?,
    };

    if args.debug {
        eprintln!("Document: {}", document_path.display());
        eprintln!("Output: {}", output_dir.display());
        eprintln!("Voice: {} ({})", config.voice_name, config.language_code);
        eprintln!("Encoding: {}", config.audio_encoding);
        eprintln!("Speaking rate: {}", config.speaking_rate);
        eprintln!("Max chunk chars: {}", config.max_chunk_chars);
    }

    let document = Document::from_path(&document_path, args.mime.as_deref())?;
    eprintln!(
        "Processing: {} ({}, {:.1} KB)",
        document.file_name,
        document.mime_type,
        document.size() as f64 / 1024.0
    );

    // The synthesis client is built once and shared with the assembler
    let synthesizer: Arc<dyn tts::SpeechSynthesizer> =
        Arc::from(tts::create_synthesizer(&config).context("Failed to create synthesis backend")?);

    let assembler = AudioAssembler::new(synthesizer, VoiceConfig::from_config(&config))
        .with_max_chunk_chars(config.max_chunk_chars)
        .with_request_timeout(config.request_timeout())
        .with_retry(RetryPolicy::with_attempts(config.max_attempts));

    let store = AudioStore::new(&output_dir, config.audio_encoding)
        .with_url_prefix(config.audio_url_prefix.clone());

    let pipeline =
        NarrationPipeline::new(assembler, store).with_detector_options(config.detector_options());

    // Chapter count is known only after detection
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );

    let result = pipeline
        .process_document(&document, |progress| {
            pb.set_length(progress.total as u64);
            pb.set_position(progress.completed as u64);
            pb.set_message(progress.chapter.title.clone());
        })
        .await;

    match &result {
        Ok(_) => pb.finish_with_message("Narration complete!"),
        Err(_) => pb.finish_and_clear(),
    }
    let result = result?;

    eprintln!(
        "Chapters: {}, with audio: {}",
        result.total_chapters, result.audio_generated_count
    );
    for chapter in result.chapters.iter().filter(|c| c.audio_url.is_none()) {
        eprintln!(
            "  {} ({}): {}",
            chapter.id,
            chapter.title,
            chapter.error.as_deref().unwrap_or("no audio")
        );
    }
    eprintln!("Output: {}", output_dir.display());

    Ok(result)
}

fn apply_overrides(config: &mut GenNarrationConfig, args: &Args) -> Result<()> {
    if let Some(voice) = &args.voice {
        config.voice_name = voice.clone();
    }
    if let Some(language) = &args.language {
        config.language_code = language.clone();
    }
    if let Some(encoding) = &args.encoding {
        config.audio_encoding = encoding.parse()?;
    }
    if let Some(rate) = args.rate {
        config.speaking_rate = rate.clamp(0.25, 4.0);
    }
    if let Some(chars) = args.max_chunk_chars {
        config.max_chunk_chars = chars.max(1);
    }
    Ok(())
}

fn handle_audio_command(id: &str, dir: Option<&Path>) -> Result<()> {
    let config = GenNarrationConfig::load().context("Failed to load configuration")?;
    let dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => config.resolve_output_dir()?,
    };

    let store = AudioStore::new(dir, config.audio_encoding);
    log::debug!("Looking up {} in {}", id, store.dir().display());
    match store.lookup(id)? {
        AudioLookup::Available(path) => {
            let encoding = path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::parse::<AudioEncoding>)
                .transpose()?
                .unwrap_or(config.audio_encoding);
            eprintln!("Content-Type: {}", encoding.mime_type());
            println!("{}", path.display());
            Ok(())
        }
        AudioLookup::NotGenerated => {
            anyhow::bail!("Audio not found: {} has no audio (synthesis failed)", id)
        }
        AudioLookup::UnknownId => {
            anyhow::bail!("Audio not found: no chapter {} in {}", id, store.dir().display())
        }
        AudioLookup::InvalidId => anyhow::bail!("Invalid chapter id: {}", id),
    }
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = GenNarrationConfig::load()?;
            println!("Configuration file: {:?}", GenNarrationConfig::config_path()?);
            println!();
            println!("language_code = \"{}\"", config.language_code);
            println!("voice_name = \"{}\"", config.voice_name);
            println!("audio_encoding = \"{}\"", config.audio_encoding);
            println!("speaking_rate = {}", config.speaking_rate);
            if config.api_key.is_some() {
                println!("api_key = (set)");
            } else {
                println!("api_key = (from ${})", tts::google::API_KEY_ENV);
            }
            println!("endpoint = \"{}\"", config.endpoint);
            println!("max_chunk_chars = {}", config.max_chunk_chars);
            println!("section_chars = {}", config.section_chars);
            println!("min_chapter_chars = {}", config.min_chapter_chars);
            println!("request_timeout_secs = {}", config.request_timeout_secs);
            println!("max_attempts = {}", config.max_attempts);
            match &config.output_dir {
                Some(dir) => println!("output_dir = \"{}\"", dir.display()),
                None => println!("output_dir = (default: {})", config.resolve_output_dir()?.display()),
            }
            println!("audio_url_prefix = \"{}\"", config.audio_url_prefix);
        }
        ConfigAction::SetVoice { name } => {
            let mut config = GenNarrationConfig::load()?;
            config.voice_name = name.clone();
            config.save()?;
            println!("Default voice set to: {}", name);
        }
        ConfigAction::SetLanguage { code } => {
            let mut config = GenNarrationConfig::load()?;
            config.language_code = code.clone();
            config.save()?;
            println!("Default language set to: {}", code);
        }
        ConfigAction::SetEncoding { encoding } => {
            let mut config = GenNarrationConfig::load()?;
            config.audio_encoding = encoding.parse()?;
            config.save()?;
            println!("Default encoding set to: {}", config.audio_encoding);
        }
        ConfigAction::SetChunkSize { chars } => {
            let mut config = GenNarrationConfig::load()?;
            config.max_chunk_chars = (*chars).max(1);
            config.save()?;
            println!("Max chunk size set to: {} bytes", config.max_chunk_chars);
        }
        ConfigAction::SetApiKey { key } => {
            let mut config = GenNarrationConfig::load()?;
            config.api_key = Some(key.clone());
            config.save()?;
            println!("API key saved to {:?}", GenNarrationConfig::config_path()?);
        }
    }
    Ok(())
}
