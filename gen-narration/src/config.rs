//! gen-narration configuration management.

use crate::audio::store::DEFAULT_URL_PREFIX;
use crate::text::chunker::DEFAULT_MAX_CHUNK_CHARS;
use crate::text::cleaner::MIN_CHAPTER_CHARS;
use crate::text::detector::{DEFAULT_SECTION_CHARS, DetectorOptions};
use crate::tts::AudioEncoding;
use crate::tts::google::{API_KEY_ENV, DEFAULT_ENDPOINT};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

// Default voice for Google Cloud TTS
const DEFAULT_LANGUAGE: &str = "en-US";
const DEFAULT_VOICE: &str = "en-US-Standard-C";
const DEFAULT_SPEAKING_RATE: f32 = 1.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenNarrationConfig {
    /// Voice language code
    #[serde(default = "default_language")]
    pub language_code: String,

    /// Provider voice name
    #[serde(default = "default_voice")]
    pub voice_name: String,

    /// Output audio encoding (mp3, ogg_opus, linear16)
    #[serde(default)]
    pub audio_encoding: AudioEncoding,

    /// Speaking rate (0.25-4.0)
    #[serde(default = "default_speaking_rate")]
    pub speaking_rate: f32,

    /// API key. None means read it from the environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Synthesis REST endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Maximum UTF-8 bytes of text per synthesis request
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Section size when a document has no chapter headings
    #[serde(default = "default_section_chars")]
    pub section_chars: usize,

    /// Chapters this short or shorter (trimmed) are skipped
    #[serde(default = "default_min_chapter_chars")]
    pub min_chapter_chars: usize,

    /// Timeout for a single synthesis request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Attempts per synthesis request before the chapter is given up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Where chapter audio is written. None means the data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// URL prefix reported as each chapter's audioUrl
    #[serde(default = "default_audio_url_prefix")]
    pub audio_url_prefix: String,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_speaking_rate() -> f32 {
    DEFAULT_SPEAKING_RATE
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_max_chunk_chars() -> usize {
    DEFAULT_MAX_CHUNK_CHARS
}

fn default_section_chars() -> usize {
    DEFAULT_SECTION_CHARS
}

fn default_min_chapter_chars() -> usize {
    MIN_CHAPTER_CHARS
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_audio_url_prefix() -> String {
    DEFAULT_URL_PREFIX.to_string()
}

impl Default for GenNarrationConfig {
    fn default() -> Self {
        Self {
            language_code: default_language(),
            voice_name: default_voice(),
            audio_encoding: AudioEncoding::default(),
            speaking_rate: default_speaking_rate(),
            api_key: None,
            endpoint: default_endpoint(),
            max_chunk_chars: default_max_chunk_chars(),
            section_chars: default_section_chars(),
            min_chapter_chars: default_min_chapter_chars(),
            request_timeout_secs: default_request_timeout_secs(),
            max_attempts: default_max_attempts(),
            output_dir: None,
            audio_url_prefix: default_audio_url_prefix(),
        }
    }
}

impl GenNarrationConfig {
    /// Get the config file path: ~/.config/cli-programs/gen-narration.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("cli-programs")
            .join("gen-narration.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: GenNarrationConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// API key from config, falling back to the environment.
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = self.api_key.clone().filter(|k| !k.is_empty()) {
            return Ok(key);
        }

        std::env::var(API_KEY_ENV).map_err(|_| {
            anyhow::anyhow!(
                "API key not found for Google Cloud TTS. Set {} or run 'gen-narration config set-api-key'.",
                API_KEY_ENV
            )
        })
    }

    /// Output directory, defaulting to <data dir>/gen-narration/audio.
    pub fn resolve_output_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.output_dir {
            return Ok(dir.clone());
        }

        dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .map(|d| d.join("gen-narration").join("audio"))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn detector_options(&self) -> DetectorOptions {
        DetectorOptions {
            section_chars: self.section_chars.max(1),
            min_chapter_chars: self.min_chapter_chars,
        }
    }
}
