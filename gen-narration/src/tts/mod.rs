//! Speech synthesis backend trait and voice settings.

pub mod google;
#[cfg(test)]
pub mod mock;

use crate::config::GenNarrationConfig;
use crate::error::SynthesisError;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Audio encodings the provider can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AudioEncoding {
    #[default]
    Mp3,
    OggOpus,
    Linear16,
}

/// Parses encoding names as used on the command line and in config.
impl FromStr for AudioEncoding {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "ogg" | "ogg_opus" | "opus" => Ok(Self::OggOpus),
            "wav" | "linear16" | "pcm" => Ok(Self::Linear16),
            _ => anyhow::bail!("Unknown audio encoding: {} (expected mp3, ogg_opus or linear16)", s),
        }
    }
}

impl AudioEncoding {
    /// Name the provider's API expects.
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::Mp3 => "MP3",
            Self::OggOpus => "OGG_OPUS",
            Self::Linear16 => "LINEAR16",
        }
    }

    /// File extension for stored audio.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::OggOpus => "ogg",
            Self::Linear16 => "wav",
        }
    }

    /// MIME type of the stored audio.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::OggOpus => "audio/ogg",
            Self::Linear16 => "audio/wav",
        }
    }
}

impl fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mp3 => "mp3",
            Self::OggOpus => "ogg_opus",
            Self::Linear16 => "linear16",
        };
        f.write_str(name)
    }
}

/// Voice parameters sent with every synthesis request.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceConfig {
    /// BCP-47 language code, e.g. "en-US"
    pub language_code: String,
    /// Provider voice name, e.g. "en-US-Standard-C"
    pub voice_name: String,
    /// Output audio encoding
    pub encoding: AudioEncoding,
    /// Speaking rate (0.25-4.0, default 1.0)
    pub speaking_rate: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            language_code: "en-US".to_string(),
            voice_name: "en-US-Standard-C".to_string(),
            encoding: AudioEncoding::Mp3,
            speaking_rate: 1.0,
        }
    }
}

impl VoiceConfig {
    /// Create voice settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the language code.
    pub fn with_language(mut self, language_code: impl Into<String>) -> Self {
        self.language_code = language_code.into();
        self
    }

    /// Set the voice name.
    pub fn with_voice(mut self, voice_name: impl Into<String>) -> Self {
        self.voice_name = voice_name.into();
        self
    }

    /// Set the audio encoding.
    pub fn with_encoding(mut self, encoding: AudioEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the speaking rate.
    pub fn with_speaking_rate(mut self, rate: f32) -> Self {
        self.speaking_rate = rate.clamp(0.25, 4.0);
        self
    }

    /// Voice settings from the stored configuration.
    pub fn from_config(config: &GenNarrationConfig) -> Self {
        Self::new()
            .with_language(config.language_code.clone())
            .with_voice(config.voice_name.clone())
            .with_encoding(config.audio_encoding)
            .with_speaking_rate(config.speaking_rate)
    }
}

/// Text-to-speech provider.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize one chunk of text into encoded audio bytes.
    async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> Result<Vec<u8>, SynthesisError>;

    /// Provider name for display.
    fn name(&self) -> &'static str;
}

/// Create the configured synthesis backend.
pub fn create_synthesizer(config: &GenNarrationConfig) -> Result<Box<dyn SpeechSynthesizer>> {
    let api_key = config.resolve_api_key()?;
    Ok(Box::new(google::GoogleTtsSynthesizer::new(
        &config.endpoint,
        api_key,
    )?))
}
