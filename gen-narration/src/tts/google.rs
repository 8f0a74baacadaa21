//! Google Cloud Text-to-Speech backend
//!
//! Direct HTTP implementation of the `text:synthesize` REST method.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{SpeechSynthesizer, VoiceConfig};
use crate::error::SynthesisError;

/// Default REST endpoint for synthesis requests.
pub const DEFAULT_ENDPOINT: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "GOOGLE_TTS_API_KEY";

/// Provider for Google Cloud Text-to-Speech.
pub struct GoogleTtsSynthesizer {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl GoogleTtsSynthesizer {
    /// Create a new Google TTS client.
    pub fn new(endpoint: &str, api_key: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            api_key,
            client,
        })
    }
}

// Google TTS request/response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    speaking_rate: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

fn build_request<'a>(text: &'a str, voice: &'a VoiceConfig) -> SynthesizeRequest<'a> {
    SynthesizeRequest {
        input: SynthesisInput { text },
        voice: VoiceSelection {
            language_code: &voice.language_code,
            name: &voice.voice_name,
        },
        audio_config: AudioConfig {
            audio_encoding: voice.encoding.api_name(),
            speaking_rate: voice.speaking_rate,
        },
    }
}

fn decode_audio(response: SynthesizeResponse) -> Result<Vec<u8>, SynthesisError> {
    let audio = STANDARD
        .decode(response.audio_content.as_bytes())
        .map_err(|e| SynthesisError::SynthesisFailed(format!("Invalid audio payload: {}", e)))?;

    if audio.is_empty() {
        return Err(SynthesisError::SynthesisFailed(
            "Provider returned no audio".to_string(),
        ));
    }
    Ok(audio)
}

#[async_trait]
impl SpeechSynthesizer for GoogleTtsSynthesizer {
    async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> Result<Vec<u8>, SynthesisError> {
        if text.trim().is_empty() {
            return Err(SynthesisError::InvalidInput("text is empty".to_string()));
        }

        let request = build_request(text, voice);
        debug!(
            "Requesting {} chars of {} audio from {}",
            text.chars().count(),
            voice.encoding,
            voice.voice_name
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SynthesisError::SynthesisFailed(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message =
                if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                    error_response.error.message
                } else {
                    error_text
                };

            // 400 means the provider rejected the text itself
            if status.as_u16() == 400 {
                return Err(SynthesisError::InvalidInput(message));
            }

            return Err(SynthesisError::SynthesisFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                message
            )));
        }

        let body: SynthesizeResponse = response.json().await.map_err(|e| {
            SynthesisError::SynthesisFailed(format!("Failed to parse response: {}", e))
        })?;

        decode_audio(body)
    }

    fn name(&self) -> &'static str {
        "Google Cloud TTS"
    }
}
