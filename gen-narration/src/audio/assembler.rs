//! Per-chapter audio assembly.
//!
//! A chapter is sanitized, split into chunks, and each chunk is synthesized
//! in sequence order. The returned bytes are the chunk audio concatenated in
//! that order. Any chunk that still fails after retries fails the whole
//! chapter; nothing is partially assembled.

use crate::error::{ChapterError, SynthesisError};
use crate::text::cleaner::sanitize_for_synthesis;
use crate::text::{Chapter, TextChunk, chunker};
use crate::tts::{SpeechSynthesizer, VoiceConfig};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

/// Default time allowed for one synthesis call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Retry behavior around each synthesis call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Default backoff with the given number of attempts (at least one).
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        Duration::from_secs_f32(
            (delay.as_secs_f32() * self.backoff_factor).min(self.max_delay.as_secs_f32()),
        )
    }
}

/// Turns chapters into audio using an injected synthesis backend.
pub struct AudioAssembler {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    voice: VoiceConfig,
    max_chunk_chars: usize,
    request_timeout: Duration,
    retry: RetryPolicy,
}

impl AudioAssembler {
    /// Create an assembler with default chunk size, timeout, and retries.
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, voice: VoiceConfig) -> Self {
        Self {
            synthesizer,
            voice,
            max_chunk_chars: chunker::DEFAULT_MAX_CHUNK_CHARS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Set the maximum chunk size in UTF-8 bytes.
    pub fn with_max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.max_chunk_chars = max_chunk_chars.max(1);
        self
    }

    /// Set the per-call timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn synthesizer_name(&self) -> &'static str {
        self.synthesizer.name()
    }

    /// Sanitize a chapter and split it into ordered chunks.
    pub fn prepare_chunks(&self, chapter: &Chapter) -> Result<Vec<TextChunk>, ChapterError> {
        let text = sanitize_for_synthesis(&chapter.content);
        let chunks = chunker::split_chapter(&chapter.id, &text, self.max_chunk_chars);

        if chunks.is_empty() {
            return Err(ChapterError::EmptyAfterSanitize);
        }
        Ok(chunks)
    }

    /// Synthesize and concatenate a chapter.
    pub async fn narrate_chapter(&self, chapter: &Chapter) -> Result<Vec<u8>, ChapterError> {
        let chunks = self.prepare_chunks(chapter)?;
        debug!("{}: {} chunk(s)", chapter.id, chunks.len());
        self.assemble(&chunks).await
    }

    /// Synthesize chunks one at a time in sequence order and concatenate the audio.
    pub async fn assemble(&self, chunks: &[TextChunk]) -> Result<Vec<u8>, ChapterError> {
        if chunks.is_empty() {
            return Err(ChapterError::EmptyAfterSanitize);
        }

        let mut ordered: Vec<&TextChunk> = chunks.iter().collect();
        ordered.sort_by_key(|c| c.sequence);

        let total = ordered.len();
        let mut audio = Vec::new();

        for chunk in ordered {
            let bytes = self
                .synthesize_with_retry(chunk, total)
                .await
                .map_err(|source| ChapterError::ChunkSynthesisFailed {
                    sequence: chunk.sequence,
                    total,
                    source,
                })?;
            audio.extend_from_slice(&bytes);
        }

        Ok(audio)
    }

    async fn synthesize_with_retry(
        &self,
        chunk: &TextChunk,
        total: usize,
    ) -> Result<Vec<u8>, SynthesisError> {
        let mut attempt = 0;
        let mut delay = self.retry.initial_delay;

        loop {
            attempt += 1;

            match self.synthesize_once(&chunk.text).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    if !e.is_retryable() || attempt >= self.retry.max_attempts {
                        return Err(e);
                    }

                    warn!(
                        "{} chunk {}/{} failed (attempt {}/{}): {}. Retrying in {:?}",
                        chunk.chapter_id,
                        chunk.sequence + 1,
                        total,
                        attempt,
                        self.retry.max_attempts,
                        e,
                        delay
                    );

                    tokio::time::sleep(delay).await;
                    delay = self.retry.next_delay(delay);
                }
            }
        }
    }

    async fn synthesize_once(&self, text: &str) -> Result<Vec<u8>, SynthesisError> {
        tokio::time::timeout(
            self.request_timeout,
            self.synthesizer.synthesize(text, &self.voice),
        )
        .await
        .map_err(|_| SynthesisError::TimedOut(self.request_timeout))?
    }
}
