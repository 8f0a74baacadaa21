//! Mock synthesizer for testing
//!
//! Echoes the chunk text back as "audio" so tests can check concatenation
//! order, and can be told to fail on particular calls or texts.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{SpeechSynthesizer, VoiceConfig};
use crate::error::SynthesisError;

/// A mock provider for testing ordering, retries, and failure isolation
pub struct MockSynthesizer {
    /// Number of leading calls that fail before the provider recovers
    fail_count: AtomicUsize,
    /// Current call count
    call_count: AtomicUsize,
    /// Error to return on failure
    fail_with: SynthesisError,
    /// Fail whenever the chunk text contains this marker
    fail_on_text: Option<String>,
    /// Artificial latency per call
    delay: Option<Duration>,
    /// Every text received, in call order
    received: Mutex<Vec<String>>,
}

impl MockSynthesizer {
    /// Create a provider that always succeeds
    pub fn always_succeeds() -> Self {
        Self {
            fail_count: AtomicUsize::new(0),
            call_count: AtomicUsize::new(0),
            fail_with: SynthesisError::SynthesisFailed("mock failure".to_string()),
            fail_on_text: None,
            delay: None,
            received: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that always fails with the given error
    pub fn always_fails(error: SynthesisError) -> Self {
        Self {
            fail_count: AtomicUsize::new(usize::MAX),
            fail_with: error,
            ..Self::always_succeeds()
        }
    }

    /// Create a provider that fails `n` times with the given error, then succeeds
    pub fn fails_then_succeeds(n: usize, error: SynthesisError) -> Self {
        Self {
            fail_count: AtomicUsize::new(n),
            fail_with: error,
            ..Self::always_succeeds()
        }
    }

    /// Create a provider that fails any chunk containing `marker`
    pub fn fails_on_text(marker: &str) -> Self {
        Self {
            fail_on_text: Some(marker.to_string()),
            ..Self::always_succeeds()
        }
    }

    /// Sleep for `delay` before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get the number of times synthesize() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Texts received so far, in call order
    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str, _voice: &VoiceConfig) -> Result<Vec<u8>, SynthesisError> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.received.lock().unwrap().push(text.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if call_num < self.fail_count.load(Ordering::SeqCst) {
            return Err(self.fail_with.clone());
        }

        if let Some(marker) = &self.fail_on_text {
            if text.contains(marker.as_str()) {
                return Err(self.fail_with.clone());
            }
        }

        Ok(text.as_bytes().to_vec())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_always_succeeds() {
        let synth = MockSynthesizer::always_succeeds();
        let audio = synth.synthesize("hello", &VoiceConfig::default()).await.unwrap();
        assert_eq!(audio, b"hello");
        assert_eq!(synth.call_count(), 1);
        assert_eq!(synth.received(), vec!["hello"]);
    }

    #[tokio::test]
    async fn test_always_fails() {
        let synth = MockSynthesizer::always_fails(SynthesisError::SynthesisFailed("down".into()));
        for _ in 0..3 {
            assert!(synth.synthesize("x", &VoiceConfig::default()).await.is_err());
        }
        assert_eq!(synth.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fails_then_succeeds() {
        let synth =
            MockSynthesizer::fails_then_succeeds(2, SynthesisError::SynthesisFailed("busy".into()));
        let voice = VoiceConfig::default();

        assert!(synth.synthesize("a", &voice).await.is_err());
        assert!(synth.synthesize("a", &voice).await.is_err());
        assert!(synth.synthesize("a", &voice).await.is_ok());
        assert_eq!(synth.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fails_on_text() {
        let synth = MockSynthesizer::fails_on_text("BROKEN");
        let voice = VoiceConfig::default();

        assert!(synth.synthesize("fine text", &voice).await.is_ok());
        assert!(synth.synthesize("a BROKEN chunk", &voice).await.is_err());
    }
}
