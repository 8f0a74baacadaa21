//! Error types for extraction, synthesis, and narration jobs.

use std::time::Duration;
use thiserror::Error;

/// Failures from the document extraction step.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unsupported document type: {0}. Upload a PDF or Word document.")]
    UnsupportedType(String),

    #[error("Failed to extract text: {0}")]
    ExtractionFailed(String),
}

/// Failures from a single synthesis call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Invalid synthesis input: {0}")]
    InvalidInput(String),

    #[error("Synthesis timed out after {0:?}")]
    TimedOut(Duration),
}

impl SynthesisError {
    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SynthesisError::InvalidInput(_))
    }
}

/// Why a chapter ended up without audio. Never fatal for the job.
#[derive(Error, Debug)]
pub enum ChapterError {
    #[error("No speakable text left after sanitization")]
    EmptyAfterSanitize,

    #[error("Chunk {} of {total} failed: {source}", .sequence + 1)]
    ChunkSynthesisFailed {
        sequence: usize,
        total: usize,
        #[source]
        source: SynthesisError,
    },

    #[error("Failed to store chapter audio: {0}")]
    Storage(#[from] std::io::Error),
}

/// Errors that abort the whole narration job.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Unsupported document type: {0}. Upload a PDF or Word document.")]
    UnsupportedDocumentType(String),

    #[error("Failed to extract text: {0}")]
    ExtractionFailed(String),

    #[error("No text content could be extracted from the document")]
    NoContentExtracted,

    #[error("No chapters found in the document")]
    NoChaptersFound,

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl From<ExtractError> for JobError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::UnsupportedType(kind) => JobError::UnsupportedDocumentType(kind),
            ExtractError::ExtractionFailed(message) => JobError::ExtractionFailed(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_is_not_retryable() {
        assert!(!SynthesisError::InvalidInput("empty".into()).is_retryable());
        assert!(SynthesisError::SynthesisFailed("503".into()).is_retryable());
        assert!(SynthesisError::TimedOut(Duration::from_secs(1)).is_retryable());
    }

    #[test]
    fn test_extract_error_maps_to_job_error() {
        let err: JobError = ExtractError::UnsupportedType("image/png".into()).into();
        assert!(matches!(err, JobError::UnsupportedDocumentType(ref t) if t == "image/png"));

        let err: JobError = ExtractError::ExtractionFailed("bad zip".into()).into();
        assert_eq!(err.to_string(), "Failed to extract text: bad zip");
    }

    #[test]
    fn test_chapter_error_message() {
        let err = ChapterError::ChunkSynthesisFailed {
            sequence: 1,
            total: 3,
            source: SynthesisError::SynthesisFailed("HTTP 500".into()),
        };
        assert_eq!(
            err.to_string(),
            "Chunk 2 of 3 failed: Synthesis failed: HTTP 500"
        );
    }
}
