//! Narration job orchestration.
//!
//! One job takes one document through extraction, chapter detection and
//! per-chapter synthesis. Chapters are narrated one at a time in detection
//! order. A chapter that fails synthesis is reported without audio and the
//! job carries on; only extraction and detection failures abort the job.

use crate::audio::{AudioAssembler, AudioStore, estimate_duration_secs};
use crate::document::{self, Document, DocumentKind};
use crate::error::{ChapterError, JobError};
use crate::text::{Chapter, DetectorOptions, detect_chapters};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Outcome for one chapter as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterSummary {
    pub id: String,
    pub title: String,
    /// Where the chapter audio is served; `null` when synthesis failed
    pub audio_url: Option<String>,
    pub duration_seconds: u64,
    /// Why the chapter has no audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of a completed narration job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub success: bool,
    pub message: String,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub file_type: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub chapters: Vec<ChapterSummary>,
    pub total_chapters: usize,
    pub audio_generated_count: usize,
}

impl JobResult {
    /// Build a result from chapter outcomes in detection order.
    pub fn from_chapters(chapters: Vec<ChapterSummary>) -> Self {
        let total_chapters = chapters.len();
        let audio_generated_count = chapters.iter().filter(|c| c.audio_url.is_some()).count();

        Self {
            success: true,
            message: format!(
                "Processed {} chapter(s), generated audio for {}",
                total_chapters, audio_generated_count
            ),
            file_name: None,
            file_size: None,
            file_type: None,
            uploaded_at: Utc::now(),
            chapters,
            total_chapters,
            audio_generated_count,
        }
    }

    /// Attach details of the source document.
    pub fn with_document(mut self, document: &Document) -> Self {
        self.file_name = Some(document.file_name.clone());
        self.file_size = Some(document.size());
        self.file_type = Some(document.mime_type.clone());
        self
    }
}

/// Body returned when a job fails outright.
#[derive(Debug, Clone, Serialize)]
pub struct JobFailure {
    pub success: bool,
    pub error: String,
}

impl JobFailure {
    pub fn new(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            error: error.to_string(),
        }
    }
}

/// Progress after each chapter finishes.
#[derive(Debug)]
pub struct ChapterProgress<'a> {
    pub completed: usize,
    pub total: usize,
    pub chapter: &'a ChapterSummary,
}

/// Runs narration jobs against one output directory.
pub struct NarrationPipeline {
    assembler: AudioAssembler,
    store: AudioStore,
    detector: DetectorOptions,
}

impl NarrationPipeline {
    pub fn new(assembler: AudioAssembler, store: AudioStore) -> Self {
        Self {
            assembler,
            store,
            detector: DetectorOptions::default(),
        }
    }

    /// Set chapter detection options.
    pub fn with_detector_options(mut self, options: DetectorOptions) -> Self {
        self.detector = options;
        self
    }

    #[cfg(test)]
    pub fn store(&self) -> &AudioStore {
        &self.store
    }

    /// Narrate an uploaded document.
    ///
    /// Unsupported types are rejected before any extraction is attempted.
    pub async fn process_document<F>(
        &self,
        document: &Document,
        on_progress: F,
    ) -> Result<JobResult, JobError>
    where
        F: FnMut(ChapterProgress<'_>),
    {
        let kind = DocumentKind::from_mime(&document.mime_type)?;
        info!(
            "Extracting text from {} ({:?}, {} bytes)",
            document.file_name,
            kind,
            document.size()
        );

        let text = document::extract(&document.bytes, kind.mime_type())?;
        self.run(&text, Some(document), on_progress).await
    }

    /// Narrate text that has already been extracted.
    #[cfg(test)]
    pub async fn process_text<F>(&self, text: &str, on_progress: F) -> Result<JobResult, JobError>
    where
        F: FnMut(ChapterProgress<'_>),
    {
        self.run(text, None, on_progress).await
    }

    async fn run<F>(
        &self,
        text: &str,
        source: Option<&Document>,
        mut on_progress: F,
    ) -> Result<JobResult, JobError>
    where
        F: FnMut(ChapterProgress<'_>),
    {
        if text.trim().is_empty() {
            return Err(JobError::NoContentExtracted);
        }

        let chapters = detect_chapters(text, &self.detector);
        if chapters.is_empty() {
            return Err(JobError::NoChaptersFound);
        }
        info!(
            "Narrating {} chapter(s) with {} into {}",
            chapters.len(),
            self.assembler.synthesizer_name(),
            self.store.dir().display()
        );

        self.store.prepare()?;

        let total = chapters.len();
        let mut summaries = Vec::with_capacity(total);

        for (index, chapter) in chapters.iter().enumerate() {
            debug!("{} \"{}\": {} words", chapter.id, chapter.title, chapter.word_count());
            let outcome = self.narrate(chapter).await;
            let summary = summarize(chapter, outcome);
            on_progress(ChapterProgress {
                completed: index + 1,
                total,
                chapter: &summary,
            });
            summaries.push(summary);
        }

        let mut result = JobResult::from_chapters(summaries);
        if let Some(document) = source {
            result = result.with_document(document);
        }

        self.store.write_manifest(&result)?;
        info!("{}", result.message);

        Ok(result)
    }

    async fn narrate(&self, chapter: &Chapter) -> Result<String, ChapterError> {
        let audio = self.assembler.narrate_chapter(chapter).await?;
        self.store.write_audio(&chapter.id, &audio).await?;
        Ok(self.store.audio_url(&chapter.id))
    }
}

fn summarize(chapter: &Chapter, outcome: Result<String, ChapterError>) -> ChapterSummary {
    let duration_seconds = estimate_duration_secs(&chapter.content);

    let (audio_url, error) = match outcome {
        Ok(url) => (Some(url), None),
        Err(e) => {
            warn!("{} \"{}\" has no audio: {}", chapter.id, chapter.title, e);
            (None, Some(e.to_string()))
        }
    };

    ChapterSummary {
        id: chapter.id.clone(),
        title: chapter.title.clone(),
        audio_url,
        duration_seconds,
        error,
    }
}
