//! Text processing for narration: chapter detection, chunking, and cleaning.

pub mod chunker;
pub mod cleaner;
pub mod detector;

pub use detector::{DetectorOptions, detect_chapters};

/// A titled span of the document treated as one narration unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// Stable id within a job (`chapter-<n>` or `section-<n>`)
    pub id: String,
    /// Display title
    pub title: String,
    /// Raw chapter text
    pub content: String,
}

impl Chapter {
    /// Create a new chapter.
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
        }
    }

    /// Approximate word count of the chapter content.
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

/// A sentence-aligned piece of a chapter, sized for one synthesis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// The chapter this chunk belongs to
    pub chapter_id: String,
    /// Position within the chapter; audio is concatenated in this order
    pub sequence: usize,
    /// The text content
    pub text: String,
}

impl TextChunk {
    /// Create a new text chunk.
    pub fn new(chapter_id: impl Into<String>, sequence: usize, text: String) -> Self {
        Self {
            chapter_id: chapter_id.into(),
            sequence,
            text,
        }
    }
}
