//! Chapter audio files and the job manifest on disk.
//!
//! Each chapter with audio is written as `<chapter-id>.<ext>` next to a
//! `manifest.json` holding the job result. The manifest is what separates
//! "this chapter exists but has no audio" from "no such chapter".

use crate::pipeline::JobResult;
use crate::tts::AudioEncoding;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Name of the manifest file inside the output directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Default URL prefix under which chapter audio is served.
pub const DEFAULT_URL_PREFIX: &str = "/api/audio";

const KNOWN_EXTENSIONS: &[&str] = &["mp3", "ogg", "wav"];

static CHAPTER_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:chapter|section)-[1-9]\d*$").expect("valid chapter id regex"));

/// Result of looking up a chapter's audio by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioLookup {
    /// Audio was generated and is stored at this path
    Available(PathBuf),
    /// The chapter exists but synthesis failed, so it has no audio
    NotGenerated,
    /// Well-formed id that is not part of the stored job
    UnknownId,
    /// Not a chapter id at all
    InvalidId,
}

/// Whether `id` has the shape of a chapter id.
pub fn is_valid_chapter_id(id: &str) -> bool {
    CHAPTER_ID.is_match(id)
}

/// Output directory holding chapter audio for one job.
#[derive(Debug, Clone)]
pub struct AudioStore {
    dir: PathBuf,
    encoding: AudioEncoding,
    url_prefix: String,
}

impl AudioStore {
    /// Create a store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>, encoding: AudioEncoding) -> Self {
        Self {
            dir: dir.into(),
            encoding,
            url_prefix: DEFAULT_URL_PREFIX.to_string(),
        }
    }

    /// Set the URL prefix used for `audioUrl` values.
    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a chapter's audio is written to.
    pub fn audio_path(&self, chapter_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", chapter_id, self.encoding.extension()))
    }

    /// URL a chapter's audio is served under.
    pub fn audio_url(&self, chapter_id: &str) -> String {
        format!("{}/{}", self.url_prefix.trim_end_matches('/'), chapter_id)
    }

    /// Create the directory and remove audio and manifest left by an earlier job.
    pub fn prepare(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if is_job_artifact(&path) {
                debug!("Removing stale artifact {}", path.display());
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Write one chapter's audio.
    pub async fn write_audio(&self, chapter_id: &str, audio: &[u8]) -> io::Result<PathBuf> {
        let path = self.audio_path(chapter_id);
        tokio::fs::write(&path, audio).await?;
        Ok(path)
    }

    /// Save the job result next to the audio files.
    pub fn write_manifest(&self, result: &JobResult) -> io::Result<()> {
        let file = File::create(self.dir.join(MANIFEST_FILE))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, result)?;
        Ok(())
    }

    /// Load the stored job result, if a job has been run here.
    pub fn read_manifest(&self) -> io::Result<Option<JobResult>> {
        let path = self.dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let reader = BufReader::new(File::open(&path)?);
        let result = serde_json::from_reader(reader)?;
        Ok(Some(result))
    }

    /// Find a chapter's audio by id.
    pub fn lookup(&self, chapter_id: &str) -> io::Result<AudioLookup> {
        if !is_valid_chapter_id(chapter_id) {
            return Ok(AudioLookup::InvalidId);
        }

        let Some(manifest) = self.read_manifest()? else {
            return Ok(AudioLookup::UnknownId);
        };

        if !manifest.chapters.iter().any(|c| c.id == chapter_id) {
            return Ok(AudioLookup::UnknownId);
        }

        Ok(self
            .find_audio_file(chapter_id)
            .map_or(AudioLookup::NotGenerated, AudioLookup::Available))
    }

    fn find_audio_file(&self, chapter_id: &str) -> Option<PathBuf> {
        KNOWN_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", chapter_id, ext)))
            .find(|path| path.is_file())
    }
}

fn is_job_artifact(path: &Path) -> bool {
    if path.file_name().is_some_and(|name| name == MANIFEST_FILE) {
        return true;
    }

    let known_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| KNOWN_EXTENSIONS.contains(&e));
    let chapter_stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(is_valid_chapter_id);

    known_ext && chapter_stem
}
