// Document loading and text extraction for PDF and Word files

use crate::error::ExtractError;
use anyhow::{Context, Result};
use std::io::{Cursor, Read};
use std::path::Path;

pub const PDF_MIME: &str = "application/pdf";
pub const DOC_MIME: &str = "application/msword";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// MIME type used when the file extension is not recognised.
const UNKNOWN_MIME: &str = "application/octet-stream";

/// Document formats accepted for narration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    /// Binary Word 97-2003 document
    LegacyDoc,
}

impl DocumentKind {
    /// Classify a MIME type, ignoring parameters such as `; charset=...`.
    pub fn from_mime(mime: &str) -> Result<Self, ExtractError> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        match essence.as_str() {
            PDF_MIME => Ok(Self::Pdf),
            DOCX_MIME => Ok(Self::Docx),
            DOC_MIME => Ok(Self::LegacyDoc),
            _ => Err(ExtractError::UnsupportedType(mime.to_string())),
        }
    }

    /// MIME type for a file extension, if it is one we accept.
    pub fn mime_for_path(path: &Path) -> Option<&'static str> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(PDF_MIME),
            "docx" => Some(DOCX_MIME),
            "doc" => Some(DOC_MIME),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => PDF_MIME,
            Self::Docx => DOCX_MIME,
            Self::LegacyDoc => DOC_MIME,
        }
    }
}

/// An uploaded document awaiting narration.
#[derive(Debug, Clone)]
pub struct Document {
    /// Original file name
    pub file_name: String,
    /// Declared MIME type
    pub mime_type: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a document from disk.
    ///
    /// The MIME type comes from `mime_override` or the file extension. An
    /// unrecognised extension is kept as `application/octet-stream` so the
    /// job rejects it as unsupported.
    pub fn from_path(path: &Path, mime_override: Option<&str>) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read document: {}", path.display()))?;

        let mime_type = mime_override
            .map(str::to_string)
            .or_else(|| DocumentKind::mime_for_path(path).map(str::to_string))
            .unwrap_or_else(|| UNKNOWN_MIME.to_string());

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self::new(file_name, mime_type, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Extract plain text from document bytes of the given MIME type.
pub fn extract(bytes: &[u8], mime_type: &str) -> Result<String, ExtractError> {
    match DocumentKind::from_mime(mime_type)? {
        DocumentKind::Pdf => extract_pdf(bytes),
        DocumentKind::Docx => extract_docx(bytes),
        DocumentKind::LegacyDoc => Err(ExtractError::ExtractionFailed(
            "legacy .doc files are not supported; save the document as .docx".to_string(),
        )),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract panics on some malformed files instead of returning an error
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractError::ExtractionFailed(format!("invalid PDF: {}", e))),
        Err(_) => Err(ExtractError::ExtractionFailed(
            "PDF parser failed on malformed input".to_string(),
        )),
    }
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::ExtractionFailed(format!("not a Word document: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::ExtractionFailed(format!("missing document body: {}", e)))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::ExtractionFailed(format!("unreadable document body: {}", e)))?;

    document_xml_to_text(&xml)
}

/// WordprocessingML main namespace.
const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Convert WordprocessingML body markup to plain text.
///
/// Only run text (`w:t`) is kept. Paragraph ends and breaks become newlines
/// and a tab inside a run becomes a tab. Field codes, deleted text and
/// elements outside the WordprocessingML namespace are skipped.
fn document_xml_to_text(xml: &str) -> Result<String, ExtractError> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| ExtractError::ExtractionFailed(format!("malformed document body: {}", e)))?;

    let mut text = String::new();
    append_text(doc.root_element(), &mut text);
    Ok(text)
}

fn append_text(node: roxmltree::Node, text: &mut String) {
    for child in node.children().filter(|n| n.is_element()) {
        if child.tag_name().namespace() != Some(WORDML_NS) {
            continue;
        }

        match child.tag_name().name() {
            "t" => text.push_str(child.text().unwrap_or("")),
            "br" | "cr" => text.push('\n'),
            "tab" if is_run(node) => text.push('\t'),
            "p" => {
                append_text(child, text);
                text.push('\n');
            }
            _ => append_text(child, text),
        }
    }
}

fn is_run(node: roxmltree::Node) -> bool {
    node.tag_name().namespace() == Some(WORDML_NS) && node.tag_name().name() == "r"
}
