//! Turning a transcript into something the user can keep.
//!
//! The session lives only in memory, so exports are the only way a
//! conversation survives the process.
pub mod markup;
pub mod pdf;

use std::fs;
use std::path::Path;

use tracing::info;

use crate::errors::ExportError;
use crate::transcript::Transcript;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Pdf,
}

impl ExportFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "txt" | "text" => Some(ExportFormat::Text),
            "pdf" => Some(ExportFormat::Pdf),
            _ => None,
        }
    }

    pub fn default_file_name(&self) -> &'static str {
        match self {
            ExportFormat::Text => "chat_history.txt",
            ExportFormat::Pdf => "chat_history.pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Text => "text/plain",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub fn render(&self, transcript: &Transcript) -> Result<Vec<u8>, ExportError> {
        match self {
            ExportFormat::Text => Ok(transcript.render_plain().into_bytes()),
            ExportFormat::Pdf => transcript.render_document(),
        }
    }
}

/// Render the transcript and write it to `path`, returning the number of bytes written
pub fn export_to_file(
    transcript: &Transcript,
    format: ExportFormat,
    path: &Path,
) -> Result<usize, ExportError> {
    let bytes = format.render(transcript)?;
    fs::write(path, &bytes)?;
    info!(
        path = %path.display(),
        format = format.mime_type(),
        entries = transcript.len(),
        "exported transcript"
    );
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_format() {
        assert_eq!(ExportFormat::parse("TXT"), Some(ExportFormat::Text));
        assert_eq!(ExportFormat::parse("pdf"), Some(ExportFormat::Pdf));
        assert_eq!(ExportFormat::parse("docx"), None);
    }

    #[test]
    fn test_text_export_is_plain_rendering() {
        let mut transcript = Transcript::default();
        transcript.record_turn("hello", "hi **there**");
        let bytes = ExportFormat::Text.render(&transcript).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "You: hello\n🤖: hi **there**");
    }

    #[test]
    fn test_export_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(ExportFormat::Text.default_file_name());
        let mut transcript = Transcript::default();
        transcript.record_turn("q", "a");

        let written = export_to_file(&transcript, ExportFormat::Text, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "You: q\n🤖: a");
        assert_eq!(written, "You: q\n🤖: a".len());
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("chat_history.pdf");
        let result = export_to_file(&Transcript::default(), ExportFormat::Pdf, &path);
        assert!(matches!(result, Err(ExportError::Io(_))));
    }
}
