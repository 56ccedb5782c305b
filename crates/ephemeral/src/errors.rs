use thiserror::Error;

/// Something that happened to a single uploaded file while building a request.
///
/// None of these abort the request: the file is skipped (or, for
/// `ExtractorFallback`, decoded lossily) and the notice is shown to the user.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FileNotice {
    #[error("Error processing image {name}: {reason}")]
    Decode { name: String, reason: String },

    #[error("Unsupported file type: {mime_type} ({name})")]
    UnsupportedType { name: String, mime_type: String },

    #[error("Could not read {name} as a Word document ({reason}); sending its raw text instead")]
    ExtractorFallback { name: String, reason: String },
}

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TurnError {
    #[error("Nothing to send: no prompt and no usable file content")]
    EmptyRequest,

    #[error("Remote model call failed: {0:#}")]
    Remote(anyhow::Error),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("no document text extractor is available")]
    Unavailable,

    #[error("not a readable docx container: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("failed to read document part: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to build PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

pub type TurnResult<T> = Result<T, TurnError>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_notice_messages() {
        let notice = FileNotice::UnsupportedType {
            name: "notes.txt".to_string(),
            mime_type: "text/plain".to_string(),
        };
        assert_eq!(
            notice.to_string(),
            "Unsupported file type: text/plain (notes.txt)"
        );
    }

    #[test]
    fn test_remote_error_keeps_context_chain() {
        let err = TurnError::Remote(anyhow!("HTTP 503").context("Gemini request failed"));
        assert_eq!(
            err.to_string(),
            "Remote model call failed: Gemini request failed: HTTP 503"
        );
    }
}
