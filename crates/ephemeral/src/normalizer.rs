use tracing::{debug, warn};

use crate::docx::{DocumentExtractor, DocxExtractor};
use crate::errors::{ExtractError, FileNotice};
use crate::models::content::ContentPart;
use crate::models::upload::UploadedFile;

pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// How an upload is turned into request content, decided from its declared MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Pdf,
    Docx,
    Unsupported,
}

impl FileKind {
    /// Checked in priority order: image, then exact PDF, then docx
    pub fn classify(mime_type: &str) -> Self {
        if mime_type.contains("image") {
            FileKind::Image
        } else if mime_type == PDF_MIME_TYPE {
            FileKind::Pdf
        } else if mime_type.contains("docx") || mime_type == DOCX_MIME_TYPE {
            FileKind::Docx
        } else {
            FileKind::Unsupported
        }
    }
}

/// The request content built from one submission, plus anything worth telling the user
#[derive(Debug, Default)]
pub struct Normalized {
    pub parts: Vec<ContentPart>,
    pub notices: Vec<FileNotice>,
}

impl Normalized {
    /// An empty request must never reach the remote model
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Converts a prompt and uploaded files into the content parts a multimodal chat request accepts
pub struct Normalizer {
    extractor: Option<Box<dyn DocumentExtractor>>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(Box::new(DocxExtractor::new()))
    }
}

impl Normalizer {
    pub fn new(extractor: Box<dyn DocumentExtractor>) -> Self {
        Self {
            extractor: Some(extractor),
        }
    }

    /// A normalizer with no document extractor; docx uploads fall back to lossy decoding
    pub fn without_extractor() -> Self {
        Self { extractor: None }
    }

    pub fn normalize(&self, prompt: Option<&str>, files: &[UploadedFile]) -> Normalized {
        let mut normalized = Normalized::default();

        if let Some(prompt) = prompt.filter(|p| !p.is_empty()) {
            normalized.parts.push(ContentPart::text(prompt));
        }

        for file in files {
            match FileKind::classify(&file.mime_type) {
                FileKind::Image => match image::load_from_memory(&file.bytes) {
                    Ok(image) => normalized.parts.push(ContentPart::Image(image)),
                    Err(e) => {
                        warn!(file = %file.name, error = %e, "skipping undecodable image");
                        normalized.notices.push(FileNotice::Decode {
                            name: file.name.clone(),
                            reason: e.to_string(),
                        });
                    }
                },
                FileKind::Pdf => normalized
                    .parts
                    .push(ContentPart::inline_binary(PDF_MIME_TYPE, file.bytes.clone())),
                FileKind::Docx => {
                    let (part, notice) = self.docx_part(file);
                    normalized.parts.push(part);
                    normalized.notices.extend(notice);
                }
                FileKind::Unsupported => {
                    warn!(file = %file.name, mime_type = %file.mime_type, "unsupported file type");
                    normalized.notices.push(FileNotice::UnsupportedType {
                        name: file.name.clone(),
                        mime_type: file.mime_type.clone(),
                    });
                }
            }
        }

        debug!(
            parts = ?normalized.parts.iter().map(ContentPart::kind).collect::<Vec<_>>(),
            notices = normalized.notices.len(),
            "normalized request"
        );
        normalized
    }

    fn docx_part(&self, file: &UploadedFile) -> (ContentPart, Option<FileNotice>) {
        let extracted = match &self.extractor {
            Some(extractor) => extractor.paragraphs(&file.bytes),
            None => Err(ExtractError::Unavailable),
        };

        match extracted {
            Ok(paragraphs) => (ContentPart::extracted_text(paragraphs.join("\n")), None),
            Err(e) => {
                warn!(file = %file.name, error = %e, "docx extraction failed, decoding raw bytes");
                (
                    ContentPart::extracted_text(lossy_decode(&file.bytes)),
                    Some(FileNotice::ExtractorFallback {
                        name: file.name.clone(),
                        reason: e.to_string(),
                    }),
                )
            }
        }
    }
}

/// Best-effort text from arbitrary bytes: every byte maps to its Latin-1 character
pub fn lossy_decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
