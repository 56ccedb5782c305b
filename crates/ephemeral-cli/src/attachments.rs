use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ephemeral::models::upload::UploadedFile;
use ephemeral::normalizer::{DOCX_MIME_TYPE, PDF_MIME_TYPE};

/// Declared MIME type for an accepted file extension
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime_type = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "pdf" => PDF_MIME_TYPE,
        "docx" => DOCX_MIME_TYPE,
        _ => return None,
    };
    Some(mime_type)
}

/// Files that ride along with every message until detached
#[derive(Debug, Default)]
pub struct Attachments {
    files: Vec<UploadedFile>,
}

impl Attachments {
    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Read a file into memory. Re-attaching a name replaces the earlier copy.
    pub fn attach(&mut self, path: &Path) -> Result<&UploadedFile> {
        let mime_type = mime_type_for(path).ok_or_else(|| {
            anyhow!(
                "{} is not an accepted file type (png, jpg, jpeg, gif, webp, bmp, pdf, docx)",
                path.display()
            )
        })?;
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.files.retain(|file| file.name != name);
        self.files.push(UploadedFile::new(mime_type, name, bytes));
        Ok(&self.files[self.files.len() - 1])
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mime_type_for() {
        assert_eq!(mime_type_for(Path::new("a.PNG")), Some("image/png"));
        assert_eq!(mime_type_for(Path::new("photo.jpeg")), Some("image/jpeg"));
        assert_eq!(mime_type_for(Path::new("r.pdf")), Some(PDF_MIME_TYPE));
        assert_eq!(mime_type_for(Path::new("notes.docx")), Some(DOCX_MIME_TYPE));
        assert_eq!(mime_type_for(Path::new("notes.txt")), None);
        assert_eq!(mime_type_for(Path::new("README")), None);
    }

    #[test]
    fn test_attach_and_detach() {
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("report.pdf");
        fs::write(&pdf, b"%PDF-1.4").unwrap();

        let mut attachments = Attachments::default();
        let file = attachments.attach(&pdf).unwrap();
        assert_eq!(file.name, "report.pdf");
        assert_eq!(file.mime_type, PDF_MIME_TYPE);
        assert_eq!(file.bytes, b"%PDF-1.4");

        fs::write(&pdf, b"%PDF-1.7").unwrap();
        attachments.attach(&pdf).unwrap();
        assert_eq!(attachments.files().len(), 1);
        assert_eq!(attachments.files()[0].bytes, b"%PDF-1.7");

        attachments.clear();
        assert!(attachments.is_empty());
    }

    #[test]
    fn test_attach_rejects_unknown_and_missing() {
        let dir = TempDir::new().unwrap();
        let txt = dir.path().join("notes.txt");
        fs::write(&txt, b"hello").unwrap();

        let mut attachments = Attachments::default();
        assert!(attachments.attach(&txt).is_err());
        assert!(attachments.attach(&dir.path().join("missing.png")).is_err());
        assert!(attachments.is_empty());
    }
}
