/// A file handed to the normalizer by the front-end.
///
/// The bytes are fully buffered; the normalizer reads them once and the file
/// is dropped with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub mime_type: String,
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new<M: Into<String>, N: Into<String>>(mime_type: M, name: N, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            name: name.into(),
            bytes,
        }
    }
}

/// Comma separated file names, as shown next to the user's prompt in the transcript
pub fn upload_summary(files: &[UploadedFile]) -> Option<String> {
    if files.is_empty() {
        return None;
    }
    let names: Vec<&str> = files.iter().map(|file| file.name.as_str()).collect();
    Some(format!("(Uploaded: {})", names.join(", ")))
}

/// The text recorded for the user's side of a turn
pub fn user_message(prompt: &str, files: &[UploadedFile]) -> String {
    match upload_summary(files) {
        Some(summary) => format!("{} {}", prompt, summary),
        None => prompt.to_string(),
    }
}
