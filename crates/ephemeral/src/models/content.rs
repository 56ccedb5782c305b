use image::DynamicImage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineBinary {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
/// One unit of a multimodal request
pub enum ContentPart {
    Text(String),
    Image(DynamicImage),
    InlineBinary(InlineBinary),
    ExtractedText(String),
}

impl ContentPart {
    pub fn text<S: Into<String>>(text: S) -> Self {
        ContentPart::Text(text.into())
    }

    pub fn inline_binary<S: Into<String>>(mime_type: S, data: Vec<u8>) -> Self {
        ContentPart::InlineBinary(InlineBinary {
            mime_type: mime_type.into(),
            data,
        })
    }

    pub fn extracted_text<S: Into<String>>(text: S) -> Self {
        ContentPart::ExtractedText(text.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ContentPart::Text(_) => "text",
            ContentPart::Image(_) => "image",
            ContentPart::InlineBinary(_) => "inline_binary",
            ContentPart::ExtractedText(_) => "extracted_text",
        }
    }
}
