use std::io::Cursor;

use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageFormat};
use serde_json::{json, Value};

use super::base::Usage;
use crate::models::content::ContentPart;

/// Images are re-encoded losslessly before upload
pub const IMAGE_UPLOAD_MIME_TYPE: &str = "image/png";

/// Convert content parts to Gemini's `parts` array
pub fn parts_to_gemini_format(parts: &[ContentPart]) -> Result<Vec<Value>> {
    parts
        .iter()
        .map(|part| -> Result<Value> {
            Ok(match part {
                ContentPart::Text(text) | ContentPart::ExtractedText(text) => json!({ "text": text }),
                ContentPart::Image(image) => {
                    inline_data(IMAGE_UPLOAD_MIME_TYPE, &encode_png(image)?)
                }
                ContentPart::InlineBinary(binary) => inline_data(&binary.mime_type, &binary.data),
            })
        })
        .collect()
}

fn inline_data(mime_type: &str, data: &[u8]) -> Value {
    json!({
        "inline_data": {
            "mime_type": mime_type,
            "data": STANDARD.encode(data),
        }
    })
}

pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| anyhow!("Failed to encode image for upload: {}", e))?;
    Ok(bytes)
}

/// Concatenated text of every part of the first candidate in one streamed chunk
pub fn chunk_text(chunk: &Value) -> String {
    chunk["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default()
}

pub fn chunk_usage(chunk: &Value) -> Option<Usage> {
    let metadata = chunk.get("usageMetadata")?;
    let count = |key: &str| metadata.get(key).and_then(|v| v.as_i64()).map(|v| v as i32);
    Some(Usage::new(
        count("promptTokenCount"),
        count("candidatesTokenCount"),
        count("totalTokenCount"),
    ))
}

pub fn check_gemini_error(chunk: &Value) -> Option<anyhow::Error> {
    let error = chunk.get("error")?;
    let message = error
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("Unknown error");
    let status = error
        .get("status")
        .and_then(|s| s.as_str())
        .unwrap_or("UNKNOWN");
    Some(anyhow!("Gemini API error ({}): {}", status, message))
}

/// A reply the API withheld: the prompt was blocked, or a candidate ended
/// early for a reason other than `STOP` without producing any content
pub fn check_gemini_block(chunk: &Value) -> Option<anyhow::Error> {
    if let Some(reason) = chunk["promptFeedback"]["blockReason"].as_str() {
        return Some(anyhow!("Prompt blocked by Gemini ({})", reason));
    }

    let candidate = chunk["candidates"].get(0)?;
    let reason = candidate["finishReason"].as_str()?;
    if reason == "STOP" || !candidate["content"]["parts"].is_null() {
        return None;
    }
    let message = match reason {
        "SAFETY" => "Response blocked by the safety filter. Try rephrasing your request.".to_string(),
        "RECITATION" => "Response blocked by the recitation filter. Try rephrasing.".to_string(),
        "MAX_TOKENS" => "The model ran out of output tokens before answering.".to_string(),
        "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" => {
            format!("Response blocked ({}). Try rephrasing your request.", reason)
        }
        other => format!("The model returned an empty response (reason: {})", other),
    };
    Some(anyhow!(message))
}
