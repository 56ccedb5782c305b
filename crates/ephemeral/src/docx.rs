use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::errors::ExtractError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Pulls visible paragraph text out of a word-processing document
pub trait DocumentExtractor: Send + Sync {
    /// One string per paragraph, in document order. Empty paragraphs are kept.
    fn paragraphs(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractError>;
}

/// Reads the main document part of an Office Open XML (.docx) container
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentExtractor for DocxExtractor {
    fn paragraphs(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entry = archive.by_name(DOCUMENT_PART)?;
        let mut xml = String::new();
        entry.read_to_string(&mut xml)?;
        Ok(xml_paragraphs(&xml))
    }
}

/// Split a WordprocessingML body into paragraph texts.
///
/// Only body-level paragraphs count: tables and text boxes are left out.
fn xml_paragraphs(xml: &str) -> Vec<String> {
    let body = match (xml.find("<w:body"), xml.rfind("</w:body>")) {
        (Some(start), Some(end)) if start < end => &xml[start..end],
        _ => xml,
    };
    let body = strip_elements(&strip_elements(body, "w:txbxContent"), "w:tbl");

    let mut paragraphs = Vec::new();
    let mut rest = body.as_str();
    while let Some(open) = find_open_tag(rest, "w:p") {
        let after_open = &rest[open..];
        match after_open.find('>') {
            // <w:p/> is an empty paragraph
            Some(gt) if after_open[..gt].ends_with('/') => {
                paragraphs.push(String::new());
                rest = &after_open[gt + 1..];
            }
            Some(_) => {
                let end = after_open.find("</w:p>").unwrap_or(after_open.len());
                paragraphs.push(paragraph_text(&after_open[..end]));
                rest = &after_open[(end + "</w:p>".len()).min(after_open.len())..];
            }
            None => break,
        }
    }
    paragraphs
}

/// Position of the next `<name>`, `<name ...>` or `<name/>` tag; `<w:p` never matches `<w:pPr>`
fn find_open_tag(xml: &str, name: &str) -> Option<usize> {
    let prefix = format!("<{}", name);
    let mut offset = 0;
    while let Some(pos) = xml[offset..].find(&prefix) {
        let start = offset + pos;
        match xml[start + prefix.len()..].chars().next() {
            Some('>') | Some(' ') | Some('/') => return Some(start),
            _ => offset = start + prefix.len(),
        }
    }
    None
}

/// Remove every `name` element and its content, including nested ones
fn strip_elements(xml: &str, name: &str) -> String {
    let close = format!("</{}>", name);
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;
    while let Some(start) = find_open_tag(rest, name) {
        out.push_str(&rest[..start]);
        let mut depth = 0usize;
        let mut cursor = start;
        loop {
            let next_open = find_open_tag(&rest[cursor..], name).map(|p| cursor + p);
            let next_close = rest[cursor..].find(&close).map(|p| cursor + p);
            match (next_open, next_close) {
                (Some(open), close_at) if close_at.map_or(true, |c| open < c) => {
                    let Some(gt) = rest[open..].find('>').map(|g| open + g) else {
                        cursor = rest.len();
                        break;
                    };
                    cursor = gt + 1;
                    if !rest[..gt].ends_with('/') {
                        depth += 1;
                    } else if depth == 0 {
                        break;
                    }
                }
                (_, Some(close_at)) => {
                    cursor = close_at + close.len();
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        break;
                    }
                }
                (_, None) => {
                    cursor = rest.len();
                    break;
                }
            }
        }
        rest = &rest[cursor..];
    }
    out.push_str(rest);
    out
}

/// Concatenate the runs of one paragraph, honoring tabs and line breaks
fn paragraph_text(xml: &str) -> String {
    let mut text = String::new();
    let mut rest = xml;
    while let Some(lt) = rest.find('<') {
        let Some(gt) = rest[lt..].find('>') else {
            break;
        };
        let tag = &rest[lt + 1..lt + gt];
        let after = &rest[lt + gt + 1..];

        // paragraph properties hold tab stops, not tabs
        if tag == "w:pPr" {
            rest = match after.find("</w:pPr>") {
                Some(end) => &after[end..],
                None => after,
            };
            continue;
        }
        if (tag == "w:t" || tag.starts_with("w:t ")) && !tag.ends_with('/') {
            let end = after.find("</w:t>").unwrap_or(after.len());
            text.push_str(&decode_xml_entities(&after[..end]));
            rest = &after[end..];
            continue;
        }
        if tag.starts_with("w:tab") && tag.ends_with('/') {
            text.push('\t');
        } else if (tag.starts_with("w:br") || tag.starts_with("w:cr")) && tag.ends_with('/') {
            text.push('\n');
        }
        rest = after;
    }
    text
}

fn decode_xml_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
