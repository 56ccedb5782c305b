//! Paginated PDF rendering of a transcript.
//!
//! Rendering happens in three steps: the transcript becomes a list of
//! [`Block`]s, blocks are laid out into positioned lines on pages, and the
//! pages are written with `lopdf` using the standard Helvetica faces.
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use super::markup::{line_spans, Span};
use crate::errors::ExportError;
use crate::models::entry::TranscriptEntry;
use crate::models::speaker::{Speaker, SpeakerLabels};
use crate::transcript::Transcript;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentStyle {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub font_size: f32,
    pub leading: f32,
    pub spacer: f32,
    pub rule_thickness: f32,
    pub rule_space: f32,
    pub user_color: Rgb,
    pub assistant_color: Rgb,
    pub rule_color: Rgb,
    /// Used in place of a transcript label the PDF fonts cannot draw
    pub fallback_labels: SpeakerLabels,
}

impl Default for DocumentStyle {
    /// A4 with 40pt margins, 11/14 body text
    fn default() -> Self {
        Self {
            page_width: 595.0,
            page_height: 842.0,
            margin: 40.0,
            font_size: 11.0,
            leading: 14.0,
            spacer: 12.0,
            rule_thickness: 0.7,
            rule_space: 6.0,
            user_color: Rgb(0.0, 0.5, 0.0),
            assistant_color: Rgb(0.0, 0.0, 0.0),
            rule_color: Rgb(0.5, 0.5, 0.5),
            fallback_labels: SpeakerLabels::new("You", "Assistant"),
        }
    }
}

impl DocumentStyle {
    fn color(&self, speaker: Speaker) -> Rgb {
        match speaker {
            Speaker::User => self.user_color,
            Speaker::Assistant => self.assistant_color,
        }
    }

    /// The transcript's label for `speaker`, unless it has characters outside WinAnsi
    fn label<'a>(&'a self, labels: &'a SpeakerLabels, speaker: Speaker) -> &'a str {
        let label = labels.label(speaker);
        if label.chars().all(is_win_ansi) {
            label
        } else {
            self.fallback_labels.label(speaker)
        }
    }

    fn text_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph { speaker: Speaker, spans: Vec<Span> },
    Rule,
    Spacer,
}

/// Block structure of the document.
///
/// Each turn contributes its user entry, then a rule and the assistant entry.
/// A turn whose reply is missing gets an empty assistant entry so pairs stay
/// aligned. Styling follows the entry's speaker, never the rendered text.
pub fn blocks(transcript: &Transcript, style: &DocumentStyle) -> Vec<Block> {
    let mut blocks = Vec::new();
    for turn in transcript.turns() {
        if let Some(user) = turn.user() {
            push_entry(&mut blocks, transcript, style, user);
        }
        let assistant = TranscriptEntry::assistant(turn.assistant_text());
        blocks.push(Block::Rule);
        push_entry(&mut blocks, transcript, style, &assistant);
    }
    blocks
}

fn push_entry(
    blocks: &mut Vec<Block>,
    transcript: &Transcript,
    style: &DocumentStyle,
    entry: &TranscriptEntry,
) {
    let label = style.label(transcript.labels(), entry.speaker);
    let rendered = format!("{}: {}", label, entry.text);
    for line in rendered.split('\n') {
        if line.trim().is_empty() {
            blocks.push(Block::Spacer);
        } else {
            blocks.push(Block::Paragraph {
                speaker: entry.speaker,
                spans: line_spans(line),
            });
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Placed {
    Line {
        x: f32,
        baseline: f32,
        color: Rgb,
        spans: Vec<Span>,
    },
    Rule {
        x0: f32,
        x1: f32,
        y: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub items: Vec<Placed>,
}

/// Wrap paragraphs to the text width and break pages at the bottom margin.
/// Always returns at least one page.
pub fn layout(blocks: &[Block], style: &DocumentStyle) -> Vec<Page> {
    let top = style.page_height - style.margin;
    let mut pages = vec![Page::default()];
    let mut cursor = top;

    let make_room = |pages: &mut Vec<Page>, cursor: &mut f32, needed: f32| {
        if *cursor - needed < style.margin && *cursor < top {
            pages.push(Page::default());
            *cursor = top;
        }
    };

    for block in blocks {
        match block {
            Block::Spacer => {
                make_room(&mut pages, &mut cursor, style.spacer);
                cursor -= style.spacer;
            }
            Block::Rule => {
                make_room(&mut pages, &mut cursor, style.rule_space + style.leading);
                let y = cursor - style.rule_space / 2.0;
                if let Some(page) = pages.last_mut() {
                    page.items.push(Placed::Rule {
                        x0: style.margin,
                        x1: style.page_width - style.margin,
                        y,
                    });
                }
                cursor -= style.rule_space;
            }
            Block::Paragraph { speaker, spans } => {
                for line in wrap(spans, style.text_width(), style.font_size) {
                    make_room(&mut pages, &mut cursor, style.leading);
                    if let Some(page) = pages.last_mut() {
                        page.items.push(Placed::Line {
                            x: style.margin,
                            baseline: cursor - style.font_size,
                            color: style.color(*speaker),
                            spans: line,
                        });
                    }
                    cursor -= style.leading;
                }
            }
        }
    }
    pages
}

/// Greedy word wrap over styled spans. Words wider than a line are split by character.
fn wrap(spans: &[Span], width: f32, font_size: f32) -> Vec<Vec<Span>> {
    let mut lines: Vec<Vec<Span>> = Vec::new();
    let mut line: Vec<Span> = Vec::new();
    let mut line_width = 0.0;

    for span in spans {
        for word in span.text.split_inclusive(' ') {
            let word_width = text_width(word, span.bold, font_size);
            if line_width + word_width > width && !line.is_empty() {
                lines.push(finish_line(std::mem::take(&mut line)));
                line_width = 0.0;
            }
            let word = if line.is_empty() {
                word.trim_start_matches(' ')
            } else {
                word
            };
            if word.is_empty() {
                continue;
            }

            if text_width(word, span.bold, font_size) > width {
                for ch in word.chars() {
                    let ch_width = char_width(ch, span.bold, font_size);
                    if line_width + ch_width > width && !line.is_empty() {
                        lines.push(finish_line(std::mem::take(&mut line)));
                        line_width = 0.0;
                    }
                    push_text(&mut line, &ch.to_string(), span.bold);
                    line_width += ch_width;
                }
            } else {
                push_text(&mut line, word, span.bold);
                line_width += text_width(word, span.bold, font_size);
            }
        }
    }
    if !line.is_empty() {
        lines.push(finish_line(line));
    }
    lines
}

fn push_text(line: &mut Vec<Span>, text: &str, bold: bool) {
    match line.last_mut() {
        Some(last) if last.bold == bold => last.text.push_str(text),
        _ => line.push(Span {
            text: text.to_string(),
            bold,
        }),
    }
}

fn finish_line(mut line: Vec<Span>) -> Vec<Span> {
    if let Some(last) = line.last_mut() {
        let trimmed = last.text.trim_end_matches(' ').len();
        last.text.truncate(trimmed);
    }
    line.retain(|span| !span.text.is_empty());
    line
}

/// Helvetica advance widths for ASCII 32..=126, in 1/1000 em
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

// Helvetica-Bold runs roughly a tenth wider
const BOLD_FACTOR: f32 = 1.1;

fn char_width(ch: char, bold: bool, font_size: f32) -> f32 {
    let code = win_ansi_byte(ch);
    let units = match code {
        32..=126 => HELVETICA_WIDTHS[(code - 32) as usize],
        _ => 556,
    };
    let factor = if bold { BOLD_FACTOR } else { 1.0 };
    f32::from(units) / 1000.0 * font_size * factor
}

fn text_width(text: &str, bold: bool, font_size: f32) -> f32 {
    text.chars().map(|ch| char_width(ch, bold, font_size)).sum()
}

fn is_win_ansi(ch: char) -> bool {
    matches!(ch, '\t' | ' '..='~' | '\u{a0}'..='\u{ff}')
}

/// The standard Type1 faces only cover a single-byte encoding; anything else prints as `?`
fn win_ansi_byte(ch: char) -> u8 {
    match ch {
        '\t' => b' ',
        ' '..='~' => ch as u8,
        '\u{a0}'..='\u{ff}' => ch as u32 as u8,
        _ => b'?',
    }
}

fn encode(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

fn page_operations(page: &Page, style: &DocumentStyle) -> Vec<Operation> {
    let mut operations = Vec::new();
    for item in &page.items {
        match item {
            Placed::Line {
                x,
                baseline,
                color,
                spans,
            } => {
                operations.push(Operation::new(
                    "rg",
                    vec![real(color.0), real(color.1), real(color.2)],
                ));
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Td", vec![real(*x), real(*baseline)]));
                for span in spans {
                    let font = if span.bold { "F2" } else { "F1" };
                    operations.push(Operation::new(
                        "Tf",
                        vec![font.into(), real(style.font_size)],
                    ));
                    operations.push(Operation::new(
                        "Tj",
                        vec![Object::string_literal(encode(&span.text))],
                    ));
                }
                operations.push(Operation::new("ET", vec![]));
            }
            Placed::Rule { x0, x1, y } => {
                let Rgb(r, g, b) = style.rule_color;
                operations.push(Operation::new("RG", vec![real(r), real(g), real(b)]));
                operations.push(Operation::new("w", vec![real(style.rule_thickness)]));
                operations.push(Operation::new("m", vec![real(*x0), real(*y)]));
                operations.push(Operation::new("l", vec![real(*x1), real(*y)]));
                operations.push(Operation::new("S", vec![]));
            }
        }
    }
    operations
}

/// Write laid-out pages as a PDF document
pub fn write_pages(pages: &[Page], style: &DocumentStyle) -> Result<Vec<u8>, ExportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let content = Content {
            operations: page_operations(page, style),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), real(style.page_width), real(style.page_height)],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

pub fn render(transcript: &Transcript, style: &DocumentStyle) -> Result<Vec<u8>, ExportError> {
    let pages = layout(&blocks(transcript, style), style);
    write_pages(&pages, style)
}
