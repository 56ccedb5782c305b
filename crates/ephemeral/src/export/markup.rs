//! Inline markup for exported documents.
//!
//! Reply text is markdown-ish. Before layout, `**bold**` is rewritten to a
//! `<b>` tag and the tagged line is split into styled spans. Everything else
//! is escaped first so user text can never open or close a tag.
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
}

impl Span {
    pub fn plain<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Rewrite `**text**` to `<b>text</b>`
pub fn bold_to_tags(text: &str) -> String {
    let re = Regex::new(r"\*\*(.+?)\*\*").unwrap();
    re.replace_all(text, "<b>$1</b>").to_string()
}

/// Split tagged text into spans. An unclosed `<b>` runs to the end of the text.
pub fn parse_tags(tagged: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut rest = tagged;
    while let Some(open) = rest.find("<b>") {
        if open > 0 {
            spans.push(Span::plain(unescape(&rest[..open])));
        }
        let inner = &rest[open + 3..];
        let close = inner.find("</b>").unwrap_or(inner.len());
        if close > 0 {
            spans.push(Span::bold(unescape(&inner[..close])));
        }
        rest = &inner[(close + 4).min(inner.len())..];
    }
    if !rest.is_empty() {
        spans.push(Span::plain(unescape(rest)));
    }
    spans
}

/// Styled spans for one line of transcript text
pub fn line_spans(line: &str) -> Vec<Span> {
    parse_tags(&bold_to_tags(&escape(line)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_to_tags() {
        assert_eq!(bold_to_tags("a **b** c **d**"), "a <b>b</b> c <b>d</b>");
        assert_eq!(bold_to_tags("no ** pair"), "no ** pair");
        assert_eq!(bold_to_tags("****"), "****");
    }

    #[test]
    fn test_line_spans() {
        assert_eq!(
            line_spans("🤖: use **cargo** here"),
            vec![
                Span::plain("🤖: use "),
                Span::bold("cargo"),
                Span::plain(" here"),
            ]
        );
    }

    #[test]
    fn test_user_tags_are_text() {
        assert_eq!(
            line_spans("You: what does <b>x</b> & y mean"),
            vec![Span::plain("You: what does <b>x</b> & y mean")]
        );
    }

    #[test]
    fn test_unclosed_tag() {
        assert_eq!(
            parse_tags("x <b>y"),
            vec![Span::plain("x "), Span::bold("y")]
        );
    }
}
