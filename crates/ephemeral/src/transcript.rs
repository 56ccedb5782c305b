use crate::errors::ExportError;
use crate::export::pdf::{self, DocumentStyle};
use crate::models::entry::TranscriptEntry;
use crate::models::speaker::{Speaker, SpeakerLabels};

/// A user entry and the assistant entry that answered it.
///
/// Either side may be missing: a user entry whose reply never arrived, or an
/// assistant entry appended without a preceding user entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Turn {
    user: Option<TranscriptEntry>,
    assistant: Option<TranscriptEntry>,
}

impl Turn {
    pub fn user(&self) -> Option<&TranscriptEntry> {
        self.user.as_ref()
    }

    pub fn assistant(&self) -> Option<&TranscriptEntry> {
        self.assistant.as_ref()
    }

    /// The assistant's reply for display, empty when there is none
    pub fn assistant_text(&self) -> &str {
        self.assistant.as_ref().map_or("", |entry| entry.text.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.user.iter().chain(self.assistant.iter())
    }

    fn is_awaiting_reply(&self) -> bool {
        self.user.is_some() && self.assistant.is_none()
    }
}

/// The ordered, append-only log of one session's conversation
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
    labels: SpeakerLabels,
}

impl Transcript {
    pub fn new(labels: SpeakerLabels) -> Self {
        Self {
            turns: Vec::new(),
            labels,
        }
    }

    /// Add exactly one entry. The text is not validated and may be empty.
    pub fn append<S: Into<String>>(&mut self, speaker: Speaker, text: S) {
        match speaker {
            Speaker::User => self.turns.push(Turn {
                user: Some(TranscriptEntry::user(text)),
                assistant: None,
            }),
            Speaker::Assistant => {
                let entry = TranscriptEntry::assistant(text);
                match self.turns.last_mut() {
                    Some(turn) if turn.is_awaiting_reply() => turn.assistant = Some(entry),
                    _ => self.turns.push(Turn {
                        user: None,
                        assistant: Some(entry),
                    }),
                }
            }
        }
    }

    /// Append a user entry and its reply
    pub fn record_turn<U: Into<String>, A: Into<String>>(&mut self, user: U, assistant: A) {
        self.append(Speaker::User, user);
        self.append(Speaker::Assistant, assistant);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// All entries in insertion order
    pub fn entries(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.turns.iter().flat_map(Turn::entries)
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn labels(&self) -> &SpeakerLabels {
        &self.labels
    }

    pub fn render_line(&self, entry: &TranscriptEntry) -> String {
        format!("{}: {}", self.labels.label(entry.speaker), entry.text)
    }

    /// One `"{speaker}: {text}"` line per entry, joined by newlines
    pub fn render_plain(&self) -> String {
        self.entries()
            .map(|entry| self.render_line(entry))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Paginated PDF of the conversation in the default style
    pub fn render_document(&self) -> Result<Vec<u8>, ExportError> {
        pdf::render(self, &DocumentStyle::default())
    }

    /// Discard every entry. There is no undo.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled() -> Transcript {
        Transcript::new(SpeakerLabels::new("You", "Assistant"))
    }

    #[test]
    fn test_render_plain_scenario() {
        let mut transcript = labelled();
        transcript.append(Speaker::User, "hello");
        transcript.append(Speaker::Assistant, "hi there");
        assert_eq!(transcript.render_plain(), "You: hello\nAssistant: hi there");
    }

    #[test]
    fn test_append_is_last_line() {
        let mut transcript = Transcript::default();
        transcript.record_turn("first", "reply");
        transcript.append(Speaker::User, "second **bold**");

        let plain = transcript.render_plain();
        assert_eq!(plain.lines().last(), Some("You: second **bold**"));
    }

    #[test]
    fn test_render_plain_one_line_per_entry() {
        let mut transcript = labelled();
        for i in 0..5 {
            transcript.record_turn(format!("question {}", i), format!("answer {}", i));
        }
        transcript.append(Speaker::User, "");

        let plain = transcript.render_plain();
        let lines: Vec<&str> = plain.split('\n').collect();
        assert_eq!(lines.len(), transcript.len());
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0], "You: question 0");
        assert_eq!(lines[9], "Assistant: answer 4");
        assert_eq!(lines[10], "You: ");
    }

    #[test]
    fn test_empty_transcript_renders_empty() {
        assert_eq!(Transcript::default().render_plain(), "");
        assert!(Transcript::default().is_empty());
    }

    #[test]
    fn test_turns_pair_entries() {
        let mut transcript = labelled();
        transcript.record_turn("q1", "a1");
        transcript.append(Speaker::User, "q2");

        let turns = transcript.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].assistant_text(), "a1");
        assert_eq!(turns[1].user().map(|e| e.text.as_str()), Some("q2"));
        assert!(turns[1].assistant().is_none());
        assert_eq!(turns[1].assistant_text(), "");
    }

    #[test]
    fn test_assistant_without_user_keeps_order() {
        let mut transcript = labelled();
        transcript.append(Speaker::Assistant, "welcome");
        transcript.append(Speaker::User, "q1");
        transcript.append(Speaker::User, "q2");
        transcript.append(Speaker::Assistant, "a2");

        assert_eq!(
            transcript.render_plain(),
            "Assistant: welcome\nYou: q1\nYou: q2\nAssistant: a2"
        );
        assert_eq!(transcript.turns().len(), 3);
        assert!(transcript.turns()[0].user().is_none());
        assert!(transcript.turns()[1].assistant().is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut transcript = labelled();
        transcript.record_turn("q", "a");
        transcript.clear();
        assert!(transcript.is_empty());
        transcript.clear();
        assert!(transcript.is_empty());
        assert_eq!(transcript.len(), 0);
        assert_eq!(transcript.render_plain(), "");
    }

    #[test]
    fn test_entries_keep_speaker_tags() {
        let mut transcript = Transcript::default();
        transcript.record_turn("You: pretend", "🤖: also pretend");
        let speakers: Vec<Speaker> = transcript.entries().map(|e| e.speaker).collect();
        assert_eq!(speakers, vec![Speaker::User, Speaker::Assistant]);
    }
}
