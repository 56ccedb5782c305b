use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Who produced a transcript entry
pub enum Speaker {
    User,
    Assistant,
}

/// Labels used when a transcript is rendered for people to read.
///
/// Entries are tagged with a [`Speaker`]; the label is only applied on the way
/// out, so changing the scheme never changes how entries are styled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerLabels {
    pub user: String,
    pub assistant: String,
}

impl SpeakerLabels {
    pub fn new<U: Into<String>, A: Into<String>>(user: U, assistant: A) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }

    pub fn label(&self, speaker: Speaker) -> &str {
        match speaker {
            Speaker::User => &self.user,
            Speaker::Assistant => &self.assistant,
        }
    }
}

impl Default for SpeakerLabels {
    fn default() -> Self {
        Self::new("You", "🤖")
    }
}
