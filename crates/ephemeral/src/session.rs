use tracing::{debug, info, warn};

use crate::errors::{TurnError, TurnResult};
use crate::models::content::ContentPart;
use crate::models::speaker::SpeakerLabels;
use crate::providers::base::Provider;
use crate::transcript::Transcript;

/// Whether the full conversation is shown alongside the latest reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryVisibility {
    #[default]
    Hidden,
    Visible,
}

impl HistoryVisibility {
    pub fn toggled(self) -> Self {
        match self {
            HistoryVisibility::Hidden => HistoryVisibility::Visible,
            HistoryVisibility::Visible => HistoryVisibility::Hidden,
        }
    }

    pub fn is_visible(self) -> bool {
        self == HistoryVisibility::Visible
    }
}

/// Per-user state of one chat: the transcript, the latest reply, and the history toggle.
///
/// Nothing here outlives the process.
#[derive(Debug, Default)]
pub struct Session {
    transcript: Transcript,
    last_response: String,
    history: HistoryVisibility,
}

impl Session {
    pub fn new(labels: SpeakerLabels) -> Self {
        Self {
            transcript: Transcript::new(labels),
            last_response: String::new(),
            history: HistoryVisibility::Hidden,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// The most recent successful reply, empty until one arrives or after a clear
    pub fn last_response(&self) -> &str {
        &self.last_response
    }

    pub fn history(&self) -> HistoryVisibility {
        self.history
    }

    pub fn toggle_history(&mut self) -> HistoryVisibility {
        self.history = self.history.toggled();
        self.history
    }

    pub fn clear_response(&mut self) {
        self.last_response.clear();
    }

    /// Empty the transcript and hide the history view. Safe to call repeatedly.
    pub fn clear_history(&mut self) {
        self.transcript.clear();
        self.history = HistoryVisibility::Hidden;
        info!("conversation history cleared");
    }

    /// Send one request and record the exchange.
    ///
    /// `user_message` is what lands in the transcript; `parts` is what the model
    /// sees. An empty request never reaches the provider. On failure the
    /// transcript and last response are left exactly as they were.
    pub async fn submit(
        &mut self,
        provider: &dyn Provider,
        user_message: &str,
        parts: &[ContentPart],
    ) -> TurnResult<&str> {
        if parts.is_empty() {
            debug!("refusing to send an empty request");
            return Err(TurnError::EmptyRequest);
        }

        let (reply, usage) = provider.complete(parts).await.map_err(|e| {
            warn!(error = %e, "model call failed");
            TurnError::Remote(e)
        })?;
        debug!(
            input_tokens = ?usage.input_tokens,
            output_tokens = ?usage.output_tokens,
            total_tokens = ?usage.total_tokens,
            "turn usage"
        );

        self.transcript.record_turn(user_message, reply.as_str());
        self.last_response = reply;
        Ok(&self.last_response)
    }
}
