use std::path::PathBuf;

use anyhow::Result;
use ephemeral::export::{export_to_file, ExportFormat};
use ephemeral::models::upload::user_message;
use ephemeral::normalizer::Normalizer;
use ephemeral::providers::base::Provider;
use ephemeral::session::Session;
use ephemeral::transcript::Transcript;

use crate::attachments::Attachments;
use crate::prompt::{Input, Prompt};

const TURN_SEPARATOR: &str = "\n---\n";

/// Drives one interactive chat: reads input, talks to the provider, and
/// renders replies and history through the prompt.
pub struct ChatSession<'a> {
    session: Session,
    provider: &'a dyn Provider,
    prompt: Box<dyn Prompt + 'a>,
    normalizer: Normalizer,
    attachments: Attachments,
}

impl<'a> ChatSession<'a> {
    pub fn new(session: Session, provider: &'a dyn Provider, prompt: Box<dyn Prompt + 'a>) -> Self {
        ChatSession {
            session,
            provider,
            prompt,
            normalizer: Normalizer::default(),
            attachments: Attachments::default(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn start(&mut self) -> Result<()> {
        self.prompt.ready();

        loop {
            match self.prompt.get_input()? {
                Input::Message(text) => self.send(&text).await,
                Input::Attach(paths) => self.attach(paths),
                Input::Detach => {
                    if self.attachments.is_empty() {
                        self.prompt.notice("No files attached.");
                    } else {
                        self.attachments.clear();
                        self.prompt.notice("Attachments removed.");
                    }
                }
                Input::ToggleHistory => self.toggle_history(),
                Input::Export { format, path } => self.export(format, path),
                Input::Clear => {
                    self.session.clear_history();
                    self.prompt.notice("Chat history cleared.");
                }
                Input::ClearResponse => {
                    self.session.clear_response();
                    self.prompt.notice("Last response cleared.");
                }
                Input::Invalid(message) => self.prompt.notice(&message),
                Input::AskAgain | Input::ToggleTheme | Input::Help => continue,
                Input::Exit => break,
            }
        }

        self.prompt.close();
        Ok(())
    }

    async fn send(&mut self, text: &str) {
        let files = self.attachments.files();
        let normalized = self.normalizer.normalize(Some(text), files);
        for notice in &normalized.notices {
            self.prompt.notice(&notice.to_string());
        }
        let message = user_message(text, files);

        self.prompt.show_busy();
        let outcome = tokio::select! {
            result = self.session.submit(self.provider, &message, &normalized.parts) => {
                Some(result.map(str::to_string))
            }
            _ = tokio::signal::ctrl_c() => None,
        };
        self.prompt.hide_busy();

        match outcome {
            Some(Ok(reply)) => {
                if self.session.history().is_visible() {
                    let history = history_markdown(self.session.transcript());
                    self.prompt.render(&history);
                } else {
                    self.prompt.render(&reply);
                }
            }
            Some(Err(e)) => self.prompt.notice(&e.to_string()),
            None => self
                .prompt
                .notice("Interrupted: the message was not added to the conversation."),
        }
    }

    fn attach(&mut self, paths: Vec<PathBuf>) {
        for path in paths {
            let result = self
                .attachments
                .attach(&path)
                .map(|file| format!("Attached {} ({})", file.name, file.mime_type));
            match result {
                Ok(message) => self.prompt.notice(&message),
                Err(e) => self.prompt.notice(&format!("{:#}", e)),
            }
        }
    }

    fn toggle_history(&mut self) {
        if self.session.toggle_history().is_visible() {
            if self.session.transcript().is_empty() {
                self.prompt.notice("No conversation yet.");
            } else {
                let history = history_markdown(self.session.transcript());
                self.prompt.render(&history);
            }
        } else {
            self.prompt.notice("History hidden.");
        }
    }

    fn export(&mut self, format: ExportFormat, path: Option<PathBuf>) {
        let path = path.unwrap_or_else(|| PathBuf::from(format.default_file_name()));
        match export_to_file(self.session.transcript(), format, &path) {
            Ok(bytes) => self
                .prompt
                .notice(&format!("Saved {} ({} bytes)", path.display(), bytes)),
            Err(e) => self.prompt.notice(&format!("Export failed: {}", e)),
        }
    }
}

/// The conversation as markdown, one block per turn
pub fn history_markdown(transcript: &Transcript) -> String {
    transcript
        .turns()
        .iter()
        .map(|turn| {
            turn.entries()
                .map(|entry| {
                    let label = transcript.labels().label(entry.speaker);
                    format!("**{}:** {}", label, entry.text)
                })
                .collect::<Vec<_>>()
                .join("\n\n")
        })
        .collect::<Vec<_>>()
        .join(TURN_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ephemeral::models::speaker::SpeakerLabels;
    use ephemeral::providers::mock::MockProvider;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Output {
        rendered: Vec<String>,
        notices: Vec<String>,
    }

    struct ScriptedPrompt {
        inputs: VecDeque<Input>,
        output: Rc<RefCell<Output>>,
    }

    impl ScriptedPrompt {
        fn new(inputs: Vec<Input>) -> (Self, Rc<RefCell<Output>>) {
            let output = Rc::new(RefCell::new(Output::default()));
            let prompt = ScriptedPrompt {
                inputs: inputs.into(),
                output: output.clone(),
            };
            (prompt, output)
        }
    }

    impl Prompt for ScriptedPrompt {
        fn render(&mut self, markdown: &str) {
            self.output.borrow_mut().rendered.push(markdown.to_string());
        }

        fn notice(&mut self, text: &str) {
            self.output.borrow_mut().notices.push(text.to_string());
        }

        fn get_input(&mut self) -> Result<Input> {
            Ok(self.inputs.pop_front().unwrap_or(Input::Exit))
        }

        fn show_busy(&mut self) {}

        fn hide_busy(&self) {}

        fn close(&self) {}

        fn ready(&self) {}
    }

    fn labels() -> SpeakerLabels {
        SpeakerLabels::new("You", "Assistant")
    }

    #[tokio::test]
    async fn test_message_renders_reply() {
        let provider = MockProvider::new(vec!["Hello **there**"]);
        let (prompt, output) = ScriptedPrompt::new(vec![Input::Message("hi".to_string())]);
        let mut chat = ChatSession::new(Session::new(labels()), &provider, Box::new(prompt));

        chat.start().await.unwrap();

        assert_eq!(output.borrow().rendered, vec!["Hello **there**"]);
        assert_eq!(
            chat.session().transcript().render_plain(),
            "You: hi\nAssistant: Hello **there**"
        );
    }

    #[tokio::test]
    async fn test_history_view_after_toggle() {
        let provider = MockProvider::new(vec!["a1", "a2"]);
        let (prompt, output) = ScriptedPrompt::new(vec![
            Input::Message("q1".to_string()),
            Input::ToggleHistory,
            Input::Message("q2".to_string()),
        ]);
        let mut chat = ChatSession::new(Session::new(labels()), &provider, Box::new(prompt));

        chat.start().await.unwrap();

        let rendered = &output.borrow().rendered;
        assert_eq!(rendered.len(), 3);
        assert_eq!(rendered[1], "**You:** q1\n\n**Assistant:** a1");
        assert_eq!(
            rendered[2],
            "**You:** q1\n\n**Assistant:** a1\n---\n**You:** q2\n\n**Assistant:** a2"
        );
    }

    #[tokio::test]
    async fn test_attachments_ride_along() {
        let dir = TempDir::new().unwrap();
        let pdf = dir.path().join("report.pdf");
        fs::write(&pdf, b"%PDF-1.4").unwrap();

        let provider = MockProvider::new(vec!["Looks fine.", "Still fine."]);
        let (prompt, output) = ScriptedPrompt::new(vec![
            Input::Attach(vec![pdf.clone(), dir.path().join("notes.txt")]),
            Input::Message("Check this".to_string()),
            Input::Detach,
            Input::Message("And now?".to_string()),
        ]);
        let mut chat = ChatSession::new(Session::new(labels()), &provider, Box::new(prompt));

        chat.start().await.unwrap();

        let requests = provider.requests();
        assert_eq!(requests[0].len(), 2);
        assert_eq!(requests[1].len(), 1);
        assert_eq!(
            chat.session().transcript().render_plain(),
            "You: Check this (Uploaded: report.pdf)\nAssistant: Looks fine.\n\
             You: And now?\nAssistant: Still fine."
        );
        let notices = &output.borrow().notices;
        assert_eq!(notices[0], "Attached report.pdf (application/pdf)");
        assert!(notices[1].contains("not an accepted file type"));
    }

    #[tokio::test]
    async fn test_failed_turn_shows_error() {
        let provider = MockProvider::scripted(vec![Err("quota exceeded".to_string())]);
        let (prompt, output) = ScriptedPrompt::new(vec![Input::Message("hi".to_string())]);
        let mut chat = ChatSession::new(Session::new(labels()), &provider, Box::new(prompt));

        chat.start().await.unwrap();

        assert!(output.borrow().rendered.is_empty());
        assert!(output.borrow().notices[0].contains("quota exceeded"));
        assert!(chat.session().transcript().is_empty());
    }

    #[tokio::test]
    async fn test_export_and_clear() {
        let dir = TempDir::new().unwrap();
        let txt = dir.path().join("chat.txt");
        let provider = MockProvider::new(vec!["hi there"]);
        let (prompt, _output) = ScriptedPrompt::new(vec![
            Input::Message("hello".to_string()),
            Input::Export {
                format: ExportFormat::Text,
                path: Some(txt.clone()),
            },
            Input::Clear,
        ]);
        let mut chat = ChatSession::new(Session::new(labels()), &provider, Box::new(prompt));

        chat.start().await.unwrap();

        assert_eq!(
            fs::read_to_string(&txt).unwrap(),
            "You: hello\nAssistant: hi there"
        );
        assert!(chat.session().transcript().is_empty());
        assert_eq!(chat.session().last_response(), "hi there");
    }

    #[test]
    fn test_history_markdown_empty() {
        assert_eq!(history_markdown(&Transcript::default()), "");
    }
}
