use std::path::PathBuf;

use anyhow::Result;
use ephemeral::export::ExportFormat;

pub mod rustyline;

pub trait Prompt {
    /// Print markdown, highlighted for the terminal
    fn render(&mut self, markdown: &str);
    /// Print a short status or warning line
    fn notice(&mut self, text: &str);
    fn get_input(&mut self) -> Result<Input>;
    fn show_busy(&mut self);
    fn hide_busy(&self);
    fn close(&self);
    fn ready(&self) {
        println!();
        println!("This chat is temporary: nothing is saved once you exit.");
        println!("Use /export txt or /export pdf to keep a copy. Type /help for commands.");
        println!();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    AskAgain, // Ask the user for input again. Control flow command.
    Message(String),
    Attach(Vec<PathBuf>),
    Detach,
    ToggleHistory,
    Export {
        format: ExportFormat,
        path: Option<PathBuf>,
    },
    Clear,
    ClearResponse,
    ToggleTheme,
    Help,
    Invalid(String),
    Exit,
}

pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn bat_theme(&self) -> &'static str {
        match self {
            Theme::Light => "GitHub",
            Theme::Dark => "zenburn",
        }
    }
}

pub const HELP: &str = "\
Commands:
/attach <path>... - Attach files to the following messages (png, jpg, jpeg, gif, webp, bmp, pdf, docx)
/detach - Remove all attached files
/history - Show or hide the conversation history
/export txt|pdf [path] - Save the conversation
/clear - Clear the conversation history
/clear-response - Clear the last response
/t - Toggle Light/Dark theme
/? | /help - Display this help message
/exit - Exit the session";

/// Interpret one line of user input
pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::AskAgain;
    }
    if !line.starts_with('/') {
        return Input::Message(line.to_string());
    }

    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or_default().to_ascii_lowercase();
    let args: Vec<&str> = words.collect();

    match command.as_str() {
        "/exit" | "/quit" => Input::Exit,
        "/attach" if args.is_empty() => Input::Invalid("Usage: /attach <path>...".to_string()),
        "/attach" => Input::Attach(args.into_iter().map(PathBuf::from).collect()),
        "/detach" => Input::Detach,
        "/history" => Input::ToggleHistory,
        "/export" => match args.as_slice() {
            [format] | [format, _] => match ExportFormat::parse(format) {
                Some(format) => Input::Export {
                    format,
                    path: args.get(1).map(PathBuf::from),
                },
                None => Input::Invalid(format!("Unknown export format: {}", format)),
            },
            _ => Input::Invalid("Usage: /export txt|pdf [path]".to_string()),
        },
        "/clear" => Input::Clear,
        "/clear-response" => Input::ClearResponse,
        "/t" => Input::ToggleTheme,
        "/?" | "/help" => Input::Help,
        other => Input::Invalid(format!("Unknown command: {}", other)),
    }
}
