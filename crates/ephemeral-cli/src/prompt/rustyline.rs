use std::io::{self, Write};

use anyhow::Result;
use bat::WrappingMode;
use cliclack::spinner;
use console::style;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use super::{parse_input, Input, Prompt, Theme, HELP};

const PROMPT: &str = "\x1b[1m\x1b[38;5;30m> \x1b[0m";

pub struct RustylinePrompt {
    editor: DefaultEditor,
    spinner: cliclack::ProgressBar,
    theme: Theme,
}

impl RustylinePrompt {
    pub fn new() -> Result<Self> {
        Ok(RustylinePrompt {
            editor: DefaultEditor::new()?,
            spinner: spinner(),
            theme: Theme::Dark,
        })
    }
}

fn print_markdown(content: &str, theme: &str) {
    let printed = bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .theme(theme)
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print();
    if let Err(e) = printed {
        tracing::debug!(error = %e, "markdown highlighting failed");
        println!("{}", content);
    }
}

impl Prompt for RustylinePrompt {
    fn render(&mut self, markdown: &str) {
        print_markdown(markdown, self.theme.bat_theme());
        println!();
        let _ = io::stdout().flush();
    }

    fn notice(&mut self, text: &str) {
        println!("{}", style(text).yellow());
    }

    fn show_busy(&mut self) {
        self.spinner = spinner();
        self.spinner.start("Thinking...");
    }

    fn hide_busy(&self) {
        self.spinner.stop("");
    }

    fn get_input(&mut self) -> Result<Input> {
        let line = match self.editor.readline(PROMPT) {
            Ok(text) => text,
            Err(e) => {
                match e {
                    ReadlineError::Interrupted | ReadlineError::Eof => (),
                    _ => eprintln!("Input error: {}", e),
                }
                return Ok(Input::Exit);
            }
        };
        if !line.trim().is_empty() {
            let _ = self.editor.add_history_entry(line.trim());
        }

        match parse_input(&line) {
            Input::ToggleTheme => {
                self.theme = match self.theme {
                    Theme::Light => {
                        println!("Switching to Dark theme");
                        Theme::Dark
                    }
                    Theme::Dark => {
                        println!("Switching to Light theme");
                        Theme::Light
                    }
                };
                Ok(Input::AskAgain)
            }
            Input::Help => {
                println!("{}", HELP);
                Ok(Input::AskAgain)
            }
            input => Ok(input),
        }
    }

    fn close(&self) {
        println!("{}", style("Session closed. The conversation was not saved.").dim());
    }
}
