//! Input handler for the chat REPL using rustyline
//!
//! Line editing plus history persisted across runs. Conversation history
//! is separate and never written to disk.

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::history::History as _;
use rustyline::DefaultEditor;
use std::path::PathBuf;

/// Default prompt
pub const PROMPT: &str = "you ❯ ";

/// What the user did at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A line of text, trimmed; may be empty
    Line(String),

    /// Ctrl-C
    Interrupted,

    /// Ctrl-D
    Eof,
}

pub struct InputHandler {
    editor: DefaultEditor,
    history_path: Option<PathBuf>,
    prompt: String,
}

impl InputHandler {
    pub fn new() -> Result<Self> {
        Ok(InputHandler {
            editor: DefaultEditor::new()?,
            history_path: None,
            prompt: PROMPT.to_string(),
        })
    }

    /// Create input handler with persistent line history
    pub fn with_history(history_file: PathBuf) -> Result<Self> {
        let mut editor = DefaultEditor::new()?;

        if history_file.exists() {
            let _ = editor.load_history(&history_file);
        }

        Ok(InputHandler {
            editor,
            history_path: Some(history_file),
            prompt: PROMPT.to_string(),
        })
    }

    pub fn set_prompt(&mut self, prompt: String) {
        self.prompt = prompt;
    }

    /// Read one line; blocks until the user presses enter
    pub fn read_line(&mut self) -> Result<InputEvent> {
        match self.editor.readline(&self.prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    let _ = self.editor.add_history_entry(trimmed);
                }
                Ok(InputEvent::Line(trimmed.to_string()))
            }
            Err(ReadlineError::Interrupted) => Ok(InputEvent::Interrupted),
            Err(ReadlineError::Eof) => Ok(InputEvent::Eof),
            Err(err) => Err(anyhow::anyhow!("Readline error: {}", err)),
        }
    }

    /// Save line history to disk
    pub fn save_history(&mut self) -> Result<()> {
        if let Some(ref path) = self.history_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            self.editor.save_history(path)?;
        }
        Ok(())
    }

    pub fn clear_history(&mut self) {
        let _ = self.editor.history_mut().clear();
    }

    pub fn history_len(&self) -> usize {
        self.editor.history().len()
    }
}
