//! REPL (Read-Eval-Print Loop) module for the terminal chat
//!
//! Reads a line, runs it as a command or a chat turn, streams the answer
//! in place. One `ChatSession` per REPL; its history dies with the process.

pub mod commands;
pub mod display;
pub mod input;

use anyhow::{Context, Result};
use colored::*;
use std::path::PathBuf;

use crate::conversation::{ChatEngine, ChatSession, TurnError};
use crate::repl::commands::{is_command, CommandHandler};
pub use crate::repl::display::{DisplayManager, StreamPrinter};
use crate::repl::input::{InputEvent, InputHandler};

/// REPL session coordinator
pub struct ReplSession {
    input_handler: InputHandler,
    command_handler: CommandHandler,
    display_manager: DisplayManager,
    chat: ChatSession,
}

impl ReplSession {
    pub fn new(engine: ChatEngine) -> Result<Self> {
        Ok(Self::with_input(engine, InputHandler::new()?))
    }

    /// Create REPL session with persistent line history
    pub fn with_history(engine: ChatEngine, history_path: PathBuf) -> Result<Self> {
        Ok(Self::with_input(engine, InputHandler::with_history(history_path)?))
    }

    fn with_input(engine: ChatEngine, input_handler: InputHandler) -> Self {
        ReplSession {
            input_handler,
            command_handler: CommandHandler::new(),
            display_manager: DisplayManager::new(),
            chat: ChatSession::new(engine),
        }
    }

    pub fn show_welcome(&self, version: &str) {
        let deps = self.chat.engine().dependencies();
        self.display_manager
            .show_banner(version, &deps.model, deps.index.name());
    }

    /// Main loop; returns on `/exit` or Ctrl-D
    pub async fn run(&mut self) -> Result<()> {
        loop {
            let input = match self.input_handler.read_line()? {
                InputEvent::Line(line) => line,
                InputEvent::Interrupted => {
                    println!("\nUse /exit to quit gracefully");
                    continue;
                }
                InputEvent::Eof => break,
            };

            if !self.handle_input(&input).await? {
                break;
            }
        }

        self.save()
    }

    /// Handle one line; returns false to exit
    pub async fn handle_input(&mut self, input: &str) -> Result<bool> {
        if input.trim().is_empty() {
            return Ok(true);
        }

        if is_command(input) {
            let command = self.command_handler.parse(input);
            return self
                .command_handler
                .execute(command, &mut self.chat, &self.display_manager);
        }

        self.ask(input).await;
        Ok(true)
    }

    /// Run one chat turn with spinner and streamed output
    ///
    /// Failures are shown to the user and never end the REPL.
    pub async fn ask(&mut self, question: &str) {
        let spinner = self.display_manager.start_retrieval();
        let mut printer = StreamPrinter::new();
        let mut started = false;

        let display = &self.display_manager;
        let result = self
            .chat
            .respond(question, |cumulative| {
                if !started {
                    spinner.finish_and_clear();
                    display.start_answer();
                    started = true;
                }
                printer.render(cumulative);
            })
            .await;
        self.display_manager.finish_current();

        match result {
            Ok(outcome) => {
                if !started {
                    self.display_manager.start_answer();
                }
                self.display_manager.end_answer();
                if self.command_handler.is_verbose() {
                    self.display_manager.show_context(Some(&outcome.context));
                }
            }
            Err(TurnError::Stream { source, partial }) if !partial.is_empty() => {
                self.display_manager.show_incomplete(&source.to_string());
            }
            Err(e) => {
                self.display_manager.show_failure(&e.to_string());
            }
        }
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn display(&self) -> &DisplayManager {
        &self.display_manager
    }

    pub fn is_verbose(&self) -> bool {
        self.command_handler.is_verbose()
    }

    pub fn set_verbose(&mut self, enable: bool) {
        self.command_handler.set_verbose(enable);
    }

    pub fn save(&mut self) -> Result<()> {
        self.input_handler
            .save_history()
            .context("Failed to save line history")
    }
}

/// One-shot question: stream the answer to stdout, error on failure
pub async fn ask_once(engine: ChatEngine, question: &str, show_progress: bool) -> Result<()> {
    let mut session = ChatSession::new(engine);
    let mut display = DisplayManager::new();
    let spinner = show_progress.then(|| display.start_retrieval());
    let mut printer = StreamPrinter::new();

    let result = session
        .respond(question, |cumulative| {
            if let Some(spinner) = &spinner {
                spinner.finish_and_clear();
            }
            printer.render(cumulative);
        })
        .await;
    display.finish_current();

    match result {
        Ok(_) => {
            println!();
            Ok(())
        }
        Err(e) => {
            if e.partial().is_some() {
                println!();
            }
            eprintln!("{} {}", "✗".red().bold(), e.to_string().red());
            Err(anyhow::Error::new(e).context("question could not be answered"))
        }
    }
}
