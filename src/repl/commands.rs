//! Built-in REPL commands
//!
//! Anything starting with `/` is a command; everything else is a question.

use anyhow::Result;
use colored::*;

use crate::conversation::ChatSession;
use crate::repl::display::DisplayManager;

/// Turns shown by `/history` without an argument
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// REPL command types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    History { limit: Option<usize> },
    Context,
    Reset,
    Exit,
    Verbose { enable: bool },
    Clear,
    Unknown { input: String },
}

/// Command handler for parsing and executing REPL commands
pub struct CommandHandler {
    verbose: bool,
}

impl CommandHandler {
    pub fn new() -> Self {
        CommandHandler { verbose: false }
    }

    pub fn parse(&self, input: &str) -> Command {
        let trimmed = input.trim();

        let Some(body) = trimmed.strip_prefix('/') else {
            return Command::Unknown { input: input.to_string() };
        };

        let parts: Vec<&str> = body.split_whitespace().collect();
        let Some(name) = parts.first() else {
            return Command::Unknown { input: input.to_string() };
        };

        match name.to_lowercase().as_str() {
            "help" | "h" => Command::Help,
            "exit" | "quit" | "q" => Command::Exit,
            "history" => {
                let limit = parts.get(1).and_then(|s| s.parse().ok());
                Command::History { limit }
            }
            "context" | "ctx" => Command::Context,
            "reset" | "new" => Command::Reset,
            "verbose" => {
                let enable = parts
                    .get(1)
                    .map(|s| matches!(s.to_lowercase().as_str(), "on" | "1" | "true"))
                    .unwrap_or(!self.verbose);
                Command::Verbose { enable }
            }
            "clear" | "cls" => Command::Clear,
            _ => Command::Unknown { input: input.to_string() },
        }
    }

    /// Returns false when the REPL should exit
    pub fn execute(
        &mut self,
        command: Command,
        session: &mut ChatSession,
        display: &DisplayManager,
    ) -> Result<bool> {
        match command {
            Command::Help => {
                self.show_help();
            }
            Command::Exit => {
                println!("{}", "Bye! Keep revising 📚".green());
                return Ok(false);
            }
            Command::History { limit } => {
                display.show_history(
                    session.history(),
                    limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
                    self.verbose,
                );
            }
            Command::Context => {
                display.show_context(session.last_context());
            }
            Command::Reset => {
                session.reset();
                println!("{}", "Conversation reset. Starting fresh.".yellow());
            }
            Command::Verbose { enable } => {
                self.verbose = enable;
                let status = if enable { "enabled" } else { "disabled" };
                println!("{}", format!("Verbose mode {}", status).cyan());
            }
            Command::Clear => {
                display.clear_screen()?;
            }
            Command::Unknown { input } => {
                println!("{}", format!("Unknown command: {}", input).red());
                println!("Type {} for available commands", "/help".cyan());
            }
        }
        Ok(true)
    }

    fn show_help(&self) {
        println!("\n{}", "Available Commands:".bold().cyan());
        println!("{}", "=".repeat(60).cyan());

        let commands = [
            ("/help, /h", "Show this help message"),
            ("/history [n]", "Show the last n questions (default: 10)"),
            ("/context, /ctx", "Show notes retrieved for the last question"),
            ("/reset", "Forget the conversation so far"),
            ("/verbose [on|off]", "Show retrieved context after each answer"),
            ("/clear, /cls", "Clear screen"),
            ("/exit, /quit, /q", "Exit"),
        ];

        for (cmd, desc) in commands {
            println!("  {:<20} {}", cmd.green(), desc);
        }

        println!("\n{}", "Usage:".bold());
        println!("  - Ask about any Operating Systems topic (no / prefix)");
        println!("  - Try \"syllabus\", \"exam pattern\" or \"quiz on unit 2\"");
        println!("  - Press {} or type {} to exit", "Ctrl-D".cyan(), "/exit".cyan());
        println!();
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn set_verbose(&mut self, enable: bool) {
        self.verbose = enable;
    }
}

impl Default for CommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if input is a command (starts with /)
pub fn is_command(input: &str) -> bool {
    input.trim().starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::testing::{engine_with, FakeCompletion, FakeEmbedder, FakeIndex};

    fn session() -> ChatSession {
        ChatSession::new(engine_with(
            FakeEmbedder::ok(),
            FakeIndex::with_texts(&["Unit I: Introduction"]),
            FakeCompletion::with_parts(&["Hello!"]),
        ))
    }

    #[test]
    fn test_is_command() {
        assert!(is_command("/help"));
        assert!(is_command(" /help"));
        assert!(!is_command("help"));
        assert!(!is_command("what is /proc?"));
    }

    #[test]
    fn test_parse_basic() {
        let handler = CommandHandler::new();
        assert_eq!(handler.parse("/help"), Command::Help);
        assert_eq!(handler.parse("/h"), Command::Help);
        assert_eq!(handler.parse("/QUIT"), Command::Exit);
        assert_eq!(handler.parse("/ctx"), Command::Context);
        assert_eq!(handler.parse("/reset"), Command::Reset);
        assert_eq!(handler.parse("/cls"), Command::Clear);
    }

    #[test]
    fn test_parse_history() {
        let handler = CommandHandler::new();
        assert_eq!(handler.parse("/history"), Command::History { limit: None });
        assert_eq!(handler.parse("/history 5"), Command::History { limit: Some(5) });
        assert_eq!(handler.parse("/history many"), Command::History { limit: None });
    }

    #[test]
    fn test_parse_verbose() {
        let mut handler = CommandHandler::new();
        assert_eq!(handler.parse("/verbose on"), Command::Verbose { enable: true });
        assert_eq!(handler.parse("/verbose off"), Command::Verbose { enable: false });
        assert_eq!(handler.parse("/verbose"), Command::Verbose { enable: true });

        handler.set_verbose(true);
        assert_eq!(handler.parse("/verbose"), Command::Verbose { enable: false });
    }

    #[test]
    fn test_parse_unknown() {
        let handler = CommandHandler::new();
        assert!(matches!(handler.parse("/files"), Command::Unknown { .. }));
        assert!(matches!(handler.parse("/"), Command::Unknown { .. }));
        assert!(matches!(handler.parse("hello"), Command::Unknown { .. }));
    }

    #[test]
    fn test_execute_exit_and_help() {
        let mut handler = CommandHandler::new();
        let mut session = session();
        let display = DisplayManager::new();

        assert!(handler.execute(Command::Help, &mut session, &display).unwrap());
        assert!(!handler.execute(Command::Exit, &mut session, &display).unwrap());
    }

    #[test]
    fn test_execute_verbose() {
        let mut handler = CommandHandler::new();
        let mut session = session();
        let display = DisplayManager::new();

        handler
            .execute(Command::Verbose { enable: true }, &mut session, &display)
            .unwrap();
        assert!(handler.is_verbose());
    }

    #[tokio::test]
    async fn test_execute_reset_clears_conversation() {
        let mut handler = CommandHandler::new();
        let mut session = session();
        let display = DisplayManager::new();

        session.respond("hi", |_| {}).await.unwrap();
        assert_eq!(session.history().len(), 1);

        assert!(handler.execute(Command::Reset, &mut session, &display).unwrap());
        assert!(session.history().is_empty());
        assert!(session.last_context().is_none());
    }
}
