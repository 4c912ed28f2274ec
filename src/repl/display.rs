//! Display manager for the chat REPL
//!
//! Banner, retrieval spinner, incremental answer printing and failure
//! indicators. Everything user-facing goes to stdout; logs go to stderr.

use colored::*;
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

use crate::types::History;

/// Part of `cumulative` not yet printed
///
/// Cumulative values only grow, so this is the suffix after `printed`.
/// If a value ever fails to extend what was printed, the whole value is
/// returned so nothing is lost.
pub fn new_suffix<'a>(printed: &str, cumulative: &'a str) -> &'a str {
    match cumulative.strip_prefix(printed) {
        Some(rest) => rest,
        None => cumulative,
    }
}

/// Prints only the growth of a cumulative answer
#[derive(Debug, Default)]
pub struct StreamPrinter {
    printed: String,
}

impl StreamPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the new suffix of `cumulative` to `out`
    pub fn render_to<W: Write>(&mut self, out: &mut W, cumulative: &str) -> io::Result<()> {
        let suffix = new_suffix(&self.printed, cumulative);
        if suffix.is_empty() {
            return Ok(());
        }
        out.write_all(suffix.as_bytes())?;
        out.flush()?;
        self.printed = cumulative.to_string();
        Ok(())
    }

    pub fn render(&mut self, cumulative: &str) {
        // stdout write failures end up as a truncated answer on screen; the
        // turn itself still completes
        let _ = self.render_to(&mut io::stdout(), cumulative);
    }

    pub fn printed(&self) -> &str {
        &self.printed
    }
}

/// Display manager for REPL UI
pub struct DisplayManager {
    current_spinner: Option<ProgressBar>,
    update_interval: Duration,
}

impl DisplayManager {
    /// Spinner frame interval: 10 FPS
    pub fn new() -> Self {
        DisplayManager {
            current_spinner: None,
            update_interval: Duration::from_millis(100),
        }
    }

    /// Show welcome banner
    pub fn show_banner(&self, version: &str, model: &str, index: &str) {
        let width = 64;
        let rule = "=".repeat(width).cyan();
        let title = format!("  LearnOS Buddy {} - Operating Systems tutor", version);
        let info = format!("  Model: {} | Notes: {} | Mode: Chat", model, index);

        println!("\n{}", rule);
        println!("{}", title.bold().cyan());
        println!("{}", info.dimmed());
        println!("{}\n", rule);
        println!(
            "Say hi to get started (or {} for commands, {} to quit)\n",
            "/help".green(),
            "/exit".green()
        );
    }

    /// Spinner shown while the notes are searched
    pub fn start_retrieval(&mut self) -> ProgressBar {
        self.finish_current();

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message("Searching notes...");
        pb.enable_steady_tick(self.update_interval);

        self.current_spinner = Some(pb.clone());
        pb
    }

    /// Remove the spinner, if any
    pub fn finish_current(&mut self) {
        if let Some(pb) = self.current_spinner.take() {
            pb.finish_and_clear();
        }
    }

    /// Prefix printed before the streamed answer
    pub fn start_answer(&self) {
        print!("{} ", "buddy ❯".magenta().bold());
        let _ = io::stdout().flush();
    }

    pub fn end_answer(&self) {
        println!("\n");
    }

    /// Red marker after an answer that did not finish
    pub fn show_incomplete(&self, reason: &str) {
        println!();
        println!("{} {}", "✗ Answer incomplete:".red().bold(), reason.red());
        println!();
    }

    /// Failure before any answer text was shown
    pub fn show_failure(&self, reason: &str) {
        println!("{} {}", "✗".red().bold(), reason.red());
        println!();
    }

    pub fn show_error(&self, error: &str) {
        println!("{} {}", "Error:".red().bold(), error.red());
    }

    pub fn show_warning(&self, warning: &str) {
        println!("{} {}", "Warning:".yellow().bold(), warning.yellow());
    }

    pub fn show_info(&self, info: &str) {
        println!("{} {}", "Info:".cyan(), info);
    }

    /// Conversation so far, oldest first, at most `limit` turns
    pub fn show_history(&self, history: &History, limit: usize, verbose: bool) {
        if history.is_empty() {
            println!("{}", "No questions asked yet.".yellow());
            return;
        }

        let mut recent = history.recent(limit);
        recent.reverse();
        let first_index = history.len() - recent.len() + 1;

        println!("\n{}", format!("Conversation (last {}):", recent.len()).bold().cyan());
        println!("{}", "=".repeat(60).cyan());
        for (offset, turn) in recent.iter().enumerate() {
            println!("  {}. {}", (first_index + offset).to_string().cyan(), turn.user);
            let answer = if verbose {
                turn.assistant.clone()
            } else {
                preview(&turn.assistant, 80)
            };
            println!("     {}", answer.dimmed());
        }
        println!();
    }

    /// Text retrieved for the last turn
    pub fn show_context(&self, context: Option<&str>) {
        match context {
            None => println!("{}", "No context retrieved yet.".yellow()),
            Some("") => println!("{}", "The last search matched nothing in the notes.".yellow()),
            Some(context) => {
                println!("\n{}", "Retrieved Context:".bold().cyan());
                println!("{}", "=".repeat(60).cyan());
                println!("{}\n", context);
            }
        }
    }

    /// Clear screen
    pub fn clear_screen(&self) -> io::Result<()> {
        execute!(io::stdout(), Clear(ClearType::All), cursor::MoveTo(0, 0))
    }
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}

/// First line of `text`, cut to `max_chars`
pub fn preview(text: &str, max_chars: usize) -> String {
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() <= max_chars && line.len() == text.len() {
        return line.to_string();
    }
    let cut: String = line.chars().take(max_chars).collect();
    format!("{}…", cut)
}
