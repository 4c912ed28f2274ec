//! Command-line argument parsing for LearnOS Buddy
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::config::Config;

/// LearnOS Buddy - an Operating Systems tutor that answers from your course notes
#[derive(Parser, Debug)]
#[command(name = "learnos-buddy")]
#[command(version)]
#[command(about = "Retrieval-augmented Operating Systems tutor", long_about = None)]
pub struct Args {
    /// Completion model (overrides OPENAI_MODEL and the config file)
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Number of reference passages retrieved per question
    #[arg(short = 'k', long, global = true)]
    pub top_k: Option<usize>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Dotenv file with provider credentials
    #[arg(long, global = true, default_value = ".env")]
    pub env_file: PathBuf,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (only errors are logged)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand (interactive chat when omitted)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start interactive chat in the terminal
    Chat,

    /// Ask a single question and stream the answer to stdout
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Serve the chat API over HTTP with server-sent events
    Serve {
        /// Listen address (overrides LEARNOS_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Display or initialize configuration
    Config {
        /// Write a default config file to the standard location
        #[arg(long)]
        init: bool,
    },
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Subcommand to run, interactive chat by default
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Chat)
    }

    /// Apply flag overrides on top of file and environment settings
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.completion.model = model.clone();
        }
        if let Some(top_k) = self.top_k {
            config.index.top_k = top_k;
        }
        if let Some(Commands::Serve { host, port }) = &self.command {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
        }
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Check if should show the retrieval spinner
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should show retrieved context before each answer
    pub fn show_context(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }
}
