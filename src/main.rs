//! LearnOS Buddy - Main CLI Entry Point

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use learnos_buddy::{
    cli::{Args, Commands, Config},
    conversation::{ChatEngine, Dependencies},
    repl::{ask_once, ReplSession},
    server, telemetry,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // A missing .env is fine; credentials may come from the real environment
    dotenvy::from_path(&args.env_file).ok();
    telemetry::init(args.verbosity());

    let config = load_config(&args)?;

    match args.command() {
        Commands::Chat => run_repl(&config).await?,
        Commands::Ask { question } => {
            let engine = build_engine(&config).await?;
            ask_once(engine, &question.join(" "), args.verbosity().show_progress()).await?;
        }
        Commands::Serve { .. } => {
            let engine = build_engine(&config).await?;
            server::serve(engine, &config.listen_addr()).await?;
        }
        Commands::Config { init } => {
            if init {
                init_config()?;
            } else {
                show_config(&args, &config)?;
            }
        }
    }

    Ok(())
}

/// File, then environment, then flags
fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(args.config.clone())?;
    config.apply_env(|key| std::env::var(key).ok())?;
    args.apply_to(&mut config);
    Ok(config)
}

async fn build_engine(config: &Config) -> Result<ChatEngine> {
    config.validate()?;
    let deps = Dependencies::from_config(config)
        .await
        .context("failed to connect providers")?;
    Ok(ChatEngine::new(Arc::new(deps)))
}

async fn run_repl(config: &Config) -> Result<()> {
    let engine = build_engine(config).await?;

    let mut repl_session = match Config::history_path() {
        Some(path) => ReplSession::with_history(engine, path)?,
        None => ReplSession::new(engine)?,
    };

    repl_session.show_welcome(VERSION);
    repl_session.run().await
}

fn init_config() -> Result<()> {
    let path = Config::default_path().context("could not determine home directory")?;
    if path.exists() {
        println!("{} {}", "Config already exists:".yellow(), path.display());
        return Ok(());
    }

    Config::default().save(&path)?;
    println!("{} {}", "✓ Wrote default config to".green(), path.display());
    println!("  Fill in the API keys or set them in .env before chatting.");
    Ok(())
}

fn show_config(args: &Args, config: &Config) -> Result<()> {
    println!("{}", "LearnOS Buddy Configuration".bold().cyan());
    println!("{}", "=".repeat(40).cyan());

    match (&args.config, Config::default_path()) {
        (Some(path), _) => println!("File: {}", path.display()),
        (None, Some(path)) if path.exists() => println!("File: {}", path.display()),
        _ => println!("File: {}", "<none, using defaults>".dimmed()),
    }
    println!("Verbosity: {}", args.verbosity().as_str());
    println!();

    let rendered = toml::to_string_pretty(&config.redacted())
        .context("failed to render configuration")?;
    println!("{}", rendered);

    if let Err(e) = config.validate() {
        println!("{} {}", "Incomplete:".yellow().bold(), e);
    }

    Ok(())
}
