//! med-qa-tui: interactive terminal chat with the medical RAG assistant.
//!
//! Usage:
//!   med-qa-tui [--config <PATH>]

use std::io::{self, IsTerminal};
use std::panic;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use med_qa_client::config;
use med_qa_client::{ChatSession, Conversation, ProfanityFilter, RagClient};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use med_qa_tui::App;

#[derive(Parser)]
#[command(name = "med-qa-tui", about = "Chat with the medical RAG assistant")]
struct Cli {
    /// Config file (default: ~/.med-qa/config.yaml)
    #[arg(long, env = "MED_QA_CONFIG")]
    config: Option<PathBuf>,
}

/// Log to `~/.med-qa/med-qa-tui.log`; the terminal belongs to the UI.
fn init_logging() -> anyhow::Result<()> {
    let Some(dir) = config::config_dir() else {
        return Ok(());
    };
    std::fs::create_dir_all(&dir)?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("med-qa-tui.log"))?;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging().context("failed to set up logging")?;

    let cfg = match &cli.config {
        Some(path) => config::load(path)?,
        None => match config::resolve_config_path(None) {
            Ok(path) => config::load_or_default(&path)?,
            Err(_) => config::Config::default(),
        },
    };

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: med-qa-tui requires a terminal (TTY); use med-qa for piped input");
        std::process::exit(1);
    }

    let client = RagClient::new(cfg.resolved())?;
    let session = ChatSession::new(Conversation::new(), ProfanityFilter::default())
        .with_query_type(cfg.default_mode());
    let mut app = App::new(session, Arc::new(client));

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
