//! med-qa: one-shot CLI for the medical RAG assistant.
//! Reads config, sends a question from the argument or stdin, prints the
//! answer and the retrieved background knowledge to stdout.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use med_qa_client::config;
use med_qa_client::{ChatSession, QueryType, RagClient, TurnOutcome};

#[derive(Parser)]
#[command(name = "med-qa", about = "Ask the medical RAG assistant a single question")]
struct Cli {
    /// Config file (default: ~/.med-qa/config.yaml)
    #[arg(long, env = "MED_QA_CONFIG")]
    config: Option<PathBuf>,

    /// Conversation mode: qa, agent or risk (default from config)
    #[arg(long)]
    mode: Option<QueryType>,

    /// Question; read from stdin when omitted
    question: Option<String>,
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> config::Config {
    // An explicit path must exist; the default path may be absent.
    let result = match &cli.config {
        Some(path) => config::load(path),
        None => match config::resolve_config_path(None) {
            Ok(path) => config::load_or_default(&path),
            Err(_) => Ok(config::Config::default()),
        },
    };
    result.unwrap_or_else(|e| {
        eprintln!("Error: failed to load config: {}", e);
        process::exit(1);
    })
}

fn read_question(cli: &Cli) -> String {
    if let Some(q) = &cli.question {
        return q.trim().to_string();
    }
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).unwrap_or(0);
    line.trim().to_string()
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let cfg = load_config(&cli);

    let question = read_question(&cli);
    if question.is_empty() {
        eprintln!("Error: no question provided (argument or stdin)");
        process::exit(1);
    }

    let mode = cli.mode.unwrap_or_else(|| cfg.default_mode());
    let client = RagClient::new(cfg.resolved()).unwrap_or_else(|e| {
        eprintln!("Error: failed to create HTTP client: {}", e);
        process::exit(1);
    });

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Error: failed to create runtime: {}", e);
            process::exit(1);
        });

    let mut session = ChatSession::default().with_query_type(mode);
    session.set_input(question);

    let outcome = rt.block_on(session.run_turn(&client));
    match outcome {
        Ok(TurnOutcome::Answered) => {}
        Ok(_) => {
            eprintln!("{}", session.alert().unwrap_or("Error: request failed"));
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }

    let conversation = session.conversation();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Some(answer) = conversation.messages().last() {
        let _ = writeln!(out, "{}", answer.text);
    }
    if !conversation.knowledge().is_empty() {
        let _ = writeln!(out, "\nBackground knowledge:");
        let _ = writeln!(out, "{}", conversation.knowledge());
    }
}
