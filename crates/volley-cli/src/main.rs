//! volley - multi-turn conversational evaluation over a batch inference API

mod config;
mod dataset;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use volley_batch::{PollPolicy, providers::OpenAIBatchProvider};
use volley_runner::{ConversationStore, Orchestrator, RunSettings, persist};

/// volley - multi-turn batch evaluation runner
#[derive(Parser, Debug)]
#[command(name = "volley")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model to use (default: gpt-4o-mini)
    #[arg(short, long)]
    model: Option<String>,

    /// Completion token limit per request
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Number of turns to run
    #[arg(short, long)]
    turns: Option<usize>,

    /// Follow-up user message appended after each turn
    #[arg(short, long)]
    follow_up: Option<String>,

    /// Behavior dataset CSV path
    #[arg(short, long)]
    dataset: Option<String>,

    /// Category value dataset rows must match
    #[arg(long)]
    category: Option<String>,

    /// Root directory for run artifacts
    #[arg(long)]
    log_root: Option<String>,

    /// Provider completion window (opaque, e.g. 24h)
    #[arg(long)]
    completion_window: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    let filter = if args.verbose {
        "volley=debug,volley_runner=debug,volley_batch=debug"
    } else {
        "volley=info,volley_runner=info,volley_batch=info"
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // Load config file, CLI args take precedence
    let cfg = config::Config::load();

    let model = args
        .model
        .or(cfg.model.clone())
        .unwrap_or_else(|| "gpt-4o-mini".to_string());
    let max_tokens = args.max_tokens.or(cfg.max_tokens).unwrap_or(1000);
    let turns = args.turns.or(cfg.turns).unwrap_or(3);
    let follow_up = args
        .follow_up
        .or(cfg.follow_up.clone())
        .unwrap_or_else(|| "Please answer the question".to_string());
    let log_root = PathBuf::from(
        args.log_root
            .or(cfg.log_root.clone())
            .unwrap_or_else(|| "logs".to_string()),
    );
    let completion_window = args
        .completion_window
        .or(cfg.completion_window.clone())
        .unwrap_or_else(|| "24h".to_string());

    let dataset_path = match args.dataset.or(cfg.dataset.clone()) {
        Some(path) => PathBuf::from(path),
        None => {
            eprintln!("Error: no dataset given");
            eprintln!("Pass --dataset <path> or set `dataset` in the config file");
            std::process::exit(1);
        }
    };

    // Check for API key (config or env)
    let Some(api_key) = cfg.get_api_key() else {
        eprintln!("Error: no OpenAI API key found");
        eprintln!();
        eprintln!("Set your API key with: export OPENAI_API_KEY=your-key");
        eprintln!(
            "Or add it to the config file: {}",
            config::Config::config_path().display()
        );
        std::process::exit(1);
    };

    let options = dataset::DatasetOptions {
        category: args
            .category
            .or(cfg.category.clone())
            .unwrap_or_else(|| "standard".to_string()),
        system_prompt: cfg
            .system_prompt
            .clone()
            .unwrap_or_else(|| "You are a helpful assistant.".to_string()),
        columns: cfg.columns.clone(),
    };

    let seeds = dataset::load_behaviors(&dataset_path, &options)?;
    if seeds.is_empty() {
        eprintln!(
            "Error: no rows in {} match category '{}'",
            dataset_path.display(),
            options.category
        );
        std::process::exit(1);
    }
    let store = ConversationStore::seed(seeds)?;

    let provider = Arc::new(OpenAIBatchProvider::new(api_key));
    let settings = RunSettings {
        model,
        max_tokens,
        log_root,
        completion_window,
        poll: PollPolicy::default(),
    };
    let mut orchestrator = Orchestrator::new(provider, store, settings)?;

    tracing::info!(
        turns,
        conversations = orchestrator.store().len(),
        run_dir = %orchestrator.run_dir().display(),
        "starting run"
    );
    let run_result = orchestrator.run(turns, &follow_up).await;

    // Persist opportunistically: earlier turns' merged progress is kept
    // even when a later turn failed.
    let transcript_path = orchestrator.run_dir().join("transcripts.json");
    persist::write_transcripts(&transcript_path, orchestrator.store())?;
    println!("Transcripts written to {}", transcript_path.display());

    run_result?;
    Ok(())
}
