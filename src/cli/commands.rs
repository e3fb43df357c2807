//! CLI command definitions for prompt-forge.
//!
//! `take` serves prompts through the persisted queue, `fetch` runs a single
//! fetch round against the provider and `extract` runs the list extractor
//! offline on a file or stdin.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use crate::config::PromptForgeConfig;
use crate::fetcher::ListFetcher;
use crate::llm::{ChatCompletionClient, LlmProvider};
use crate::prompts::{ItemKind, PromptCategory};
use crate::queue::{PromptQueue, QueueState};
use crate::utils::extract_list;

/// Default number of prompts a refill should cover.
const DEFAULT_QUANTITY_HINT: usize = 100;

/// Prompt acquisition for network validators.
#[derive(Parser)]
#[command(name = "prompt-forge")]
#[command(about = "Fetch, extract and serve LLM-generated validator prompts")]
#[command(version)]
#[command(
    long_about = "prompt-forge asks an OpenAI-compatible LLM for themed prompt lists, recovers the lists from free-form replies and serves them one at a time from a persisted queue.\n\nExample usage:\n  prompt-forge take --category text --count 3\n  prompt-forge fetch --category images --quantity 40 --theme \"Neon Nights\"\n  echo '1. a 2. b' | prompt-forge extract"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// Path to a YAML configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Take prompts from the queue, refilling it from the LLM when empty.
    Take(TakeArgs),

    /// Run one fetch round and print the resulting list.
    Fetch(FetchArgs),

    /// Extract a list from free-form text (file or stdin).
    Extract(ExtractArgs),
}

/// Provider overrides shared by commands that talk to the LLM.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ProviderArgs {
    /// API key (overrides the variable named by `provider.api_key_env`).
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API.
    #[arg(long, env = "OPENAI_API_BASE")]
    pub api_base: Option<String>,
}

/// Arguments for `prompt-forge take`.
#[derive(Parser, Debug)]
pub struct TakeArgs {
    /// Prompt category (text, images).
    #[arg(long)]
    pub category: PromptCategory,

    /// Which cell to take from (questions, themes).
    #[arg(long, default_value = "questions")]
    pub kind: ItemKind,

    /// Number of items to take.
    #[arg(short = 'n', long, default_value = "1")]
    pub count: usize,

    /// Number of prompts a refill should aim to produce.
    #[arg(long, default_value_t = DEFAULT_QUANTITY_HINT)]
    pub quantity_hint: usize,

    /// Queue state file (overrides `queue.state_path`).
    #[arg(long)]
    pub state: Option<PathBuf>,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

/// Arguments for `prompt-forge fetch`.
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Prompt category (text, images).
    #[arg(long)]
    pub category: PromptCategory,

    /// Number of prompts wanted.
    #[arg(short, long, default_value = "10")]
    pub quantity: usize,

    /// Theme to interpolate into the instructions.
    #[arg(short, long)]
    pub theme: Option<String>,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

/// Arguments for `prompt-forge extract`.
#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// File holding the reply text. Reads stdin when omitted.
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

/// Parse CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
///
/// For more control over logging initialization, use `parse_cli()` and `run_with_cli()`.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Take(args) => run_take_command(args, &config).await,
        Commands::Fetch(args) => run_fetch_command(args, &config).await,
        Commands::Extract(args) => run_extract_command(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PromptForgeConfig> {
    match path {
        Some(path) => PromptForgeConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(PromptForgeConfig::default()),
    }
}

/// Builds the provider client. `require_key` fails early when no key is set.
fn build_provider(
    args: &ProviderArgs,
    config: &PromptForgeConfig,
    require_key: bool,
) -> anyhow::Result<Arc<dyn LlmProvider>> {
    let api_key = args
        .api_key
        .clone()
        .or_else(|| std::env::var(&config.provider.api_key_env).ok());

    if require_key && api_key.is_none() {
        anyhow::bail!(
            "{} is required but not set.\n\
             Provide it via --api-key <KEY> or set the {} environment variable.",
            config.provider.api_key_env,
            config.provider.api_key_env
        );
    }

    let api_base = args
        .api_base
        .clone()
        .unwrap_or_else(|| config.provider.api_base.clone());
    info!(api_base = %api_base, "Using OpenAI-compatible provider");

    let client = ChatCompletionClient::new(
        api_base,
        api_key,
        Duration::from_secs(config.provider.request_timeout_secs),
    )
    .context("Failed to initialize LLM client")?;
    Ok(Arc::new(client))
}

async fn run_take_command(args: TakeArgs, config: &PromptForgeConfig) -> anyhow::Result<()> {
    let provider = build_provider(&args.provider, config, args.kind == ItemKind::Questions)?;
    let state_path = args
        .state
        .clone()
        .unwrap_or_else(|| config.queue.state_path.clone());

    let fetcher = Arc::new(ListFetcher::from_config(provider, config));
    let queue = PromptQueue::from_config(fetcher, config)
        .with_state(QueueState::load_or_default(&state_path));

    let mut outcome = Ok(());
    for _ in 0..args.count {
        match queue
            .take_one(args.category, args.kind, args.quantity_hint)
            .await
        {
            Ok(Some(item)) => println!("{}", serde_json::to_string(&item)?),
            Ok(None) => {
                warn!(category = %args.category, kind = %args.kind, "Nothing to serve");
                break;
            }
            Err(e) => {
                outcome = Err(e);
                break;
            }
        }
    }

    let mut state = queue.snapshot().await;
    state
        .save(&state_path)
        .with_context(|| format!("Failed to save queue state to {}", state_path.display()))?;

    outcome.context("Failed to take from the prompt queue")
}

async fn run_fetch_command(args: FetchArgs, config: &PromptForgeConfig) -> anyhow::Result<()> {
    let provider = build_provider(&args.provider, config, true)?;
    let fetcher = ListFetcher::from_config(provider, config);

    let items = fetcher
        .fetch_list(
            args.category.question_list(),
            args.quantity,
            args.theme.as_deref(),
        )
        .await
        .context("No usable list could be fetched")?;

    println!("{}", serde_json::to_string_pretty(&items)?);
    Ok(())
}

fn run_extract_command(args: ExtractArgs) -> anyhow::Result<()> {
    let text = read_input(args.file.as_deref())?;
    let items = extract_list(&text).context("No list found in input")?;
    println!("{}", serde_json::to_string_pretty(&items)?);
    Ok(())
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}
