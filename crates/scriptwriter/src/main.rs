//! `scriptwriter` — write a long-form video script within a word budget.
//!
//! # Usage
//!
//! ```bash
//! # Demo topic, 1000 words
//! LLM_API_KEY=... scriptwriter
//!
//! # Custom topic and budget, JSON outcome on stdout
//! scriptwriter "The history of the printing press" --max-words 2500 --json
//!
//! # Settings from a file, script written to disk
//! scriptwriter "Tidal energy" --config scriptwriter.toml --output script.txt
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use scriptwriter::{OverrunPolicy, RigScriptModel, ScriptConfig, ScriptGenerator};
use tracing::info;

const DEFAULT_TOPIC: &str = "The story of a farmer and his golden egg laying goose.";
const DEFAULT_MAX_WORDS: u32 = 1000;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// What the script is about
    #[arg(default_value = DEFAULT_TOPIC)]
    topic: String,

    /// Word budget for the finished script (10..=40000)
    #[arg(long, default_value_t = DEFAULT_MAX_WORDS)]
    max_words: u32,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum continuation steps (overrides config)
    #[arg(long)]
    max_iterations: Option<u32>,

    /// What to do when a continuation overshoots the budget (overrides config)
    #[arg(long, value_enum)]
    overrun_policy: Option<OverrunPolicy>,

    /// Model name (overrides LLM_MODEL_NAME)
    #[arg(long)]
    model: Option<String>,

    /// OpenAI-compatible base URL (overrides LLM_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Print the full outcome as JSON instead of the script
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Also write the script to this file
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Args {
    fn apply(&self, config: &mut ScriptConfig) {
        if let Some(n) = self.max_iterations {
            config.generation.max_iterations = n;
        }
        if let Some(policy) = self.overrun_policy {
            config.generation.overrun_policy = policy;
        }
        if let Some(ref model) = self.model {
            config.provider.model = model.clone();
        }
        if let Some(ref url) = self.base_url {
            config.provider.base_url = url.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = ScriptConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    info!(
        base_url = %config.provider.base_url,
        model = %config.provider.model,
        max_words = args.max_words,
        "scriptwriter starting"
    );

    let model = RigScriptModel::from_config(&config.provider)?;
    let generator = ScriptGenerator::new(model, config.generation.clone());
    let outcome = generator
        .generate(&args.topic, args.max_words)
        .await
        .context("script generation failed")?;

    if let Some(ref path) = args.output {
        std::fs::write(path, outcome.script())
            .context(format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "script written");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("SCRIPT:\n{}", outcome.script());
    }

    info!(
        word_count = outcome.word_count(),
        iterations = outcome.iterations,
        reason = %outcome.reason,
        "done"
    );

    Ok(())
}
