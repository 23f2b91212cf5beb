mod menu;
mod selection;

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use llmbench_benchmark::{BenchmarkPlan, BenchmarkRunner, OllamaClient};
use llmbench_core::config::normalize_host;
use llmbench_core::{format_csv, format_json, format_reports, LlmBenchConfig};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::menu::{Menu, ModelChoice};
use crate::selection::select_models;

#[derive(Parser, Debug)]
#[command(name = "llmbench")]
#[command(about = "Run benchmarks on your Ollama models.", long_about = None)]
struct Cli {
    /// Stream responses and print per-run stats
    #[arg(short, long)]
    verbose: bool,

    /// Use all available models
    #[arg(short, long)]
    all: bool,

    /// Model names to skip
    #[arg(short, long = "skip-models", num_args = 1.., conflicts_with = "use_models")]
    skip_models: Vec<String>,

    /// Model names to use exclusively
    #[arg(short, long = "use-models", num_args = 1..)]
    use_models: Vec<String>,

    /// Prompts to benchmark with
    #[arg(short, long, num_args = 1..)]
    prompts: Vec<String>,

    /// Number of times each model runs the full prompt list
    #[arg(short, long)]
    repeats: Option<u32>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,

    /// Ollama host URL (overrides OLLAMA_HOST and the config file)
    #[arg(long)]
    host: Option<String>,

    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

fn load_config(cli: &Cli) -> Result<LlmBenchConfig> {
    let mut config = match &cli.config {
        Some(path) => LlmBenchConfig::load(path)?,
        None => LlmBenchConfig::default(),
    }
    .with_env();

    if let Some(host) = &cli.host {
        config.ollama.host = normalize_host(host);
    }
    if let Some(repeats) = cli.repeats {
        config.defaults.repeats = repeats;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    debug!(?config, "Resolved config");

    let timeout = (config.ollama.timeout_secs > 0).then(|| Duration::from_secs(config.ollama.timeout_secs));
    let client = OllamaClient::with_timeout(&config.ollama.host, timeout)?;

    let available = client.list_models().await?;
    if available.is_empty() {
        println!("\nNo models found with ollama. Pull some models first");
        return Ok(());
    }

    let mut verbose = cli.verbose;
    let mut prompts = cli.prompts.clone();
    let choice = if cli.all {
        ModelChoice::All
    } else if !cli.use_models.is_empty() {
        ModelChoice::Use(cli.use_models.clone())
    } else if !cli.skip_models.is_empty() {
        ModelChoice::Skip(cli.skip_models.clone())
    } else {
        let stdin = io::stdin();
        let selection = Menu::new(stdin.lock(), io::stdout(), &available).run(
            verbose,
            prompts.clone(),
            &config.defaults.prompts,
        )?;
        verbose = selection.verbose;
        prompts = selection.prompts;
        selection.models
    };

    if prompts.is_empty() {
        prompts = config.defaults.prompts.clone();
    }

    let models = match &choice {
        ModelChoice::All => available.clone(),
        ModelChoice::Use(use_models) => select_models(&available, use_models, &[])?,
        ModelChoice::Skip(skip_models) => select_models(&available, &[], skip_models)?,
    };

    if models.is_empty() {
        println!("No models selected.");
        return Ok(());
    }

    println!();
    println!("Verbose: {}", verbose);
    println!("Models: {:?}", models);
    if let ModelChoice::Skip(skip_models) = &choice {
        println!("Skip models: {:?}", skip_models);
    }
    println!("Prompts: {:?}", prompts);
    println!("Repeats: {}", config.defaults.repeats);
    if models == available {
        println!("\nRunning benchmark on all available models");
    }

    let plan = BenchmarkPlan {
        models,
        prompts,
        repeats: config.defaults.repeats,
        verbose,
    };

    info!(host = %client.host(), "Running benchmark");
    let runner = BenchmarkRunner::new(client);
    let mut stdout = io::stdout();
    let outcome = runner.run(&plan, &mut stdout).await?;

    for warning in outcome.warnings() {
        eprintln!("Warning: {}", warning);
    }

    match cli.output {
        OutputFormat::Json => println!("{}", format_json(&outcome.reports)?),
        OutputFormat::Csv => print!("{}", format_csv(&outcome.reports)),
        OutputFormat::Table => {
            println!();
            print!("{}", format_reports(&outcome.reports));
        }
    }
    stdout.flush()?;

    Ok(())
}
