//! prosearch - command-line entry point
//!
//! Loads configuration, wires the Gemini backend into the research
//! coordinator and prints the cited answer.

use anyhow::Context;
use prosearch::{
    cli::{output::Output, Cli, Commands},
    research::{ResearchCoordinator, ResearchOptions},
    GeminiFactory, ProsearchConfig,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let mut config = match &cli.config {
        Some(path) => ProsearchConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ProsearchConfig::load_or_default(cli.config_path())?,
    };
    config
        .apply_env_overrides()
        .context("Invalid environment override")?;

    init_tracing(&cli, &config);

    match cli.command {
        Commands::Research {
            topic,
            initial_queries,
            max_loops,
            reasoning_model,
            json,
        } => {
            let options = ResearchOptions {
                initial_query_count: initial_queries,
                max_rounds: max_loops,
                reasoning_model,
            };
            run_research(&output, &config, &topic, options, json).await
        }
        Commands::Config { validate } => show_config(&output, &config, validate),
    }
}

/// Log level comes from `RUST_LOG`, then `--verbose`, then configuration
fn init_tracing(cli: &Cli, config: &ProsearchConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if cli.verbose {
            "debug"
        } else {
            config.logging.level.as_str()
        };
        format!("prosearch={}", level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json || config.logging.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run_research(
    output: &Output,
    config: &ProsearchConfig,
    topic: &str,
    options: ResearchOptions,
    json: bool,
) -> anyhow::Result<()> {
    let factory = Arc::new(GeminiFactory::from_config(config)?);
    let coordinator = ResearchCoordinator::new(factory, config.research.clone());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling research");
            on_interrupt.cancel();
        }
    });

    if !json {
        output.banner(topic);
    }

    let outcome = match coordinator
        .run_with_cancellation(topic, options, cancel)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            output.error(&e.to_string());
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    output.answer(&outcome.answer.content);

    output.header("Sources");
    output.sources(&outcome.cited_sources);

    output.header("Research");
    output.rounds(&outcome.round_summaries);
    output.kv("Run", &outcome.run_id);
    output.kv("Queries", &outcome.executed_queries.len().to_string());
    output.kv("Duration", &format!("{} ms", outcome.duration_ms));
    if !outcome.knowledge_gap.is_empty() {
        output.warning(&format!("Open gap: {}", outcome.knowledge_gap));
    }

    Ok(())
}

fn show_config(output: &Output, config: &ProsearchConfig, validate: bool) -> anyhow::Result<()> {
    output.header("Research");
    output.kv(
        "Initial queries",
        &config.research.number_of_initial_queries.to_string(),
    );
    output.kv(
        "Max research loops",
        &config.research.max_research_loops.to_string(),
    );
    output.kv("Query model", &config.research.query_generator_model);
    output.kv("Reasoning model", &config.research.reasoning_model);

    output.header("Provider");
    output.kv("API base", &config.provider.api_base);
    output.kv("API key variable", &config.provider.api_key_env);
    output.kv(
        "Timeout",
        &format!("{}s", config.provider.request_timeout_secs),
    );
    output.kv("Max retries", &config.provider.max_retries.to_string());

    output.header("Logging");
    output.kv("Level", &config.logging.level);
    output.kv("JSON", &config.logging.json.to_string());

    if validate {
        config.validate()?;
        match config.api_key() {
            Ok(_) => output.success("Configuration is valid"),
            Err(e) => {
                output.error(&e.to_string());
                output.hint(&format!(
                    "Set {} in the environment or a .env file",
                    config.provider.api_key_env
                ));
                return Err(e.into());
            }
        }
    }

    Ok(())
}
