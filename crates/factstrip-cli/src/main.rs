mod server;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use factstrip_contracts::api::ExplanationResponse;
use factstrip_contracts::Style;
use factstrip_engine::comic::decode_data_url;
use factstrip_engine::providers::DEFAULT_REPLICATE_MODEL;
use factstrip_engine::text::DEFAULT_OPENAI_MODEL;
use factstrip_engine::{
    default_provider_registry, ComicConfig, ComicPipeline, FactChecker, ImageAcquirer,
    OfflineTextProvider, OpenAiChatProvider, ProviderSettings, TextProvider,
};
use image::ImageFormat;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use crate::server::{AppState, ServerConfig};

#[derive(Debug, Parser)]
#[command(
    name = "factstrip",
    version,
    about = "Fact-check statements and draw the answer as a 2x2 comic strip"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Check one statement and write the comic strip as a PNG.
    Check(CheckArgs),
    /// Print the four-step explanation of a fact as JSON.
    Explain(ExplainArgs),
}

#[derive(Debug, Args)]
struct EngineArgs {
    /// `openai` or `offline`.
    #[arg(long, env = "FACTSTRIP_TEXT_PROVIDER", default_value = "openai")]
    text_provider: String,
    /// `replicate`, `dryrun` or `offline`.
    #[arg(long, env = "FACTSTRIP_IMAGE_PROVIDER", default_value = "replicate")]
    image_provider: String,
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_OPENAI_MODEL)]
    text_model: String,
    #[arg(long, env = "REPLICATE_MODEL", default_value = DEFAULT_REPLICATE_MODEL)]
    image_model: String,
    #[arg(long, env = "FACTSTRIP_PANEL_SIZE", default_value_t = 400)]
    panel_size: u32,
    #[arg(long, env = "FACTSTRIP_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,
    #[arg(long, env = "FACTSTRIP_PARALLEL_PANELS")]
    parallel_panels: bool,
}

#[derive(Debug, Args)]
struct ServeArgs {
    #[arg(long, env = "FACTSTRIP_HOST", default_value = "0.0.0.0")]
    host: String,
    #[arg(long, env = "PORT", default_value_t = 5000)]
    port: u16,
    #[arg(long, env = "FACTSTRIP_WORKERS", default_value_t = 4)]
    workers: usize,
    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Debug, Args)]
struct CheckArgs {
    statement: String,
    #[arg(long, default_value = "normal")]
    style: String,
    #[arg(long, default_value = "factstrip.png")]
    out: PathBuf,
    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Debug, Args)]
struct ExplainArgs {
    fact: String,
    #[command(flatten)]
    engine: EngineArgs,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("factstrip error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    dotenv::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => run_serve(args),
        Command::Check(args) => run_check(args),
        Command::Explain(args) => run_explain(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build_checker(args: &EngineArgs) -> Result<(FactChecker, ProviderSettings)> {
    let timeout = Duration::from_secs(args.timeout_secs.max(1));
    let settings = ProviderSettings {
        replicate_model: args.image_model.clone(),
        timeout,
        ..ProviderSettings::from_env()
    };

    let mut registry = default_provider_registry(&settings)?;
    let image_provider = registry.take(&args.image_provider).with_context(|| {
        format!(
            "unknown image provider '{}' (available: {})",
            args.image_provider,
            registry.names().join(", ")
        )
    })?;
    let acquirer = ImageAcquirer::new(image_provider, timeout)?;
    let config = ComicConfig {
        parallel_panels: args.parallel_panels,
        ..ComicConfig::with_panel_size(args.panel_size)
    };
    let pipeline = ComicPipeline::new(acquirer, config).context("invalid comic configuration")?;

    let text: Box<dyn TextProvider> = match args.text_provider.trim() {
        "openai" => Box::new(OpenAiChatProvider::from_env(&args.text_model, timeout)?),
        "offline" => Box::new(OfflineTextProvider),
        other => bail!("unknown text provider '{other}' (available: offline, openai)"),
    };

    tracing::info!(
        text_provider = text.name(),
        image_provider = pipeline.provider_name(),
        panel_size = pipeline.config().panel_size,
        parallel_panels = pipeline.config().parallel_panels,
        "engine ready"
    );
    Ok((FactChecker::new(text, pipeline), settings))
}

fn run_serve(args: ServeArgs) -> Result<i32> {
    let (checker, settings) = build_checker(&args.engine)?;
    if !checker.text_configured() {
        tracing::warn!("OPENAI_API_KEY not set; analyses will use fallback answers");
    }
    if settings.replicate_token.is_none() && args.engine.image_provider == "replicate" {
        tracing::warn!("REPLICATE_API_TOKEN not set; comics will use placeholder panels");
    }
    let state = AppState::new(checker, settings.replicate_token.is_some());
    server::serve(
        state,
        &ServerConfig {
            host: args.host,
            port: args.port,
            workers: args.workers,
        },
    )?;
    Ok(0)
}

fn run_check(args: CheckArgs) -> Result<i32> {
    let (checker, _) = build_checker(&args.engine)?;
    let style = Style::parse(Some(&args.style));
    let report = checker.check(&args.statement, style)?;
    write_strip_png(&report.comic.data_url, &args.out)?;
    let summary = json!({
        "verdict": report.analysis.verdict,
        "confidence": report.analysis.confidence,
        "description": report.analysis.description,
        "mood": report.mood.mood,
        "moodConfidence": report.mood.confidence,
        "explanation": report.explanation,
        "stage": report.comic.stage.as_str(),
        "out": args.out.display().to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(0)
}

fn run_explain(args: ExplainArgs) -> Result<i32> {
    let (checker, _) = build_checker(&args.engine)?;
    let fact = args.fact.trim();
    if fact.is_empty() {
        bail!("No fact provided");
    }
    let Some(explanation) = checker.explain(fact) else {
        eprintln!("factstrip error: Failed to generate explanation");
        return Ok(2);
    };
    let response = ExplanationResponse {
        success: true,
        fact: fact.to_string(),
        explanation,
    };
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(0)
}

fn write_strip_png(data_url: &str, out: &Path) -> Result<()> {
    if let Some(parent) = out.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    decode_data_url(data_url)?
        .save_with_format(out, ImageFormat::Png)
        .with_context(|| format!("failed to write {}", out.display()))?;
    tracing::info!(path = %out.display(), "comic strip written");
    Ok(())
}
