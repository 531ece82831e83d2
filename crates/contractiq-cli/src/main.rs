mod display;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use contractiq_core::{EngineConfig, ExemplarLibrary, RiskEngine};
use futures::future::try_join_all;
use tracing::info;

use crate::display::Report;

#[derive(Parser)]
#[command(name = "contractiq", version, about = "Flag risky clauses in contract text")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one or more plain-text contracts.
    Analyze(AnalyzeArgs),
    /// List the risky-phrase exemplars used for semantic matching.
    Exemplars {
        /// JSON exemplar library replacing the built-in one.
        #[arg(long, env = "CONTRACTIQ_LIBRARY")]
        library: Option<PathBuf>,
    },
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Plain-text contract files.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// What you expected from the contract, e.g. "net 30 payment".
    #[arg(short, long, default_value = "")]
    expectations: String,

    /// Directory with `model.onnx` and `tokenizer.json` for semantic matching.
    #[arg(long, env = "CONTRACTIQ_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// JSON exemplar library replacing the built-in one.
    #[arg(long, env = "CONTRACTIQ_LIBRARY")]
    library: Option<PathBuf>,

    /// Minimum similarity for a semantic match (exclusive).
    #[arg(long, env = "CONTRACTIQ_THRESHOLD", default_value_t = 0.45)]
    threshold: f32,

    /// Similarity above which a semantic match is High severity.
    #[arg(long, env = "CONTRACTIQ_HIGH_CONFIDENCE", default_value_t = 0.65)]
    high_confidence: f32,

    /// Print JSON instead of cards.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Analyze(args) => analyze(args).await,
        Command::Exemplars { library } => {
            let library = load_library(library.as_deref())?;
            display::write_library(&mut std::io::stdout().lock(), &library)?;
            Ok(())
        }
    }
}

async fn analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    info!("contractiq v{}", env!("CARGO_PKG_VERSION"));

    let config = engine_config(&args)?;
    let library = load_library(args.library.as_deref())?;
    let detector = contractiq_ai::select_detector(args.model_dir.as_deref(), &library, config);
    let engine = RiskEngine::new(detector, config);
    info!(backend = engine.backend(), files = args.files.len(), "analyzing contracts");

    let reports = try_join_all(
        args.files
            .iter()
            .map(|path| analyze_file(&engine, path, &args.expectations)),
    )
    .await?;

    let mut out = std::io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &reports)?;
        writeln!(out)?;
    } else {
        for report in &reports {
            display::write_card(&mut out, report)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

async fn analyze_file(
    engine: &RiskEngine,
    path: &Path,
    expectations: &str,
) -> anyhow::Result<Report> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let analysis = engine.analyze_concurrent(&text, expectations).await;
    Ok(Report {
        source: path.display().to_string(),
        analyzed_at: chrono::Utc::now().to_rfc3339(),
        backend: engine.backend().to_string(),
        analysis,
    })
}

fn engine_config(args: &AnalyzeArgs) -> anyhow::Result<EngineConfig> {
    anyhow::ensure!(
        (0.0..=1.0).contains(&args.threshold),
        "--threshold must be within [0, 1], got {}",
        args.threshold
    );
    anyhow::ensure!(
        args.high_confidence >= args.threshold && args.high_confidence <= 1.0,
        "--high-confidence must be within [threshold, 1], got {}",
        args.high_confidence
    );
    Ok(EngineConfig {
        similarity_threshold: args.threshold,
        high_confidence: args.high_confidence,
        ..EngineConfig::default()
    })
}

fn load_library(path: Option<&Path>) -> anyhow::Result<ExemplarLibrary> {
    match path {
        Some(p) => ExemplarLibrary::from_path(p)
            .with_context(|| format!("loading exemplar library {}", p.display())),
        None => Ok(ExemplarLibrary::default()),
    }
}
