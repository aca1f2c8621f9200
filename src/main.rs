use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use trip_etl::utils::{logger, validation::Validate};
use trip_etl::{HttpFetcher, IngestConfig, PipelineFile, StoreBackend};

#[derive(Parser, Debug)]
#[command(name = "trip-etl")]
#[command(about = "Idempotent monthly trip-data ingestion and ELT stage runner")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one ingestion pass and upload its run log
    Ingest(IngestConfig),

    /// Run one activation of a pipeline described in a TOML file
    Pipeline {
        /// Path to the pipeline file
        #[arg(short, long, default_value = "pipeline.toml")]
        config: PathBuf,

        /// Show the plan without running any stage
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    let result = match cli.command {
        Command::Ingest(config) => run_ingest(config).await,
        Command::Pipeline { config, dry_run } => run_pipeline(config, dry_run).await,
    };

    if let Err(e) = result {
        let code = match e.downcast_ref::<trip_etl::EtlError>() {
            Some(etl_error) => {
                tracing::error!("❌ {} (Severity: {:?})", etl_error, etl_error.severity());
                tracing::error!("💡 Recovery suggestion: {}", etl_error.recovery_suggestion());
                etl_error.exit_code()
            }
            None => {
                tracing::error!("❌ {:#}", e);
                1
            }
        };
        eprintln!("❌ {:#}", e);
        std::process::exit(code);
    }

    Ok(())
}

async fn run_ingest(config: IngestConfig) -> anyhow::Result<()> {
    config.validate()?;
    tracing::debug!("Ingest config: {:?}", config);

    let store = StoreBackend::from_config(&config).await?;
    let engine = config.engine(store, HttpFetcher::new());
    let report = engine.run().await;

    println!("{}", serde_json::to_string_pretty(&report)?);

    match report.summary.abort_reason {
        Some(reason) if report.summary.aborted => {
            Err(trip_etl::EtlError::IngestAborted { reason }.into())
        }
        _ => Ok(()),
    }
}

async fn run_pipeline(path: PathBuf, dry_run: bool) -> anyhow::Result<()> {
    tracing::info!("📁 Loading pipeline from: {}", path.display());
    let file = PipelineFile::from_file(&path)
        .with_context(|| format!("failed to load pipeline file {}", path.display()))?;
    file.validate()?;

    let activation = Utc::now();

    if dry_run {
        print_plan(&file, activation);
        return Ok(());
    }

    let ingest = match (&file.ingest, file.has_ingest_stage()) {
        (Some(config), true) => Some((
            StoreBackend::from_config(config).await?,
            HttpFetcher::new(),
        )),
        _ => None,
    };

    let orchestrator = file.build(ingest)?;
    tracing::info!(
        "🚀 Running pipeline {} ({} stages)",
        orchestrator.name(),
        orchestrator.stage_names().len()
    );
    let outcome = orchestrator.run(activation).await;

    let summary = outcome.summary();
    tracing::info!("📊 Pipeline summary: {}", summary);
    println!("{}", serde_json::to_string_pretty(&summary)?);

    outcome.into_result()?;
    Ok(())
}

fn print_plan(file: &PipelineFile, activation: chrono::DateTime<Utc>) {
    println!("Pipeline: {}", file.pipeline.name);
    if !file.pipeline.description.is_empty() {
        println!("  {}", file.pipeline.description);
    }
    println!("Gate opens at: {}", file.gate.opens_at(activation));
    println!(
        "Retry policy: {} attempt(s) per stage, {}s apart",
        file.retry.max_attempts(),
        file.retry.delay_seconds
    );
    for (index, stage) in file.stages.iter().enumerate() {
        println!("  {}. {} ({:?})", index + 1, stage.name, stage.kind);
    }
}
