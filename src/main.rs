use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use student_metrics_olap::db::{CsvFactSource, PgFactSource};
use student_metrics_olap::error::EngineError;
use student_metrics_olap::models::{FactRecord, FilterSelection};
use student_metrics_olap::plan::ReportType;
use student_metrics_olap::source::FactSource;
use student_metrics_olap::{engine, filter};

/// Selections exercised by `smoke`, one per filter combination the dashboard offers.
const SMOKE_SELECTIONS: [(&str, &str); 4] = [
    ("All", "All"),
    ("Female", "18–20"),
    ("Male", "21–23"),
    ("Female", "24+"),
];

#[derive(Parser)]
#[command(name = "student-metrics-olap")]
#[command(about = "Slice-and-dice reports over student well-being summary metrics", long_about = None)]
struct Cli {
    /// Read facts from a CSV export instead of Postgres (DATABASE_URL)
    #[arg(long, global = true)]
    csv: Option<PathBuf>,
    #[arg(long, global = true, default_value_t = 5)]
    max_connections: u32,
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// All, Male or Female
    #[arg(long, default_value = "All")]
    gender: String,
    /// All, 18–20, 21–23 or 24+
    #[arg(long, default_value = "All")]
    age_range: String,
}

impl FilterArgs {
    fn selection(&self) -> FilterSelection {
        FilterSelection::new(self.gender.as_str(), self.age_range.as_str())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print one report as JSON
    Report {
        #[arg(value_enum)]
        report: ReportType,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Print all five reports as one JSON object
    Dashboard {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Run the dashboard for the canned selections and log row counts
    Smoke,
}

enum Source {
    Csv(CsvFactSource),
    Postgres(PgFactSource),
}

impl FactSource for Source {
    async fn fetch_fact_records(&self) -> Result<Vec<FactRecord>, EngineError> {
        match self {
            Source::Csv(source) => source.fetch_fact_records().await,
            Source::Postgres(source) => source.fetch_fact_records().await,
        }
    }
}

async fn open_source(cli: &Cli) -> anyhow::Result<Source> {
    if let Some(path) = &cli.csv {
        let source = CsvFactSource::new(path);
        info!(path = %source.path().display(), "using CSV fact source");
        return Ok(Source::Csv(source));
    }

    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set when --csv is not given")?;
    let source = PgFactSource::connect(&database_url, cli.max_connections).await?;
    info!("using Postgres fact source");
    Ok(Source::Postgres(source))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Validate before connecting so bad filters never touch the source.
    match &cli.command {
        Commands::Report { filters, .. } | Commands::Dashboard { filters } => {
            filter::resolve(&filters.selection())?;
        }
        Commands::Smoke => {}
    }

    let source = open_source(&cli).await?;

    match &cli.command {
        Commands::Report { report, filters } => {
            let output = engine::run_report(&source, *report, &filters.selection()).await?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Dashboard { filters } => {
            let dashboard = engine::run_dashboard(&source, &filters.selection()).await?;
            println!("{}", serde_json::to_string_pretty(&dashboard)?);
        }
        Commands::Smoke => {
            for (gender, age_range) in SMOKE_SELECTIONS {
                let dashboard =
                    engine::run_dashboard(&source, &FilterSelection::new(gender, age_range))
                        .await?;
                for (report, output) in dashboard.reports() {
                    info!(
                        gender,
                        age_range,
                        report = report.name(),
                        rows = output.row_count(),
                        "report ok"
                    );
                }
            }
            println!("All {} selections passed.", SMOKE_SELECTIONS.len());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("student_metrics_olap={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(()) => Ok(()),
        Err(err) => match err.downcast_ref::<EngineError>() {
            Some(engine_err) => {
                error!(kind = engine_err.kind(), "{engine_err}");
                eprintln!("{}", serde_json::to_string(&engine_err.body())?);
                std::process::exit(if engine_err.is_client_error() { 2 } else { 1 });
            }
            None => Err(err),
        },
    }
}
