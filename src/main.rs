//! CLI entry point for the gradebook service.
//!
//! Provides subcommands for serving the HTTP API, importing roster,
//! objective and grade CSVs into a class, and printing or exporting a
//! class's aggregated results.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use gradebook::analyzers::aggregate::class_report;
use gradebook::config::Config;
use gradebook::infra::{Backends, connect};
use gradebook::ingest::{ingest_grades, ingest_objectives, ingest_roster};
use gradebook::output::{print_json, print_pretty, write_report};
use gradebook::{AppState, build_router};
use std::ffi::OsStr;
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "gradebook")]
#[command(about = "Classroom gradebook: mastery tracking by learning objective", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Address to listen on (overrides BIND_ADDR)
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },
    /// Ingest a CSV file into a class
    Import {
        /// What the file contains
        #[arg(value_enum)]
        kind: ImportKind,

        /// Class to import into
        #[arg(long)]
        class_id: i64,

        /// Path to the CSV file
        #[arg(value_name = "FILE")]
        file: String,
    },
    /// Aggregate a class's results by learning objective
    Report {
        /// Class to report on
        #[arg(long)]
        class_id: i64,

        /// CSV file to write per-objective tier counts to (prints JSON to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Gzip compress the CSV file
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ImportKind {
    Roster,
    Objectives,
    Grades,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/gradebook.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("gradebook.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Serve { bind } => {
            let bind_addr = bind.unwrap_or(config.bind_addr);
            let backends = connect(config.backend.as_ref())?;
            let app = build_router(AppState::new(backends, &config));

            let listener = tokio::net::TcpListener::bind(bind_addr)
                .await
                .with_context(|| format!("failed to bind {bind_addr}"))?;
            info!(%bind_addr, parse_mode = ?config.parse_mode, "gradebook listening");
            axum::serve(listener, app).await?;
        }
        Commands::Import {
            kind,
            class_id,
            file,
        } => {
            let backends = hosted_backends(&config)?;
            import(&backends, &config, kind, class_id, &file).await?;
        }
        Commands::Report {
            class_id,
            output,
            gzip,
        } => {
            let backends = hosted_backends(&config)?;
            let class = backends
                .store
                .find_class(class_id)
                .await?
                .with_context(|| format!("class {class_id} not found"))?;
            let students = backends.store.class_outcomes(class.id).await?;
            let report = class_report(&class, &students);

            print_pretty(&report);
            match output {
                Some(path) => {
                    write_report(&path, &report, gzip)?;
                    info!(path, objectives = report.objectives.len(), "Report written");
                }
                None => print_json(&report)?,
            }
        }
    }

    Ok(())
}

/// Offline commands are pointless against in-memory storage.
fn hosted_backends(config: &Config) -> Result<Backends> {
    if config.backend.is_none() {
        bail!("SUPABASE_URL and SUPABASE_KEY must be set for this command");
    }
    connect(config.backend.as_ref())
}

/// Reads a CSV from disk and ingests it into an existing class.
#[tracing::instrument(skip(backends, config))]
async fn import(
    backends: &Backends,
    config: &Config,
    kind: ImportKind,
    class_id: i64,
    file: &str,
) -> Result<()> {
    let store = backends.store.as_ref();
    if store.find_class(class_id).await?.is_none() {
        bail!("class {class_id} not found");
    }

    let bytes = std::fs::read(file).with_context(|| format!("failed to read {file}"))?;

    match kind {
        ImportKind::Roster => {
            let report = ingest_roster(store, class_id, &bytes, config.parse_mode).await?;
            info!(?report, "Roster imported");
        }
        ImportKind::Objectives => {
            let created = ingest_objectives(store, class_id, &bytes, config.parse_mode).await?;
            info!(?created, "Objectives imported");
        }
        ImportKind::Grades => {
            let report = ingest_grades(store, class_id, &bytes, config.parse_mode).await?;
            info!(?report, "Grades imported");
        }
    }
    Ok(())
}
