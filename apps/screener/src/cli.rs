use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::config::{Config, ConfigScope, StoreConfig};
use crate::dashboard::{load_dashboard, render_text};
use crate::extractor::{PdfSource, PdfTextExtractor};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::screening::{PipelineOutcome, ScreeningPipeline};
use crate::state::AppState;
use crate::store::{self, EvaluationStore, PgStore};

#[derive(Parser)]
#[command(version, about = "Screens CVs against a job spec with an LLM and keeps an auditable record")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the screening API and the review dashboard (default)
    Serve,
    /// Screen one PDF CV and print the report
    Evaluate {
        pdf: PathBuf,
        #[arg(long, conflicts_with = "job_spec_file", required_unless_present = "job_spec_file")]
        job_spec: Option<String>,
        #[arg(long)]
        job_spec_file: Option<PathBuf>,
    },
    /// Print the review dashboard to the terminal
    Dashboard,
    /// Create the evaluation table (direct Postgres stores only)
    Migrate,
}

impl Cli {
    /// Commands that never call the LLM start without its credentials.
    pub fn config_scope(&self) -> ConfigScope {
        match self.command {
            Some(Command::Dashboard) | Some(Command::Migrate) => ConfigScope::StoreOnly,
            Some(Command::Serve) | Some(Command::Evaluate { .. }) | None => ConfigScope::Full,
        }
    }
}

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Evaluate {
            pdf,
            job_spec,
            job_spec_file,
        } => {
            let job_spec = match (job_spec, job_spec_file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading job spec from {}", path.display()))?,
                (None, None) => bail!("either --job-spec or --job-spec-file is required"),
            };
            evaluate(config, pdf, job_spec).await
        }
        Command::Dashboard => {
            let store = store::connect(&config.store)?;
            print!("{}", render_text(&load_dashboard(store.as_ref()).await));
            Ok(())
        }
        Command::Migrate => migrate(&config.store).await,
    }
}

fn build_pipeline(config: &Config) -> Result<(Arc<ScreeningPipeline>, Arc<dyn EvaluationStore>)> {
    let llm = LlmClient::new(config.llm.clone())?;
    info!(
        "LLM client initialized (provider: {}, model: {})",
        config.llm.provider,
        llm.model()
    );

    let store = store::connect(&config.store)?;
    let pipeline = ScreeningPipeline::new(Arc::new(PdfTextExtractor), Arc::new(llm), store.clone());
    Ok((Arc::new(pipeline), store))
}

async fn serve(config: Config) -> Result<()> {
    let (pipeline, store) = build_pipeline(&config)?;
    let state = AppState { pipeline, store };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn evaluate(config: Config, pdf: PathBuf, job_spec: String) -> Result<()> {
    if job_spec.trim().is_empty() {
        bail!("job spec cannot be empty");
    }
    let (pipeline, _) = build_pipeline(&config)?;

    match pipeline.run(PdfSource::Path(pdf), &job_spec).await {
        PipelineOutcome::Completed(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        PipelineOutcome::Aborted { run_id, reason } => bail!("run {run_id} aborted: {reason}"),
    }
}

async fn migrate(store: &StoreConfig) -> Result<()> {
    match store {
        StoreConfig::Postgres { url, table } => {
            PgStore::connect(url, table)?.ensure_schema().await?;
            println!("Table '{table}' is ready");
            Ok(())
        }
        StoreConfig::Postgrest { .. } => {
            bail!("migrate needs a postgres:// STORE_URL; PostgREST tables are managed by the host")
        }
    }
}
