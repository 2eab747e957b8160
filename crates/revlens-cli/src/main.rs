//! RevLens — review capture and enrichment from the command line.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use revlens_core::RevlensConfig;
use revlens_extract::OllamaClient;
use revlens_ingest::{Ingestor, JsonFileSource};
use revlens_pipeline::{run_pipeline, Enricher};
use revlens_sentiment::{NeutralBackend, SentimentBackend};
use revlens_store::ReviewStore;
use revlens_taxonomy::TaxonomyConfig;

#[derive(Parser)]
#[command(name = "revlens", version, about = "Customer review enrichment pipeline")]
struct Cli {
    /// Data directory (database, taxonomy, diagnostics).
    #[arg(long, env = "REVLENS_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture reviews from a JSON export into the raw store.
    Ingest {
        /// Path to a JSON array of source payloads.
        #[arg(long)]
        input: PathBuf,
        /// Vertical the reviews belong to.
        #[arg(long)]
        vertical: String,
        /// Source tag stored on every review.
        #[arg(long, default_value = "google_play")]
        source: String,
        /// Review language, if known.
        #[arg(long)]
        lang: Option<String>,
    },
    /// Enrich captured reviews.
    Enrich {
        /// Maximum reviews to process in this run.
        #[arg(long, default_value_t = 50)]
        batch: usize,
        /// Re-analyze the newest reviews, overwriting existing enrichment.
        #[arg(long)]
        force: bool,
        /// Override the extraction model.
        #[arg(long)]
        model: Option<String>,
        /// Override the recorded prompt version.
        #[arg(long)]
        prompt_version: Option<String>,
    },
    /// Ingest then enrich, sequentially.
    Pipeline {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        vertical: String,
        #[arg(long, default_value = "google_play")]
        source: String,
        #[arg(long)]
        lang: Option<String>,
        #[arg(long, default_value_t = 50)]
        batch: usize,
        #[arg(long)]
        force: bool,
    },
    /// Show raw and enriched row counts.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config =
        RevlensConfig::from_env(&cli.data_dir).context("cannot prepare data directory")?;
    let store = Arc::new(ReviewStore::open(&config.data_paths.db_file)?);

    match cli.command {
        Command::Ingest {
            input,
            vertical,
            source,
            lang,
        } => {
            let source = JsonFileSource::new(input, source);
            let report = Ingestor::new(&store)
                .run(&source, &vertical, lang.as_deref())
                .await?;
            println!(
                "Ingested {} of {} fetched ({} invalid, {} already known)",
                report.inserted, report.fetched, report.skipped_invalid, report.skipped_existing
            );
        }
        Command::Enrich {
            batch,
            force,
            model,
            prompt_version,
        } => {
            if let Some(model) = model {
                config.extract_model = model;
            }
            if let Some(version) = prompt_version {
                config.prompt_version = version;
            }
            let enricher = build_enricher(&config, store)?;
            let report = enricher.run(batch, force).await?;
            println!(
                "Processed {} reviews: {} written, {} extraction failures",
                report.processed, report.inserted_or_updated, report.extraction_failures
            );
        }
        Command::Pipeline {
            input,
            vertical,
            source,
            lang,
            batch,
            force,
        } => {
            let source = JsonFileSource::new(input, source);
            let enricher = build_enricher(&config, store.clone())?;
            let report = run_pipeline(
                &store,
                &source,
                &vertical,
                lang.as_deref(),
                &enricher,
                batch,
                force,
            )
            .await?;
            println!(
                "Ingested {} new reviews; processed {} with {} written and {} extraction failures",
                report.ingest.inserted,
                report.enrich.processed,
                report.enrich.inserted_or_updated,
                report.enrich.extraction_failures
            );
        }
        Command::Status => {
            println!(
                "{} raw reviews, {} enriched",
                store.count_raw()?,
                store.count_enriched()?
            );
        }
    }

    Ok(())
}

fn build_enricher(
    config: &RevlensConfig,
    store: Arc<ReviewStore>,
) -> anyhow::Result<Enricher<OllamaClient>> {
    let taxonomy = load_taxonomy(&config.data_paths.verticals_file)?;
    let extractor = OllamaClient::new(
        config.generate_url.clone(),
        config.connect_timeout,
        config.read_timeout,
    )?
    .with_diagnostics(&config.data_paths.diagnostics);

    let sentiment = sentiment_backend(config);
    info!(
        "Enriching with extraction model '{}' and sentiment model '{}'",
        config.extract_model,
        sentiment.model_name()
    );

    Ok(Enricher::new(
        store,
        taxonomy,
        extractor,
        sentiment,
        config.extract_model.clone(),
        config.prompt_version.clone(),
    ))
}

fn load_taxonomy(path: &std::path::Path) -> anyhow::Result<TaxonomyConfig> {
    if !path.exists() {
        warn!(
            "No taxonomy document at {}, using an empty vocabulary",
            path.display()
        );
        return Ok(TaxonomyConfig::default());
    }
    Ok(TaxonomyConfig::from_path(path)?)
}

#[cfg(feature = "onnx")]
fn sentiment_backend(config: &RevlensConfig) -> Arc<dyn SentimentBackend> {
    use revlens_sentiment::OnnxSentimentClassifier;

    if let Some(dir) = &config.sentiment_model_dir {
        match OnnxSentimentClassifier::load(dir) {
            Ok(classifier) => return Arc::new(classifier),
            Err(e) => warn!("Cannot load sentiment model from {}: {}", dir.display(), e),
        }
    } else {
        warn!("REVLENS_SENTIMENT_MODEL_DIR not set");
    }
    warn!("Falling back to neutral sentiment");
    Arc::new(NeutralBackend)
}

#[cfg(not(feature = "onnx"))]
fn sentiment_backend(_config: &RevlensConfig) -> Arc<dyn SentimentBackend> {
    warn!("Built without the onnx feature; all sentiment defaults to Neutral");
    Arc::new(NeutralBackend)
}
