use clap::Parser;
use mongodb::{options::ClientOptions, Client as MongoClient};
use tracing_subscriber::{fmt, EnvFilter};

use scribe_service::cli::Cli;
use scribe_service::config::Config;
use scribe_service::metrics;
use scribe_service::{JsonlBatchSource, ScribeCommandExecutor, ScribeStep};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load this crate's .env regardless of current working directory
    let _ = dotenvy::from_filename(concat!(env!("CARGO_MANIFEST_DIR"), "/.env"));
    let cli = Cli::parse();
    let mut cfg = Config::from_env();
    cli.apply(&mut cfg);
    cfg.validate()?;

    let default_level = if cfg.logging_debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(true)
        .init();

    tracing::info!(
        database = %cfg.database_name,
        dry_run = cfg.mock_db_collection,
        batch_size = cfg.batch_size,
        "Loaded configuration"
    );

    let executor = if cfg.mock_db_collection {
        ScribeCommandExecutor::dry_run()
    } else {
        let mut client_options = ClientOptions::parse(&cfg.effective_mongodb_uri()).await?;
        client_options.retry_writes = Some(cfg.mongodb_retry_writes);
        let mongo_client = MongoClient::with_options(client_options)?;
        ScribeCommandExecutor::with_database(mongo_client.database(&cfg.database_name))
    };
    let step = ScribeStep::new(executor);

    let result = match &cli.input {
        Some(path) => JsonlBatchSource::open(path, cfg.batch_size).await?.run(&step).await,
        None => JsonlBatchSource::stdin(cfg.batch_size).run(&step).await,
    };

    tracing::info!(metrics = %metrics::export_metrics_json(), "Scribe metrics");
    match result {
        Ok(summary) => {
            tracing::info!(batches = summary.batches, valid = summary.valid, invalid = summary.invalid, "Scribe finished");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Batch processing failed");
            Err(e.into())
        }
    }
}
