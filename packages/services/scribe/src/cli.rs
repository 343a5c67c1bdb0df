use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

/// Write stream commands into MongoDB
#[derive(Parser, Debug, Default)]
#[command(name = "scribe-service")]
#[command(about = "Turns write-intent stream records into bulk MongoDB writes")]
pub struct Cli {
    /// Newline-delimited stream records to read (stdin when omitted)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Records per batch (overrides BATCH_SIZE)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Log operations instead of writing them (overrides MOCK_DB_COLLECTION)
    #[arg(long)]
    pub dry_run: bool,

    /// Database name (overrides DATABASE_NAME)
    #[arg(long)]
    pub database: Option<String>,
}

impl Cli {
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(batch_size) = self.batch_size {
            cfg.batch_size = batch_size;
        }
        if self.dry_run {
            cfg.mock_db_collection = true;
        }
        if let Some(database) = &self.database {
            cfg.database_name = database.clone();
        }
    }
}
