use std::collections::HashMap;
use std::sync::Arc;

use mongodb::Database;

use super::{CollectionProvider, MockCollectionProvider, MongoCollectionProvider};
use crate::command::{Command, WriteOperation};
use crate::error::Result;
use crate::metrics;

/// Operations bound for one collection, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionBatch {
    pub collection: String,
    pub operations: Vec<WriteOperation>,
}

/// Routes compiled commands to their collections and submits one bulk write
/// per collection.
#[derive(Clone)]
pub struct ScribeCommandExecutor {
    provider: Arc<dyn CollectionProvider>,
}

impl ScribeCommandExecutor {
    pub fn new(provider: Arc<dyn CollectionProvider>) -> Self {
        Self { provider }
    }

    pub fn with_database(db: Database) -> Self {
        Self::new(Arc::new(MongoCollectionProvider::new(db)))
    }

    /// Sinks that log operations instead of writing them.
    pub fn dry_run() -> Self {
        Self::new(Arc::new(MockCollectionProvider))
    }

    /// Partition by each command's own collection.
    ///
    /// Collections come out in order of first appearance; operations keep
    /// the order of the commands that produced them.
    pub fn group_by_collection(commands: &[Command]) -> Vec<CollectionBatch> {
        let mut batches: Vec<CollectionBatch> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for command in commands {
            let slot = *index.entry(command.collection()).or_insert_with(|| {
                batches.push(CollectionBatch {
                    collection: command.collection().to_string(),
                    operations: Vec::new(),
                });
                batches.len() - 1
            });
            batches[slot].operations.extend(command.get_operations());
        }

        batches
    }

    /// Write every command of the batch. Any sink failure is returned
    /// immediately and leaves the remaining collections unwritten.
    pub async fn bulk_execute(&self, commands: &[Command]) -> Result<()> {
        for batch in Self::group_by_collection(commands) {
            if batch.operations.is_empty() {
                continue;
            }
            let count = batch.operations.len();
            let sink = self.provider.collection(&batch.collection);
            tracing::debug!(collection = %batch.collection, operations = count, "Submitting bulk write");
            if let Err(e) = sink.bulk_write(batch.operations).await {
                metrics::record_sink_failure();
                tracing::error!(collection = %batch.collection, operations = count, error = %e, "Bulk write failed");
                return Err(e);
            }
            metrics::record_operations_written(count as u64);
        }
        Ok(())
    }
}
