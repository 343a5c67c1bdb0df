use async_trait::async_trait;
use bson::Document;
use mongodb::options::UpdateOptions;
use mongodb::{Collection, Database};

use super::{CollectionProvider, ScribeCollection};
use crate::command::WriteOperation;
use crate::error::Result;

/// Live sink writing into one MongoDB collection.
#[derive(Clone)]
pub struct ScribeCollectionMongo {
    name: String,
    collection: Collection<Document>,
}

/// One driver call of a replayed bulk write.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayStep {
    InsertMany(Vec<Document>),
    Update {
        filter: Document,
        update: Document,
        upsert: bool,
        array_filters: Option<Vec<Document>>,
    },
}

impl ReplayStep {
    pub fn update_options(&self) -> Option<UpdateOptions> {
        match self {
            Self::InsertMany(_) => None,
            Self::Update { upsert, array_filters, .. } => Some(
                UpdateOptions::builder()
                    .upsert(Some(*upsert))
                    .array_filters(array_filters.clone())
                    .build(),
            ),
        }
    }
}

/// Order-preserving replay plan: each run of consecutive inserts becomes
/// one `InsertMany`, each update stays a single call.
pub fn plan(operations: Vec<WriteOperation>) -> Vec<ReplayStep> {
    let mut steps = Vec::new();
    let mut pending_inserts: Vec<Document> = Vec::new();

    for operation in operations {
        match operation {
            WriteOperation::InsertOne { document } => pending_inserts.push(document),
            WriteOperation::UpdateOne { filter, update, upsert, array_filters } => {
                if !pending_inserts.is_empty() {
                    steps.push(ReplayStep::InsertMany(std::mem::take(&mut pending_inserts)));
                }
                steps.push(ReplayStep::Update { filter, update, upsert, array_filters });
            }
        }
    }
    if !pending_inserts.is_empty() {
        steps.push(ReplayStep::InsertMany(pending_inserts));
    }
    steps
}

impl ScribeCollectionMongo {
    pub fn new(db: &Database, name: &str) -> Self {
        Self {
            name: name.to_string(),
            collection: db.collection::<Document>(name),
        }
    }
}

#[async_trait]
impl ScribeCollection for ScribeCollectionMongo {
    fn name(&self) -> &str { &self.name }

    async fn insert_many(&self, documents: Vec<Document>) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        let expected = documents.len();
        let res = self.collection.insert_many(documents, None).await?;
        tracing::debug!(collection = %self.name, expected_count = expected, inserted_count = res.inserted_ids.len(), "Inserted documents");
        Ok(())
    }

    async fn bulk_write(&self, operations: Vec<WriteOperation>) -> Result<()> {
        let total = operations.len();
        let (mut matched, mut modified, mut upserted) = (0u64, 0u64, 0u64);

        // the first failing call ends the replay
        for step in plan(operations) {
            let options = step.update_options();
            match step {
                ReplayStep::InsertMany(documents) => self.insert_many(documents).await?,
                ReplayStep::Update { filter, update, .. } => {
                    let res = self.collection.update_one(filter, update, options).await?;
                    matched += res.matched_count;
                    modified += res.modified_count;
                    if res.upserted_id.is_some() {
                        upserted += 1;
                    }
                }
            }
        }

        tracing::debug!(
            collection = %self.name,
            operations = total,
            matched_count = matched,
            modified_count = modified,
            upserted_count = upserted,
            "Bulk write finished"
        );
        Ok(())
    }
}

#[derive(Clone)]
pub struct MongoCollectionProvider {
    db: Database,
}

impl MongoCollectionProvider {
    pub fn new(db: Database) -> Self { Self { db } }
}

impl CollectionProvider for MongoCollectionProvider {
    fn collection(&self, name: &str) -> Box<dyn ScribeCollection> {
        Box::new(ScribeCollectionMongo::new(&self.db, name))
    }
}
