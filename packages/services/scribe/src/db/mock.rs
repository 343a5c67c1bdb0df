use async_trait::async_trait;
use bson::Document;

use super::{CollectionProvider, ScribeCollection};
use crate::command::WriteOperation;
use crate::error::Result;

/// Dry-run sink: logs what would be written and leaves storage alone.
#[derive(Debug, Clone)]
pub struct ScribeCollectionMock {
    name: String,
}

impl ScribeCollectionMock {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }

    pub fn insert_header(&self) -> String {
        format!("Inserting into {}:", self.name)
    }

    pub fn bulk_header(&self) -> String {
        format!("Bulk writing into {}:", self.name)
    }
}

#[async_trait]
impl ScribeCollection for ScribeCollectionMock {
    fn name(&self) -> &str { &self.name }

    async fn insert_many(&self, documents: Vec<Document>) -> Result<()> {
        tracing::info!(collection = %self.name, documents = documents.len(), "{}", self.insert_header());
        for document in &documents {
            tracing::info!(collection = %self.name, "{}", document);
        }
        Ok(())
    }

    async fn bulk_write(&self, operations: Vec<WriteOperation>) -> Result<()> {
        tracing::info!(collection = %self.name, operations = operations.len(), "{}", self.bulk_header());
        for operation in &operations {
            tracing::info!(collection = %self.name, kind = operation.kind(), "{}", operation);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockCollectionProvider;

impl CollectionProvider for MockCollectionProvider {
    fn collection(&self, name: &str) -> Box<dyn ScribeCollection> {
        Box::new(ScribeCollectionMock::new(name))
    }
}
