//! Destinations for compiled write operations.
//!
//! A sink is bound to one collection. The executor asks a
//! [`CollectionProvider`] for a sink per destination and never cares whether
//! it talks to MongoDB or just logs what it would have done.

pub mod executor;
pub mod mock;
pub mod mongo;

pub use executor::ScribeCommandExecutor;
pub use mock::{MockCollectionProvider, ScribeCollectionMock};
pub use mongo::{MongoCollectionProvider, ScribeCollectionMongo};

use async_trait::async_trait;
use bson::Document;

use crate::command::WriteOperation;
use crate::error::Result;

#[async_trait]
pub trait ScribeCollection: Send + Sync {
    fn name(&self) -> &str;

    async fn insert_many(&self, documents: Vec<Document>) -> Result<()>;

    /// Execute the operations in order. The first failure aborts the call.
    async fn bulk_write(&self, operations: Vec<WriteOperation>) -> Result<()>;
}

pub trait CollectionProvider: Send + Sync {
    fn collection(&self, name: &str) -> Box<dyn ScribeCollection>;
}
