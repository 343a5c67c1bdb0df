use bson::Document;

use super::{require_collection, require_data, CommandOptions, CommandResult, WriteOperation};

/// Inserts `data` verbatim as a new document. Criteria are accepted but unused.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertCommand {
    collection: String,
    data: Document,
    options: CommandOptions,
}

impl InsertCommand {
    pub fn new(
        collection: Option<String>,
        data: Option<Document>,
        _criteria: Option<Document>,
        options: CommandOptions,
    ) -> CommandResult<Self> {
        Ok(Self {
            collection: require_collection(collection)?,
            data: require_data(data)?,
            options,
        })
    }

    pub fn collection(&self) -> &str { &self.collection }
    pub fn data(&self) -> &Document { &self.data }
    pub fn options(&self) -> CommandOptions { self.options }

    pub fn get_operations(&self) -> Vec<WriteOperation> {
        vec![WriteOperation::insert(self.data.clone())]
    }
}
