use bson::Document;

use super::{require_collection, require_criteria, require_data, CommandOptions, CommandResult, WriteOperation};

/// Sets the fields of `data` on the document matched by `criteria`.
///
/// With `set_on_insert` the fields are only written when the update inserts
/// the document (`$setOnInsert`), otherwise they are always written (`$set`).
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCommand {
    collection: String,
    data: Document,
    criteria: Document,
    options: CommandOptions,
}

impl UpdateCommand {
    pub fn new(
        collection: Option<String>,
        data: Option<Document>,
        criteria: Option<Document>,
        options: CommandOptions,
    ) -> CommandResult<Self> {
        Ok(Self {
            collection: require_collection(collection)?,
            data: require_data(data)?,
            criteria: require_criteria(criteria)?,
            options,
        })
    }

    pub fn collection(&self) -> &str { &self.collection }
    pub fn data(&self) -> &Document { &self.data }
    pub fn criteria(&self) -> &Document { &self.criteria }
    pub fn options(&self) -> CommandOptions { self.options }

    pub fn get_operations(&self) -> Vec<WriteOperation> {
        let operator = if self.options.set_on_insert { "$setOnInsert" } else { "$set" };
        let mut update = Document::new();
        update.insert(operator, self.data.clone());
        vec![WriteOperation::update(self.criteria.clone(), update, self.options.upsert)]
    }
}
