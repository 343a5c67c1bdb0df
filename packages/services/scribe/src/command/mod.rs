//! Write-intent commands decoded from stream messages.
//!
//! Each message names a destination collection and one of four command types.
//! A [`Command`] is validated when it is built and compiles into the
//! [`WriteOperation`]s the sink executes.

pub mod error;
pub mod features;
pub mod insert;
pub mod operation;
pub mod options;
pub mod probabilities;
pub mod update;

pub use error::{CommandError, CommandResult};
pub use features::{normalize_fid, Feature, FeatureGroupRecord, UpdateFeaturesCommand};
pub use insert::InsertCommand;
pub use operation::WriteOperation;
pub use options::CommandOptions;
pub use probabilities::{ProbabilityRecord, UpdateProbabilitiesCommand};
pub use update::UpdateCommand;

use bson::{Bson, Document};
use serde::Deserialize;

/// Message payload as it arrives on the stream, before validation.
///
/// Fields are kept loosely typed so that a wrong type reports the same
/// named error as a missing field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScribePayload {
    #[serde(default)]
    pub collection: Option<Bson>,
    #[serde(default, rename = "type")]
    pub command_type: Option<Bson>,
    #[serde(default)]
    pub criteria: Option<Bson>,
    #[serde(default)]
    pub data: Option<Bson>,
    #[serde(default)]
    pub options: Option<Bson>,
}

impl ScribePayload {
    pub fn parse(payload: &str) -> CommandResult<Self> {
        serde_json::from_str(payload)
            .map_err(|e| CommandError::UnknownCommandType(format!("unparseable payload: {}", e)))
    }

    fn collection(&self) -> Option<String> {
        match &self.collection {
            Some(Bson::String(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn document(value: &Option<Bson>) -> Option<Document> {
        match value {
            Some(Bson::Document(d)) => Some(d.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Insert(InsertCommand),
    Update(UpdateCommand),
    UpdateProbabilities(UpdateProbabilitiesCommand),
    UpdateFeatures(UpdateFeaturesCommand),
}

impl Command {
    /// Build the variant named by the payload's `type` field.
    pub fn from_payload(payload: ScribePayload) -> CommandResult<Self> {
        let collection = payload.collection();
        let data = ScribePayload::document(&payload.data);
        let criteria = ScribePayload::document(&payload.criteria);
        let options = CommandOptions::from_document(ScribePayload::document(&payload.options).as_ref());

        let command_type = match &payload.command_type {
            Some(Bson::String(s)) => s.as_str(),
            Some(other) => return Err(CommandError::UnknownCommandType(other.to_string())),
            None => return Err(CommandError::UnknownCommandType("<missing>".to_string())),
        };

        match command_type {
            "insert" => InsertCommand::new(collection, data, criteria, options).map(Self::Insert),
            "update" => UpdateCommand::new(collection, data, criteria, options).map(Self::Update),
            "update_probabilities" => {
                UpdateProbabilitiesCommand::new(collection, data, criteria, options)
                    .map(Self::UpdateProbabilities)
            }
            "update_features" => {
                UpdateFeaturesCommand::new(collection, data, criteria, options)
                    .map(Self::UpdateFeatures)
            }
            other => Err(CommandError::UnknownCommandType(other.to_string())),
        }
    }

    pub fn collection(&self) -> &str {
        match self {
            Self::Insert(c) => c.collection(),
            Self::Update(c) => c.collection(),
            Self::UpdateProbabilities(c) => c.collection(),
            Self::UpdateFeatures(c) => c.collection(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::Update(_) => "update",
            Self::UpdateProbabilities(_) => "update_probabilities",
            Self::UpdateFeatures(_) => "update_features",
        }
    }

    pub fn get_operations(&self) -> Vec<WriteOperation> {
        match self {
            Self::Insert(c) => c.get_operations(),
            Self::Update(c) => c.get_operations(),
            Self::UpdateProbabilities(c) => c.get_operations(),
            Self::UpdateFeatures(c) => c.get_operations(),
        }
    }
}

/// Decode one raw message payload into a command.
pub fn db_command_factory(payload: &str) -> CommandResult<Command> {
    Command::from_payload(ScribePayload::parse(payload)?)
}

pub(crate) fn require_collection(collection: Option<String>) -> CommandResult<String> {
    match collection {
        Some(c) if !c.is_empty() => Ok(c),
        _ => Err(CommandError::NoCollectionProvided),
    }
}

pub(crate) fn require_data(data: Option<Document>) -> CommandResult<Document> {
    match data {
        Some(d) if !d.is_empty() => Ok(d),
        _ => Err(CommandError::NoDataProvided),
    }
}

pub(crate) fn require_criteria(criteria: Option<Document>) -> CommandResult<Document> {
    match criteria {
        Some(c) if !c.is_empty() => Ok(c),
        _ => Err(CommandError::UpdateWithNoCriteria),
    }
}
