use thiserror::Error;

/// Reasons a stream message cannot become a [`Command`](super::Command).
///
/// All of these are raised while constructing a command. They are counted as
/// invalid messages by the step and never abort a batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("no collection provided in command")]
    NoCollectionProvided,

    #[error("no data provided in command")]
    NoDataProvided,

    #[error("update command requires criteria")]
    UpdateWithNoCriteria,

    #[error("no features provided in command")]
    NoFeatureProvided,

    #[error("no features version provided in command")]
    NoFeatureVersionProvided,

    #[error("no features group provided in command")]
    NoFeatureGroupProvided,

    #[error("feature at index {index} is not a mapping with a string name")]
    MalformedFeature { index: usize },

    #[error("probabilities command is missing string field '{field}'")]
    NoClassifierProvided { field: &'static str },

    #[error("probabilities command has no class probabilities")]
    NoProbabilitiesProvided,

    #[error("probability for class '{class_name}' must be a number in [0, 1]")]
    InvalidProbability { class_name: String },

    #[error("unknown command type: {0}")]
    UnknownCommandType(String),
}

pub type CommandResult<T> = std::result::Result<T, CommandError>;
