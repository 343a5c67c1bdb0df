#[derive(Debug, thiserror::Error)]
pub enum ScribeError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Sink error for collection '{collection}': {message}")]
    Sink { collection: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, ScribeError>;
