use serde::{Deserialize, Serialize};

use crate::error::{Result, ScribeError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub mongodb_uri: String,
    pub mongodb_retry_writes: bool,
    pub database_name: String,
    /// Log operations instead of writing them
    pub mock_db_collection: bool,
    /// Stream records handed to the step at once
    pub batch_size: usize,
    pub logging_debug: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let get = |k: &str| std::env::var(k).ok();
        let flag = |k: &str| {
            get(k)
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false)
        };

        let mongodb_uri = get("MONGODB_URI").unwrap_or_else(|| "mongodb://localhost:27017".to_string());
        let mongodb_retry_writes: bool = get("MONGODB_RETRY_WRITES").and_then(|s| s.parse().ok()).unwrap_or(true);
        let database_name = get("DATABASE_NAME").unwrap_or_else(|| "scribe".to_string());
        let mock_db_collection = flag("MOCK_DB_COLLECTION");
        let batch_size: usize = get("BATCH_SIZE").and_then(|s| s.parse().ok()).unwrap_or(100);
        let logging_debug = flag("LOGGING_DEBUG");

        Self {
            mongodb_uri,
            mongodb_retry_writes,
            database_name,
            mock_db_collection,
            batch_size,
            logging_debug,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ScribeError::Configuration("batch size must be at least 1".to_string()));
        }
        if !self.mock_db_collection && self.database_name.is_empty() {
            return Err(ScribeError::Configuration("DATABASE_NAME must not be empty".to_string()));
        }
        Ok(())
    }

    /// Connection string with `retryWrites` forced to the configured value.
    pub fn effective_mongodb_uri(&self) -> String {
        let wanted = if self.mongodb_retry_writes { "retryWrites=true" } else { "retryWrites=false" };
        let mut uri = self.mongodb_uri.clone();
        if uri.contains("retryWrites=") {
            for existing in ["retryWrites=true", "retryWrites=false", "retryWrites=1", "retryWrites=0"] {
                uri = uri.replace(existing, wanted);
            }
        } else if uri.contains('?') {
            uri.push('&');
            uri.push_str(wanted);
        } else {
            uri.push('?');
            uri.push_str(wanted);
        }
        uri
    }
}
