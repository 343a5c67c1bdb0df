pub mod cli;
pub mod command;
pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod source;
pub mod step;

// Convenient re-exports for tests and external callers
pub use command::*;
pub use config::*;
pub use db::*;
pub use error::*;
pub use source::*;
pub use step::*;
