pub mod collection;
pub mod config;
pub mod error;
pub mod orchestrator;

pub use collection::ResultCollection;
pub use config::FetchConfig;
pub use error::{ConfigError, FetchError, InitError};
pub use orchestrator::{ExportSummary, FetchOrchestrator};
