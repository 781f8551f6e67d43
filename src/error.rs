use std::path::PathBuf;
use thiserror::Error;

/// Message shown when the report service gives nothing better to say.
pub const GENERIC_FETCH_MESSAGE: &str = "An error occurred while fetching the report.";

#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("Please enter a user and a directory.")]
    MissingQueryFields,

    #[error("Invalid advance '{0}': must be a number (e.g., 1500.50)")]
    InvalidAdvance(String),

    #[error("{0}")]
    Fetch(String),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Typst not found. Install it from https://typst.app/ or run: cargo install typst-cli")]
    TypstNotFound,

    #[error("Failed to generate PDF: {0}")]
    PdfGeneration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SettlementError {
    /// Validation failures are reported inline and never reach the network.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SettlementError::MissingQueryFields | SettlementError::InvalidAdvance(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SettlementError>;
