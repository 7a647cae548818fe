use std::path::PathBuf;

use thiserror::Error;

use crate::domain::EventId;

/// Failures of Event Store mutations. None of them is fatal: the edit
/// session turns them into "form stays open" or a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("event title is required")]
    EmptyTitle,

    #[error("event not found: {0}")]
    NotFound(EventId),

    #[error("event id already in use: {0}")]
    DuplicateId(EventId),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings TOML: {0}")]
    TomlDecode(#[from] toml::de::Error),

    #[error("failed to encode settings TOML: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("failed to encode settings JSON: {0}")]
    JsonEncode(#[from] serde_json::Error),

    #[error("invalid slot_time `{0}`: expected HH:MM")]
    InvalidSlotTime(String),
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("unsupported log level `{0}`; expected trace|debug|info|warn|error")]
    UnsupportedLevel(String),

    #[error("failed to create log directory `{path}`: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start logger: {0}")]
    Backend(#[from] flexi_logger::FlexiLoggerError),

    #[error("logging already initialized at `{0}`")]
    AlreadyInitialized(PathBuf),
}
