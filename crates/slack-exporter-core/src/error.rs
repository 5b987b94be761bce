//! Error types module
//!
//! All failures of an export run are unified under [`ExportError`]. Every
//! variant knows its [`Severity`]: whether it aborts the whole run or only
//! drops the entry or item it was raised for.

use std::io;
use std::path::PathBuf;

/// How far an error reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Abort the run; no further entries are processed.
    Run,
    /// Log, skip the current entry or item, and carry on.
    Item,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Could not open input archive {path}: {message}")]
    InputArchive { path: PathBuf, message: String },

    #[error("Could not create output archive {path}: {message}")]
    OutputArchive { path: PathBuf, message: String },

    #[error("Archive entry {name}: {message}")]
    Entry { name: String, message: String },

    #[error("Duplicate archive entry: {0}")]
    DuplicateEntry(String),

    #[error("Failed to finalize the output archive: {0}")]
    Seal(String),

    #[error("Couldn't parse the JSON file {name}: {source}")]
    MalformedJson {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to find any users in users.json")]
    EmptyUserDirectory,

    #[error("Failed to fetch users' emails: {0}")]
    DirectoryLookup(String),

    #[error("Failed to download {url}: {message}")]
    Download { url: String, message: String },

    #[error("Invalid file reference in post {ts}: {reason}")]
    InvalidFileReference { ts: String, reason: String },

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ExportError {
    pub fn severity(&self) -> Severity {
        match self {
            ExportError::Download { .. } | ExportError::InvalidFileReference { .. } => {
                Severity::Item
            }
            _ => Severity::Run,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Run
    }
}

pub type ExportResult<T> = Result<T, ExportError>;
