use std::io;
use std::path::PathBuf;

use slack_exporter_core::ExportError;
use thiserror::Error;
use zip::result::ZipError;

/// Archive operation errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to open archive {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: ZipError,
    },

    #[error("Failed to create archive {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Archive entry {name}: {source}")]
    Entry {
        name: String,
        #[source]
        source: ZipError,
    },

    #[error("Entry already written: {0}")]
    DuplicateEntry(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for archive operations
pub type ArchiveResult<T> = Result<T, ArchiveError>;

impl From<ArchiveError> for ExportError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::Open { path, source } => ExportError::InputArchive {
                path,
                message: source.to_string(),
            },
            ArchiveError::Create { path, source } => ExportError::OutputArchive {
                path,
                message: source.to_string(),
            },
            ArchiveError::Entry { name, source } => ExportError::Entry {
                name,
                message: source.to_string(),
            },
            ArchiveError::DuplicateEntry(name) => ExportError::DuplicateEntry(name),
            ArchiveError::Io(e) => ExportError::Io(e),
        }
    }
}
