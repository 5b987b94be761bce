use std::io::Read;

use zip::read::ZipFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime};

/// Entries at or above this size need ZIP64 headers.
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// Permissions given to entries this tool creates (rw-r--r--).
pub const SYNTHETIC_MODE: u32 = 0o644;

/// Header-level facts about an archive entry.
#[derive(Debug, Clone, Copy)]
pub struct EntryMetadata {
    pub size: u64,
    pub compressed_size: u64,
    pub modified: DateTime,
    pub compression: CompressionMethod,
    pub unix_mode: Option<u32>,
}

impl EntryMetadata {
    /// Metadata for a new entry: deflated, `0o644`, stamped with `modified`.
    pub fn synthetic(size: u64, modified: DateTime) -> Self {
        Self {
            size,
            compressed_size: 0,
            modified,
            compression: CompressionMethod::Deflated,
            unix_mode: Some(SYNTHETIC_MODE),
        }
    }

    /// Same header facts, new content length.
    pub fn with_size(self, size: u64) -> Self {
        Self {
            size,
            compressed_size: 0,
            ..self
        }
    }

    pub(crate) fn file_options(&self) -> SimpleFileOptions {
        // Only stored and deflated are guaranteed writable; anything else is re-deflated.
        let method = match self.compression {
            CompressionMethod::Stored => CompressionMethod::Stored,
            _ => CompressionMethod::Deflated,
        };

        let options = SimpleFileOptions::default()
            .compression_method(method)
            .last_modified_time(self.modified)
            .large_file(self.size >= ZIP64_THRESHOLD);

        match self.unix_mode {
            Some(mode) => options.unix_permissions(mode),
            None => options,
        }
    }
}

impl<R: Read> From<&ZipFile<'_, R>> for EntryMetadata {
    fn from(file: &ZipFile<'_, R>) -> Self {
        Self {
            size: file.size(),
            compressed_size: file.compressed_size(),
            modified: file.last_modified().unwrap_or_default(),
            compression: file.compression(),
            unix_mode: file.unix_mode(),
        }
    }
}

/// Name and metadata of the entry stored at `index`, without its content.
#[derive(Debug, Clone)]
pub struct EntryHeader {
    pub index: usize,
    pub name: String,
    pub metadata: EntryMetadata,
}

/// A fully read archive entry.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub metadata: EntryMetadata,
    pub content: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, metadata: EntryMetadata, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            metadata,
            content,
        }
    }
}
