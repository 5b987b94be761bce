use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::entry::{ArchiveEntry, EntryHeader, EntryMetadata};
use crate::error::{ArchiveError, ArchiveResult};
use crate::record::{EntryRecord, RecordLocation};

/// Read side of an export archive. Entries are addressed by their storage index.
pub struct ArchiveReader {
    pub(crate) archive: ZipArchive<BufReader<File>>,
    /// Independent handle for byte-level record copies.
    raw: File,
    path: PathBuf,
}

impl ArchiveReader {
    pub fn open(path: impl AsRef<Path>) -> ArchiveResult<Self> {
        let path = path.as_ref().to_path_buf();
        let open_error = |e: std::io::Error| ArchiveError::Open {
            path: path.clone(),
            source: e.into(),
        };
        let file = File::open(&path).map_err(open_error)?;
        let raw = File::open(&path).map_err(open_error)?;
        let archive =
            ZipArchive::new(BufReader::new(file)).map_err(|source| ArchiveError::Open {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(
            path = %path.display(),
            entries = archive.len(),
            "Opened input archive"
        );

        Ok(Self { archive, raw, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Name and metadata of the entry at `index`; nothing is decompressed.
    pub fn header(&mut self, index: usize) -> ArchiveResult<EntryHeader> {
        let file = self
            .archive
            .by_index_raw(index)
            .map_err(|source| ArchiveError::Entry {
                name: format!("#{}", index),
                source,
            })?;

        Ok(EntryHeader {
            index,
            name: file.name().to_string(),
            metadata: EntryMetadata::from(&file),
        })
    }

    /// Decompress the entry into memory.
    pub fn read(&mut self, header: &EntryHeader) -> ArchiveResult<ArchiveEntry> {
        let mut file =
            self.archive
                .by_index(header.index)
                .map_err(|source| ArchiveError::Entry {
                    name: header.name.clone(),
                    source,
                })?;

        // The declared size is not trusted for preallocation.
        let mut content = Vec::new();
        file.read_to_end(&mut content).map_err(|e| ArchiveError::Entry {
            name: header.name.clone(),
            source: e.into(),
        })?;

        Ok(ArchiveEntry::new(
            header.name.clone(),
            header.metadata,
            content,
        ))
    }

    /// The entry's local and central records exactly as stored.
    pub(crate) fn record(&mut self, header: &EntryHeader) -> ArchiveResult<EntryRecord> {
        let entry_error = |source| ArchiveError::Entry {
            name: header.name.clone(),
            source,
        };
        let location = {
            let file = self
                .archive
                .by_index_raw(header.index)
                .map_err(entry_error)?;
            RecordLocation {
                header_start: file.header_start(),
                data_start: file.data_start(),
                compressed_size: file.compressed_size(),
                size: file.size(),
                central_header_start: file.central_header_start(),
            }
        };

        EntryRecord::read(&mut self.raw, &location).map_err(|e| entry_error(e.into()))
    }
}
