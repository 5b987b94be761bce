use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::entry::{EntryHeader, EntryMetadata};
use crate::error::{ArchiveError, ArchiveResult};
use crate::reader::ArchiveReader;

/// Largest content that can be patched into an existing header.
const MAX_PATCHED_SIZE: usize = u32::MAX as usize - 1;

/// Write side of an export archive.
///
/// Each entry name is accepted once. [`ArchiveWriter::seal`] writes the
/// central directory; dropping the writer without sealing leaves whatever
/// the zip crate manages to flush on drop.
pub struct ArchiveWriter {
    zip: ZipWriter<BufWriter<File>>,
    path: PathBuf,
    written: HashSet<String>,
}

impl ArchiveWriter {
    pub fn create(path: impl AsRef<Path>) -> ArchiveResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|source| ArchiveError::Create {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            zip: ZipWriter::new(BufWriter::new(file)),
            path,
            written: HashSet::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, name: &str) -> bool {
        self.written.contains(name)
    }

    fn claim(&mut self, name: &str) -> ArchiveResult<()> {
        if !self.written.insert(name.to_string()) {
            return Err(ArchiveError::DuplicateEntry(name.to_string()));
        }
        Ok(())
    }

    /// Append a one-entry archive as is.
    fn splice(&mut self, name: &str, single: Vec<u8>) -> ArchiveResult<()> {
        let entry_error = |source| ArchiveError::Entry {
            name: name.to_string(),
            source,
        };
        let source = ZipArchive::new(Cursor::new(single)).map_err(entry_error)?;
        self.zip.merge_archive(source).map_err(entry_error)
    }

    /// Copy an input entry without recompressing it.
    ///
    /// Local and central records are carried over byte for byte, so extra
    /// fields, the entry comment, the creator system and the external
    /// attributes survive. Entries whose records use ZIP64 offsets go
    /// through the zip crate's raw copy, which rebuilds the header from
    /// mtime, method and permissions only.
    pub fn copy_raw(
        &mut self,
        reader: &mut ArchiveReader,
        header: &EntryHeader,
    ) -> ArchiveResult<()> {
        self.claim(&header.name)?;

        let record = reader.record(header)?;
        if record.is_relocatable() {
            self.splice(&header.name, record.into_archive())?;
        } else {
            let entry_error = |source| ArchiveError::Entry {
                name: header.name.clone(),
                source,
            };
            let file = reader
                .archive
                .by_index_raw(header.index)
                .map_err(entry_error)?;
            self.zip.raw_copy_file(file).map_err(entry_error)?;
        }

        tracing::debug!(entry = %header.name, "Copied entry");
        Ok(())
    }

    /// Write new content in place of an input entry, keeping its headers.
    ///
    /// Name, extra fields, comment, creator system, attributes, mtime and
    /// compression method come from the input record; checksum and sizes are
    /// recomputed. When the record cannot be patched (ZIP64, or a method
    /// this crate cannot produce) the entry is written fresh from `header`.
    pub fn replace_entry(
        &mut self,
        reader: &mut ArchiveReader,
        header: &EntryHeader,
        content: &[u8],
    ) -> ArchiveResult<()> {
        self.claim(&header.name)?;

        let method = header.metadata.compression;
        let patchable = matches!(
            method,
            CompressionMethod::Stored | CompressionMethod::Deflated
        ) && content.len() <= MAX_PATCHED_SIZE;

        let record = if patchable {
            Some(reader.record(header)?).filter(|record| record.is_rewritable())
        } else {
            None
        };

        let Some(record) = record else {
            self.write_new(&header.name, &header.metadata, content)?;
            tracing::debug!(entry = %header.name, "Rewrote entry with fresh header");
            return Ok(());
        };

        let entry_error = |source| ArchiveError::Entry {
            name: header.name.clone(),
            source,
        };
        let (crc32, compressed) = compress(method, content).map_err(entry_error)?;
        if compressed.len() > MAX_PATCHED_SIZE {
            self.write_new(&header.name, &header.metadata, content)?;
            return Ok(());
        }

        let patched = record.with_content(crc32, compressed, content.len() as u32);
        self.splice(&header.name, patched.into_archive())?;

        tracing::debug!(entry = %header.name, size_bytes = content.len(), "Replaced entry");
        Ok(())
    }

    /// Write new content under `name`, using `metadata` for the header.
    pub fn write_entry(
        &mut self,
        name: &str,
        metadata: &EntryMetadata,
        content: &[u8],
    ) -> ArchiveResult<()> {
        self.claim(name)?;
        self.write_new(name, metadata, content)?;

        tracing::debug!(entry = %name, size_bytes = content.len(), "Wrote entry");
        Ok(())
    }

    fn write_new(
        &mut self,
        name: &str,
        metadata: &EntryMetadata,
        content: &[u8],
    ) -> ArchiveResult<()> {
        let options = metadata.with_size(content.len() as u64).file_options();
        self.zip
            .start_file(name, options)
            .map_err(|source| ArchiveError::Entry {
                name: name.to_string(),
                source,
            })?;
        self.zip.write_all(content)?;
        Ok(())
    }

    /// Finalize the archive. No entries can be added afterwards.
    pub fn seal(self) -> ArchiveResult<()> {
        let Self { zip, path, written } = self;
        let mut inner = zip.finish().map_err(|source| ArchiveError::Entry {
            name: path.display().to_string(),
            source,
        })?;
        inner.flush()?;

        tracing::debug!(
            path = %path.display(),
            entries = written.len(),
            "Sealed output archive"
        );
        Ok(())
    }
}

/// CRC-32 and compressed bytes of `content` under `method`.
fn compress(method: CompressionMethod, content: &[u8]) -> Result<(u32, Vec<u8>), ZipError> {
    let mut scratch = ZipWriter::new(Cursor::new(Vec::<u8>::new()));
    scratch.start_file(
        "scratch",
        SimpleFileOptions::default()
            .compression_method(method)
            .large_file(false),
    )?;
    scratch.write_all(content)?;
    let buffer = scratch.finish()?;

    let mut archive = ZipArchive::new(buffer)?;
    let mut file = archive.by_index_raw(0)?;
    let crc32 = file.crc32();
    let mut compressed = Vec::new();
    file.read_to_end(&mut compressed)?;
    Ok((crc32, compressed))
}
