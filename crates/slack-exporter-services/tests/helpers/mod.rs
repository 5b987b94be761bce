//! Shared fixtures for pipeline tests: build input archives, read outputs back.

#![allow(dead_code)]

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

/// Creator system id for MS-DOS in the central directory "made by" field.
pub const DOS_SYSTEM: u8 = 0;
/// Archive bit plus the upper attribute bits some DOS tools set.
pub const DOS_ATTRIBUTES: u32 = 0x0180_0000;
/// Info-ZIP extended timestamp holding only a modification time.
pub const UNIX_TIMESTAMP_EXTRA: &[u8] = b"UT\x05\x00\x01n\xc6\x04]";

/// One output entry as read back from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub name: String,
    pub content: Vec<u8>,
    pub compression: CompressionMethod,
    pub compressed_size: u64,
    pub date: u16,
    pub time: u16,
    pub unix_mode: Option<u32>,
}

/// Central directory record fields, read straight from the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralRecord {
    pub name: String,
    pub system: u8,
    pub method: u16,
    pub time: u16,
    pub date: u16,
    pub crc32: u32,
    pub external_attributes: u32,
    pub extra: Vec<u8>,
    pub comment: Vec<u8>,
}

/// Stored entry with header fields the zip crate's writer never produces.
#[derive(Debug, Clone)]
pub struct FixtureEntry {
    pub name: String,
    pub content: Vec<u8>,
    pub system: u8,
    pub external_attributes: u32,
    pub extra: Vec<u8>,
    pub comment: Vec<u8>,
}

impl FixtureEntry {
    /// Entry as written by a DOS-era archiver, with an extended timestamp
    /// extra field and an entry comment.
    pub fn dos(name: &str, content: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            content: content.to_vec(),
            system: DOS_SYSTEM,
            external_attributes: DOS_ATTRIBUTES,
            extra: UNIX_TIMESTAMP_EXTRA.to_vec(),
            comment: b"keep me".to_vec(),
        }
    }
}

pub struct TestArchives {
    pub temp_dir: TempDir,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl TestArchives {
    /// Input archive holding `entries` in order, stamped 2019-06-15 10:20:30.
    pub fn new(entries: &[(&str, &[u8])]) -> Self {
        let archives = Self::empty();
        write_archive(&archives.input, entries);
        archives
    }

    /// Input archive built byte by byte from `entries`, same stamp.
    pub fn with_headers(entries: &[FixtureEntry]) -> Self {
        let archives = Self::empty();
        write_fixture_archive(&archives.input, entries);
        archives
    }

    fn empty() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let input = temp_dir.path().join("export.zip");
        let output = temp_dir.path().join("export-out.zip");
        Self {
            temp_dir,
            input,
            output,
        }
    }

    pub fn second_output(&self) -> PathBuf {
        self.temp_dir.path().join("export-out-2.zip")
    }
}

pub fn stamp() -> DateTime {
    DateTime::from_date_and_time(2019, 6, 15, 10, 20, 30).expect("valid date")
}

pub fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
    let file = File::create(path).expect("Failed to create input archive");
    let mut zip = ZipWriter::new(file);
    for (index, (name, content)) in entries.iter().enumerate() {
        // Alternate methods so passthrough has both kinds to preserve.
        let method = if index % 2 == 0 {
            CompressionMethod::Deflated
        } else {
            CompressionMethod::Stored
        };
        let options = SimpleFileOptions::default()
            .compression_method(method)
            .last_modified_time(stamp())
            .unix_permissions(0o640);
        zip.start_file(*name, options).expect("start_file");
        zip.write_all(content).expect("write entry");
    }
    zip.finish().expect("finish input archive");
}

pub fn write_fixture_archive(path: &Path, entries: &[FixtureEntry]) {
    let mut bytes = Vec::new();
    let mut central = Vec::new();

    for entry in entries {
        let offset = bytes.len() as u32;
        let crc = crc32fast::hash(&entry.content);
        let size = entry.content.len() as u32;

        bytes.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        bytes.extend_from_slice(&20u16.to_le_bytes()); // version needed
        bytes.extend_from_slice(&0u16.to_le_bytes()); // flags
        bytes.extend_from_slice(&0u16.to_le_bytes()); // stored
        bytes.extend_from_slice(&stamp().timepart().to_le_bytes());
        bytes.extend_from_slice(&stamp().datepart().to_le_bytes());
        bytes.extend_from_slice(&crc.to_le_bytes());
        bytes.extend_from_slice(&size.to_le_bytes());
        bytes.extend_from_slice(&size.to_le_bytes());
        bytes.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
        bytes.extend_from_slice(&(entry.extra.len() as u16).to_le_bytes());
        bytes.extend_from_slice(entry.name.as_bytes());
        bytes.extend_from_slice(&entry.extra);
        bytes.extend_from_slice(&entry.content);

        central.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        central.extend_from_slice(&(((entry.system as u16) << 8) | 20).to_le_bytes());
        central.extend_from_slice(&20u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&stamp().timepart().to_le_bytes());
        central.extend_from_slice(&stamp().datepart().to_le_bytes());
        central.extend_from_slice(&crc.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&size.to_le_bytes());
        central.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
        central.extend_from_slice(&(entry.extra.len() as u16).to_le_bytes());
        central.extend_from_slice(&(entry.comment.len() as u16).to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes()); // disk
        central.extend_from_slice(&0u16.to_le_bytes()); // internal attributes
        central.extend_from_slice(&entry.external_attributes.to_le_bytes());
        central.extend_from_slice(&offset.to_le_bytes());
        central.extend_from_slice(entry.name.as_bytes());
        central.extend_from_slice(&entry.extra);
        central.extend_from_slice(&entry.comment);
    }

    let central_offset = bytes.len() as u32;
    bytes.extend_from_slice(&central);
    bytes.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&(central.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&central_offset.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());

    std::fs::write(path, bytes).expect("Failed to write fixture archive");
}

pub fn read_archive(path: &Path) -> Vec<StoredEntry> {
    let file = File::open(path).expect("Failed to open output archive");
    let mut archive = ZipArchive::new(file).expect("valid zip");
    let mut entries = Vec::new();
    for index in 0..archive.len() {
        let mut file = archive.by_index(index).expect("entry");
        let mut content = Vec::new();
        file.read_to_end(&mut content).expect("read entry");
        let modified = file.last_modified().unwrap_or_default();
        entries.push(StoredEntry {
            name: file.name().to_string(),
            content,
            compression: file.compression(),
            compressed_size: file.compressed_size(),
            date: modified.datepart(),
            time: modified.timepart(),
            unix_mode: file.unix_mode(),
        });
    }
    entries
}

fn u16_at(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().expect("four bytes"))
}

/// Walk the central directory of `path` without going through the zip crate.
pub fn central_records(path: &Path) -> Vec<CentralRecord> {
    let bytes = std::fs::read(path).expect("Failed to read archive");
    let eocd = (0..=bytes.len() - 22)
        .rev()
        .find(|&at| u32_at(&bytes, at) == 0x0605_4b50)
        .expect("end of central directory");
    let count = u16_at(&bytes, eocd + 10) as usize;
    let mut at = u32_at(&bytes, eocd + 16) as usize;

    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        assert_eq!(u32_at(&bytes, at), 0x0201_4b50, "central header signature");
        let name_len = u16_at(&bytes, at + 28) as usize;
        let extra_len = u16_at(&bytes, at + 30) as usize;
        let comment_len = u16_at(&bytes, at + 32) as usize;
        let name_start = at + 46;
        let extra_start = name_start + name_len;
        let comment_start = extra_start + extra_len;

        records.push(CentralRecord {
            name: String::from_utf8_lossy(&bytes[name_start..extra_start]).into_owned(),
            system: bytes[at + 5],
            method: u16_at(&bytes, at + 10),
            time: u16_at(&bytes, at + 12),
            date: u16_at(&bytes, at + 14),
            crc32: u32_at(&bytes, at + 16),
            external_attributes: u32_at(&bytes, at + 38),
            extra: bytes[extra_start..comment_start].to_vec(),
            comment: bytes[comment_start..comment_start + comment_len].to_vec(),
        });
        at = comment_start + comment_len;
    }
    records
}

pub fn central_record<'a>(records: &'a [CentralRecord], name: &str) -> &'a CentralRecord {
    records
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("missing central record {}", name))
}

pub fn names(entries: &[StoredEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}

pub fn find<'a>(entries: &'a [StoredEntry], name: &str) -> &'a StoredEntry {
    entries
        .iter()
        .find(|e| e.name == name)
        .unwrap_or_else(|| panic!("missing entry {}", name))
}
