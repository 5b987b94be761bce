//! Hand-built archives for tests, with header fields the zip crate's writer
//! never produces: a DOS creator, foreign extra fields, entry comments, data
//! descriptors and declared sizes that disagree with the stored bytes.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use zip::{DateTime, ZipArchive};

pub(crate) const DOS_SYSTEM: u8 = 0;
pub(crate) const DOS_ARCHIVE_ATTRIBUTES: u32 = 0x0180_0000;
pub(crate) const UNIX_TIMESTAMP_EXTRA: &[u8] = b"UT\x05\x00\x01n\xc6\x04]";

pub(crate) fn stamp() -> DateTime {
    DateTime::from_date_and_time(2020, 1, 2, 3, 4, 6).unwrap()
}

/// One stored entry.
pub(crate) struct Handmade {
    name: String,
    content: Vec<u8>,
    descriptor: bool,
    declared_size: Option<u32>,
}

impl Handmade {
    pub(crate) fn new(name: &str, content: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            content: content.to_vec(),
            descriptor: false,
            declared_size: None,
        }
    }

    /// Zero sizes in the local header, real ones in a trailing descriptor.
    pub(crate) fn with_descriptor(mut self) -> Self {
        self.descriptor = true;
        self
    }

    /// Uncompressed size claimed by the central directory.
    pub(crate) fn with_declared_size(mut self, size: u32) -> Self {
        self.declared_size = Some(size);
        self
    }
}

pub(crate) fn write_handmade(path: &Path, entry: &Handmade) {
    let name = entry.name.as_bytes();
    let crc = crc32fast::hash(&entry.content);
    let size = entry.content.len() as u32;
    let declared = entry.declared_size.unwrap_or(size);
    let flags: u16 = if entry.descriptor { 1 << 3 } else { 0 };
    let (local_crc, local_size) = if entry.descriptor { (0, 0) } else { (crc, size) };
    let comment = b"keep me";

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
    bytes.extend_from_slice(&20u16.to_le_bytes());
    bytes.extend_from_slice(&flags.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&stamp().timepart().to_le_bytes());
    bytes.extend_from_slice(&stamp().datepart().to_le_bytes());
    bytes.extend_from_slice(&local_crc.to_le_bytes());
    bytes.extend_from_slice(&local_size.to_le_bytes());
    bytes.extend_from_slice(&local_size.to_le_bytes());
    bytes.extend_from_slice(&(name.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&(UNIX_TIMESTAMP_EXTRA.len() as u16).to_le_bytes());
    bytes.extend_from_slice(name);
    bytes.extend_from_slice(UNIX_TIMESTAMP_EXTRA);
    bytes.extend_from_slice(&entry.content);
    if entry.descriptor {
        bytes.extend_from_slice(&0x0807_4b50u32.to_le_bytes());
        bytes.extend_from_slice(&crc.to_le_bytes());
        bytes.extend_from_slice(&size.to_le_bytes());
        bytes.extend_from_slice(&size.to_le_bytes());
    }

    let central_start = bytes.len() as u32;
    bytes.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
    bytes.extend_from_slice(&(((DOS_SYSTEM as u16) << 8) | 20).to_le_bytes());
    bytes.extend_from_slice(&20u16.to_le_bytes());
    bytes.extend_from_slice(&flags.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&stamp().timepart().to_le_bytes());
    bytes.extend_from_slice(&stamp().datepart().to_le_bytes());
    bytes.extend_from_slice(&crc.to_le_bytes());
    bytes.extend_from_slice(&size.to_le_bytes());
    bytes.extend_from_slice(&declared.to_le_bytes());
    bytes.extend_from_slice(&(name.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&(UNIX_TIMESTAMP_EXTRA.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&(comment.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&DOS_ARCHIVE_ATTRIBUTES.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(name);
    bytes.extend_from_slice(UNIX_TIMESTAMP_EXTRA);
    bytes.extend_from_slice(comment);
    let central_len = bytes.len() as u32 - central_start;

    bytes.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&central_len.to_le_bytes());
    bytes.extend_from_slice(&central_start.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());

    std::fs::write(path, bytes).unwrap();
}

/// Creator system, external attributes, extra field and comment of the
/// first entry.
pub(crate) fn header_fields(path: &Path) -> (u8, u32, Vec<u8>, String) {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let file = archive.by_index_raw(0).unwrap();

    let mut central = [0u8; 46];
    let mut raw = File::open(path).unwrap();
    raw.seek(SeekFrom::Start(file.central_header_start())).unwrap();
    raw.read_exact(&mut central).unwrap();
    let made_by = u16::from_le_bytes([central[4], central[5]]);
    let external = u32::from_le_bytes([central[38], central[39], central[40], central[41]]);

    (
        (made_by >> 8) as u8,
        external,
        file.extra_data().unwrap_or_default().to_vec(),
        file.comment().to_string(),
    )
}
