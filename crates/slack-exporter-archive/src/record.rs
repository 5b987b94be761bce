//! Byte-level copy of one stored entry: its local record (header, data and
//! optional data descriptor) and its central directory record, exactly as
//! they appear in the input file.
//!
//! Followed by an end-of-central-directory trailer, such a pair is a valid
//! one-entry archive. `ZipWriter::merge_archive` appends it to the output
//! without re-deriving the header, so the extra fields, comment, creator
//! system and external attributes survive.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

const LOCAL_HEADER_LEN: usize = 30;
const CENTRAL_HEADER_LEN: usize = 46;
const END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0605_4b50;
const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x0807_4b50;
const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;
/// A 32-bit size or offset field holding this value lives in a ZIP64 extra field.
const ZIP64_MARKER: u32 = u32::MAX;

// Local header field offsets.
const LOCAL_FLAGS: usize = 6;
const LOCAL_CRC32: usize = 14;
const LOCAL_COMPRESSED_SIZE: usize = 18;
const LOCAL_SIZE: usize = 22;

// Central header field offsets.
const CENTRAL_FLAGS: usize = 8;
const CENTRAL_CRC32: usize = 16;
const CENTRAL_COMPRESSED_SIZE: usize = 20;
const CENTRAL_SIZE: usize = 24;
const CENTRAL_NAME_LEN: usize = 28;
const CENTRAL_EXTRA_LEN: usize = 30;
const CENTRAL_COMMENT_LEN: usize = 32;
const CENTRAL_LOCAL_OFFSET: usize = 42;

/// Where an entry's records sit in the input file.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RecordLocation {
    pub header_start: u64,
    pub data_start: u64,
    pub compressed_size: u64,
    pub size: u64,
    pub central_header_start: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct EntryRecord {
    /// Fixed local header, file name and local extra field.
    local_header: Vec<u8>,
    data: Vec<u8>,
    descriptor: Vec<u8>,
    /// Fixed central header, file name, central extra field and comment.
    central_header: Vec<u8>,
}

fn u16_at(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn put_u16(bytes: &mut [u8], offset: usize, value: u16) {
    bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn read_exactly(file: &mut File, len: u64) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    file.take(len).read_to_end(&mut buf)?;
    if (buf.len() as u64) < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "entry record truncated",
        ));
    }
    Ok(buf)
}

impl EntryRecord {
    pub(crate) fn read(file: &mut File, location: &RecordLocation) -> io::Result<Self> {
        let header_len = location
            .data_start
            .checked_sub(location.header_start)
            .filter(|len| *len >= LOCAL_HEADER_LEN as u64)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "bad local header"))?;

        file.seek(SeekFrom::Start(location.header_start))?;
        let local_header = read_exactly(file, header_len)?;
        let data = read_exactly(file, location.compressed_size)?;

        let descriptor = if u16_at(&local_header, LOCAL_FLAGS) & FLAG_DATA_DESCRIPTOR != 0 {
            let wide = location.compressed_size >= ZIP64_MARKER as u64
                || location.size >= ZIP64_MARKER as u64;
            // crc32 plus both sizes
            let body_len: u64 = if wide { 20 } else { 12 };
            let mut descriptor = read_exactly(file, 4)?;
            if u32_at(&descriptor, 0) == DATA_DESCRIPTOR_SIGNATURE {
                descriptor.extend(read_exactly(file, body_len)?);
            } else {
                descriptor.extend(read_exactly(file, body_len - 4)?);
            }
            descriptor
        } else {
            Vec::new()
        };

        file.seek(SeekFrom::Start(location.central_header_start))?;
        let mut central_header = read_exactly(file, CENTRAL_HEADER_LEN as u64)?;
        let variable_len = u16_at(&central_header, CENTRAL_NAME_LEN) as u64
            + u16_at(&central_header, CENTRAL_EXTRA_LEN) as u64
            + u16_at(&central_header, CENTRAL_COMMENT_LEN) as u64;
        central_header.extend(read_exactly(file, variable_len)?);

        Ok(Self {
            local_header,
            data,
            descriptor,
            central_header,
        })
    }

    fn local_len(&self) -> u64 {
        (self.local_header.len() + self.data.len() + self.descriptor.len()) as u64
    }

    /// The record can be moved to a new offset without ZIP64 bookkeeping.
    pub(crate) fn is_relocatable(&self) -> bool {
        u32_at(&self.central_header, CENTRAL_LOCAL_OFFSET) != ZIP64_MARKER
            && self.local_len() < ZIP64_MARKER as u64
    }

    /// Sizes and checksum can be patched in place for new content.
    pub(crate) fn is_rewritable(&self) -> bool {
        self.is_relocatable()
            && [
                u32_at(&self.local_header, LOCAL_COMPRESSED_SIZE),
                u32_at(&self.local_header, LOCAL_SIZE),
                u32_at(&self.central_header, CENTRAL_COMPRESSED_SIZE),
                u32_at(&self.central_header, CENTRAL_SIZE),
            ]
            .iter()
            .all(|field| *field != ZIP64_MARKER)
    }

    /// Same headers around new compressed content. `size` and the length of
    /// `compressed` must both fit in 32 bits.
    pub(crate) fn with_content(mut self, crc32: u32, compressed: Vec<u8>, size: u32) -> Self {
        let compressed_size = compressed.len() as u32;

        let flags = u16_at(&self.local_header, LOCAL_FLAGS) & !FLAG_DATA_DESCRIPTOR;
        put_u16(&mut self.local_header, LOCAL_FLAGS, flags);
        put_u32(&mut self.local_header, LOCAL_CRC32, crc32);
        put_u32(&mut self.local_header, LOCAL_COMPRESSED_SIZE, compressed_size);
        put_u32(&mut self.local_header, LOCAL_SIZE, size);

        let flags = u16_at(&self.central_header, CENTRAL_FLAGS) & !FLAG_DATA_DESCRIPTOR;
        put_u16(&mut self.central_header, CENTRAL_FLAGS, flags);
        put_u32(&mut self.central_header, CENTRAL_CRC32, crc32);
        put_u32(&mut self.central_header, CENTRAL_COMPRESSED_SIZE, compressed_size);
        put_u32(&mut self.central_header, CENTRAL_SIZE, size);

        self.data = compressed;
        self.descriptor.clear();
        self
    }

    /// One-entry archive holding this record at offset 0.
    pub(crate) fn into_archive(mut self) -> Vec<u8> {
        let local_len = self.local_len() as u32;
        let central_len = self.central_header.len() as u32;
        put_u32(&mut self.central_header, CENTRAL_LOCAL_OFFSET, 0);

        let mut archive = Vec::with_capacity(local_len as usize + central_len as usize + 22);
        archive.extend_from_slice(&self.local_header);
        archive.extend_from_slice(&self.data);
        archive.extend_from_slice(&self.descriptor);
        archive.extend_from_slice(&self.central_header);

        archive.extend_from_slice(&END_OF_CENTRAL_DIRECTORY_SIGNATURE.to_le_bytes());
        archive.extend_from_slice(&0u16.to_le_bytes()); // this disk
        archive.extend_from_slice(&0u16.to_le_bytes()); // disk with the directory
        archive.extend_from_slice(&1u16.to_le_bytes()); // entries on this disk
        archive.extend_from_slice(&1u16.to_le_bytes()); // entries in total
        archive.extend_from_slice(&central_len.to_le_bytes());
        archive.extend_from_slice(&local_len.to_le_bytes());
        archive.extend_from_slice(&0u16.to_le_bytes()); // archive comment length
        archive
    }
}
