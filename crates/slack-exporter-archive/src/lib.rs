//! ZIP container access for Slack exports.
//!
//! [`ArchiveReader`] walks the input archive by storage index; [`ArchiveWriter`]
//! accepts each output name exactly once. Input entries are copied, or given
//! new content, by splicing their original local and central records into
//! the output, so headers survive unchanged.

pub mod entry;
pub mod error;
pub mod reader;
mod record;
pub mod writer;

#[cfg(test)]
mod fixtures;

pub use entry::{ArchiveEntry, EntryHeader, EntryMetadata, SYNTHETIC_MODE};
pub use error::{ArchiveError, ArchiveResult};
pub use reader::ArchiveReader;
pub use writer::ArchiveWriter;

// Re-exported so callers can stamp synthetic entries without depending on zip.
pub use zip::DateTime;
