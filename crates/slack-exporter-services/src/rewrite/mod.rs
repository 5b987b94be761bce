//! Entry rewriters: the per-mode logic applied to selected archive entries.
//!
//! A rewriter never holds the output archive. Entries it creates go to an
//! [`EntrySink`] one at a time; what becomes of the selected entry itself is
//! fixed up front by its [`Disposition`] and carried out by the pipeline.

pub mod attachments;
pub mod emails;

use async_trait::async_trait;
use slack_exporter_archive::ArchiveEntry;
use slack_exporter_core::ExportResult;

pub use attachments::AttachmentRewriter;
pub use emails::EmailRewriter;

/// How a selected entry reaches the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Copied through unchanged before it is decoded, so it is in the output
    /// even when decoding fails. Entries the rewriter adds follow it.
    Keep,
    /// Written after the rewrite with the returned replacement, under the
    /// same name and header. Without a replacement it is copied unchanged.
    Replace,
}

/// Destination for entries a rewriter creates.
///
/// Each added entry is written before `add` returns, so a rewriter that adds
/// as it goes never holds more than one new entry in memory.
pub trait EntrySink: Send {
    /// Whether `name` is already in the output.
    fn contains(&self, name: &str) -> bool;

    fn add(&mut self, entry: ArchiveEntry) -> ExportResult<()>;
}

/// Per-entry counters, folded into the run report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// Invalid file references and failed downloads.
    pub items_skipped: usize,
    /// Attachments already in the output.
    pub already_present: usize,
    /// Attachments handed to the sink.
    pub added: usize,
    pub users_with_email: usize,
    pub users_without_email: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Rewrite {
    /// New content for a [`Disposition::Replace`] entry. Ignored for
    /// [`Disposition::Keep`].
    pub replacement: Option<Vec<u8>>,
    pub stats: RewriteStats,
}

impl Rewrite {
    pub fn keep() -> Self {
        Self::default()
    }

    pub fn replace(content: Vec<u8>) -> Self {
        Self {
            replacement: Some(content),
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait EntryRewriter: Send {
    /// Mode name, for logs.
    fn name(&self) -> &'static str;

    /// Whether `entry_name` is handled by this rewriter or passed through.
    fn selects(&self, entry_name: &str) -> bool;

    fn disposition(&self) -> Disposition;

    /// Rewrite one selected entry, adding any new entries to `sink`.
    async fn rewrite(
        &mut self,
        entry: &ArchiveEntry,
        sink: &mut dyn EntrySink,
    ) -> ExportResult<Rewrite>;
}
