//! Export services: the per-mode entry rewriters and the pipeline that
//! drives them over a Slack export archive.

pub mod pipeline;
pub mod rewrite;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use pipeline::{run_export, ExportPipeline, RunReport};
pub use rewrite::{
    AttachmentRewriter, Disposition, EmailRewriter, EntryRewriter, EntrySink, Rewrite,
};
