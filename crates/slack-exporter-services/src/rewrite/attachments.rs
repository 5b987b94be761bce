//! Attachment rewriter: downloads every file referenced by a channel log into `__uploads/`.

use std::sync::Arc;

use async_trait::async_trait;
use slack_exporter_api_client::ResourceFetcher;
use slack_exporter_archive::{ArchiveEntry, EntryMetadata};
use slack_exporter_core::models::{is_channel_log, parse_channel_log, Attachment};
use slack_exporter_core::{Credential, ExportError, ExportResult};

use super::{Disposition, EntryRewriter, EntrySink, Rewrite};

pub struct AttachmentRewriter {
    fetcher: Arc<dyn ResourceFetcher>,
    token: Option<Credential>,
}

impl AttachmentRewriter {
    /// `token` may be `None`; downloads are then sent without credentials.
    pub fn new(fetcher: Arc<dyn ResourceFetcher>, token: Option<Credential>) -> Self {
        Self { fetcher, token }
    }

    async fn download(&self, attachment: &Attachment) -> ExportResult<Vec<u8>> {
        self.fetcher
            .fetch_file(&attachment.url, self.token.as_ref())
            .await
            .map(|data| data.to_vec())
            .map_err(|e| ExportError::Download {
                url: attachment.url.clone(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl EntryRewriter for AttachmentRewriter {
    fn name(&self) -> &'static str {
        "fetch-attachments"
    }

    fn selects(&self, entry_name: &str) -> bool {
        is_channel_log(entry_name)
    }

    fn disposition(&self) -> Disposition {
        Disposition::Keep
    }

    async fn rewrite(
        &mut self,
        entry: &ArchiveEntry,
        sink: &mut dyn EntrySink,
    ) -> ExportResult<Rewrite> {
        tracing::info!(entry = %entry.name, "Examining channel file for attachments");

        let posts = parse_channel_log(&entry.name, &entry.content)?;
        let mut rewrite = Rewrite::keep();

        for post in &posts {
            if post.missing_legacy_file {
                tracing::warn!(
                    entry = %entry.name,
                    ts = %post.ts,
                    "file_share post has no file property"
                );
            }

            for file in &post.files {
                let attachment = match file.validate(&post.ts) {
                    Ok(attachment) => attachment,
                    Err(e) => {
                        tracing::warn!(entry = %entry.name, error = %e, "Skipping file reference");
                        rewrite.stats.items_skipped += 1;
                        continue;
                    }
                };

                let path = attachment.upload_path();
                if sink.contains(&path) {
                    tracing::debug!(path = %path, "Attachment already in output archive");
                    rewrite.stats.already_present += 1;
                    continue;
                }

                tracing::info!(
                    file_id = %attachment.id,
                    file_name = %attachment.name,
                    "Downloading file"
                );

                match self.download(&attachment).await {
                    Ok(data) => {
                        let metadata =
                            EntryMetadata::synthetic(data.len() as u64, entry.metadata.modified);
                        sink.add(ArchiveEntry::new(path, metadata, data))?;
                        rewrite.stats.added += 1;
                        tracing::info!(
                            file_id = %attachment.id,
                            "Downloaded attachment into output archive"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(
                            file_id = %attachment.id,
                            error = %e,
                            "Failed to download the file"
                        );
                        rewrite.stats.items_skipped += 1;
                    }
                }
            }
        }

        Ok(rewrite)
    }
}
