//! Email rewriter: fills `profile.email` in users.json from the users.list directory.

use std::sync::Arc;

use async_trait::async_trait;
use slack_exporter_api_client::ResourceFetcher;
use slack_exporter_archive::ArchiveEntry;
use slack_exporter_core::models::{EmailUpdate, USERS_ENTRY};
use slack_exporter_core::{Credential, DirectoryLookup, ExportError, ExportResult, UserDirectory};

use super::{Disposition, EntryRewriter, EntrySink, Rewrite};

pub struct EmailRewriter {
    fetcher: Arc<dyn ResourceFetcher>,
    token: Credential,
    lookup: Option<DirectoryLookup>,
}

impl EmailRewriter {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>, token: Credential) -> Self {
        Self {
            fetcher,
            token,
            lookup: None,
        }
    }

    /// The directory is fetched once per run and reused afterwards.
    async fn directory(&mut self) -> ExportResult<&DirectoryLookup> {
        if self.lookup.is_none() {
            let lookup = self
                .fetcher
                .list_user_emails(&self.token)
                .await
                .map_err(|e| ExportError::DirectoryLookup(e.to_string()))?;
            self.lookup = Some(lookup);
        }

        self.lookup
            .as_ref()
            .ok_or_else(|| ExportError::DirectoryLookup("directory not loaded".to_string()))
    }
}

#[async_trait]
impl EntryRewriter for EmailRewriter {
    fn name(&self) -> &'static str {
        "fetch-emails"
    }

    fn selects(&self, entry_name: &str) -> bool {
        entry_name == USERS_ENTRY
    }

    fn disposition(&self) -> Disposition {
        Disposition::Replace
    }

    async fn rewrite(
        &mut self,
        entry: &ArchiveEntry,
        _sink: &mut dyn EntrySink,
    ) -> ExportResult<Rewrite> {
        tracing::info!("Found users.json file");

        let mut directory = UserDirectory::parse(&entry.content)?;
        if directory.is_empty() {
            return Err(ExportError::EmptyUserDirectory);
        }

        let lookup = self.directory().await?;
        let mut rewrite = Rewrite::keep();

        tracing::info!(
            users = directory.len(),
            "Updating users.json contents with fetched emails"
        );
        for user in directory.users_mut() {
            match user.apply_email(lookup) {
                EmailUpdate::Set(email) => {
                    tracing::debug!(
                        name = user.name().unwrap_or_default(),
                        user_id = user.id().unwrap_or_default(),
                        email = %email,
                        "Set user email"
                    );
                    rewrite.stats.users_with_email += 1;
                }
                EmailUpdate::Cleared => {
                    tracing::debug!(
                        user_id = user.id().unwrap_or_default(),
                        "No email in directory for user"
                    );
                    rewrite.stats.users_without_email += 1;
                }
                EmailUpdate::MissingId => {
                    tracing::warn!("Some user array entry doesn't have id, skipping");
                    rewrite.stats.items_skipped += 1;
                }
                EmailUpdate::MissingProfile => {
                    tracing::warn!(
                        user_id = user.id().unwrap_or_default(),
                        "User doesn't have 'profile' in users.json"
                    );
                    rewrite.stats.items_skipped += 1;
                }
            }
        }

        Ok(Rewrite {
            replacement: Some(directory.to_json()?),
            ..rewrite
        })
    }
}
