//! Test doubles: a deterministic in-process [`ResourceFetcher`] and an
//! in-memory [`EntrySink`].
//!
//! Files and the directory reply are configured up front; every call is
//! recorded so tests can assert on what was requested. Built for this
//! crate's unit tests and, behind the `test-utils` feature, for its
//! integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use slack_exporter_api_client::{FetchError, FetchResult, ResourceFetcher, StatusCode};
use slack_exporter_archive::{ArchiveEntry, DateTime, EntryMetadata};
use slack_exporter_core::{Credential, DirectoryLookup, ExportResult};

use crate::rewrite::EntrySink;

/// Canned answer for `users.list`.
#[derive(Debug, Clone)]
pub enum DirectoryReply {
    Members(DirectoryLookup),
    NotOk(String),
    Status(StatusCode),
}

#[derive(Debug, Default)]
pub struct StubFetcher {
    files: HashMap<String, Vec<u8>>,
    directory: Option<DirectoryReply>,
    requests: Mutex<Vec<(String, Option<String>)>>,
    directory_calls: Mutex<usize>,
}

impl StubFetcher {
    /// Serve `content` for `url`. Unknown URLs answer 404.
    pub fn with_file(mut self, url: &str, content: &[u8]) -> Self {
        self.files.insert(url.to_string(), content.to_vec());
        self
    }

    pub fn with_directory(mut self, members: &[(&str, &str)]) -> Self {
        let lookup = members
            .iter()
            .map(|(id, email)| (id.to_string(), email.to_string()))
            .collect();
        self.directory = Some(DirectoryReply::Members(lookup));
        self
    }

    pub fn with_directory_reply(mut self, reply: DirectoryReply) -> Self {
        self.directory = Some(reply);
        self
    }

    /// File downloads so far, as (url, token) pairs.
    pub fn requests(&self) -> Vec<(String, Option<String>)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn directory_calls(&self) -> usize {
        *self.directory_calls.lock().unwrap()
    }
}

#[async_trait]
impl ResourceFetcher for StubFetcher {
    async fn fetch_file(&self, url: &str, token: Option<&Credential>) -> FetchResult<Bytes> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), token.map(|t| t.expose().to_string())));

        match self.files.get(url) {
            Some(content) => Ok(Bytes::from(content.clone())),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: StatusCode::NOT_FOUND,
            }),
        }
    }

    async fn list_user_emails(&self, _token: &Credential) -> FetchResult<DirectoryLookup> {
        *self.directory_calls.lock().unwrap() += 1;

        match &self.directory {
            Some(DirectoryReply::Members(lookup)) => Ok(lookup.clone()),
            Some(DirectoryReply::NotOk(reason)) => Err(FetchError::NotOk(reason.clone())),
            Some(DirectoryReply::Status(status)) => Err(FetchError::Status {
                url: "users.list".to_string(),
                status: *status,
            }),
            None => Err(FetchError::NotOk("no directory configured".to_string())),
        }
    }
}

/// Metadata stamped 2020-01-02 03:04:06, deflated, `0o644`.
pub fn fixed_metadata() -> EntryMetadata {
    let modified = DateTime::from_date_and_time(2020, 1, 2, 3, 4, 6).unwrap_or_default();
    EntryMetadata::synthetic(0, modified)
}

/// Collects added entries in order. Names given to `with_existing` count as
/// already written.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub entries: Vec<ArchiveEntry>,
    existing: HashSet<String>,
}

impl MemorySink {
    pub fn with_existing(names: &[&str]) -> Self {
        Self {
            entries: Vec::new(),
            existing: names.iter().map(|name| name.to_string()).collect(),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }
}

impl EntrySink for MemorySink {
    fn contains(&self, name: &str) -> bool {
        self.existing.contains(name) || self.entries.iter().any(|e| e.name == name)
    }

    fn add(&mut self, entry: ArchiveEntry) -> ExportResult<()> {
        self.entries.push(entry);
        Ok(())
    }
}
