//! HTTP access to Slack for the exporter.
//!
//! [`ResourceFetcher`] is the seam the rewriters depend on: one call kind for
//! downloading an attachment and one for listing the user directory.
//! [`SlackClient`] is the reqwest-backed implementation; tests substitute
//! their own.

pub mod api;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder};
use slack_exporter_core::{Credential, DirectoryLookup};
use thiserror::Error;

pub use reqwest::StatusCode;

const USER_AGENT: &str = concat!("slack-advanced-exporter/", env!("CARGO_PKG_VERSION"));

/// Errors from a single remote call. None of them are retried.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("Malformed response from {url}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unexpected lack of ok=true in Slack API response ({0}). Is access token correct?")]
    NotOk(String),
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Remote calls made while rewriting an export.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Download one attachment. The bearer header is sent only when `token` is set.
    async fn fetch_file(&self, url: &str, token: Option<&Credential>) -> FetchResult<Bytes>;

    /// Fetch the workspace directory and map user ids to e-mail addresses.
    async fn list_user_emails(&self, token: &Credential) -> FetchResult<DirectoryLookup>;
}

/// Slack HTTP client. One instance serves a whole run.
#[derive(Clone, Debug)]
pub struct SlackClient {
    client: Client,
    base_url: String,
}

impl SlackClient {
    pub fn new(base_url: impl Into<String>) -> FetchResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    fn apply_auth(&self, request: RequestBuilder, token: Option<&Credential>) -> RequestBuilder {
        match token {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, token.bearer()),
            None => request,
        }
    }

    /// GET `url` and return the body of a successful response.
    async fn get_bytes(&self, url: &str, token: Option<&Credential>) -> FetchResult<Bytes> {
        let request = self.apply_auth(self.client.get(url), token);

        let response = request.send().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.bytes().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })
    }
}
