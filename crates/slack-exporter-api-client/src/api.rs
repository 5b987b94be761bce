//! Slack methods used by the exporter.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use serde::Deserialize;
use slack_exporter_core::{Credential, DirectoryLookup};

use crate::{FetchError, FetchResult, ResourceFetcher, SlackClient};

/// Body of `users.list`. Only the fields needed for the e-mail lookup are declared.
#[derive(Debug, Deserialize)]
pub struct UsersListResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub profile: MemberProfile,
}

#[derive(Debug, Default, Deserialize)]
pub struct MemberProfile {
    #[serde(default)]
    pub email: Option<String>,
}

impl UsersListResponse {
    /// Members with both an id and an address; everyone else stays out of the map.
    pub fn into_lookup(self) -> DirectoryLookup {
        self.members
            .into_iter()
            .filter_map(|member| match member.profile.email {
                Some(email) if !member.id.is_empty() && !email.is_empty() => {
                    Some((member.id, email))
                }
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ResourceFetcher for SlackClient {
    async fn fetch_file(&self, url: &str, token: Option<&Credential>) -> FetchResult<Bytes> {
        let data = self.get_bytes(url, token).await?;

        tracing::debug!(url = %url, size_bytes = data.len(), "Downloaded file");
        Ok(data)
    }

    async fn list_user_emails(&self, token: &Credential) -> FetchResult<DirectoryLookup> {
        let url = self.build_url("users.list");
        tracing::info!("Fetching emails from Slack API");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, token.bearer())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status { url, status });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Request {
                url: url.clone(),
                source,
            })?;
        let data: UsersListResponse = serde_json::from_slice(&body)
            .map_err(|source| FetchError::Malformed {
                url: url.clone(),
                source,
            })?;

        if !data.ok {
            return Err(FetchError::NotOk(
                data.error.unwrap_or_else(|| "no error given".to_string()),
            ));
        }

        let members = data.members.len();
        let lookup = data.into_lookup();
        tracing::info!(
            members,
            with_email = lookup.len(),
            "Fetched emails from Slack API"
        );
        Ok(lookup)
    }
}
