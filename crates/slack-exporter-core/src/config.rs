//! Configuration module
//!
//! A run is described by one [`ExportConfig`] value, built by the CLI and
//! passed to the pipeline. Nothing here reads process-wide flags after
//! construction.

use std::env;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::PathBuf;

use crate::error::{ExportError, ExportResult};

pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";

/// Slack API base URL. Set SLACK_API_URL to point the directory lookup elsewhere.
pub fn api_base_url() -> String {
    env::var("SLACK_API_URL")
        .ok()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Bearer token sent to Slack. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for an empty or whitespace-only token.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("Credential(***)")
    }
}

/// Which enrichment a run performs. The two are mutually exclusive.
#[derive(Clone, Debug)]
pub enum ExportMode {
    /// Download every attachment referenced by channel logs into `__uploads/`.
    FetchAttachments { token: Option<Credential> },
    /// Fill `profile.email` of every user in `users.json`.
    FetchEmails { token: Option<Credential> },
}

impl ExportMode {
    pub fn name(&self) -> &'static str {
        match self {
            ExportMode::FetchAttachments { .. } => "fetch-attachments",
            ExportMode::FetchEmails { .. } => "fetch-emails",
        }
    }

    pub fn token(&self) -> Option<&Credential> {
        match self {
            ExportMode::FetchAttachments { token } | ExportMode::FetchEmails { token } => {
                token.as_ref()
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct ExportConfig {
    pub input_archive: PathBuf,
    pub output_archive: PathBuf,
    pub verbose: bool,
    pub mode: ExportMode,
    pub api_base_url: String,
}

impl ExportConfig {
    pub fn new(input_archive: PathBuf, output_archive: PathBuf, mode: ExportMode) -> Self {
        Self {
            input_archive,
            output_archive,
            verbose: false,
            mode,
            api_base_url: api_base_url(),
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Pre-flight checks, run before any archive is opened.
    pub fn validate(&self) -> ExportResult<()> {
        if self.input_archive.as_os_str().is_empty() {
            return Err(ExportError::InvalidConfig(
                "input archive path is required".to_string(),
            ));
        }
        if self.output_archive.as_os_str().is_empty() {
            return Err(ExportError::InvalidConfig(
                "output archive path is required".to_string(),
            ));
        }
        if self.input_archive == self.output_archive {
            return Err(ExportError::InvalidConfig(format!(
                "input and output archive must differ: {}",
                self.input_archive.display()
            )));
        }
        if let ExportMode::FetchEmails { token: None } = self.mode {
            return Err(ExportError::MissingCredential(
                "fetch-emails requires --api-token".to_string(),
            ));
        }
        Ok(())
    }
}
