//! Slack Exporter Core Library
//!
//! This crate provides the export data model, error types and run
//! configuration shared by every other slack-exporter crate.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Credential, ExportConfig, ExportMode};
pub use error::{ExportError, ExportResult, Severity};
pub use models::{Attachment, DirectoryLookup, FileReference, Post, UserDirectory, UserRecord};
