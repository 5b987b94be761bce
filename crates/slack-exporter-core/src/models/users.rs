//! User directory model: the top-level `users.json` of a Slack export.
//!
//! Users are kept as ordered JSON maps so every field Slack adds round-trips
//! untouched. Only `id` and `profile.email` get typed accessors.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use crate::error::{ExportError, ExportResult};

pub const USERS_ENTRY: &str = "users.json";

/// Indent used by Slack's own export files.
const INDENT: &[u8] = b"    ";

/// User id to e-mail address, as returned by the directory lookup.
pub type DirectoryLookup = HashMap<String, String>;

/// Outcome of setting the e-mail on one user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailUpdate {
    /// The lookup had an address for this id.
    Set(String),
    /// The id is unknown to the lookup; the e-mail was cleared.
    Cleared,
    /// The record has no string `id`.
    MissingId,
    /// The record has no `profile` object.
    MissingProfile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord(Map<String, Value>);

impl UserRecord {
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    pub fn email(&self) -> Option<&str> {
        self.0
            .get("profile")
            .and_then(Value::as_object)
            .and_then(|profile| profile.get("email"))
            .and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Overwrite `profile.email` from the lookup, or clear it when the id is unknown.
    pub fn apply_email(&mut self, lookup: &DirectoryLookup) -> EmailUpdate {
        let Some(id) = self.id().map(str::to_string) else {
            return EmailUpdate::MissingId;
        };
        let Some(profile) = self.0.get_mut("profile").and_then(Value::as_object_mut) else {
            return EmailUpdate::MissingProfile;
        };

        match lookup.get(&id) {
            Some(email) => {
                profile.insert("email".to_string(), Value::String(email.clone()));
                EmailUpdate::Set(email.clone())
            }
            None => {
                profile.insert("email".to_string(), Value::String(String::new()));
                EmailUpdate::Cleared
            }
        }
    }
}

impl From<Map<String, Value>> for UserRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserDirectory {
    users: Vec<UserRecord>,
}

impl UserDirectory {
    pub fn parse(bytes: &[u8]) -> ExportResult<Self> {
        let users: Vec<Map<String, Value>> =
            serde_json::from_slice(bytes).map_err(|source| ExportError::MalformedJson {
                name: USERS_ENTRY.to_string(),
                source,
            })?;

        Ok(Self {
            users: users.into_iter().map(UserRecord::from).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn users(&self) -> &[UserRecord] {
        &self.users
    }

    pub fn users_mut(&mut self) -> &mut [UserRecord] {
        &mut self.users
    }

    /// Encode with input field order, four-space indent and a trailing newline.
    pub fn to_json(&self) -> ExportResult<Vec<u8>> {
        let mut out = Vec::new();
        let formatter = PrettyFormatter::with_indent(INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        let records: Vec<&Map<String, Value>> =
            self.users.iter().map(UserRecord::fields).collect();
        records
            .serialize(&mut serializer)
            .map_err(|source| ExportError::MalformedJson {
                name: USERS_ENTRY.to_string(),
                source,
            })?;
        out.push(b'\n');
        Ok(out)
    }
}
