//! Channel log model: one `<channel>/<day>.json` file of a Slack export.

use serde::Deserialize;

use crate::error::{ExportError, ExportResult};

/// Folder prefix reserved for non-channel content such as `__uploads`.
pub const RESERVED_PREFIX: &str = "__";

/// Folder that receives downloaded attachments.
pub const UPLOADS_DIR: &str = "__uploads";

const FILE_SHARE_SUBTYPE: &str = "file_share";

/// True for `<channel>/<name>.json` where the channel folder is not reserved.
pub fn is_channel_log(entry_name: &str) -> bool {
    let segments: Vec<&str> = entry_name.split('/').collect();
    match segments.as_slice() {
        [folder, file] => !folder.starts_with(RESERVED_PREFIX) && file.ends_with(".json"),
        _ => false,
    }
}

/// An attachment as it appears inside a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileReference {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url_private_download: Option<String>,
    #[serde(default)]
    pub url_private: Option<String>,
}

/// A file reference that passed validation and can be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub url: String,
}

impl Attachment {
    /// Output entry path: `__uploads/{id}/{name}`.
    pub fn upload_path(&self) -> String {
        format!("{}/{}/{}", UPLOADS_DIR, self.id, self.name)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl FileReference {
    /// Download URL, preferring `url_private_download` over `url_private`.
    pub fn download_url(&self) -> Option<&str> {
        non_empty(&self.url_private_download).or_else(|| non_empty(&self.url_private))
    }

    pub fn validate(&self, ts: &str) -> ExportResult<Attachment> {
        let invalid = |reason: &str| ExportError::InvalidFileReference {
            ts: ts.to_string(),
            reason: reason.to_string(),
        };

        if self.id.is_empty() {
            return Err(invalid("file has no id"));
        }
        if self.name.is_empty() {
            return Err(invalid("file has no name"));
        }
        let url = self
            .download_url()
            .ok_or_else(|| invalid("file has neither url_private_download nor url_private"))?;

        Ok(Attachment {
            id: self.id.clone(),
            name: self.name.clone(),
            url: url.to_string(),
        })
    }
}

/// Wire shape of a post, with both the legacy `file` and the current `files`.
#[derive(Debug, Default, Deserialize)]
struct RawPost {
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    ts: String,
    #[serde(default)]
    file: Option<FileReference>,
    #[serde(default)]
    files: Option<Vec<FileReference>>,
}

/// A post with its attachments in canonical form.
///
/// Legacy `file_share` posts carrying a single `file` are normalized into a
/// one-element `files` list at decode time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawPost")]
pub struct Post {
    pub subtype: Option<String>,
    pub ts: String,
    pub files: Vec<FileReference>,
    /// Set for a `file_share` post that has no `file` property.
    pub missing_legacy_file: bool,
}

impl From<RawPost> for Post {
    fn from(raw: RawPost) -> Self {
        let is_file_share = raw.subtype.as_deref() == Some(FILE_SHARE_SUBTYPE);
        let missing_legacy_file = is_file_share && raw.file.is_none();

        let files = match (is_file_share, raw.file, raw.files) {
            (true, Some(file), _) => vec![file],
            (_, _, Some(files)) => files,
            _ => Vec::new(),
        };

        Post {
            subtype: raw.subtype,
            ts: raw.ts,
            files,
            missing_legacy_file,
        }
    }
}

impl Post {
    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }
}

/// Decode a channel log. Any malformed content is an error for the whole file.
pub fn parse_channel_log(entry_name: &str, bytes: &[u8]) -> ExportResult<Vec<Post>> {
    serde_json::from_slice(bytes).map_err(|source| ExportError::MalformedJson {
        name: entry_name.to_string(),
        source,
    })
}
