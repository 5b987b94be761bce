pub mod channel;
pub mod users;

pub use channel::{
    is_channel_log, parse_channel_log, Attachment, FileReference, Post, RESERVED_PREFIX,
    UPLOADS_DIR,
};
pub use users::{DirectoryLookup, EmailUpdate, UserDirectory, UserRecord, USERS_ENTRY};
