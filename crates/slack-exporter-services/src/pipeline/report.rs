use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;

use crate::rewrite::RewriteStats;

/// Summary of one export run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub entries_read: usize,
    /// Entries copied through untouched, selected or not.
    pub entries_copied: usize,
    /// Entries written with new content.
    pub entries_rewritten: usize,
    /// Entries dropped after an entry-level error.
    pub entries_skipped: usize,
    /// Input entries whose name was already in the output.
    pub duplicates_skipped: usize,
    pub attachments_added: usize,
    pub attachments_already_present: usize,
    pub items_skipped: usize,
    pub users_with_email: usize,
    pub users_without_email: usize,
    pub duration: Duration,
}

impl RunReport {
    pub(crate) fn absorb(&mut self, stats: &RewriteStats) {
        self.items_skipped += stats.items_skipped;
        self.attachments_already_present += stats.already_present;
        self.attachments_added += stats.added;
        self.users_with_email += stats.users_with_email;
        self.users_without_email += stats.users_without_email;
    }

    /// True when every item was processed without a warning.
    pub fn is_clean(&self) -> bool {
        self.entries_skipped == 0 && self.items_skipped == 0
    }
}

impl Display for RunReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{} entries read, {} copied, {} rewritten, {} attachments added",
            self.entries_read, self.entries_copied, self.entries_rewritten, self.attachments_added
        )?;
        if self.users_with_email + self.users_without_email > 0 {
            write!(
                f,
                ", {} users with email, {} without",
                self.users_with_email, self.users_without_email
            )?;
        }
        if !self.is_clean() {
            write!(
                f,
                ", {} items and {} entries skipped",
                self.items_skipped, self.entries_skipped
            )?;
        }
        write!(f, " in {:.1}s", self.duration.as_secs_f64())
    }
}
