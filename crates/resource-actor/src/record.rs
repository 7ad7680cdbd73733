//! # Versioned Records
//!
//! Every record held by a [`ResourceActor`](crate::ResourceActor) is wrapped in a
//! [`Versioned`] envelope: the record itself, a revision that increases on every committed
//! write, and a short log of the [`WriteTag`]s attached to recent `replace` calls.
//!
//! The revision makes compare-and-set possible (`replace` only succeeds against the
//! revision the caller read). The tag log makes ambiguous failures resolvable: a caller
//! that lost the reply to a `replace` re-reads the record and checks
//! [`Versioned::applied`] for its own tag.

use std::collections::VecDeque;
use std::fmt::{self, Display};
use std::ops::Deref;
use uuid::Uuid;

/// Monotonic per-record write counter. A freshly created record is at revision 1.
pub type Revision = u64;

/// How many write tags a record remembers.
pub const TAG_HISTORY: usize = 32;

/// Caller-chosen identity of a single `replace` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WriteTag(Uuid);

impl WriteTag {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WriteTag {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for WriteTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w_{}", self.0.simple())
    }
}

/// A record together with its revision and recent write tags.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    revision: Revision,
    record: T,
    recent_tags: VecDeque<WriteTag>,
}

impl<T> Versioned<T> {
    pub fn new(revision: Revision, record: T) -> Self {
        Self {
            revision,
            record,
            recent_tags: VecDeque::new(),
        }
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn record(&self) -> &T {
        &self.record
    }

    pub fn into_record(self) -> T {
        self.record
    }

    /// Whether a `replace` carrying `tag` has been committed to this record.
    pub fn applied(&self, tag: WriteTag) -> bool {
        self.recent_tags.contains(&tag)
    }

    pub(crate) fn commit(&mut self, record: T, tag: Option<WriteTag>) {
        self.record = record;
        self.revision += 1;
        if let Some(tag) = tag {
            self.recent_tags.push_back(tag);
            while self.recent_tags.len() > TAG_HISTORY {
                self.recent_tags.pop_front();
            }
        }
    }
}

impl<T> Deref for Versioned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.record
    }
}
