//! Propagation context — the cycle breaker.
//!
//! A change to one side of a synchronized pair must trigger exactly one
//! write to the other side and never bounce back. Handlers mark the record
//! they are about to write; the reciprocal handler sees the mark and returns
//! early. Without this the engine loops forever, so the marks are mandatory,
//! not an optimization.

use serde::{Deserialize, Serialize};
use staffdir_types::RecordId;
use std::collections::HashSet;
use std::fmt;

/// The entity tables known to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Person,
    UserAccount,
    PersonFlag,
    Group,
    EntryType,
    DirectoryEntry,
    EmailAddress,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Person => "person",
            Self::UserAccount => "user account",
            Self::PersonFlag => "person flag",
            Self::Group => "group",
            Self::EntryType => "entry type",
            Self::DirectoryEntry => "directory entry",
            Self::EmailAddress => "email address",
        };
        f.write_str(name)
    }
}

/// Independent guard namespaces.
///
/// The account-sync handlers and the directory-sync handlers each mark in
/// their own channel: an account-side mark on a person must not suppress the
/// directory handlers watching the same person, and vice versa. Two channels
/// mirror the two handler families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncChannel {
    /// Person/UserAccount and PersonFlag/Group synchronization.
    Accounts,
    /// EntryType/PersonFlag and DirectoryEntry synchronization.
    Directory,
}

/// Records already written by a propagation handler in the current causal
/// chain. One context lives for the duration of a single top-level mutation;
/// nested writes reuse the caller's context.
#[derive(Debug, Default)]
pub struct PropagationCtx {
    touched: HashSet<(SyncChannel, EntityKind, RecordId)>,
}

impl PropagationCtx {
    /// Creates an empty context for a fresh top-level mutation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a record as written by this chain.
    /// Returns false if it was already marked.
    pub fn mark(&mut self, channel: SyncChannel, kind: EntityKind, id: RecordId) -> bool {
        self.touched.insert((channel, kind, id))
    }

    /// True when the record was already written by this chain.
    #[must_use]
    pub fn is_marked(&self, channel: SyncChannel, kind: EntityKind, id: RecordId) -> bool {
        self.touched.contains(&(channel, kind, id))
    }

    /// Number of marked records, mostly useful in tests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.touched.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }
}
