//! The mutation-observer contract.
//!
//! Observers are registered per entity type at startup and invoked directly
//! by the store, in registration order, inline with the triggering mutation.
//! All hooks default to no-ops; a handler implements only the events it
//! cares about.

use crate::{DirectoryStore, PropagationCtx, StoreResult};
use staffdir_types::RecordId;

/// What happened to a many-to-many relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipAction {
    /// Members were added; fired after the relation was updated.
    Added,
    /// Members were removed; fired after the relation was updated.
    Removed,
    /// The relation is about to be emptied; fired *before* the update, with
    /// the full membership snapshot, so handlers can still resolve names.
    Clearing,
}

/// A hook into the store's mutation cycle for records of type `E`.
///
/// `raw` distinguishes fixture/bulk loads: raw writes are assumed already
/// consistent and must never trigger propagation.
pub trait MutationObserver<E>: Send + Sync {
    /// Runs before a record is written. The record is mutable, so observers
    /// may normalize fields; the store still holds the previous version.
    fn on_before_save(
        &self,
        store: &mut DirectoryStore,
        record: &mut E,
        raw: bool,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        let _ = (store, record, raw, ctx);
        Ok(())
    }

    /// Runs after a record was written.
    fn on_after_save(
        &self,
        store: &mut DirectoryStore,
        record: &E,
        created: bool,
        raw: bool,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        let _ = (store, record, created, raw, ctx);
        Ok(())
    }

    /// Runs after a record was removed.
    fn on_after_delete(
        &self,
        store: &mut DirectoryStore,
        record: &E,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        let _ = (store, record, ctx);
        Ok(())
    }

    /// Runs when the owner's membership relation changed; `members` holds
    /// the affected related-record ids (see [`MembershipAction`] for when).
    fn on_membership_changed(
        &self,
        store: &mut DirectoryStore,
        owner: &E,
        action: MembershipAction,
        members: &[RecordId],
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        let _ = (store, owner, action, members, ctx);
        Ok(())
    }
}
