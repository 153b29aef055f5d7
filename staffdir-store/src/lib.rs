//! In-memory entity store and mutation-observer dispatch for staffdir.
//!
//! The store owns one typed table per entity plus the two membership
//! relations (person flags, account groups). Every mutation runs inline and
//! synchronously: registered observers fire in registration order before the
//! mutating call returns, and any observer failure propagates to the caller
//! with the originating write already committed (best-effort propagation,
//! not a transaction).
//!
//! Re-entrant propagation is broken by [`PropagationCtx`], a set of
//! (channel, entity kind, id) marks threaded through the whole causal chain:
//! a handler marks the record it is about to write, and every handler
//! returns early when its own subject carries a mark.

mod context;
mod error;
mod observer;
mod store;

pub use context::{EntityKind, PropagationCtx, SyncChannel};
pub use error::{StoreError, StoreResult};
pub use observer::{MembershipAction, MutationObserver};
pub use store::DirectoryStore;
