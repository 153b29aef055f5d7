//! Error types for the store layer.

use crate::EntityKind;
use staffdir_types::RecordId;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store mutations.
///
/// A lookup miss during propagation is *not* an error — handlers treat an
/// absent counterpart as "nothing to synchronize". These variants cover
/// genuine constraint violations, surfaced to the original mutation caller.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A referenced record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: RecordId },

    /// A unique lookup key (username, slug, group name) is already taken.
    #[error("duplicate {kind} key: {key:?}")]
    DuplicateKey { kind: EntityKind, key: String },
}
