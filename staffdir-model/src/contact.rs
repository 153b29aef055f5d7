use serde::{Deserialize, Serialize};
use staffdir_types::RecordId;

/// An email address belonging to a person.
///
/// A person may hold several; at most one should be `preferred` per person,
/// and the preferred active address is what propagates to the paired
/// account's `email` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub id: RecordId,
    pub person: RecordId,
    pub address: String,
    /// Contact-info kind, e.g. "work".
    pub kind: String,
    pub active: bool,
    pub preferred: bool,
}

impl EmailAddress {
    #[must_use]
    pub fn new(person: RecordId, address: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            person,
            address: address.into(),
            kind: kind.into(),
            active: true,
            preferred: false,
        }
    }
}
