use serde::{Deserialize, Serialize};
use staffdir_types::RecordId;

/// An authentication account, paired with a `Person` by username.
///
/// The account model is owned by the auth system; the directory only ever
/// reaches it through the store, which is why the linkage is a lookup key
/// rather than a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: RecordId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub active: bool,
}

impl UserAccount {
    /// Creates an active account with empty name and email fields.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            username: username.into(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            active: true,
        }
    }

    /// The computed display name: first and last name joined, trimmed.
    /// This is the read-only side of the `cn` field mapping.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// An auth group, paired with a `PersonFlag` by
/// `Group.name == PersonFlag.verbose_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: RecordId,
    pub name: String,
}

impl Group {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            name: name.into(),
        }
    }
}
