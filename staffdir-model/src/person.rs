use serde::{Deserialize, Serialize};
use staffdir_types::RecordId;

/// An identity record in the directory.
///
/// `username` is the lookup key linking a person to a `UserAccount`;
/// `None` means "no linked account". At most one person per username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: RecordId,
    pub active: bool,
    /// Common (display) name.
    pub cn: String,
    pub given_name: String,
    /// Family name.
    pub sn: String,
    /// Opt-out: when false, name changes never propagate to/from the account.
    pub sync_name: bool,
    pub username: Option<String>,
    /// URL fragment; unique when present.
    pub slug: Option<String>,
}

impl Person {
    /// Creates an active person with the given display name.
    #[must_use]
    pub fn new(cn: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            active: true,
            cn: cn.into(),
            given_name: String::new(),
            sn: String::new(),
            sync_name: true,
            username: None,
            slug: None,
        }
    }

    /// Builder-style username assignment.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Builder-style name-part assignment.
    #[must_use]
    pub fn with_names(mut self, given_name: impl Into<String>, sn: impl Into<String>) -> Self {
        self.given_name = given_name.into();
        self.sn = sn.into();
        self
    }
}
