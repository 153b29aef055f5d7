//! Synchronization settings.
//!
//! One explicit settings object, constructed at process start and passed by
//! reference into [`crate::register_sync_observers`]. Each category toggles
//! handler registration independently; a disabled category registers no
//! observers at all. Defaults mirror production behavior: account sync fully
//! on, directory sync off until slugs are listed.

use serde::{Deserialize, Serialize};
use staffdir_types::NameGuessConfig;
use std::collections::BTreeSet;

/// A user-account name field a person field can map onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserNameField {
    FirstName,
    LastName,
    /// The computed display name. Read-only on the account side: values are
    /// copied *from* it, never assigned *into* it.
    FullName,
}

/// Field-name translation table for person/account name sync.
/// `None` disables sync for that person field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameFieldMap {
    pub cn: Option<UserNameField>,
    pub given_name: Option<UserNameField>,
    pub sn: Option<UserNameField>,
}

impl Default for NameFieldMap {
    fn default() -> Self {
        Self {
            cn: Some(UserNameField::FullName),
            given_name: Some(UserNameField::FirstName),
            sn: Some(UserNameField::LastName),
        }
    }
}

/// Which slugs take part in entry-type/flag synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlugFilter {
    /// The `"__all__"` wildcard: every slug is synchronized.
    All,
    /// Only the listed slugs; an empty set disables the category.
    Slugs(BTreeSet<String>),
}

impl SlugFilter {
    /// An empty filter: the category is disabled.
    #[must_use]
    pub fn none() -> Self {
        Self::Slugs(BTreeSet::new())
    }

    /// A filter over an explicit slug list.
    pub fn slugs<I, S>(slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Slugs(slugs.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn allows(&self, slug: &str) -> bool {
        match self {
            Self::All => true,
            Self::Slugs(set) => set.contains(slug),
        }
    }

    /// True when no slug can ever match, so no handlers should register.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Slugs(set) if set.is_empty())
    }
}

impl Default for SlugFilter {
    fn default() -> Self {
        Self::none()
    }
}

/// All synchronization knobs, one category per field group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Sync name changes between persons and accounts.
    pub person_user_name: bool,
    /// Field-name translation for name sync.
    pub name_map: NameFieldMap,
    /// Mirror person/account creation and deletion.
    pub person_user_create_delete: bool,
    /// When an account is deleted: delete the person too, or (default) just
    /// clear the person's username.
    pub delete_person_on_user_delete: bool,
    /// Sync email changes between persons and accounts.
    pub person_user_email: bool,
    /// Sync flags and groups, existence and membership. Fairly aggressive:
    /// creates, updates, and deletes all propagate.
    pub person_flags_user_groups: bool,
    /// Entry-type slugs for which flags are kept synchronized.
    pub entry_type_flags: SlugFilter,
    /// Also forward flag changes onto entry types (not every flag should
    /// become a directory category, hence off by default).
    pub flag_forward_to_entry_types: bool,
    /// Populate a person's slug from the display name when absent.
    pub autoslug: bool,
    /// Contact-info kind for addresses synthesized from an account email.
    pub default_contact_kind: String,
    /// Split a display name with `guess_name` when creating a person from an
    /// account, instead of taking first/last name verbatim.
    pub guess_names_on_create: bool,
    pub name_guess: NameGuessConfig,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            person_user_name: true,
            name_map: NameFieldMap::default(),
            person_user_create_delete: true,
            delete_person_on_user_delete: false,
            person_user_email: true,
            person_flags_user_groups: true,
            entry_type_flags: SlugFilter::none(),
            flag_forward_to_entry_types: false,
            autoslug: false,
            default_contact_kind: "work".to_string(),
            guess_names_on_create: false,
            name_guess: NameGuessConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_allows_everything() {
        assert!(SlugFilter::All.allows("anything"));
        assert!(!SlugFilter::All.is_disabled());
    }

    #[test]
    fn explicit_slugs_filter() {
        let filter = SlugFilter::slugs(["staff"]);
        assert!(filter.allows("staff"));
        assert!(!filter.allows("alumni"));
        assert!(!filter.is_disabled());
    }

    #[test]
    fn empty_filter_is_disabled() {
        assert!(SlugFilter::none().is_disabled());
        assert!(SlugFilter::default().is_disabled());
    }
}
