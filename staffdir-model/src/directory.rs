use serde::{Deserialize, Serialize};
use staffdir_types::RecordId;

/// A directory-entry category. `slug` is unique and is the lookup key
/// pairing an entry type with a `PersonFlag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryType {
    pub id: RecordId,
    pub slug: String,
    pub verbose_name: String,
    pub verbose_name_plural: String,
    pub active: bool,
}

impl EntryType {
    #[must_use]
    pub fn new(slug: impl Into<String>, verbose_name: impl Into<String>) -> Self {
        let verbose_name = verbose_name.into();
        Self {
            id: RecordId::new(),
            slug: slug.into(),
            verbose_name_plural: verbose_name.clone(),
            verbose_name,
            active: true,
        }
    }
}

/// "This person belongs to this category."
///
/// Carries its own `active` flag: an entry can exist but be deactivated,
/// which is distinct from flag membership. One entry per (person, type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub id: RecordId,
    pub person: RecordId,
    pub entry_type: RecordId,
    pub active: bool,
}

impl DirectoryEntry {
    #[must_use]
    pub fn new(person: RecordId, entry_type: RecordId) -> Self {
        Self {
            id: RecordId::new(),
            person,
            entry_type,
            active: true,
        }
    }
}
