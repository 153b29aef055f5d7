use serde::{Deserialize, Serialize};
use staffdir_types::{slugify, RecordId};

/// A classification label attachable to people (many-to-many, held in the
/// store). `slug` is unique; `verbose_name` is the lookup key pairing a flag
/// with an auth `Group`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonFlag {
    pub id: RecordId,
    pub slug: String,
    pub verbose_name: String,
    pub active: bool,
}

impl PersonFlag {
    #[must_use]
    pub fn new(slug: impl Into<String>, verbose_name: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            slug: slug.into(),
            verbose_name: verbose_name.into(),
            active: true,
        }
    }

    /// Creates a flag whose slug is derived from the verbose name.
    #[must_use]
    pub fn from_name(verbose_name: impl Into<String>) -> Self {
        let verbose_name = verbose_name.into();
        Self {
            id: RecordId::new(),
            slug: slugify(&verbose_name),
            verbose_name,
            active: true,
        }
    }
}
