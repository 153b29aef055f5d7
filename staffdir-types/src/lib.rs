//! Core types for the staffdir engine.
//!
//! Identifier newtypes, slug derivation, and the name-guessing helper used
//! when splitting a display name into given/family parts.

mod ids;
mod name;
mod slug;

pub use ids::RecordId;
pub use name::{guess_name, NameGuessConfig, NameParts};
pub use slug::slugify;
