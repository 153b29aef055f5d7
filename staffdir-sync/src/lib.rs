//! Bidirectional entity synchronization for staffdir.
//!
//! Keeps pairs of related records consistent whenever either side changes:
//!
//! - `Person` / `UserAccount` — names, email, and existence, linked by
//!   username
//! - `PersonFlag` / `Group` — existence, renames, and flag/group membership,
//!   linked by verbose name
//! - `EntryType` / `PersonFlag` — existence and renames, linked by slug
//! - `PersonFlag` membership / `DirectoryEntry.active` — one-way derived
//!   state
//!
//! Each category is an independent set of [`staffdir_store::MutationObserver`]
//! implementations, wired once at startup by [`register_sync_observers`]
//! according to [`SyncSettings`]. Propagation is synchronous and depth-bounded
//! to one hop: a handler marks the record it writes in the propagation
//! context, and the reciprocal handler backs off when its subject is marked.
//!
//! # Example
//!
//! ```
//! use staffdir_model::Person;
//! use staffdir_store::DirectoryStore;
//! use staffdir_sync::{register_sync_observers, SyncSettings};
//! use std::sync::Arc;
//!
//! let mut store = DirectoryStore::new();
//! let settings = Arc::new(SyncSettings::default());
//! register_sync_observers(&mut store, &settings);
//!
//! // creating a person with a username mirrors a user account
//! let person = Person::new("Ada Lovelace")
//!     .with_names("Ada", "Lovelace")
//!     .with_username("alovelace");
//! store.save_person(person).unwrap();
//! assert!(store.user_by_username("alovelace").is_some());
//! ```

mod accounts;
mod directory;
mod groups;
mod mapper;
mod registry;
mod settings;

pub use accounts::{
    EmailToUser, PersonAutoslug, PersonNameToUser, PersonUserExistence, UserEmailToPerson,
    UserNameToPerson, UserPersonExistence,
};
pub use directory::{EntrySync, EntryTypeFlagSync, FlagEntryTypeSync, PersonFlagsToEntries};
pub use groups::{FlagGroupSync, GroupFlagSync, PersonFlagsToUserGroups, UserGroupsToPersonFlags};
pub use mapper::{person_to_user_email, person_to_user_name, preferred_address, user_to_person_name};
pub use registry::register_sync_observers;
pub use settings::{NameFieldMap, SlugFilter, SyncSettings, UserNameField};
