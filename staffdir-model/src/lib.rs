//! Entity model types for the staffdir engine.
//!
//! Plain data records; relations (flag membership, group membership) live in
//! the store, not on the structs. Records are linked across tables by lookup
//! key, never by cross-table id:
//!
//! - `Person.username` == `UserAccount.username`
//! - `PersonFlag.verbose_name` == `Group.name`
//! - `EntryType.slug` == `PersonFlag.slug`

mod account;
mod contact;
mod directory;
mod labels;
mod person;

pub use account::{Group, UserAccount};
pub use contact::EmailAddress;
pub use directory::{DirectoryEntry, EntryType};
pub use labels::PersonFlag;
pub use person::Person;
