//! Observer wiring.
//!
//! Registration order matters for observers of the same entity: name sync
//! runs before existence sync so a freshly mirrored account is created with
//! its final name, and membership observers run last.

use crate::accounts::{
    EmailToUser, PersonAutoslug, PersonNameToUser, PersonUserExistence, UserEmailToPerson,
    UserNameToPerson, UserPersonExistence,
};
use crate::directory::{EntrySync, EntryTypeFlagSync, FlagEntryTypeSync, PersonFlagsToEntries};
use crate::groups::{FlagGroupSync, GroupFlagSync, PersonFlagsToUserGroups, UserGroupsToPersonFlags};
use crate::settings::SyncSettings;
use staffdir_store::DirectoryStore;
use std::sync::Arc;
use tracing::debug;

/// Registers every observer enabled by `settings` on the store. Call once,
/// at startup, before any records flow.
pub fn register_sync_observers(store: &mut DirectoryStore, settings: &Arc<SyncSettings>) {
    if settings.autoslug {
        store.register_person_observer(Arc::new(PersonAutoslug));
    }
    if settings.person_user_name {
        store.register_person_observer(Arc::new(PersonNameToUser::new(settings)));
        store.register_user_observer(Arc::new(UserNameToPerson::new(settings)));
    }
    if settings.person_user_create_delete {
        store.register_person_observer(Arc::new(PersonUserExistence::new(settings)));
        store.register_user_observer(Arc::new(UserPersonExistence::new(settings)));
    }
    if settings.person_user_email {
        store.register_user_observer(Arc::new(UserEmailToPerson::new(settings)));
        store.register_email_observer(Arc::new(EmailToUser));
    }
    if settings.person_flags_user_groups {
        store.register_flag_observer(Arc::new(FlagGroupSync));
        store.register_group_observer(Arc::new(GroupFlagSync));
        store.register_person_observer(Arc::new(PersonFlagsToUserGroups));
        store.register_user_observer(Arc::new(UserGroupsToPersonFlags));
    }
    if !settings.entry_type_flags.is_disabled() {
        if settings.flag_forward_to_entry_types {
            store.register_flag_observer(Arc::new(FlagEntryTypeSync::new(settings)));
        }
        store.register_entry_type_observer(Arc::new(EntryTypeFlagSync::new(settings)));
        store.register_person_observer(Arc::new(PersonFlagsToEntries::new(settings)));
        store.register_entry_observer(Arc::new(EntrySync::new(settings)));
    }
    debug!(
        person_user_name = settings.person_user_name,
        person_user_create_delete = settings.person_user_create_delete,
        person_user_email = settings.person_user_email,
        person_flags_user_groups = settings.person_flags_user_groups,
        directory = !settings.entry_type_flags.is_disabled(),
        "sync observers registered"
    );
}
