//! Directory / flag synchronization.
//!
//! Entry types and flags are linked by slug, and a person's directory
//! entries follow their flags (and vice versa). Only slugs admitted by
//! [`SlugFilter`] take part; everything else is invisible to this channel.
//! Entries are deactivated rather than deleted when a flag goes away, so a
//! manually curated entry survives a membership flap.

use crate::settings::{SlugFilter, SyncSettings};
use staffdir_model::{DirectoryEntry, EntryType, Person, PersonFlag};
use staffdir_store::{
    DirectoryStore, EntityKind, MembershipAction, MutationObserver, PropagationCtx, StoreResult,
    SyncChannel::Directory,
};
use staffdir_types::RecordId;
use std::sync::Arc;
use tracing::debug;

/// Keeps a flag in step with its entry type.
///
/// Propagates on creation and on slug changes; a rename whose new slug is
/// already taken by another flag aborts silently.
pub struct EntryTypeFlagSync {
    settings: Arc<SyncSettings>,
}

impl EntryTypeFlagSync {
    pub fn new(settings: &Arc<SyncSettings>) -> Self {
        Self {
            settings: Arc::clone(settings),
        }
    }
}

impl MutationObserver<EntryType> for EntryTypeFlagSync {
    fn on_before_save(
        &self,
        store: &mut DirectoryStore,
        entry_type: &mut EntryType,
        raw: bool,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        if raw
            || ctx.is_marked(Directory, EntityKind::EntryType, entry_type.id)
            || !self.settings.entry_type_flags.allows(&entry_type.slug)
        {
            return Ok(());
        }
        if store.flag_by_slug(&entry_type.slug).is_some() {
            // slug unchanged, or taken by an unrelated flag: leave it alone
            return Ok(());
        }

        let mut flag = PersonFlag::new(entry_type.slug.clone(), entry_type.verbose_name.clone());
        if let Some(old_type) = store.entry_type(entry_type.id) {
            if let Some(existing) = store.flag_by_slug(&old_type.slug) {
                flag = existing;
            }
        }
        flag.slug.clone_from(&entry_type.slug);
        flag.verbose_name.clone_from(&entry_type.verbose_name);
        flag.active = entry_type.active;
        debug!(entry_type = %entry_type.id, flag = %flag.id, slug = %flag.slug,
               "syncing flag with entry type");
        ctx.mark(Directory, EntityKind::PersonFlag, flag.id);
        store.save_flag_in(flag, false, ctx)?;
        Ok(())
    }

    fn on_after_delete(
        &self,
        store: &mut DirectoryStore,
        entry_type: &EntryType,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        if ctx.is_marked(Directory, EntityKind::EntryType, entry_type.id)
            || !self.settings.entry_type_flags.allows(&entry_type.slug)
        {
            return Ok(());
        }
        let Some(flag) = store.flag_by_slug(&entry_type.slug) else {
            return Ok(());
        };
        debug!(entry_type = %entry_type.id, flag = %flag.id, "deleting flag with entry type");
        ctx.mark(Directory, EntityKind::PersonFlag, flag.id);
        store.delete_flag_in(flag.id, ctx)?;
        Ok(())
    }
}

/// Keeps an entry type in step with its flag.
///
/// Only updates types that already exist: a flag that predates the sync
/// never spawns a directory category on its own.
pub struct FlagEntryTypeSync {
    settings: Arc<SyncSettings>,
}

impl FlagEntryTypeSync {
    pub fn new(settings: &Arc<SyncSettings>) -> Self {
        Self {
            settings: Arc::clone(settings),
        }
    }
}

impl MutationObserver<PersonFlag> for FlagEntryTypeSync {
    fn on_before_save(
        &self,
        store: &mut DirectoryStore,
        flag: &mut PersonFlag,
        raw: bool,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        if raw
            || ctx.is_marked(Directory, EntityKind::PersonFlag, flag.id)
            || !self.settings.entry_type_flags.allows(&flag.slug)
        {
            return Ok(());
        }
        if store.entry_type_by_slug(&flag.slug).is_some() {
            return Ok(());
        }

        let mut entry_type = match store.flag(flag.id) {
            Some(old_flag) => match store.entry_type_by_slug(&old_flag.slug) {
                Some(existing) => existing,
                // a pre-existing flag with no paired type stays unpaired
                None => return Ok(()),
            },
            None => EntryType::new(flag.slug.clone(), flag.verbose_name.clone()),
        };
        entry_type.slug.clone_from(&flag.slug);
        entry_type.verbose_name.clone_from(&flag.verbose_name);
        entry_type.verbose_name_plural.clone_from(&flag.verbose_name);
        entry_type.active = flag.active;
        debug!(flag = %flag.id, entry_type = %entry_type.id, slug = %entry_type.slug,
               "syncing entry type with flag");
        ctx.mark(Directory, EntityKind::EntryType, entry_type.id);
        store.save_entry_type_in(entry_type, false, ctx)?;
        Ok(())
    }

    fn on_after_delete(
        &self,
        store: &mut DirectoryStore,
        flag: &PersonFlag,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        if ctx.is_marked(Directory, EntityKind::PersonFlag, flag.id)
            || !self.settings.entry_type_flags.allows(&flag.slug)
        {
            return Ok(());
        }
        let Some(entry_type) = store.entry_type_by_slug(&flag.slug) else {
            return Ok(());
        };
        debug!(flag = %flag.id, entry_type = %entry_type.id, "deleting entry type with flag");
        ctx.mark(Directory, EntityKind::EntryType, entry_type.id);
        store.delete_entry_type_in(entry_type.id, ctx)?;
        Ok(())
    }
}

fn member_slugs(store: &DirectoryStore, flag_ids: &[RecordId], filter: &SlugFilter) -> Vec<String> {
    flag_ids
        .iter()
        .filter_map(|id| store.flag(*id))
        .map(|f| f.slug)
        .filter(|slug| filter.allows(slug))
        .collect()
}

/// Follows flag membership with directory entries.
///
/// Gaining a flag activates (or creates) the matching entry; losing one
/// deactivates it. Entries are never deleted here.
pub struct PersonFlagsToEntries {
    settings: Arc<SyncSettings>,
}

impl PersonFlagsToEntries {
    pub fn new(settings: &Arc<SyncSettings>) -> Self {
        Self {
            settings: Arc::clone(settings),
        }
    }
}

impl MutationObserver<Person> for PersonFlagsToEntries {
    fn on_membership_changed(
        &self,
        store: &mut DirectoryStore,
        person: &Person,
        action: MembershipAction,
        members: &[RecordId],
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        if ctx.is_marked(Directory, EntityKind::Person, person.id) {
            return Ok(());
        }
        let slugs = member_slugs(store, members, &self.settings.entry_type_flags);
        if slugs.is_empty() {
            return Ok(());
        }
        ctx.mark(Directory, EntityKind::Person, person.id);
        match action {
            MembershipAction::Removed | MembershipAction::Clearing => {
                for mut entry in store.entries_for_person(person.id) {
                    if !entry.active {
                        continue;
                    }
                    let Some(entry_type) = store.entry_type(entry.entry_type) else {
                        continue;
                    };
                    if !slugs.contains(&entry_type.slug) {
                        continue;
                    }
                    debug!(person = %person.id, entry = %entry.id, slug = %entry_type.slug,
                           "deactivating entry for removed flag");
                    entry.active = false;
                    store.save_entry_in(entry, false, ctx)?;
                }
            }
            MembershipAction::Added => {
                for slug in &slugs {
                    let Some(entry_type) = store.entry_type_by_slug(slug) else {
                        continue;
                    };
                    match store.entry_for(person.id, entry_type.id) {
                        Some(mut entry) => {
                            if !entry.active {
                                debug!(person = %person.id, entry = %entry.id, slug,
                                       "reactivating entry for added flag");
                                entry.active = true;
                                store.save_entry_in(entry, false, ctx)?;
                            }
                        }
                        None => {
                            debug!(person = %person.id, slug, "creating entry for added flag");
                            let entry = DirectoryEntry::new(person.id, entry_type.id);
                            store.save_entry_in(entry, false, ctx)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Follows directory entries with flag membership.
pub struct EntrySync {
    settings: Arc<SyncSettings>,
}

impl EntrySync {
    pub fn new(settings: &Arc<SyncSettings>) -> Self {
        Self {
            settings: Arc::clone(settings),
        }
    }

    fn remove_flag_for(
        &self,
        store: &mut DirectoryStore,
        person: RecordId,
        entry_type: RecordId,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        let Some(entry_type) = store.entry_type(entry_type) else {
            return Ok(());
        };
        if !self.settings.entry_type_flags.allows(&entry_type.slug) {
            return Ok(());
        }
        if let Some(flag) = store.flag_by_slug(&entry_type.slug) {
            store.remove_person_flags_in(person, &[flag.id], ctx)?;
        }
        Ok(())
    }
}

impl MutationObserver<DirectoryEntry> for EntrySync {
    fn on_before_save(
        &self,
        store: &mut DirectoryStore,
        entry: &mut DirectoryEntry,
        raw: bool,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        if raw || ctx.is_marked(Directory, EntityKind::Person, entry.person) {
            return Ok(());
        }
        ctx.mark(Directory, EntityKind::Person, entry.person);

        if let Some(old_entry) = store.entry(entry.id) {
            if old_entry.entry_type == entry.entry_type {
                return Ok(());
            }
            // entry moved categories: shed the old flag first
            self.remove_flag_for(store, entry.person, old_entry.entry_type, ctx)?;
        }
        if !entry.active {
            return Ok(());
        }
        let Some(entry_type) = store.entry_type(entry.entry_type) else {
            return Ok(());
        };
        if !self.settings.entry_type_flags.allows(&entry_type.slug) {
            return Ok(());
        }
        if let Some(flag) = store.flag_by_slug(&entry_type.slug) {
            debug!(entry = %entry.id, person = %entry.person, slug = %entry_type.slug,
                   "adding flag for entry");
            store.add_person_flags_in(entry.person, &[flag.id], ctx)?;
        }
        Ok(())
    }

    fn on_after_delete(
        &self,
        store: &mut DirectoryStore,
        entry: &DirectoryEntry,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        if ctx.is_marked(Directory, EntityKind::Person, entry.person) {
            return Ok(());
        }
        ctx.mark(Directory, EntityKind::Person, entry.person);
        self.remove_flag_for(store, entry.person, entry.entry_type, ctx)
    }
}
