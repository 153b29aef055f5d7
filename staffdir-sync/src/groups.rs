//! PersonFlag / Group synchronization.
//!
//! Flags and auth groups are linked by `Group.name == PersonFlag.verbose_name`
//! and are created independently, so membership propagates by name, never by
//! id. Renames follow a conservative collision rule: if the target side
//! already carries the new name, the sync aborts silently rather than
//! merging two distinct labels.

use staffdir_model::{Group, Person, PersonFlag, UserAccount};
use staffdir_store::{
    DirectoryStore, EntityKind, MembershipAction, MutationObserver, PropagationCtx, StoreResult,
    SyncChannel::Accounts,
};
use staffdir_types::RecordId;
use tracing::{debug, warn};

/// Mirrors flag creation, renames, and deletion onto groups.
pub struct FlagGroupSync;

impl MutationObserver<PersonFlag> for FlagGroupSync {
    fn on_before_save(
        &self,
        store: &mut DirectoryStore,
        flag: &mut PersonFlag,
        raw: bool,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        if raw || ctx.is_marked(Accounts, EntityKind::PersonFlag, flag.id) {
            return Ok(());
        }
        let new_name = flag.verbose_name.clone();
        if store.group_by_name(&new_name).is_some() {
            // a distinct group already carries the new name: refuse to guess
            warn!(flag = %flag.id, name = %new_name, "group name collision, sync aborted");
            return Ok(());
        }

        let mut group = Group::new(new_name.clone());
        if let Some(old_flag) = store.flag(flag.id) {
            if let Some(existing) = store.group_by_name(&old_flag.verbose_name) {
                group = existing;
                group.name = new_name;
            }
        }
        ctx.mark(Accounts, EntityKind::Group, group.id);
        store.save_group_in(group, false, ctx)?;
        Ok(())
    }

    fn on_after_delete(
        &self,
        store: &mut DirectoryStore,
        flag: &PersonFlag,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        if ctx.is_marked(Accounts, EntityKind::PersonFlag, flag.id) {
            return Ok(());
        }
        let Some(group) = store.group_by_name(&flag.verbose_name) else {
            return Ok(());
        };
        debug!(flag = %flag.id, group = %group.id, "deleting group with flag");
        ctx.mark(Accounts, EntityKind::Group, group.id);
        store.delete_group_in(group.id, ctx)?;
        Ok(())
    }
}

/// Mirrors group creation, renames, and deletion onto flags.
pub struct GroupFlagSync;

impl MutationObserver<Group> for GroupFlagSync {
    fn on_before_save(
        &self,
        store: &mut DirectoryStore,
        group: &mut Group,
        raw: bool,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        if raw || ctx.is_marked(Accounts, EntityKind::Group, group.id) {
            return Ok(());
        }
        let new_name = group.name.clone();
        if store.flag_by_verbose_name(&new_name).is_some() {
            warn!(group = %group.id, name = %new_name, "flag name collision, sync aborted");
            return Ok(());
        }

        let mut flag = PersonFlag::from_name(new_name.clone());
        if let Some(old_group) = store.group(group.id) {
            if let Some(existing) = store.flag_by_verbose_name(&old_group.name) {
                flag = existing;
            }
        }
        flag.verbose_name = new_name;
        ctx.mark(Accounts, EntityKind::PersonFlag, flag.id);
        store.save_flag_in(flag, false, ctx)?;
        Ok(())
    }

    fn on_after_delete(
        &self,
        store: &mut DirectoryStore,
        group: &Group,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        if ctx.is_marked(Accounts, EntityKind::Group, group.id) {
            return Ok(());
        }
        let Some(flag) = store.flag_by_verbose_name(&group.name) else {
            return Ok(());
        };
        debug!(group = %group.id, flag = %flag.id, "deleting flag with group");
        ctx.mark(Accounts, EntityKind::PersonFlag, flag.id);
        store.delete_flag_in(flag.id, ctx)?;
        Ok(())
    }
}

fn flag_names(store: &DirectoryStore, flag_ids: &[RecordId]) -> Vec<String> {
    flag_ids
        .iter()
        .filter_map(|id| store.flag(*id))
        .map(|f| f.verbose_name)
        .collect()
}

fn group_names(store: &DirectoryStore, group_ids: &[RecordId]) -> Vec<String> {
    group_ids
        .iter()
        .filter_map(|id| store.group(*id))
        .map(|g| g.name)
        .collect()
}

/// Pushes flag membership changes onto the paired account's groups.
pub struct PersonFlagsToUserGroups;

impl MutationObserver<Person> for PersonFlagsToUserGroups {
    fn on_membership_changed(
        &self,
        store: &mut DirectoryStore,
        person: &Person,
        action: MembershipAction,
        members: &[RecordId],
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        if ctx.is_marked(Accounts, EntityKind::Person, person.id) {
            return Ok(());
        }
        let Some(username) = person.username.as_deref() else {
            return Ok(());
        };
        let Some(user) = store.user_by_username(username) else {
            return Ok(());
        };
        let names = flag_names(store, members);
        ctx.mark(Accounts, EntityKind::UserAccount, user.id);
        match action {
            MembershipAction::Removed | MembershipAction::Clearing => {
                let group_ids: Vec<RecordId> = store
                    .user_group_ids(user.id)
                    .into_iter()
                    .filter_map(|id| store.group(id))
                    .filter(|g| names.contains(&g.name))
                    .map(|g| g.id)
                    .collect();
                debug!(person = %person.id, user = %user.id, count = group_ids.len(),
                       "removing groups for removed flags");
                store.remove_user_groups_in(user.id, &group_ids, ctx)?;
            }
            MembershipAction::Added => {
                let mut group_ids = Vec::with_capacity(names.len());
                for name in &names {
                    let group = match store.group_by_name(name) {
                        Some(group) => group,
                        None => {
                            let group = Group::new(name.clone());
                            ctx.mark(Accounts, EntityKind::Group, group.id);
                            store.save_group_in(group.clone(), false, ctx)?;
                            group
                        }
                    };
                    group_ids.push(group.id);
                }
                debug!(person = %person.id, user = %user.id, count = group_ids.len(),
                       "adding groups for added flags");
                store.add_user_groups_in(user.id, &group_ids, ctx)?;
            }
        }
        Ok(())
    }
}

/// Pushes group membership changes onto the paired person's flags.
pub struct UserGroupsToPersonFlags;

impl MutationObserver<UserAccount> for UserGroupsToPersonFlags {
    fn on_membership_changed(
        &self,
        store: &mut DirectoryStore,
        user: &UserAccount,
        action: MembershipAction,
        members: &[RecordId],
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        if ctx.is_marked(Accounts, EntityKind::UserAccount, user.id) {
            return Ok(());
        }
        let Some(person) = store.person_by_username(&user.username) else {
            return Ok(());
        };
        let names = group_names(store, members);
        ctx.mark(Accounts, EntityKind::Person, person.id);
        match action {
            MembershipAction::Removed | MembershipAction::Clearing => {
                let flag_ids: Vec<RecordId> = store
                    .person_flag_ids(person.id)
                    .into_iter()
                    .filter_map(|id| store.flag(id))
                    .filter(|f| names.contains(&f.verbose_name))
                    .map(|f| f.id)
                    .collect();
                debug!(user = %user.id, person = %person.id, count = flag_ids.len(),
                       "removing flags for removed groups");
                store.remove_person_flags_in(person.id, &flag_ids, ctx)?;
            }
            MembershipAction::Added => {
                let mut flag_ids = Vec::with_capacity(names.len());
                for name in &names {
                    let flag = match store.flag_by_verbose_name(name) {
                        Some(flag) => flag,
                        None => {
                            let flag = PersonFlag::from_name(name.clone());
                            ctx.mark(Accounts, EntityKind::PersonFlag, flag.id);
                            store.save_flag_in(flag.clone(), false, ctx)?;
                            flag
                        }
                    };
                    flag_ids.push(flag.id);
                }
                debug!(user = %user.id, person = %person.id, count = flag_ids.len(),
                       "adding flags for added groups");
                store.add_person_flags_in(person.id, &flag_ids, ctx)?;
            }
        }
        Ok(())
    }
}
