//! The in-memory directory store.
//!
//! One typed table per entity, keyed by [`RecordId`], plus the two
//! membership relations. Unique lookup keys (usernames, slugs, group names)
//! are enforced at save time. Every mutation fires the registered observers
//! inline, so a failed paired write surfaces to the caller of the original
//! mutation with the originating write already committed.

use crate::{
    EntityKind, MembershipAction, MutationObserver, PropagationCtx, StoreError, StoreResult,
};
use staffdir_model::{
    DirectoryEntry, EmailAddress, EntryType, Group, Person, PersonFlag, UserAccount,
};
use staffdir_types::RecordId;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Default)]
struct Observers {
    person: Vec<Arc<dyn MutationObserver<Person>>>,
    user: Vec<Arc<dyn MutationObserver<UserAccount>>>,
    flag: Vec<Arc<dyn MutationObserver<PersonFlag>>>,
    group: Vec<Arc<dyn MutationObserver<Group>>>,
    entry_type: Vec<Arc<dyn MutationObserver<EntryType>>>,
    entry: Vec<Arc<dyn MutationObserver<DirectoryEntry>>>,
    email: Vec<Arc<dyn MutationObserver<EmailAddress>>>,
}

/// The entity store for the whole directory.
#[derive(Default)]
pub struct DirectoryStore {
    persons: HashMap<RecordId, Person>,
    users: HashMap<RecordId, UserAccount>,
    flags: HashMap<RecordId, PersonFlag>,
    groups: HashMap<RecordId, Group>,
    entry_types: HashMap<RecordId, EntryType>,
    entries: HashMap<RecordId, DirectoryEntry>,
    emails: HashMap<RecordId, EmailAddress>,
    /// Person -> flag membership.
    person_flags: HashMap<RecordId, BTreeSet<RecordId>>,
    /// Account -> group membership.
    user_groups: HashMap<RecordId, BTreeSet<RecordId>>,
    observers: Observers,
    writes: u64,
}

impl DirectoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of table and relation writes performed so far.
    /// Lets tests assert that an already-consistent update writes nothing
    /// beyond the originating row.
    #[must_use]
    pub fn writes(&self) -> u64 {
        self.writes
    }

    // ── Observer registration (one-time wiring at startup) ───────────

    pub fn register_person_observer(&mut self, obs: Arc<dyn MutationObserver<Person>>) {
        self.observers.person.push(obs);
    }

    pub fn register_user_observer(&mut self, obs: Arc<dyn MutationObserver<UserAccount>>) {
        self.observers.user.push(obs);
    }

    pub fn register_flag_observer(&mut self, obs: Arc<dyn MutationObserver<PersonFlag>>) {
        self.observers.flag.push(obs);
    }

    pub fn register_group_observer(&mut self, obs: Arc<dyn MutationObserver<Group>>) {
        self.observers.group.push(obs);
    }

    pub fn register_entry_type_observer(&mut self, obs: Arc<dyn MutationObserver<EntryType>>) {
        self.observers.entry_type.push(obs);
    }

    pub fn register_entry_observer(&mut self, obs: Arc<dyn MutationObserver<DirectoryEntry>>) {
        self.observers.entry.push(obs);
    }

    pub fn register_email_observer(&mut self, obs: Arc<dyn MutationObserver<EmailAddress>>) {
        self.observers.email.push(obs);
    }

    // ── Person ───────────────────────────────────────────────────────

    /// Upserts a person, firing before/after-save observers.
    pub fn save_person(&mut self, person: Person) -> StoreResult<RecordId> {
        let mut ctx = PropagationCtx::new();
        self.save_person_in(person, false, &mut ctx)
    }

    /// Fixture/bulk-load path: observers see `raw = true` and sync handlers
    /// stay inert.
    pub fn load_person(&mut self, person: Person) -> StoreResult<RecordId> {
        let mut ctx = PropagationCtx::new();
        self.save_person_in(person, true, &mut ctx)
    }

    pub fn save_person_in(
        &mut self,
        mut person: Person,
        raw: bool,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<RecordId> {
        // empty strings mean "no value" for the optional lookup keys
        if person.username.as_deref() == Some("") {
            person.username = None;
        }
        if person.slug.as_deref() == Some("") {
            person.slug = None;
        }

        let created = !self.persons.contains_key(&person.id);
        let observers = self.observers.person.clone();
        for obs in &observers {
            obs.on_before_save(self, &mut person, raw, ctx)?;
        }

        if let Some(username) = person.username.as_deref() {
            if self
                .persons
                .values()
                .any(|p| p.id != person.id && p.username.as_deref() == Some(username))
            {
                return Err(StoreError::DuplicateKey {
                    kind: EntityKind::Person,
                    key: username.to_string(),
                });
            }
        }
        if let Some(slug) = person.slug.as_deref() {
            if self
                .persons
                .values()
                .any(|p| p.id != person.id && p.slug.as_deref() == Some(slug))
            {
                return Err(StoreError::DuplicateKey {
                    kind: EntityKind::Person,
                    key: slug.to_string(),
                });
            }
        }

        let id = person.id;
        self.persons.insert(id, person.clone());
        self.writes += 1;
        debug!(%id, created, raw, "saved person");
        for obs in &observers {
            obs.on_after_save(self, &person, created, raw, ctx)?;
        }
        Ok(id)
    }

    /// Deletes a person; absent id is a silent no-op (returns false).
    /// Owned rows (emails, entries, flag membership) are cleaned up quietly.
    pub fn delete_person(&mut self, id: RecordId) -> StoreResult<bool> {
        let mut ctx = PropagationCtx::new();
        self.delete_person_in(id, &mut ctx)
    }

    pub fn delete_person_in(&mut self, id: RecordId, ctx: &mut PropagationCtx) -> StoreResult<bool> {
        let Some(person) = self.persons.remove(&id) else {
            return Ok(false);
        };
        self.person_flags.remove(&id);
        self.emails.retain(|_, e| e.person != id);
        self.entries.retain(|_, e| e.person != id);
        self.writes += 1;
        debug!(%id, "deleted person");
        let observers = self.observers.person.clone();
        for obs in &observers {
            obs.on_after_delete(self, &person, ctx)?;
        }
        Ok(true)
    }

    // ── UserAccount ──────────────────────────────────────────────────

    pub fn save_user(&mut self, user: UserAccount) -> StoreResult<RecordId> {
        let mut ctx = PropagationCtx::new();
        self.save_user_in(user, false, &mut ctx)
    }

    pub fn load_user(&mut self, user: UserAccount) -> StoreResult<RecordId> {
        let mut ctx = PropagationCtx::new();
        self.save_user_in(user, true, &mut ctx)
    }

    pub fn save_user_in(
        &mut self,
        mut user: UserAccount,
        raw: bool,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<RecordId> {
        let created = !self.users.contains_key(&user.id);
        let observers = self.observers.user.clone();
        for obs in &observers {
            obs.on_before_save(self, &mut user, raw, ctx)?;
        }

        if self
            .users
            .values()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(StoreError::DuplicateKey {
                kind: EntityKind::UserAccount,
                key: user.username.clone(),
            });
        }

        let id = user.id;
        self.users.insert(id, user.clone());
        self.writes += 1;
        debug!(%id, created, raw, "saved user account");
        for obs in &observers {
            obs.on_after_save(self, &user, created, raw, ctx)?;
        }
        Ok(id)
    }

    pub fn delete_user(&mut self, id: RecordId) -> StoreResult<bool> {
        let mut ctx = PropagationCtx::new();
        self.delete_user_in(id, &mut ctx)
    }

    pub fn delete_user_in(&mut self, id: RecordId, ctx: &mut PropagationCtx) -> StoreResult<bool> {
        let Some(user) = self.users.remove(&id) else {
            return Ok(false);
        };
        self.user_groups.remove(&id);
        self.writes += 1;
        debug!(%id, "deleted user account");
        let observers = self.observers.user.clone();
        for obs in &observers {
            obs.on_after_delete(self, &user, ctx)?;
        }
        Ok(true)
    }

    // ── PersonFlag ───────────────────────────────────────────────────

    pub fn save_flag(&mut self, flag: PersonFlag) -> StoreResult<RecordId> {
        let mut ctx = PropagationCtx::new();
        self.save_flag_in(flag, false, &mut ctx)
    }

    pub fn load_flag(&mut self, flag: PersonFlag) -> StoreResult<RecordId> {
        let mut ctx = PropagationCtx::new();
        self.save_flag_in(flag, true, &mut ctx)
    }

    pub fn save_flag_in(
        &mut self,
        mut flag: PersonFlag,
        raw: bool,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<RecordId> {
        let created = !self.flags.contains_key(&flag.id);
        let observers = self.observers.flag.clone();
        for obs in &observers {
            obs.on_before_save(self, &mut flag, raw, ctx)?;
        }

        if self
            .flags
            .values()
            .any(|f| f.id != flag.id && f.slug == flag.slug)
        {
            return Err(StoreError::DuplicateKey {
                kind: EntityKind::PersonFlag,
                key: flag.slug.clone(),
            });
        }

        let id = flag.id;
        self.flags.insert(id, flag.clone());
        self.writes += 1;
        debug!(%id, slug = %flag.slug, created, raw, "saved person flag");
        for obs in &observers {
            obs.on_after_save(self, &flag, created, raw, ctx)?;
        }
        Ok(id)
    }

    pub fn delete_flag(&mut self, id: RecordId) -> StoreResult<bool> {
        let mut ctx = PropagationCtx::new();
        self.delete_flag_in(id, &mut ctx)
    }

    pub fn delete_flag_in(&mut self, id: RecordId, ctx: &mut PropagationCtx) -> StoreResult<bool> {
        let Some(flag) = self.flags.remove(&id) else {
            return Ok(false);
        };
        for members in self.person_flags.values_mut() {
            members.remove(&id);
        }
        self.writes += 1;
        debug!(%id, slug = %flag.slug, "deleted person flag");
        let observers = self.observers.flag.clone();
        for obs in &observers {
            obs.on_after_delete(self, &flag, ctx)?;
        }
        Ok(true)
    }

    // ── Group ────────────────────────────────────────────────────────

    pub fn save_group(&mut self, group: Group) -> StoreResult<RecordId> {
        let mut ctx = PropagationCtx::new();
        self.save_group_in(group, false, &mut ctx)
    }

    pub fn load_group(&mut self, group: Group) -> StoreResult<RecordId> {
        let mut ctx = PropagationCtx::new();
        self.save_group_in(group, true, &mut ctx)
    }

    pub fn save_group_in(
        &mut self,
        mut group: Group,
        raw: bool,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<RecordId> {
        let created = !self.groups.contains_key(&group.id);
        let observers = self.observers.group.clone();
        for obs in &observers {
            obs.on_before_save(self, &mut group, raw, ctx)?;
        }

        if self
            .groups
            .values()
            .any(|g| g.id != group.id && g.name == group.name)
        {
            return Err(StoreError::DuplicateKey {
                kind: EntityKind::Group,
                key: group.name.clone(),
            });
        }

        let id = group.id;
        self.groups.insert(id, group.clone());
        self.writes += 1;
        debug!(%id, name = %group.name, created, raw, "saved group");
        for obs in &observers {
            obs.on_after_save(self, &group, created, raw, ctx)?;
        }
        Ok(id)
    }

    pub fn delete_group(&mut self, id: RecordId) -> StoreResult<bool> {
        let mut ctx = PropagationCtx::new();
        self.delete_group_in(id, &mut ctx)
    }

    pub fn delete_group_in(&mut self, id: RecordId, ctx: &mut PropagationCtx) -> StoreResult<bool> {
        let Some(group) = self.groups.remove(&id) else {
            return Ok(false);
        };
        for members in self.user_groups.values_mut() {
            members.remove(&id);
        }
        self.writes += 1;
        debug!(%id, name = %group.name, "deleted group");
        let observers = self.observers.group.clone();
        for obs in &observers {
            obs.on_after_delete(self, &group, ctx)?;
        }
        Ok(true)
    }

    // ── EntryType ────────────────────────────────────────────────────

    pub fn save_entry_type(&mut self, entry_type: EntryType) -> StoreResult<RecordId> {
        let mut ctx = PropagationCtx::new();
        self.save_entry_type_in(entry_type, false, &mut ctx)
    }

    pub fn load_entry_type(&mut self, entry_type: EntryType) -> StoreResult<RecordId> {
        let mut ctx = PropagationCtx::new();
        self.save_entry_type_in(entry_type, true, &mut ctx)
    }

    pub fn save_entry_type_in(
        &mut self,
        mut entry_type: EntryType,
        raw: bool,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<RecordId> {
        let created = !self.entry_types.contains_key(&entry_type.id);
        let observers = self.observers.entry_type.clone();
        for obs in &observers {
            obs.on_before_save(self, &mut entry_type, raw, ctx)?;
        }

        if self
            .entry_types
            .values()
            .any(|t| t.id != entry_type.id && t.slug == entry_type.slug)
        {
            return Err(StoreError::DuplicateKey {
                kind: EntityKind::EntryType,
                key: entry_type.slug.clone(),
            });
        }

        let id = entry_type.id;
        self.entry_types.insert(id, entry_type.clone());
        self.writes += 1;
        debug!(%id, slug = %entry_type.slug, created, raw, "saved entry type");
        for obs in &observers {
            obs.on_after_save(self, &entry_type, created, raw, ctx)?;
        }
        Ok(id)
    }

    pub fn delete_entry_type(&mut self, id: RecordId) -> StoreResult<bool> {
        let mut ctx = PropagationCtx::new();
        self.delete_entry_type_in(id, &mut ctx)
    }

    pub fn delete_entry_type_in(
        &mut self,
        id: RecordId,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<bool> {
        let Some(entry_type) = self.entry_types.remove(&id) else {
            return Ok(false);
        };
        self.entries.retain(|_, e| e.entry_type != id);
        self.writes += 1;
        debug!(%id, slug = %entry_type.slug, "deleted entry type");
        let observers = self.observers.entry_type.clone();
        for obs in &observers {
            obs.on_after_delete(self, &entry_type, ctx)?;
        }
        Ok(true)
    }

    // ── DirectoryEntry ───────────────────────────────────────────────

    pub fn save_entry(&mut self, entry: DirectoryEntry) -> StoreResult<RecordId> {
        let mut ctx = PropagationCtx::new();
        self.save_entry_in(entry, false, &mut ctx)
    }

    pub fn load_entry(&mut self, entry: DirectoryEntry) -> StoreResult<RecordId> {
        let mut ctx = PropagationCtx::new();
        self.save_entry_in(entry, true, &mut ctx)
    }

    pub fn save_entry_in(
        &mut self,
        mut entry: DirectoryEntry,
        raw: bool,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<RecordId> {
        if !self.persons.contains_key(&entry.person) {
            return Err(StoreError::NotFound {
                kind: EntityKind::Person,
                id: entry.person,
            });
        }
        if !self.entry_types.contains_key(&entry.entry_type) {
            return Err(StoreError::NotFound {
                kind: EntityKind::EntryType,
                id: entry.entry_type,
            });
        }

        let created = !self.entries.contains_key(&entry.id);
        let observers = self.observers.entry.clone();
        for obs in &observers {
            obs.on_before_save(self, &mut entry, raw, ctx)?;
        }

        if self.entries.values().any(|e| {
            e.id != entry.id && e.person == entry.person && e.entry_type == entry.entry_type
        }) {
            return Err(StoreError::DuplicateKey {
                kind: EntityKind::DirectoryEntry,
                key: format!("({}, {})", entry.person, entry.entry_type),
            });
        }

        let id = entry.id;
        self.entries.insert(id, entry.clone());
        self.writes += 1;
        debug!(%id, created, raw, "saved directory entry");
        for obs in &observers {
            obs.on_after_save(self, &entry, created, raw, ctx)?;
        }
        Ok(id)
    }

    pub fn delete_entry(&mut self, id: RecordId) -> StoreResult<bool> {
        let mut ctx = PropagationCtx::new();
        self.delete_entry_in(id, &mut ctx)
    }

    pub fn delete_entry_in(&mut self, id: RecordId, ctx: &mut PropagationCtx) -> StoreResult<bool> {
        let Some(entry) = self.entries.remove(&id) else {
            return Ok(false);
        };
        self.writes += 1;
        debug!(%id, "deleted directory entry");
        let observers = self.observers.entry.clone();
        for obs in &observers {
            obs.on_after_delete(self, &entry, ctx)?;
        }
        Ok(true)
    }

    // ── EmailAddress ─────────────────────────────────────────────────

    pub fn save_email(&mut self, email: EmailAddress) -> StoreResult<RecordId> {
        let mut ctx = PropagationCtx::new();
        self.save_email_in(email, false, &mut ctx)
    }

    pub fn load_email(&mut self, email: EmailAddress) -> StoreResult<RecordId> {
        let mut ctx = PropagationCtx::new();
        self.save_email_in(email, true, &mut ctx)
    }

    pub fn save_email_in(
        &mut self,
        mut email: EmailAddress,
        raw: bool,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<RecordId> {
        if !self.persons.contains_key(&email.person) {
            return Err(StoreError::NotFound {
                kind: EntityKind::Person,
                id: email.person,
            });
        }

        let created = !self.emails.contains_key(&email.id);
        let observers = self.observers.email.clone();
        for obs in &observers {
            obs.on_before_save(self, &mut email, raw, ctx)?;
        }

        let id = email.id;
        self.emails.insert(id, email.clone());
        self.writes += 1;
        debug!(%id, created, raw, "saved email address");
        for obs in &observers {
            obs.on_after_save(self, &email, created, raw, ctx)?;
        }
        Ok(id)
    }

    pub fn delete_email(&mut self, id: RecordId) -> StoreResult<bool> {
        let mut ctx = PropagationCtx::new();
        self.delete_email_in(id, &mut ctx)
    }

    pub fn delete_email_in(&mut self, id: RecordId, ctx: &mut PropagationCtx) -> StoreResult<bool> {
        let Some(email) = self.emails.remove(&id) else {
            return Ok(false);
        };
        self.writes += 1;
        let observers = self.observers.email.clone();
        for obs in &observers {
            obs.on_after_delete(self, &email, ctx)?;
        }
        Ok(true)
    }

    // ── Flag membership (person.flags) ───────────────────────────────

    pub fn add_person_flags(&mut self, person_id: RecordId, flag_ids: &[RecordId]) -> StoreResult<()> {
        let mut ctx = PropagationCtx::new();
        self.add_person_flags_in(person_id, flag_ids, &mut ctx)
    }

    pub fn add_person_flags_in(
        &mut self,
        person_id: RecordId,
        flag_ids: &[RecordId],
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        let person = self.person_required(person_id)?;
        for flag_id in flag_ids {
            if !self.flags.contains_key(flag_id) {
                return Err(StoreError::NotFound {
                    kind: EntityKind::PersonFlag,
                    id: *flag_id,
                });
            }
        }
        let members = self.person_flags.entry(person_id).or_default();
        let mut added = Vec::new();
        for flag_id in flag_ids {
            if members.insert(*flag_id) {
                added.push(*flag_id);
            }
        }
        if added.is_empty() {
            return Ok(());
        }
        self.writes += 1;
        debug!(person = %person_id, count = added.len(), "added person flags");
        let observers = self.observers.person.clone();
        for obs in &observers {
            obs.on_membership_changed(self, &person, MembershipAction::Added, &added, ctx)?;
        }
        Ok(())
    }

    pub fn remove_person_flags(
        &mut self,
        person_id: RecordId,
        flag_ids: &[RecordId],
    ) -> StoreResult<()> {
        let mut ctx = PropagationCtx::new();
        self.remove_person_flags_in(person_id, flag_ids, &mut ctx)
    }

    pub fn remove_person_flags_in(
        &mut self,
        person_id: RecordId,
        flag_ids: &[RecordId],
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        let person = self.person_required(person_id)?;
        let Some(members) = self.person_flags.get_mut(&person_id) else {
            return Ok(());
        };
        let mut removed = Vec::new();
        for flag_id in flag_ids {
            if members.remove(flag_id) {
                removed.push(*flag_id);
            }
        }
        if removed.is_empty() {
            return Ok(());
        }
        self.writes += 1;
        debug!(person = %person_id, count = removed.len(), "removed person flags");
        let observers = self.observers.person.clone();
        for obs in &observers {
            obs.on_membership_changed(self, &person, MembershipAction::Removed, &removed, ctx)?;
        }
        Ok(())
    }

    pub fn clear_person_flags(&mut self, person_id: RecordId) -> StoreResult<()> {
        let mut ctx = PropagationCtx::new();
        self.clear_person_flags_in(person_id, &mut ctx)
    }

    /// Fires `Clearing` with the membership snapshot *before* emptying the
    /// relation, so handlers can still resolve the outgoing members.
    pub fn clear_person_flags_in(
        &mut self,
        person_id: RecordId,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        let person = self.person_required(person_id)?;
        let snapshot: Vec<RecordId> = self
            .person_flags
            .get(&person_id)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default();
        if snapshot.is_empty() {
            return Ok(());
        }
        let observers = self.observers.person.clone();
        for obs in &observers {
            obs.on_membership_changed(self, &person, MembershipAction::Clearing, &snapshot, ctx)?;
        }
        self.person_flags.remove(&person_id);
        self.writes += 1;
        debug!(person = %person_id, "cleared person flags");
        Ok(())
    }

    // ── Group membership (user.groups) ───────────────────────────────

    pub fn add_user_groups(&mut self, user_id: RecordId, group_ids: &[RecordId]) -> StoreResult<()> {
        let mut ctx = PropagationCtx::new();
        self.add_user_groups_in(user_id, group_ids, &mut ctx)
    }

    pub fn add_user_groups_in(
        &mut self,
        user_id: RecordId,
        group_ids: &[RecordId],
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        let user = self.user_required(user_id)?;
        for group_id in group_ids {
            if !self.groups.contains_key(group_id) {
                return Err(StoreError::NotFound {
                    kind: EntityKind::Group,
                    id: *group_id,
                });
            }
        }
        let members = self.user_groups.entry(user_id).or_default();
        let mut added = Vec::new();
        for group_id in group_ids {
            if members.insert(*group_id) {
                added.push(*group_id);
            }
        }
        if added.is_empty() {
            return Ok(());
        }
        self.writes += 1;
        debug!(user = %user_id, count = added.len(), "added user groups");
        let observers = self.observers.user.clone();
        for obs in &observers {
            obs.on_membership_changed(self, &user, MembershipAction::Added, &added, ctx)?;
        }
        Ok(())
    }

    pub fn remove_user_groups(
        &mut self,
        user_id: RecordId,
        group_ids: &[RecordId],
    ) -> StoreResult<()> {
        let mut ctx = PropagationCtx::new();
        self.remove_user_groups_in(user_id, group_ids, &mut ctx)
    }

    pub fn remove_user_groups_in(
        &mut self,
        user_id: RecordId,
        group_ids: &[RecordId],
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        let user = self.user_required(user_id)?;
        let Some(members) = self.user_groups.get_mut(&user_id) else {
            return Ok(());
        };
        let mut removed = Vec::new();
        for group_id in group_ids {
            if members.remove(group_id) {
                removed.push(*group_id);
            }
        }
        if removed.is_empty() {
            return Ok(());
        }
        self.writes += 1;
        debug!(user = %user_id, count = removed.len(), "removed user groups");
        let observers = self.observers.user.clone();
        for obs in &observers {
            obs.on_membership_changed(self, &user, MembershipAction::Removed, &removed, ctx)?;
        }
        Ok(())
    }

    pub fn clear_user_groups(&mut self, user_id: RecordId) -> StoreResult<()> {
        let mut ctx = PropagationCtx::new();
        self.clear_user_groups_in(user_id, &mut ctx)
    }

    pub fn clear_user_groups_in(
        &mut self,
        user_id: RecordId,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        let user = self.user_required(user_id)?;
        let snapshot: Vec<RecordId> = self
            .user_groups
            .get(&user_id)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default();
        if snapshot.is_empty() {
            return Ok(());
        }
        let observers = self.observers.user.clone();
        for obs in &observers {
            obs.on_membership_changed(self, &user, MembershipAction::Clearing, &snapshot, ctx)?;
        }
        self.user_groups.remove(&user_id);
        self.writes += 1;
        debug!(user = %user_id, "cleared user groups");
        Ok(())
    }

    // ── Lookups ──────────────────────────────────────────────────────

    #[must_use]
    pub fn person(&self, id: RecordId) -> Option<Person> {
        self.persons.get(&id).cloned()
    }

    #[must_use]
    pub fn user(&self, id: RecordId) -> Option<UserAccount> {
        self.users.get(&id).cloned()
    }

    #[must_use]
    pub fn flag(&self, id: RecordId) -> Option<PersonFlag> {
        self.flags.get(&id).cloned()
    }

    #[must_use]
    pub fn group(&self, id: RecordId) -> Option<Group> {
        self.groups.get(&id).cloned()
    }

    #[must_use]
    pub fn entry_type(&self, id: RecordId) -> Option<EntryType> {
        self.entry_types.get(&id).cloned()
    }

    #[must_use]
    pub fn entry(&self, id: RecordId) -> Option<DirectoryEntry> {
        self.entries.get(&id).cloned()
    }

    #[must_use]
    pub fn email(&self, id: RecordId) -> Option<EmailAddress> {
        self.emails.get(&id).cloned()
    }

    #[must_use]
    pub fn person_by_username(&self, username: &str) -> Option<Person> {
        self.persons
            .values()
            .find(|p| p.username.as_deref() == Some(username))
            .cloned()
    }

    #[must_use]
    pub fn person_by_slug(&self, slug: &str) -> Option<Person> {
        self.persons
            .values()
            .find(|p| p.slug.as_deref() == Some(slug))
            .cloned()
    }

    #[must_use]
    pub fn user_by_username(&self, username: &str) -> Option<UserAccount> {
        self.users.values().find(|u| u.username == username).cloned()
    }

    #[must_use]
    pub fn flag_by_slug(&self, slug: &str) -> Option<PersonFlag> {
        self.flags.values().find(|f| f.slug == slug).cloned()
    }

    /// First flag carrying the verbose name, earliest record winning the
    /// tie (verbose names are not unique, slugs are).
    #[must_use]
    pub fn flag_by_verbose_name(&self, verbose_name: &str) -> Option<PersonFlag> {
        self.flags
            .values()
            .filter(|f| f.verbose_name == verbose_name)
            .min_by_key(|f| f.id)
            .cloned()
    }

    #[must_use]
    pub fn group_by_name(&self, name: &str) -> Option<Group> {
        self.groups.values().find(|g| g.name == name).cloned()
    }

    #[must_use]
    pub fn entry_type_by_slug(&self, slug: &str) -> Option<EntryType> {
        self.entry_types.values().find(|t| t.slug == slug).cloned()
    }

    #[must_use]
    pub fn entry_for(&self, person: RecordId, entry_type: RecordId) -> Option<DirectoryEntry> {
        self.entries
            .values()
            .find(|e| e.person == person && e.entry_type == entry_type)
            .cloned()
    }

    #[must_use]
    pub fn entries_for_person(&self, person: RecordId) -> Vec<DirectoryEntry> {
        let mut entries: Vec<DirectoryEntry> = self
            .entries
            .values()
            .filter(|e| e.person == person)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.id);
        entries
    }

    /// A person's email addresses ordered by id (creation order).
    #[must_use]
    pub fn emails_for(&self, person: RecordId) -> Vec<EmailAddress> {
        let mut emails: Vec<EmailAddress> = self
            .emails
            .values()
            .filter(|e| e.person == person)
            .cloned()
            .collect();
        emails.sort_by_key(|e| e.id);
        emails
    }

    #[must_use]
    pub fn person_flag_ids(&self, person: RecordId) -> Vec<RecordId> {
        self.person_flags
            .get(&person)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn user_group_ids(&self, user: RecordId) -> Vec<RecordId> {
        self.user_groups
            .get(&user)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn person_count(&self) -> usize {
        self.persons.len()
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn flag_count(&self) -> usize {
        self.flags.len()
    }

    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn entry_type_count(&self) -> usize {
        self.entry_types.len()
    }

    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn person_required(&self, id: RecordId) -> StoreResult<Person> {
        self.persons
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                kind: EntityKind::Person,
                id,
            })
    }

    fn user_required(&self, id: RecordId) -> StoreResult<UserAccount> {
        self.users.get(&id).cloned().ok_or(StoreError::NotFound {
            kind: EntityKind::UserAccount,
            id,
        })
    }
}
