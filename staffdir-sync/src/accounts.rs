//! Person / UserAccount synchronization.
//!
//! The pair is linked by username (a lookup key, not a foreign key — the
//! account model is pluggable). Three independent categories: name changes,
//! existence mirroring, and email propagation. An absent counterpart is
//! never an error, just nothing to synchronize.

use crate::mapper::{person_to_user_email, person_to_user_name, user_to_person_name};
use crate::settings::SyncSettings;
use staffdir_model::{EmailAddress, Person, UserAccount};
use staffdir_store::{
    DirectoryStore, EntityKind, MutationObserver, PropagationCtx, StoreResult,
    SyncChannel::Accounts,
};
use staffdir_types::{guess_name, slugify};
use std::sync::Arc;
use tracing::debug;

/// Assigns a unique slug derived from the display name when none is set.
pub struct PersonAutoslug;

impl MutationObserver<Person> for PersonAutoslug {
    fn on_before_save(
        &self,
        store: &mut DirectoryStore,
        person: &mut Person,
        raw: bool,
        _ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        if raw || person.slug.is_some() {
            return Ok(());
        }
        let base = slugify(&person.cn);
        if base.is_empty() {
            return Ok(());
        }
        let mut slug = base.clone();
        let mut n = 1;
        while let Some(existing) = store.person_by_slug(&slug) {
            if existing.id == person.id {
                break;
            }
            slug = format!("{base}-{n}");
            n += 1;
        }
        person.slug = Some(slug);
        Ok(())
    }
}

/// Pushes person name changes onto the paired account.
pub struct PersonNameToUser {
    settings: Arc<SyncSettings>,
}

impl PersonNameToUser {
    pub fn new(settings: &Arc<SyncSettings>) -> Self {
        Self {
            settings: Arc::clone(settings),
        }
    }
}

impl MutationObserver<Person> for PersonNameToUser {
    fn on_after_save(
        &self,
        store: &mut DirectoryStore,
        person: &Person,
        _created: bool,
        raw: bool,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        if raw || ctx.is_marked(Accounts, EntityKind::Person, person.id) {
            return Ok(());
        }
        let Some(username) = person.username.as_deref() else {
            return Ok(());
        };
        let Some(mut user) = store.user_by_username(username) else {
            return Ok(());
        };
        if person_to_user_name(person, &mut user, &self.settings.name_map) {
            debug!(person = %person.id, user = %user.id, "propagating name to account");
            ctx.mark(Accounts, EntityKind::UserAccount, user.id);
            store.save_user_in(user, false, ctx)?;
        }
        Ok(())
    }
}

/// Pushes account name changes onto the paired person.
pub struct UserNameToPerson {
    settings: Arc<SyncSettings>,
}

impl UserNameToPerson {
    pub fn new(settings: &Arc<SyncSettings>) -> Self {
        Self {
            settings: Arc::clone(settings),
        }
    }
}

impl MutationObserver<UserAccount> for UserNameToPerson {
    fn on_after_save(
        &self,
        store: &mut DirectoryStore,
        user: &UserAccount,
        _created: bool,
        raw: bool,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        if raw || ctx.is_marked(Accounts, EntityKind::UserAccount, user.id) {
            return Ok(());
        }
        let Some(mut person) = store.person_by_username(&user.username) else {
            return Ok(());
        };
        if user_to_person_name(&mut person, user, &self.settings.name_map) {
            debug!(user = %user.id, person = %person.id, "propagating name to person");
            ctx.mark(Accounts, EntityKind::Person, person.id);
            store.save_person_in(person, false, ctx)?;
        }
        Ok(())
    }
}

/// Mirrors person creation/deletion onto accounts.
///
/// A person created with a username spawns an account when none exists; a
/// person created without one never does. Deleting a person deletes the
/// paired account.
pub struct PersonUserExistence {
    settings: Arc<SyncSettings>,
}

impl PersonUserExistence {
    pub fn new(settings: &Arc<SyncSettings>) -> Self {
        Self {
            settings: Arc::clone(settings),
        }
    }
}

impl MutationObserver<Person> for PersonUserExistence {
    fn on_after_save(
        &self,
        store: &mut DirectoryStore,
        person: &Person,
        _created: bool,
        raw: bool,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        if raw || ctx.is_marked(Accounts, EntityKind::Person, person.id) {
            return Ok(());
        }
        let Some(username) = person.username.as_deref() else {
            return Ok(());
        };
        if store.user_by_username(username).is_some() {
            return Ok(());
        }
        let mut user = UserAccount::new(username);
        let named = person_to_user_name(person, &mut user, &self.settings.name_map);
        let mailed = person_to_user_email(store, person, &mut user);
        if named || mailed {
            debug!(person = %person.id, username, "creating account for person");
            ctx.mark(Accounts, EntityKind::UserAccount, user.id);
            store.save_user_in(user, false, ctx)?;
        }
        Ok(())
    }

    fn on_after_delete(
        &self,
        store: &mut DirectoryStore,
        person: &Person,
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
        debug!(person = %person.id, user = %user.id, "deleting account with person");
        ctx.mark(Accounts, EntityKind::UserAccount, user.id);
        store.delete_user_in(user.id, ctx)?;
        Ok(())
    }
}

/// Mirrors account creation/deletion onto persons.
///
/// Deletion is soft by default: the person survives with the username
/// cleared, unless `delete_person_on_user_delete` is set.
pub struct UserPersonExistence {
    settings: Arc<SyncSettings>,
}

impl UserPersonExistence {
    pub fn new(settings: &Arc<SyncSettings>) -> Self {
        Self {
            settings: Arc::clone(settings),
        }
    }
}

impl MutationObserver<UserAccount> for UserPersonExistence {
    fn on_after_save(
        &self,
        store: &mut DirectoryStore,
        user: &UserAccount,
        created: bool,
        raw: bool,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        // field changes on existing accounts are handled elsewhere
        if raw || !created || ctx.is_marked(Accounts, EntityKind::UserAccount, user.id) {
            return Ok(());
        }
        if store.person_by_username(&user.username).is_some() {
            return Ok(());
        }

        let full = user.full_name();
        let cn = if full.is_empty() {
            user.username.clone()
        } else {
            full
        };
        let mut person = Person::new(cn).with_username(user.username.clone());
        if self.settings.guess_names_on_create {
            let parts = guess_name(&person.cn, None, None, &self.settings.name_guess);
            person.given_name = parts.given_name;
            person.sn = parts.sn;
        } else {
            person.given_name = user.first_name.clone();
            person.sn = user.last_name.clone();
        }
        debug!(user = %user.id, username = %user.username, "creating person for account");
        ctx.mark(Accounts, EntityKind::Person, person.id);
        store.save_person_in(person, false, ctx)?;
        Ok(())
    }

    fn on_after_delete(
        &self,
        store: &mut DirectoryStore,
        user: &UserAccount,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        if ctx.is_marked(Accounts, EntityKind::UserAccount, user.id) {
            return Ok(());
        }
        let Some(mut person) = store.person_by_username(&user.username) else {
            return Ok(());
        };
        ctx.mark(Accounts, EntityKind::Person, person.id);
        if self.settings.delete_person_on_user_delete {
            debug!(user = %user.id, person = %person.id, "deleting person with account");
            store.delete_person_in(person.id, ctx)?;
        } else {
            debug!(user = %user.id, person = %person.id, "unlinking person from deleted account");
            person.username = None;
            store.save_person_in(person, false, ctx)?;
        }
        Ok(())
    }
}

/// Pushes an account's email onto the paired person's address book: the
/// address becomes the person's sole preferred (and active) address,
/// created with the default contact kind when absent.
pub struct UserEmailToPerson {
    settings: Arc<SyncSettings>,
}

impl UserEmailToPerson {
    pub fn new(settings: &Arc<SyncSettings>) -> Self {
        Self {
            settings: Arc::clone(settings),
        }
    }
}

impl MutationObserver<UserAccount> for UserEmailToPerson {
    fn on_after_save(
        &self,
        store: &mut DirectoryStore,
        user: &UserAccount,
        _created: bool,
        raw: bool,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        if raw || ctx.is_marked(Accounts, EntityKind::UserAccount, user.id) {
            return Ok(());
        }
        if user.email.is_empty() {
            return Ok(());
        }
        let Some(person) = store.person_by_username(&user.username) else {
            return Ok(());
        };

        let mut matched = false;
        for mut email in store.emails_for(person.id) {
            if email.address == user.email {
                matched = true;
                if !email.active || !email.preferred {
                    email.active = true;
                    email.preferred = true;
                    ctx.mark(Accounts, EntityKind::EmailAddress, email.id);
                    store.save_email_in(email, false, ctx)?;
                }
            } else if email.preferred {
                email.preferred = false;
                ctx.mark(Accounts, EntityKind::EmailAddress, email.id);
                store.save_email_in(email, false, ctx)?;
            }
        }
        if !matched {
            debug!(user = %user.id, person = %person.id, "adding account email to person");
            let mut email = EmailAddress::new(
                person.id,
                user.email.clone(),
                self.settings.default_contact_kind.clone(),
            );
            email.preferred = true;
            ctx.mark(Accounts, EntityKind::EmailAddress, email.id);
            store.save_email_in(email, false, ctx)?;
        }
        Ok(())
    }
}

/// Pushes a person's preferred address onto the paired account.
pub struct EmailToUser;

impl MutationObserver<EmailAddress> for EmailToUser {
    fn on_after_save(
        &self,
        store: &mut DirectoryStore,
        email: &EmailAddress,
        _created: bool,
        raw: bool,
        ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        if raw || ctx.is_marked(Accounts, EntityKind::EmailAddress, email.id) {
            return Ok(());
        }
        let Some(person) = store.person(email.person) else {
            return Ok(());
        };
        let Some(username) = person.username.as_deref() else {
            return Ok(());
        };
        let Some(mut user) = store.user_by_username(username) else {
            return Ok(());
        };
        if person_to_user_email(store, &person, &mut user) {
            debug!(person = %person.id, user = %user.id, "propagating email to account");
            ctx.mark(Accounts, EntityKind::UserAccount, user.id);
            store.save_user_in(user, false, ctx)?;
        }
        Ok(())
    }
}
