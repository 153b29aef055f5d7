//! Field mapping between persons and accounts.
//!
//! Pure copy helpers driven by [`NameFieldMap`]. Every function reports
//! whether anything actually changed, so callers can skip needless writes —
//! that report is also what keeps bidirectional sync from ping-ponging when
//! both sides already agree.

use crate::settings::{NameFieldMap, UserNameField};
use staffdir_model::{Person, UserAccount};
use staffdir_store::DirectoryStore;
use staffdir_types::RecordId;

/// Copies the person's name fields onto the account per the field map.
///
/// The mapping is asymmetric by design: a person field mapped to the
/// computed `FullName` accessor is skipped in this direction, since the
/// account derives it from first/last name. Respects the person's
/// `sync_name` opt-out.
pub fn person_to_user_name(person: &Person, user: &mut UserAccount, map: &NameFieldMap) -> bool {
    if !person.sync_name {
        return false;
    }
    let mut changed = false;
    let fields = [
        (&person.sn, map.sn),
        (&person.given_name, map.given_name),
        (&person.cn, map.cn),
    ];
    for (value, target) in fields {
        let Some(target) = target else { continue };
        let slot = match target {
            UserNameField::FirstName => &mut user.first_name,
            UserNameField::LastName => &mut user.last_name,
            // computed on the account, nothing to assign
            UserNameField::FullName => continue,
        };
        if *slot != *value {
            slot.clone_from(value);
            changed = true;
        }
    }
    changed
}

/// Copies the account's name fields onto the person per the field map.
/// `FullName` resolves through the computed accessor in this direction.
pub fn user_to_person_name(person: &mut Person, user: &UserAccount, map: &NameFieldMap) -> bool {
    if !person.sync_name {
        return false;
    }
    let mut changed = false;
    let fields = [
        (&mut person.sn, map.sn),
        (&mut person.given_name, map.given_name),
        (&mut person.cn, map.cn),
    ];
    for (slot, source) in fields {
        let Some(source) = source else { continue };
        let value = match source {
            UserNameField::FirstName => user.first_name.clone(),
            UserNameField::LastName => user.last_name.clone(),
            UserNameField::FullName => user.full_name(),
        };
        if *slot != value {
            *slot = value;
            changed = true;
        }
    }
    changed
}

/// The address that should propagate to the paired account: the person's
/// preferred active address, or failing that the earliest-created active
/// address (explicit lowest-id tie-break).
#[must_use]
pub fn preferred_address(store: &DirectoryStore, person: RecordId) -> Option<String> {
    let emails: Vec<_> = store
        .emails_for(person)
        .into_iter()
        .filter(|e| e.active)
        .collect();
    if let Some(email) = emails.iter().find(|e| e.preferred) {
        return Some(email.address.clone());
    }
    emails.first().map(|e| e.address.clone())
}

/// Applies the person's preferred email address to the account.
pub fn person_to_user_email(
    store: &DirectoryStore,
    person: &Person,
    user: &mut UserAccount,
) -> bool {
    let Some(address) = preferred_address(store, person.id) else {
        return false;
    };
    if user.email != address {
        user.email = address;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use staffdir_model::EmailAddress;

    fn sample_pair() -> (Person, UserAccount) {
        let person = Person::new("Ada Lovelace")
            .with_names("Ada", "Lovelace")
            .with_username("alovelace");
        let user = UserAccount::new("alovelace");
        (person, user)
    }

    #[test]
    fn person_to_user_copies_mapped_fields() {
        let (person, mut user) = sample_pair();
        assert!(person_to_user_name(&person, &mut user, &NameFieldMap::default()));
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.last_name, "Lovelace");
    }

    #[test]
    fn person_to_user_is_idempotent() {
        let (person, mut user) = sample_pair();
        person_to_user_name(&person, &mut user, &NameFieldMap::default());
        assert!(!person_to_user_name(&person, &mut user, &NameFieldMap::default()));
    }

    #[test]
    fn sync_name_opt_out_blocks_copy() {
        let (mut person, mut user) = sample_pair();
        person.sync_name = false;
        assert!(!person_to_user_name(&person, &mut user, &NameFieldMap::default()));
        assert_eq!(user.first_name, "");
    }

    #[test]
    fn none_mapping_disables_a_field() {
        let (person, mut user) = sample_pair();
        let map = NameFieldMap {
            sn: None,
            ..NameFieldMap::default()
        };
        person_to_user_name(&person, &mut user, &map);
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.last_name, "");
    }

    #[test]
    fn user_to_person_resolves_computed_full_name() {
        let (mut person, mut user) = sample_pair();
        user.first_name = "Grace".into();
        user.last_name = "Hopper".into();
        assert!(user_to_person_name(&mut person, &user, &NameFieldMap::default()));
        assert_eq!(person.given_name, "Grace");
        assert_eq!(person.sn, "Hopper");
        assert_eq!(person.cn, "Grace Hopper");
    }

    #[test]
    fn preferred_address_tie_breaks_by_lowest_id() {
        let mut store = DirectoryStore::new();
        let pid = store.save_person(Person::new("Ada")).unwrap();

        let a = EmailAddress::new(pid, "a@example.org", "work");
        let b = EmailAddress::new(pid, "b@example.org", "work");
        let expected = if a.id < b.id {
            a.address.clone()
        } else {
            b.address.clone()
        };
        store.save_email(a).unwrap();
        store.save_email(b).unwrap();

        // no preferred address: lowest id wins, deterministically
        assert_eq!(preferred_address(&store, pid), Some(expected));
    }

    #[test]
    fn preferred_address_prefers_preferred() {
        let mut store = DirectoryStore::new();
        let pid = store.save_person(Person::new("Ada")).unwrap();

        store
            .save_email(EmailAddress::new(pid, "first@example.org", "work"))
            .unwrap();
        let mut preferred = EmailAddress::new(pid, "preferred@example.org", "work");
        preferred.preferred = true;
        store.save_email(preferred).unwrap();

        assert_eq!(
            preferred_address(&store, pid).as_deref(),
            Some("preferred@example.org")
        );
    }

    #[test]
    fn inactive_addresses_are_ignored() {
        let mut store = DirectoryStore::new();
        let pid = store.save_person(Person::new("Ada")).unwrap();

        let mut dead = EmailAddress::new(pid, "dead@example.org", "work");
        dead.active = false;
        dead.preferred = true;
        store.save_email(dead).unwrap();

        assert_eq!(preferred_address(&store, pid), None);
    }
}
