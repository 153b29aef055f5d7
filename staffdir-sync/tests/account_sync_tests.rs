//! End-to-end person/account synchronization through a fully wired store.

use pretty_assertions::assert_eq;
use staffdir_model::{EmailAddress, Person, UserAccount};
use staffdir_store::DirectoryStore;
use staffdir_sync::{register_sync_observers, SyncSettings};
use std::sync::Arc;

fn wired_store(settings: SyncSettings) -> DirectoryStore {
    // RUST_LOG=debug shows the propagation chain when a test goes sideways
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let mut store = DirectoryStore::new();
    register_sync_observers(&mut store, &Arc::new(settings));
    store
}

fn ada() -> Person {
    Person::new("Ada Lovelace")
        .with_names("Ada", "Lovelace")
        .with_username("alovelace")
}

#[test]
fn person_create_mirrors_account() {
    let mut store = wired_store(SyncSettings::default());
    store.save_person(ada()).unwrap();

    let user = store.user_by_username("alovelace").unwrap();
    assert_eq!(user.first_name, "Ada");
    assert_eq!(user.last_name, "Lovelace");
}

#[test]
fn person_without_username_stays_unmirrored() {
    let mut store = wired_store(SyncSettings::default());
    store
        .save_person(Person::new("Ada Lovelace").with_names("Ada", "Lovelace"))
        .unwrap();

    assert_eq!(store.user_count(), 0);
}

#[test]
fn person_name_change_reaches_account() {
    let mut store = wired_store(SyncSettings::default());
    let pid = store.save_person(ada()).unwrap();

    let mut person = store.person(pid).unwrap();
    person.sn = "King".into();
    store.save_person(person).unwrap();

    let user = store.user_by_username("alovelace").unwrap();
    assert_eq!(user.last_name, "King");
}

#[test]
fn account_name_change_reaches_person() {
    let mut store = wired_store(SyncSettings::default());
    let pid = store.save_person(ada()).unwrap();

    let mut user = store.user_by_username("alovelace").unwrap();
    user.first_name = "Augusta".into();
    store.save_user(user).unwrap();

    let person = store.person(pid).unwrap();
    assert_eq!(person.given_name, "Augusta");
    // cn follows the account's computed full name
    assert_eq!(person.cn, "Augusta Lovelace");
}

#[test]
fn agreeing_sides_do_not_ping_pong() {
    let mut store = wired_store(SyncSettings::default());
    let pid = store.save_person(ada()).unwrap();

    let before = store.writes();
    let person = store.person(pid).unwrap();
    store.save_person(person).unwrap();

    // only the person save itself hits the store
    assert_eq!(store.writes(), before + 1);
}

#[test]
fn sync_name_opt_out_is_respected() {
    let mut store = wired_store(SyncSettings::default());
    let mut person = ada();
    person.sync_name = false;
    store.save_person(person).unwrap();

    // existence still mirrors (via email/name mapping both report no change,
    // so no account is spawned for an opted-out, email-less person)
    assert!(store.user_by_username("alovelace").is_none());
}

#[test]
fn account_create_mirrors_person() {
    let mut store = wired_store(SyncSettings::default());
    let mut user = UserAccount::new("ghopper");
    user.first_name = "Grace".into();
    user.last_name = "Hopper".into();
    store.save_user(user).unwrap();

    let person = store.person_by_username("ghopper").unwrap();
    assert_eq!(person.cn, "Grace Hopper");
    assert_eq!(person.given_name, "Grace");
    assert_eq!(person.sn, "Hopper");
}

#[test]
fn unnamed_account_falls_back_to_username() {
    let mut store = wired_store(SyncSettings::default());
    store.save_user(UserAccount::new("ghopper")).unwrap();

    let person = store.person_by_username("ghopper").unwrap();
    assert_eq!(person.cn, "ghopper");
}

#[test]
fn guessed_names_split_the_display_name() {
    let settings = SyncSettings {
        guess_names_on_create: true,
        ..SyncSettings::default()
    };
    let mut store = wired_store(settings);
    let mut user = UserAccount::new("lvbeethoven");
    user.first_name = "Ludwig".into();
    user.last_name = "van Beethoven".into();
    store.save_user(user).unwrap();

    let person = store.person_by_username("lvbeethoven").unwrap();
    assert_eq!(person.given_name, "Ludwig");
    assert_eq!(person.sn, "van Beethoven");
}

#[test]
fn person_delete_removes_account() {
    let mut store = wired_store(SyncSettings::default());
    let pid = store.save_person(ada()).unwrap();

    store.delete_person(pid).unwrap();
    assert!(store.user_by_username("alovelace").is_none());
}

#[test]
fn account_delete_unlinks_person_by_default() {
    let mut store = wired_store(SyncSettings::default());
    let pid = store.save_person(ada()).unwrap();
    let user = store.user_by_username("alovelace").unwrap();

    store.delete_user(user.id).unwrap();

    let person = store.person(pid).unwrap();
    assert_eq!(person.username, None);
}

#[test]
fn account_delete_can_cascade_to_person() {
    let settings = SyncSettings {
        delete_person_on_user_delete: true,
        ..SyncSettings::default()
    };
    let mut store = wired_store(settings);
    let pid = store.save_person(ada()).unwrap();
    let user = store.user_by_username("alovelace").unwrap();

    store.delete_user(user.id).unwrap();
    assert!(store.person(pid).is_none());
}

#[test]
fn raw_loads_are_inert() {
    let mut store = wired_store(SyncSettings::default());
    store.load_person(ada()).unwrap();

    assert_eq!(store.user_count(), 0);
}

#[test]
fn preferred_email_reaches_account() {
    let mut store = wired_store(SyncSettings::default());
    let pid = store.save_person(ada()).unwrap();

    let mut email = EmailAddress::new(pid, "ada@example.org", "work");
    email.preferred = true;
    store.save_email(email).unwrap();

    let user = store.user_by_username("alovelace").unwrap();
    assert_eq!(user.email, "ada@example.org");
}

#[test]
fn account_email_becomes_sole_preferred_address() {
    let mut store = wired_store(SyncSettings::default());
    let pid = store.save_person(ada()).unwrap();

    let mut old = EmailAddress::new(pid, "old@example.org", "home");
    old.preferred = true;
    store.save_email(old).unwrap();

    let mut user = store.user_by_username("alovelace").unwrap();
    user.email = "ada@example.org".into();
    store.save_user(user).unwrap();

    let emails = store.emails_for(pid);
    let preferred: Vec<_> = emails.iter().filter(|e| e.preferred).collect();
    assert_eq!(preferred.len(), 1);
    assert_eq!(preferred[0].address, "ada@example.org");
    assert_eq!(preferred[0].kind, "work");
}

#[test]
fn autoslug_assigns_and_deduplicates() {
    let settings = SyncSettings {
        autoslug: true,
        ..SyncSettings::default()
    };
    let mut store = wired_store(settings);

    let first = store.save_person(Person::new("Ada Lovelace")).unwrap();
    let second = store.save_person(Person::new("Ada Lovelace")).unwrap();

    assert_eq!(store.person(first).unwrap().slug.as_deref(), Some("ada-lovelace"));
    assert_eq!(
        store.person(second).unwrap().slug.as_deref(),
        Some("ada-lovelace-1")
    );
}

#[test]
fn disabled_categories_register_nothing() {
    let settings = SyncSettings {
        person_user_name: false,
        person_user_create_delete: false,
        person_user_email: false,
        person_flags_user_groups: false,
        ..SyncSettings::default()
    };
    let mut store = wired_store(settings);
    store.save_person(ada()).unwrap();

    assert_eq!(store.user_count(), 0);
}
