use pretty_assertions::assert_eq;
use staffdir_model::{Group, Person, PersonFlag, UserAccount};
use staffdir_store::{
    DirectoryStore, MembershipAction, MutationObserver, PropagationCtx, StoreError, StoreResult,
};
use staffdir_types::RecordId;
use std::sync::{Arc, Mutex};

/// Records every event it sees, for asserting dispatch order and payloads.
#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn take(&self) -> Vec<String> {
        std::mem::take(&mut self.events.lock().unwrap())
    }

    fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }
}

impl MutationObserver<Person> for Recorder {
    fn on_before_save(
        &self,
        _store: &mut DirectoryStore,
        record: &mut Person,
        raw: bool,
        _ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        self.push(format!("before_save {} raw={raw}", record.cn));
        Ok(())
    }

    fn on_after_save(
        &self,
        _store: &mut DirectoryStore,
        record: &Person,
        created: bool,
        raw: bool,
        _ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        self.push(format!("after_save {} created={created} raw={raw}", record.cn));
        Ok(())
    }

    fn on_after_delete(
        &self,
        _store: &mut DirectoryStore,
        record: &Person,
        _ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        self.push(format!("after_delete {}", record.cn));
        Ok(())
    }

    fn on_membership_changed(
        &self,
        store: &mut DirectoryStore,
        owner: &Person,
        action: MembershipAction,
        members: &[RecordId],
        _ctx: &mut PropagationCtx,
    ) -> StoreResult<()> {
        // during Clearing the relation must still be readable
        let visible = store.person_flag_ids(owner.id).len();
        self.push(format!(
            "membership {:?} n={} visible={visible}",
            action,
            members.len()
        ));
        Ok(())
    }
}

#[test]
fn save_fires_before_and_after_in_order() {
    let mut store = DirectoryStore::new();
    let recorder = Arc::new(Recorder::default());
    store.register_person_observer(recorder.clone());

    let person = Person::new("Ada Lovelace");
    let id = store.save_person(person.clone()).unwrap();
    assert_eq!(
        recorder.take(),
        vec![
            "before_save Ada Lovelace raw=false",
            "after_save Ada Lovelace created=true raw=false"
        ]
    );

    // resave: not created anymore
    store.save_person(store.person(id).unwrap()).unwrap();
    assert_eq!(
        recorder.take(),
        vec![
            "before_save Ada Lovelace raw=false",
            "after_save Ada Lovelace created=false raw=false"
        ]
    );
}

#[test]
fn load_is_flagged_raw() {
    let mut store = DirectoryStore::new();
    let recorder = Arc::new(Recorder::default());
    store.register_person_observer(recorder.clone());

    store.load_person(Person::new("Fixture")).unwrap();
    assert_eq!(
        recorder.take(),
        vec![
            "before_save Fixture raw=true",
            "after_save Fixture created=true raw=true"
        ]
    );
}

#[test]
fn delete_fires_with_removed_record() {
    let mut store = DirectoryStore::new();
    let recorder = Arc::new(Recorder::default());
    store.register_person_observer(recorder.clone());

    let id = store.save_person(Person::new("Gone")).unwrap();
    recorder.take();
    assert!(store.delete_person(id).unwrap());
    assert_eq!(recorder.take(), vec!["after_delete Gone"]);

    // absent id: silent no-op, no events
    assert!(!store.delete_person(id).unwrap());
    assert!(recorder.take().is_empty());
}

#[test]
fn membership_add_remove_clear_events() {
    let mut store = DirectoryStore::new();
    let recorder = Arc::new(Recorder::default());
    store.register_person_observer(recorder.clone());

    let pid = store.save_person(Person::new("Ada")).unwrap();
    let f1 = store.save_flag(PersonFlag::new("staff", "Staff")).unwrap();
    let f2 = store.save_flag(PersonFlag::new("alumni", "Alumni")).unwrap();
    recorder.take();

    store.add_person_flags(pid, &[f1, f2]).unwrap();
    assert_eq!(recorder.take(), vec!["membership Added n=2 visible=2"]);

    // adding again is a no-op, no event
    store.add_person_flags(pid, &[f1]).unwrap();
    assert!(recorder.take().is_empty());

    store.remove_person_flags(pid, &[f2]).unwrap();
    assert_eq!(recorder.take(), vec!["membership Removed n=1 visible=1"]);

    // clearing reports the snapshot while the relation is still populated
    store.clear_person_flags(pid).unwrap();
    assert_eq!(recorder.take(), vec!["membership Clearing n=1 visible=1"]);
    assert!(store.person_flag_ids(pid).is_empty());

    // clearing an empty relation fires nothing
    store.clear_person_flags(pid).unwrap();
    assert!(recorder.take().is_empty());
}

#[test]
fn duplicate_username_rejected() {
    let mut store = DirectoryStore::new();
    store
        .save_person(Person::new("A").with_username("shared"))
        .unwrap();
    let err = store
        .save_person(Person::new("B").with_username("shared"))
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey { .. }));
}

#[test]
fn duplicate_group_name_rejected() {
    let mut store = DirectoryStore::new();
    store.save_group(Group::new("Staff")).unwrap();
    let err = store.save_group(Group::new("Staff")).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey { .. }));
}

#[test]
fn empty_lookup_keys_normalize_to_none() {
    let mut store = DirectoryStore::new();
    let mut person = Person::new("Blank");
    person.username = Some(String::new());
    person.slug = Some(String::new());
    let id = store.save_person(person).unwrap();

    let stored = store.person(id).unwrap();
    assert_eq!(stored.username, None);
    assert_eq!(stored.slug, None);
}

#[test]
fn deleting_flag_cleans_membership_rows() {
    let mut store = DirectoryStore::new();
    let pid = store.save_person(Person::new("Ada")).unwrap();
    let fid = store.save_flag(PersonFlag::new("staff", "Staff")).unwrap();
    store.add_person_flags(pid, &[fid]).unwrap();

    assert!(store.delete_flag(fid).unwrap());
    assert!(store.person_flag_ids(pid).is_empty());
}

#[test]
fn write_counter_tracks_mutations() {
    let mut store = DirectoryStore::new();
    assert_eq!(store.writes(), 0);

    let uid = store.save_user(UserAccount::new("ada")).unwrap();
    assert_eq!(store.writes(), 1);

    let gid = store.save_group(Group::new("Staff")).unwrap();
    store.add_user_groups(uid, &[gid]).unwrap();
    assert_eq!(store.writes(), 3);

    // redundant add is not a write
    store.add_user_groups(uid, &[gid]).unwrap();
    assert_eq!(store.writes(), 3);
}

#[test]
fn membership_with_unknown_owner_errors() {
    let mut store = DirectoryStore::new();
    let fid = store.save_flag(PersonFlag::new("staff", "Staff")).unwrap();
    let err = store.add_person_flags(RecordId::new(), &[fid]).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}
