use proptest::prelude::*;
use staffdir_types::{slugify, RecordId};

proptest! {
    #[test]
    fn slug_only_contains_safe_chars(input in ".*") {
        let slug = slugify(&input);
        prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        prop_assert!(!slug.starts_with('-'));
        prop_assert!(!slug.ends_with('-'));
    }

    #[test]
    fn slugify_is_idempotent(input in ".*") {
        let once = slugify(&input);
        prop_assert_eq!(slugify(&once), once);
    }
}

#[test]
fn record_ids_are_unique() {
    let a = RecordId::new();
    let b = RecordId::new();
    assert_ne!(a, b);
}

#[test]
fn record_id_round_trips_through_display() {
    let id = RecordId::new();
    let parsed = RecordId::parse(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}
