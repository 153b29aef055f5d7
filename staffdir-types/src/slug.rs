//! Slug derivation for lookup-key linkage.
//!
//! Flags, entry types, and person URL fragments are all keyed by slug, so
//! the derivation has to be deterministic and stable.

/// Converts an arbitrary display string into a URL-safe slug:
/// lowercase ASCII alphanumerics with single hyphens between words.
///
/// Non-alphanumeric runs collapse to one hyphen; leading and trailing
/// hyphens are stripped.
#[must_use]
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_hyphen = false;
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}
