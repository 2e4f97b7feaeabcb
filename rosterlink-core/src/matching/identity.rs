//! Identity string normalisation.
//!
//! Claimed identities and platform names are compared case-insensitively
//! after trimming. A "base name" is everything before the first `#`.

/// Trimmed, lowercased form used as the exact-index key.
pub fn normalize(identity: &str) -> String {
    identity.trim().to_lowercase()
}

/// The part of an identity before its first `#`, trimmed and lowercased.
pub fn base_name(identity: &str) -> String {
    let head = match identity.split_once('#') {
        Some((head, _)) => head,
        None => identity,
    };
    normalize(head)
}

/// `"{display_name}#{external_id}"`, lowercased.
pub fn canonical_identity(display_name: &str, external_id: &str) -> String {
    format!("{}#{}", display_name.trim(), external_id.trim()).to_lowercase()
}
