//! Identity derivation for feed events and title abbreviation helpers.

use crate::constants::TITLE_ABBR_MAX_CHARS;

/// Derive the stable annotation key for a feed event.
///
/// Pure and deterministic: stable across restarts and feed re-fetches as
/// long as the feed keeps the same UID for the occurrence. The `::`
/// separator is not expected in either component.
pub fn derive_meta_key(subscription_id: &str, event_uid: &str) -> String {
    format!("{subscription_id}::{event_uid}")
}

/// Auto-derive a short label from a title: the first character of each
/// whitespace-separated word.
pub fn make_title_abbr(title: &str) -> String {
    title
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .collect()
}

/// Normalize a user-entered abbreviation: strip all whitespace and truncate
/// to the maximum abbreviation length.
pub fn clamp_abbr(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<String>()
        .chars()
        .take(TITLE_ABBR_MAX_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_key_is_deterministic() {
        assert_eq!(derive_meta_key("sub-1", "uid-a"), derive_meta_key("sub-1", "uid-a"));
    }

    #[test]
    fn test_meta_key_differs_per_component() {
        let key = derive_meta_key("sub-1", "uid-a");
        assert_ne!(key, derive_meta_key("sub-2", "uid-a"));
        assert_ne!(key, derive_meta_key("sub-1", "uid-b"));
    }

    #[test]
    fn test_make_title_abbr_takes_word_initials() {
        assert_eq!(make_title_abbr("Software Engineering"), "SE");
        assert_eq!(make_title_abbr("  Big   Data  Lab "), "BDL");
        assert_eq!(make_title_abbr(""), "");
    }

    #[test]
    fn test_clamp_abbr_strips_whitespace_and_truncates() {
        assert_eq!(clamp_abbr("  S E  "), "SE");
        assert_eq!(clamp_abbr("ABCDEF"), "ABCD");
        assert_eq!(clamp_abbr("Ü B U N G"), "ÜBUN");
    }
}
