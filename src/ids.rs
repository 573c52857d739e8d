//! Identifiers for sessions and shares
//!
//! Sessions and shares are keyed by random v4 UUIDs. Shares are additionally
//! addressed publicly by a short slug drawn from a lowercase alphanumeric
//! alphabet.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Symbols a slug is drawn from
pub const SLUG_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of newly minted slugs
pub const SLUG_LENGTH: usize = 8;

/// Shortest slug accepted on lookup (older ephemeral shares used 7)
pub const SLUG_MIN_LENGTH: usize = 7;

/// Unique identifier for a browser session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new random session ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Internal identifier for a shared item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareId(pub Uuid);

impl ShareId {
    /// Generate a new random share ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ShareId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ShareId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ShareId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Generate a new random slug.
///
/// No check against existing slugs is made here; the store's uniqueness
/// constraint rejects the rare collision.
pub fn new_slug() -> String {
    let mut rng = rand::rng();
    (0..SLUG_LENGTH)
        .map(|_| SLUG_ALPHABET[rng.random_range(0..SLUG_ALPHABET.len())] as char)
        .collect()
}

/// Whether `s` could have been produced as a slug
pub fn is_valid_slug(s: &str) -> bool {
    (SLUG_MIN_LENGTH..=SLUG_LENGTH).contains(&s.len())
        && s.bytes().all(|b| SLUG_ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn session_id_generation() {
        let id1 = SessionId::new();
        let id2 = SessionId::new();
        assert_ne!(id1, id2);
        assert_eq!(id1.0.get_version_num(), 4);
    }

    #[test]
    fn share_id_parse_roundtrip() {
        let id = ShareId::new();
        let parsed: ShareId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn session_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<SessionId>().is_err());
        assert!("".parse::<SessionId>().is_err());
    }

    #[test]
    fn session_id_serializes_as_plain_string() {
        let id = SessionId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }

    #[test]
    fn slug_shape() {
        for _ in 0..1000 {
            let slug = new_slug();
            assert_eq!(slug.len(), SLUG_LENGTH);
            assert!(slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
            assert!(is_valid_slug(&slug));
        }
    }

    #[test]
    fn slugs_are_unique_across_many_generations() {
        let slugs: HashSet<String> = (0..10_000).map(|_| new_slug()).collect();
        assert_eq!(slugs.len(), 10_000);
    }

    #[test]
    fn valid_slug_bounds() {
        assert!(is_valid_slug("abc1234"));
        assert!(is_valid_slug("abc12345"));
        assert!(!is_valid_slug("abc123"));
        assert!(!is_valid_slug("abc123456"));
        assert!(!is_valid_slug("ABC12345"));
        assert!(!is_valid_slug("abc-1234"));
        assert!(!is_valid_slug(""));
    }
}
