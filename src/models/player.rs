//! Player data structure and name ordering.

use crate::models::ids::{generate_id, now_millis};
use crate::models::Record;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Unique identifier for a player (referenced by sessions, match entries and convocations).
pub type PlayerId = String;

/// A squad member.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub created_at: i64,
}

impl Player {
    /// Create a new player with the given (trimmed) name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(Self::PREFIX),
            name: name.into().trim().to_string(),
            created_at: now_millis(),
        }
    }

    /// Case-insensitive name comparison used for the duplicate-name warning.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}

impl Record for Player {
    const PREFIX: &'static str = "player";

    fn id(&self) -> &str {
        &self.id
    }

    fn inherit_identity(&mut self, previous: &Self) {
        self.id = previous.id.clone();
        self.created_at = previous.created_at;
    }
}

/// Sort key for names: lowercase, accents folded, `ñ` right after `n`.
fn name_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    for c in name.trim().chars().flat_map(char::to_lowercase) {
        match c {
            'á' | 'à' | 'â' | 'ä' => key.push('a'),
            'é' | 'è' | 'ê' | 'ë' => key.push('e'),
            'í' | 'ì' | 'î' | 'ï' => key.push('i'),
            'ó' | 'ò' | 'ô' | 'ö' => key.push('o'),
            'ú' | 'ù' | 'û' | 'ü' => key.push('u'),
            'ç' => key.push('c'),
            'ñ' => key.push_str("n~"),
            other => key.push(other),
        }
    }
    key
}

/// Locale-style, case-insensitive ordering of display names.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    name_key(a).cmp(&name_key(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_compare_without_case_or_accents() {
        assert_eq!(compare_names("álvaro", "Alvaro"), Ordering::Equal);
        assert_eq!(compare_names("ana", "Bea"), Ordering::Less);
        assert_eq!(compare_names("Nuria", "Ñito"), Ordering::Less);
        assert_eq!(compare_names("Ñito", "Olga"), Ordering::Less);
    }

    #[test]
    fn has_name_ignores_case() {
        let p = Player::new("  Ana ");
        assert_eq!(p.name, "Ana");
        assert!(p.has_name("ANA"));
        assert!(!p.has_name("Anabel"));
    }
}
