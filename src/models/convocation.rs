//! Squad call-ups per match date.

use crate::models::ids::{generate_id, now_millis};
use crate::models::player::PlayerId;
use crate::models::Record;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fewest players that may be called up for a match.
pub const MIN_CALLED_UP: usize = 11;
/// Most players that may be called up for a match.
pub const MAX_CALLED_UP: usize = 18;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum CallUp {
    #[serde(rename = "C")]
    Called,
    #[serde(rename = "NC")]
    NotCalled,
}

/// The squad called up for one match date. Convocations are unique by `date`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Convocation {
    pub id: String,
    pub date: String,
    #[serde(default)]
    pub players: BTreeMap<PlayerId, CallUp>,
    #[serde(default)]
    pub created_at: i64,
}

impl Convocation {
    pub fn new(date: impl Into<String>, players: BTreeMap<PlayerId, CallUp>) -> Self {
        Self {
            id: generate_id(Self::PREFIX),
            date: date.into(),
            players,
            created_at: now_millis(),
        }
    }

    /// Number of players marked as called up.
    pub fn called_count(&self) -> usize {
        self.players.values().filter(|s| **s == CallUp::Called).count()
    }

    pub fn is_called(&self, player_id: &str) -> bool {
        self.players.get(player_id) == Some(&CallUp::Called)
    }
}

impl Record for Convocation {
    const PREFIX: &'static str = "convocation";

    fn id(&self) -> &str {
        &self.id
    }

    fn inherit_identity(&mut self, previous: &Self) {
        self.id = previous.id.clone();
        self.created_at = previous.created_at;
    }
}
