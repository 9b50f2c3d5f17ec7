//! Per-player match stat lines, plus the older per-date record shape they replaced.

use crate::models::ids::{generate_id, now_millis};
use crate::models::player::PlayerId;
use crate::models::Record;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Counters recorded for a player in one match.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct StatLine {
    #[serde(default, deserialize_with = "lenient_count")]
    pub goals: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub assists: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub yellows: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub reds: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub minutes: u32,
}

/// One player's stat line for one match date. (player_id, date) is unique at write time.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchEntry {
    pub id: String,
    pub date: String,
    #[serde(default)]
    pub created_at: i64,
    pub player_id: PlayerId,
    #[serde(flatten)]
    pub stats: StatLine,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl MatchEntry {
    pub fn new(date: impl Into<String>, player_id: impl Into<PlayerId>, stats: StatLine) -> Self {
        Self {
            id: generate_id(Self::PREFIX),
            date: date.into(),
            created_at: now_millis(),
            player_id: player_id.into(),
            stats,
            updated_at: None,
        }
    }
}

impl Record for MatchEntry {
    const PREFIX: &'static str = "mentry";

    fn id(&self) -> &str {
        &self.id
    }

    fn inherit_identity(&mut self, previous: &Self) {
        self.id = previous.id.clone();
        self.created_at = previous.created_at;
    }
}

/// Older shape: one record per match date, stats nested by player id.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LegacyMatchDay {
    #[serde(default)]
    id: Option<String>,
    date: String,
    #[serde(default)]
    created_at: Option<i64>,
    #[serde(default)]
    stats: BTreeMap<PlayerId, StatLine>,
}

/// Any match record found in storage.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum StoredMatchRecord {
    Entry(MatchEntry),
    LegacyDay(LegacyMatchDay),
}

impl StoredMatchRecord {
    /// Flatten into per-player entries. A legacy day yields one entry per player it mentions,
    /// so it is gone once its last player is removed.
    pub(crate) fn into_entries(self) -> Vec<MatchEntry> {
        match self {
            StoredMatchRecord::Entry(entry) => vec![entry],
            StoredMatchRecord::LegacyDay(day) => {
                let base = day.id.unwrap_or_else(|| day.date.clone());
                let created_at = day.created_at.unwrap_or(0);
                day.stats
                    .into_iter()
                    .map(|(player_id, stats)| MatchEntry {
                        id: format!("{}_{}", base, player_id),
                        date: day.date.clone(),
                        created_at,
                        player_id,
                        stats,
                        updated_at: None,
                    })
                    .collect()
            }
        }
    }
}

/// Accepts numbers, numeric strings and null (stored values came from form inputs).
fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let n = match &value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    };
    Ok(n.min(u32::MAX as u64) as u32)
}
