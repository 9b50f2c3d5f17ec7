//! Roster: the six in-memory collections plus settings, storage and remote handles.

use crate::models::config::{CloudConfig, FeatureConfig};
use crate::models::convocation::Convocation;
use crate::models::match_entry::MatchEntry;
use crate::models::player::{compare_names, Player};
use crate::models::rival::{MatchResult, Rival};
use crate::models::session::Session;
use crate::models::{CollectionKind, Record};
use crate::store::KeyValueStore;
use crate::sync::{BulkWriteGuard, DocumentStore};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Application state: all collections, settings, and the stores they are mirrored to.
pub struct Roster {
    pub players: Vec<Player>,
    pub sessions: Vec<Session>,
    pub match_entries: Vec<MatchEntry>,
    pub convocations: Vec<Convocation>,
    pub rivals: Vec<Rival>,
    pub match_results: Vec<MatchResult>,
    pub config: FeatureConfig,
    pub cloud: CloudConfig,
    pub(crate) storage: Arc<dyn KeyValueStore>,
    pub(crate) remote: Option<Arc<dyn DocumentStore>>,
    pub(crate) bulk_guard: BulkWriteGuard,
}

/// Serializable view of the collections (for API responses).
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterView<'a> {
    pub players: &'a [Player],
    pub sessions: &'a [Session],
    pub match_entries: &'a [MatchEntry],
    pub convocations: &'a [Convocation],
    pub rivals: &'a [Rival],
    pub match_results: &'a [MatchResult],
}

/// What a player deletion touched.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CascadeReport {
    pub player: Option<Player>,
    /// Sessions whose attendance lost the player.
    pub sessions_touched: Vec<Session>,
    /// Convocations that lost the player.
    pub convocations_touched: Vec<Convocation>,
    /// Ids of the removed match entries.
    pub entries_removed: Vec<String>,
}

impl Roster {
    /// Empty roster backed by `storage`, with no remote store attached.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            players: Vec::new(),
            sessions: Vec::new(),
            match_entries: Vec::new(),
            convocations: Vec::new(),
            rivals: Vec::new(),
            match_results: Vec::new(),
            config: FeatureConfig::default(),
            cloud: CloudConfig::default(),
            storage,
            remote: None,
            bulk_guard: BulkWriteGuard::default(),
        }
    }

    /// Attach the remote document store used for mirroring.
    pub fn with_remote(mut self, remote: Arc<dyn DocumentStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.storage
    }

    /// The remote store, if one is attached and cloud sync is enabled.
    pub fn active_remote(&self) -> Option<&Arc<dyn DocumentStore>> {
        self.remote.as_ref().filter(|_| self.cloud.enabled)
    }

    pub fn bulk_guard(&self) -> &BulkWriteGuard {
        &self.bulk_guard
    }

    pub fn view(&self) -> RosterView<'_> {
        RosterView {
            players: &self.players,
            sessions: &self.sessions,
            match_entries: &self.match_entries,
            convocations: &self.convocations,
            rivals: &self.rivals,
            match_results: &self.match_results,
        }
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Display name for a player id (deleted players still show up in old data).
    pub fn player_name(&self, id: &str) -> String {
        self.player(id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "Unknown player".to_string())
    }

    pub fn session_by_date(&self, date: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.date == date)
    }

    pub fn convocation_by_date(&self, date: &str) -> Option<&Convocation> {
        self.convocations.iter().find(|c| c.date == date)
    }

    pub fn match_entry_for(&self, player_id: &str, date: &str) -> Option<&MatchEntry> {
        self.match_entries
            .iter()
            .find(|e| e.player_id == player_id && e.date == date)
    }

    pub fn rival(&self, id: &str) -> Option<&Rival> {
        self.rivals.iter().find(|r| r.id == id)
    }

    pub fn results_for_rival(&self, rival_id: &str) -> Vec<&MatchResult> {
        self.match_results
            .iter()
            .filter(|r| r.rival_id == rival_id)
            .collect()
    }

    /// Restore the canonical order of one collection.
    pub fn sort_collection(&mut self, kind: CollectionKind) {
        match kind {
            CollectionKind::Players => self.players.sort_by(|a, b| compare_names(&a.name, &b.name)),
            CollectionKind::Sessions => self.sessions.sort_by(|a, b| a.date.cmp(&b.date)),
            CollectionKind::MatchEntries => self.match_entries.sort_by_key(|e| e.created_at),
            CollectionKind::Convocations => self.convocations.sort_by(|a, b| a.date.cmp(&b.date)),
            CollectionKind::Rivals => self.rivals.sort_by(|a, b| compare_names(&a.name, &b.name)),
            // Results keep the order they were entered in.
            CollectionKind::MatchResults => {}
        }
    }

    pub fn sort_all(&mut self) {
        for kind in CollectionKind::ALL {
            self.sort_collection(kind);
        }
    }

    /// Remove a player and every reference to it. Does not persist.
    pub fn remove_player_cascade(&mut self, player_id: &str) -> CascadeReport {
        let mut report = CascadeReport::default();
        if let Some(idx) = self.players.iter().position(|p| p.id == player_id) {
            report.player = Some(self.players.remove(idx));
        }
        for session in &mut self.sessions {
            if session.attendance.remove(player_id).is_some() {
                report.sessions_touched.push(session.clone());
            }
        }
        for convocation in &mut self.convocations {
            if convocation.players.remove(player_id).is_some() {
                report.convocations_touched.push(convocation.clone());
            }
        }
        let removed = &mut report.entries_removed;
        self.match_entries.retain(|e| {
            if e.player_id == player_id {
                removed.push(e.id.clone());
                false
            } else {
                true
            }
        });
        report
    }

    /// Drop records that share a business key with an earlier one. Returns how many were dropped.
    pub fn clean_duplicates(&mut self) -> usize {
        let before = self.len_total();
        dedup_by_key(&mut self.match_entries, |e| {
            format!(
                "{}-{}-{}-{}-{}",
                e.player_id, e.date, e.stats.goals, e.stats.assists, e.stats.minutes
            )
        });
        dedup_by_key(&mut self.sessions, |s| s.date.clone());
        dedup_by_key(&mut self.rivals, |r| r.name.clone());
        dedup_by_key(&mut self.match_results, MatchResult::dedupe_key);
        before - self.len_total()
    }

    /// Empty every collection in memory.
    pub fn clear(&mut self) {
        self.players.clear();
        self.sessions.clear();
        self.match_entries.clear();
        self.convocations.clear();
        self.rivals.clear();
        self.match_results.clear();
    }

    fn len_total(&self) -> usize {
        self.players.len()
            + self.sessions.len()
            + self.match_entries.len()
            + self.convocations.len()
            + self.rivals.len()
            + self.match_results.len()
    }
}

fn dedup_by_key<T, F>(items: &mut Vec<T>, key: F)
where
    F: Fn(&T) -> String,
{
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(key(item)));
}

/// Insert `record`, or replace the record with the same key (keeping its id and `createdAt`).
/// The collection is re-sorted by key. Returns the stored record.
pub fn upsert_by_key<T, K>(collection: &mut Vec<T>, mut record: T, key_fn: K) -> T
where
    T: Record,
    K: Fn(&T) -> &str,
{
    match collection.iter().position(|r| key_fn(r) == key_fn(&record)) {
        Some(idx) => {
            record.inherit_identity(&collection[idx]);
            collection[idx] = record.clone();
        }
        None => collection.push(record.clone()),
    }
    collection.sort_by(|a, b| key_fn(a).cmp(key_fn(b)));
    record
}
