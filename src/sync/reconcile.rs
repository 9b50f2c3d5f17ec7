//! Merging remote change batches into local collections.

use crate::models::{
    CollectionKind, Convocation, MatchEntry, MatchResult, Player, Record, Rival, Roster, Session,
};
use crate::store::StorageError;
use crate::sync::remote::{Change, ChangeKind};
use log::warn;
use serde_json::Value;

/// Per-collection rule for spotting the same logical record under a different id.
pub trait Reconcile: Record {
    fn same_business_key(&self, _other: &Self) -> bool {
        false
    }
}

impl Reconcile for Player {}

impl Reconcile for Session {
    fn same_business_key(&self, other: &Self) -> bool {
        self.date == other.date
    }
}

impl Reconcile for Convocation {
    fn same_business_key(&self, other: &Self) -> bool {
        self.date == other.date
    }
}

impl Reconcile for Rival {
    fn same_business_key(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Reconcile for MatchResult {
    fn same_business_key(&self, other: &Self) -> bool {
        self.dedupe_key() == other.dedupe_key()
    }
}

impl Reconcile for MatchEntry {
    fn same_business_key(&self, other: &Self) -> bool {
        self.player_id == other.player_id
            && self.date == other.date
            && self.stats.goals == other.stats.goals
            && self.stats.assists == other.stats.assists
            && self.stats.minutes == other.stats.minutes
    }
}

/// Counts from applying one batch.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReconcileReport {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    pub unchanged: usize,
    /// New ids whose business key already exists locally.
    pub duplicates: usize,
    /// Payloads that could not be decoded.
    pub rejected: usize,
}

impl ReconcileReport {
    pub fn changed(&self) -> bool {
        self.added + self.updated + self.removed > 0
    }
}

/// Apply `changes` to one collection in order. Remote fields win over local ones.
pub fn apply_changes<T: Reconcile>(collection: &mut Vec<T>, changes: &[Change]) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    for change in changes {
        match change.kind {
            ChangeKind::Added | ChangeKind::Modified => {
                let incoming = with_id(&change.data, &change.doc_id);
                let id = incoming
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or(change.doc_id.as_str())
                    .to_string();
                match collection.iter().position(|r| r.id() == id) {
                    Some(idx) => {
                        let local = match serde_json::to_value(&collection[idx]) {
                            Ok(v) => v,
                            Err(e) => {
                                warn!("Could not encode local record {}: {}", change.doc_id, e);
                                report.rejected += 1;
                                continue;
                            }
                        };
                        let merged = shallow_merge(&local, &incoming);
                        if merged == local {
                            report.unchanged += 1;
                            continue;
                        }
                        match serde_json::from_value::<T>(merged) {
                            Ok(record) => {
                                collection[idx] = record;
                                report.updated += 1;
                            }
                            Err(e) => {
                                warn!("Ignoring remote update for {}: {}", change.doc_id, e);
                                report.rejected += 1;
                            }
                        }
                    }
                    None => match serde_json::from_value::<T>(incoming) {
                        Ok(record) => {
                            if collection.iter().any(|r| r.same_business_key(&record)) {
                                report.duplicates += 1;
                            } else {
                                collection.push(record);
                                report.added += 1;
                            }
                        }
                        Err(e) => {
                            warn!("Ignoring remote record {}: {}", change.doc_id, e);
                            report.rejected += 1;
                        }
                    },
                }
            }
            ChangeKind::Removed => {
                let before = collection.len();
                collection.retain(|r| r.id() != change.doc_id);
                report.removed += before - collection.len();
            }
        }
    }
    report
}

/// Apply a batch to the roster collection for `kind`, restore its order and persist.
pub fn reconcile_batch(
    roster: &mut Roster,
    kind: CollectionKind,
    changes: &[Change],
) -> Result<ReconcileReport, StorageError> {
    let report = match kind {
        CollectionKind::Players => apply_changes(&mut roster.players, changes),
        CollectionKind::Sessions => apply_changes(&mut roster.sessions, changes),
        CollectionKind::MatchEntries => apply_changes(&mut roster.match_entries, changes),
        CollectionKind::Convocations => apply_changes(&mut roster.convocations, changes),
        CollectionKind::Rivals => apply_changes(&mut roster.rivals, changes),
        CollectionKind::MatchResults => apply_changes(&mut roster.match_results, changes),
    };
    if report.changed() {
        roster.sort_collection(kind);
        roster.save()?;
    }
    Ok(report)
}

/// Document body with its id filled in from the document key when missing.
fn with_id(data: &Value, doc_id: &str) -> Value {
    let mut data = data.clone();
    if let Value::Object(map) = &mut data {
        map.entry("id")
            .or_insert_with(|| Value::String(doc_id.to_string()));
    }
    data
}

fn shallow_merge(local: &Value, remote: &Value) -> Value {
    match (local, remote) {
        (Value::Object(l), Value::Object(r)) => {
            let mut merged = l.clone();
            for (k, v) in r {
                merged.insert(k.clone(), v.clone());
            }
            Value::Object(merged)
        }
        (_, r) => r.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn shallow_merge_overrides_top_level_fields_only() {
        let local = json!({ "id": "s1", "date": "2025-01-01", "attendance": { "p1": "A", "p2": "F" } });
        let remote = json!({ "attendance": { "p1": "T" } });
        let merged = shallow_merge(&local, &remote);
        assert_eq!(merged["date"], "2025-01-01");
        assert_eq!(merged["attendance"], json!({ "p1": "T" }));
    }

    #[test]
    fn id_comes_from_document_key_when_missing() {
        let v = with_id(&json!({ "name": "Ana" }), "player_x");
        assert_eq!(v["id"], "player_x");
        let v = with_id(&json!({ "id": "kept", "name": "Ana" }), "player_x");
        assert_eq!(v["id"], "kept");
    }
}
