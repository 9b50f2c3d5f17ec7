//! Copying local writes to the remote store. Local data always stands; remote failures become warnings.

use crate::models::{CollectionKind, Record, Roster};
use crate::sync::WriteOp;
use log::warn;
use serde::Serialize;

/// Result of a local-first operation.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Saved<T> {
    pub record: T,
    /// Set when the local write succeeded but the cloud copy did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_warning: Option<String>,
}

impl<T> Saved<T> {
    pub(crate) fn new(record: T, remote_warning: Option<String>) -> Self {
        Self {
            record,
            remote_warning,
        }
    }
}

fn remote_failed(kind: CollectionKind, err: impl std::fmt::Display) -> String {
    warn!("Could not mirror {} to the cloud: {}", kind, err);
    format!("Saved locally, but the cloud copy of {} failed: {}", kind, err)
}

pub(crate) fn set_op<T: Record>(record: &T) -> Result<WriteOp, serde_json::Error> {
    Ok(WriteOp::Set {
        id: record.id().to_string(),
        data: serde_json::to_value(record)?,
    })
}

/// Write a batch to one remote collection. No-op when cloud sync is off.
pub(crate) fn mirror_ops(roster: &Roster, kind: CollectionKind, ops: Vec<WriteOp>) -> Option<String> {
    let remote = roster.active_remote()?;
    if ops.is_empty() {
        return None;
    }
    remote.commit(kind, ops).err().map(|e| remote_failed(kind, e))
}

/// Create or replace one record remotely.
pub(crate) fn mirror_set<T: Record>(roster: &Roster, kind: CollectionKind, record: &T) -> Option<String> {
    roster.active_remote()?;
    match set_op(record) {
        Ok(op) => mirror_ops(roster, kind, vec![op]),
        Err(e) => Some(remote_failed(kind, e)),
    }
}

/// Delete one record remotely.
pub(crate) fn mirror_delete(roster: &Roster, kind: CollectionKind, id: &str) -> Option<String> {
    mirror_ops(roster, kind, vec![WriteOp::Delete { id: id.to_string() }])
}

/// Set every record of `records` remotely in one batch.
pub(crate) fn mirror_set_all<'a, T: Record + 'a>(
    roster: &Roster,
    kind: CollectionKind,
    records: impl IntoIterator<Item = &'a T>,
) -> Option<String> {
    roster.active_remote()?;
    let mut ops = Vec::new();
    for record in records {
        match set_op(record) {
            Ok(op) => ops.push(op),
            Err(e) => return Some(remote_failed(kind, e)),
        }
    }
    mirror_ops(roster, kind, ops)
}

/// Join several optional warnings into one.
pub(crate) fn merge_warnings(warnings: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    let all: Vec<String> = warnings.into_iter().flatten().collect();
    (!all.is_empty()).then(|| all.join("; "))
}
