//! Settings, bulk upload, duplicate cleanup and the full reset.

use crate::logic::mirror::set_op;
use crate::models::{CollectionKind, FeatureConfig, Record, Roster, RosterError, Theme};
use crate::store::StorageError;
use crate::sync::WriteOp;
use log::{info, warn};
use serde::Serialize;

/// Phrase that must be typed to confirm a full reset.
pub const RESET_PHRASE: &str = "BORRAR";

/// Collections pushed by [`sync_to_cloud`].
const BULK_COLLECTIONS: [CollectionKind; 3] = [
    CollectionKind::Players,
    CollectionKind::Sessions,
    CollectionKind::MatchEntries,
];

fn set_ops<T: Record>(records: &[T]) -> Result<Vec<WriteOp>, RosterError> {
    records
        .iter()
        .map(|r| set_op(r).map_err(|e| RosterError::Storage(StorageError(e.to_string()))))
        .collect()
}

/// Upload players, sessions and match entries to the remote store, one batch per collection.
///
/// Change batches arriving while the upload runs are dropped. Returns the number of documents
/// written; 0 when cloud sync is off.
pub fn sync_to_cloud(roster: &Roster) -> Result<usize, RosterError> {
    let remote = match roster.active_remote() {
        Some(remote) => remote,
        None => {
            info!("Cloud sync is disabled; nothing uploaded");
            return Ok(0);
        }
    };
    let _scope = roster.bulk_guard().begin();
    let mut written = 0;
    for kind in BULK_COLLECTIONS {
        let ops = match kind {
            CollectionKind::Players => set_ops(&roster.players)?,
            CollectionKind::Sessions => set_ops(&roster.sessions)?,
            _ => set_ops(&roster.match_entries)?,
        };
        written += ops.len();
        remote.commit(kind, ops)?;
    }
    info!("Uploaded {} document(s) to the cloud", written);
    Ok(written)
}

/// What a full reset removed remotely.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetReport {
    pub remote_deleted: usize,
    /// Remote collections that could not be cleared.
    pub remote_failures: Vec<String>,
}

/// Delete everything: remote collections first, then local storage, then memory.
///
/// Needs both the first confirmation and the typed [`RESET_PHRASE`]. A remote collection that
/// fails to clear is reported and the reset carries on.
pub fn reset_all(roster: &mut Roster, confirmed: bool, typed_phrase: &str) -> Result<ResetReport, RosterError> {
    if !confirmed || typed_phrase.trim() != RESET_PHRASE {
        return Err(RosterError::ResetNotConfirmed);
    }

    let mut report = ResetReport::default();
    if let Some(remote) = roster.active_remote() {
        for kind in CollectionKind::ALL {
            let cleared = remote.list_ids(kind).and_then(|ids| {
                let count = ids.len();
                let ops = ids.into_iter().map(|id| WriteOp::Delete { id }).collect();
                remote.commit(kind, ops).map(|_| count)
            });
            match cleared {
                Ok(count) => report.remote_deleted += count,
                Err(e) => {
                    warn!("Could not clear remote {}: {}", kind, e);
                    report.remote_failures.push(format!("{}: {}", kind, e));
                }
            }
        }
    }

    roster.wipe_storage()?;
    roster.clear();
    roster.load();
    info!(
        "Reset complete: {} remote document(s) deleted, {} failure(s)",
        report.remote_deleted,
        report.remote_failures.len()
    );
    Ok(report)
}

/// Drop duplicate records and persist. Returns how many were dropped.
pub fn clean_duplicates(roster: &mut Roster) -> Result<usize, RosterError> {
    let dropped = roster.clean_duplicates();
    roster.save()?;
    info!("Duplicate cleanup removed {} record(s)", dropped);
    Ok(dropped)
}

fn is_hex_color(value: &str) -> bool {
    let digits = match value.strip_prefix('#') {
        Some(d) => d,
        None => return false,
    };
    matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Replace the feature settings after checking them.
pub fn update_config(roster: &mut Roster, config: FeatureConfig) -> Result<FeatureConfig, RosterError> {
    if config.match_minutes == 0 {
        return Err(RosterError::InvalidConfig("match minutes must be positive".to_string()));
    }
    if config.theme == Theme::Custom {
        for color in [&config.bg, &config.primary].into_iter().flatten() {
            if !is_hex_color(color) {
                return Err(RosterError::InvalidConfig(format!("'{}' is not a hex color", color)));
            }
        }
    }
    roster.config = config;
    roster.save_config()?;
    info!(
        "Settings updated: {} minute matches, {:?} theme",
        roster.config.match_minutes, roster.config.theme
    );
    Ok(roster.config.clone())
}

/// Turn mirroring on or off and store the remote connection settings (a JSON object).
pub fn update_cloud_config(
    roster: &mut Roster,
    enabled: bool,
    connection: Option<&str>,
) -> Result<(), RosterError> {
    let connection = match connection.map(str::trim).filter(|c| !c.is_empty()) {
        Some(raw) => {
            let value: serde_json::Value = serde_json::from_str(raw)
                .map_err(|e| RosterError::InvalidConfig(format!("connection is not valid JSON: {}", e)))?;
            if !value.is_object() {
                return Err(RosterError::InvalidConfig(
                    "connection must be a JSON object".to_string(),
                ));
            }
            Some(value)
        }
        None => roster.cloud.connection.clone(),
    };
    roster.cloud.enabled = enabled;
    roster.cloud.connection = connection;
    roster.save_cloud_config()?;
    info!("Cloud sync {}", if enabled { "enabled" } else { "disabled" });
    Ok(())
}
