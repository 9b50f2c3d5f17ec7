//! Load/save of the roster collections and settings.

use crate::models::{CollectionKind, FeatureConfig, Roster, StoredMatchRecord};
use crate::store::{KeyValueStore, StorageError};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Last date picked in the attendance form.
pub const LAST_DATE_KEY: &str = "asistencia_last_date";
/// Feature settings (match minutes, theme, colors).
pub const FEATURE_CONFIG_KEY: &str = "asistencia_config";
/// Cloud sync on/off (`"1"` / `"0"`).
pub const CLOUD_ENABLED_KEY: &str = "asistencia_cloud_enabled";
/// Remote connection config as JSON.
pub const CLOUD_CONFIG_KEY: &str = "asistencia_firebase_config";

impl Roster {
    /// Replace the in-memory collections with what the local store holds.
    ///
    /// A collection that is absent, unreadable, not JSON, or not an array is loaded as empty;
    /// elements that fail to decode are skipped. Nothing here fails the caller.
    pub fn load(&mut self) {
        let storage = self.storage.as_ref();
        self.players = decode_all(CollectionKind::Players, read_array(storage, CollectionKind::Players));
        self.sessions = decode_all(CollectionKind::Sessions, read_array(storage, CollectionKind::Sessions));
        self.match_entries = decode_all::<StoredMatchRecord>(
            CollectionKind::MatchEntries,
            read_array(storage, CollectionKind::MatchEntries),
        )
        .into_iter()
        .flat_map(StoredMatchRecord::into_entries)
        .collect();
        self.convocations = decode_all(
            CollectionKind::Convocations,
            read_array(storage, CollectionKind::Convocations),
        );
        self.rivals = decode_all(CollectionKind::Rivals, read_array(storage, CollectionKind::Rivals));
        self.match_results = decode_all(
            CollectionKind::MatchResults,
            read_array(storage, CollectionKind::MatchResults),
        );
        self.sort_all();
        info!(
            "Loaded roster: {} players, {} sessions, {} match entries, {} convocations, {} rivals, {} results",
            self.players.len(),
            self.sessions.len(),
            self.match_entries.len(),
            self.convocations.len(),
            self.rivals.len(),
            self.match_results.len()
        );
    }

    /// Write all six collections back to the local store.
    pub fn save(&self) -> Result<(), StorageError> {
        let storage = self.storage.as_ref();
        write_json(storage, CollectionKind::Players.storage_key(), &self.players)?;
        write_json(storage, CollectionKind::Sessions.storage_key(), &self.sessions)?;
        write_json(storage, CollectionKind::MatchEntries.storage_key(), &self.match_entries)?;
        write_json(storage, CollectionKind::Convocations.storage_key(), &self.convocations)?;
        write_json(storage, CollectionKind::Rivals.storage_key(), &self.rivals)?;
        write_json(storage, CollectionKind::MatchResults.storage_key(), &self.match_results)?;
        Ok(())
    }

    /// Load feature and cloud settings. Unreadable settings fall back to defaults.
    /// The first run (no cloud flag stored yet) turns cloud sync on.
    pub fn load_settings(&mut self) -> Result<(), StorageError> {
        let storage = self.storage.as_ref();
        self.config = match read_value(storage, FEATURE_CONFIG_KEY) {
            Some(v) => feature_config_from_value(&v),
            None => FeatureConfig::default(),
        };

        match storage.get(CLOUD_ENABLED_KEY) {
            Ok(Some(raw)) => self.cloud.enabled = raw.as_slice() == b"1",
            Ok(None) => {
                self.cloud.enabled = true;
                storage.set(CLOUD_ENABLED_KEY, b"1")?;
            }
            Err(e) => {
                warn!("Could not read cloud flag: {}", e);
                self.cloud.enabled = false;
            }
        }
        self.cloud.connection = read_value(storage, CLOUD_CONFIG_KEY);
        Ok(())
    }

    pub fn save_config(&self) -> Result<(), StorageError> {
        write_json(self.storage.as_ref(), FEATURE_CONFIG_KEY, &self.config)
    }

    pub fn save_cloud_config(&self) -> Result<(), StorageError> {
        let storage = self.storage.as_ref();
        storage.set(CLOUD_ENABLED_KEY, if self.cloud.enabled { b"1" } else { b"0" })?;
        match &self.cloud.connection {
            Some(conn) => write_json(storage, CLOUD_CONFIG_KEY, conn),
            None => storage.remove(CLOUD_CONFIG_KEY),
        }
    }

    pub fn last_selected_date(&self) -> Option<String> {
        match self.storage.get(LAST_DATE_KEY) {
            Ok(Some(raw)) => String::from_utf8(raw).ok().filter(|s| !s.is_empty()),
            _ => None,
        }
    }

    pub fn set_last_selected_date(&self, date: &str) -> Result<(), StorageError> {
        self.storage.set(LAST_DATE_KEY, date.as_bytes())
    }

    /// Remove the collection keys (and the last selected date) from the local store.
    /// Settings are kept.
    pub fn wipe_storage(&self) -> Result<(), StorageError> {
        for kind in CollectionKind::ALL {
            self.storage.remove(kind.storage_key())?;
        }
        self.storage.remove(LAST_DATE_KEY)
    }
}

/// Settings are read field by field so one bad value does not discard the others.
fn feature_config_from_value(v: &Value) -> FeatureConfig {
    let mut cfg = FeatureConfig::default();
    if let Some(m) = v.get("matchMinutes").and_then(Value::as_u64) {
        cfg.match_minutes = m.min(u32::MAX as u64) as u32;
    }
    if let Some(theme) = v.get("theme").and_then(|t| serde_json::from_value(t.clone()).ok()) {
        cfg.theme = theme;
    }
    cfg.bg = v.get("bg").and_then(Value::as_str).map(str::to_string);
    cfg.primary = v.get("primary").and_then(Value::as_str).map(str::to_string);
    cfg
}

fn read_value(storage: &dyn KeyValueStore, key: &str) -> Option<Value> {
    match storage.get(key) {
        Ok(Some(raw)) => match serde_json::from_slice(&raw) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Ignoring unreadable value for {}: {}", key, e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            warn!("Could not read {}: {}", key, e);
            None
        }
    }
}

fn read_array(storage: &dyn KeyValueStore, kind: CollectionKind) -> Vec<Value> {
    match read_value(storage, kind.storage_key()) {
        Some(Value::Array(items)) => items,
        Some(_) => {
            warn!("Stored {} is not an array; starting empty", kind);
            Vec::new()
        }
        None => Vec::new(),
    }
}

fn decode_all<T: DeserializeOwned>(kind: CollectionKind, values: Vec<Value>) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|v| match serde_json::from_value(v) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping unreadable {} record: {}", kind, e);
                None
            }
        })
        .collect()
}

fn write_json<T: Serialize + ?Sized>(
    storage: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec(value).map_err(|e| StorageError(e.to_string()))?;
    storage.set(key, &bytes)
}
