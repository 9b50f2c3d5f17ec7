//! Remote document store interface and an in-process implementation.

use crate::models::CollectionKind;
use crate::sync::feed::ChangeSink;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Errors reported by the remote store.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RemoteError {
    /// The caller may not read or write this collection.
    PermissionDenied(String),
    /// Network or backend failure.
    Unavailable(String),
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::PermissionDenied(msg) => write!(f, "permission denied: {}", msg),
            RemoteError::Unavailable(msg) => write!(f, "remote unavailable: {}", msg),
        }
    }
}

impl std::error::Error for RemoteError {}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// One document change from a collection's snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub kind: ChangeKind,
    pub doc_id: String,
    /// Document body (`Null` for removals).
    pub data: Value,
}

impl Change {
    pub fn added(doc_id: impl Into<String>, data: Value) -> Self {
        Self {
            kind: ChangeKind::Added,
            doc_id: doc_id.into(),
            data,
        }
    }

    pub fn modified(doc_id: impl Into<String>, data: Value) -> Self {
        Self {
            kind: ChangeKind::Modified,
            doc_id: doc_id.into(),
            data,
        }
    }

    pub fn removed(doc_id: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Removed,
            doc_id: doc_id.into(),
            data: Value::Null,
        }
    }
}

/// One write inside a batched commit.
#[derive(Clone, Debug, PartialEq)]
pub enum WriteOp {
    Set { id: String, data: Value },
    Delete { id: String },
}

/// A document database with per-collection change subscriptions.
pub trait DocumentStore: Send + Sync {
    /// Create or replace one document.
    fn set(&self, kind: CollectionKind, id: &str, data: Value) -> Result<(), RemoteError>;
    fn delete(&self, kind: CollectionKind, id: &str) -> Result<(), RemoteError>;
    /// Apply several writes to one collection atomically.
    fn commit(&self, kind: CollectionKind, ops: Vec<WriteOp>) -> Result<(), RemoteError>;
    fn list_ids(&self, kind: CollectionKind) -> Result<Vec<String>, RemoteError>;
    /// Register a listener. It first receives the current contents as `added` changes,
    /// then every later change batch (or an error).
    fn subscribe(&self, kind: CollectionKind, sink: ChangeSink);
}

#[derive(Default)]
struct Inner {
    docs: HashMap<CollectionKind, BTreeMap<String, Value>>,
    sinks: HashMap<CollectionKind, Vec<ChangeSink>>,
    read_denied: bool,
    write_denied: bool,
}

/// Document store kept in process memory. Writes are delivered to subscribers synchronously.
#[derive(Default)]
pub struct MemoryDocumentStore {
    inner: Mutex<Inner>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, RemoteError> {
        self.inner
            .lock()
            .map_err(|_| RemoteError::Unavailable("document store lock poisoned".to_string()))
    }

    /// Reject reads; current listeners get a permission error.
    pub fn deny_reads(&self, denied: bool) {
        let sinks: Vec<ChangeSink> = match self.lock() {
            Ok(mut inner) => {
                inner.read_denied = denied;
                if !denied {
                    return;
                }
                inner.sinks.values().flatten().cloned().collect()
            }
            Err(_) => return,
        };
        for sink in sinks {
            sink.fail(RemoteError::PermissionDenied("reads are not allowed".to_string()));
        }
    }

    /// Reject writes.
    pub fn deny_writes(&self, denied: bool) {
        if let Ok(mut inner) = self.lock() {
            inner.write_denied = denied;
        }
    }

    /// Listeners registered on `kind`. Closed ones are dropped on the next write or subscribe.
    pub fn listener_count(&self, kind: CollectionKind) -> usize {
        self.lock()
            .ok()
            .and_then(|inner| inner.sinks.get(&kind).map(Vec::len))
            .unwrap_or(0)
    }

    /// Current document body, if present.
    pub fn get(&self, kind: CollectionKind, id: &str) -> Option<Value> {
        self.lock()
            .ok()
            .and_then(|inner| inner.docs.get(&kind).and_then(|d| d.get(id).cloned()))
    }

    fn apply(&self, kind: CollectionKind, ops: Vec<WriteOp>) -> Result<(), RemoteError> {
        let (changes, sinks) = {
            let mut inner = self.lock()?;
            if inner.write_denied {
                return Err(RemoteError::PermissionDenied(format!(
                    "writes to {} are not allowed",
                    kind
                )));
            }
            let docs = inner.docs.entry(kind).or_default();
            let mut changes = Vec::new();
            for op in ops {
                match op {
                    WriteOp::Set { id, data } => match docs.insert(id.clone(), data.clone()) {
                        Some(previous) if previous == data => {}
                        Some(_) => changes.push(Change::modified(id, data)),
                        None => changes.push(Change::added(id, data)),
                    },
                    WriteOp::Delete { id } => {
                        if docs.remove(&id).is_some() {
                            changes.push(Change::removed(id));
                        }
                    }
                }
            }
            let sinks = match inner.sinks.get_mut(&kind) {
                Some(sinks) => {
                    sinks.retain(|sink| !sink.is_closed());
                    sinks.clone()
                }
                None => Vec::new(),
            };
            (changes, sinks)
        };
        if changes.is_empty() {
            return Ok(());
        }
        debug!("{} change(s) on {} for {} listener(s)", changes.len(), kind, sinks.len());
        for sink in sinks {
            sink.deliver(changes.clone());
        }
        Ok(())
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn set(&self, kind: CollectionKind, id: &str, data: Value) -> Result<(), RemoteError> {
        self.apply(
            kind,
            vec![WriteOp::Set {
                id: id.to_string(),
                data,
            }],
        )
    }

    fn delete(&self, kind: CollectionKind, id: &str) -> Result<(), RemoteError> {
        self.apply(kind, vec![WriteOp::Delete { id: id.to_string() }])
    }

    fn commit(&self, kind: CollectionKind, ops: Vec<WriteOp>) -> Result<(), RemoteError> {
        self.apply(kind, ops)
    }

    fn list_ids(&self, kind: CollectionKind) -> Result<Vec<String>, RemoteError> {
        let inner = self.lock()?;
        if inner.read_denied {
            return Err(RemoteError::PermissionDenied(format!("reads of {} are not allowed", kind)));
        }
        Ok(inner
            .docs
            .get(&kind)
            .map(|d| d.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn subscribe(&self, kind: CollectionKind, sink: ChangeSink) {
        let initial = match self.lock() {
            Ok(mut inner) => {
                if inner.read_denied {
                    drop(inner);
                    sink.fail(RemoteError::PermissionDenied(format!(
                        "reads of {} are not allowed",
                        kind
                    )));
                    return;
                }
                let sinks = inner.sinks.entry(kind).or_default();
                sinks.retain(|s| !s.is_closed());
                sinks.push(sink.clone());
                inner
                    .docs
                    .get(&kind)
                    .map(|d| {
                        d.iter()
                            .map(|(id, data)| Change::added(id.clone(), data.clone()))
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default()
            }
            Err(e) => {
                sink.fail(e);
                return;
            }
        };
        if !initial.is_empty() {
            sink.deliver(initial);
        }
    }
}
