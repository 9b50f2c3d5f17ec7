//! Change feeds: one channel and one task per collection.
//!
//! The remote store pushes batches into a [`ChangeSink`]; [`run_feed`] consumes them,
//! reconciles them into the shared roster, persists, and republishes a
//! [`CollectionChanged`] event for views that depend on the collection.

use crate::models::{CollectionKind, Roster};
use crate::sync::reconcile::reconcile_batch;
use crate::sync::remote::{Change, DocumentStore, RemoteError};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Roster shared between request handlers and feed tasks.
pub type SharedRoster = Arc<RwLock<Roster>>;

/// What a feed carries.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedEvent {
    Batch(Vec<Change>),
    Error(RemoteError),
}

/// Set while a local bulk upload is in flight; batches delivered meanwhile are dropped.
#[derive(Clone, Debug, Default)]
pub struct BulkWriteGuard(Arc<AtomicBool>);

impl BulkWriteGuard {
    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Activate the guard until the returned scope is dropped.
    pub fn begin(&self) -> BulkWriteScope {
        self.0.store(true, Ordering::SeqCst);
        BulkWriteScope(self.0.clone())
    }
}

/// Clears the bulk-write flag on drop.
pub struct BulkWriteScope(Arc<AtomicBool>);

impl Drop for BulkWriteScope {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Listener end handed to the remote store for one collection.
#[derive(Clone, Debug)]
pub struct ChangeSink {
    kind: CollectionKind,
    tx: mpsc::UnboundedSender<FeedEvent>,
    guard: BulkWriteGuard,
}

impl ChangeSink {
    pub fn new(kind: CollectionKind, tx: mpsc::UnboundedSender<FeedEvent>, guard: BulkWriteGuard) -> Self {
        Self { kind, tx, guard }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn deliver(&self, changes: Vec<Change>) {
        if self.guard.is_active() {
            debug!("Bulk write in flight; dropping {} change(s) on {}", changes.len(), self.kind);
            return;
        }
        if self.tx.send(FeedEvent::Batch(changes)).is_err() {
            debug!("Feed for {} is closed", self.kind);
        }
    }

    /// True once the feed task on the other end has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn fail(&self, err: RemoteError) {
        if self.tx.send(FeedEvent::Error(err)).is_err() {
            debug!("Feed for {} is closed", self.kind);
        }
    }
}

/// Published after a collection changed in memory.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CollectionChanged {
    pub kind: CollectionKind,
    /// True when the whole roster was reloaded from local storage.
    pub reloaded: bool,
}

/// Consume one collection's feed until the sending side goes away.
pub async fn run_feed(
    kind: CollectionKind,
    mut rx: mpsc::UnboundedReceiver<FeedEvent>,
    roster: SharedRoster,
    changed: broadcast::Sender<CollectionChanged>,
) {
    while let Some(event) = rx.recv().await {
        match event {
            FeedEvent::Batch(changes) => {
                let outcome = {
                    let mut g = match roster.write() {
                        Ok(guard) => guard,
                        Err(_) => {
                            error!("Roster lock poisoned; stopping {} feed", kind);
                            return;
                        }
                    };
                    reconcile_batch(&mut g, kind, &changes)
                };
                match outcome {
                    Ok(report) if report.changed() => {
                        debug!("{} reconciled: {:?}", kind, report);
                        let _ = changed.send(CollectionChanged { kind, reloaded: false });
                    }
                    Ok(_) => debug!("{} batch of {} change(s) was a no-op", kind, changes.len()),
                    Err(e) => warn!("Reconciled {} but could not persist: {}", kind, e),
                }
            }
            FeedEvent::Error(RemoteError::PermissionDenied(msg)) => {
                warn!("Permission denied on {} feed ({}); using local data", kind, msg);
                {
                    let mut g = match roster.write() {
                        Ok(guard) => guard,
                        Err(_) => {
                            error!("Roster lock poisoned; stopping {} feed", kind);
                            return;
                        }
                    };
                    g.load();
                }
                let _ = changed.send(CollectionChanged { kind, reloaded: true });
            }
            FeedEvent::Error(e) => warn!("Error on {} feed: {}", kind, e),
        }
    }
    debug!("{} feed ended", kind);
}

/// Subscribes every collection to the remote store and spawns one feed task each.
pub struct SyncHub {
    changed: broadcast::Sender<CollectionChanged>,
    tasks: Vec<JoinHandle<()>>,
}

impl SyncHub {
    /// Must be called from within a tokio runtime.
    pub fn start(remote: &dyn DocumentStore, roster: SharedRoster) -> Self {
        let (changed, _) = broadcast::channel(64);
        let guard = match roster.read() {
            Ok(g) => g.bulk_guard.clone(),
            Err(_) => BulkWriteGuard::default(),
        };
        let mut tasks = Vec::new();
        for kind in CollectionKind::ALL {
            let (tx, rx) = mpsc::unbounded_channel();
            tasks.push(tokio::spawn(run_feed(kind, rx, roster.clone(), changed.clone())));
            remote.subscribe(kind, ChangeSink::new(kind, tx, guard.clone()));
        }
        info!("Cloud sync started for {} collections", tasks.len());
        Self { changed, tasks }
    }

    /// Receive a [`CollectionChanged`] for every reconciled batch from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<CollectionChanged> {
        self.changed.subscribe()
    }

    /// Stop all feed tasks.
    pub fn shutdown(self) {
        for task in self.tasks {
            task.abort();
        }
    }
}
