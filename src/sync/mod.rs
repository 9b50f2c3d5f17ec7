//! Cloud sync: remote document store, change feeds and reconciliation.

mod feed;
mod reconcile;
mod remote;

pub use feed::{
    run_feed, BulkWriteGuard, BulkWriteScope, ChangeSink, CollectionChanged, FeedEvent, SharedRoster,
    SyncHub,
};
pub use reconcile::{apply_changes, reconcile_batch, Reconcile, ReconcileReport};
pub use remote::{Change, ChangeKind, DocumentStore, MemoryDocumentStore, RemoteError, WriteOp};
