//! Squad roster web app: library with models, persistence, cloud sync and business logic.

pub mod auth;
pub mod logic;
pub mod models;
pub mod store;
pub mod sync;

pub use auth::{IdentityProvider, StaticCredentials};
pub use logic::{
    add_player, add_rival, attendance_csv, clean_duplicates, compute_attendance_stats, compute_match_stats,
    delete_convocation, delete_match_entry, delete_match_result, delete_player, delete_rival, delete_session,
    match_csv, player_attendance_detail, player_detail, rename_player, reset_all, save_convocation,
    save_match_entry, save_match_results, save_session, sync_to_cloud, update_cloud_config, update_config,
    DateRange, JourneyBlock, Saved,
};
pub use models::{
    Attendance, AttendanceStatus, CallUp, CollectionKind, Convocation, FeatureConfig, Journey, Location,
    MatchEntry, MatchResult, Player, PlayerId, Rival, Roster, RosterError, Session, StatLine,
};
pub use store::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use sync::{DocumentStore, MemoryDocumentStore, RemoteError, SharedRoster, SyncHub};
