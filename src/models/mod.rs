//! Data structures for the roster: players, sessions, match entries, convocations, rivals, results.

mod config;
mod convocation;
mod error;
mod ids;
mod match_entry;
mod player;
mod rival;
mod roster;
mod session;

pub use config::{CloudConfig, FeatureConfig, Palette, Theme, DEFAULT_MATCH_MINUTES};
pub use convocation::{CallUp, Convocation, MAX_CALLED_UP, MIN_CALLED_UP};
pub use error::RosterError;
pub use ids::{generate_id, now_millis};
pub use match_entry::{MatchEntry, StatLine};
pub(crate) use match_entry::StoredMatchRecord;
pub use player::{compare_names, Player, PlayerId};
pub use rival::{Journey, Location, MatchResult, Rival};
pub use roster::{upsert_by_key, CascadeReport, Roster, RosterView};
pub use session::{Attendance, AttendanceStatus, Session};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A stored entity with a stable id.
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Id prefix for newly created records.
    const PREFIX: &'static str;

    fn id(&self) -> &str;

    /// Keep id and creation time of the record this one replaces.
    fn inherit_identity(&mut self, previous: &Self);
}

/// The six persisted collections.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Players,
    Sessions,
    MatchEntries,
    Convocations,
    Rivals,
    MatchResults,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 6] = [
        CollectionKind::Players,
        CollectionKind::Sessions,
        CollectionKind::MatchEntries,
        CollectionKind::Convocations,
        CollectionKind::Rivals,
        CollectionKind::MatchResults,
    ];

    /// Key in the local key-value store.
    pub fn storage_key(self) -> &'static str {
        match self {
            CollectionKind::Players => "asistencia_players",
            CollectionKind::Sessions => "asistencia_sessions",
            CollectionKind::MatchEntries => "asistencia_matches",
            CollectionKind::Convocations => "asistencia_convocations",
            CollectionKind::Rivals => "asistencia_rivals",
            CollectionKind::MatchResults => "asistencia_matchResults",
        }
    }

    /// Collection name in the remote document store.
    pub fn remote_name(self) -> &'static str {
        match self {
            CollectionKind::Players => "players",
            CollectionKind::Sessions => "sessions",
            CollectionKind::MatchEntries => "matchEntries",
            CollectionKind::Convocations => "convocations",
            CollectionKind::Rivals => "rivals",
            CollectionKind::MatchResults => "matchResults",
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.remote_name())
    }
}
