//! Rival teams and the results calendar.

use crate::models::ids::{generate_id, now_millis};
use crate::models::Record;
use serde::{Deserialize, Serialize};

/// A rival team. Treated as unique by name when reconciling remote data.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rival {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub field: String,
    /// Shield image as a data URL.
    #[serde(default)]
    pub shield: Option<String>,
    #[serde(default)]
    pub created_at: i64,
}

impl Rival {
    pub fn new(name: impl Into<String>, field: impl Into<String>, shield: Option<String>) -> Self {
        Self {
            id: generate_id(Self::PREFIX),
            name: name.into(),
            field: field.into(),
            shield,
            created_at: now_millis(),
        }
    }
}

impl Record for Rival {
    const PREFIX: &'static str = "rival";

    fn id(&self) -> &str {
        &self.id
    }

    fn inherit_identity(&mut self, previous: &Self) {
        self.id = previous.id.clone();
        self.created_at = previous.created_at;
    }
}

/// League round number, or `A` for a friendly.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Journey(pub String);

impl Journey {
    pub const FRIENDLY: &'static str = "A";

    pub fn friendly() -> Self {
        Journey(Self::FRIENDLY.to_string())
    }

    /// Friendlies may repeat; league rounds are unique across all rivals.
    pub fn is_friendly(&self) -> bool {
        self.0 == Self::FRIENDLY
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Journey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the match was played.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Location {
    #[serde(rename = "local")]
    Home,
    #[serde(rename = "visitante")]
    Away,
}

/// One calendar entry against a rival.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub id: String,
    pub rival_id: String,
    pub journey: Journey,
    pub location: Location,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub created_at: i64,
}

impl MatchResult {
    /// Same fixture: same rival, journey and location.
    pub fn is_same_fixture(&self, rival_id: &str, journey: &Journey, location: Location) -> bool {
        self.rival_id == rival_id && &self.journey == journey && self.location == location
    }

    /// Key shared by copies of the same result. Friendlies repeat, so their date is part of it.
    pub fn dedupe_key(&self) -> String {
        if self.journey.is_friendly() {
            format!("{}-{}-{}", self.rival_id, self.journey, self.date.as_deref().unwrap_or(""))
        } else {
            format!("{}-{}", self.rival_id, self.journey)
        }
    }
}

impl Record for MatchResult {
    const PREFIX: &'static str = "result";

    fn id(&self) -> &str {
        &self.id
    }

    fn inherit_identity(&mut self, previous: &Self) {
        self.id = previous.id.clone();
        self.created_at = previous.created_at;
    }
}
