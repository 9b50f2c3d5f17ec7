//! Training sessions and attendance.

use crate::models::player::PlayerId;
use crate::models::Record;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Attendance status of one player at one session.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    #[default]
    #[serde(rename = "A")]
    Present,
    #[serde(rename = "F")]
    Absent,
    #[serde(rename = "FJ")]
    JustifiedAbsence,
    #[serde(rename = "T")]
    Late,
}

impl AttendanceStatus {
    pub fn code(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "A",
            AttendanceStatus::Absent => "F",
            AttendanceStatus::JustifiedAbsence => "FJ",
            AttendanceStatus::Late => "T",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "A" => Some(AttendanceStatus::Present),
            "F" => Some(AttendanceStatus::Absent),
            "FJ" => Some(AttendanceStatus::JustifiedAbsence),
            "T" => Some(AttendanceStatus::Late),
            _ => None,
        }
    }
}

/// Player id -> status for one session.
pub type Attendance = BTreeMap<PlayerId, AttendanceStatus>;

/// One training event. Sessions are unique by `date`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(default, deserialize_with = "deserialize_attendance")]
    pub attendance: Attendance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl Session {
    /// Status of a player; players without a recorded status count as present.
    pub fn status_of(&self, player_id: &str) -> AttendanceStatus {
        self.attendance.get(player_id).copied().unwrap_or_default()
    }
}

impl Record for Session {
    const PREFIX: &'static str = "session";

    fn id(&self) -> &str {
        &self.id
    }

    fn inherit_identity(&mut self, previous: &Self) {
        self.id = previous.id.clone();
        self.created_at = previous.created_at;
    }
}

/// Shapes attendance has been stored in over time.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredAttendance {
    Map(BTreeMap<String, serde_json::Value>),
    /// Older records: ids of the players who attended.
    PresentList(Vec<String>),
    Other(serde_json::Value),
}

impl From<StoredAttendance> for Attendance {
    fn from(stored: StoredAttendance) -> Self {
        match stored {
            StoredAttendance::Map(map) => map
                .into_iter()
                .filter_map(|(pid, status)| {
                    status
                        .as_str()
                        .and_then(AttendanceStatus::from_code)
                        .map(|s| (pid, s))
                })
                .collect(),
            StoredAttendance::PresentList(ids) => ids
                .into_iter()
                .map(|pid| (pid, AttendanceStatus::Present))
                .collect(),
            StoredAttendance::Other(_) => Attendance::new(),
        }
    }
}

fn deserialize_attendance<'de, D>(deserializer: D) -> Result<Attendance, D::Error>
where
    D: Deserializer<'de>,
{
    StoredAttendance::deserialize(deserializer).map(Attendance::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_list_becomes_present_map() {
        let s: Session = serde_json::from_value(json!({
            "id": "session_1", "date": "2025-09-10", "attendance": ["p1", "p2"]
        }))
        .unwrap();
        assert_eq!(s.attendance.len(), 2);
        assert_eq!(s.status_of("p1"), AttendanceStatus::Present);
    }

    #[test]
    fn missing_or_odd_attendance_is_empty() {
        let s: Session =
            serde_json::from_value(json!({ "id": "s", "date": "2025-09-10" })).unwrap();
        assert!(s.attendance.is_empty());
        let s: Session = serde_json::from_value(json!({
            "id": "s", "date": "2025-09-10", "attendance": null
        }))
        .unwrap();
        assert!(s.attendance.is_empty());
    }

    #[test]
    fn map_keeps_known_codes_only() {
        let s: Session = serde_json::from_value(json!({
            "id": "s", "date": "2025-09-10",
            "attendance": { "p1": "FJ", "p2": "T", "p3": "?" }
        }))
        .unwrap();
        assert_eq!(s.status_of("p1"), AttendanceStatus::JustifiedAbsence);
        assert_eq!(s.status_of("p2"), AttendanceStatus::Late);
        assert!(!s.attendance.contains_key("p3"));
    }
}
