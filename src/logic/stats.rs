//! Attendance and match statistics, recomputed from the collections on every call.

use crate::models::{compare_names, AttendanceStatus, PlayerId, Roster};
use serde::{Deserialize, Serialize};

/// Inclusive date filter on `YYYY-MM-DD` strings. A missing bound is open.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

impl DateRange {
    pub fn all() -> Self {
        Self::default()
    }

    /// Blank bounds are treated as missing.
    pub fn between(from: Option<&str>, to: Option<&str>) -> Self {
        let bound = |b: Option<&str>| b.map(str::trim).filter(|b| !b.is_empty()).map(str::to_string);
        Self {
            from: bound(from),
            to: bound(to),
        }
    }

    pub fn contains(&self, date: &str) -> bool {
        self.from.as_deref().map_or(true, |from| date >= from)
            && self.to.as_deref().map_or(true, |to| date <= to)
    }
}

/// Attendance counts for one player.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRow {
    pub player_id: PlayerId,
    pub name: String,
    /// Sessions in range.
    pub total: usize,
    #[serde(rename = "A")]
    pub present: usize,
    #[serde(rename = "F")]
    pub absent: usize,
    #[serde(rename = "FJ")]
    pub justified: usize,
    #[serde(rename = "T")]
    pub late: usize,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub total_sessions: usize,
    pub rows: Vec<AttendanceRow>,
}

/// Per-player attendance over the sessions in `range`.
///
/// A player without a recorded status in a session counts as present there, so the four
/// buckets of a row always add up to `total`. Rows are ordered by most present, then fewest
/// absences, then name.
pub fn compute_attendance_stats(roster: &Roster, range: &DateRange) -> AttendanceStats {
    let sessions: Vec<_> = roster
        .sessions
        .iter()
        .filter(|s| range.contains(&s.date))
        .collect();

    let mut rows: Vec<AttendanceRow> = roster
        .players
        .iter()
        .map(|player| {
            let mut row = AttendanceRow {
                player_id: player.id.clone(),
                name: player.name.clone(),
                total: sessions.len(),
                ..AttendanceRow::default()
            };
            for session in &sessions {
                match session.status_of(&player.id) {
                    AttendanceStatus::Present => row.present += 1,
                    AttendanceStatus::Absent => row.absent += 1,
                    AttendanceStatus::JustifiedAbsence => row.justified += 1,
                    AttendanceStatus::Late => row.late += 1,
                }
            }
            row
        })
        .collect();

    rows.sort_by(|a, b| {
        b.present
            .cmp(&a.present)
            .then(a.absent.cmp(&b.absent))
            .then_with(|| compare_names(&a.name, &b.name))
    });

    AttendanceStats {
        total_sessions: sessions.len(),
        rows,
    }
}

/// Match totals for one player.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRow {
    pub player_id: PlayerId,
    pub name: String,
    pub goals: u32,
    pub assists: u32,
    pub yellows: u32,
    pub reds: u32,
    pub minutes: u32,
    /// Convocations in range where the player was called up.
    pub convocations: u32,
    /// Minutes played over minutes available, 0..=100.
    pub percent: u32,
}

/// Share of available minutes actually played, capped at 100.
pub fn minutes_percent(minutes: u32, convocations: u32, match_minutes: u32) -> u32 {
    let available = u64::from(convocations) * u64::from(match_minutes);
    if available == 0 {
        return 0;
    }
    let pct = f64::from(minutes) / available as f64 * 100.0;
    pct.min(100.0).round() as u32
}

/// Per-player match totals over entries and convocations in `range`.
///
/// Totals saturate at `u32::MAX`.
/// Ordered by goals, then assists, then minutes (all descending), then name.
pub fn compute_match_stats(roster: &Roster, range: &DateRange, match_minutes: u32) -> Vec<MatchRow> {
    let mut rows: Vec<MatchRow> = roster
        .players
        .iter()
        .map(|player| {
            let mut row = MatchRow {
                player_id: player.id.clone(),
                name: player.name.clone(),
                ..MatchRow::default()
            };
            for entry in roster
                .match_entries
                .iter()
                .filter(|e| e.player_id == player.id && range.contains(&e.date))
            {
                row.goals = row.goals.saturating_add(entry.stats.goals);
                row.assists = row.assists.saturating_add(entry.stats.assists);
                row.yellows = row.yellows.saturating_add(entry.stats.yellows);
                row.reds = row.reds.saturating_add(entry.stats.reds);
                row.minutes = row.minutes.saturating_add(entry.stats.minutes);
            }
            row.convocations = roster
                .convocations
                .iter()
                .filter(|c| range.contains(&c.date) && c.is_called(&player.id))
                .count() as u32;
            row.percent = minutes_percent(row.minutes, row.convocations, match_minutes);
            row
        })
        .collect();

    rows.sort_by(|a, b| {
        b.goals
            .cmp(&a.goals)
            .then(b.assists.cmp(&a.assists))
            .then(b.minutes.cmp(&a.minutes))
            .then_with(|| compare_names(&a.name, &b.name))
    });
    rows
}

/// One session where the player was not simply present.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AttendanceMark {
    pub date: String,
    pub status: AttendanceStatus,
}

/// Absences, justified absences and late arrivals of a player in `range`, oldest first.
pub fn player_attendance_detail(roster: &Roster, player_id: &str, range: &DateRange) -> Vec<AttendanceMark> {
    let mut marks: Vec<AttendanceMark> = roster
        .sessions
        .iter()
        .filter(|s| range.contains(&s.date))
        .filter_map(|s| match s.status_of(player_id) {
            AttendanceStatus::Present => None,
            status => Some(AttendanceMark {
                date: s.date.clone(),
                status,
            }),
        })
        .collect();
    marks.sort_by(|a, b| a.date.cmp(&b.date));
    marks
}

/// Derived ratios for the player detail view.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDetail {
    pub player_id: PlayerId,
    pub name: String,
    pub minutes_per_goal: Option<f64>,
    pub minutes_per_assist: Option<f64>,
    pub minutes_per_goal_assist: Option<f64>,
    pub minutes_per_card: Option<f64>,
    /// Goals plus assists per `match_minutes` played.
    pub offensive_efficiency: f64,
    pub convocation_percentage: u32,
    pub matches_played: u32,
    pub avg_minutes_per_match: u32,
    pub total_minutes: u32,
    pub total_goals: u32,
    pub total_assists: u32,
    pub total_goals_assists: u32,
    pub total_yellows: u32,
    pub total_reds: u32,
}

fn per(minutes: u32, count: u32) -> Option<f64> {
    (count > 0).then(|| round_to(f64::from(minutes) / f64::from(count), 1))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Ratios for one match row. `total_convocations` is the number of convocations on record.
pub fn detailed_player_stats(row: &MatchRow, total_convocations: usize, match_minutes: u32) -> PlayerDetail {
    let goal_actions = row.goals.saturating_add(row.assists);
    let offensive_efficiency = if row.minutes > 0 {
        round_to(
            f64::from(goal_actions) / f64::from(row.minutes) * f64::from(match_minutes),
            2,
        )
    } else {
        0.0
    };
    let convocation_percentage = if total_convocations > 0 {
        (f64::from(row.convocations) / total_convocations as f64 * 100.0).round() as u32
    } else {
        0
    };
    let avg_minutes_per_match = if row.convocations > 0 {
        (f64::from(row.minutes) / f64::from(row.convocations)).round() as u32
    } else {
        0
    };

    PlayerDetail {
        player_id: row.player_id.clone(),
        name: row.name.clone(),
        minutes_per_goal: per(row.minutes, row.goals),
        minutes_per_assist: per(row.minutes, row.assists),
        minutes_per_goal_assist: per(row.minutes, goal_actions),
        minutes_per_card: per(row.minutes, row.yellows.saturating_add(row.reds)),
        offensive_efficiency,
        convocation_percentage,
        matches_played: row.convocations,
        avg_minutes_per_match,
        total_minutes: row.minutes,
        total_goals: row.goals,
        total_assists: row.assists,
        total_goals_assists: goal_actions,
        total_yellows: row.yellows,
        total_reds: row.reds,
    }
}

/// Detail view for `player_id` over `range`, if the player exists.
pub fn player_detail(roster: &Roster, player_id: &str, range: &DateRange) -> Option<PlayerDetail> {
    let match_minutes = roster.config.match_minutes;
    let rows = compute_match_stats(roster, range, match_minutes);
    let row = rows.iter().find(|r| r.player_id == player_id)?;
    Some(detailed_player_stats(row, roster.convocations.len(), match_minutes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_bounds_are_inclusive_and_optional() {
        let r = DateRange::between(Some("2025-01-01"), Some(" "));
        assert!(r.contains("2025-01-01"));
        assert!(r.contains("2030-12-31"));
        assert!(!r.contains("2024-12-31"));
        assert!(DateRange::all().contains("1999-01-01"));
    }

    #[test]
    fn percent_is_capped_and_zero_without_convocations() {
        assert_eq!(minutes_percent(90, 0, 80), 0);
        assert_eq!(minutes_percent(200, 2, 80), 100);
        assert_eq!(minutes_percent(40, 1, 80), 50);
        assert_eq!(minutes_percent(10, 1, 0), 0);
    }

    #[test]
    fn detail_ratios() {
        let row = MatchRow {
            player_id: "p1".into(),
            name: "Ana".into(),
            goals: 3,
            assists: 1,
            yellows: 0,
            reds: 0,
            minutes: 160,
            convocations: 2,
            percent: 100,
        };
        let d = detailed_player_stats(&row, 4, 80);
        assert_eq!(d.minutes_per_goal, Some(53.3));
        assert_eq!(d.minutes_per_goal_assist, Some(40.0));
        assert_eq!(d.minutes_per_card, None);
        assert_eq!(d.offensive_efficiency, 2.0);
        assert_eq!(d.convocation_percentage, 50);
        assert_eq!(d.avg_minutes_per_match, 80);
    }

    #[test]
    fn detail_sums_saturate() {
        let row = MatchRow {
            player_id: "p1".into(),
            name: "Ana".into(),
            goals: u32::MAX,
            assists: 1,
            yellows: u32::MAX,
            reds: 2,
            minutes: 90,
            convocations: 1,
            percent: 100,
        };
        let d = detailed_player_stats(&row, 1, 80);
        assert_eq!(d.total_goals_assists, u32::MAX);
        assert!(d.minutes_per_card.is_some());
    }
}
