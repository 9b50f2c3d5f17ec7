//! Checks run before anything is written: dates, convocation size, journeys, match-entry admission.

use crate::models::{
    generate_id, now_millis, Convocation, Journey, Location, MatchResult, Record, Roster, RosterError,
    MAX_CALLED_UP, MIN_CALLED_UP,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashSet;

/// Date format used for every record date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Reject empty dates and anything that is not a real `YYYY-MM-DD` calendar date.
pub fn validate_date(date: &str) -> Result<(), RosterError> {
    if date.trim().is_empty() {
        return Err(RosterError::MissingField("date"));
    }
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map(|_| ())
        .map_err(|_| RosterError::InvalidDate(date.to_string()))
}

/// A convocation must call up between 11 and 18 players.
pub fn validate_convocation(convocation: &Convocation) -> Result<(), RosterError> {
    let called = convocation.called_count();
    if !(MIN_CALLED_UP..=MAX_CALLED_UP).contains(&called) {
        return Err(RosterError::ConvocationSize { called });
    }
    Ok(())
}

/// A match entry may only be recorded for a player called up on that date.
pub fn check_convocated(roster: &Roster, player_id: &str, date: &str) -> Result<(), RosterError> {
    let convocation = roster
        .convocation_by_date(date)
        .ok_or_else(|| RosterError::NoConvocation(date.to_string()))?;
    if !convocation.is_called(player_id) {
        return Err(RosterError::NotConvocated {
            player_id: player_id.to_string(),
            date: date.to_string(),
        });
    }
    Ok(())
}

/// One match block of the results form for a rival.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyBlock {
    /// League round number, or `A` for a friendly. Blank blocks are skipped.
    #[serde(default)]
    pub journey: String,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Turn the submitted blocks for `rival_id` into match results.
///
/// 1. Skip blocks without a journey or a location.
/// 2. Friendlies always pass.
/// 3. A league journey may appear once per submission, and must not be used by any stored
///    result other than this rival's same journey at the same location.
/// 4. Fail if no block survived.
pub fn validate_journeys(
    roster: &Roster,
    rival_id: &str,
    blocks: &[JourneyBlock],
) -> Result<Vec<MatchResult>, RosterError> {
    let mut seen = HashSet::new();
    let mut results = Vec::new();
    let created_at = now_millis();

    for block in blocks {
        let journey = block.journey.trim();
        let location = match block.location {
            Some(location) if !journey.is_empty() => location,
            _ => continue,
        };
        let journey = if journey.eq_ignore_ascii_case(Journey::FRIENDLY) {
            Journey::friendly()
        } else {
            Journey(journey.to_string())
        };

        if !journey.is_friendly() {
            if !seen.insert(journey.clone()) {
                return Err(RosterError::JourneyRepeated(journey.0));
            }
            let clash = roster
                .match_results
                .iter()
                .find(|r| r.journey == journey && !r.is_same_fixture(rival_id, &journey, location));
            if let Some(existing) = clash {
                let rival = roster
                    .rival(&existing.rival_id)
                    .map(|r| r.name.clone())
                    .unwrap_or_else(|| "another team".to_string());
                return Err(RosterError::DuplicateJourney {
                    journey: journey.0,
                    rival,
                });
            }
        }

        if let Some(date) = non_blank(&block.date) {
            validate_date(&date)?;
        }

        results.push(MatchResult {
            id: generate_id(MatchResult::PREFIX),
            rival_id: rival_id.to_string(),
            journey,
            location,
            date: non_blank(&block.date),
            result: non_blank(&block.result),
            comments: non_blank(&block.comments),
            created_at,
        });
    }

    if results.is_empty() {
        return Err(RosterError::NoValidJourney);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_must_be_real_calendar_days() {
        assert!(validate_date("2025-02-28").is_ok());
        assert_eq!(validate_date(""), Err(RosterError::MissingField("date")));
        assert!(matches!(validate_date("2025-02-30"), Err(RosterError::InvalidDate(_))));
        assert!(matches!(validate_date("10/09/2025"), Err(RosterError::InvalidDate(_))));
    }

    #[test]
    fn blank_fields_are_dropped() {
        assert_eq!(non_blank(&Some("  ".into())), None);
        assert_eq!(non_blank(&Some(" 2-1 ".into())), Some("2-1".into()));
        assert_eq!(non_blank(&None), None);
    }
}
