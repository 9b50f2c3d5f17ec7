//! Convocations and per-player match entries.

use crate::logic::mirror::{mirror_delete, mirror_set, Saved};
use crate::logic::validation::{check_convocated, validate_convocation, validate_date};
use crate::models::{
    now_millis, upsert_by_key, CallUp, CollectionKind, Convocation, MatchEntry, PlayerId, Roster, RosterError,
    StatLine,
};
use log::info;
use std::collections::BTreeMap;

/// Store the squad called up for `date`.
///
/// The headcount is checked before anything is written. An existing convocation for the date is
/// replaced only with `overwrite`, keeping its id.
pub fn save_convocation(
    roster: &mut Roster,
    date: &str,
    players: BTreeMap<PlayerId, CallUp>,
    overwrite: bool,
) -> Result<Saved<Convocation>, RosterError> {
    validate_date(date)?;
    if !overwrite && roster.convocation_by_date(date).is_some() {
        return Err(RosterError::ConvocationExists(date.to_string()));
    }
    let convocation = Convocation::new(date, players);
    validate_convocation(&convocation)?;

    let convocation = upsert_by_key(&mut roster.convocations, convocation, |c| c.date.as_str());
    roster.save()?;
    info!(
        "Saved convocation for {} ({} called up)",
        convocation.date,
        convocation.called_count()
    );

    let warning = mirror_set(roster, CollectionKind::Convocations, &convocation);
    Ok(Saved::new(convocation, warning))
}

pub fn delete_convocation(roster: &mut Roster, convocation_id: &str) -> Result<Saved<Convocation>, RosterError> {
    let idx = roster
        .convocations
        .iter()
        .position(|c| c.id == convocation_id)
        .ok_or_else(|| RosterError::not_found("convocation", convocation_id))?;
    let convocation = roster.convocations.remove(idx);
    roster.save()?;
    info!("Deleted convocation for {}", convocation.date);

    let warning = mirror_delete(roster, CollectionKind::Convocations, &convocation.id);
    Ok(Saved::new(convocation, warning))
}

/// Record one player's match stats for `date`.
///
/// 1. The date needs a convocation and the player must be called up in it.
/// 2. A second entry for the same player and date needs `overwrite`; the existing entry is then
///    updated in place and stamped with `updatedAt`.
pub fn save_match_entry(
    roster: &mut Roster,
    date: &str,
    player_id: &str,
    stats: StatLine,
    overwrite: bool,
) -> Result<Saved<MatchEntry>, RosterError> {
    validate_date(date)?;
    if player_id.trim().is_empty() {
        return Err(RosterError::MissingField("player"));
    }
    if roster.player(player_id).is_none() {
        return Err(RosterError::not_found("player", player_id));
    }
    check_convocated(roster, player_id, date)?;

    let existing = roster
        .match_entries
        .iter_mut()
        .find(|e| e.player_id == player_id && e.date == date);
    let entry = match existing {
        Some(_) if !overwrite => {
            return Err(RosterError::MatchEntryExists {
                player_id: player_id.to_string(),
                date: date.to_string(),
            })
        }
        Some(entry) => {
            entry.stats = stats;
            entry.updated_at = Some(now_millis());
            entry.clone()
        }
        None => {
            let entry = MatchEntry::new(date, player_id, stats);
            roster.match_entries.push(entry.clone());
            roster.sort_collection(CollectionKind::MatchEntries);
            entry
        }
    };
    roster.save()?;
    info!(
        "Saved match entry for {} on {}: {}G {}A {}min",
        roster.player_name(player_id),
        date,
        entry.stats.goals,
        entry.stats.assists,
        entry.stats.minutes
    );

    let warning = mirror_set(roster, CollectionKind::MatchEntries, &entry);
    Ok(Saved::new(entry, warning))
}

pub fn delete_match_entry(roster: &mut Roster, entry_id: &str) -> Result<Saved<MatchEntry>, RosterError> {
    let idx = roster
        .match_entries
        .iter()
        .position(|e| e.id == entry_id)
        .ok_or_else(|| RosterError::not_found("match entry", entry_id))?;
    let entry = roster.match_entries.remove(idx);
    roster.save()?;
    info!("Deleted match entry {}", entry.id);

    let warning = mirror_delete(roster, CollectionKind::MatchEntries, &entry.id);
    Ok(Saved::new(entry, warning))
}
