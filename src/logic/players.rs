//! Player management: add, rename, delete with cascade.

use crate::logic::mirror::{merge_warnings, mirror_delete, mirror_ops, mirror_set, mirror_set_all, Saved};
use crate::models::{CollectionKind, Player, Roster, RosterError};
use crate::sync::WriteOp;
use log::info;

/// Add a player. A name matching an existing one (ignoring case) needs `confirm_duplicate`.
pub fn add_player(roster: &mut Roster, name: &str, confirm_duplicate: bool) -> Result<Saved<Player>, RosterError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RosterError::MissingField("name"));
    }
    if !confirm_duplicate && roster.players.iter().any(|p| p.has_name(name)) {
        return Err(RosterError::DuplicatePlayerName(name.to_string()));
    }

    let player = Player::new(name);
    roster.players.push(player.clone());
    roster.sort_collection(CollectionKind::Players);
    roster.save()?;
    info!("Added player {} ({})", player.name, player.id);

    let warning = mirror_set(roster, CollectionKind::Players, &player);
    Ok(Saved::new(player, warning))
}

pub fn rename_player(roster: &mut Roster, player_id: &str, name: &str) -> Result<Saved<Player>, RosterError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RosterError::MissingField("name"));
    }
    let player = roster
        .players
        .iter_mut()
        .find(|p| p.id == player_id)
        .ok_or_else(|| RosterError::not_found("player", player_id))?;
    player.name = name.to_string();
    let player = player.clone();

    roster.sort_collection(CollectionKind::Players);
    roster.save()?;
    info!("Renamed player {} to {}", player.id, player.name);

    let warning = mirror_set(roster, CollectionKind::Players, &player);
    Ok(Saved::new(player, warning))
}

/// Delete a player and every reference to it: attendance marks, call-ups and match entries.
pub fn delete_player(roster: &mut Roster, player_id: &str) -> Result<Saved<Player>, RosterError> {
    if roster.player(player_id).is_none() {
        return Err(RosterError::not_found("player", player_id));
    }
    let report = roster.remove_player_cascade(player_id);
    roster.save()?;
    let player = report
        .player
        .clone()
        .ok_or_else(|| RosterError::not_found("player", player_id))?;
    info!(
        "Deleted player {} ({} sessions, {} convocations, {} match entries touched)",
        player.name,
        report.sessions_touched.len(),
        report.convocations_touched.len(),
        report.entries_removed.len()
    );

    let entry_deletes = report
        .entries_removed
        .iter()
        .map(|id| WriteOp::Delete { id: id.clone() })
        .collect();
    let warning = merge_warnings([
        mirror_delete(roster, CollectionKind::Players, &player.id),
        mirror_set_all(roster, CollectionKind::Sessions, &report.sessions_touched),
        mirror_set_all(roster, CollectionKind::Convocations, &report.convocations_touched),
        mirror_ops(roster, CollectionKind::MatchEntries, entry_deletes),
    ]);
    Ok(Saved::new(player, warning))
}
