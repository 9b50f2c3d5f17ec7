//! Rivals and the match results played against them.

use crate::logic::mirror::{merge_warnings, mirror_delete, mirror_ops, mirror_set, set_op, Saved};
use crate::logic::validation::{validate_journeys, JourneyBlock};
use crate::models::{CollectionKind, MatchResult, Rival, Roster, RosterError};
use crate::sync::WriteOp;
use log::{info, warn};
use serde::Serialize;

pub fn add_rival(
    roster: &mut Roster,
    name: &str,
    field: &str,
    shield: Option<String>,
) -> Result<Saved<Rival>, RosterError> {
    let name = name.trim();
    let field = field.trim();
    if name.is_empty() {
        return Err(RosterError::MissingField("name"));
    }
    if field.is_empty() {
        return Err(RosterError::MissingField("field"));
    }
    let shield = shield.filter(|s| !s.trim().is_empty());

    let rival = Rival::new(name, field, shield);
    roster.rivals.push(rival.clone());
    roster.sort_collection(CollectionKind::Rivals);
    roster.save()?;
    info!("Added rival {} ({})", rival.name, rival.id);

    let warning = mirror_set(roster, CollectionKind::Rivals, &rival);
    Ok(Saved::new(rival, warning))
}

/// A deleted rival and how many of its results went with it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RivalRemoval {
    pub rival: Rival,
    pub results_removed: usize,
}

/// Delete a rival together with all its match results.
pub fn delete_rival(roster: &mut Roster, rival_id: &str) -> Result<Saved<RivalRemoval>, RosterError> {
    let idx = roster
        .rivals
        .iter()
        .position(|r| r.id == rival_id)
        .ok_or_else(|| RosterError::not_found("rival", rival_id))?;
    let rival = roster.rivals.remove(idx);
    let removed_ids = take_results_of(roster, rival_id);
    roster.save()?;
    info!("Deleted rival {} and {} result(s)", rival.name, removed_ids.len());

    let deletes = removed_ids
        .iter()
        .map(|id| WriteOp::Delete { id: id.clone() })
        .collect();
    let warning = merge_warnings([
        mirror_ops(roster, CollectionKind::MatchResults, deletes),
        mirror_delete(roster, CollectionKind::Rivals, &rival.id),
    ]);
    Ok(Saved::new(
        RivalRemoval {
            rival,
            results_removed: removed_ids.len(),
        },
        warning,
    ))
}

/// Replace every result against `rival_id` with the submitted blocks.
///
/// Journeys are validated first; on any error nothing changes.
pub fn save_match_results(
    roster: &mut Roster,
    rival_id: &str,
    blocks: &[JourneyBlock],
) -> Result<Saved<Vec<MatchResult>>, RosterError> {
    if roster.rival(rival_id).is_none() {
        return Err(RosterError::not_found("rival", rival_id));
    }
    let results = validate_journeys(roster, rival_id, blocks)?;

    let removed_ids = take_results_of(roster, rival_id);
    roster.match_results.extend(results.iter().cloned());
    roster.save()?;
    info!(
        "Saved {} result(s) against {} (replacing {})",
        results.len(),
        roster.rival(rival_id).map(|r| r.name.as_str()).unwrap_or(rival_id),
        removed_ids.len()
    );

    let mut ops: Vec<WriteOp> = removed_ids
        .into_iter()
        .map(|id| WriteOp::Delete { id })
        .collect();
    let mut warning = None;
    for result in &results {
        match set_op(result) {
            Ok(op) => ops.push(op),
            Err(e) => {
                warn!("Could not encode result {}: {}", result.id, e);
                warning = Some(format!("Saved locally, but result {} could not be sent to the cloud", result.id));
            }
        }
    }
    let warning = merge_warnings([warning, mirror_ops(roster, CollectionKind::MatchResults, ops)]);
    Ok(Saved::new(results, warning))
}

pub fn delete_match_result(roster: &mut Roster, result_id: &str) -> Result<Saved<MatchResult>, RosterError> {
    let idx = roster
        .match_results
        .iter()
        .position(|r| r.id == result_id)
        .ok_or_else(|| RosterError::not_found("match result", result_id))?;
    let result = roster.match_results.remove(idx);
    roster.save()?;
    info!("Deleted result {} (journey {})", result.id, result.journey);

    let warning = mirror_delete(roster, CollectionKind::MatchResults, &result.id);
    Ok(Saved::new(result, warning))
}

/// Remove the rival's results from memory, returning their ids.
fn take_results_of(roster: &mut Roster, rival_id: &str) -> Vec<String> {
    let mut removed = Vec::new();
    roster.match_results.retain(|r| {
        if r.rival_id == rival_id {
            removed.push(r.id.clone());
            false
        } else {
            true
        }
    });
    removed
}
