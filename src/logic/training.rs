//! Training sessions and attendance.

use crate::logic::mirror::{mirror_delete, mirror_set, Saved};
use crate::logic::validation::validate_date;
use crate::models::{
    generate_id, now_millis, upsert_by_key, Attendance, CollectionKind, Record, Roster, RosterError, Session,
};
use log::{info, warn};

/// Record attendance for `date`.
///
/// Every current player without a status is marked present. Replacing an existing session for
/// the same date needs `overwrite`; the stored session keeps its id and creation time.
pub fn save_session(
    roster: &mut Roster,
    date: &str,
    mut attendance: Attendance,
    overwrite: bool,
) -> Result<Saved<Session>, RosterError> {
    validate_date(date)?;
    if !overwrite && roster.session_by_date(date).is_some() {
        return Err(RosterError::SessionExists(date.to_string()));
    }
    for player in &roster.players {
        attendance.entry(player.id.clone()).or_default();
    }

    let session = Session {
        id: generate_id(Session::PREFIX),
        date: date.to_string(),
        attendance,
        created_at: Some(now_millis()),
    };
    let session = upsert_by_key(&mut roster.sessions, session, |s| s.date.as_str());
    roster.save()?;
    if let Err(e) = roster.set_last_selected_date(date) {
        warn!("Could not remember last session date: {}", e);
    }
    info!("Saved session {} with {} marks", session.date, session.attendance.len());

    let warning = mirror_set(roster, CollectionKind::Sessions, &session);
    Ok(Saved::new(session, warning))
}

pub fn delete_session(roster: &mut Roster, session_id: &str) -> Result<Saved<Session>, RosterError> {
    let idx = roster
        .sessions
        .iter()
        .position(|s| s.id == session_id)
        .ok_or_else(|| RosterError::not_found("session", session_id))?;
    let session = roster.sessions.remove(idx);
    roster.save()?;
    info!("Deleted session {}", session.date);

    let warning = mirror_delete(roster, CollectionKind::Sessions, &session.id);
    Ok(Saved::new(session, warning))
}
