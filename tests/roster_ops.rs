//! Integration tests for roster operations: players, sessions, convocations, match entries, results.

use squad_roster_web::{
    add_player, add_rival, compute_attendance_stats, compute_match_stats, delete_player, delete_rival,
    match_csv, player_attendance_detail, player_detail, rename_player, save_convocation, save_match_entry, save_match_results,
    save_session, Attendance, AttendanceStatus, CallUp, DateRange, JourneyBlock, Location, MemoryStore,
    PlayerId, Roster, RosterError, StatLine,
};
use std::collections::BTreeMap;
use std::sync::Arc;

fn roster() -> Roster {
    Roster::new(Arc::new(MemoryStore::new()))
}

fn roster_with_players(n: usize) -> (Roster, Vec<PlayerId>) {
    let mut r = roster();
    let ids = (0..n)
        .map(|i| add_player(&mut r, &format!("P{i:02}"), false).unwrap().record.id)
        .collect();
    (r, ids)
}

/// First `called` players are `C`, the rest `NC`.
fn call_up(ids: &[PlayerId], called: usize) -> BTreeMap<PlayerId, CallUp> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| (id.clone(), if i < called { CallUp::Called } else { CallUp::NotCalled }))
        .collect()
}

fn stats(goals: u32, assists: u32, minutes: u32) -> StatLine {
    StatLine {
        goals,
        assists,
        minutes,
        ..StatLine::default()
    }
}

fn block(journey: &str, location: Location) -> JourneyBlock {
    JourneyBlock {
        journey: journey.to_string(),
        location: Some(location),
        ..JourneyBlock::default()
    }
}

#[test]
fn duplicate_name_needs_confirmation() {
    let mut r = roster();
    add_player(&mut r, "Ana", false).unwrap();
    let err = add_player(&mut r, "ana", false).unwrap_err();
    assert!(err.needs_confirmation());
    assert_eq!(r.players.len(), 1);

    add_player(&mut r, "ana", true).unwrap();
    assert_eq!(r.players.len(), 2);
    assert_eq!(add_player(&mut r, "   ", true), Err(RosterError::MissingField("name")));
}

#[test]
fn players_stay_sorted_by_name() {
    let mut r = roster();
    for name in ["Olga", "ñito", "Bea", "álvaro"] {
        add_player(&mut r, name, false).unwrap();
    }
    let names: Vec<_> = r.players.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["álvaro", "Bea", "ñito", "Olga"]);

    let bea = r.players[1].id.clone();
    rename_player(&mut r, &bea, "Zoe").unwrap();
    assert_eq!(r.players.last().unwrap().name, "Zoe");
}

#[test]
fn delete_player_removes_every_reference() {
    let (mut r, ids) = roster_with_players(12);
    let victim = ids[0].clone();

    let mut attendance = Attendance::new();
    attendance.insert(victim.clone(), AttendanceStatus::Late);
    save_session(&mut r, "2025-09-10", attendance, false).unwrap();
    save_session(&mut r, "2025-09-12", Attendance::new(), false).unwrap();
    save_convocation(&mut r, "2025-09-14", call_up(&ids, 12), false).unwrap();
    save_match_entry(&mut r, "2025-09-14", &victim, stats(1, 0, 80), false).unwrap();
    save_match_entry(&mut r, "2025-09-14", &ids[1], stats(0, 1, 80), false).unwrap();

    let removed = delete_player(&mut r, &victim).unwrap();
    assert_eq!(removed.record.id, victim);
    assert!(r.player(&victim).is_none());
    assert!(r.sessions.iter().all(|s| !s.attendance.contains_key(&victim)));
    assert!(r.convocations.iter().all(|c| !c.players.contains_key(&victim)));
    assert!(r.match_entries.iter().all(|e| e.player_id != victim));
    assert_eq!(r.match_entries.len(), 1);

    assert!(matches!(delete_player(&mut r, &victim), Err(RosterError::NotFound { .. })));
}

#[test]
fn session_for_same_date_needs_overwrite() {
    let (mut r, ids) = roster_with_players(2);
    let first = save_session(&mut r, "2025-09-10", Attendance::new(), false).unwrap().record;
    assert_eq!(first.status_of(&ids[0]), AttendanceStatus::Present);

    let mut attendance = Attendance::new();
    attendance.insert(ids[0].clone(), AttendanceStatus::Absent);
    let err = save_session(&mut r, "2025-09-10", attendance.clone(), false).unwrap_err();
    assert_eq!(err, RosterError::SessionExists("2025-09-10".into()));

    let second = save_session(&mut r, "2025-09-10", attendance, true).unwrap().record;
    assert_eq!(second.id, first.id);
    assert_eq!(r.sessions.len(), 1);
    assert_eq!(r.sessions[0].status_of(&ids[0]), AttendanceStatus::Absent);
    assert_eq!(r.last_selected_date().as_deref(), Some("2025-09-10"));
}

#[test]
fn session_date_must_be_valid() {
    let mut r = roster();
    assert!(matches!(
        save_session(&mut r, "2025-13-01", Attendance::new(), false),
        Err(RosterError::InvalidDate(_))
    ));
    assert!(r.sessions.is_empty());
}

#[test]
fn convocation_headcount_bounds() {
    let (mut r, ids) = roster_with_players(20);

    assert_eq!(
        save_convocation(&mut r, "2025-09-10", call_up(&ids, 10), false),
        Err(RosterError::ConvocationSize { called: 10 })
    );
    assert!(save_convocation(&mut r, "2025-09-10", call_up(&ids, 11), false).is_ok());
    assert!(save_convocation(&mut r, "2025-09-11", call_up(&ids, 18), false).is_ok());
    assert_eq!(
        save_convocation(&mut r, "2025-09-12", call_up(&ids, 19), false),
        Err(RosterError::ConvocationSize { called: 19 })
    );
    assert_eq!(r.convocations.len(), 2);
}

#[test]
fn convocation_overwrite_keeps_id() {
    let (mut r, ids) = roster_with_players(15);
    let first = save_convocation(&mut r, "2025-09-10", call_up(&ids, 11), false).unwrap().record;
    assert!(save_convocation(&mut r, "2025-09-10", call_up(&ids, 14), false)
        .unwrap_err()
        .needs_confirmation());
    let second = save_convocation(&mut r, "2025-09-10", call_up(&ids, 14), true).unwrap().record;
    assert_eq!(second.id, first.id);
    assert_eq!(r.convocations[0].called_count(), 14);
}

#[test]
fn ana_attendance_scenario() {
    let mut r = roster();
    let ana = add_player(&mut r, "Ana", false).unwrap().record;
    let mut attendance = Attendance::new();
    attendance.insert(ana.id.clone(), AttendanceStatus::Absent);
    save_session(&mut r, "2025-09-10", attendance, false).unwrap();

    let stats = compute_attendance_stats(&r, &DateRange::between(Some("2025-09-01"), Some("2025-09-30")));
    assert_eq!(stats.total_sessions, 1);
    let row = &stats.rows[0];
    assert_eq!(row.name, "Ana");
    assert_eq!((row.total, row.present, row.absent, row.justified, row.late), (1, 0, 1, 0, 0));

    let marks = player_attendance_detail(&r, &ana.id, &DateRange::all());
    assert_eq!(marks.len(), 1);
    assert_eq!(marks[0].status, AttendanceStatus::Absent);
}

#[test]
fn attendance_buckets_sum_to_total() {
    let (mut r, ids) = roster_with_players(4);
    let statuses = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::JustifiedAbsence,
        AttendanceStatus::Late,
    ];
    for day in 1..=6 {
        let mut attendance = Attendance::new();
        // One player left unset each day: counts as present.
        for (i, id) in ids.iter().enumerate().skip(day % 4 + 1) {
            attendance.insert(id.clone(), statuses[(i + day) % 4]);
        }
        let date = format!("2025-10-{day:02}");
        save_session(&mut r, &date, attendance, false).unwrap();
        r.sessions
            .iter_mut()
            .find(|s| s.date == date)
            .unwrap()
            .attendance
            .remove(&ids[day % 4]);
    }

    let stats = compute_attendance_stats(&r, &DateRange::all());
    assert_eq!(stats.total_sessions, 6);
    for row in &stats.rows {
        assert_eq!(row.present + row.absent + row.justified + row.late, row.total);
    }
    let presents: Vec<_> = stats.rows.iter().map(|row| row.present).collect();
    assert!(presents.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn match_entry_requires_call_up() {
    let (mut r, ids) = roster_with_players(12);
    assert_eq!(
        save_match_entry(&mut r, "2025-09-10", &ids[0], stats(1, 0, 80), false),
        Err(RosterError::NoConvocation("2025-09-10".into()))
    );

    save_convocation(&mut r, "2025-09-10", call_up(&ids, 11), false).unwrap();
    let outsider = ids[11].clone();
    let err = save_match_entry(&mut r, "2025-09-10", &outsider, stats(1, 0, 80), false).unwrap_err();
    assert!(matches!(err, RosterError::NotConvocated { .. }));
    assert!(r.match_entries.is_empty());

    assert!(save_match_entry(&mut r, "2025-09-10", &ids[0], stats(1, 0, 80), false).is_ok());
}

#[test]
fn match_entry_overwrite_updates_in_place() {
    let (mut r, ids) = roster_with_players(11);
    save_convocation(&mut r, "2025-09-10", call_up(&ids, 11), false).unwrap();
    let first = save_match_entry(&mut r, "2025-09-10", &ids[0], stats(1, 0, 60), false)
        .unwrap()
        .record;

    let err = save_match_entry(&mut r, "2025-09-10", &ids[0], stats(2, 0, 80), false).unwrap_err();
    assert!(err.needs_confirmation());

    let second = save_match_entry(&mut r, "2025-09-10", &ids[0], stats(2, 0, 80), true)
        .unwrap()
        .record;
    assert_eq!(second.id, first.id);
    assert!(second.updated_at.is_some());
    assert_eq!(r.match_entries.len(), 1);
    assert_eq!(r.match_entries[0].stats.goals, 2);
}

#[test]
fn match_stats_percent_is_clamped() {
    let (mut r, ids) = roster_with_players(11);
    save_convocation(&mut r, "2025-09-10", call_up(&ids, 11), false).unwrap();
    save_match_entry(&mut r, "2025-09-10", &ids[0], stats(0, 0, 500), false).unwrap();
    save_match_entry(&mut r, "2025-09-10", &ids[1], stats(2, 1, 40), false).unwrap();

    let rows = compute_match_stats(&r, &DateRange::all(), 80);
    assert!(rows.iter().all(|row| row.percent <= 100));
    assert_eq!(rows[0].player_id, ids[1]);
    assert_eq!(rows[0].percent, 50);
    let heavy = rows.iter().find(|row| row.player_id == ids[0]).unwrap();
    assert_eq!(heavy.percent, 100);
    assert_eq!(heavy.convocations, 1);

    let outside = compute_match_stats(&r, &DateRange::between(Some("2025-10-01"), None), 80);
    assert!(outside.iter().all(|row| row.minutes == 0 && row.convocations == 0 && row.percent == 0));
}

#[test]
fn match_totals_saturate_instead_of_overflowing() {
    let (mut r, ids) = roster_with_players(11);
    for date in ["2025-09-10", "2025-09-17"] {
        save_convocation(&mut r, date, call_up(&ids, 11), false).unwrap();
        save_match_entry(&mut r, date, &ids[0], stats(u32::MAX, 1, 3_000_000_000), false).unwrap();
    }

    let rows = compute_match_stats(&r, &DateRange::all(), 80);
    let heavy = rows.iter().find(|row| row.player_id == ids[0]).unwrap();
    assert_eq!(heavy.minutes, u32::MAX);
    assert_eq!(heavy.goals, u32::MAX);
    assert_eq!(heavy.percent, 100);

    let detail = player_detail(&r, &ids[0], &DateRange::all()).unwrap();
    assert_eq!(detail.total_goals_assists, u32::MAX);
    assert!(match_csv(&rows).is_ok());
}

#[test]
fn league_journey_is_unique_across_rivals() {
    let mut r = roster();
    let north = add_rival(&mut r, "North FC", "Municipal", None).unwrap().record;
    let south = add_rival(&mut r, "South CF", "La Vega", None).unwrap().record;

    save_match_results(&mut r, &north.id, &[block("5", Location::Home)]).unwrap();
    let err = save_match_results(&mut r, &south.id, &[block("5", Location::Away)]).unwrap_err();
    assert_eq!(
        err,
        RosterError::DuplicateJourney {
            journey: "5".into(),
            rival: "North FC".into()
        }
    );

    save_match_results(&mut r, &south.id, &[block("A", Location::Home)]).unwrap();
    save_match_results(
        &mut r,
        &north.id,
        &[block("5", Location::Home), block("A", Location::Away)],
    )
    .unwrap();
    assert_eq!(r.match_results.len(), 3);
    assert_eq!(r.results_for_rival(&north.id).len(), 2);
}

#[test]
fn journey_blocks_are_checked_before_saving() {
    let mut r = roster();
    let rival = add_rival(&mut r, "North FC", "Municipal", None).unwrap().record;

    let err = save_match_results(&mut r, &rival.id, &[block("3", Location::Home), block("3", Location::Away)])
        .unwrap_err();
    assert_eq!(err, RosterError::JourneyRepeated("3".into()));

    let incomplete = JourneyBlock {
        journey: "4".into(),
        ..JourneyBlock::default()
    };
    assert_eq!(
        save_match_results(&mut r, &rival.id, &[incomplete]),
        Err(RosterError::NoValidJourney)
    );
    assert!(r.match_results.is_empty());
}

#[test]
fn deleting_rival_removes_its_results() {
    let mut r = roster();
    let north = add_rival(&mut r, "North FC", "Municipal", None).unwrap().record;
    let south = add_rival(&mut r, "South CF", "La Vega", None).unwrap().record;
    save_match_results(&mut r, &north.id, &[block("1", Location::Home), block("2", Location::Away)]).unwrap();
    save_match_results(&mut r, &south.id, &[block("3", Location::Home)]).unwrap();

    let removed = delete_rival(&mut r, &north.id).unwrap().record;
    assert_eq!(removed.results_removed, 2);
    assert_eq!(r.match_results.len(), 1);
    assert_eq!(r.rivals.len(), 1);
}

#[test]
fn rival_needs_name_and_field() {
    let mut r = roster();
    assert_eq!(add_rival(&mut r, "North FC", " ", None), Err(RosterError::MissingField("field")));
    assert_eq!(add_rival(&mut r, "", "Municipal", None), Err(RosterError::MissingField("name")));
}
