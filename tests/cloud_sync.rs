//! Integration tests for cloud mirroring, change feeds and reconciliation.

use serde_json::{json, Value};
use squad_roster_web::sync::{reconcile_batch, Change, CollectionChanged, ReconcileReport};
use squad_roster_web::{
    add_player, add_rival, reset_all, save_session, sync_to_cloud, Attendance, CollectionKind, DocumentStore,
    MemoryDocumentStore, MemoryStore, Player, Roster, RosterError, SharedRoster, SyncHub,
};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;

fn cloud_roster() -> (Roster, Arc<MemoryDocumentStore>) {
    let remote = Arc::new(MemoryDocumentStore::new());
    let mut roster = Roster::new(Arc::new(MemoryStore::new())).with_remote(remote.clone());
    roster.cloud.enabled = true;
    (roster, remote)
}

async fn next_change(rx: &mut broadcast::Receiver<CollectionChanged>) -> CollectionChanged {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("no change published")
        .expect("change channel closed")
}

#[test]
fn local_writes_are_mirrored() {
    let (mut r, remote) = cloud_roster();
    let saved = add_player(&mut r, "Ana", false).unwrap();
    assert_eq!(saved.remote_warning, None);
    let doc = remote.get(CollectionKind::Players, &saved.record.id).unwrap();
    assert_eq!(doc["name"], "Ana");

    r.cloud.enabled = false;
    let offline = add_player(&mut r, "Bea", false).unwrap();
    assert!(remote.get(CollectionKind::Players, &offline.record.id).is_none());
}

#[test]
fn remote_write_failure_keeps_local_change() {
    let (mut r, remote) = cloud_roster();
    remote.deny_writes(true);
    let saved = add_player(&mut r, "Ana", false).unwrap();
    assert!(saved.remote_warning.is_some());
    assert_eq!(r.players.len(), 1);

    let mut reloaded = Roster::new(r.storage().clone());
    reloaded.load();
    assert_eq!(reloaded.players.len(), 1);
}

#[test]
fn batches_merge_dedupe_and_remove() {
    let (mut r, _remote) = cloud_roster();
    let session = save_session(&mut r, "2025-09-10", Attendance::new(), false)
        .unwrap()
        .record;

    let report = reconcile_batch(
        &mut r,
        CollectionKind::Sessions,
        &[
            Change::added("other_id", json!({ "id": "other_id", "date": "2025-09-10", "attendance": {} })),
            Change::added("s_new", json!({ "date": "2025-09-01", "attendance": ["p1"] })),
            Change::modified(session.id.clone(), json!({ "attendance": { "p9": "T" } })),
        ],
    )
    .unwrap();
    assert_eq!((report.added, report.updated, report.duplicates), (1, 1, 1));
    assert_eq!(r.sessions.len(), 2);
    assert_eq!(r.sessions[0].id, "s_new");
    assert_eq!(r.sessions[1].date, "2025-09-10");
    assert_eq!(r.sessions[1].attendance.len(), 1);

    let report = reconcile_batch(&mut r, CollectionKind::Sessions, &[Change::removed("s_new")]).unwrap();
    assert_eq!(report.removed, 1);
    assert_eq!(r.sessions.len(), 1);

    let report = reconcile_batch(
        &mut r,
        CollectionKind::Players,
        &[Change::added("bad", json!({ "id": "bad" }))],
    )
    .unwrap();
    assert_eq!(report.rejected, 1);
    assert!(r.players.is_empty());
}

fn added_twice(r: &mut Roster, kind: CollectionKind, first: Value, copy: Value) -> ReconcileReport {
    reconcile_batch(r, kind, &[Change::added("first", first), Change::added("copy", copy)]).unwrap()
}

#[test]
fn each_collection_spots_copies_by_its_own_key() {
    let (mut r, _remote) = cloud_roster();

    let report = added_twice(
        &mut r,
        CollectionKind::Rivals,
        json!({ "name": "North FC", "field": "Municipal" }),
        json!({ "name": "North FC", "field": "Other ground" }),
    );
    assert_eq!((report.added, report.duplicates), (1, 1));

    let report = added_twice(
        &mut r,
        CollectionKind::Convocations,
        json!({ "date": "2025-09-10", "players": { "p1": "C" } }),
        json!({ "date": "2025-09-10", "players": { "p2": "C" } }),
    );
    assert_eq!((report.added, report.duplicates), (1, 1));

    let entry = json!({ "date": "2025-09-10", "playerId": "p1", "goals": 1, "assists": 0, "minutes": 80 });
    let mut same_line = entry.clone();
    same_line["yellows"] = json!(1);
    let report = added_twice(&mut r, CollectionKind::MatchEntries, entry.clone(), same_line);
    assert_eq!((report.added, report.duplicates), (1, 1));
    let mut other_line = entry;
    other_line["minutes"] = json!(60);
    let report = reconcile_batch(
        &mut r,
        CollectionKind::MatchEntries,
        &[Change::added("second_half", other_line)],
    )
    .unwrap();
    assert_eq!((report.added, report.duplicates), (1, 0));

    let report = added_twice(
        &mut r,
        CollectionKind::MatchResults,
        json!({ "rivalId": "first", "journey": "3", "location": "local" }),
        json!({ "rivalId": "first", "journey": "3", "location": "visitante", "result": "0-0" }),
    );
    assert_eq!((report.added, report.duplicates), (1, 1));

    let report = reconcile_batch(
        &mut r,
        CollectionKind::MatchResults,
        &[
            Change::added(
                "friendly_1",
                json!({ "rivalId": "first", "journey": "A", "location": "local", "date": "2025-08-01" }),
            ),
            Change::added(
                "friendly_2",
                json!({ "rivalId": "first", "journey": "A", "location": "local", "date": "2025-08-20" }),
            ),
        ],
    )
    .unwrap();
    assert_eq!((report.added, report.duplicates), (2, 0));
    assert_eq!(r.match_results.len(), 3);
}

#[test]
fn identical_remote_update_is_skipped() {
    let (mut r, _remote) = cloud_roster();
    let rival = add_rival(&mut r, "North FC", "Municipal", None).unwrap().record;

    let report = reconcile_batch(
        &mut r,
        CollectionKind::Rivals,
        &[Change::modified(rival.id.clone(), json!({ "name": "North FC", "field": "Municipal" }))],
    )
    .unwrap();
    assert_eq!((report.unchanged, report.updated), (1, 0));
    assert!(!report.changed());

    let report = reconcile_batch(
        &mut r,
        CollectionKind::Rivals,
        &[Change::modified(rival.id.clone(), json!({ "field": "New ground" }))],
    )
    .unwrap();
    assert_eq!((report.unchanged, report.updated), (0, 1));
    assert_eq!(r.rivals[0].field, "New ground");
    assert_eq!(r.rivals[0].name, "North FC");
}

#[tokio::test]
async fn remote_changes_flow_into_roster() {
    let (r, remote) = cloud_roster();
    let shared: SharedRoster = Arc::new(RwLock::new(r));
    let hub = SyncHub::start(remote.as_ref(), shared.clone());
    let mut changes = hub.subscribe();

    remote
        .set(
            CollectionKind::Players,
            "player_remote",
            json!({ "id": "player_remote", "name": "Carla", "createdAt": 1 }),
        )
        .unwrap();
    let changed = next_change(&mut changes).await;
    assert_eq!(changed, CollectionChanged { kind: CollectionKind::Players, reloaded: false });
    assert_eq!(shared.read().unwrap().player_name("player_remote"), "Carla");

    remote
        .set(CollectionKind::Players, "player_remote", json!({ "name": "Carla R." }))
        .unwrap();
    next_change(&mut changes).await;
    {
        let g = shared.read().unwrap();
        let p = g.player("player_remote").unwrap();
        assert_eq!(p.name, "Carla R.");
        assert_eq!(p.created_at, 1);
    }

    remote.delete(CollectionKind::Players, "player_remote").unwrap();
    next_change(&mut changes).await;
    assert!(shared.read().unwrap().players.is_empty());
    hub.shutdown();
}

#[tokio::test]
async fn bulk_upload_does_not_echo_back() {
    let (mut r, remote) = cloud_roster();
    r.cloud.enabled = false;
    add_player(&mut r, "Ana", false).unwrap();
    add_player(&mut r, "Bea", false).unwrap();
    r.cloud.enabled = true;

    let shared: SharedRoster = Arc::new(RwLock::new(r));
    let hub = SyncHub::start(remote.as_ref(), shared.clone());
    let mut changes = hub.subscribe();

    let uploaded = sync_to_cloud(&shared.read().unwrap()).unwrap();
    assert_eq!(uploaded, 2);
    assert_eq!(remote.list_ids(CollectionKind::Players).unwrap().len(), 2);
    assert!(!shared.read().unwrap().bulk_guard().is_active());

    let echo = tokio::time::timeout(Duration::from_millis(200), changes.recv()).await;
    assert!(echo.is_err(), "bulk upload should not publish changes");
    hub.shutdown();
}

#[tokio::test]
async fn permission_denied_falls_back_to_local_storage() {
    let (mut r, remote) = cloud_roster();
    add_player(&mut r, "Ana", false).unwrap();
    // In memory only: not saved.
    r.players.push(Player::new("Ghost"));

    let shared: SharedRoster = Arc::new(RwLock::new(r));
    let hub = SyncHub::start(remote.as_ref(), shared.clone());
    let mut changes = hub.subscribe();

    remote.deny_reads(true);
    let changed = next_change(&mut changes).await;
    assert!(changed.reloaded);
    let names: Vec<_> = shared
        .read()
        .unwrap()
        .players
        .iter()
        .map(|p| p.name.clone())
        .collect();
    assert_eq!(names, ["Ana"]);
    hub.shutdown();
}

#[tokio::test]
async fn restarting_sync_drops_stopped_listeners() {
    let (r, remote) = cloud_roster();
    let shared: SharedRoster = Arc::new(RwLock::new(r));
    for _ in 0..3 {
        SyncHub::start(remote.as_ref(), shared.clone()).shutdown();
    }
    // Let the aborted feed tasks drop their receivers.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let hub = SyncHub::start(remote.as_ref(), shared.clone());
    let mut changes = hub.subscribe();
    assert_eq!(remote.listener_count(CollectionKind::Players), 1);

    remote
        .set(CollectionKind::Sessions, "s1", json!({ "id": "s1", "date": "2025-09-10", "attendance": {} }))
        .unwrap();
    next_change(&mut changes).await;
    assert_eq!(remote.listener_count(CollectionKind::Sessions), 1);
    hub.shutdown();
}

#[test]
fn reset_needs_typed_phrase_and_clears_everything() {
    let (mut r, remote) = cloud_roster();
    add_player(&mut r, "Ana", false).unwrap();
    save_session(&mut r, "2025-09-10", Attendance::new(), false).unwrap();

    assert_eq!(reset_all(&mut r, true, "borrar"), Err(RosterError::ResetNotConfirmed));
    assert_eq!(reset_all(&mut r, false, "BORRAR"), Err(RosterError::ResetNotConfirmed));
    assert_eq!(r.players.len(), 1);

    let report = reset_all(&mut r, true, "BORRAR").unwrap();
    assert_eq!(report.remote_deleted, 2);
    assert!(report.remote_failures.is_empty());
    assert!(r.players.is_empty() && r.sessions.is_empty());
    assert!(remote.list_ids(CollectionKind::Players).unwrap().is_empty());
    assert_eq!(r.last_selected_date(), None);

    let mut reloaded = Roster::new(r.storage().clone());
    reloaded.load();
    assert!(reloaded.players.is_empty());
}
