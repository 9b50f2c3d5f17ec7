//! Single binary web server: HTML from templates/, static from /static, API via REST.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Env: HOST, PORT, DATA_DIR (default `data`), ROSTER_USERS (`email:password,...`),
//! SESSION_KEY (64+ bytes; a random key is used when unset, so sessions end on restart).

use actix_files::Files;
use actix_session::{storage::CookieSessionStore, Session as WebSession, SessionMiddleware};
use actix_web::{
    cookie::Key,
    delete, get, post, put,
    web::{self, Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use serde::{Deserialize, Serialize};
use squad_roster_web::{
    add_player, add_rival, attendance_csv, clean_duplicates, compute_attendance_stats, compute_match_stats,
    delete_convocation, delete_match_entry, delete_match_result, delete_player, delete_rival, delete_session,
    match_csv, player_attendance_detail, player_detail, rename_player, reset_all, save_convocation,
    save_match_entry, save_match_results, save_session, sync_to_cloud, update_cloud_config, update_config,
    Attendance, CallUp, DateRange, FeatureConfig, FileStore, IdentityProvider, JourneyBlock, KeyValueStore,
    MemoryDocumentStore, PlayerId, Roster, RosterError, StatLine, StaticCredentials, SyncHub,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};

/// Roster shared by all handlers and the sync feed tasks.
type AppState = Data<RwLock<Roster>>;

/// Session key holding the signed-in email.
const USER_KEY: &str = "user";

/// Remote store plus the running feed tasks (present while cloud sync is on).
struct CloudSync {
    remote: Arc<MemoryDocumentStore>,
    hub: Mutex<Option<SyncHub>>,
}

type CloudState = Data<CloudSync>;
type IdentityState = Data<Box<dyn IdentityProvider>>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct RangeQuery {
    from: Option<String>,
    to: Option<String>,
}

impl RangeQuery {
    fn range(&self) -> DateRange {
        DateRange::between(self.from.as_deref(), self.to.as_deref())
    }
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct AddPlayerBody {
    name: String,
    /// Add even if a player with the same name exists.
    #[serde(default)]
    confirm: bool,
}

#[derive(Deserialize)]
struct RenamePlayerBody {
    name: String,
}

#[derive(Deserialize)]
struct SaveSessionBody {
    date: String,
    #[serde(default)]
    attendance: Attendance,
    #[serde(default)]
    overwrite: bool,
}

#[derive(Deserialize)]
struct SaveConvocationBody {
    date: String,
    #[serde(default)]
    players: BTreeMap<PlayerId, CallUp>,
    #[serde(default)]
    overwrite: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveMatchEntryBody {
    date: String,
    player_id: PlayerId,
    #[serde(flatten)]
    stats: StatLine,
    #[serde(default)]
    overwrite: bool,
}

#[derive(Deserialize)]
struct AddRivalBody {
    name: String,
    #[serde(default)]
    field: String,
    #[serde(default)]
    shield: Option<String>,
}

#[derive(Deserialize)]
struct SaveResultsBody {
    #[serde(default)]
    matches: Vec<JourneyBlock>,
}

#[derive(Deserialize)]
struct ResetBody {
    #[serde(default)]
    confirm: bool,
    #[serde(default)]
    phrase: String,
}

#[derive(Deserialize)]
struct CloudConfigBody {
    enabled: bool,
    /// Remote connection settings as JSON text.
    #[serde(default)]
    connection: Option<String>,
}

/// Path segment: record id (e.g. /api/players/{id})
#[derive(Deserialize)]
struct IdPath {
    id: String,
}

fn error_response(e: &RosterError) -> HttpResponse {
    let body = serde_json::json!({
        "error": e.to_string(),
        "needsConfirmation": e.needs_confirmation(),
    });
    match e {
        _ if e.needs_confirmation() => HttpResponse::Conflict().json(body),
        RosterError::NotFound { .. } => HttpResponse::NotFound().json(body),
        RosterError::InvalidCredentials | RosterError::Unauthorized => HttpResponse::Unauthorized().json(body),
        RosterError::Storage(_) | RosterError::Remote(_) | RosterError::Export(_) => {
            log::error!("{}", e);
            HttpResponse::InternalServerError().json(body)
        }
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn respond<T: Serialize>(result: Result<T, RosterError>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => error_response(&e),
    }
}

fn current_user(session: &WebSession) -> Option<String> {
    session.get::<String>(USER_KEY).ok().flatten()
}

fn csv_response(filename: &str, result: Result<String, RosterError>) -> HttpResponse {
    match result {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", filename),
            ))
            .body(body),
        Err(e) => error_response(&e),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "squad-roster-web",
    })
}

/// Avoid 404 in browser tab: favicon not required for app logic.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

#[post("/api/login")]
async fn api_login(identity: IdentityState, session: WebSession, body: Json<LoginBody>) -> HttpResponse {
    let email = match identity.sign_in(&body.email, &body.password) {
        Ok(email) => email,
        Err(e) => {
            log::warn!("Failed sign-in for {}", body.email.trim());
            return error_response(&e);
        }
    };
    session.renew();
    if let Err(e) = session.insert(USER_KEY, &email) {
        log::error!("Could not store session: {}", e);
        return HttpResponse::InternalServerError().body("session error");
    }
    log::info!("{} signed in", email);
    HttpResponse::Ok().json(serde_json::json!({ "user": email }))
}

#[post("/api/logout")]
async fn api_logout(session: WebSession) -> HttpResponse {
    if let Some(user) = current_user(&session) {
        log::info!("{} signed out", user);
    }
    session.purge();
    HttpResponse::NoContent().finish()
}

#[get("/api/me")]
async fn api_me(session: WebSession) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "user": current_user(&session) }))
}

/// Full roster, settings and the last attendance date (signed-in users only).
#[get("/api/roster")]
async fn api_get_roster(state: AppState, session: WebSession) -> HttpResponse {
    if current_user(&session).is_none() {
        return error_response(&RosterError::Unauthorized);
    }
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    HttpResponse::Ok().json(serde_json::json!({
        "roster": g.view(),
        "config": g.config,
        "lastDate": g.last_selected_date(),
    }))
}

#[get("/api/stats/attendance")]
async fn api_attendance_stats(state: AppState, query: Query<RangeQuery>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    HttpResponse::Ok().json(compute_attendance_stats(&g, &query.range()))
}

#[get("/api/stats/attendance.csv")]
async fn api_attendance_csv(state: AppState, query: Query<RangeQuery>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let stats = compute_attendance_stats(&g, &query.range());
    csv_response("attendance.csv", attendance_csv(&stats))
}

#[get("/api/stats/matches")]
async fn api_match_stats(state: AppState, query: Query<RangeQuery>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    HttpResponse::Ok().json(compute_match_stats(&g, &query.range(), g.config.match_minutes))
}

#[get("/api/stats/matches.csv")]
async fn api_match_csv(state: AppState, query: Query<RangeQuery>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let rows = compute_match_stats(&g, &query.range(), g.config.match_minutes);
    csv_response("matches.csv", match_csv(&rows))
}

/// Detail view for one player: derived ratios plus non-present attendance marks.
#[get("/api/stats/players/{id}")]
async fn api_player_stats(state: AppState, path: Path<IdPath>, query: Query<RangeQuery>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let range = query.range();
    match player_detail(&g, &path.id, &range) {
        Some(detail) => HttpResponse::Ok().json(serde_json::json!({
            "detail": detail,
            "attendance": player_attendance_detail(&g, &path.id, &range),
        })),
        None => error_response(&RosterError::NotFound {
            kind: "player",
            id: path.id.clone(),
        }),
    }
}

#[post("/api/players")]
async fn api_add_player(state: AppState, session: WebSession, body: Json<AddPlayerBody>) -> HttpResponse {
    if current_user(&session).is_none() {
        return error_response(&RosterError::Unauthorized);
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    respond(add_player(&mut g, &body.name, body.confirm))
}

#[put("/api/players/{id}")]
async fn api_rename_player(
    state: AppState,
    session: WebSession,
    path: Path<IdPath>,
    body: Json<RenamePlayerBody>,
) -> HttpResponse {
    if current_user(&session).is_none() {
        return error_response(&RosterError::Unauthorized);
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    respond(rename_player(&mut g, &path.id, &body.name))
}

/// Delete a player with its attendance marks, call-ups and match entries.
#[delete("/api/players/{id}")]
async fn api_delete_player(state: AppState, session: WebSession, path: Path<IdPath>) -> HttpResponse {
    if current_user(&session).is_none() {
        return error_response(&RosterError::Unauthorized);
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    respond(delete_player(&mut g, &path.id))
}

#[post("/api/sessions")]
async fn api_save_session(state: AppState, session: WebSession, body: Json<SaveSessionBody>) -> HttpResponse {
    if current_user(&session).is_none() {
        return error_response(&RosterError::Unauthorized);
    }
    let body = body.into_inner();
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    respond(save_session(&mut g, &body.date, body.attendance, body.overwrite))
}

#[delete("/api/sessions/{id}")]
async fn api_delete_session(state: AppState, session: WebSession, path: Path<IdPath>) -> HttpResponse {
    if current_user(&session).is_none() {
        return error_response(&RosterError::Unauthorized);
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    respond(delete_session(&mut g, &path.id))
}

#[post("/api/convocations")]
async fn api_save_convocation(
    state: AppState,
    session: WebSession,
    body: Json<SaveConvocationBody>,
) -> HttpResponse {
    if current_user(&session).is_none() {
        return error_response(&RosterError::Unauthorized);
    }
    let body = body.into_inner();
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    respond(save_convocation(&mut g, &body.date, body.players, body.overwrite))
}

#[delete("/api/convocations/{id}")]
async fn api_delete_convocation(state: AppState, session: WebSession, path: Path<IdPath>) -> HttpResponse {
    if current_user(&session).is_none() {
        return error_response(&RosterError::Unauthorized);
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    respond(delete_convocation(&mut g, &path.id))
}

/// Record one player's stats for a match date (player must be called up).
#[post("/api/match-entries")]
async fn api_save_match_entry(
    state: AppState,
    session: WebSession,
    body: Json<SaveMatchEntryBody>,
) -> HttpResponse {
    if current_user(&session).is_none() {
        return error_response(&RosterError::Unauthorized);
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    respond(save_match_entry(&mut g, &body.date, &body.player_id, body.stats, body.overwrite))
}

#[delete("/api/match-entries/{id}")]
async fn api_delete_match_entry(state: AppState, session: WebSession, path: Path<IdPath>) -> HttpResponse {
    if current_user(&session).is_none() {
        return error_response(&RosterError::Unauthorized);
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    respond(delete_match_entry(&mut g, &path.id))
}

#[post("/api/rivals")]
async fn api_add_rival(state: AppState, session: WebSession, body: Json<AddRivalBody>) -> HttpResponse {
    if current_user(&session).is_none() {
        return error_response(&RosterError::Unauthorized);
    }
    let body = body.into_inner();
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    respond(add_rival(&mut g, &body.name, &body.field, body.shield))
}

/// Delete a rival and all results against it.
#[delete("/api/rivals/{id}")]
async fn api_delete_rival(state: AppState, session: WebSession, path: Path<IdPath>) -> HttpResponse {
    if current_user(&session).is_none() {
        return error_response(&RosterError::Unauthorized);
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    respond(delete_rival(&mut g, &path.id))
}

/// Replace the results against a rival with the submitted match blocks.
#[put("/api/rivals/{id}/results")]
async fn api_save_results(
    state: AppState,
    session: WebSession,
    path: Path<IdPath>,
    body: Json<SaveResultsBody>,
) -> HttpResponse {
    if current_user(&session).is_none() {
        return error_response(&RosterError::Unauthorized);
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    respond(save_match_results(&mut g, &path.id, &body.matches))
}

#[delete("/api/results/{id}")]
async fn api_delete_result(state: AppState, session: WebSession, path: Path<IdPath>) -> HttpResponse {
    if current_user(&session).is_none() {
        return error_response(&RosterError::Unauthorized);
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    respond(delete_match_result(&mut g, &path.id))
}

/// Feature settings and resolved theme colors (public: the page needs them before sign-in).
#[get("/api/config")]
async fn api_get_config(state: AppState) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    HttpResponse::Ok().json(serde_json::json!({
        "config": g.config,
        "palette": g.config.palette(),
    }))
}

#[put("/api/config")]
async fn api_update_config(state: AppState, session: WebSession, body: Json<FeatureConfig>) -> HttpResponse {
    if current_user(&session).is_none() {
        return error_response(&RosterError::Unauthorized);
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    respond(update_config(&mut g, body.into_inner()))
}

#[get("/api/cloud")]
async fn api_get_cloud(state: AppState, session: WebSession) -> HttpResponse {
    if current_user(&session).is_none() {
        return error_response(&RosterError::Unauthorized);
    }
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    HttpResponse::Ok().json(&g.cloud)
}

/// Turn cloud sync on/off; starts or stops the change feeds accordingly.
#[put("/api/cloud")]
async fn api_update_cloud(
    state: AppState,
    cloud: CloudState,
    session: WebSession,
    body: Json<CloudConfigBody>,
) -> HttpResponse {
    if current_user(&session).is_none() {
        return error_response(&RosterError::Unauthorized);
    }
    let config = {
        let mut g = match state.write() {
            Ok(guard) => guard,
            Err(_) => return HttpResponse::InternalServerError().body("lock error"),
        };
        if let Err(e) = update_cloud_config(&mut g, body.enabled, body.connection.as_deref()) {
            return error_response(&e);
        }
        g.cloud.clone()
    };
    let mut hub = match cloud.hub.lock() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match (config.enabled, hub.take()) {
        (true, None) => *hub = Some(SyncHub::start(cloud.remote.as_ref(), state.clone().into_inner())),
        (true, Some(running)) => *hub = Some(running),
        (false, Some(running)) => running.shutdown(),
        (false, None) => {}
    }
    HttpResponse::Ok().json(config)
}

/// Upload players, sessions and match entries to the cloud.
#[post("/api/sync")]
async fn api_sync(state: AppState, session: WebSession) -> HttpResponse {
    if current_user(&session).is_none() {
        return error_response(&RosterError::Unauthorized);
    }
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match sync_to_cloud(&g) {
        Ok(uploaded) => HttpResponse::Ok().json(serde_json::json!({ "uploaded": uploaded })),
        Err(e) => error_response(&e),
    }
}

#[post("/api/maintenance/clean-duplicates")]
async fn api_clean_duplicates(state: AppState, session: WebSession) -> HttpResponse {
    if current_user(&session).is_none() {
        return error_response(&RosterError::Unauthorized);
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match clean_duplicates(&mut g) {
        Ok(removed) => HttpResponse::Ok().json(serde_json::json!({ "removed": removed })),
        Err(e) => error_response(&e),
    }
}

/// Delete everything, remote and local. Needs `confirm: true` and the phrase `BORRAR`.
#[post("/api/reset")]
async fn api_reset(state: AppState, session: WebSession, body: Json<ResetBody>) -> HttpResponse {
    let user = match current_user(&session) {
        Some(user) => user,
        None => return error_response(&RosterError::Unauthorized),
    };
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match reset_all(&mut g, body.confirm, &body.phrase) {
        Ok(report) => {
            log::warn!("Full reset by {}", user);
            HttpResponse::Ok().json(report)
        }
        Err(e) => {
            log::info!("Reset by {} not confirmed", user);
            error_response(&e)
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn session_key() -> Key {
    match std::env::var("SESSION_KEY") {
        Ok(raw) => match Key::try_from(raw.as_bytes()) {
            Ok(key) => key,
            Err(_) => {
                log::warn!("SESSION_KEY is shorter than 64 bytes; using a random key");
                Key::generate()
            }
        },
        Err(_) => Key::generate(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{} (data in {})", bind.0, bind.1, data_dir);

    let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&data_dir));
    let remote = Arc::new(MemoryDocumentStore::new());
    let mut roster = Roster::new(storage).with_remote(remote.clone());
    if let Err(e) = roster.load_settings() {
        log::warn!("Could not load settings, using defaults: {}", e);
    }
    roster.load();
    let cloud_enabled = roster.cloud.enabled;

    let state: AppState = Data::new(RwLock::new(roster));
    let hub = cloud_enabled.then(|| SyncHub::start(remote.as_ref(), state.clone().into_inner()));

    // Log every collection refreshed by a remote change.
    if let Some(hub) = &hub {
        let mut changes = hub.subscribe();
        actix_web::rt::spawn(async move {
            while let Ok(changed) = changes.recv().await {
                log::info!(
                    "{} refreshed from the cloud{}",
                    changed.kind,
                    if changed.reloaded { " (reloaded from local storage)" } else { "" }
                );
            }
        });
    }

    let cloud = Data::new(CloudSync {
        remote,
        hub: Mutex::new(hub),
    });
    let identity: IdentityState = Data::new(Box::new(StaticCredentials::from_env()) as Box<dyn IdentityProvider>);
    let key = session_key();

    HttpServer::new(move || {
        App::new()
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
                    .cookie_secure(false)
                    .build(),
            )
            .app_data(state.clone())
            .app_data(cloud.clone())
            .app_data(identity.clone())
            .route("/", web::get().to(serve_index_async))
            .service(api_health)
            .service(favicon)
            .service(api_login)
            .service(api_logout)
            .service(api_me)
            .service(api_get_roster)
            .service(api_attendance_stats)
            .service(api_attendance_csv)
            .service(api_match_stats)
            .service(api_match_csv)
            .service(api_player_stats)
            .service(api_add_player)
            .service(api_rename_player)
            .service(api_delete_player)
            .service(api_save_session)
            .service(api_delete_session)
            .service(api_save_convocation)
            .service(api_delete_convocation)
            .service(api_save_match_entry)
            .service(api_delete_match_entry)
            .service(api_add_rival)
            .service(api_delete_rival)
            .service(api_save_results)
            .service(api_delete_result)
            .service(api_get_config)
            .service(api_update_config)
            .service(api_get_cloud)
            .service(api_update_cloud)
            .service(api_sync)
            .service(api_clean_duplicates)
            .service(api_reset)
            .service(Files::new("/static", "static").show_files_listing())
    })
    .bind(bind)?
    .run()
    .await
}

async fn serve_index_async() -> HttpResponse {
    let html = include_str!("../../templates/index.html");
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html)
}
