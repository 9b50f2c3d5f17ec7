//! Roster business logic: validation, statistics, export, and the local-first operations.

mod calendar;
mod cloud;
mod export;
mod matches;
mod mirror;
mod players;
mod stats;
mod training;
mod validation;

pub use calendar::{add_rival, delete_match_result, delete_rival, save_match_results, RivalRemoval};
pub use cloud::{
    clean_duplicates, reset_all, sync_to_cloud, update_cloud_config, update_config, ResetReport, RESET_PHRASE,
};
pub use export::{attendance_csv, match_csv};
pub use matches::{delete_convocation, delete_match_entry, save_convocation, save_match_entry};
pub use mirror::Saved;
pub use players::{add_player, delete_player, rename_player};
pub use stats::{
    compute_attendance_stats, compute_match_stats, detailed_player_stats, minutes_percent,
    player_attendance_detail, player_detail, AttendanceMark, AttendanceRow, AttendanceStats, DateRange,
    MatchRow, PlayerDetail,
};
pub use training::{delete_session, save_session};
pub use validation::{
    check_convocated, validate_convocation, validate_date, validate_journeys, JourneyBlock, DATE_FORMAT,
};
