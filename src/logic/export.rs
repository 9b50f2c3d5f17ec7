//! CSV export of the statistics tables.

use crate::logic::stats::{AttendanceStats, MatchRow};
use crate::models::RosterError;
use csv::Writer;

fn export_err(e: impl std::fmt::Display) -> RosterError {
    RosterError::Export(e.to_string())
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String, RosterError> {
    let bytes = writer.into_inner().map_err(export_err)?;
    String::from_utf8(bytes).map_err(export_err)
}

/// Attendance table: one header row, one row per player.
pub fn attendance_csv(stats: &AttendanceStats) -> Result<String, RosterError> {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record(["Player", "Sessions", "A", "F", "FJ", "T"])
        .map_err(export_err)?;
    for row in &stats.rows {
        wtr.write_record([
            row.name.clone(),
            row.total.to_string(),
            row.present.to_string(),
            row.absent.to_string(),
            row.justified.to_string(),
            row.late.to_string(),
        ])
        .map_err(export_err)?;
    }
    finish(wtr)
}

/// Match table, `percent` written with a trailing `%`.
pub fn match_csv(rows: &[MatchRow]) -> Result<String, RosterError> {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record([
        "Player",
        "Goals",
        "Assists",
        "Yellows",
        "Reds",
        "Minutes",
        "Convocations",
        "Minutes %",
    ])
    .map_err(export_err)?;
    for row in rows {
        wtr.write_record([
            row.name.clone(),
            row.goals.to_string(),
            row.assists.to_string(),
            row.yellows.to_string(),
            row.reds.to_string(),
            row.minutes.to_string(),
            row.convocations.to_string(),
            format!("{}%", row.percent),
        ])
        .map_err(export_err)?;
    }
    finish(wtr)
}
