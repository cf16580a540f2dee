//! F1 archival base dataset: race results already joined with races,
//! drivers and constructors. Every table is one classified race.

use model::{EntrantRow, Series, Status};
use paddock_ingest_core::{
    classified_position, duration_seconds, lap_count, IngestError, LogicalField as F, RacePattern,
    RawTable, ResultLayout, TableSchema,
};
use serde::Deserialize;
use tracing::warn;

/// Null marker of the archive's CSV exports.
const ARCHIVE_NULL: &str = "\\N";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct F1Config {
    pub race_pattern: RacePattern,
}

pub struct F1Layout {
    cfg: F1Config,
}

impl F1Layout {
    pub fn new(cfg: F1Config) -> Self { Self { cfg } }
}

impl ResultLayout for F1Layout {
    fn series(&self) -> Series {
        Series::F1
    }

    // one race per event, so every result table is round 1
    fn canonical_session(&self, _label: &str) -> String {
        format!("{}1{}", self.cfg.race_pattern.prefix, self.cfg.race_pattern.suffix)
    }

    fn parse_table(&self, table: &RawTable) -> Result<Vec<EntrantRow>, IngestError> {
        let schema = TableSchema::resolve(
            table,
            &[F::PositionText, F::Laps],
            &[
                F::Milliseconds,
                F::FastestLapTime,
                F::Code,
                F::Forename,
                F::Surname,
                F::Driver,
                F::Team,
                F::CarNumber,
            ],
        )?;
        let session = self.canonical_session(&table.session_label());
        let cell = |cells: &[String], f: F| schema.cell(cells, f).filter(|v| *v != ARCHIVE_NULL).map(str::to_string);

        let rows = table
            .rows
            .iter()
            .map(|cells| {
                let driver_name = cell(cells, F::Driver).or_else(|| {
                    match (cell(cells, F::Forename), cell(cells, F::Surname)) {
                        (Some(f), Some(s)) => Some(format!("{f} {s}")),
                        (f, s) => f.or(s),
                    }
                });
                let position_text = cell(cells, F::PositionText);
                EntrantRow {
                    status: position_text.as_deref().and_then(status_of),
                    position: position_text.as_deref().and_then(classified_position),
                    car_number: cell(cells, F::CarNumber).and_then(|n| n.parse().ok()),
                    driver_name,
                    driver_code: cell(cells, F::Code),
                    team_name: cell(cells, F::Team),
                    laps_completed: cell(cells, F::Laps).and_then(|l| lap_count(&l)),
                    race_time_seconds: cell(cells, F::Milliseconds).and_then(|ms| race_seconds(&ms, table)),
                    best_lap_seconds: cell(cells, F::FastestLapTime).and_then(|t| duration_seconds(&t)),
                    gap_seconds: None,
                    ..table.entrant_template(session.clone())
                }
            })
            .collect();
        Ok(rows)
    }
}

fn race_seconds(ms: &str, table: &RawTable) -> Option<f64> {
    match ms.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Some(v / 1000.0),
        _ => {
            warn!(table = %table.describe(), value = ms, "unreadable milliseconds, race time dropped");
            None
        }
    }
}

/// `positionText`: a number for classified finishers, a letter otherwise.
fn status_of(position_text: &str) -> Option<Status> {
    if position_text.parse::<u32>().is_ok() {
        return None;
    }
    Some(match position_text {
        "R" => Status::Dnf,
        "D" | "E" => Status::Dsq,
        "W" | "F" => Status::Dns,
        "N" => Status::Other("NC".into()),
        other => {
            warn!(code = other, "unknown positionText code kept as raw status");
            Status::Other(other.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_table() -> RawTable {
        let mut t = RawTable::new(
            2021,
            "1052",
            &["raceId", "number", "positionText", "laps", "milliseconds", "fastestLapTime", "code", "forename", "surname", "constructor_name"],
        );
        t.push_row(&["1052", "44", "1", "56", "5523897", "1:34.015", "HAM", "Lewis", "Hamilton", "Mercedes"]);
        t.push_row(&["1052", "33", "2", "56", "5524642", "1:33.228", "VER", "Max", "Verstappen", "Red Bull"]);
        t.push_row(&["1052", "10", "R", "52", "\\N", "1:36.112", "GAS", "Pierre", "Gasly", "AlphaTauri"]);
        t
    }

    #[test]
    fn parses_base_dataset_rows() {
        let rows = F1Layout::new(F1Config::default()).parse_table(&base_table()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].session_type, "ROUND1Summary");
        assert_eq!(rows[0].driver_name.as_deref(), Some("Lewis Hamilton"));
        assert_eq!(rows[0].driver_code.as_deref(), Some("HAM"));
        assert_eq!(rows[0].team_name.as_deref(), Some("Mercedes"));
        assert_eq!(rows[0].car_number, Some(44));
        assert!((rows[0].race_time_seconds.unwrap() - 5523.897).abs() < 1e-6);
        assert!((rows[1].best_lap_seconds.unwrap() - 93.228).abs() < 1e-6);
        assert_eq!(rows[2].status, Some(Status::Dnf));
        assert_eq!(rows[2].race_time_seconds, None);
        assert_eq!(rows[2].laps_completed, Some(52));
        let positions: Vec<Option<u32>> = rows.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![Some(1), Some(2), None]);
    }

    #[test]
    fn bad_milliseconds_leave_time_empty() {
        let mut t = RawTable::new(2021, "1052", &["positionText", "laps", "milliseconds"]);
        t.push_row(&["1", "56", "5523897"]);
        t.push_row(&["2", "56", "5,524,642"]);
        t.push_row(&["3", "56", "-12"]);
        let rows = F1Layout::new(F1Config::default()).parse_table(&t).unwrap();
        assert!((rows[0].race_time_seconds.unwrap() - 5523.897).abs() < 1e-6);
        assert_eq!(rows[1].race_time_seconds, None);
        assert_eq!(rows[2].race_time_seconds, None);
    }

    #[test]
    fn position_text_codes() {
        assert_eq!(status_of("3"), None);
        assert_eq!(status_of("D"), Some(Status::Dsq));
        assert_eq!(status_of("W"), Some(Status::Dns));
        assert_eq!(status_of("N"), Some(Status::Other("NC".into())));
        assert_eq!(status_of("X"), Some(Status::Other("X".into())));
    }

    #[test]
    fn laps_are_required() {
        let t = RawTable::new(2021, "1052", &["positionText", "code"]);
        assert!(matches!(
            F1Layout::new(F1Config::default()).parse_table(&t),
            Err(IngestError::MissingColumn { field: F::Laps, .. })
        ));
    }
}
