//! FIA F2 per-session exports: separate driver / team columns, one file per
//! session kind (`Free-Practice`, `Qualifying-Session`, `Sprint-Race`,
//! `Sprint-Race-2`, `Feature-Race`).

use model::{EntrantRow, Series, Status};
use paddock_ingest_core::{
    classified_position, duration_seconds, gap_seconds, lap_count, IngestError, LogicalField as F,
    RacePattern, RawTable, ResultLayout, TableSchema,
};
use serde::Deserialize;
use tracing::debug;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct F2Config {
    pub race_pattern: RacePattern,
}

pub struct F2Layout {
    cfg: F2Config,
}

impl F2Layout {
    pub fn new(cfg: F2Config) -> Self { Self { cfg } }

    fn race_label(&self, round: u32) -> String {
        format!("{}{}{}", self.cfg.race_pattern.prefix, round, self.cfg.race_pattern.suffix)
    }
}

impl ResultLayout for F2Layout {
    fn series(&self) -> Series {
        Series::F2
    }

    /// Sprint races are rounds 1 and 2 of an event, the feature race round 3.
    fn canonical_session(&self, label: &str) -> String {
        let key = label.trim().to_lowercase().replace(&['-', ' '][..], "_");
        let round = match key.as_str() {
            "sprint_race" | "sprint_race1" | "sprint_race_1" => 1,
            "sprint_race2" | "sprint_race_2" => 2,
            "feature_race" => 3,
            _ => return label.trim().to_string(),
        };
        let canonical = self.race_label(round);
        debug!(session = label, canonical = %canonical, "mapped race session");
        canonical
    }

    fn parse_table(&self, table: &RawTable) -> Result<Vec<EntrantRow>, IngestError> {
        let schema = TableSchema::resolve(
            table,
            &[F::Driver],
            &[F::Team, F::CarNumber, F::Code, F::Position, F::Laps, F::Time, F::BestLap, F::Gap],
        )?;
        let session = self.canonical_session(&table.session_label());

        let rows = table
            .rows
            .iter()
            .map(|cells| {
                let pos = schema.cell(cells, F::Position);
                let time = schema.cell(cells, F::Time);
                EntrantRow {
                    status: status_of(pos, time),
                    // race rows are re-ranked later; other sessions keep the printed order
                    position: pos.and_then(classified_position),
                    car_number: schema.cell(cells, F::CarNumber).and_then(|n| n.parse().ok()),
                    driver_name: schema.cell(cells, F::Driver).map(str::to_string),
                    driver_code: schema.cell(cells, F::Code).map(str::to_uppercase),
                    team_name: schema.cell(cells, F::Team).map(str::to_string),
                    laps_completed: schema.cell(cells, F::Laps).and_then(lap_count),
                    race_time_seconds: time.and_then(duration_seconds),
                    best_lap_seconds: schema.cell(cells, F::BestLap).and_then(duration_seconds),
                    gap_seconds: schema.cell(cells, F::Gap).and_then(gap_seconds),
                    ..table.entrant_template(session.clone())
                }
            })
            .collect();
        Ok(rows)
    }
}

/// A non-numeric position cell carries the status; failing that, a status
/// word in the time column.
fn status_of(pos: Option<&str>, time: Option<&str>) -> Option<Status> {
    let word = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_uppercase());
    let code = pos
        .filter(|p| word(*p))
        .or_else(|| time.filter(|t| matches!(*t, "DNF" | "DNS" | "DSQ" | "RET")))?;
    Some(match code {
        "RET" => Status::Dnf,
        other => Status::from_code(other),
    })
}
