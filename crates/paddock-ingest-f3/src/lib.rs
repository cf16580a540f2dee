//! FIA F3 results pages: one table per session, entrant described by a
//! single combined cell (`<status><number><name><CODE><team>`).

use model::{EntrantRow, Series};
use paddock_ingest_core::{
    classified_position, duration_seconds, gap_seconds, lap_count, parse_entrant_cell, IngestError,
    LogicalField as F, RawTable, ResultLayout, TableSchema,
};
use serde::Deserialize;
use tracing::warn;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct F3Config {
    /// When false, a table without a driver column still yields its rows,
    /// with every entrant field empty.
    pub require_driver_info: bool,
}

impl Default for F3Config {
    fn default() -> Self {
        Self { require_driver_info: true }
    }
}

pub struct F3Layout {
    cfg: F3Config,
}

impl F3Layout {
    pub fn new(cfg: F3Config) -> Self { Self { cfg } }
}

impl ResultLayout for F3Layout {
    fn series(&self) -> Series {
        Series::F3
    }

    fn parse_table(&self, table: &RawTable) -> Result<Vec<EntrantRow>, IngestError> {
        let optional = [F::Position, F::Laps, F::Time, F::BestLap, F::Gap];
        let schema = match TableSchema::resolve(table, &[F::DriverInfo], &optional) {
            Ok(s) => s,
            Err(e @ IngestError::MissingColumn { .. }) if !self.cfg.require_driver_info => {
                warn!(error = %e, "reading table without entrant details");
                TableSchema::resolve(table, &[], &optional)?
            }
            Err(e) => return Err(e),
        };

        let session = self.canonical_session(&table.session_label());
        let rows = table
            .rows
            .iter()
            .map(|cells| {
                let p = parse_entrant_cell(schema.cell(cells, F::DriverInfo).unwrap_or(""));
                EntrantRow {
                    status: p.status,
                    car_number: p.car_number,
                    driver_name: p.driver_name,
                    driver_code: p.driver_code,
                    team_name: p.team_name,
                    position: schema.cell(cells, F::Position).and_then(classified_position),
                    laps_completed: schema.cell(cells, F::Laps).and_then(lap_count),
                    race_time_seconds: schema.cell(cells, F::Time).and_then(duration_seconds),
                    best_lap_seconds: schema.cell(cells, F::BestLap).and_then(duration_seconds),
                    gap_seconds: schema.cell(cells, F::Gap).and_then(gap_seconds),
                    ..table.entrant_template(session.clone())
                }
            })
            .collect();
        Ok(rows)
    }
}
