//! Logical fields and the column names each may appear under.

use crate::{IngestError, RawTable};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalField {
    Season,
    RaceId,
    SessionType,
    TableIndex,
    DriverInfo,
    Driver,
    Team,
    CarNumber,
    Position,
    Laps,
    Time,
    BestLap,
    Gap,
    PositionText,
    Milliseconds,
    FastestLapTime,
    Code,
    Forename,
    Surname,
}

impl LogicalField {
    /// Accepted (normalized) column names, most specific first.
    pub fn aliases(self) -> &'static [&'static str] {
        use LogicalField::*;
        match self {
            Season => &["season", "year"],
            RaceId => &["race_id", "raceid"],
            SessionType => &["session_type", "session"],
            TableIndex => &["table_index"],
            DriverInfo => &["driver_info", "driver", "drivers", "driver_/_team", "driver_team"],
            Driver => &["driver", "driver_name", "pilot_name", "name", "driver_full"],
            Team => &["team", "team_name", "constructor_name", "constructor", "entrant"],
            CarNumber => &["no", "no.", "car_number", "number", "car", "#"],
            Position => &["pos", "pos.", "position", "p"],
            Laps => &["laps", "laps_completed", "lap"],
            Time => &["time", "time/retired", "race_time", "total_time"],
            BestLap => &["best", "best_lap", "best_time", "fastest_lap"],
            Gap => &["gap", "interval", "diff"],
            PositionText => &["positiontext", "position_text"],
            Milliseconds => &["milliseconds", "ms"],
            FastestLapTime => &["fastestlaptime", "fastest_lap_time"],
            Code => &["code", "driver_code"],
            Forename => &["forename", "first_name"],
            Surname => &["surname", "last_name"],
        }
    }
}

impl fmt::Display for LogicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Column indices of one table, resolved once before its rows are read.
#[derive(Debug, Clone, Default)]
pub struct TableSchema {
    columns: HashMap<LogicalField, usize>,
}

impl TableSchema {
    pub fn resolve(
        table: &RawTable,
        required: &[LogicalField],
        optional: &[LogicalField],
    ) -> Result<Self, IngestError> {
        let mut columns = HashMap::new();
        for &field in required {
            match find(table, field) {
                Some(idx) => {
                    columns.insert(field, idx);
                }
                None => {
                    return Err(IngestError::MissingColumn {
                        field,
                        table: table.describe(),
                        aliases: field.aliases().join(", "),
                    })
                }
            }
        }
        for &field in optional {
            if let Some(idx) = find(table, field) {
                columns.insert(field, idx);
            }
        }
        Ok(Self { columns })
    }

    pub fn has(&self, field: LogicalField) -> bool {
        self.columns.contains_key(&field)
    }

    /// Trimmed cell text; `None` for absent columns, short rows and blanks.
    pub fn cell<'a>(&self, row: &'a [String], field: LogicalField) -> Option<&'a str> {
        let idx = *self.columns.get(&field)?;
        let v = row.get(idx)?.trim();
        if v.is_empty() {
            None
        } else {
            Some(v)
        }
    }
}

fn find(table: &RawTable, field: LogicalField) -> Option<usize> {
    field
        .aliases()
        .iter()
        .find_map(|alias| table.columns.iter().position(|c| c == alias))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_alias_present_wins() {
        let t = RawTable::new(2022, "9", &["Name", "Driver Name", "Laps"]);
        let s = TableSchema::resolve(&t, &[LogicalField::Driver], &[LogicalField::Laps]).unwrap();
        let row = vec!["x".to_string(), " Jane Doe ".to_string(), "".to_string()];
        assert_eq!(s.cell(&row, LogicalField::Driver), Some("Jane Doe"));
        assert_eq!(s.cell(&row, LogicalField::Laps), None);
        assert!(!s.has(LogicalField::Gap));
    }

    #[test]
    fn missing_required_field_is_fatal() {
        let t = RawTable::new(2022, "9", &["pos", "points"]).with_index(2);
        let err = TableSchema::resolve(&t, &[LogicalField::DriverInfo], &[]).unwrap_err();
        match err {
            IngestError::MissingColumn { field, table, .. } => {
                assert_eq!(field, LogicalField::DriverInfo);
                assert_eq!(table, "2022/9#2");
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn short_rows_read_as_missing() {
        let t = RawTable::new(2022, "9", &["driver", "time"]);
        let s = TableSchema::resolve(&t, &[LogicalField::Driver], &[LogicalField::Time]).unwrap();
        let row = vec!["A".to_string()];
        assert_eq!(s.cell(&row, LogicalField::Time), None);
    }
}
