//! Series-independent ingest: raw tables, cell parsers and the traits each
//! series layout implements.

pub mod entrant;
pub mod schema;
pub mod session;
pub mod timing;

use model::{EntrantRow, Series};
use tracing::{debug, info, warn};

pub use entrant::{parse_entrant_cell, ParsedEntrant};
pub use schema::{LogicalField, TableSchema};
pub use session::{label_page_tables, RacePattern, SessionClassifier, SessionKind, SessionSplit};
pub use timing::{classified_position, duration_seconds, gap_seconds, lap_count};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("table {table}: no column for required field `{field}` (looked for {aliases})")]
    MissingColumn {
        field: LogicalField,
        table: String,
        aliases: String,
    },
    #[error("{0}")]
    Msg(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Lowercase, trim, spaces to underscores.
pub fn normalize_column(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// One result table as delivered by a source, before any cell is interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub season: i32,
    pub race_id: String,
    pub session_type: Option<String>,
    /// Position of the table on its source page.
    pub table_index: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(season: i32, race_id: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            season,
            race_id: race_id.into(),
            session_type: None,
            table_index: 0,
            columns: columns.iter().map(|c| normalize_column(c)).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_session(mut self, label: impl Into<String>) -> Self {
        self.session_type = Some(label.into());
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.table_index = index;
        self
    }

    pub fn push_row<S: AsRef<str>>(&mut self, cells: &[S]) {
        self.rows.push(cells.iter().map(|c| c.as_ref().to_string()).collect());
    }

    /// The session label, or the synthetic `Session_<index>` when none was supplied.
    pub fn session_label(&self) -> String {
        match &self.session_type {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => format!("Session_{}", self.table_index),
        }
    }

    pub fn describe(&self) -> String {
        format!("{}/{}#{}", self.season, self.race_id, self.table_index)
    }

    /// An entrant row carrying only this table's identifying columns.
    pub fn entrant_template(&self, session_type: String) -> EntrantRow {
        EntrantRow {
            season: self.season,
            race_id: self.race_id.clone(),
            session_type,
            ..Default::default()
        }
    }
}

/// Anything that can hand over raw result tables (scraped pages, archives).
pub trait ResultSource {
    fn load(&self) -> Result<Vec<RawTable>, IngestError>;
}

/// Per-series interpretation of raw tables into entrant rows.
pub trait ResultLayout: Send + Sync {
    fn series(&self) -> Series;

    /// Maps a series-native session name onto the canonical race label.
    fn canonical_session(&self, label: &str) -> String {
        label.to_string()
    }

    fn parse_table(&self, table: &RawTable) -> Result<Vec<EntrantRow>, IngestError>;

    fn parse_tables(&self, tables: &[RawTable]) -> Result<Vec<EntrantRow>, IngestError> {
        let mut rows = Vec::new();
        for t in tables {
            let parsed = self.parse_table(t)?;
            debug!(table = %t.describe(), session = %t.session_label(), rows = parsed.len(), "parsed table");
            rows.extend(parsed);
        }
        let problems = problem_rows(&rows).len();
        if problems > 0 {
            warn!(problems, total = rows.len(), "rows without driver code or car number");
        }
        info!(series = %self.series(), tables = tables.len(), rows = rows.len(), "ingested");
        Ok(rows)
    }
}

/// Rows with a missing driver code or car number.
pub fn problem_rows(rows: &[EntrantRow]) -> Vec<&EntrantRow> {
    rows.iter().filter(|r| r.is_problem()).collect()
}
