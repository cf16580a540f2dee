//! Session labelling and the race / non-race split.

use crate::RawTable;
use model::EntrantRow;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionKind {
    Race,
    Qualifying,
    Practice,
    Standings,
    Other,
}

/// Label shape of official race classifications: `<prefix><round><suffix>`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct RacePattern {
    pub prefix: String,
    pub suffix: String,
}

impl Default for RacePattern {
    fn default() -> Self {
        Self { prefix: "ROUND".into(), suffix: "Summary".into() }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SessionClassifier {
    pattern: RacePattern,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionSplit {
    /// Official race classification rows.
    pub races: Vec<EntrantRow>,
    /// Practice, qualifying, standings and unlabelled tables.
    pub sessions: Vec<EntrantRow>,
}

impl SessionClassifier {
    pub fn new(pattern: RacePattern) -> Self {
        Self { pattern }
    }

    /// Round number of a race classification label, `None` for anything else.
    pub fn round(&self, label: &str) -> Option<u32> {
        let digits = label
            .trim()
            .strip_prefix(self.pattern.prefix.as_str())?
            .strip_suffix(self.pattern.suffix.as_str())?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    pub fn kind(&self, label: &str) -> SessionKind {
        if self.round(label).is_some() {
            return SessionKind::Race;
        }
        let l = label.to_lowercase();
        if l.contains("standings") {
            SessionKind::Standings
        } else if l.contains("qualif") {
            SessionKind::Qualifying
        } else if l.contains("practice") {
            SessionKind::Practice
        } else {
            SessionKind::Other
        }
    }

    pub fn is_race(&self, label: &str) -> bool {
        self.kind(label) == SessionKind::Race
    }

    /// Splits rows into race classifications and everything else, keeping
    /// input order on both sides.
    pub fn split(&self, rows: Vec<EntrantRow>) -> SessionSplit {
        let mut out = SessionSplit::default();
        let mut per_kind: BTreeMap<SessionKind, usize> = BTreeMap::new();
        for r in rows {
            let kind = self.kind(&r.session_type);
            *per_kind.entry(kind).or_default() += 1;
            if kind == SessionKind::Race {
                out.races.push(r);
            } else {
                out.sessions.push(r);
            }
        }
        for (kind, n) in &per_kind {
            debug!(?kind, rows = n, "session rows");
        }
        info!(races = out.races.len(), sessions = out.sessions.len(), "split sessions");
        out
    }
}

/// Matches section headers to the tables of one page in document order.
/// Tables past the last header get `Session_<index>`; tables that already
/// carry a label keep it.
pub fn label_page_tables(tables: Vec<RawTable>, headers: &[String]) -> Vec<RawTable> {
    tables
        .into_iter()
        .enumerate()
        .map(|(i, mut t)| {
            t.table_index = i;
            if t.session_type.is_none() {
                t.session_type = Some(match headers.get(i) {
                    Some(h) if !h.trim().is_empty() => h.trim().to_string(),
                    _ => format!("Session_{i}"),
                });
            }
            t
        })
        .collect()
}
