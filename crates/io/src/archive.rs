//! Flat CSV archive of raw result tables, one row per entrant plus the
//! metadata columns that say which page and table it came from.

use anyhow::{Context, Result};
use paddock_ingest_core::{
    label_page_tables, normalize_column, IngestError, LogicalField, RawTable, ResultSource,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

type PageKey = (i32, String);

pub struct CsvArchive {
    path: PathBuf,
    headers: Option<PathBuf>,
}

#[derive(Deserialize)]
struct HeaderRow {
    season: i32,
    race_id: String,
    header: String,
}

impl CsvArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), headers: None }
    }

    /// Section headers (`season,race_id,header` in document order) for
    /// tables whose rows carry no session label.
    pub fn with_headers(mut self, path: impl Into<PathBuf>) -> Self {
        self.headers = Some(path.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tables in archive order, plus whether the archive numbers them itself.
    fn read_tables(&self) -> Result<(Vec<RawTable>, bool), IngestError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;
        let columns: Vec<String> = rdr
            .headers()
            .with_context(|| format!("reading header of {}", self.path.display()))?
            .iter()
            .map(normalize_column)
            .collect();

        let required = |field: LogicalField| {
            column(&columns, field).ok_or_else(|| IngestError::MissingColumn {
                field,
                table: self.path.display().to_string(),
                aliases: field.aliases().join(", "),
            })
        };
        let season_col = required(LogicalField::Season)?;
        let race_col = required(LogicalField::RaceId)?;
        let session_col = column(&columns, LogicalField::SessionType);
        let index_col = column(&columns, LogicalField::TableIndex);

        let meta = [Some(season_col), Some(race_col), session_col, index_col];
        let data: Vec<usize> = (0..columns.len()).filter(|i| !meta.contains(&Some(*i))).collect();
        let data_names: Vec<&str> = data.iter().map(|&i| columns[i].as_str()).collect();

        let mut tables: Vec<RawTable> = Vec::new();
        let mut current: Option<[String; 4]> = None;
        for (n, rec) in rdr.records().enumerate() {
            let rec = rec.with_context(|| format!("{}: record {}", self.path.display(), n + 1))?;
            let get = |i: Option<usize>| i.and_then(|i| rec.get(i)).unwrap_or("").trim().to_string();
            let key = [get(Some(season_col)), get(Some(race_col)), get(session_col), get(index_col)];

            if current.as_ref() != Some(&key) {
                let season = parse_season(&key[0]).ok_or_else(|| {
                    IngestError::Msg(format!(
                        "{}: record {}: invalid season `{}`",
                        self.path.display(),
                        n + 1,
                        key[0]
                    ))
                })?;
                let mut t = RawTable::new(season, key[1].clone(), &data_names);
                if !key[2].is_empty() {
                    t = t.with_session(key[2].clone());
                }
                if let Ok(i) = key[3].parse() {
                    t = t.with_index(i);
                }
                tables.push(t);
                current = Some(key);
            }
            if let Some(t) = tables.last_mut() {
                let cells: Vec<&str> = data.iter().map(|&i| rec.get(i).unwrap_or("")).collect();
                t.push_row(&cells);
            }
        }
        Ok((tables, index_col.is_some()))
    }
}

impl ResultSource for CsvArchive {
    fn load(&self) -> Result<Vec<RawTable>, IngestError> {
        let (tables, indexed) = self.read_tables()?;
        let headers = match &self.headers {
            Some(p) => read_headers(p)?,
            None => HashMap::new(),
        };

        let mut pages: Vec<(PageKey, Vec<RawTable>)> = Vec::new();
        let mut seen: HashMap<PageKey, usize> = HashMap::new();
        for t in tables {
            let key = (t.season, t.race_id.clone());
            let slot = *seen.entry(key.clone()).or_insert_with(|| {
                pages.push((key, Vec::new()));
                pages.len() - 1
            });
            pages[slot].1.push(t);
        }

        let mut out = Vec::new();
        for (key, page) in pages {
            if !indexed || page.iter().any(|t| t.session_type.is_none()) {
                let page_headers = headers.get(&key).map(Vec::as_slice).unwrap_or(&[]);
                debug!(season = key.0, race = %key.1, tables = page.len(), headers = page_headers.len(), "labelling page");
                out.extend(label_page_tables(page, page_headers));
            } else {
                out.extend(page);
            }
        }

        let rows: usize = out.iter().map(|t| t.rows.len()).sum();
        info!(path = %self.path.display(), tables = out.len(), rows, "loaded archive");
        Ok(out)
    }
}

fn column(columns: &[String], field: LogicalField) -> Option<usize> {
    field
        .aliases()
        .iter()
        .find_map(|alias| columns.iter().position(|c| c == alias))
}

fn parse_season(s: &str) -> Option<i32> {
    s.parse::<i32>().ok()
}

fn read_headers(path: &Path) -> Result<HashMap<PageKey, Vec<String>>> {
    let mut rdr = csv::Reader::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    let mut out: HashMap<PageKey, Vec<String>> = HashMap::new();
    for rec in rdr.deserialize() {
        let h: HeaderRow = rec.with_context(|| format!("reading {}", path.display()))?;
        out.entry((h.season, h.race_id)).or_default().push(h.header);
    }
    Ok(out)
}
