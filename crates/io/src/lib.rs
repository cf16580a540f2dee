//! Sources and sinks: the raw CSV archive, published CSV / NDJSON tables and
//! the run manifest.

mod archive;

pub use archive::CsvArchive;

use anyhow::{anyhow, Context, Result};
use model::{EntrantRow, FeatureRow, RunManifest, Series};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

pub fn write_features_csv(rows: &[FeatureRow], path: &Path) -> Result<()> {
    write_csv(rows, path)
}

/// The non-race sessions table.
pub fn write_entrants_csv(rows: &[EntrantRow], path: &Path) -> Result<()> {
    write_csv(rows, path)
}

pub fn write_summaries_csv<T: Serialize + Default>(rows: &[T], path: &Path) -> Result<()> {
    write_csv(rows, path)
}

pub fn read_features_csv(path: &Path) -> Result<Vec<FeatureRow>> {
    read_csv(path)
}

fn write_csv<T: Serialize + Default>(rows: &[T], path: &Path) -> Result<()> {
    let mut w = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    if rows.is_empty() {
        // serde only emits the header together with a first record
        w.write_record(&header_of::<T>()?)?;
    }
    for r in rows {
        w.serialize(r)?;
    }
    w.flush()?;
    debug!(path = %path.display(), rows = rows.len(), "wrote csv");
    Ok(())
}

fn header_of<T: Serialize + Default>() -> Result<csv::StringRecord> {
    let mut w = csv::Writer::from_writer(vec![]);
    w.serialize(T::default())?;
    let buf = w.into_inner().map_err(|e| anyhow!("{}", e.error()))?;
    let mut rdr = csv::Reader::from_reader(buf.as_slice());
    Ok(rdr.headers()?.clone())
}

fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut rdr = csv::Reader::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    let mut out = Vec::new();
    for (n, rec) in rdr.deserialize().enumerate() {
        out.push(rec.with_context(|| format!("{}: record {}", path.display(), n + 1))?);
    }
    Ok(out)
}

pub fn write_ndjson<T: Serialize>(rows: &[T], path: &Path) -> Result<()> {
    let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut w = BufWriter::new(f);
    for r in rows {
        let s = serde_json::to_string(r)?;
        writeln!(w, "{}", s)?;
    }
    w.flush()?;
    Ok(())
}

/// A manifest with a fresh run id and timestamp; counts start at zero.
pub fn new_manifest(series: Series, input: &Path) -> Result<RunManifest> {
    Ok(RunManifest {
        run_id: Uuid::new_v4(),
        generated_at: OffsetDateTime::now_utc().format(&Rfc3339)?,
        series,
        input: input.display().to_string(),
        ingested_rows: 0,
        session_rows: 0,
        feature_rows: 0,
        problem_rows: 0,
        races_without_finishers: 0,
    })
}

pub fn write_manifest(manifest: &RunManifest, path: &Path) -> Result<()> {
    let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, manifest)?;
    writeln!(w)?;
    w.flush()?;
    Ok(())
}
