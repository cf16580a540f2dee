//! Stage wiring: raw tables in, published tables and a manifest out.

use crate::config::PipelineConfig;
use analysis::{
    derive_features, driver_season_summaries, races_without_finishers, resolve_positions,
    round_for_presentation, session_position_summaries, team_season_summaries,
};
use anyhow::{anyhow, Context, Result};
use iox::CsvArchive;
use model::{
    DriverSeasonSummary, EntrantRow, FeatureRow, RunManifest, Series, SessionPositionSummary,
    TeamSeasonSummary,
};
use paddock_ingest_core::{
    problem_rows, IngestError, RawTable, ResultLayout, ResultSource, SessionClassifier, SessionSplit,
};
use paddock_ingest_f1::{F1Config, F1Layout};
use paddock_ingest_f2::{F2Config, F2Layout};
use paddock_ingest_f3::F3Layout;
use tracing::info;

/// Everything one run publishes, already rounded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outputs {
    pub features: Vec<FeatureRow>,
    pub sessions: Vec<EntrantRow>,
    pub drivers: Vec<DriverSeasonSummary>,
    pub teams: Vec<TeamSeasonSummary>,
    pub session_positions: Vec<SessionPositionSummary>,
    pub ingested_rows: usize,
    pub problem_rows: usize,
    pub races_without_finishers: usize,
}

pub fn layout_for(cfg: &PipelineConfig) -> Box<dyn ResultLayout> {
    match cfg.series {
        Series::F1 => Box::new(F1Layout::new(F1Config { race_pattern: cfg.race_session.clone() })),
        Series::F2 => Box::new(F2Layout::new(F2Config { race_pattern: cfg.race_session.clone() })),
        Series::F3 => Box::new(F3Layout::new(cfg.f3.clone())),
    }
}

/// Parse, split, position, derive, summarize, round. Aggregates run on
/// full-precision values; only the returned tables are rounded.
pub fn process(
    layout: &dyn ResultLayout,
    classifier: &SessionClassifier,
    tables: &[RawTable],
    decimals: u32,
) -> Result<Outputs, IngestError> {
    let rows = layout.parse_tables(tables)?;
    let ingested_rows = rows.len();
    let problems = problem_rows(&rows).len();

    let SessionSplit { races, sessions } = classifier.split(rows);
    let features = derive_features(&resolve_positions(races), classifier);
    let races_without_finishers = races_without_finishers(&features);
    let drivers = driver_season_summaries(&features);
    let teams = team_season_summaries(&features);
    let session_positions = session_position_summaries(&sessions);

    Ok(Outputs {
        features: round_for_presentation(features, decimals),
        sessions: round_for_presentation(sessions, decimals),
        drivers: round_for_presentation(drivers, decimals),
        teams: round_for_presentation(teams, decimals),
        session_positions: round_for_presentation(session_positions, decimals),
        ingested_rows,
        problem_rows: problems,
        races_without_finishers,
    })
}

pub fn run(cfg: &PipelineConfig) -> Result<RunManifest> {
    let input = cfg
        .input
        .as_deref()
        .ok_or_else(|| anyhow!("no input archive: pass --input or set `input` in the config"))?;
    let mut archive = CsvArchive::new(input);
    if let Some(h) = &cfg.headers {
        archive = archive.with_headers(h);
    }
    let tables = archive.load()?;

    let layout = layout_for(cfg);
    let classifier = SessionClassifier::new(cfg.race_session.clone());
    let out = process(layout.as_ref(), &classifier, &tables, cfg.decimals)?;

    let dir = &cfg.output_dir;
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    iox::write_features_csv(&out.features, &dir.join("features.csv"))?;
    if cfg.write_sessions {
        iox::write_entrants_csv(&out.sessions, &dir.join("sessions.csv"))?;
    }
    if cfg.write_summaries {
        iox::write_summaries_csv(&out.drivers, &dir.join("driver_seasons.csv"))?;
        iox::write_summaries_csv(&out.teams, &dir.join("team_seasons.csv"))?;
        iox::write_summaries_csv(&out.session_positions, &dir.join("session_positions.csv"))?;
    }
    if cfg.write_ndjson {
        iox::write_ndjson(&out.features, &dir.join("features.ndjson"))?;
    }

    let mut manifest = iox::new_manifest(cfg.series, input)?;
    manifest.ingested_rows = out.ingested_rows;
    manifest.session_rows = out.sessions.len();
    manifest.feature_rows = out.features.len();
    manifest.problem_rows = out.problem_rows;
    manifest.races_without_finishers = out.races_without_finishers;
    iox::write_manifest(&manifest, &dir.join("manifest.json"))?;

    info!(
        run_id = %manifest.run_id.simple(),
        features = manifest.feature_rows,
        sessions = manifest.session_rows,
        out = %dir.display(),
        "run complete"
    );
    Ok(manifest)
}
