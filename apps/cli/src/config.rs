use analysis::MAX_DECIMALS;
use anyhow::{Context, Result};
use model::Series;
use paddock_ingest_core::RacePattern;
use paddock_ingest_f3::F3Config;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub series: Series,
    /// Raw result archive (CSV).
    pub input: Option<PathBuf>,
    /// Section headers for archives without session labels.
    pub headers: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub race_session: RacePattern,
    pub decimals: u32,
    pub write_sessions: bool,
    pub write_summaries: bool,
    pub write_ndjson: bool,
    pub log_level: String,
    pub f3: F3Config,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            series: Series::F3,
            input: None,
            headers: None,
            output_dir: PathBuf::from("out"),
            race_session: RacePattern::default(),
            decimals: 3,
            write_sessions: true,
            write_summaries: true,
            write_ndjson: false,
            log_level: "info".into(),
            f3: F3Config::default(),
        }
    }
}

/// Command-line values that win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub series: Option<Series>,
    pub input: Option<PathBuf>,
    pub headers: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut cfg: Self =
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
        if cfg.decimals > MAX_DECIMALS {
            tracing::warn!(decimals = cfg.decimals, max = MAX_DECIMALS, "decimals clamped");
            cfg.decimals = MAX_DECIMALS;
        }
        Ok(cfg)
    }

    pub fn with_overrides(mut self, o: Overrides) -> Self {
        if let Some(s) = o.series {
            self.series = s;
        }
        if o.input.is_some() {
            self.input = o.input;
        }
        if o.headers.is_some() {
            self.headers = o.headers;
        }
        if let Some(d) = o.output_dir {
            self.output_dir = d;
        }
        self
    }
}

/// `<config_dir>/paddock/config.toml`, when it exists.
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir()
        .map(|d| d.join("paddock").join("config.toml"))
        .filter(|p| p.exists())
}

/// An explicit path (flag or `PADDOCK_CONFIG`) must load; the per-user file
/// is optional and built-in defaults cover the rest.
pub fn load(explicit: Option<&Path>) -> Result<PipelineConfig> {
    match explicit.map(Path::to_path_buf).or_else(default_config_path) {
        Some(p) => PipelineConfig::from_file(&p),
        None => Ok(PipelineConfig::default()),
    }
}

pub fn parse_series(s: &str) -> Result<Series, String> {
    match s.trim().to_lowercase().as_str() {
        "f1" => Ok(Series::F1),
        "f2" => Ok(Series::F2),
        "f3" => Ok(Series::F3),
        other => Err(format!("unknown series `{other}` (expected f1, f2 or f3)")),
    }
}
