//! Row types shared by the ingest, analysis and io crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Series {
    F1,
    F2,
    F3,
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Series::F1 => f.write_str("f1"),
            Series::F2 => f.write_str("f2"),
            Series::F3 => f.write_str("f3"),
        }
    }
}

/// Entrant status code. Any status at all marks the entrant as a non-finisher;
/// only the three well-known codes get their own flag column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Dnf,
    Dns,
    Dsq,
    Other(String),
}

impl Status {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "DNF" => Status::Dnf,
            "DNS" => Status::Dns,
            "DSQ" => Status::Dsq,
            other => Status::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Status::Dnf => "DNF",
            Status::Dns => "DNS",
            Status::Dsq => "DSQ",
            Status::Other(s) => s,
        }
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        Status::from_code(&s)
    }
}

impl From<Status> for String {
    fn from(s: Status) -> Self {
        s.code().to_string()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Grouping key of one classification table: (season, race_id, session_type).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RaceKey {
    pub season: i32,
    pub race_id: String,
    pub session_type: String,
}

/// One entrant of one session table. `position` holds the printed
/// classification until the position resolver re-ranks race rows; `finished`
/// is only set by the resolver.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct EntrantRow {
    pub season: i32,
    pub race_id: String,
    pub session_type: String,
    pub status: Option<Status>,
    pub car_number: Option<u32>,
    pub driver_name: Option<String>,
    pub driver_code: Option<String>,
    pub team_name: Option<String>,
    pub laps_completed: Option<u32>,
    pub race_time_seconds: Option<f64>,
    pub best_lap_seconds: Option<f64>,
    pub gap_seconds: Option<f64>,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub finished: bool,
}

impl EntrantRow {
    pub fn race_key(&self) -> RaceKey {
        RaceKey {
            season: self.season,
            race_id: self.race_id.clone(),
            session_type: self.session_type.clone(),
        }
    }

    /// Rows the entrant parser could not fully decompose.
    pub fn is_problem(&self) -> bool {
        self.driver_code.is_none() || self.car_number.is_none()
    }
}

/// Published fact table row: the entrant columns plus every derived metric.
/// Field order is the column order of the output table.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct FeatureRow {
    pub season: i32,
    pub race_id: String,
    pub session_type: String,
    pub session_round: Option<u32>,
    pub status: Option<Status>,
    pub car_number: Option<u32>,
    pub driver_name: Option<String>,
    pub driver_code: Option<String>,
    pub team_name: Option<String>,
    pub laps_completed: Option<u32>,
    pub race_time_seconds: Option<f64>,
    pub best_lap_seconds: Option<f64>,
    pub gap_seconds: Option<f64>,
    pub position: Option<u32>,
    pub finished: bool,
    pub is_dnf: bool,
    pub is_dns: bool,
    pub is_dsq: bool,

    // per race
    pub winner_time_seconds: Option<f64>,
    pub best_race_lap_seconds: Option<f64>,
    pub race_max_laps: Option<u32>,
    pub time_from_winner_seconds: Option<f64>,
    pub best_lap_from_best_seconds: Option<f64>,
    pub relative_laps: Option<f64>,
    pub avg_lap_time_seconds: Option<f64>,
    pub race_avg_lap_time_seconds: Option<f64>,
    pub lap_vs_race_avg: Option<f64>,

    // per season
    pub team_avg_position: Option<f64>,
    pub team_speed_index: Option<f64>,
    pub driver_speed_index: Option<f64>,
    pub driver_top10_rate: Option<f64>,
    pub driver_vs_team: Option<f64>,
}

impl FeatureRow {
    /// Copies the entrant columns; every derived column starts empty.
    pub fn from_entrant(e: &EntrantRow) -> Self {
        Self {
            season: e.season,
            race_id: e.race_id.clone(),
            session_type: e.session_type.clone(),
            status: e.status.clone(),
            car_number: e.car_number,
            driver_name: e.driver_name.clone(),
            driver_code: e.driver_code.clone(),
            team_name: e.team_name.clone(),
            laps_completed: e.laps_completed,
            race_time_seconds: e.race_time_seconds,
            best_lap_seconds: e.best_lap_seconds,
            gap_seconds: e.gap_seconds,
            position: e.position,
            finished: e.finished,
            ..Default::default()
        }
    }

    /// Strips the derived columns again.
    pub fn entrant(&self) -> EntrantRow {
        EntrantRow {
            season: self.season,
            race_id: self.race_id.clone(),
            session_type: self.session_type.clone(),
            status: self.status.clone(),
            car_number: self.car_number,
            driver_name: self.driver_name.clone(),
            driver_code: self.driver_code.clone(),
            team_name: self.team_name.clone(),
            laps_completed: self.laps_completed,
            race_time_seconds: self.race_time_seconds,
            best_lap_seconds: self.best_lap_seconds,
            gap_seconds: self.gap_seconds,
            position: self.position,
            finished: self.finished,
        }
    }

    pub fn race_key(&self) -> RaceKey {
        RaceKey {
            season: self.season,
            race_id: self.race_id.clone(),
            session_type: self.session_type.clone(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct DriverSeasonSummary {
    pub season: i32,
    pub driver_name: String,
    pub driver_code: Option<String>,
    pub team_name: Option<String>,
    pub races: u32,
    pub finishes: u32,
    pub wins: u32,
    pub podiums: u32,
    pub top10_rate: f64,
    pub dnf_count: u32,
    pub dnf_rate: f64,
    pub clean_race_rate: f64,
    pub avg_position: Option<f64>,
    pub best_position: Option<u32>,
    pub position_std: Option<f64>,
    pub avg_gap_to_winner_seconds: Option<f64>,
    pub speed_index: Option<f64>,
    pub avg_best_lap_seconds: Option<f64>,
    pub total_laps: u32,
    pub driver_vs_team_speed: Option<f64>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct TeamSeasonSummary {
    pub season: i32,
    pub team_name: String,
    pub entries: u32,
    pub drivers: u32,
    pub wins: u32,
    pub podiums: u32,
    pub avg_position: Option<f64>,
    pub speed_index: Option<f64>,
    pub dnf_rate: f64,
}

/// A driver's printed classification in one non-race session kind
/// (practice, qualifying) over a season.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct SessionPositionSummary {
    pub season: i32,
    pub driver_name: String,
    pub session_type: String,
    pub entries: u32,
    pub classified: u32,
    pub avg_position: Option<f64>,
    pub best_position: Option<u32>,
}

/// Written next to the output tables of every run.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct RunManifest {
    #[serde(with = "uuid::serde::simple")]
    pub run_id: Uuid,
    pub generated_at: String,
    pub series: Series,
    pub input: String,
    pub ingested_rows: usize,
    pub session_rows: usize,
    pub feature_rows: usize,
    pub problem_rows: usize,
    pub races_without_finishers: usize,
}
