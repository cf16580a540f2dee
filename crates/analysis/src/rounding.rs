//! Presentation rounding. Every published float goes through `round` once,
//! after all aggregates have been computed at full precision.

use model::{DriverSeasonSummary, EntrantRow, FeatureRow, SessionPositionSummary, TeamSeasonSummary};

/// Past this an f64 carries no more decimal digits; larger settings are clamped.
pub const MAX_DECIMALS: u32 = 12;

/// Fixed-decimal rounding for published tables. Runs after every aggregate.
pub trait Presentable {
    fn rounded(self, decimals: u32) -> Self;
}

pub fn round_for_presentation<T: Presentable>(rows: Vec<T>, decimals: u32) -> Vec<T> {
    rows.into_iter().map(|r| r.rounded(decimals)).collect()
}

fn round(v: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals.min(MAX_DECIMALS) as i32);
    let r = (v * scale).round() / scale;
    // no "-0" in the output
    if r == 0.0 { 0.0 } else { r }
}

fn round_opt(v: &mut Option<f64>, decimals: u32) {
    if let Some(x) = v {
        *x = round(*x, decimals);
    }
}

impl Presentable for FeatureRow {
    fn rounded(mut self, d: u32) -> Self {
        for v in [
            &mut self.race_time_seconds,
            &mut self.best_lap_seconds,
            &mut self.gap_seconds,
            &mut self.winner_time_seconds,
            &mut self.best_race_lap_seconds,
            &mut self.time_from_winner_seconds,
            &mut self.best_lap_from_best_seconds,
            &mut self.relative_laps,
            &mut self.avg_lap_time_seconds,
            &mut self.race_avg_lap_time_seconds,
            &mut self.lap_vs_race_avg,
            &mut self.team_avg_position,
            &mut self.team_speed_index,
            &mut self.driver_speed_index,
            &mut self.driver_top10_rate,
            &mut self.driver_vs_team,
        ] {
            round_opt(v, d);
        }
        self
    }
}

impl Presentable for EntrantRow {
    fn rounded(mut self, d: u32) -> Self {
        round_opt(&mut self.race_time_seconds, d);
        round_opt(&mut self.best_lap_seconds, d);
        round_opt(&mut self.gap_seconds, d);
        self
    }
}

impl Presentable for DriverSeasonSummary {
    fn rounded(mut self, d: u32) -> Self {
        self.top10_rate = round(self.top10_rate, d);
        self.dnf_rate = round(self.dnf_rate, d);
        self.clean_race_rate = round(self.clean_race_rate, d);
        for v in [
            &mut self.avg_position,
            &mut self.position_std,
            &mut self.avg_gap_to_winner_seconds,
            &mut self.speed_index,
            &mut self.avg_best_lap_seconds,
            &mut self.driver_vs_team_speed,
        ] {
            round_opt(v, d);
        }
        self
    }
}

impl Presentable for TeamSeasonSummary {
    fn rounded(mut self, d: u32) -> Self {
        self.dnf_rate = round(self.dnf_rate, d);
        round_opt(&mut self.avg_position, d);
        round_opt(&mut self.speed_index, d);
        self
    }
}

impl Presentable for SessionPositionSummary {
    fn rounded(mut self, d: u32) -> Self {
        round_opt(&mut self.avg_position, d);
        self
    }
}
