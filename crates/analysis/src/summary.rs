//! Season tables per driver and per team: results, reliability, consistency
//! and pace. Inputs are unrounded feature rows, except for the session
//! position table which reads the non-race entrant rows.

use crate::{group_first_seen, mean, stddev};
use model::{DriverSeasonSummary, EntrantRow, FeatureRow, SessionPositionSummary, TeamSeasonSummary};
use std::collections::HashSet;
use tracing::debug;

pub fn driver_season_summaries(rows: &[FeatureRow]) -> Vec<DriverSeasonSummary> {
    let keyed: Vec<(usize, (i32, String))> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.driver_name.clone().map(|d| (i, (r.season, d))))
        .collect();

    let mut out: Vec<DriverSeasonSummary> = group_first_seen(&keyed, |(_, k)| k.clone())
        .into_iter()
        .map(|((season, driver_name), idx)| {
            let group: Vec<&FeatureRow> = idx.iter().map(|&j| &rows[keyed[j].0]).collect();
            driver_summary(season, driver_name, &group)
        })
        .collect();
    out.sort_by_key(|s| s.season);
    debug!(drivers = out.len(), "driver season summaries");
    out
}

fn driver_summary(season: i32, driver_name: String, group: &[&FeatureRow]) -> DriverSeasonSummary {
    let races = group.len() as u32;
    let positions: Vec<u32> = group.iter().filter_map(|r| r.position).collect();
    let finishes = group.iter().filter(|r| r.finished).count() as u32;
    let top10 = positions.iter().filter(|&&p| p <= 10).count() as u32;
    let dnf_count = races - finishes;
    let dnf_rate = ratio(dnf_count, races);

    let team_name = most_frequent(group.iter().filter_map(|r| r.team_name.as_deref()));
    let speed_index = mean(group.iter().map(|r| r.avg_lap_time_seconds));
    let team_speed = team_name.as_deref().and_then(|t| {
        group
            .iter()
            .find(|r| r.team_name.as_deref() == Some(t))
            .and_then(|r| r.team_speed_index)
    });
    let pos_f: Vec<f64> = positions.iter().map(|&p| p as f64).collect();

    DriverSeasonSummary {
        season,
        driver_name,
        driver_code: group.iter().find_map(|r| r.driver_code.clone()),
        team_name,
        races,
        finishes,
        wins: positions.iter().filter(|&&p| p == 1).count() as u32,
        podiums: positions.iter().filter(|&&p| p <= 3).count() as u32,
        top10_rate: ratio(top10, races),
        dnf_count,
        dnf_rate,
        clean_race_rate: 1.0 - dnf_rate,
        avg_position: mean(pos_f.iter().copied().map(Some)),
        best_position: positions.iter().copied().min(),
        position_std: stddev(&pos_f),
        avg_gap_to_winner_seconds: mean(group.iter().map(|r| r.time_from_winner_seconds)),
        speed_index,
        avg_best_lap_seconds: mean(group.iter().map(|r| r.best_lap_seconds)),
        total_laps: group.iter().filter_map(|r| r.laps_completed).sum(),
        driver_vs_team_speed: speed_index.zip(team_speed).map(|(d, t)| d - t),
    }
}

pub fn team_season_summaries(rows: &[FeatureRow]) -> Vec<TeamSeasonSummary> {
    let keyed: Vec<(usize, (i32, String))> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.team_name.clone().map(|t| (i, (r.season, t))))
        .collect();

    let mut out: Vec<TeamSeasonSummary> = group_first_seen(&keyed, |(_, k)| k.clone())
        .into_iter()
        .map(|((season, team_name), idx)| {
            let group: Vec<&FeatureRow> = idx.iter().map(|&j| &rows[keyed[j].0]).collect();
            let entries = group.len() as u32;
            let drivers: HashSet<&str> = group.iter().filter_map(|r| r.driver_name.as_deref()).collect();
            let positions: Vec<u32> = group.iter().filter_map(|r| r.position).collect();
            let non_finishes = group.iter().filter(|r| !r.finished).count() as u32;
            TeamSeasonSummary {
                season,
                team_name,
                entries,
                drivers: drivers.len() as u32,
                wins: positions.iter().filter(|&&p| p == 1).count() as u32,
                podiums: positions.iter().filter(|&&p| p <= 3).count() as u32,
                avg_position: mean(positions.iter().map(|&p| Some(p as f64))),
                speed_index: mean(group.iter().map(|r| r.avg_lap_time_seconds)),
                dnf_rate: ratio(non_finishes, entries),
            }
        })
        .collect();
    out.sort_by_key(|s| s.season);
    debug!(teams = out.len(), "team season summaries");
    out
}

/// Average and best printed position per (season, driver, session type).
pub fn session_position_summaries(rows: &[EntrantRow]) -> Vec<SessionPositionSummary> {
    let keyed: Vec<(usize, (i32, String, String))> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, r)| {
            r.driver_name
                .clone()
                .map(|d| (i, (r.season, d, r.session_type.clone())))
        })
        .collect();

    let mut out: Vec<SessionPositionSummary> = group_first_seen(&keyed, |(_, k)| k.clone())
        .into_iter()
        .map(|((season, driver_name, session_type), idx)| {
            let positions: Vec<u32> = idx.iter().filter_map(|&j| rows[keyed[j].0].position).collect();
            SessionPositionSummary {
                season,
                driver_name,
                session_type,
                entries: idx.len() as u32,
                classified: positions.len() as u32,
                avg_position: mean(positions.iter().map(|&p| Some(p as f64))),
                best_position: positions.iter().copied().min(),
            }
        })
        .collect();
    out.sort_by_key(|s| s.season);
    debug!(groups = out.len(), "session position summaries");
    out
}

fn ratio(n: u32, d: u32) -> f64 {
    if d == 0 { 0.0 } else { n as f64 / d as f64 }
}

/// Ties go to the value seen first.
fn most_frequent<'a, I: Iterator<Item = &'a str>>(values: I) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for v in values {
        match counts.iter_mut().find(|(k, _)| *k == v) {
            Some((_, n)) => *n += 1,
            None => counts.push((v, 1)),
        }
    }
    let mut best: Option<(&str, usize)> = None;
    for (k, n) in counts {
        if best.map_or(true, |(_, bn)| n > bn) {
            best = Some((k, n));
        }
    }
    best.map(|(k, _)| k.to_string())
}
