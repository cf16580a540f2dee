//! Per-race and per-season features over the positioned race table.
//!
//! Nothing here rounds. Every aggregate sees the full-precision inputs and
//! rounding is left to [`crate::round_for_presentation`].

use crate::{group_first_seen, mean};
use model::{EntrantRow, FeatureRow, Status};
use paddock_ingest_core::SessionClassifier;
use std::collections::HashMap;
use tracing::{info, warn};

/// Builds the feature table for positioned race rows. Row order is kept.
///
/// `time_from_winner_seconds` is never negative: a classified finisher whose
/// race time is below the winner's (a lapped car stopped early on the clock)
/// gets a null gap and a `warn!`.
pub fn derive_features(rows: &[EntrantRow], classifier: &SessionClassifier) -> Vec<FeatureRow> {
    let mut out: Vec<FeatureRow> = rows
        .iter()
        .map(|e| {
            let mut f = FeatureRow::from_entrant(e);
            f.session_round = classifier.round(&e.session_type);
            f.is_dnf = e.status == Some(Status::Dnf);
            f.is_dns = e.status == Some(Status::Dns);
            f.is_dsq = e.status == Some(Status::Dsq);
            f.avg_lap_time_seconds = match (e.race_time_seconds, e.laps_completed) {
                (Some(t), Some(l)) if l > 0 => Some(t / l as f64),
                _ => None,
            };
            f
        })
        .collect();

    for (key, idx) in group_first_seen(&out, |r| r.race_key()) {
        race_features(&mut out, &idx);
        if idx.iter().all(|&i| out[i].winner_time_seconds.is_none()) {
            warn!(season = key.season, race = %key.race_id, session = %key.session_type, "no winner time, gaps left empty");
        }
    }
    season_features(&mut out);

    info!(rows = out.len(), "features derived");
    out
}

fn race_features(out: &mut [FeatureRow], idx: &[usize]) {
    let winner_time = idx
        .iter()
        .map(|&i| &out[i])
        .find(|r| r.position == Some(1))
        .and_then(|r| r.race_time_seconds);
    let best_race_lap = idx
        .iter()
        .filter_map(|&i| out[i].best_lap_seconds)
        .min_by(f64::total_cmp);
    let race_max_laps = idx.iter().filter_map(|&i| out[i].laps_completed).max();
    let race_avg_lap = mean(idx.iter().map(|&i| out[i].avg_lap_time_seconds));

    for &i in idx {
        let r = &mut out[i];
        r.winner_time_seconds = winner_time;
        r.best_race_lap_seconds = best_race_lap;
        r.race_max_laps = race_max_laps;
        r.race_avg_lap_time_seconds = race_avg_lap;

        r.time_from_winner_seconds = match (r.finished, r.race_time_seconds, winner_time) {
            (true, Some(t), Some(w)) if t >= w => Some(t - w),
            (true, Some(t), Some(w)) => {
                warn!(race = %r.race_id, driver = ?r.driver_name, time = t, winner = w, "finisher faster than winner, gap dropped");
                None
            }
            _ => None,
        };
        r.best_lap_from_best_seconds = r.best_lap_seconds.zip(best_race_lap).map(|(b, best)| b - best);
        r.relative_laps = match (r.laps_completed, race_max_laps) {
            (Some(l), Some(max)) if max > 0 => Some(l as f64 / max as f64),
            _ => None,
        };
        r.lap_vs_race_avg = r.avg_lap_time_seconds.zip(race_avg_lap).map(|(a, avg)| a - avg);
    }
}

#[derive(Default)]
struct Acc {
    positions: Vec<f64>,
    laps: Vec<Option<f64>>,
    top10: usize,
    rows: usize,
}

impl Acc {
    fn add(&mut self, r: &FeatureRow) {
        self.rows += 1;
        if let Some(p) = r.position {
            self.positions.push(p as f64);
            if p <= 10 {
                self.top10 += 1;
            }
        }
        self.laps.push(r.avg_lap_time_seconds);
    }
}

fn season_features(out: &mut [FeatureRow]) {
    let mut teams: HashMap<(i32, String), Acc> = HashMap::new();
    let mut drivers: HashMap<(i32, String), Acc> = HashMap::new();
    for r in out.iter() {
        if let Some(team) = &r.team_name {
            teams.entry((r.season, team.clone())).or_default().add(r);
        }
        if let Some(driver) = &r.driver_name {
            drivers.entry((r.season, driver.clone())).or_default().add(r);
        }
    }

    let team_stats: HashMap<_, _> = teams
        .into_iter()
        .map(|(k, a)| (k, (mean(a.positions.iter().copied().map(Some)), mean(a.laps))))
        .collect();
    let driver_stats: HashMap<_, _> = drivers
        .into_iter()
        .map(|(k, a)| (k, (mean(a.laps), a.top10 as f64 / a.rows as f64)))
        .collect();

    for r in out.iter_mut() {
        if let Some(team) = &r.team_name {
            if let Some(&(avg_pos, speed)) = team_stats.get(&(r.season, team.clone())) {
                r.team_avg_position = avg_pos;
                r.team_speed_index = speed;
            }
        }
        if let Some(driver) = &r.driver_name {
            if let Some(&(speed, top10)) = driver_stats.get(&(r.season, driver.clone())) {
                r.driver_speed_index = speed;
                r.driver_top10_rate = Some(top10);
            }
        }
        r.driver_vs_team = r.avg_lap_time_seconds.zip(r.team_speed_index).map(|(a, t)| a - t);
    }
}

/// Race groups in which nobody was classified as a finisher.
pub fn races_without_finishers(rows: &[FeatureRow]) -> usize {
    group_first_seen(rows, |r| r.race_key())
        .into_iter()
        .filter(|(_, idx)| idx.iter().all(|&i| !rows[i].finished))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve_positions;

    const EPS: f64 = 1e-6;

    fn close(a: Option<f64>, b: f64) -> bool {
        a.map(|a| (a - b).abs() < EPS).unwrap_or(false)
    }

    fn row(race: &str, driver: &str, team: &str, laps: Option<u32>, time: Option<f64>, status: Option<Status>) -> EntrantRow {
        EntrantRow {
            season: 2024,
            race_id: race.into(),
            session_type: "ROUND2Summary".into(),
            driver_name: Some(driver.into()),
            team_name: Some(team.into()),
            laps_completed: laps,
            race_time_seconds: time,
            status,
            ..Default::default()
        }
    }

    fn derive(rows: Vec<EntrantRow>) -> Vec<FeatureRow> {
        derive_features(&resolve_positions(rows), &SessionClassifier::default())
    }

    #[test]
    fn per_race_columns() {
        let mut a = row("1", "A", "T1", Some(28), Some(2429.021), None);
        a.best_lap_seconds = Some(85.5);
        let mut b = row("1", "B", "T2", Some(28), Some(2435.5), None);
        b.best_lap_seconds = Some(85.0);
        let mut c = row("1", "C", "T1", Some(10), None, Some(Status::Dnf));
        c.best_lap_seconds = Some(86.0);
        let f = derive(vec![a, b, c]);

        assert_eq!(f[0].session_round, Some(2));
        for r in &f {
            assert!(close(r.winner_time_seconds, 2429.021));
            assert!(close(r.best_race_lap_seconds, 85.0));
            assert_eq!(r.race_max_laps, Some(28));
        }
        assert_eq!(f[0].time_from_winner_seconds, Some(0.0));
        assert!(close(f[1].time_from_winner_seconds, 6.479));
        assert_eq!(f[2].time_from_winner_seconds, None);
        assert!(close(f[0].best_lap_from_best_seconds, 0.5));
        assert!(close(f[2].best_lap_from_best_seconds, 1.0));
        assert!(close(f[2].relative_laps, 10.0 / 28.0));
        assert!(close(f[0].relative_laps, 1.0));
        assert!(close(f[0].avg_lap_time_seconds, 2429.021 / 28.0));
        assert_eq!(f[2].avg_lap_time_seconds, None);
        assert!(f[2].is_dnf && !f[2].is_dns && !f[2].is_dsq && !f[2].finished);
        let race_avg = (2429.021 / 28.0 + 2435.5 / 28.0) / 2.0;
        assert!(close(f[0].race_avg_lap_time_seconds, race_avg));
        assert!(close(f[1].lap_vs_race_avg, 2435.5 / 28.0 - race_avg));
    }

    #[test]
    fn race_without_finishers_has_no_gaps() {
        let f = derive(vec![
            row("5", "A", "T1", Some(3), None, Some(Status::Dnf)),
            row("5", "B", "T2", None, None, Some(Status::Dns)),
        ]);
        assert!(f.iter().all(|r| r.winner_time_seconds.is_none() && r.time_from_winner_seconds.is_none()));
        assert!(f[1].is_dns);
        assert_eq!(f[1].relative_laps, None);
        assert_eq!(races_without_finishers(&f), 1);
    }

    #[test]
    fn zero_max_laps_leaves_relative_laps_empty() {
        let f = derive(vec![row("6", "A", "T1", Some(0), Some(10.0), None)]);
        assert_eq!(f[0].race_max_laps, Some(0));
        assert_eq!(f[0].relative_laps, None);
        assert_eq!(f[0].avg_lap_time_seconds, None);
    }

    #[test]
    fn season_aggregates() {
        // two races, team T1 runs A and B, team T2 runs C
        let f = derive(vec![
            row("1", "A", "T1", Some(10), Some(1000.0), None),
            row("1", "B", "T1", Some(10), Some(1010.0), None),
            row("1", "C", "T2", Some(10), Some(1020.0), None),
            row("2", "A", "T1", Some(10), Some(1100.0), None),
            row("2", "C", "T2", Some(10), Some(1090.0), None),
            row("2", "B", "T1", Some(4), None, Some(Status::Dnf)),
        ]);
        let a = f.iter().find(|r| r.driver_name.as_deref() == Some("A")).unwrap();
        // A: 100.0 and 110.0 per lap
        assert!(close(a.driver_speed_index, 105.0));
        assert!(close(a.driver_top10_rate, 1.0));
        // T1 laps: 100, 101, 110; positions 1, 2, 2
        assert!(close(a.team_speed_index, 311.0 / 3.0));
        assert!(close(a.team_avg_position, 5.0 / 3.0));
        assert!(close(a.driver_vs_team, 100.0 - 311.0 / 3.0));

        let b_dnf = f.iter().find(|r| r.driver_name.as_deref() == Some("B") && r.is_dnf).unwrap();
        assert!(close(b_dnf.driver_top10_rate, 0.5));
        assert_eq!(b_dnf.driver_vs_team, None);
        assert!(close(b_dnf.driver_speed_index, 101.0));
    }

    #[test]
    fn missing_team_gets_no_team_aggregates() {
        let mut r = row("1", "A", "T1", Some(10), Some(1000.0), None);
        r.team_name = None;
        let f = derive(vec![r]);
        assert_eq!(f[0].team_speed_index, None);
        assert_eq!(f[0].team_avg_position, None);
        assert!(close(f[0].driver_speed_index, 100.0));
    }

    #[test]
    fn lapped_finisher_faster_than_winner_has_no_gap() {
        let f = derive(vec![
            row("1", "A", "T1", Some(10), Some(1000.0), None),
            row("1", "B", "T2", Some(9), Some(990.0), None),
        ]);
        assert_eq!(f[1].position, Some(2));
        assert_eq!(f[1].time_from_winner_seconds, None);
    }
}
