//! Finisher detection and canonical finishing order.
//!
//! Finishers rank by laps completed (more is better), then by race time
//! (less is better). Non-finishers follow in input order and get no position.

use crate::group_first_seen;
use model::EntrantRow;
use tracing::{debug, info, warn};

/// No status, a race time and at least one lap.
pub fn is_finisher(r: &EntrantRow) -> bool {
    r.status.is_none() && r.race_time_seconds.is_some() && r.laps_completed.map_or(false, |l| l > 0)
}

/// Assigns `position` and `finished` within every (season, race, session)
/// group. Groups come out in order of first appearance, each one sorted.
pub fn resolve_positions(rows: Vec<EntrantRow>) -> Vec<EntrantRow> {
    let groups = group_first_seen(&rows, |r| r.race_key());
    let mut slots: Vec<Option<EntrantRow>> = rows.into_iter().map(Some).collect();
    let mut out = Vec::with_capacity(slots.len());
    let mut empty = 0usize;

    for (key, idx) in &groups {
        let group: Vec<EntrantRow> = idx.iter().filter_map(|&i| slots[i].take()).collect();
        let ranked = rank_group(group);
        let finishers = ranked.iter().filter(|r| r.finished).count();
        if finishers == 0 {
            empty += 1;
            warn!(season = key.season, race = %key.race_id, session = %key.session_type, "no classified finishers");
        } else {
            debug!(season = key.season, race = %key.race_id, session = %key.session_type, finishers, entrants = ranked.len(), "ranked");
        }
        out.extend(ranked);
    }
    info!(groups = groups.len(), without_finishers = empty, rows = out.len(), "positions resolved");
    out
}

fn rank_group(group: Vec<EntrantRow>) -> Vec<EntrantRow> {
    let (mut finishers, others): (Vec<_>, Vec<_>) = group.into_iter().partition(is_finisher);

    // stable: identical laps and time keep input order
    finishers.sort_by(|a, b| {
        b.laps_completed.cmp(&a.laps_completed).then_with(|| {
            let ta = a.race_time_seconds.unwrap_or(f64::INFINITY);
            let tb = b.race_time_seconds.unwrap_or(f64::INFINITY);
            ta.total_cmp(&tb)
        })
    });

    let mut ranked = Vec::with_capacity(finishers.len() + others.len());
    for (i, mut r) in finishers.into_iter().enumerate() {
        r.position = Some(i as u32 + 1);
        r.finished = true;
        ranked.push(r);
    }
    for mut r in others {
        r.position = None;
        r.finished = false;
        ranked.push(r);
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::Status;

    fn entrant(race: &str, code: &str, laps: Option<u32>, time: Option<f64>, status: Option<Status>) -> EntrantRow {
        EntrantRow {
            season: 2022,
            race_id: race.into(),
            session_type: "ROUND1Summary".into(),
            driver_code: Some(code.into()),
            car_number: Some(1),
            laps_completed: laps,
            race_time_seconds: time,
            status,
            ..Default::default()
        }
    }

    fn codes(rows: &[EntrantRow]) -> Vec<String> {
        rows.iter().map(|r| r.driver_code.clone().unwrap()).collect()
    }

    #[test]
    fn finisher_rule() {
        assert!(is_finisher(&entrant("1", "A", Some(20), Some(1800.0), None)));
        assert!(!is_finisher(&entrant("1", "A", Some(20), Some(1800.0), Some(Status::Dnf))));
        assert!(!is_finisher(&entrant("1", "A", Some(20), None, None)));
        assert!(!is_finisher(&entrant("1", "A", Some(0), Some(1800.0), None)));
        assert!(!is_finisher(&entrant("1", "A", None, Some(1800.0), None)));
    }

    #[test]
    fn laps_then_time() {
        let rows = vec![
            entrant("1", "SLOW", Some(28), Some(2440.0), None),
            entrant("1", "RET", Some(12), None, Some(Status::Dnf)),
            entrant("1", "LAPPED", Some(27), Some(2400.0), None),
            entrant("1", "FAST", Some(28), Some(2430.0), None),
            entrant("1", "DNS", None, None, Some(Status::Dns)),
        ];
        let out = resolve_positions(rows);
        assert_eq!(codes(&out), vec!["FAST", "SLOW", "LAPPED", "RET", "DNS"]);
        let pos: Vec<_> = out.iter().map(|r| r.position).collect();
        assert_eq!(pos, vec![Some(1), Some(2), Some(3), None, None]);
        for r in &out {
            assert_eq!(r.position.is_some(), r.finished);
        }
    }

    #[test]
    fn classified_with_status_is_not_a_finisher() {
        // a retired entrant with a full lap count still gets no position
        let rows = vec![
            entrant("1", "A", Some(28), Some(2430.0), None),
            entrant("1", "B", Some(28), Some(2420.0), Some(Status::Dsq)),
        ];
        let out = resolve_positions(rows);
        assert_eq!(codes(&out), vec!["A", "B"]);
        assert_eq!(out[1].position, None);
    }

    #[test]
    fn groups_are_ranked_independently() {
        let rows = vec![
            entrant("1", "A1", Some(10), Some(600.0), None),
            entrant("2", "B1", Some(10), Some(500.0), None),
            entrant("1", "A2", Some(10), Some(590.0), None),
            entrant("2", "B2", Some(10), Some(510.0), None),
        ];
        let out = resolve_positions(rows);
        assert_eq!(codes(&out), vec!["A2", "A1", "B1", "B2"]);
        let pos: Vec<_> = out.iter().map(|r| r.position.unwrap()).collect();
        assert_eq!(pos, vec![1, 2, 1, 2]);
    }

    #[test]
    fn no_finishers_is_valid() {
        let rows = vec![
            entrant("9", "X", Some(3), None, Some(Status::Dnf)),
            entrant("9", "Y", None, None, Some(Status::Dns)),
        ];
        let out = resolve_positions(rows);
        assert!(out.iter().all(|r| r.position.is_none() && !r.finished));
        assert_eq!(codes(&out), vec!["X", "Y"]);
    }

    #[test]
    fn ties_keep_input_order_and_rerun_is_stable() {
        let rows = vec![
            entrant("1", "FIRST", Some(5), Some(300.0), None),
            entrant("1", "SECOND", Some(5), Some(300.0), None),
        ];
        let once = resolve_positions(rows);
        assert_eq!(codes(&once), vec!["FIRST", "SECOND"]);
        let twice = resolve_positions(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn positions_are_dense() {
        let rows: Vec<_> = (0..15)
            .map(|i| {
                let status = if i % 4 == 0 { Some(Status::Dnf) } else { None };
                entrant("7", &format!("D{i}"), Some(20 - (i % 3)), Some(1000.0 + i as f64), status)
            })
            .collect();
        let out = resolve_positions(rows);
        let mut pos: Vec<u32> = out.iter().filter_map(|r| r.position).collect();
        pos.sort_unstable();
        let k = out.iter().filter(|r| r.finished).count() as u32;
        assert_eq!(pos, (1..=k).collect::<Vec<_>>());
    }
}
