//! Finishing positions, derived race features and season aggregates.

pub mod features;
pub mod positions;
pub mod rounding;
pub mod summary;

use std::collections::HashMap;
use std::hash::Hash;

pub use features::{derive_features, races_without_finishers};
pub use positions::{is_finisher, resolve_positions};
pub use rounding::{round_for_presentation, Presentable, MAX_DECIMALS};
pub use summary::{driver_season_summaries, session_position_summaries, team_season_summaries};

/// Row indices grouped by key, groups in order of first appearance.
pub(crate) fn group_first_seen<T, K, F>(items: &[T], key: F) -> Vec<(K, Vec<usize>)>
where
    K: Hash + Eq + Clone,
    F: Fn(&T) -> K,
{
    let mut slot: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<usize>)> = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let k = key(item);
        match slot.get(&k) {
            Some(&g) => groups[g].1.push(i),
            None => {
                slot.insert(k.clone(), groups.len());
                groups.push((k, vec![i]));
            }
        }
    }
    groups
}

/// Mean of the present values; `None` when there are none.
pub(crate) fn mean<I: IntoIterator<Item = Option<f64>>>(values: I) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .flatten()
        .fold((0.0_f64, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}

/// Population standard deviation.
pub(crate) fn stddev(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    let m = v.iter().sum::<f64>() / (v.len() as f64);
    let var = v.iter().map(|x| {
        let d = *x - m;
        d * d
    }).sum::<f64>() / (v.len() as f64);
    Some(var.sqrt())
}
