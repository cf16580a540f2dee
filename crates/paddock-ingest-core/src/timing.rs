//! Text to seconds for race durations, lap times and gaps.

/// Cells that stand for "no time" rather than a malformed one.
pub const SENTINELS: [&str; 6] = ["-", "", "RET", "DNS", "DNF", "DSQ"];

fn is_sentinel(s: &str) -> bool {
    SENTINELS.contains(&s)
}

/// `m:ss.fff` or `h:mm:ss.fff` to seconds. A value without any `:` is
/// rejected because a bare number here could be a lap deficit or a gap.
pub fn duration_seconds(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if is_sentinel(s) || !s.contains(':') {
        return None;
    }
    let parts: Vec<&str> = s.split(':').map(str::trim).collect();
    let secs = match parts.as_slice() {
        [m, sec] => whole(m)? * 60.0 + fraction(sec)?,
        [h, m, sec] => whole(h)? * 3600.0 + whole(m)? * 60.0 + fraction(sec)?,
        _ => return None,
    };
    Some(secs)
}

/// Plain seconds gap (`2.121`, `+2.121`). Lap deficits such as `1 LAP` are not
/// converted.
pub fn gap_seconds(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if is_sentinel(s) {
        return None;
    }
    fraction(s)
}

/// Lap counts, tolerating `28.0` style floats from spreadsheet exports.
pub fn lap_count(raw: &str) -> Option<u32> {
    let s = raw.trim();
    if let Ok(n) = s.parse::<u32>() {
        return Some(n);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 {
        Some(f as u32)
    } else {
        None
    }
}

/// Classification position as printed (`1`, `12`, `3.0`). Status words and
/// zero are not positions.
pub fn classified_position(raw: &str) -> Option<u32> {
    lap_count(raw).filter(|&p| p > 0)
}

fn whole(s: &str) -> Option<f64> {
    s.parse::<u64>().ok().map(|v| v as f64)
}

fn fraction(s: &str) -> Option<f64> {
    let v = s.parse::<f64>().ok()?;
    (v.is_finite() && v >= 0.0).then_some(v)
}
