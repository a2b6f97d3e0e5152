//! Deterministic downsampling of long series for drawing.

pub const DEFAULT_MAX_POINTS: usize = 300;

/// Picks at most `max_points` source indices, evenly spread, strictly increasing,
/// always including the first and the last index.
///
/// Returns every index when the series already fits.
pub fn sample_indices(len: usize, max_points: usize) -> Vec<usize> {
    if len <= max_points {
        return (0..len).collect();
    }
    match max_points {
        0 => return Vec::new(),
        1 => return vec![0],
        _ => {}
    }

    let last = len - 1;
    let step = last as f64 / (max_points - 1) as f64;

    let mut used = vec![false; len];
    let mut picked = Vec::with_capacity(max_points);

    for i in 0..max_points {
        let target = ((i as f64 * step).round() as usize).min(last);

        if let Some(idx) = nearest_unused(&used, target) {
            used[idx] = true;
            picked.push(idx);
        }
    }

    if picked.len() < max_points {
        let missing = max_points - picked.len();
        log::debug!("Downsampling collided on {missing} slots, filling in order");

        for idx in 0..len {
            if picked.len() >= max_points {
                break;
            }
            if !used[idx] {
                used[idx] = true;
                picked.push(idx);
            }
        }
    }

    picked.sort_unstable();
    picked
}

/// Scans `target, +1, -1, +2, -2, ...` for the closest free slot.
fn nearest_unused(used: &[bool], target: usize) -> Option<usize> {
    if !used[target] {
        return Some(target);
    }

    for d in 1..used.len() {
        let above = target + d;
        let below = target.checked_sub(d);

        if above < used.len() && !used[above] {
            return Some(above);
        }
        if let Some(below) = below
            && !used[below]
        {
            return Some(below);
        }
        if above >= used.len() && below.is_none() {
            break;
        }
    }
    None
}

/// Materializes [`sample_indices`] over a series.
pub fn sample<T: Clone>(series: &[T], max_points: usize) -> Vec<T> {
    if series.len() <= max_points {
        return series.to_vec();
    }

    sample_indices(series.len(), max_points)
        .into_iter()
        .map(|i| series[i].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_series_is_unchanged() {
        let series: Vec<u32> = (0..50).collect();
        assert_eq!(sample(&series, 300), series);
        assert_eq!(sample(&series, 50), series);
    }

    #[test]
    fn long_series_is_capped_and_keeps_ends() {
        for n in [301usize, 302, 450, 999, 10_000] {
            let series: Vec<usize> = (0..n).collect();
            let out = sample(&series, 300);

            assert_eq!(out.len(), 300, "n = {n}");
            assert_eq!(out[0], 0);
            assert_eq!(*out.last().unwrap(), n - 1);
            assert!(out.windows(2).all(|w| w[0] < w[1]), "n = {n}");
        }
    }

    #[test]
    fn small_caps() {
        assert_eq!(sample_indices(10, 2), vec![0, 9]);
        assert_eq!(sample_indices(10, 1), vec![0]);
        assert!(sample_indices(10, 0).is_empty());
        assert!(sample_indices(0, 5).is_empty());
    }

    #[test]
    fn deterministic() {
        assert_eq!(sample_indices(1234, 97), sample_indices(1234, 97));
    }

    #[test]
    fn collision_scan_moves_outward() {
        let mut used = vec![false; 6];
        used[3] = true;
        assert_eq!(nearest_unused(&used, 3), Some(4));
        used[4] = true;
        assert_eq!(nearest_unused(&used, 3), Some(2));
        let full = vec![true; 3];
        assert_eq!(nearest_unused(&full, 1), None);
    }
}
