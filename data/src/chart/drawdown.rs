//! Running-peak drawdown and the single worst peak → trough → recovery episode.

use exchange::Observation;
use serde::Serialize;

/// Drawdowns shallower than this (in percent) are reported as noise.
pub const SIGNIFICANT_DRAWDOWN_PCT: f64 = 0.1;
/// How close a point's drawdown must be to a known maximum to count as the trough.
pub const TROUGH_MATCH_TOLERANCE: f64 = 0.001;
/// Relative tolerance when walking back to the value that set the peak.
pub const PEAK_MATCH_RATIO: f64 = 0.99999;
/// Drawdown (percent) at or above which the series counts as recovered.
pub const RECOVERY_THRESHOLD_PCT: f64 = -0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawdownPoint {
    pub peak: f64,
    /// `(value / peak - 1) * 100`, never positive
    pub drawdown: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawdownEpisode {
    pub peak_index: usize,
    pub trough_index: usize,
    pub recovery_index: Option<usize>,
    /// Last index of the displayed episode: the recovery, or the series end.
    pub end_index: usize,
    pub peak_value: f64,
    pub trough_drawdown_pct: f64,
    pub recovered: bool,
}

impl DrawdownEpisode {
    /// Index range to display for the episode.
    pub fn window(&self) -> std::ops::RangeInclusive<usize> {
        self.peak_index..=self.end_index
    }

    pub fn point_count(&self) -> usize {
        self.end_index - self.peak_index + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "episode", rename_all = "snake_case")]
pub enum DrawdownOutcome {
    Episode(DrawdownEpisode),
    /// Fewer than two finite points.
    InsufficientData,
    /// Maximum drawdown below [`SIGNIFICANT_DRAWDOWN_PCT`].
    NoSignificantDrawdown,
    /// The episode window would hold fewer than two points.
    TooShort,
}

impl DrawdownOutcome {
    pub fn episode(&self) -> Option<&DrawdownEpisode> {
        match self {
            DrawdownOutcome::Episode(e) => Some(e),
            _ => None,
        }
    }

    /// Copy for the UI to show when there is no episode to draw.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            DrawdownOutcome::Episode(_) => None,
            DrawdownOutcome::InsufficientData => Some("Not enough data for a drawdown chart"),
            DrawdownOutcome::NoSignificantDrawdown => Some("No significant drawdown in this period"),
            DrawdownOutcome::TooShort => Some("Drawdown episode too short to display"),
        }
    }
}

/// Full per-point drawdown curve in a single forward pass.
pub fn drawdown_curve(values: &[f64]) -> Vec<DrawdownPoint> {
    let mut peak = f64::NEG_INFINITY;

    values
        .iter()
        .map(|&v| {
            peak = peak.max(v);
            let drawdown = if peak > 0.0 {
                (v / peak - 1.0) * 100.0
            } else {
                0.0
            };
            DrawdownPoint { peak, drawdown }
        })
        .collect()
}

pub fn analyze_series(series: &[Observation], known_max_drawdown_pct: Option<f64>) -> DrawdownOutcome {
    let values: Vec<f64> = series.iter().map(|o| o.value).collect();
    analyze(&values, known_max_drawdown_pct)
}

/// Resolves the worst drawdown episode.
///
/// When the backend already reported the maximum drawdown, the trough is the
/// point matching it; the sign of the reported figure is ignored.
pub fn analyze(values: &[f64], known_max_drawdown_pct: Option<f64>) -> DrawdownOutcome {
    if values.len() < 2 || values.iter().any(|v| !v.is_finite()) {
        return DrawdownOutcome::InsufficientData;
    }

    let curve = drawdown_curve(values);

    let reference = known_max_drawdown_pct
        .filter(|d| d.is_finite())
        .map(|d| -d.abs());

    let trough_index = match reference {
        Some(target) => matching_trough(&curve, target),
        None => deepest(&curve),
    };

    let significance = reference.unwrap_or(curve[trough_index].drawdown);
    if significance.abs() < SIGNIFICANT_DRAWDOWN_PCT {
        return DrawdownOutcome::NoSignificantDrawdown;
    }

    let peak_value = curve[trough_index].peak;
    let peak_index = (0..=trough_index)
        .rev()
        .find(|&i| values[i] >= peak_value * PEAK_MATCH_RATIO)
        .unwrap_or(0);

    let recovery_index = (trough_index + 1..curve.len())
        .find(|&i| curve[i].drawdown >= RECOVERY_THRESHOLD_PCT);
    let end_index = recovery_index.unwrap_or(curve.len() - 1);

    if end_index <= peak_index {
        return DrawdownOutcome::TooShort;
    }

    DrawdownOutcome::Episode(DrawdownEpisode {
        peak_index,
        trough_index,
        recovery_index,
        end_index,
        peak_value,
        trough_drawdown_pct: curve[trough_index].drawdown,
        recovered: recovery_index.is_some(),
    })
}

/// First point within tolerance of `target`, else the global minimum.
fn matching_trough(curve: &[DrawdownPoint], target: f64) -> usize {
    curve
        .iter()
        .position(|p| (p.drawdown - target).abs() < TROUGH_MATCH_TOLERANCE)
        .unwrap_or_else(|| {
            log::debug!("No drawdown point matches {target:.3}%, using the deepest one");
            deepest(curve)
        })
}

/// First index of the global minimum.
fn deepest(curve: &[DrawdownPoint]) -> usize {
    curve
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(best_i, best), (i, p)| {
            if p.drawdown < best {
                (i, p.drawdown)
            } else {
                (best_i, best)
            }
        })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_tracks_running_peak() {
        let curve = drawdown_curve(&[100.0, 120.0, 80.0, 90.0, 125.0]);
        let peaks: Vec<f64> = curve.iter().map(|p| p.peak).collect();
        assert_eq!(peaks, vec![100.0, 120.0, 120.0, 120.0, 125.0]);
        assert_eq!(curve[0].drawdown, 0.0);
        assert!((curve[2].drawdown + 33.3333).abs() < 1e-3);
        assert!(curve.iter().all(|p| p.drawdown <= 0.0));
    }

    #[test]
    fn recovered_episode() {
        let outcome = analyze(&[100.0, 120.0, 80.0, 90.0, 125.0], None);
        let e = outcome.episode().expect("episode");

        assert_eq!(e.peak_index, 1);
        assert_eq!(e.trough_index, 2);
        assert_eq!(e.recovery_index, Some(4));
        assert!(e.recovered);
        assert_eq!(e.peak_value, 120.0);
        assert!((e.trough_drawdown_pct + 33.33).abs() < 0.01);
        assert_eq!(e.window(), 1..=4);
    }

    #[test]
    fn unrecovered_episode_runs_to_the_end() {
        let outcome = analyze(&[100.0, 110.0, 70.0, 80.0, 90.0], None);
        let e = outcome.episode().unwrap();

        assert!(!e.recovered);
        assert_eq!(e.recovery_index, None);
        assert_eq!(e.end_index, 4);
        assert!(e.peak_index <= e.trough_index);
    }

    #[test]
    fn monotonic_series_has_no_drawdown() {
        let values: Vec<f64> = (1..=50).map(f64::from).collect();
        assert_eq!(analyze(&values, None), DrawdownOutcome::NoSignificantDrawdown);
    }

    #[test]
    fn tiny_known_drawdown_is_noise() {
        let outcome = analyze(&[100.0, 120.0, 80.0, 125.0], Some(-0.05));
        assert_eq!(outcome, DrawdownOutcome::NoSignificantDrawdown);
    }

    #[test]
    fn known_drawdown_selects_matching_trough() {
        // two dips: -20% at index 2 and -50% at index 5
        let values = [100.0, 100.0, 80.0, 100.0, 100.0, 50.0, 100.0];

        let e = *analyze(&values, Some(-20.0)).episode().unwrap();
        assert_eq!(e.trough_index, 2);
        assert_eq!(e.peak_index, 1);
        assert_eq!(e.recovery_index, Some(3));

        // positive figures are accepted as magnitudes
        let e = *analyze(&values, Some(50.0)).episode().unwrap();
        assert_eq!(e.trough_index, 5);
        assert_eq!(e.peak_index, 4);

        let e = *analyze(&values, None).episode().unwrap();
        assert_eq!(e.trough_index, 5);
    }

    #[test]
    fn peak_walk_back_absorbs_float_noise() {
        let values = [100.0, 120.0, 119.9995, 60.0, 130.0];
        let e = *analyze(&values, None).episode().unwrap();
        // 119.9995 is within 0.99999 of the 120 peak, so it is the latest peak
        assert_eq!(e.peak_index, 2);
    }

    #[test]
    fn insufficient_data() {
        assert_eq!(analyze(&[], None), DrawdownOutcome::InsufficientData);
        assert_eq!(analyze(&[1.0], None), DrawdownOutcome::InsufficientData);
        assert_eq!(
            analyze(&[1.0, f64::NAN], None),
            DrawdownOutcome::InsufficientData
        );
        assert!(DrawdownOutcome::InsufficientData.message().is_some());
    }

    #[test]
    fn unmatched_known_drawdown_falls_back_to_deepest() {
        let e = *analyze(&[100.0, 60.0, 100.0], Some(-45.0)).episode().unwrap();
        assert_eq!(e.trough_index, 1);
        assert_eq!(e.peak_index, 0);
        assert_eq!(e.recovery_index, Some(2));
        assert_eq!(e.point_count(), 3);

        // -19.5% at index 1 is closer to the reference, but -40% is the worst dip
        let e = *analyze(&[100.0, 80.5, 100.0, 60.0, 100.0], Some(-20.0))
            .episode()
            .unwrap();
        assert_eq!(e.trough_index, 3);
        assert_eq!(e.peak_index, 2);
        assert!((e.trough_drawdown_pct + 40.0).abs() < 1e-9);
    }
}
