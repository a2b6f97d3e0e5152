use crate::util::{decimals_for_step, round_to};

use serde::Serialize;

pub const DEFAULT_TICK_COUNT: usize = 6;

/// Hard cap on emitted ticks, as a multiple of the requested count.
const MAX_TICKS_FACTOR: usize = 3;
const MIN_TICKS: usize = 3;

/// Axis tick values spaced by a constant `step`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickSet {
    pub values: Vec<f64>,
    pub step: f64,
}

impl TickSet {
    pub fn first(&self) -> Option<f64> {
        self.values.first().copied()
    }

    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Lowest and highest tick, i.e. the axis extent.
    pub fn extent(&self) -> Option<(f64, f64)> {
        Some((self.first()?, self.last()?))
    }

    pub fn labels(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|v| format_tick(*v, self.step))
            .collect()
    }
}

/// Compute a "nice" step close to range/(count-1) using 1/2/5*10^k
pub fn nice_step(raw_step: f64) -> f64 {
    let magnitude = 10f64.powf(raw_step.log10().floor());
    let residual = raw_step / magnitude;

    let multiplier = if residual >= 5.0 {
        10.0
    } else if residual >= 2.0 {
        5.0
    } else if residual >= 1.0 {
        2.0
    } else {
        1.0
    };
    magnitude * multiplier
}

/// Round axis ticks covering `[min, max]`; always at least three values for finite input.
pub fn ticks(min: f64, max: f64, desired_count: usize) -> TickSet {
    if !min.is_finite() || !max.is_finite() {
        return TickSet {
            values: Vec::new(),
            step: 0.0,
        };
    }
    let (min, max) = if min <= max { (min, max) } else { (max, min) };
    let desired_count = desired_count.max(2);

    if min == max {
        let b = min.abs().max(1.0);
        return TickSet {
            values: vec![min - b, min, min + b],
            step: b,
        };
    }

    let raw_step = (max - min) / (desired_count - 1) as f64;
    let step = nice_step(raw_step);
    let nice_min = (min / step).floor() * step;
    let nice_max = (max / step).ceil() * step;

    let decimals = decimals_for_step(step, 2);
    let count = (((nice_max - nice_min) / step).round() as usize + 1)
        .min(desired_count * MAX_TICKS_FACTOR);

    let values: Vec<f64> = (0..count)
        .map(|k| round_to(nice_min + k as f64 * step, decimals))
        .collect();

    if values.len() < MIN_TICKS {
        return linear(min, max, desired_count.max(MIN_TICKS));
    }

    TickSet { values, step }
}

/// Evenly spaced values from `min` to `max` inclusive.
fn linear(min: f64, max: f64, count: usize) -> TickSet {
    let step = (max - min) / (count - 1) as f64;
    let mut values: Vec<f64> = (0..count).map(|i| min + i as f64 * step).collect();
    // pin the end exactly, accumulated error must not leave max uncovered
    if let Some(last) = values.last_mut() {
        *last = max;
    }
    TickSet { values, step }
}

/// Label for a tick; decimals follow the step so neighbouring labels stay distinct.
pub fn format_tick(val: f64, step: f64) -> String {
    if step >= 1.0 {
        format!("{:.0}", val)
    } else if step >= 0.1 {
        format!("{:.1}", val)
    } else {
        format!("{:.2}", val)
    }
}

/// Signed percent label, used on drawdown and comparison axes.
pub fn format_pct(val: f64, step: f64, show_decimals: bool) -> String {
    if show_decimals {
        if step >= 1.0 {
            format!("{:+.1}%", val)
        } else if step >= 0.1 {
            format!("{:+.2}%", val)
        } else {
            format!("{:+.3}%", val)
        }
    } else if step >= 1.0 {
        format!("{:+.0}%", val)
    } else if step >= 0.1 {
        format!("{:+.1}%", val)
    } else {
        format!("{:+.2}%", val)
    }
}
