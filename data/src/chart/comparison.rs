use super::value_range;

use chrono::NaiveDate;
use exchange::Observation;
use iced_core::Rectangle;

/// Window shared by two compared series: from the later of the two first
/// dates to the later of the two last dates, so both lines start together.
pub fn common_window(a: &[Observation], b: &[Observation]) -> Option<(NaiveDate, NaiveDate)> {
    let start = a.first()?.date.max(b.first()?.date);
    let end = a.last()?.date.max(b.last()?.date);
    (start <= end).then_some((start, end))
}

/// Both series restricted to [`common_window`]; `None` when either ends up empty.
pub fn common_range<'a>(
    a: &'a [Observation],
    b: &'a [Observation],
) -> Option<(&'a [Observation], &'a [Observation])> {
    let (start, end) = common_window(a, b)?;

    let clip = |s: &'a [Observation]| {
        let lo = s.partition_point(|o| o.date < start);
        let hi = s.partition_point(|o| o.date <= end);
        &s[lo..hi.max(lo)]
    };

    let (a, b) = (clip(a), clip(b));
    if a.is_empty() || b.is_empty() {
        log::debug!("Compared series do not overlap after {start}");
        return None;
    }
    Some((a, b))
}

/// Linear date → x mapping across a plot, shared by every compared series so
/// the same date is drawn at the same x whatever each series' sampling rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateScale {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub left: f32,
    pub width: f32,
}

impl DateScale {
    pub fn new((start, end): (NaiveDate, NaiveDate), plot: Rectangle) -> Self {
        Self {
            start,
            end,
            left: plot.x,
            width: plot.width,
        }
    }

    /// Dates outside the window pin to the nearest plot edge.
    pub fn x_at(&self, date: NaiveDate) -> f32 {
        let span = (self.end - self.start).num_days().max(1) as f32;
        let t = (date - self.start).num_days() as f32 / span;
        self.left + t.min(1.0).max(0.0) * self.width
    }

    pub fn positions(&self, series: &[Observation]) -> Vec<f32> {
        series.iter().map(|o| self.x_at(o.date)).collect()
    }
}

/// Rescales to 0..=100 over the series' own range; a flat series maps to 0.
pub fn normalize_0_100(values: &[f64]) -> Vec<f64> {
    let Some((min, max)) = value_range(values) else {
        return Vec::new();
    };
    let range = if max - min == 0.0 { 1.0 } else { max - min };

    values.iter().map(|v| (v - min) / range * 100.0).collect()
}
