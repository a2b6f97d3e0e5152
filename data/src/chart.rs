pub mod comparison;
pub mod drawdown;
pub mod frontier;
pub mod pointer;
pub mod sample;
pub mod scatter;
pub mod ticks;
pub mod tooltip;

use crate::text::{self, TextMetrics};

use chrono::{Months, NaiveDate};
use exchange::Observation;
use iced_core::{Point, Rectangle, Size};
use serde::{Deserialize, Serialize};

/// Minimum width reserved left of the plot for y labels.
pub const MIN_LEFT_GUTTER: f32 = 56.0;
const GUTTER_LABEL_PADDING: f32 = 20.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    OneYear,
    FiveYears,
    #[default]
    Max,
}

impl Period {
    /// Trailing window ending at `today`.
    pub fn apply<'a>(&self, series: &'a [Observation], today: NaiveDate) -> &'a [Observation] {
        let months = match self {
            Period::OneYear => 12,
            Period::FiveYears => 60,
            Period::Max => return series,
        };
        let Some(cutoff) = today.checked_sub_months(Months::new(months)) else {
            return series;
        };

        let start = series.partition_point(|o| o.date < cutoff);
        &series[start..]
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::OneYear => write!(f, "1Y"),
            Period::FiveYears => write!(f, "5Y"),
            Period::Max => write!(f, "MAX"),
        }
    }
}

pub fn values(series: &[Observation]) -> Vec<f64> {
    series.iter().map(|o| o.value).collect()
}

/// Min and max of the finite values, `None` when there are none.
pub fn value_range(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Widens `(min, max)` by `pct` of its span on both sides.
pub fn padded(range: (f64, f64), pct: f64) -> (f64, f64) {
    let span = range.1 - range.0;
    (range.0 - span * pct, range.1 + span * pct)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Margins {
    pub fn uniform(m: f32) -> Self {
        Self {
            left: m,
            top: m,
            right: m,
            bottom: m,
        }
    }

    pub fn with_left(mut self, left: f32) -> Self {
        self.left = left;
        self
    }
}

/// Left gutter wide enough for the widest y label.
pub fn left_gutter(labels: &[String], font_size: f32, metrics: &impl TextMetrics) -> f32 {
    (text::widest(labels, font_size, metrics) + GUTTER_LABEL_PADDING).max(MIN_LEFT_GUTTER)
}

/// Index-on-x, value-on-y mapping of a line chart inside a fixed view box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineGeometry {
    pub view: Size,
    pub margins: Margins,
    pub len: usize,
    pub y_domain: (f64, f64),
}

impl LineGeometry {
    pub fn new(view: Size, margins: Margins, len: usize, y_domain: (f64, f64)) -> Self {
        Self {
            view,
            margins,
            len,
            y_domain,
        }
    }

    pub fn plot(&self) -> Rectangle {
        Rectangle {
            x: self.margins.left,
            y: self.margins.top,
            width: (self.view.width - self.margins.left - self.margins.right).max(0.0),
            height: (self.view.height - self.margins.top - self.margins.bottom).max(0.0),
        }
    }

    /// Horizontal distance between two consecutive indices.
    pub fn step_width(&self) -> f32 {
        self.plot().width / self.len.saturating_sub(1).max(1) as f32
    }

    pub fn x_at(&self, index: usize) -> f32 {
        self.plot().x + index as f32 * self.step_width()
    }

    pub fn y_at(&self, value: f64) -> f32 {
        let plot = self.plot();
        let (lo, hi) = self.y_domain;
        let span = if hi - lo == 0.0 { 1.0 } else { hi - lo };
        let t = ((value - lo) / span) as f32;
        plot.y + (1.0 - t) * plot.height
    }

    pub fn value_at_y(&self, y: f32) -> f64 {
        let plot = self.plot();
        let (lo, hi) = self.y_domain;
        if plot.height <= 0.0 {
            return lo;
        }
        let t = 1.0 - f64::from((y - plot.y) / plot.height);
        lo + t * (hi - lo)
    }

    pub fn point_at(&self, index: usize, value: f64) -> Point {
        Point::new(self.x_at(index), self.y_at(value))
    }

    /// Polyline vertices for the given values, one per index.
    pub fn path(&self, values: &[f64]) -> Vec<Point> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| self.point_at(i, *v))
            .collect()
    }
}
