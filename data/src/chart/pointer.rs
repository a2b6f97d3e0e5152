//! Pointer → data hit-testing for line, multi-line and scatter charts.
//!
//! All inputs are in view-box units; use [`to_view_box`] first when the chart
//! surface is drawn scaled.

use super::LineGeometry;

use iced_core::{Point, Rectangle, Size};

/// Farthest a pointer may be from a scatter point and still hover it.
pub const SCATTER_HIT_RADIUS: f32 = 12.0;

/// What the pointer currently resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverPayload {
    /// Per series, the index under the pointer.
    pub indices: Vec<Option<usize>>,
    /// Where the hovered datum is drawn, for the marker and the tooltip.
    pub anchor: Point,
    pub matched_series: usize,
    pub values: Vec<Option<f64>>,
    /// Pointer distance to the hovered scatter point.
    pub distance: Option<f32>,
}

impl HoverPayload {
    pub fn index(&self) -> Option<usize> {
        self.indices.get(self.matched_series).copied().flatten()
    }

    pub fn value(&self) -> Option<f64> {
        self.values.get(self.matched_series).copied().flatten()
    }
}

/// Inclusive on every edge, pointer exactly on the frame still counts.
fn contains(r: &Rectangle, p: Point) -> bool {
    p.x >= r.x && p.x <= r.x + r.width && p.y >= r.y && p.y <= r.y + r.height
}

/// Maps a client-space pointer into view-box units using the element's on-screen box.
pub fn to_view_box(client: Point, element: Rectangle, view: Size) -> Option<Point> {
    if element.width <= 0.0 || element.height <= 0.0 || !contains(&element, client) {
        return None;
    }

    Some(Point::new(
        (client.x - element.x) * view.width / element.width,
        (client.y - element.y) * view.height / element.height,
    ))
}

pub fn from_view_box(p: Point, element: Rectangle, view: Size) -> Point {
    let sx = if view.width > 0.0 {
        element.width / view.width
    } else {
        1.0
    };
    let sy = if view.height > 0.0 {
        element.height / view.height
    } else {
        1.0
    };
    Point::new(element.x + p.x * sx, element.y + p.y * sy)
}

/// Index whose x is closest to the pointer; `None` outside the plot area.
pub fn nearest_index(pointer: Point, geometry: &LineGeometry) -> Option<usize> {
    if geometry.len == 0 {
        return None;
    }
    let plot = geometry.plot();
    if !contains(&plot, pointer) {
        return None;
    }

    let raw = ((pointer.x - plot.x) / geometry.step_width()).round();
    Some((raw.max(0.0) as usize).min(geometry.len - 1))
}

pub fn hover_line(pointer: Point, geometry: &LineGeometry, values: &[f64]) -> Option<HoverPayload> {
    let index = nearest_index(pointer, geometry)?.min(values.len().checked_sub(1)?);
    let value = values[index];

    Some(HoverPayload {
        indices: vec![Some(index)],
        anchor: geometry.point_at(index, value),
        matched_series: 0,
        values: vec![Some(value)],
        distance: None,
    })
}

/// Index of the drawn x closest to `x`; `xs` must be ascending.
///
/// Ties go to the earlier index.
pub fn nearest_x(xs: &[f32], x: f32) -> Option<usize> {
    let after = xs.partition_point(|v| *v < x);
    let candidates = [after.checked_sub(1), (after < xs.len()).then_some(after)];

    candidates
        .into_iter()
        .flatten()
        .min_by(|a, b| (xs[*a] - x).abs().total_cmp(&(xs[*b] - x).abs()))
}

/// One line of a multi-series chart.
#[derive(Debug, Clone, Copy)]
pub struct SeriesTrack<'a> {
    /// Plot area and value mapping.
    pub geometry: LineGeometry,
    pub values: &'a [f64],
    /// Drawn x of each value, ascending. `None` spaces values evenly by index.
    pub xs: Option<&'a [f32]>,
}

impl SeriesTrack<'_> {
    pub fn x_at(&self, index: usize) -> f32 {
        match self.xs {
            Some(xs) => xs.get(index).copied().unwrap_or(f32::NAN),
            None => self.geometry.x_at(index),
        }
    }

    /// Index drawn closest to the pointer; `None` outside the plot area.
    pub fn nearest(&self, pointer: Point) -> Option<usize> {
        let last = self.values.len().checked_sub(1)?;

        match self.xs {
            Some(xs) => {
                if !contains(&self.geometry.plot(), pointer) {
                    return None;
                }
                nearest_x(&xs[..xs.len().min(last + 1)], pointer.x)
            }
            None => nearest_index(pointer, &self.geometry).map(|i| i.min(last)),
        }
    }
}

/// Resolves each series independently, then matches the one drawn closest to the pointer.
///
/// A series that ends before the pointer resolves to its last point and loses
/// the match to a series still drawn under the pointer.
pub fn hover_multi(pointer: Point, tracks: &[SeriesTrack<'_>]) -> Option<HoverPayload> {
    let indices: Vec<Option<usize>> = tracks.iter().map(|t| t.nearest(pointer)).collect();

    let (matched_series, index) = indices
        .iter()
        .enumerate()
        .filter_map(|(s, i)| i.map(|i| (s, i)))
        .min_by(|(sa, ia), (sb, ib)| {
            let da = (tracks[*sa].x_at(*ia) - pointer.x).abs();
            let db = (tracks[*sb].x_at(*ib) - pointer.x).abs();
            da.total_cmp(&db)
        })?;

    let values = tracks
        .iter()
        .zip(&indices)
        .map(|(t, i)| i.map(|i| t.values[i]))
        .collect();

    let track = &tracks[matched_series];
    let value = track.values[index];

    Some(HoverPayload {
        indices,
        anchor: Point::new(track.x_at(index), track.geometry.y_at(value)),
        matched_series,
        values,
        distance: None,
    })
}

/// Nearest rendered point within `threshold` pixels.
///
/// On a tie the later point wins, it is drawn on top.
pub fn hover_scatter(pointer: Point, points: &[Point], threshold: f32) -> Option<HoverPayload> {
    let (index, distance) = points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, pointer.distance(*p)))
        .filter(|(_, d)| *d <= threshold)
        .fold(None, |best: Option<(usize, f32)>, (i, d)| match best {
            Some((_, bd)) if bd < d => best,
            _ => Some((i, d)),
        })?;

    Some(HoverPayload {
        indices: vec![Some(index)],
        anchor: points[index],
        matched_series: 0,
        values: Vec::new(),
        distance: Some(distance),
    })
}
