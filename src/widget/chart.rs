pub mod comparison;
pub mod frontier;

use data::chart::drawdown::{self, DrawdownOutcome};
use data::chart::pointer::{self, HoverPayload};
use data::chart::tooltip::{self, TooltipContent, TooltipStyle};
use data::chart::{LineGeometry, Period, sample, ticks};
use data::text::Heuristic;
use data::{ChartConfig, Observation};

use chrono::NaiveDate;
use iced_core::{Point, Rectangle, Size};
use rustc_hash::FxHasher;
use serde::Serialize;
use std::hash::{Hash, Hasher};

/// Marker drawn on the hovered point of a line.
const LINE_MARKER_RADIUS: f32 = 4.0;
const DRAWDOWN_PADDING: f64 = 0.1;

/// Fingerprint of what a chart draws. A hover resolved under another
/// fingerprint points at data that is no longer on screen.
pub fn revision_of(points: impl IntoIterator<Item = Point>) -> u64 {
    let mut hasher = FxHasher::default();
    for p in points {
        p.x.to_bits().hash(&mut hasher);
        p.y.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Pointer moved, in client coordinates, over an element drawn at `element`.
    Moved { client: Point, element: Rectangle },
    Left,
}

/// Holds only the most recent pointer event until the next frame drains it.
#[derive(Debug)]
pub struct FrameThrottle<E> {
    pending: Option<E>,
    scheduled: bool,
}

impl<E> Default for FrameThrottle<E> {
    fn default() -> Self {
        Self {
            pending: None,
            scheduled: false,
        }
    }
}

impl<E> FrameThrottle<E> {
    /// Replaces any pending event. Returns `true` when the caller must schedule
    /// a frame callback, at most once until [`drain`](Self::drain) runs.
    pub fn push(&mut self, event: E) -> bool {
        self.pending = Some(event);
        !std::mem::replace(&mut self.scheduled, true)
    }

    pub fn drain(&mut self) -> Option<E> {
        self.scheduled = false;
        self.pending.take()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
        self.scheduled = false;
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }
}

#[derive(Debug, Default)]
pub struct HoverState {
    current: Option<HoverPayload>,
    last_data_rev: u64,
}

impl HoverState {
    /// Drops the hover when the chart data changed since it was computed.
    pub fn sync(&mut self, revision: u64) {
        if self.last_data_rev != revision {
            self.current = None;
            self.last_data_rev = revision;
        }
    }

    pub fn set(&mut self, hover: Option<HoverPayload>) {
        self.current = hover;
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&HoverPayload> {
        self.current.as_ref()
    }
}

/// A chart that can resolve a view-box pointer to hovered data.
pub trait Hoverable {
    fn view(&self) -> Size;

    fn revision(&self) -> u64;

    fn hit_test(&self, pointer: Point) -> Option<HoverPayload>;

    /// Tooltip text and the radius of the marker it points at.
    fn describe(&self, hover: &HoverPayload) -> Option<(TooltipContent, f32)>;
}

/// Pointer handling of one chart instance.
#[derive(Debug, Default)]
pub struct Interaction {
    throttle: FrameThrottle<PointerEvent>,
    hover: HoverState,
}

impl Interaction {
    /// Returns `true` when a frame must be requested.
    pub fn on_event(&mut self, event: PointerEvent) -> bool {
        match event {
            PointerEvent::Left => {
                self.throttle.cancel();
                self.hover.clear();
                false
            }
            PointerEvent::Moved { .. } => self.throttle.push(event),
        }
    }

    /// Frame tick: maps the latest pending pointer, if any, and updates the hover.
    pub fn on_frame(&mut self, chart: &impl Hoverable) -> Option<&HoverPayload> {
        self.hover.sync(chart.revision());

        if let Some(PointerEvent::Moved { client, element }) = self.throttle.drain() {
            let hover = pointer::to_view_box(client, element, chart.view())
                .and_then(|p| chart.hit_test(p));
            self.hover.set(hover);
        }
        self.hover.current()
    }

    pub fn data_changed(&mut self, revision: u64) {
        self.hover.sync(revision);
    }

    pub fn hover(&self) -> Option<&HoverPayload> {
        self.hover.current()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Px {
    pub x: f32,
    pub y: f32,
}

impl From<Point> for Px {
    fn from(p: Point) -> Self {
        Px { x: p.x, y: p.y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl From<Rectangle> for Frame {
    fn from(r: Rectangle) -> Self {
        Frame {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Axis {
    pub ticks: Vec<f64>,
    pub labels: Vec<String>,
    pub positions: Vec<f32>,
    pub step: f64,
}

impl Axis {
    pub fn plan(range: (f64, f64), desired: usize, label: impl Fn(f64, f64) -> String) -> Self {
        let set = ticks::ticks(range.0, range.1, desired);
        Axis {
            labels: set.values.iter().map(|v| label(*v, set.step)).collect(),
            ticks: set.values,
            positions: Vec::new(),
            step: set.step,
        }
    }

    pub fn extent(&self) -> Option<(f64, f64)> {
        Some((*self.ticks.first()?, *self.ticks.last()?))
    }

    pub fn place(mut self, position: impl Fn(f64) -> f32) -> Self {
        self.positions = self.ticks.iter().map(|v| position(*v)).collect();
        self
    }
}

/// What a hover resolves to once it is ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverReport {
    pub series: usize,
    pub indices: Vec<Option<usize>>,
    pub anchor: Px,
    pub tooltip: Frame,
    pub title: String,
    pub lines: Vec<String>,
}

impl HoverReport {
    pub fn new(chart: &impl Hoverable, hover: &HoverPayload, config: &ChartConfig) -> Option<Self> {
        let (content, radius) = chart.describe(hover)?;
        let style = TooltipStyle::default().with_body_size(config.font_size);

        let bounds = tooltip::layout(
            &content,
            &style,
            &Heuristic,
            hover.anchor,
            radius,
            chart.view(),
            config.tooltip_margin,
        );

        Some(HoverReport {
            series: hover.matched_series,
            indices: hover.indices.clone(),
            anchor: hover.anchor.into(),
            tooltip: bounds.into(),
            title: content.title,
            lines: content.lines,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawdownScene {
    pub peak: NaiveDate,
    pub trough: NaiveDate,
    pub end: NaiveDate,
    pub recovered: bool,
    pub trough_drawdown_pct: f64,
    pub dates: Vec<NaiveDate>,
    pub path: Vec<Px>,
    pub y_axis: Axis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineScene {
    pub period: String,
    pub source_len: usize,
    pub dates: Vec<NaiveDate>,
    pub path: Vec<Px>,
    pub y_axis: Axis,
    pub gutter: f32,
    pub drawdown_status: DrawdownOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drawdown: Option<DrawdownScene>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// Single-series value chart with the worst drawdown episode as an overlay.
#[derive(Debug, Clone)]
pub struct LineChart {
    period: Period,
    source_len: usize,
    sampled: Vec<Observation>,
    values: Vec<f64>,
    geometry: LineGeometry,
    y_axis: Axis,
    outcome: DrawdownOutcome,
    drawdown: Option<DrawdownScene>,
    revision: u64,
}

impl LineChart {
    /// `None` when the period holds no observations.
    pub fn new(
        series: &[Observation],
        known_max_drawdown_pct: Option<f64>,
        config: &ChartConfig,
        today: NaiveDate,
    ) -> Option<Self> {
        let window = config.period.apply(series, today);
        let sampled = sample::sample(window, config.max_points);
        let values = data::chart::values(&sampled);
        let range = data::chart::value_range(&values)?;

        let view = config.line_view;
        let y_axis = Axis::plan(range, config.desired_ticks, ticks::format_tick);
        let gutter = data::chart::left_gutter(&y_axis.labels, config.font_size, &Heuristic);
        let geometry = LineGeometry::new(
            view.size(),
            view.margins.with_left(gutter.max(view.margins.left)),
            values.len(),
            y_axis.extent().unwrap_or(range),
        );
        let y_axis = y_axis.place(|v| geometry.y_at(v));

        let outcome = drawdown::analyze_series(window, known_max_drawdown_pct);
        let drawdown = outcome
            .episode()
            .and_then(|e| drawdown_scene(window, e, config));

        log::debug!(
            "Line chart: {} of {} points in {period}",
            sampled.len(),
            window.len(),
            period = config.period
        );

        let revision = revision_of(geometry.path(&values));

        Some(Self {
            period: config.period,
            source_len: window.len(),
            sampled,
            values,
            geometry,
            y_axis,
            outcome,
            drawdown,
            revision,
        })
    }

    pub fn scene(&self) -> LineScene {
        LineScene {
            period: self.period.to_string(),
            source_len: self.source_len,
            dates: self.sampled.iter().map(|o| o.date).collect(),
            path: self.geometry.path(&self.values).into_iter().map(Px::from).collect(),
            y_axis: self.y_axis.clone(),
            gutter: self.geometry.margins.left,
            drawdown_status: self.outcome,
            drawdown: self.drawdown.clone(),
            message: self.outcome.message(),
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl Hoverable for LineChart {
    fn view(&self) -> Size {
        self.geometry.view
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn hit_test(&self, pointer: Point) -> Option<HoverPayload> {
        pointer::hover_line(pointer, &self.geometry, &self.values)
    }

    fn describe(&self, hover: &HoverPayload) -> Option<(TooltipContent, f32)> {
        let obs = self.sampled.get(hover.index()?)?;

        let mut content = TooltipContent::new(obs.date.format("%Y-%m-%d").to_string())
            .line(format!("Value {:.2}", obs.value));
        if let Some(invested) = obs.invested {
            content = content.line(format!("Invested {invested:.2}"));
        }
        Some((content, LINE_MARKER_RADIUS))
    }
}

/// Drawdown curve over the episode window, downsampled like the main line.
fn drawdown_scene(
    window: &[Observation],
    episode: &drawdown::DrawdownEpisode,
    config: &ChartConfig,
) -> Option<DrawdownScene> {
    let span = window.get(episode.window())?;
    let values = data::chart::values(span);
    let curve: Vec<f64> = drawdown::drawdown_curve(&values)
        .into_iter()
        .map(|p| p.drawdown)
        .collect();

    let indices = sample::sample_indices(curve.len(), config.max_points);
    let dates: Vec<NaiveDate> = indices.iter().map(|&i| span[i].date).collect();
    let sampled: Vec<f64> = indices.iter().map(|&i| curve[i]).collect();

    let floor = data::chart::value_range(&sampled)?.0;
    let range = data::chart::padded((floor, 0.0), DRAWDOWN_PADDING);
    let y_axis = Axis::plan((range.0, 0.0), config.desired_ticks, |v, step| {
        ticks::format_pct(v, step, false)
    });

    let view = config.line_view;
    let geometry = LineGeometry::new(
        view.size(),
        view.margins,
        sampled.len(),
        y_axis.extent().unwrap_or(range),
    );
    let y_axis = y_axis.place(|v| geometry.y_at(v));

    Some(DrawdownScene {
        peak: window[episode.peak_index].date,
        trough: window[episode.trough_index].date,
        end: window[episode.end_index].date,
        recovered: episode.recovered,
        trough_drawdown_pct: episode.trough_drawdown_pct,
        dates,
        path: geometry.path(&sampled).into_iter().map(Px::from).collect(),
        y_axis,
    })
}
