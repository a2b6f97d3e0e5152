use super::{Axis, Hoverable, Px, revision_of};

use data::chart::comparison::{DateScale, common_range, common_window, normalize_0_100};
use data::chart::pointer::{self, HoverPayload, SeriesTrack};
use data::chart::tooltip::TooltipContent;
use data::chart::{LineGeometry, sample, ticks};
use data::text::Heuristic;
use data::{ChartConfig, Observation};

use chrono::NaiveDate;
use iced_core::{Point, Size};
use serde::Serialize;

const MARKER_RADIUS: f32 = 4.0;
const NORMALIZED_RANGE: (f64, f64) = (0.0, 100.0);

#[derive(Debug, Clone)]
struct ComparedSeries {
    name: String,
    sampled: Vec<Observation>,
    normalized: Vec<f64>,
    xs: Vec<f32>,
}

impl ComparedSeries {
    fn new(name: &str, series: &[Observation], max_points: usize) -> Self {
        let sampled = sample::sample(series, max_points);
        let normalized = normalize_0_100(&data::chart::values(&sampled));

        Self {
            name: name.to_string(),
            sampled,
            normalized,
            xs: Vec::new(),
        }
    }

    fn path(&self, geometry: &LineGeometry) -> Vec<Px> {
        self.xs
            .iter()
            .zip(&self.normalized)
            .map(|(x, v)| Px::from(Point::new(*x, geometry.y_at(*v))))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesScene {
    pub name: String,
    pub dates: Vec<NaiveDate>,
    pub path: Vec<Px>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonScene {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub series: Vec<SeriesScene>,
    pub y_axis: Axis,
    pub gutter: f32,
}

/// Two series over their common window, each rescaled to 0..=100.
///
/// Both lines are placed by date on one time axis, so series sampled at
/// different rates still line up.
#[derive(Debug, Clone)]
pub struct ComparisonChart {
    series: [ComparedSeries; 2],
    geometry: LineGeometry,
    scale: DateScale,
    y_axis: Axis,
    revision: u64,
}

impl ComparisonChart {
    /// `None` when the two series do not overlap.
    pub fn new(
        (name_a, a): (&str, &[Observation]),
        (name_b, b): (&str, &[Observation]),
        config: &ChartConfig,
    ) -> Option<Self> {
        let (a, b) = common_range(a, b)?;
        let window = common_window(a, b)?;
        let mut series = [
            ComparedSeries::new(name_a, a, config.max_points),
            ComparedSeries::new(name_b, b, config.max_points),
        ];

        let view = config.line_view;
        let y_axis = Axis::plan(NORMALIZED_RANGE, config.desired_ticks, ticks::format_tick);
        let gutter = data::chart::left_gutter(&y_axis.labels, config.font_size, &Heuristic);
        let geometry = LineGeometry::new(
            view.size(),
            view.margins.with_left(gutter.max(view.margins.left)),
            series[0].normalized.len().max(series[1].normalized.len()),
            y_axis.extent().unwrap_or(NORMALIZED_RANGE),
        );
        let y_axis = y_axis.place(|v| geometry.y_at(v));

        let scale = DateScale::new(window, geometry.plot());
        for s in &mut series {
            s.xs = scale.positions(&s.sampled);
        }

        log::debug!(
            "Comparing {} and {} from {} to {}: {} and {} points",
            series[0].name,
            series[1].name,
            window.0,
            window.1,
            series[0].sampled.len(),
            series[1].sampled.len()
        );

        let revision = revision_of(
            series
                .iter()
                .flat_map(|s| s.path(&geometry))
                .map(|p| Point::new(p.x, p.y)),
        );

        Some(Self {
            series,
            geometry,
            scale,
            y_axis,
            revision,
        })
    }

    pub fn scene(&self) -> ComparisonScene {
        ComparisonScene {
            start: self.scale.start,
            end: self.scale.end,
            series: self
                .series
                .iter()
                .map(|s| SeriesScene {
                    name: s.name.clone(),
                    dates: s.sampled.iter().map(|o| o.date).collect(),
                    path: s.path(&self.geometry),
                })
                .collect(),
            y_axis: self.y_axis.clone(),
            gutter: self.geometry.margins.left,
        }
    }
}

impl Hoverable for ComparisonChart {
    fn view(&self) -> Size {
        self.geometry.view
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn hit_test(&self, pointer: Point) -> Option<HoverPayload> {
        let tracks = self.series.each_ref().map(|s| SeriesTrack {
            geometry: self.geometry,
            values: &s.normalized,
            xs: Some(&s.xs),
        });
        pointer::hover_multi(pointer, &tracks)
    }

    fn describe(&self, hover: &HoverPayload) -> Option<(TooltipContent, f32)> {
        let matched = self.series.get(hover.matched_series)?;
        let date = matched.sampled.get(hover.index()?)?.date;

        let mut content = TooltipContent::new(date.format("%Y-%m-%d").to_string());
        for (s, index) in self.series.iter().zip(&hover.indices) {
            if let Some(obs) = index.and_then(|i| s.sampled.get(i)) {
                content = content.line(format!(
                    "{}: {:.2} ({})",
                    s.name,
                    obs.value,
                    obs.date.format("%Y-%m-%d")
                ));
            }
        }
        Some((content, MARKER_RADIUS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::chart::{HoverReport, Interaction, PointerEvent};
    use chrono::{Datelike, Months};
    use iced_core::Rectangle;

    fn series(start: i64, values: &[f64]) -> Vec<Observation> {
        let base = NaiveDate::from_ymd_opt(2022, 3, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Observation::new(base + chrono::Duration::days(start + i as i64), *v))
            .collect()
    }

    #[test]
    fn aligned_and_normalized() {
        let a = series(0, &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);
        let b = series(2, &[5.0, 1.0, 9.0, 3.0, 7.0]);
        let chart = ComparisonChart::new(("a", &a), ("b", &b), &ChartConfig::default()).unwrap();
        let scene = chart.scene();

        assert_eq!(scene.series[0].dates[0], scene.series[1].dates[0]);
        assert_eq!(scene.series[0].path.len(), 4);
        assert_eq!(scene.series[1].path.len(), 5);
        assert_eq!(scene.series[0].path[0].x, scene.series[1].path[0].x);
        // a ends a day before b, so it stops short of the right edge
        assert!(scene.series[0].path[3].x < scene.series[1].path[4].x);
        assert_eq!(scene.series[0].path[3].x, scene.series[1].path[3].x);
        assert_eq!(scene.y_axis.ticks.first(), Some(&0.0));
        assert_eq!(scene.y_axis.ticks.last(), Some(&100.0));
    }

    #[test]
    fn hover_reports_both_series() {
        let config = ChartConfig::default();
        let a = series(0, &[1.0, 2.0, 3.0]);
        let b = series(0, &[3.0, 2.0, 1.0, 4.0, 5.0]);
        let chart = ComparisonChart::new(("a", &a), ("b", &b), &config).unwrap();
        let view = chart.view();
        let x = chart.scene().series[0].path[1].x;

        let mut interaction = Interaction::default();
        interaction.on_event(PointerEvent::Moved {
            client: Point::new(x, 150.0),
            element: Rectangle::new(Point::ORIGIN, view),
        });
        let hover = interaction.on_frame(&chart).cloned().unwrap();
        assert_eq!(hover.indices, vec![Some(1), Some(1)]);

        let report = HoverReport::new(&chart, &hover, &config).unwrap();
        assert_eq!(report.lines.len(), 2);
        assert!(report.lines[0].starts_with("a: 2.00"));
        assert!(report.lines[1].starts_with("b: 2.00"));
    }

    #[test]
    fn mixed_sampling_rates_share_the_time_axis() {
        let config = ChartConfig::default();
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let monthly: Vec<Observation> = (0..24)
            .map(|m| Observation::new(start + Months::new(m), 100.0 + m as f64))
            .collect();
        let daily: Vec<Observation> = (0..730)
            .map(|d| Observation::new(start + chrono::Duration::days(d), 50.0 + d as f64))
            .collect();

        let chart =
            ComparisonChart::new(("monthly", &monthly), ("daily", &daily), &config).unwrap();
        let scene = chart.scene();
        let (m, d) = (&scene.series[0], &scene.series[1]);
        let plot = chart.geometry.plot();

        assert_eq!(m.path[0].x, plot.x);
        assert_eq!(d.path[0].x, plot.x);
        assert!((d.path.last().unwrap().x - (plot.x + plot.width)).abs() < 1e-3);

        // the monthly series ends a month before the daily one
        let month_end = *m.path.last().unwrap();
        assert!(month_end.x < plot.x + plot.width - 30.0);

        let hover = chart.hit_test(Point::new(month_end.x, 150.0)).unwrap();
        assert_eq!(hover.indices[0], Some(23));
        let daily_date = chart.series[1].sampled[hover.indices[1].unwrap()].date;
        let monthly_date = monthly[23].date;
        assert_eq!(monthly_date.month(), 12);
        assert!((daily_date - monthly_date).num_days().abs() <= 3);

        // same date, same x on both lines
        let i = d.dates.iter().position(|dt| *dt >= monthly_date).unwrap();
        assert!((d.path[i].x - month_end.x).abs() < 4.0);
    }

    #[test]
    fn disjoint_series_have_no_chart() {
        let a = series(0, &[1.0, 2.0]);
        let b = series(30, &[1.0, 2.0]);
        assert!(ComparisonChart::new(("a", &a), ("b", &b), &ChartConfig::default()).is_none());
    }

    #[test]
    fn revision_changes_with_data() {
        let config = ChartConfig::default();
        let a = series(0, &[1.0, 2.0, 3.0]);
        let b = series(0, &[3.0, 2.0, 1.0]);
        let c = series(0, &[3.0, 1.0, 2.0]);

        let first = ComparisonChart::new(("a", &a), ("b", &b), &config).unwrap();
        let again = ComparisonChart::new(("a", &a), ("b", &b), &config).unwrap();
        let changed = ComparisonChart::new(("a", &a), ("c", &c), &config).unwrap();

        assert_eq!(first.revision(), again.revision());
        assert_ne!(first.revision(), changed.revision());
    }
}
