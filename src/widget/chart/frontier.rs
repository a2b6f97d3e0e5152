use super::{Axis, Hoverable, Px, revision_of};

use data::ChartConfig;
use data::chart::frontier::{self, Bounds, Portfolio, SynthesisParams};
use data::chart::pointer::{self, HoverPayload};
use data::chart::scatter::{
    self, Anchor, AnchorKind, DotState, PointKind, ScatterDomain, ScatterLayout, ScatterPoint,
    Selection,
};
use data::chart::ticks;
use data::chart::tooltip::TooltipContent;

use exchange::FrontierPayload;
use iced_core::{Point, Size};
use rand::Rng;
use serde::Serialize;

const SYNTHETIC_TITLE: &str = "In-between portfolio";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DotScene {
    pub kind: String,
    pub position: Px,
    pub radius: f32,
    pub portfolio: Portfolio,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontierScene {
    pub risk_free_percent: f64,
    pub synthetic_count: usize,
    pub anchor_count: usize,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub dots: Vec<DotScene>,
}

/// Efficient-frontier scatter: optimizer anchors plus synthetic in-between points.
#[derive(Debug, Clone)]
pub struct FrontierChart {
    anchors: Vec<Anchor>,
    synthetic: Vec<Portfolio>,
    layout: ScatterLayout,
    points: Vec<ScatterPoint>,
    x_axis: Axis,
    y_axis: Axis,
    risk_free: f64,
    hit_radius: f32,
    selection: Selection,
    revision: u64,
}

impl FrontierChart {
    pub fn new<R: Rng + ?Sized>(payload: &FrontierPayload, config: &ChartConfig, rng: &mut R) -> Self {
        let risk_free = payload
            .risk_free_rate_percent
            .unwrap_or(config.frontier.risk_free_percent);

        let anchors = Anchor::from_payload(payload, risk_free);
        let pool = frontier::normalize_pool(&payload.simulated_portfolios, risk_free);
        let anchor_portfolios: Vec<Portfolio> =
            anchors.iter().map(|a| a.portfolio.clone()).collect();

        let bounds = Bounds::around(anchor_portfolios.iter().chain(&pool));
        let params = SynthesisParams {
            risk_free,
            jitter_min: config.frontier.jitter_min,
            jitter_max: config.frontier.jitter_max,
        };
        let synthetic = frontier::synthesize(
            &anchor_portfolios,
            &pool,
            config.frontier.desired_extra,
            &bounds,
            &params,
            rng,
        );

        let domain = ScatterDomain::around(anchor_portfolios.iter().chain(&synthetic));
        let view = config.scatter_view;
        let layout = ScatterLayout::new(view.size(), view.margins, domain);
        let points = scatter::layout_points(&layout, &anchors, &synthetic);

        let pct = |v: f64, step: f64| format!("{}%", ticks::format_tick(v, step));
        let x_axis = Axis::plan(domain.vol, config.desired_ticks, pct).place(|v| layout.x_at(v));
        let y_axis = Axis::plan(domain.ret, config.desired_ticks, pct).place(|v| layout.y_at(v));

        log::info!(
            "Frontier: {} anchors, {} of {} simulated portfolios usable, {} synthetic points",
            anchors.len(),
            pool.len(),
            payload.simulated_portfolios.len(),
            synthetic.len()
        );

        let revision = revision_of(points.iter().map(|p| p.position));

        Self {
            anchors,
            synthetic,
            layout,
            points,
            x_axis,
            y_axis,
            risk_free,
            hit_radius: config.hover_threshold_px,
            selection: Selection::default(),
            revision,
        }
    }

    fn portfolio(&self, point: &ScatterPoint) -> Option<&Portfolio> {
        match point.kind {
            PointKind::Synthetic => self.synthetic.get(point.source),
            PointKind::Anchor(_) => self.anchors.get(point.source).map(|a| &a.portfolio),
        }
    }

    /// Toggles the selection of the dot under a view-box pointer.
    pub fn click(&mut self, pointer: Point) -> Option<usize> {
        let index = self.hit_test(pointer)?.index()?;
        self.selection.toggle(index);
        self.selection.0
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn scene(&self, hovered: Option<usize>) -> FrontierScene {
        let dots = self
            .points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| {
                let portfolio = self.portfolio(p)?.clone();
                Some(DotScene {
                    kind: kind_label(p.kind).to_string(),
                    position: p.position.into(),
                    radius: scatter::dot_radius(p.kind, self.selection.state_of(i, hovered)),
                    portfolio,
                })
            })
            .collect();

        FrontierScene {
            risk_free_percent: self.risk_free,
            synthetic_count: self.synthetic.len(),
            anchor_count: self.anchors.len(),
            x_axis: self.x_axis.clone(),
            y_axis: self.y_axis.clone(),
            dots,
        }
    }

    pub fn layout(&self) -> &ScatterLayout {
        &self.layout
    }
}

fn kind_label(kind: PointKind) -> &'static str {
    match kind {
        PointKind::Synthetic => "synthetic",
        PointKind::Anchor(AnchorKind::MaxSharpe) => "max_sharpe",
        PointKind::Anchor(AnchorKind::MinVolatility) => "min_volatility",
        PointKind::Anchor(AnchorKind::MaxReturn) => "max_return",
        PointKind::Anchor(AnchorKind::UserStatic) => "user_static",
    }
}

impl Hoverable for FrontierChart {
    fn view(&self) -> Size {
        self.layout.view
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn hit_test(&self, pointer: Point) -> Option<HoverPayload> {
        let positions: Vec<Point> = self.points.iter().map(|p| p.position).collect();
        pointer::hover_scatter(pointer, &positions, self.hit_radius)
    }

    fn describe(&self, hover: &HoverPayload) -> Option<(TooltipContent, f32)> {
        let index = hover.index()?;
        let point = self.points.get(index)?;
        let portfolio = self.portfolio(point)?;

        let title = match point.kind {
            PointKind::Synthetic => SYNTHETIC_TITLE.to_string(),
            PointKind::Anchor(kind) => kind.to_string(),
        };
        let state = match self.selection.state_of(index, Some(index)) {
            DotState::Selected => DotState::Selected,
            _ => DotState::Hovered,
        };

        Some((
            scatter::describe(title, portfolio),
            scatter::dot_radius(point.kind, state),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::chart::HoverReport;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn payload() -> FrontierPayload {
        serde_json::from_value(serde_json::json!({
            "max_sharpe_portfolio": {
                "Volatility": 14.0, "Return": 10.0,
                "weights": { "SPY": 0.7, "AGG": 0.3 }
            },
            "min_volatility_portfolio": {
                "Volatility": 6.0, "Return": 4.0,
                "weights": { "SPY": 0.2, "AGG": 0.8 }
            },
            "max_return_portfolio": {
                "Volatility": 22.0, "Return": 13.0,
                "weights": { "QQQ": 1.0 }
            },
            "user_portfolio_point": {
                "annual_volatility": 12.0, "cagr_approx": 7.0,
                "static_weights": [ { "ticker": "SPY", "weight": 50 }, { "ticker": "AGG", "weight": 50 } ]
            },
            "simulated_portfolios": [
                { "Volatility": 10.0, "Return": 6.0, "weights": { "SPY": 0.5, "AGG": 0.5 } },
                { "Volatility": 11.0, "Return": 6.5 }
            ],
            "risk_free_rate_percent": 1.0
        }))
        .unwrap()
    }

    fn chart(desired_extra: usize) -> FrontierChart {
        let mut config = ChartConfig::default();
        config.frontier.desired_extra = desired_extra;
        FrontierChart::new(&payload(), &config, &mut StdRng::seed_from_u64(42))
    }

    #[test]
    fn builds_anchors_and_synthetic_points() {
        let chart = chart(30);
        let scene = chart.scene(None);

        assert_eq!(scene.anchor_count, 4);
        assert_eq!(scene.synthetic_count, 30);
        assert_eq!(scene.dots.len(), 34);
        assert_eq!(scene.risk_free_percent, 1.0);
        // the usable simulation is taken before anything is generated
        assert_eq!(scene.dots[0].portfolio.volatility, 10.0);
        assert_eq!(scene.dots[33].kind, "user_static");

        let view = chart.view();
        for dot in &scene.dots {
            assert!(dot.position.x >= 0.0 && dot.position.x <= view.width);
            assert!(dot.position.y >= 0.0 && dot.position.y <= view.height);
        }
    }

    #[test]
    fn hover_on_anchor_and_miss() {
        let config = ChartConfig::default();
        let chart = chart(0);
        let anchor = chart.points[0].position;

        let hover = chart.hit_test(anchor).unwrap();
        assert_eq!(hover.index(), Some(0));
        let report = HoverReport::new(&chart, &hover, &config).unwrap();
        assert_eq!(report.title, "Max Sharpe");

        let far = Point::new(anchor.x, anchor.y + 20.0);
        let nearest_other = chart
            .points
            .iter()
            .skip(1)
            .map(|p| p.position.distance(far))
            .fold(f32::INFINITY, f32::min);
        if nearest_other > config.hover_threshold_px {
            assert!(chart.hit_test(far).is_none());
        }
    }

    #[test]
    fn click_toggles_selection() {
        let mut chart = chart(0);
        let anchor = chart.points[2].position;

        assert_eq!(chart.click(anchor), Some(2));
        assert_eq!(chart.scene(None).dots[2].radius, 12.0);
        assert_eq!(chart.click(anchor), None);
        assert_eq!(chart.selection(), Selection(None));
    }
}
