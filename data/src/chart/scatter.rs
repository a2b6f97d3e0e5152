//! Efficient-frontier scatter: anchors, domain, pixel layout and dot state.

use super::Margins;
use super::frontier::Portfolio;
use super::tooltip::TooltipContent;

use exchange::FrontierPayload;
use iced_core::{Point, Size};
use serde::{Deserialize, Serialize};

/// Relative padding around the scatter domain.
const DOMAIN_PADDING: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorKind {
    MaxSharpe,
    MinVolatility,
    MaxReturn,
    UserStatic,
}

impl AnchorKind {
    pub const ALL: [AnchorKind; 4] = [
        AnchorKind::MaxSharpe,
        AnchorKind::MinVolatility,
        AnchorKind::MaxReturn,
        AnchorKind::UserStatic,
    ];
}

impl std::fmt::Display for AnchorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnchorKind::MaxSharpe => write!(f, "Max Sharpe"),
            AnchorKind::MinVolatility => write!(f, "Min Vol"),
            AnchorKind::MaxReturn => write!(f, "Max Return"),
            AnchorKind::UserStatic => write!(f, "Your Portfolio"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub kind: AnchorKind,
    pub portfolio: Portfolio,
}

impl Anchor {
    /// Anchors present in the payload, in [`AnchorKind::ALL`] order.
    pub fn from_payload(payload: &FrontierPayload, risk_free: f64) -> Vec<Anchor> {
        AnchorKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let raw = match kind {
                    AnchorKind::MaxSharpe => payload.max_sharpe_portfolio.as_ref(),
                    AnchorKind::MinVolatility => payload.min_volatility_portfolio.as_ref(),
                    AnchorKind::MaxReturn => payload.max_return_portfolio.as_ref(),
                    AnchorKind::UserStatic => payload.user_portfolio_point.as_ref(),
                }?;

                let portfolio = Portfolio::from_raw(raw, risk_free);
                if portfolio.is_none() {
                    log::warn!("{kind} anchor is missing volatility or return, skipped");
                }
                Some(Anchor {
                    kind,
                    portfolio: portfolio?,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointKind {
    Synthetic,
    Anchor(AnchorKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DotState {
    #[default]
    Normal,
    Hovered,
    Selected,
}

pub fn dot_radius(kind: PointKind, state: DotState) -> f32 {
    match (kind, state) {
        (PointKind::Synthetic, DotState::Normal) => 4.0,
        (PointKind::Synthetic, DotState::Hovered) => 6.0,
        (PointKind::Synthetic, DotState::Selected) => 7.0,
        (PointKind::Anchor(_), DotState::Normal) => 7.0,
        (PointKind::Anchor(_), DotState::Hovered) => 10.0,
        (PointKind::Anchor(_), DotState::Selected) => 12.0,
    }
}

/// Volatility and return ranges shown on the axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterDomain {
    pub vol: (f64, f64),
    pub ret: (f64, f64),
}

impl ScatterDomain {
    /// Always holds the origin and reaches at least 1 on both axes, padded by 5%.
    pub fn around<'a>(portfolios: impl IntoIterator<Item = &'a Portfolio>) -> Self {
        let (vol, ret) = portfolios.into_iter().fold(
            ((0.0_f64, 1.0_f64), (0.0_f64, 1.0_f64)),
            |((vlo, vhi), (rlo, rhi)), p| {
                (
                    (vlo.min(p.volatility), vhi.max(p.volatility)),
                    (rlo.min(p.ret), rhi.max(p.ret)),
                )
            },
        );

        ScatterDomain {
            vol: pad_axis(vol),
            ret: pad_axis(ret),
        }
    }
}

/// The lower bound only moves when it is below zero, zero stays anchored.
fn pad_axis((lo, hi): (f64, f64)) -> (f64, f64) {
    let lo = if lo < 0.0 {
        lo * (1.0 + DOMAIN_PADDING)
    } else {
        lo
    };
    (lo, hi * (1.0 + DOMAIN_PADDING))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterLayout {
    pub view: Size,
    pub margins: Margins,
    pub domain: ScatterDomain,
}

impl ScatterLayout {
    pub fn new(view: Size, margins: Margins, domain: ScatterDomain) -> Self {
        Self {
            view,
            margins,
            domain,
        }
    }

    pub fn x_at(&self, volatility: f64) -> f32 {
        let (lo, hi) = self.domain.vol;
        let width = self.view.width - self.margins.left - self.margins.right;
        self.margins.left + unit(volatility, lo, hi) * width
    }

    pub fn y_at(&self, ret: f64) -> f32 {
        let (lo, hi) = self.domain.ret;
        let height = self.view.height - self.margins.top - self.margins.bottom;
        self.view.height - self.margins.bottom - unit(ret, lo, hi) * height
    }

    pub fn point_for(&self, portfolio: &Portfolio) -> Point {
        Point::new(self.x_at(portfolio.volatility), self.y_at(portfolio.ret))
    }
}

fn unit(value: f64, lo: f64, hi: f64) -> f32 {
    let span = if hi - lo == 0.0 { 1.0 } else { hi - lo };
    ((value - lo) / span) as f32
}

/// A drawn dot; `source` indexes the synthetic set or the anchor list depending on `kind`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub kind: PointKind,
    pub source: usize,
    pub position: Point,
}

/// Synthetic points first, anchors last so they draw on top.
pub fn layout_points(
    layout: &ScatterLayout,
    anchors: &[Anchor],
    synthetic: &[Portfolio],
) -> Vec<ScatterPoint> {
    let synthetic_points = synthetic
        .iter()
        .enumerate()
        .map(|(source, p)| ScatterPoint {
            kind: PointKind::Synthetic,
            source,
            position: layout.point_for(p),
        });

    let anchor_points = anchors
        .iter()
        .enumerate()
        .map(|(source, a)| ScatterPoint {
            kind: PointKind::Anchor(a.kind),
            source,
            position: layout.point_for(&a.portfolio),
        });

    synthetic_points.chain(anchor_points).collect()
}

/// Index into the rendered points of the clicked dot, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection(pub Option<usize>);

impl Selection {
    /// Clicking the selected dot again clears the selection.
    pub fn toggle(&mut self, index: usize) {
        self.0 = if self.0 == Some(index) {
            None
        } else {
            Some(index)
        };
    }

    pub fn state_of(&self, index: usize, hovered: Option<usize>) -> DotState {
        if self.0 == Some(index) {
            DotState::Selected
        } else if hovered == Some(index) {
            DotState::Hovered
        } else {
            DotState::Normal
        }
    }
}

/// Tooltip lines for a portfolio, weights sorted largest first.
pub fn describe(title: impl Into<String>, portfolio: &Portfolio) -> TooltipContent {
    let mut content = TooltipContent::new(title)
        .line(format!("Return {:.2}%", portfolio.ret))
        .line(format!("Volatility {:.2}%", portfolio.volatility))
        .line(format!("Sharpe {:.3}", portfolio.sharpe));

    if let Some(composition) = &portfolio.composition {
        let mut weights: Vec<(&String, &f64)> = composition.iter().collect();
        weights.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (ticker, pct) in weights {
            content = content.line(format!("{ticker} {pct:.2}%"));
        }
    }
    content
}
