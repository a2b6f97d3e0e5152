use crate::chart::{Margins, Period};
use crate::util::ok_or_default;

use iced_core::Size;
use serde::{Deserialize, Serialize};

/// Fixed drawing surface the chart geometry is computed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewBox {
    pub width: f32,
    pub height: f32,
    pub margins: Margins,
}

impl ViewBox {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn line() -> Self {
        ViewBox {
            width: 900.0,
            height: 320.0,
            margins: Margins {
                left: 50.0,
                top: 30.0,
                right: 30.0,
                bottom: 50.0,
            },
        }
    }

    pub fn scatter() -> Self {
        ViewBox {
            width: 1100.0,
            height: 520.0,
            margins: Margins::uniform(50.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontierConfig {
    #[serde(deserialize_with = "ok_or_default")]
    pub desired_extra: usize,
    #[serde(deserialize_with = "ok_or_default")]
    pub risk_free_percent: f64,
    pub jitter_min: f64,
    pub jitter_max: f64,
}

impl Default for FrontierConfig {
    fn default() -> Self {
        Self {
            desired_extra: 100,
            risk_free_percent: 0.0,
            jitter_min: 0.03,
            jitter_max: 0.08,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub max_points: usize,
    pub desired_ticks: usize,
    pub font_size: f32,
    pub hover_threshold_px: f32,
    pub tooltip_margin: f32,
    #[serde(deserialize_with = "ok_or_default")]
    pub period: Period,
    #[serde(deserialize_with = "ok_or_default")]
    pub frontier: FrontierConfig,
    pub line_view: ViewBox,
    pub scatter_view: ViewBox,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            max_points: crate::chart::sample::DEFAULT_MAX_POINTS,
            desired_ticks: crate::chart::ticks::DEFAULT_TICK_COUNT,
            font_size: 12.0,
            hover_threshold_px: crate::chart::pointer::SCATTER_HIT_RADIUS,
            tooltip_margin: crate::chart::tooltip::CONTAINER_MARGIN,
            period: Period::Max,
            frontier: FrontierConfig::default(),
            line_view: ViewBox::line(),
            scatter_view: ViewBox::scatter(),
        }
    }
}
