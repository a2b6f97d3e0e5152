//! Tooltip sizing from estimated text metrics and collision-aware placement.

use crate::text::TextMetrics;

use iced_core::{Point, Rectangle, Size};

/// Gap kept between the tooltip and the container edges.
pub const CONTAINER_MARGIN: f32 = 8.0;
pub const MIN_WIDTH: f32 = 140.0;
pub const MAX_WIDTH: f32 = 380.0;
/// Upper bound on width relative to the container.
const MAX_WIDTH_RATIO: f32 = 0.7;
/// Distance between the marker edge and the tooltip.
pub const MARKER_OFFSET: f32 = 12.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TooltipContent {
    pub title: String,
    pub lines: Vec<String>,
}

impl TooltipContent {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TooltipStyle {
    pub title_size: f32,
    pub body_size: f32,
    /// Total horizontal padding, both sides.
    pub padding_x: f32,
    /// Total vertical padding, both sides.
    pub padding_y: f32,
}

impl Default for TooltipStyle {
    fn default() -> Self {
        Self {
            title_size: 13.0,
            body_size: 12.0,
            padding_x: 30.0,
            padding_y: 20.0,
        }
    }
}

impl TooltipStyle {
    pub fn with_body_size(mut self, size: f32) -> Self {
        self.body_size = size;
        self.title_size = size + 1.0;
        self
    }
}

pub fn measure(
    content: &TooltipContent,
    style: &TooltipStyle,
    metrics: &impl TextMetrics,
    container: Size,
) -> Size {
    let widest = content
        .lines
        .iter()
        .map(|l| metrics.width(l, style.body_size))
        .fold(metrics.width(&content.title, style.title_size), f32::max);

    let max_width = MAX_WIDTH.min(MAX_WIDTH_RATIO * container.width);
    let width = (widest + style.padding_x).max(MIN_WIDTH).min(max_width);

    let height = style.padding_y
        + metrics.line_height(style.title_size)
        + content.lines.len() as f32 * metrics.line_height(style.body_size);

    Size::new(width, height)
}

/// Positions a box of `size` next to a marker of `marker_radius` at `anchor`.
///
/// Above the marker when it fits, else below, else on the side with more room.
/// The result stays inside `container` shrunk by `margin` on every side; the box
/// itself is shrunk when the container is too small to hold it. A container
/// narrower than two margins caps the margin at half its size, collapsing the
/// box onto the container's center line.
pub fn place(
    anchor: Point,
    marker_radius: f32,
    size: Size,
    container: Size,
    margin: f32,
) -> Rectangle {
    let container = Size::new(container.width.max(0.0), container.height.max(0.0));
    let margin_x = margin.max(0.0).min(container.width / 2.0);
    let margin_y = margin.max(0.0).min(container.height / 2.0);

    let width = size.width.min(container.width - 2.0 * margin_x).max(0.0);
    let height = size.height.min(container.height - 2.0 * margin_y).max(0.0);

    let left = (anchor.x - width / 2.0)
        .min(container.width - margin_x - width)
        .max(margin_x);

    let above = anchor.y - marker_radius - MARKER_OFFSET - height;
    let below = anchor.y + marker_radius + MARKER_OFFSET;

    let top = if above >= margin_y {
        above
    } else if below + height <= container.height - margin_y {
        below
    } else {
        let room_above = anchor.y - marker_radius - margin_y;
        let room_below = container.height - margin_y - (anchor.y + marker_radius);
        if room_above >= room_below { above } else { below }
    };
    let top = top.min(container.height - margin_y - height).max(margin_y);

    Rectangle {
        x: left,
        y: top,
        width,
        height,
    }
}

/// [`measure`] then [`place`].
pub fn layout(
    content: &TooltipContent,
    style: &TooltipStyle,
    metrics: &impl TextMetrics,
    anchor: Point,
    marker_radius: f32,
    container: Size,
    margin: f32,
) -> Rectangle {
    let size = measure(content, style, metrics, container);
    place(anchor, marker_radius, size, container, margin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::Heuristic;

    const EPS: f32 = 1e-3;

    fn assert_inside(b: &Rectangle, container: Size, margin: f32) {
        assert!(b.x >= margin - EPS, "{b:?} in {container:?}");
        assert!(b.y >= margin - EPS, "{b:?} in {container:?}");
        assert!(b.x + b.width <= container.width - margin + EPS, "{b:?} in {container:?}");
        assert!(b.y + b.height <= container.height - margin + EPS, "{b:?} in {container:?}");
    }

    #[test]
    fn width_is_clamped() {
        let container = Size::new(1100.0, 520.0);
        let style = TooltipStyle::default();

        let short = measure(&TooltipContent::new("A"), &style, &Heuristic, container);
        assert_eq!(short.width, MIN_WIDTH);

        let long = TooltipContent::new("x".repeat(200));
        assert_eq!(measure(&long, &style, &Heuristic, container).width, MAX_WIDTH);

        let narrow = Size::new(300.0, 200.0);
        assert!((measure(&long, &style, &Heuristic, narrow).width - 210.0).abs() < EPS);
    }

    #[test]
    fn height_grows_per_line() {
        let style = TooltipStyle::default();
        let container = Size::new(1100.0, 520.0);
        let one = measure(&TooltipContent::new("t"), &style, &Heuristic, container);
        let three = measure(
            &TooltipContent::new("t").line("a").line("b"),
            &style,
            &Heuristic,
            container,
        );
        assert!((three.height - one.height - 2.0 * 12.0 * 1.2).abs() < EPS);
    }

    #[test]
    fn prefers_above_then_flips_below() {
        let container = Size::new(600.0, 400.0);
        let size = Size::new(160.0, 60.0);

        let above = place(Point::new(300.0, 200.0), 6.0, size, container, CONTAINER_MARGIN);
        assert!((above.y + above.height - (200.0 - 6.0 - MARKER_OFFSET)).abs() < EPS);
        assert!((above.x - 220.0).abs() < EPS);

        let below = place(Point::new(300.0, 30.0), 6.0, size, container, CONTAINER_MARGIN);
        assert!((below.y - (30.0 + 6.0 + MARKER_OFFSET)).abs() < EPS);
    }

    #[test]
    fn clamped_at_the_edges() {
        let container = Size::new(600.0, 400.0);
        let size = Size::new(200.0, 80.0);

        let left = place(Point::new(0.0, 200.0), 4.0, size, container, CONTAINER_MARGIN);
        assert_eq!(left.x, CONTAINER_MARGIN);

        let right = place(Point::new(600.0, 200.0), 4.0, size, container, CONTAINER_MARGIN);
        assert!((right.x + right.width - (600.0 - CONTAINER_MARGIN)).abs() < EPS);
    }

    #[test]
    fn always_inside_the_container() {
        let containers = [
            Size::new(1100.0, 520.0),
            Size::new(320.0, 180.0),
            Size::new(120.0, 60.0),
            Size::new(16.0, 16.0),
        ];
        let content = TooltipContent::new("Max Sharpe")
            .line("Return 12.40%")
            .line("Volatility 18.20%")
            .line("SPY 60.00%")
            .line("AGG 40.00%");
        let style = TooltipStyle::default();

        for container in containers {
            for ix in 0..=10 {
                for iy in 0..=10 {
                    let anchor = Point::new(
                        container.width * ix as f32 / 10.0,
                        container.height * iy as f32 / 10.0,
                    );
                    for radius in [4.0, 12.0] {
                        let b = layout(
                            &content,
                            &style,
                            &Heuristic,
                            anchor,
                            radius,
                            container,
                            CONTAINER_MARGIN,
                        );
                        assert_inside(&b, container, CONTAINER_MARGIN);
                    }
                }
            }
        }
    }

    #[test]
    fn container_smaller_than_its_margins() {
        let container = Size::new(10.0, 10.0);
        let size = Size::new(160.0, 60.0);

        for anchor in [Point::ORIGIN, Point::new(5.0, 5.0), Point::new(10.0, 10.0)] {
            let b = place(anchor, 4.0, size, container, CONTAINER_MARGIN);
            assert_inside(&b, container, 5.0);
            assert_eq!((b.width, b.height), (0.0, 0.0));
            assert_eq!((b.x, b.y), (5.0, 5.0));
        }

        let b = place(Point::ORIGIN, 4.0, size, Size::new(0.0, 0.0), CONTAINER_MARGIN);
        assert_eq!((b.x, b.y, b.width, b.height), (0.0, 0.0, 0.0, 0.0));
    }
}
