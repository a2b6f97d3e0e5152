pub mod chart;
pub mod config;
pub mod text;
pub mod util;

pub use chart::drawdown::{DrawdownEpisode, DrawdownOutcome};
pub use chart::frontier::{Composition, Portfolio};
pub use chart::pointer::HoverPayload;
pub use chart::ticks::TickSet;
pub use chart::{LineGeometry, Margins, Period};
pub use config::{ChartConfig, ConfigError};
pub use text::{Heuristic, TextMetrics};

pub use exchange::Observation;
