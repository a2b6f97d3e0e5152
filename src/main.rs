mod logger;
mod widget;

use widget::chart::comparison::ComparisonChart;
use widget::chart::frontier::FrontierChart;
use widget::chart::{HoverReport, Hoverable, Interaction, LineChart, PointerEvent};

use data::ChartConfig;
use iced_core::{Point, Rectangle};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const POINTER_ENV: &str = "FOLIO_CHART_POINTER";
const USAGE: &str = "usage: folio-chart line <series.json> [config.json]\n       \
                     folio-chart compare <a.json> <b.json> [config.json]\n       \
                     folio-chart frontier <frontier.json> [config.json]";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid arguments")]
    Usage,
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: exchange::AdapterError,
    },
    #[error(transparent)]
    Config(#[from] data::ConfigError),
    #[error("Failed to write output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("Failed to write output: {0}")]
    Stdout(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Line(PathBuf),
    Compare(PathBuf, PathBuf),
    Frontier(PathBuf),
}

impl Command {
    fn parse(args: &[String]) -> Result<(Command, Option<PathBuf>), Error> {
        let (command, rest) = match args {
            [cmd, series, rest @ ..] if cmd == "line" => (Command::Line(series.into()), rest),
            [cmd, a, b, rest @ ..] if cmd == "compare" => {
                (Command::Compare(a.into(), b.into()), rest)
            }
            [cmd, payload, rest @ ..] if cmd == "frontier" => {
                (Command::Frontier(payload.into()), rest)
            }
            _ => return Err(Error::Usage),
        };

        match rest {
            [] => Ok((command, None)),
            [config] => Ok((command, Some(config.into()))),
            _ => Err(Error::Usage),
        }
    }
}

#[derive(Serialize)]
struct Output<S> {
    #[serde(skip_serializing_if = "Option::is_none")]
    scene: Option<S>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    hovers: Vec<Option<HoverReport>>,
}

impl<S> Output<S> {
    fn empty(message: &'static str) -> Self {
        log::warn!("{message}");
        Output {
            scene: None,
            message: Some(message),
            hovers: Vec::new(),
        }
    }
}

fn main() -> ExitCode {
    if let Err(e) = logger::setup() {
        eprintln!("Failed to set up logging: {e}");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Usage) => {
            eprintln!("{USAGE}");
            ExitCode::from(2)
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), Error> {
    let (command, config_path) = Command::parse(args)?;

    let config = match &config_path {
        Some(path) => data::config::load(path)?,
        None => ChartConfig::default(),
    };
    let pointer = pointer_script();

    match command {
        Command::Line(path) => {
            let text = read(&path)?;
            let series = exchange::adapter::parse_series(&text).map_err(|source| Error::Decode {
                path: path.clone(),
                source,
            })?;
            let known = exchange::adapter::reported_max_drawdown(&text);
            let today = chrono::Local::now().date_naive();

            match LineChart::new(&series, known, &config, today) {
                Some(chart) => emit(&Output {
                    hovers: replay(&chart, &config, &pointer),
                    scene: Some(chart.scene()),
                    message: None,
                }),
                None => emit(&Output::<()>::empty("No observations in the selected period")),
            }
        }
        Command::Compare(a_path, b_path) => {
            let a = load_series(&a_path)?;
            let b = load_series(&b_path)?;

            let (name_a, name_b) = (series_name(&a_path), series_name(&b_path));

            let chart = ComparisonChart::new(
                (name_a.as_str(), a.as_slice()),
                (name_b.as_str(), b.as_slice()),
                &config,
            );
            match chart {
                Some(chart) => emit(&Output {
                    hovers: replay(&chart, &config, &pointer),
                    scene: Some(chart.scene()),
                    message: None,
                }),
                None => emit(&Output::<()>::empty("The two series share no dates")),
            }
        }
        Command::Frontier(path) => {
            let text = read(&path)?;
            let payload = exchange::adapter::parse_frontier(&text).map_err(|source| {
                Error::Decode {
                    path: path.clone(),
                    source,
                }
            })?;

            let chart = FrontierChart::new(&payload, &config, &mut rand::thread_rng());
            let hovers = replay(&chart, &config, &pointer);
            let hovered = hovers
                .last()
                .and_then(Option::as_ref)
                .and_then(|h| h.indices.get(h.series).copied().flatten());

            emit(&Output {
                scene: Some(chart.scene(hovered)),
                message: None,
                hovers,
            })
        }
    }
}

fn read(path: &Path) -> Result<String, Error> {
    std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn load_series(path: &Path) -> Result<Vec<data::Observation>, Error> {
    let text = read(path)?;
    exchange::adapter::parse_series(&text).map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn series_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn emit<S: Serialize>(output: &S) -> Result<(), Error> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, output)?;
    writeln!(stdout)?;
    Ok(())
}

/// A scripted pointer step, in view-box coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PointerStep {
    Move(Point),
    Leave,
}

/// Parses `x,y;x,y;leave;...` from `FOLIO_CHART_POINTER`.
fn pointer_script() -> Vec<PointerStep> {
    std::env::var(POINTER_ENV)
        .map(|s| parse_pointer_script(&s))
        .unwrap_or_default()
}

fn parse_pointer_script(script: &str) -> Vec<PointerStep> {
    script
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|step| {
            if step.eq_ignore_ascii_case("leave") {
                return Some(PointerStep::Leave);
            }
            let parsed = step
                .split_once(',')
                .and_then(|(x, y)| Some((x.trim().parse().ok()?, y.trim().parse().ok()?)));
            if parsed.is_none() {
                log::warn!("Ignoring pointer step {step:?}, expected \"x,y\" or \"leave\"");
            }
            parsed.map(|(x, y)| PointerStep::Move(Point::new(x, y)))
        })
        .collect()
}

/// Feeds each step through the frame throttle, one frame per step.
fn replay(
    chart: &impl Hoverable,
    config: &ChartConfig,
    script: &[PointerStep],
) -> Vec<Option<HoverReport>> {
    let element = Rectangle::new(Point::ORIGIN, chart.view());
    let mut interaction = Interaction::default();

    script
        .iter()
        .map(|step| {
            let event = match step {
                PointerStep::Move(client) => PointerEvent::Moved {
                    client: *client,
                    element,
                },
                PointerStep::Leave => PointerEvent::Left,
            };
            interaction.on_event(event);
            interaction
                .on_frame(chart)
                .and_then(|hover| HoverReport::new(chart, hover, config))
        })
        .collect()
}
