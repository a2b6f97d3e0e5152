use std::str::FromStr;

const LEVEL_ENV: &str = "FOLIO_CHART_LOG";
const FILE_ENV: &str = "FOLIO_CHART_LOG_FILE";

/// Routes `log` records to stderr, and to a file when `FOLIO_CHART_LOG_FILE` is set.
///
/// Stdout is reserved for the JSON scenes.
pub fn setup() -> Result<(), fern::InitError> {
    let level = std::env::var(LEVEL_ENV)
        .ok()
        .and_then(|s| log::LevelFilter::from_str(s.trim()).ok())
        .unwrap_or(log::LevelFilter::Info);

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr());

    if let Ok(path) = std::env::var(FILE_ENV) {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;
    Ok(())
}
