//! Tracing setup for the `lineage` binary.
//!
//! Events go to stderr so the summaries on stdout can be piped. `RUST_LOG`
//! picks the level (default `info`) and `LINEAGE_LOG_FORMAT` picks the layout.

use std::str::FromStr;
use std::{env, sync::OnceLock};

use thiserror::Error;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FORMAT_ENV: &str = "LINEAGE_LOG_FORMAT";

const DEFAULT_DIRECTIVE: &str = "info";

static INSTALLED: OnceLock<LogFormat> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per event, with the active span attached.
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = raw.trim();
        if value.eq_ignore_ascii_case("human") {
            Ok(Self::Human)
        } else if value.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else {
            Err(LoggingError::UnknownFormat(value.to_owned()))
        }
    }
}

impl LogFormat {
    /// Reads the format from `LINEAGE_LOG_FORMAT`, defaulting to human output.
    pub fn from_env() -> Result<Self, LoggingError> {
        match env::var(LOG_FORMAT_ENV) {
            Ok(raw) => raw.parse(),
            Err(env::VarError::NotPresent) => Ok(Self::default()),
            Err(env::VarError::NotUnicode(_)) => Err(LoggingError::NotUnicode),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("LINEAGE_LOG_FORMAT is not valid UTF-8")]
    NotUnicode,
    #[error("unknown log format `{0}`, use `human` or `json`")]
    UnknownFormat(String),
}

/// Installs the global subscriber once. Later calls return the format chosen
/// by the first one.
///
/// A subscriber installed by someone else is left in place.
pub fn init_logging() -> Result<LogFormat, LoggingError> {
    if let Some(format) = INSTALLED.get() {
        return Ok(*format);
    }
    let format = LogFormat::from_env()?;
    install(format);
    Ok(*INSTALLED.get_or_init(|| format))
}

fn install(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    let layer = match format {
        LogFormat::Human => layer.boxed(),
        LogFormat::Json => layer.json().with_current_span(true).boxed(),
    };

    if let Err(err) = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
    {
        eprintln!("keeping existing tracing subscriber: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::lower("human", LogFormat::Human)]
    #[case::upper("HUMAN", LogFormat::Human)]
    #[case::padded(" json ", LogFormat::Json)]
    #[case::mixed("Json", LogFormat::Json)]
    fn test_parse_format(#[case] raw: &str, #[case] expected: LogFormat) {
        assert_eq!(expected, raw.parse::<LogFormat>().unwrap());
    }

    #[test]
    fn test_unknown_format_rejected() {
        match "xml".parse::<LogFormat>() {
            Err(LoggingError::UnknownFormat(value)) => assert_eq!("xml", value),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_init_is_idempotent() {
        let first = init_logging().unwrap();
        assert_eq!(first, init_logging().unwrap());
    }
}
