use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{Event, Level, Subscriber, debug};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        FmtContext,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Log line layout: `YYYY-MM-DD HH:MM:SS.mmm LEVEL target: message key=value`,
/// in local time. Level colors are only emitted when the writer supports ANSI.
struct PayoutLogFormat;

/// Keeps the crate and leaf module of a target:
/// `payout_core::calculations::payout` becomes `payout_core::payout`.
fn short_target(target: &str) -> String {
    match (target.split("::").next(), target.rsplit("::").next()) {
        (Some(krate), Some(leaf)) if krate != leaf => format!("{krate}::{leaf}"),
        _ => target.to_string(),
    }
}

fn level_style(level: Level) -> &'static str {
    match level {
        Level::ERROR => "\x1b[31m",
        Level::WARN => "\x1b[33m",
        Level::INFO => "\x1b[32m",
        Level::DEBUG => "\x1b[36m",
        Level::TRACE => "\x1b[90m",
    }
}

impl<S, N> FormatEvent<S, N> for PayoutLogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let level = *meta.level();
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");

        if writer.has_ansi_escapes() {
            write!(writer, "{timestamp} {}{level:<5}\x1b[0m ", level_style(level))?;
        } else {
            write!(writer, "{timestamp} {level:<5} ")?;
        }

        write!(writer, "{}: ", short_target(meta.target()))?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Builds the level filter.
///
/// An explicit `level` (bare level or full directive) wins; otherwise
/// `RUST_LOG` is honoured, falling back to `info`.
fn make_filter(level: Option<&str>) -> Result<EnvFilter> {
    match level {
        Some(level) => EnvFilter::try_new(level)
            .map_err(|e| anyhow::anyhow!("invalid log level '{level}': {e}")),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))),
    }
}

/// Initializes logging. Call once at startup.
///
/// - Stderr: colored when attached to a terminal, plain when piped. Stdout is
///   left free for CSV output.
/// - File: appended to when `log_file` is given. The directory must exist.
/// - Level: `level` if given, else `RUST_LOG`, else INFO.
///
/// A second call keeps the existing subscriber, unless it asks for a log
/// file, which is then an error.
pub fn init_logging(
    level: Option<&str>,
    log_file: Option<&Path>,
) -> Result<()> {
    let filter = make_filter(level)?;

    let file_layer = log_file
        .map(|path| {
            File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file '{}'", path.display()))
        })
        .transpose()?
        .map(|file| {
            tracing_subscriber::fmt::layer()
                .event_format(PayoutLogFormat)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
        });

    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(PayoutLogFormat)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);

    let wants_file = file_layer.is_some();
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    match installed {
        Ok(()) => Ok(()),
        // A file was asked for but would never be written to.
        Err(e) if wants_file => Err(anyhow::anyhow!(
            "cannot log to file, a global subscriber is already installed: {e}"
        )),
        Err(_) => {
            debug!("Global subscriber already installed; keeping it");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_filter_accepts_bare_levels_and_directives() {
        assert!(make_filter(Some("debug")).is_ok());
        assert!(make_filter(Some("warn,payout_core=trace")).is_ok());
    }

    #[test]
    fn make_filter_rejects_garbage() {
        assert!(make_filter(Some("loud[")).is_err());
    }

    #[test]
    fn make_filter_defaults_without_level() {
        assert!(make_filter(None).is_ok());
    }

    #[test]
    fn short_target_keeps_crate_and_leaf() {
        assert_eq!(short_target("payout_core::calculations::payout"), "payout_core::payout");
        assert_eq!(short_target("payout_data::loader"), "payout_data::loader");
        assert_eq!(short_target("payout_calc"), "payout_calc");
    }

    #[test]
    fn log_file_is_refused_once_a_subscriber_is_installed() {
        // Installs the global subscriber, or finds one already there.
        assert!(init_logging(Some("warn"), None).is_ok());
        let path = std::env::temp_dir().join("payout-data-logging-test.log");

        let result = init_logging(None, Some(&path));
        let _ = std::fs::remove_file(&path);

        assert!(result.is_err());
        assert!(init_logging(None, None).is_ok());
    }
}
