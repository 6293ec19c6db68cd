use std::fmt;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use colored::*;
use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::{EnvFilter, FilterExt, Targets};
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{FmtContext, FormatEvent};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};

use crate::terminal::print::PRINT_TARGET;
use crate::terminal::spinner::SpinnerWriter;

/// Console formatter. Print-target events come out verbatim, everything
/// else gets a status symbol.
pub struct TadiscFormatter;

impl<S, N> FormatEvent<S, N> for TadiscFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();

        if meta.target() == PRINT_TARGET {
            let mut visitor = RawMessage::default();
            event.record(&mut visitor);
            return writeln!(writer, "{}", visitor.0);
        }

        let (symbol, color_func): (&str, fn(ColoredString) -> ColoredString) = match *meta.level() {
            Level::TRACE => ("[ ]", |s| s.dimmed()),
            Level::DEBUG => ("[?]", |s| s.blue()),
            Level::INFO => ("[+]", |s| s.green().bold()),
            Level::WARN => ("[*]", |s| s.yellow().bold()),
            Level::ERROR => ("[-]", |s| s.red().bold()),
        };

        write!(writer, "{} ", color_func(symbol.into()))?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Log file formatter: `<timestamp> [LEVEL] message`.
pub struct LogFileFormatter;

impl<S, N> FormatEvent<S, N> for LogFileFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        SystemTime.format_time(&mut writer)?;
        write!(writer, " [{}] ", event.metadata().level())?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

#[derive(Default)]
struct RawMessage(String);

impl Visit for RawMessage {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "raw_msg" {
            self.0 = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "raw_msg" {
            self.0 = format!("{value:?}");
        }
    }
}

/// Installs the global subscriber.
///
/// The log file is truncated and receives DEBUG and above from every
/// crate. The console always shows terminal output; log events reach it
/// only with `verbose`, at INFO unless `RUST_LOG` says otherwise.
pub fn init_logging(log_file: &Path, verbose: bool) -> anyhow::Result<()> {
    let file: File = File::create(log_file)
        .with_context(|| format!("failed to create log file {}", log_file.display()))?;

    let file_filter: Targets = Targets::new()
        .with_default(LevelFilter::DEBUG)
        .with_target(PRINT_TARGET, LevelFilter::OFF);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .event_format(LogFileFormatter)
        .with_writer(Mutex::new(file))
        .with_filter(file_filter);

    let print_filter: Targets = Targets::new().with_target(PRINT_TARGET, LevelFilter::INFO);
    let log_filter: EnvFilter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::new("off")
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .event_format(TadiscFormatter)
        .with_writer(|| SpinnerWriter)
        .with_filter(print_filter.or(log_filter));

    Registry::default()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("failed to install the logger")?;

    Ok(())
}
