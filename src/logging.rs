//! Structured logging setup shared by both binaries.
//!
//! Modeled on `log_controller.py`'s
//! `logging.basicConfig(format="%(asctime)s - %(levelname)s - %(message)s",
//! datefmt="%H:%M:%S")`, reproduced here as a custom `tracing_subscriber`
//! event formatter so the on-disk logs keep the exact `HH:MM:SS - LEVEL -
//! message` shape named in the protocol, while the console gets `tracing`'s
//! normal human-readable output. `auth.log` is a second file sink carrying
//! only events logged under the `"auth"` target (the accept loop's
//! `authorised`/`rejected` lines, the protocol).

use std::fmt;
use std::path::Path;

use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

struct ClockFormat;

impl<S, N> FormatEvent<S, N> for ClockFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> fmt::Result {
        let now = chrono::Local::now().format("%H:%M:%S");
        write!(writer, "{now} - {} - ", event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Must be kept alive for the lifetime of the process; dropping it stops the
/// background thread that flushes buffered log lines to disk.
pub struct LogGuards {
    _server: WorkerGuard,
    _auth: WorkerGuard,
}

/// Installs the controller's three log sinks: a human-readable console
/// layer filtered by `RUST_LOG`/`verbosity`, an append-only `server.log` in
/// the `HH:MM:SS - LEVEL - message` format for everything, and an
/// append-only `auth.log` in the same format for `target: "auth"` events
/// only (the protocol "Persisted state": `auth.log`, `server.log`).
pub fn init_controller(data_dir: &Path, verbosity: u8) -> anyhow::Result<LogGuards> {
    std::fs::create_dir_all(data_dir)?;

    let server_appender = tracing_appender::rolling::never(data_dir, "server.log");
    let (server_writer, server_guard) = tracing_appender::non_blocking(server_appender);

    let auth_appender = tracing_appender::rolling::never(data_dir, "auth.log");
    let (auth_writer, auth_guard) = tracing_appender::non_blocking(auth_appender);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(console_filter(verbosity));

    let server_layer = tracing_subscriber::fmt::layer()
        .event_format(ClockFormat)
        .with_ansi(false)
        .with_writer(server_writer)
        .with_filter(EnvFilter::new("info"));

    let auth_layer = tracing_subscriber::fmt::layer()
        .event_format(ClockFormat)
        .with_ansi(false)
        .with_writer(auth_writer)
        .with_filter(filter_fn(|meta| meta.target() == "auth"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(server_layer)
        .with(auth_layer)
        .init();

    Ok(LogGuards {
        _server: server_guard,
        _auth: auth_guard,
    })
}

/// Installs a console-only logger for the agent; the agent has no persisted
/// log files of its own (the protocol "Persisted state" names only the
/// controller's `auth.log`/`server.log`).
pub fn init_agent(verbosity: u8) {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(console_filter_directive(verbosity))
        .init();
}

fn console_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(console_filter_directive(verbosity)))
}

fn console_filter_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}
