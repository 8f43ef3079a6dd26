// Centralized logging setup: console output, optional JSON file output, and span timing
use std::env;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Instant;

use eyre::{Result, WrapErr};
use tracing::field::{Field, Visit};
use tracing::{debug, span, Id, Subscriber};
use tracing_subscriber::{
    fmt,
    layer::{Context, Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter,
};

static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

const CRATE_TARGET: &str = "etf_basket_analyzer";
const LOG_DIR: &str = "logs";

/// Initialise the global subscriber for a binary.
///
/// Levels come from `CONSOLE_LOG_LEVEL` / `FILE_LOG_LEVEL` (default `INFO`); other crates
/// are held at `warn` except HTTP request tracing. `LOG_TO_FILE=true` adds a JSON file
/// layer under `logs/`.
pub fn init_logging(bin_name: String) -> Result<()> {
    let console_log_level = env::var("CONSOLE_LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string());
    let file_log_level = env::var("FILE_LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string());
    let log_to_file = env::var("LOG_TO_FILE").map(|v| v == "true").unwrap_or(false);

    // stdout is reserved for command output
    let console_layer = fmt::Layer::new()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(build_filter(&bin_name, &console_log_level));

    let file_layer = if log_to_file {
        let timestamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
        let log_dir = Path::new(LOG_DIR);
        fs::create_dir_all(log_dir).wrap_err("Failed to create log directory")?;

        let file_appender = tracing_appender::rolling::never(log_dir, format!("{bin_name}_{timestamp}.log"));
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        FILE_GUARD.set(guard).ok();

        Some(
            fmt::Layer::new()
                .json()
                .with_writer(non_blocking)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_filter(build_filter(&bin_name, &file_log_level)),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(SpanTimingLayer)
        .try_init()
        .wrap_err("Failed to set global tracing subscriber")?;

    Ok(())
}

fn build_filter(bin_name: &str, level: &str) -> EnvFilter {
    EnvFilter::try_new(format!(
        "warn,{CRATE_TARGET}={level},{bin_name}={level},tower_http=info"
    ))
    .unwrap_or_else(|_| EnvFilter::new(format!("warn,{CRATE_TARGET}=info")))
}

/// Logs the wall-clock lifetime of spans declared with `timed = true`.
struct SpanTimingLayer;

struct SpanStart(Instant);

struct TimedFlag(bool);

impl Visit for TimedFlag {
    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "timed" {
            self.0 = value;
        }
    }

    fn record_debug(&mut self, _field: &Field, _value: &dyn std::fmt::Debug) {}
}

impl<S> Layer<S> for SpanTimingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut timed = TimedFlag(false);
        attrs.record(&mut timed);
        if !timed.0 {
            return;
        }
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanStart(Instant::now()));
        }
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(&id) {
            let start = span.extensions_mut().remove::<SpanStart>();
            if let Some(SpanStart(start)) = start {
                debug!(span = span.name(), elapsed = ?start.elapsed(), "span closed");
            }
        }
    }
}
