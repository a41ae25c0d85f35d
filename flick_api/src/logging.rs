//! Process-wide logging for applications embedding Flick.
//!
//! Library code only emits `tracing` events. An application calls [init] once at startup to
//! print them to stderr and append them to a log file.

use std::{
    backtrace::Backtrace,
    fmt, fs,
    io::Write,
    panic::{self, PanicInfo},
    path::Path,
    sync::Mutex,
};

use once_cell::sync::{Lazy, OnceCell};
use tracing::{
    field::{Field, Visit},
    Event, Level, Subscriber,
};
use tracing_log::LogTracer;
use tracing_subscriber::{layer::Context, prelude::*, registry::LookupSpan, Layer};

use crate::Error;

static LOG_FILE: OnceCell<Mutex<fs::File>> = OnceCell::new();
static RECENT_PANIC_DETAILS: Lazy<Mutex<Option<String>>> = Lazy::new(|| Mutex::new(None));

/// Events more verbose than this are dropped.
const MAX_LEVEL: Level = Level::INFO;

/// Install the global subscriber and panic hook, appending to `log_file_path`.
///
/// This can only succeed once per process.
pub fn init(log_file_path: &Path) -> Result<(), Error> {
    let log_file = fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(log_file_path)
        .map_err(|error| {
            Error::LogInitError(format!("{}: {}", log_file_path.display(), error))
        })?;
    LOG_FILE
        .set(Mutex::new(log_file))
        .map_err(|_| Error::LogInitError("logging is already initialized".to_string()))?;

    LogTracer::init().map_err(|error| Error::LogInitError(error.to_string()))?;
    tracing::subscriber::set_global_default(tracing_subscriber::Registry::default().with(LogLayer))
        .map_err(|error| Error::LogInitError(error.to_string()))?;
    panic::set_hook(Box::new(panic_hook));

    tracing::info!("logging to {}", log_file_path.display());
    Ok(())
}

/// Append a raw line to the log file. Does nothing if [init] hasn't been called.
pub fn print_to_log_file(line: &str) {
    if let Some(log_file) = LOG_FILE.get() {
        let mut log_file = log_file.lock().unwrap();
        // Nowhere left to report a failing log file
        let _ = writeln!(log_file, "{}", line).and_then(|_| log_file.flush());
    }
}

/// Return and clear the details of the most recent panic, including its backtrace.
pub fn take_recent_panic_details() -> Option<String> {
    RECENT_PANIC_DETAILS.lock().unwrap().take()
}

fn format_line(
    timestamp: &str,
    level: Level,
    scope: &[&str],
    target: &str,
    message: &str,
) -> String {
    let mut line = format!("[{}] [{}] ", timestamp, level);
    if !scope.is_empty() {
        line += &format!("[{}] ", scope.join("."));
    }
    line += &format!("[{}] {}", target, message);
    line
}

fn panic_hook(info: &PanicInfo<'_>) {
    let location = match info.location() {
        Some(location) => location.to_string(),
        None => "<unknown>".to_string(),
    };
    let msg = match info.payload().downcast_ref::<&'static str>() {
        Some(s) => *s,
        None => match info.payload().downcast_ref::<String>() {
            Some(s) => &s[..],
            None => "Box<Any>",
        },
    };
    let thread = std::thread::current();
    let thread_name = thread.name().unwrap_or("<unnamed>");
    let backtrace = Backtrace::force_capture();

    let panic_details = format!(
        "Thread '{}' panicked at {}: {}\n{}",
        thread_name, location, msg, backtrace
    );

    *RECENT_PANIC_DETAILS.lock().unwrap() = Some(panic_details.clone());
    tracing::error!("{}", panic_details);
}

struct LogLayer;

#[derive(Default)]
struct MessageVisitor {
    message: String,
    log_target: Option<String>,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "log.target" => self.log_target = Some(value.to_string()),
            "message" => self.message = value.to_string(),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}

impl<S> Layer<S> for LogLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > MAX_LEVEL {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let scope: Vec<&str> = match ctx.event_scope(event) {
            Some(scope) => scope.from_root().map(|span| span.name()).collect(),
            None => Vec::new(),
        };
        let target = visitor
            .log_target
            .unwrap_or_else(|| metadata.target().to_string());
        let timestamp = chrono::Local::now()
            .format("%Y-%m-%d %H:%M:%S%.3f")
            .to_string();

        let line = format_line(
            &timestamp,
            *metadata.level(),
            &scope,
            &target,
            &visitor.message,
        );
        eprintln!("{}", line);
        print_to_log_file(&line);
    }
}
