use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use tracing_appender::rolling;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "shoal.log";
const MAX_CONSOLE_LINES: usize = 1000;

/// Severity shown in the console overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for LogLevel {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => LogLevel::Trace,
            tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::INFO => LogLevel::Info,
            tracing::Level::WARN => LogLevel::Warn,
            tracing::Level::ERROR => LogLevel::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        f.pad(label)
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    /// An entry that did not come through `tracing`, such as command output.
    pub fn info(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: LogLevel::Info,
            target: target.into(),
            message: message.into(),
        }
    }
}

/// Ring buffer shared between the tracing layer and the console overlay.
pub type LogBuffer = Arc<Mutex<VecDeque<LogEntry>>>;

pub fn new_log_buffer(capacity: usize) -> LogBuffer {
    Arc::new(Mutex::new(VecDeque::with_capacity(capacity)))
}

/// Knobs for [`init`], usually filled from the `[logging]` config section.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Filter directive used when neither `SHOAL_LOG` nor `RUST_LOG` is set.
    pub filter: String,
    pub directory: Option<PathBuf>,
    pub retention_days: u64,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            filter: "info".into(),
            directory: None,
            retention_days: 7,
        }
    }
}

/// Resolve the log directory.
///
/// Precedence: `SHOAL_LOG_DIR` env var > configured directory > platform default
/// (`~/Library/Logs/shoal` on macOS, `$XDG_DATA_HOME/shoal/logs` elsewhere).
pub fn log_dir(configured: Option<&Path>) -> PathBuf {
    if let Ok(dir) = std::env::var("SHOAL_LOG_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(dir) = configured {
        return dir.to_path_buf();
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = dirs::home_dir() {
            return home.join("Library").join("Logs").join("shoal");
        }
    }

    #[cfg(not(target_os = "macos"))]
    {
        if let Some(data) = dirs::data_dir() {
            return data.join("shoal").join("logs");
        }
    }

    PathBuf::from("logs")
}

/// Delete rolled log files older than `max_age`. Only names starting with
/// the appender prefix are touched. Returns how many files were removed.
fn cleanup_old_logs(log_path: &Path, max_age: Duration) -> usize {
    let cutoff = SystemTime::now()
        .checked_sub(max_age)
        .unwrap_or(SystemTime::UNIX_EPOCH);
    let Ok(entries) = std::fs::read_dir(log_path) else {
        return 0;
    };
    entries
        .flatten()
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(LOG_FILE_PREFIX))
        .filter(|entry| {
            entry
                .metadata()
                .and_then(|meta| meta.modified())
                .is_ok_and(|modified| modified <= cutoff)
        })
        .filter(|entry| std::fs::remove_file(entry.path()).is_ok())
        .count()
}

/// Mirrors events into the console ring buffer.
struct ConsoleLayer {
    buffer: LogBuffer,
    max_lines: usize,
}

impl<S: tracing::Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let entry = LogEntry {
            level: LogLevel::from(*event.metadata().level()),
            target: event.metadata().target().to_string(),
            message: visitor.finish(),
        };

        if let Ok(mut buf) = self.buffer.lock() {
            if buf.len() >= self.max_lines {
                buf.pop_front();
            }
            buf.push_back(entry);
        }
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        let fields = self.fields.join(" ");
        match self.message {
            Some(msg) if fields.is_empty() => msg,
            Some(msg) => format!("{msg} {fields}"),
            None => fields,
        }
    }

    fn record(&mut self, name: &str, value: String) {
        if name == "message" {
            self.message = Some(value);
        } else {
            self.fields.push(format!("{name}={value}"));
        }
    }
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        self.record(field.name(), format!("{value:?}"));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.record(field.name(), value.to_string());
    }
}

/// Install the global subscriber and return the console buffer.
///
/// Filter: `SHOAL_LOG`, then `RUST_LOG`, then `options.filter`.
/// File output rotates daily in [`log_dir`]; files older than the retention
/// period are removed at startup.
pub fn init(options: &LogOptions) -> Result<LogBuffer> {
    let buffer = new_log_buffer(MAX_CONSOLE_LINES);

    let filter = EnvFilter::try_from_env("SHOAL_LOG")
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .or_else(|_| EnvFilter::try_new(&options.filter))
        .with_context(|| format!("invalid log filter {:?}", options.filter))?;

    let log_path = log_dir(options.directory.as_deref());
    std::fs::create_dir_all(&log_path)
        .with_context(|| format!("failed to create log directory {}", log_path.display()))?;
    let removed = cleanup_old_logs(&log_path, Duration::from_secs(options.retention_days * 86_400));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(rolling::daily(&log_path, LOG_FILE_PREFIX))
        .with_ansi(false)
        .with_target(true);

    let console_layer = ConsoleLayer {
        buffer: Arc::clone(&buffer),
        max_lines: MAX_CONSOLE_LINES,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    tracing::debug!(dir = %log_path.display(), removed, "logging initialised");
    Ok(buffer)
}
