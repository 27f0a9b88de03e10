use log::{Level, LevelFilter, Log, Metadata, Record};

/// Log severity accepted by [`init_logging`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

impl From<Level> for LogLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Error => LogLevel::Error,
            Level::Warn => LogLevel::Warn,
            Level::Info => LogLevel::Info,
            Level::Debug | Level::Trace => LogLevel::Debug,
        }
    }
}

/// Console logger writing one line per record to stderr.
struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        eprintln!(
            "{}",
            format_log_line(
                record.level().into(),
                record.target(),
                &record.args().to_string(),
                &jiff::Zoned::now().to_string(),
            )
        );
    }

    fn flush(&self) {}
}

/// Initialize the logging system at `level`.
pub fn init_logging(level: LogLevel) {
    let logger = StderrLogger {
        level: level.to_level_filter(),
    };

    if log::set_boxed_logger(Box::new(logger)).is_err() {
        eprintln!("Warning: Logging system already initialized");
        return;
    }
    log::set_max_level(level.to_level_filter());
}

fn format_log_line(level: LogLevel, target: &str, message: &str, timestamp: &str) -> String {
    format!(
        "[{}] {} {}: {}",
        level.as_str().to_uppercase(),
        timestamp,
        target,
        message
    )
}
