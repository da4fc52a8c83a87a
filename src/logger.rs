use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::{Mutex, OnceLock};

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Lines kept in the in-memory history
const HISTORY: usize = 1000;

/// Writes `LEVEL:target -- message` lines to stderr and keeps the latest ones.
pub struct Logger {
    level: LevelFilter,
    history: Mutex<VecDeque<(String, Level)>>,
}

impl Logger {
    pub fn new(level: LevelFilter) -> Self {
        Self {
            level,
            history: Mutex::new(VecDeque::new()),
        }
    }

    /// Most recent lines first.
    pub fn history(&self) -> Vec<(String, Level)> {
        match self.history.lock() {
            Ok(lines) => lines.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Forget every recorded line.
    pub fn clear_history(&self) {
        if let Ok(mut lines) = self.history.lock() {
            lines.clear();
        }
    }

    fn format(record: &Record) -> String {
        format!(
            "{}:{} -- {}",
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = Self::format(record);
        eprintln!("{}", line);
        if let Ok(mut lines) = self.history.try_lock() {
            lines.push_front((line, record.level()));
            lines.truncate(HISTORY);
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

static GLOBAL_LOGGER: OnceLock<Logger> = OnceLock::new();

/// Install the global logger. Only the first call sets the level.
pub fn init(level: LevelFilter) -> Result<&'static Logger, SetLoggerError> {
    let logger = GLOBAL_LOGGER.get_or_init(|| Logger::new(level));
    log::set_logger(logger)?;
    log::set_max_level(logger.level);
    Ok(logger)
}
