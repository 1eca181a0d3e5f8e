//! Logging bridge for the emacs-mode binary
//!
//! Routes `log::debug!()` and friends to stderr. The level comes from the
//! `--log-level` flag, then the EMACS_MODE_LOG environment variable:
//! - off or unset: nothing
//! - error, warn, info, debug, trace: that level and above
//!
//! Only records from this crate are shown unless the level is trace.

use log::{LevelFilter, Log, Metadata, Record};
use std::io::Write;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

pub const LOG_ENV: &str = "EMACS_MODE_LOG";

struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
            && (self.level == LevelFilter::Trace || metadata.target().starts_with("emacs_mode"))
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "[{}] [{:<5}] [{}] {}",
            timestamp(),
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

fn timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

/// Parse a level name; unknown names mean off.
pub fn parse_level(name: &str) -> LevelFilter {
    name.trim().parse::<LevelFilter>().unwrap_or(LevelFilter::Off)
}

/// Level from the flag if given, else from the environment.
pub fn resolve_level(flag: Option<&str>) -> LevelFilter {
    match flag {
        Some(name) => parse_level(name),
        None => std::env::var(LOG_ENV)
            .map(|v| parse_level(&v))
            .unwrap_or(LevelFilter::Off),
    }
}

/// Install the stderr logger. Later calls keep the first level.
pub fn init_log_bridge(flag: Option<&str>) {
    let level = resolve_level(flag);
    let logger = LOGGER.get_or_init(|| StderrLogger { level });
    if log::set_logger(logger).is_ok() {
        log::set_max_level(logger.level);
    }
}
