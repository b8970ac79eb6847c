//! Leveled stderr diagnostics.
//!
//! Diagnostics go to stderr through the `log` facade so every module
//! reports findings the same way, and so the threshold can be raised or
//! lowered without touching call sites. The numeric threshold scheme is
//! inherited from the original loader (10 debug .. 50 critical, default
//! 30/warning) and selected through `GATECHECK_LOGLEVEL`.

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::sync::atomic::{AtomicU8, Ordering};

/// Numeric diagnostic levels, ordered by severity.
pub const LEVEL_DEBUG: u8 = 10;
/// Informational findings (resolved paths, policy selection).
pub const LEVEL_INFO: u8 = 20;
/// The default threshold.
pub const LEVEL_WARNING: u8 = 30;
/// Security violations and hard failures.
pub const LEVEL_ERROR: u8 = 40;
/// Upper bound of the accepted range.
pub const LEVEL_CRITICAL: u8 = 50;

/// Environment variable selecting the diagnostic threshold.
pub const LOGLEVEL_ENV: &str = "GATECHECK_LOGLEVEL";

static THRESHOLD: AtomicU8 = AtomicU8::new(LEVEL_WARNING);

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

fn numeric(level: Level) -> u8 {
    match level {
        Level::Error => LEVEL_ERROR,
        Level::Warn => LEVEL_WARNING,
        Level::Info => LEVEL_INFO,
        Level::Debug | Level::Trace => LEVEL_DEBUG,
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        numeric(metadata.level()) >= THRESHOLD.load(Ordering::Relaxed)
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("gatecheck: {}: {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Installs the stderr logger. Idempotent: a second call (e.g. from
/// multiple tests in one process) is a no-op.
pub fn init() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

/// Applies the environment's numeric threshold, if any.
///
/// Values outside `10..=50` are reported and leave the threshold
/// unchanged, exactly like an unrecognized policy name: a typo must not
/// silently change what gets reported.
pub fn apply_env_threshold(env_value: Option<&str>) {
    let Some(raw) = env_value else {
        return;
    };
    match raw.parse::<u8>() {
        Ok(level) if (LEVEL_DEBUG..=LEVEL_CRITICAL).contains(&level) => {
            THRESHOLD.store(level, Ordering::Relaxed);
            log::debug!("diagnostic threshold set to {level}");
        }
        _ => log::warn!("invalid environment setting {LOGLEVEL_ENV}={raw}"),
    }
}
