use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, bail};
use lazy_static::lazy_static;
use slog::Drain;

pub use slog::Level;

pub const ENV_LOG_LEVEL: &str = "HULK_LOG_LEVEL";

static LOG_LEVEL: AtomicUsize = AtomicUsize::new(usize::MAX);

lazy_static! {
    static ref GLOBAL_LOG_GUARD: Mutex<Option<slog_scope::GlobalLoggerGuard>> = Mutex::new(None);
}

pub fn get_log_level() -> Option<Level> {
    Level::from_usize(LOG_LEVEL.load(Ordering::Relaxed))
}

pub fn set_log_level(level: Level) {
    LOG_LEVEL.store(level.as_usize(), Ordering::SeqCst);
}

pub fn parse_level(s: &str) -> anyhow::Result<Level> {
    let level = match s.trim().to_ascii_lowercase().as_str() {
        "trace" => Level::Trace,
        "debug" => Level::Debug,
        "info" => Level::Info,
        "warn" | "warning" => Level::Warning,
        "error" => Level::Error,
        "crit" | "critical" => Level::Critical,
        _ => bail!("invalid log level '{}'", s),
    };
    Ok(level)
}

/// Installs the global logger, reading the level from `HULK_LOG_LEVEL`.
pub fn init() -> anyhow::Result<()> {
    let level = match std::env::var(ENV_LOG_LEVEL) {
        Ok(level) => parse_level(&level)?,
        Err(_) => Level::Info,
    };
    init_with_level(level)
}

/// Installs the global logger and routes the `log` facade into it.
///
/// Only the first call has an effect.
pub fn init_with_level(level: Level) -> anyhow::Result<()> {
    let mut guard = GLOBAL_LOG_GUARD
        .lock()
        .map_err(|_| anyhow!("logger lock poisoned"))?;
    if guard.is_some() {
        return Ok(());
    }

    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = slog::LevelFilter::new(drain, level).fuse();
    let logger = slog::Logger::root(drain, slog::o!());

    let scope_guard = slog_scope::set_global_logger(logger);
    slog_stdlog::init_with_level(to_log_level(level))?;
    *guard = Some(scope_guard);
    set_log_level(level);
    Ok(())
}

/// Flushes pending records and detaches the global logger.
pub fn shutdown() {
    if let Ok(mut guard) = GLOBAL_LOG_GUARD.lock() {
        guard.take();
    }
}

fn to_log_level(level: Level) -> log::Level {
    match level {
        Level::Critical | Level::Error => log::Level::Error,
        Level::Warning => log::Level::Warn,
        Level::Info => log::Level::Info,
        Level::Debug => log::Level::Debug,
        Level::Trace => log::Level::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::assert::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(assert_ok!(parse_level("warning")), Level::Warning);
        assert_eq!(assert_ok!(parse_level("WARN")), Level::Warning);
        assert_eq!(assert_ok!(parse_level(" debug ")), Level::Debug);
        assert_eq!(assert_ok!(parse_level("critical")), Level::Critical);
        assert_err!(parse_level("loud"));
    }

    #[test]
    fn test_init_once() {
        assert_ok!(init_with_level(Level::Debug));
        assert_ok!(init_with_level(Level::Error));
        assert_eq!(get_log_level(), Some(Level::Debug));
        log::debug!("logger installed");
    }
}
