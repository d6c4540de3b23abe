use chrono::{DateTime, Datelike, Local, Timelike};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::rolling;
use tracing_log::LogTracer;
use tracing_subscriber::filter::LevelFilter as SubLevel;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

pub const LOG_DIR: &str = "log";
const LATEST: &str = "latest.log";

/// `yyMMddHHmm` of the given time, with `-N` appended until the name is free.
pub fn archive_path(log_dir: &Path, modified: DateTime<Local>) -> PathBuf {
    let code = format!(
        "{:02}{:02}{:02}{:02}{:02}",
        modified.year() % 100,
        modified.month(),
        modified.day(),
        modified.hour(),
        modified.minute()
    );
    let mut candidate = log_dir.join(format!("{}.log", code));
    let mut idx = 1;
    while candidate.exists() {
        candidate = log_dir.join(format!("{}-{}.log", code, idx));
        idx += 1;
    }
    candidate
}

/// Move the previous run's `latest.log` aside.
pub fn archive_latest(log_dir: &Path) {
    let latest_path = log_dir.join(LATEST);
    let Ok(modified) = fs::metadata(&latest_path).and_then(|m| m.modified()) else {
        return;
    };
    let target = archive_path(log_dir, modified.into());
    if let Err(e) = fs::rename(&latest_path, &target) {
        eprintln!("Failed to archive {}: {}", latest_path.display(), e);
    }
}

/// Console layer (WARN, DEBUG with `--debug`) plus `log/latest.log` (INFO or DEBUG).
/// `log` records from the library crates are bridged into tracing.
pub fn init_logging(debug: bool) {
    let _ = LogTracer::init();

    let log_dir = Path::new(LOG_DIR);
    if let Err(e) = fs::create_dir_all(log_dir) {
        eprintln!("Failed to create log directory: {}", e);
    }
    archive_latest(log_dir);

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let file_appender = rolling::never(log_dir, LATEST);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    // Dropping the guard would stop the writer thread before shutdown.
    let _guard: &'static _ = Box::leak(Box::new(guard));

    let file_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_writer(non_blocking);

    let stdout_filter = if debug { SubLevel::DEBUG } else { SubLevel::WARN };
    let file_filter = if debug { SubLevel::DEBUG } else { SubLevel::INFO };

    let subscriber = tracing_subscriber::registry()
        .with(stdout_layer.with_filter(stdout_filter))
        .with(file_layer.with_filter(file_filter));
    let _ = subscriber.try_init();
}
