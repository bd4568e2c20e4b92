//! File logging. The terminal belongs to the TUI, so nothing is written to
//! stdout or stderr once the session starts.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_LEVEL_ENV: &str = "TASKTREE_LOG_LEVEL";
const DEFAULT_LEVEL: &str = "warn";

/// Install a file-backed subscriber. Returns the log file path.
pub fn init_logging() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let log_dir = get_log_directory()?;
    fs::create_dir_all(&log_dir)?;

    let log_file_path = get_log_file_path(&log_dir);
    let file = fs::File::create(&log_file_path)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    // Flushes for the life of the process.
    std::mem::forget(guard);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(build_log_filter(std::env::var(LOG_LEVEL_ENV).ok().as_deref()))
        .with(file_layer)
        .try_init()?;

    tracing::info!(path = %log_file_path.display(), "logging initialized");
    Ok(log_file_path)
}

fn build_log_filter(raw: Option<&str>) -> EnvFilter {
    EnvFilter::new(filter_directive(raw))
}

/// Dependencies stay at `warn`; the crate follows the requested level.
fn filter_directive(raw: Option<&str>) -> String {
    let level = raw.and_then(normalize_log_level).unwrap_or(DEFAULT_LEVEL);
    format!("{DEFAULT_LEVEL},{}={level}", env!("CARGO_CRATE_NAME"))
}

fn normalize_log_level(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        "error" => Some("error"),
        "off" => Some("off"),
        _ => None,
    }
}

pub fn get_log_directory() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let data_dir = dirs::data_local_dir().ok_or("failed to determine local data directory")?;
    Ok(data_dir.join("tasktree").join("logs"))
}

pub fn get_log_file_path(log_dir: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    log_dir.join(format!("tasktree-{timestamp}.log"))
}
