use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;
use chrono::Local;
use anyhow::Result;

const DEFAULT_LOG_FILE: &str = "stock_report.log";

static LOG_FILE: OnceLock<PathBuf> = OnceLock::new();

/// Sets the log destination. Only the first call takes effect.
pub fn init(path: impl Into<PathBuf>) {
    let _ = LOG_FILE.set(path.into());
}

pub fn log_error(category: &str, message: &str) -> Result<()> {
    log_message("ERROR", category, message)
}

pub fn log_info(category: &str, message: &str) -> Result<()> {
    log_message("INFO", category, message)
}

fn log_message(level: &str, category: &str, message: &str) -> Result<()> {
    let path = LOG_FILE
        .get()
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    write_entry(&mut file, level, category, message)
}

fn write_entry<W: Write>(out: &mut W, level: &str, category: &str, message: &str) -> Result<()> {
    let now = Local::now();
    writeln!(
        out,
        "[{}] {} - {}: {}",
        now.format("%Y-%m-%d %H:%M:%S"),
        level,
        category,
        message
    )?;

    Ok(())
}
