//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - A configuration banner logged once at startup

use anyhow::Result;
use simplelog::*;
use std::fs::File;
use std::path::Path;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
    if let Some(parent) = Path::new(log_file_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("Failed to create log directory: {}", e))?;
        }
    }
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the effective configuration at application startup
///
/// The bot token is never logged, only whether it is present.
pub fn log_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("🖼️  rethumb configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if config::BOT_TOKEN.is_empty() {
        log::error!("❌ BOT_TOKEN: not set");
    } else {
        log::info!("✅ BOT_TOKEN: set");
    }

    match config::BOT_API_URL.as_deref() {
        Some(url) => log::info!("BOT_API_URL: {}", url),
        None => log::info!("BOT_API_URL: default (api.telegram.org)"),
    }

    log::info!("THUMBNAILS_PATH: {}", config::THUMBNAILS_PATH.as_str());
    log::info!("TEMP_FILES_DIR: {}", config::TEMP_FILES_DIR.as_str());
    log::info!("PHOTO_SELECTION: {}", config::PHOTO_SELECTION.as_str());

    match config::session::timeout() {
        Some(timeout) => log::info!("SESSION_TIMEOUT_SECS: {}", timeout.as_secs()),
        None => log::warn!("⚠️  SESSION_TIMEOUT_SECS: 0 (unfinished flows never expire)"),
    }

    match config::limits::max_document_size() {
        Some(_) => log::info!("MAX_DOCUMENT_SIZE_MB: {}", *config::limits::MAX_DOCUMENT_SIZE_MB),
        None => log::info!("MAX_DOCUMENT_SIZE_MB: unlimited"),
    }

    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    #[test]
    fn test_init_logger_creates_log_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("app.log");

        // Another test may already have installed the global logger; either way the file must exist.
        let _ = init_logger(path.to_str().unwrap());

        assert!(path.exists());
    }
}
