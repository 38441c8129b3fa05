//! Configuration read from the environment
//!
//! Every value is read once on first access. `main` loads `.env` before anything touches these statics.

use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

fn expand_path(raw: String) -> String {
    shellexpand::tilde(&raw).to_string()
}

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Custom Bot API server (e.g. a local telegram-bot-api instance for files above 20 MB)
/// Read from BOT_API_URL environment variable
pub static BOT_API_URL: Lazy<Option<String>> =
    Lazy::new(|| env::var("BOT_API_URL").ok().filter(|value| !value.trim().is_empty()));

/// Public webhook URL for Telegram updates
/// Read from WEBHOOK_URL environment variable
pub static WEBHOOK_URL: Lazy<Option<String>> =
    Lazy::new(|| env::var("WEBHOOK_URL").ok().filter(|value| !value.trim().is_empty()));

/// Listen port for the webhook receiver and the health endpoint
/// Read from PORT environment variable
/// Default: 8080
pub static PORT: Lazy<u16> = Lazy::new(|| env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8080));

/// Thumbnail mapping file path
/// Read from THUMBNAILS_PATH environment variable, supports tilde (~) expansion
/// Default: thumbnails.json
pub static THUMBNAILS_PATH: Lazy<String> =
    Lazy::new(|| expand_path(env::var("THUMBNAILS_PATH").unwrap_or_else(|_| "thumbnails.json".to_string())));

/// Directory where per-upload scratch directories are created
/// Read from TEMP_FILES_DIR environment variable, supports tilde (~) expansion
/// Default: the system temp directory
pub static TEMP_FILES_DIR: Lazy<String> = Lazy::new(|| {
    env::var("TEMP_FILES_DIR")
        .map(expand_path)
        .unwrap_or_else(|_| env::temp_dir().to_string_lossy().to_string())
});

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| expand_path(env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string())));

/// Which photo variant becomes the thumbnail when Telegram offers several sizes
/// Read from PHOTO_SELECTION environment variable: largest | largest_file | last
/// Default: largest
pub static PHOTO_SELECTION: Lazy<String> =
    Lazy::new(|| env::var("PHOTO_SELECTION").unwrap_or_else(|_| "largest".to_string()));

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API calls (in seconds)
    /// Uploads of large documents go through the same client
    pub const REQUEST_TIMEOUT_SECS: u64 = 600;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Pending flow configuration
pub mod session {
    use super::Duration;
    use once_cell::sync::Lazy;
    use std::env;

    /// Default lifetime of an unfinished flow (15 minutes)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 900;

    /// Seconds after which an unfinished flow is dropped
    /// Read from SESSION_TIMEOUT_SECS environment variable, 0 disables expiry
    pub static TIMEOUT_SECS: Lazy<u64> = Lazy::new(|| {
        env::var("SESSION_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
    });

    /// Expiry for pending flows, `None` when disabled
    pub fn timeout() -> Option<Duration> {
        match *TIMEOUT_SECS {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Document size limits
pub mod limits {
    use once_cell::sync::Lazy;
    use std::env;

    /// Cloud Bot API refuses getFile above 20 MB
    pub const DEFAULT_MAX_DOCUMENT_SIZE_MB: u64 = 20;

    /// Largest document accepted for re-upload, in megabytes
    /// Read from MAX_DOCUMENT_SIZE_MB environment variable, 0 disables the check
    /// Raise it when BOT_API_URL points at a local Bot API server
    pub static MAX_DOCUMENT_SIZE_MB: Lazy<u64> = Lazy::new(|| {
        env::var("MAX_DOCUMENT_SIZE_MB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_DOCUMENT_SIZE_MB)
    });

    /// Limit in bytes, `None` when disabled
    pub fn max_document_size() -> Option<u64> {
        megabytes_to_bytes(*MAX_DOCUMENT_SIZE_MB)
    }

    pub(crate) fn megabytes_to_bytes(mb: u64) -> Option<u64> {
        match mb {
            0 => None,
            mb => Some(mb.saturating_mul(1024 * 1024)),
        }
    }
}
