use thiserror::Error;

/// Error returned by a flow handler
///
/// Pipeline and persistence failures are answered inside the handler, so only a failed reply reaches
/// the per-event entry point, which logs it and sends a generic failure notice.
///
/// # Example
///
/// ```no_run
/// use rethumb::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Reply/file delivery errors from the messaging transport
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

/// Failure to deliver a reply, send a file or fetch a file through the messaging transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Telegram Bot API request failed
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// File body download failed
    #[error("Download error: {0}")]
    Download(#[from] teloxide::DownloadError),

    /// Local file handling around a transfer failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to load or save the thumbnail mapping file.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed thumbnail mapping: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a single document re-upload.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Scoped temporary directory could not be created
    #[error("Temporary storage error: {0}")]
    TempStorage(#[source] std::io::Error),

    /// The source document could not be downloaded
    #[error("Document download failed: {0}")]
    Download(#[source] TransportError),

    /// The renamed document could not be sent back
    #[error("Document upload failed: {0}")]
    Upload(#[source] TransportError),
}
