use thiserror::Error;

/// Centralized error types for the application
///
/// All errors in the application are converted to this enum for consistent
/// error handling. Uses `thiserror` for automatic conversion and display
/// formatting. Per-request failures are reported back to the user with the
/// `Display` text of the variant.
#[derive(Error, Debug)]
pub enum AppError {
    /// Startup configuration errors (missing or malformed settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// Downloader failures (spawn error, nonzero exit)
    #[error("Download failed: {0}")]
    Download(String),

    /// The downloader did not finish within the configured wall-clock limit
    #[error("Download timed out after {0} seconds")]
    DownloadTimeout(u64),

    /// The downloader exited cleanly but its output matched no known
    /// completion pattern
    #[error("Could not determine downloaded file path")]
    PathUndeterminable,

    /// Storage backend failures
    #[error("Upload failed: {0}")]
    Upload(String),

    /// HTTP errors from the storage clients
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
