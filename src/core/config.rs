//! Process configuration
//!
//! Everything the bot needs is collected into one immutable [`AppConfig`]
//! value at startup and passed explicitly into each component. Missing
//! required variables abort startup with a single error naming all of them.

use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

use crate::core::error::AppError;
use crate::download::proxy;

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: tubevault.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "tubevault.log".to_string()));

/// Download configuration
pub mod download {
    /// Default wall-clock limit for one downloader run (in seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 3600; // 1 hour

    /// Timeout for the startup `--version` probe (in seconds)
    pub const VERSION_PROBE_TIMEOUT_SECS: u64 = 10;

    /// How much captured stderr is kept in a download error message
    pub const ERROR_TAIL_CHARS: usize = 500;
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Telegram HTTP requests (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 900; // 15 minutes

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Settings for the S3-compatible backend
#[derive(Debug, Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Settings for the Dropbox backend
#[derive(Debug, Clone)]
pub struct DropboxConfig {
    pub access_token: String,
}

/// Storage backend selected once at startup via STORAGE_BACKEND
#[derive(Debug, Clone)]
pub enum StorageConfig {
    S3(S3Config),
    Dropbox(DropboxConfig),
}

impl StorageConfig {
    /// Backend name used in logs and user-facing replies
    pub fn backend_name(&self) -> &'static str {
        match self {
            StorageConfig::S3(_) => "S3",
            StorageConfig::Dropbox(_) => "Dropbox",
        }
    }
}

/// Immutable process-wide configuration, loaded once in `main`
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Telegram bot token (BOT_TOKEN, falling back to TELOXIDE_TOKEN)
    pub bot_token: String,
    /// The single Telegram user id allowed to use the bot
    pub allowed_user_id: u64,
    /// Directory for transient downloaded files
    pub download_dir: String,
    /// Wall-clock limit for one downloader run
    pub download_timeout: Duration,
    /// Downloader binary (YTDL_BIN, default "yt-dlp")
    pub ytdl_bin: String,
    /// Optional Netscape-format cookies file handed to the downloader
    pub cookies_file: Option<String>,
    /// Optional proxy URL handed to the downloader
    pub proxy_url: Option<String>,
    /// Storage backend settings
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Builds the configuration from the process environment.
    ///
    /// All required variables are checked before returning so the error
    /// lists every missing name at once instead of failing one at a time.
    pub fn from_env() -> Result<Self, AppError> {
        let mut missing: Vec<&'static str> = Vec::new();

        let bot_token = env::var("BOT_TOKEN")
            .or_else(|_| env::var("TELOXIDE_TOKEN"))
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| {
                missing.push("BOT_TOKEN");
                String::new()
            });

        let allowed_user_raw = require(&mut missing, "ALLOWED_USER_ID");

        let backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "s3".to_string())
            .trim()
            .to_lowercase();

        let storage = match backend.as_str() {
            "s3" => StorageConfig::S3(S3Config {
                endpoint: require(&mut missing, "S3_ENDPOINT"),
                region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                bucket: require(&mut missing, "S3_BUCKET"),
                access_key_id: require(&mut missing, "S3_ACCESS_KEY_ID"),
                secret_access_key: require(&mut missing, "S3_SECRET_ACCESS_KEY"),
            }),
            "dropbox" => StorageConfig::Dropbox(DropboxConfig {
                access_token: require(&mut missing, "DROPBOX_ACCESS_TOKEN"),
            }),
            other => {
                return Err(AppError::Config(format!(
                    "Unknown STORAGE_BACKEND '{}': expected 's3' or 'dropbox'",
                    other
                )))
            }
        };

        if !missing.is_empty() {
            return Err(AppError::Config(format!(
                "Missing environment variables: {}. Please check your .env file",
                missing.join(", ")
            )));
        }

        let allowed_user_id = allowed_user_raw.trim().parse::<u64>().map_err(|_| {
            AppError::Config(format!(
                "ALLOWED_USER_ID must be a numeric Telegram user id, got '{}'",
                allowed_user_raw
            ))
        })?;

        let download_timeout_secs = match env::var("DOWNLOAD_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
                AppError::Config(format!(
                    "DOWNLOAD_TIMEOUT_SECS must be a number of seconds, got '{}'",
                    raw
                ))
            })?,
            Err(_) => download::DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            bot_token,
            allowed_user_id,
            download_dir: env::var("DOWNLOAD_DIR").unwrap_or_else(|_| "./downloads".to_string()),
            download_timeout: Duration::from_secs(download_timeout_secs),
            ytdl_bin: env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string()),
            cookies_file: env::var("YTDL_COOKIES_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            proxy_url: proxy::proxy_from_env(),
            storage,
        })
    }
}

/// Reads a required variable, recording its name when absent or blank.
fn require(missing: &mut Vec<&'static str>, name: &'static str) -> String {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => {
            missing.push(name);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One sequential test so parallel test threads never race on the
    /// shared process environment.
    #[test]
    fn from_env_collects_missing_variables_then_succeeds() {
        let all_vars = [
            "BOT_TOKEN",
            "TELOXIDE_TOKEN",
            "ALLOWED_USER_ID",
            "STORAGE_BACKEND",
            "S3_ENDPOINT",
            "S3_REGION",
            "S3_BUCKET",
            "S3_ACCESS_KEY_ID",
            "S3_SECRET_ACCESS_KEY",
            "DROPBOX_ACCESS_TOKEN",
            "DOWNLOAD_TIMEOUT_SECS",
        ];
        for var in all_vars {
            env::remove_var(var);
        }

        // Nothing set: every required name shows up in one message.
        let err = AppConfig::from_env().expect_err("empty env must fail");
        let message = err.to_string();
        for name in [
            "BOT_TOKEN",
            "ALLOWED_USER_ID",
            "S3_ENDPOINT",
            "S3_BUCKET",
            "S3_ACCESS_KEY_ID",
            "S3_SECRET_ACCESS_KEY",
        ] {
            assert!(message.contains(name), "missing '{}' in: {}", name, message);
        }

        // Full S3 environment loads with defaults applied.
        env::set_var("BOT_TOKEN", "123:abc");
        env::set_var("ALLOWED_USER_ID", "42");
        env::set_var("S3_ENDPOINT", "https://minio.example.com");
        env::set_var("S3_BUCKET", "media");
        env::set_var("S3_ACCESS_KEY_ID", "AKID");
        env::set_var("S3_SECRET_ACCESS_KEY", "secret");
        let config = AppConfig::from_env().expect("full env must load");
        assert_eq!(config.allowed_user_id, 42);
        assert_eq!(config.ytdl_bin, "yt-dlp");
        assert_eq!(config.download_dir, "./downloads");
        assert_eq!(
            config.download_timeout,
            Duration::from_secs(download::DEFAULT_TIMEOUT_SECS)
        );
        assert_eq!(config.storage.backend_name(), "S3");

        // 30-minute variant is plain configuration.
        env::set_var("DOWNLOAD_TIMEOUT_SECS", "1800");
        let config = AppConfig::from_env().expect("timeout override must load");
        assert_eq!(config.download_timeout, Duration::from_secs(1800));

        // Dropbox backend swaps the required set.
        env::set_var("STORAGE_BACKEND", "dropbox");
        let err = AppConfig::from_env().expect_err("dropbox without token must fail");
        assert!(err.to_string().contains("DROPBOX_ACCESS_TOKEN"));
        env::set_var("DROPBOX_ACCESS_TOKEN", "sl.token");
        let config = AppConfig::from_env().expect("dropbox env must load");
        assert_eq!(config.storage.backend_name(), "Dropbox");

        // Unknown backend and malformed numbers are configuration errors.
        env::set_var("STORAGE_BACKEND", "ftp");
        assert!(AppConfig::from_env().is_err());
        env::set_var("STORAGE_BACKEND", "s3");
        env::set_var("ALLOWED_USER_ID", "not-a-number");
        assert!(AppConfig::from_env().is_err());

        for var in all_vars {
            env::remove_var(var);
        }
    }
}
