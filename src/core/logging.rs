//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - A startup banner summarizing the loaded configuration

use anyhow::Result;
use simplelog::{ColorChoice, CombinedLogger, Config, LevelFilter, TermLogger, TerminalMode, WriteLogger};
use std::fs::File;
use std::path::Path;

use crate::core::config::AppConfig;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
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

/// Logs the effective configuration at startup.
///
/// Secrets are never logged; for the cookies file the existence check runs
/// here so a bad path is visible immediately rather than on the first
/// download.
pub fn log_startup_configuration(config: &AppConfig) {
    log::info!("Allowed user id: {}", config.allowed_user_id);
    log::info!("Storage backend: {}", config.storage.backend_name());
    log::info!("Download directory: {}", config.download_dir);
    log::info!("Download timeout: {}s", config.download_timeout.as_secs());
    log::info!("Downloader binary: {}", config.ytdl_bin);

    match &config.cookies_file {
        Some(cookies_file) => {
            if Path::new(cookies_file).exists() {
                log::info!("Cookies file: {}", cookies_file);
            } else {
                log::warn!(
                    "Cookies file {} does not exist; downloads requiring authentication will fail",
                    cookies_file
                );
            }
        }
        None => log::info!("No cookies file configured"),
    }

    match &config.proxy_url {
        // Proxy URLs can embed credentials; log only the scheme.
        Some(proxy_url) => match proxy_url.split_once("://") {
            Some((scheme, _)) => log::info!("Proxy configured ({})", scheme),
            None => log::info!("Proxy configured"),
        },
        None => log::info!("No proxy configured"),
    }
}
