//! yt-dlp subprocess runner
//!
//! Spawns the downloader for one URL, buffers its output, enforces the
//! wall-clock timeout by killing the process, and resolves the produced
//! file path by scanning the buffered stdout against the known completion
//! lines. Exactly one outcome is produced per invocation.

use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::core::config::{self, AppConfig};
use crate::core::error::AppError;

/// Completion patterns, scanned in priority order. The merger line wins
/// over the destination line because a merged download prints both and only
/// the merger line names the final file.
static COMPLETION_PATTERNS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r#"\[Merger\] Merging formats into "(.+?)""#).expect("valid merger pattern"),
        Regex::new(r"\[download\] Destination: (.+)").expect("valid destination pattern"),
        Regex::new(r"\[download\] (.+) has already been downloaded").expect("valid already-downloaded pattern"),
    ]
});

/// Resolves the downloaded file path from buffered downloader output.
///
/// Returns the first capture group of the highest-priority pattern that
/// matches anywhere in the buffer, or `None` when no pattern matches.
pub fn extract_downloaded_path(stdout: &str) -> Option<String> {
    COMPLETION_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(stdout)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
    })
}

/// Downloads one video and returns the local file path.
///
/// The downloader is invoked with the URL, an output template writing into
/// the configured download directory with filesystem-safe names, plus the
/// cookies file and proxy when configured. The run is bounded by
/// `config.download_timeout`; on expiry the process is killed and the
/// operation fails. The timeout future is dropped on completion either way,
/// so no timer outlives the call.
pub async fn download_video(config: &AppConfig, url: &str) -> Result<String, AppError> {
    tokio::fs::create_dir_all(&config.download_dir).await?;

    let output_template = format!("{}/%(title)s.%(ext)s", config.download_dir);
    let mut args: Vec<&str> = vec![url, "-o", &output_template, "--restrict-filenames"];
    if let Some(ref cookies_file) = config.cookies_file {
        args.extend_from_slice(&["--cookies", cookies_file]);
    }
    if let Some(ref proxy_url) = config.proxy_url {
        args.extend_from_slice(&["--proxy", proxy_url]);
    }

    log::info!("Running downloader: {} {}", config.ytdl_bin, args.join(" "));

    let mut child = Command::new(&config.ytdl_bin)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| AppError::Download(format!("failed to start downloader '{}': {}", config.ytdl_bin, e)))?;

    // Readers drain both pipes while the child runs so a chatty download
    // cannot fill a pipe buffer and stall the process.
    let stdout_task = child.stdout.take().map(|stream| spawn_line_collector(stream, "stdout"));
    let stderr_task = child.stderr.take().map(|stream| spawn_line_collector(stream, "stderr"));

    let status = match timeout(config.download_timeout, child.wait()).await {
        Ok(result) => result.map_err(|e| AppError::Download(format!("downloader process failed: {}", e)))?,
        Err(_elapsed) => {
            if let Err(e) = child.kill().await {
                log::warn!("Failed to kill timed-out downloader: {}", e);
            }
            return Err(AppError::DownloadTimeout(config.download_timeout.as_secs()));
        }
    };

    let stdout_buf = drain_collector(stdout_task).await;
    let stderr_buf = drain_collector(stderr_task).await;

    if !status.success() {
        let stderr_tail = tail(&stderr_buf, config::download::ERROR_TAIL_CHARS);
        return Err(AppError::Download(if stderr_tail.is_empty() {
            format!("downloader exited with status {}", status)
        } else {
            format!("downloader exited with status {}: {}", status, stderr_tail)
        }));
    }

    extract_downloaded_path(&stdout_buf).ok_or(AppError::PathUndeterminable)
}

/// Logs the downloader version at startup.
///
/// Best effort only: a missing binary is reported per-request, not here.
pub async fn probe_ytdlp_version(ytdl_bin: &str) {
    let probe = timeout(
        Duration::from_secs(config::download::VERSION_PROBE_TIMEOUT_SECS),
        Command::new(ytdl_bin).arg("--version").output(),
    )
    .await;

    match probe {
        Ok(Ok(output)) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
            log::info!("Downloader version: {} {}", ytdl_bin, version);
        }
        Ok(Ok(output)) => {
            log::warn!(
                "Downloader version check failed (exit code: {:?}). Continuing anyway.",
                output.status.code()
            );
        }
        Ok(Err(e)) => {
            log::warn!("Failed to execute '{}': {}. Downloads will fail until it is installed.", ytdl_bin, e);
        }
        Err(_) => {
            log::warn!("Downloader version check timed out. Continuing anyway.");
        }
    }
}

fn spawn_line_collector<R>(stream: R, label: &'static str) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        let mut buffer = String::new();
        while let Ok(Some(line)) = lines.next_line().await {
            log::debug!("yt-dlp {}: {}", label, line);
            buffer.push_str(&line);
            buffer.push('\n');
        }
        buffer
    })
}

async fn drain_collector(task: Option<JoinHandle<String>>) -> String {
    match task {
        Some(handle) => match handle.await {
            Ok(buffer) => buffer,
            Err(e) => {
                log::warn!("Downloader output reader failed: {}", e);
                String::new()
            }
        },
        None => String::new(),
    }
}

/// Last `max_chars` characters of `text`, on a char boundary.
fn tail(text: &str, max_chars: usize) -> &str {
    let trimmed = text.trim();
    match trimmed.char_indices().rev().nth(max_chars.saturating_sub(1)) {
        Some((index, _)) => &trimmed[index..],
        None => trimmed,
    }
}
