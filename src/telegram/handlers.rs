//! Telegram handler tree and the per-message pipeline
//!
//! The handler tree is built from an explicit dependency value so tests can
//! drive the same logic as production code. Each inbound text message runs
//! the full pipeline: auth gate, intent classification, download, upload,
//! cleanup, with a progress reply at every transition.

use std::sync::Arc;

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::UserId;
use tokio::sync::Mutex;

use crate::core::config::AppConfig;
use crate::core::error::AppError;
use crate::core::validation::is_youtube_url;
use crate::download::ytdlp::download_video;
use crate::storage::ObjectStore;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

const UNAUTHORIZED_REPLY: &str = "Unauthorized user.";
const GREETING_REPLY: &str = "I've gone out to find myself. If I come back before I return, please ask me to wait.";
const INVALID_URL_REPLY: &str = "Please send a valid YouTube URL.";

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ObjectStore>,
    /// Single download slot. Pipelines take it for their whole lifetime so
    /// two concurrent requests cannot collide in the downloads directory.
    pub download_slot: Arc<Mutex<()>>,
}

impl HandlerDeps {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            config,
            store,
            download_slot: Arc::new(Mutex::new(())),
        }
    }
}

/// What one inbound text message asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageIntent {
    /// The exact greeting text
    Greeting,
    /// A YouTube-shaped URL to download
    Download(String),
    /// Anything else
    Invalid,
}

/// Classifies one message: exact `"hi"` is a greeting, a YouTube-shaped URL
/// is a download request, everything else is invalid.
pub fn classify_message(text: &str) -> MessageIntent {
    if text == "hi" {
        return MessageIntent::Greeting;
    }
    if is_youtube_url(text) {
        return MessageIntent::Download(text.to_string());
    }
    MessageIntent::Invalid
}

/// Creates the dispatcher schema for the bot.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry().branch(Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
        let deps = deps.clone();
        async move { handle_message(bot, msg, deps).await }
    }))
}

/// Handles one inbound message end to end.
pub async fn handle_message(bot: Bot, msg: Message, deps: HandlerDeps) -> Result<(), HandlerError> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat_id = msg.chat.id;

    // Auth gate: exactly one configured user, everyone else is refused
    // regardless of message content.
    let sender = msg.from.as_ref().map(|user| user.id);
    if sender != Some(UserId(deps.config.allowed_user_id)) {
        log::warn!("Rejected message from unauthorized sender {:?} in chat {}", sender, chat_id);
        bot.send_message(chat_id, UNAUTHORIZED_REPLY).await?;
        return Ok(());
    }

    match classify_message(text) {
        MessageIntent::Greeting => {
            bot.send_message(chat_id, GREETING_REPLY).await?;
        }
        MessageIntent::Invalid => {
            bot.send_message(chat_id, INVALID_URL_REPLY).await?;
        }
        MessageIntent::Download(url) => {
            run_pipeline(&bot, chat_id, &url, &deps).await?;
        }
    }
    Ok(())
}

/// Runs download → upload → cleanup for one URL, replying at each stage.
///
/// Failures anywhere in the pipeline are reported to the user with the
/// error text. The local file, if one was produced, is deleted afterwards
/// whether or not the upload succeeded.
async fn run_pipeline(bot: &Bot, chat_id: ChatId, url: &str, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let _slot = deps.download_slot.lock().await;

    bot.send_message(chat_id, "Starting download...").await?;

    let mut downloaded_path: Option<String> = None;
    let result = run_stages(bot, chat_id, url, deps, &mut downloaded_path).await;

    match result {
        Ok(remote_path) => {
            log::info!("Uploaded to {} as {}", deps.store.name(), remote_path);
            let _ = bot.send_message(chat_id, "Upload complete!").await;
        }
        Err(e) => {
            log::error!("Pipeline failed for {}: {}", url, e);
            let _ = bot.send_message(chat_id, format!("Error: {}", e)).await;
        }
    }

    // The local file is transient: remove it regardless of where the
    // pipeline stopped.
    if let Some(path) = downloaded_path {
        remove_downloaded_file(&path).await;
    }
    Ok(())
}

async fn run_stages(
    bot: &Bot,
    chat_id: ChatId,
    url: &str,
    deps: &HandlerDeps,
    downloaded_path: &mut Option<String>,
) -> Result<String, AppError> {
    let path = download_video(&deps.config, url).await?;
    *downloaded_path = Some(path.clone());

    bot.send_message(
        chat_id,
        format!("Download complete. Uploading to {}...", deps.store.name()),
    )
    .await?;

    deps.store.upload_file(&path).await
}

async fn remove_downloaded_file(path: &str) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => log::info!("Deleted local file {}", path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("Local file {} already gone", path);
        }
        Err(e) => log::warn!("Failed to delete local file {}: {}", path, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn exact_greeting_is_special_cased() {
        assert_eq!(classify_message("hi"), MessageIntent::Greeting);
        // only the exact text counts
        assert_eq!(classify_message("hi!"), MessageIntent::Invalid);
        assert_eq!(classify_message("Hi"), MessageIntent::Invalid);
        assert_eq!(classify_message(" hi"), MessageIntent::Invalid);
    }

    #[test]
    fn youtube_urls_become_download_requests() {
        assert_eq!(
            classify_message("https://youtu.be/dQw4w9WgXcQ"),
            MessageIntent::Download("https://youtu.be/dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            classify_message("www.youtube.com/watch?v=dQw4w9WgXcQ"),
            MessageIntent::Download("www.youtube.com/watch?v=dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn everything_else_is_invalid() {
        assert_eq!(classify_message("hello there"), MessageIntent::Invalid);
        assert_eq!(classify_message("https://vimeo.com/12345"), MessageIntent::Invalid);
        assert_eq!(classify_message(""), MessageIntent::Invalid);
    }
}
