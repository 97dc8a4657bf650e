//! Bot initialization

use reqwest::ClientBuilder;
use teloxide::prelude::*;

use crate::core::config;

/// Creates a Bot instance with an explicit HTTP client timeout
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Failed to build the HTTP client
pub fn create_bot(token: &str) -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    Ok(Bot::with_client(token, client))
}
