use clap::Parser;

#[derive(Parser)]
#[command(name = "tubevault")]
#[command(author, version, about = "Telegram bot that archives YouTube videos to object storage", long_about = None)]
pub struct Cli {
    /// Path to a Netscape-format cookies file handed to the downloader
    /// (overrides YTDL_COOKIES_FILE)
    #[arg(long)]
    pub cookies: Option<String>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
