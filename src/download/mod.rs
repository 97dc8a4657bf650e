//! Download pipeline: downloader invocation and output parsing

pub mod proxy;
pub mod ytdlp;

pub use ytdlp::{download_video, extract_downloaded_path, probe_ytdlp_version};
