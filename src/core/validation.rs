//! Inbound message validation
//!
//! The bot accepts exactly one kind of work request: a YouTube URL. The
//! shape check deliberately allows a missing scheme ("youtube.com/…") since
//! that is how links are often pasted from address bars.

use once_cell::sync::Lazy;
use regex::Regex;

/// YouTube URL shape: optional scheme, optional `www.`, a `youtube.com` or
/// `youtu.be` host, and a non-empty path.
static YOUTUBE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?://)?(www\.)?(youtube\.com|youtu\.be)/.+$").expect("valid YouTube URL pattern")
});

/// Returns true when `text` looks like a YouTube video URL.
pub fn is_youtube_url(text: &str) -> bool {
    YOUTUBE_URL.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_youtube_urls() {
        assert!(is_youtube_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_youtube_url("https://youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_youtube_url("http://youtu.be/dQw4w9WgXcQ"));
        assert!(is_youtube_url("youtu.be/dQw4w9WgXcQ"));
        assert!(is_youtube_url("www.youtube.com/shorts/abc123"));
    }

    #[test]
    fn rejects_other_hosts_and_plain_text() {
        assert!(!is_youtube_url("hi"));
        assert!(!is_youtube_url("https://vimeo.com/12345"));
        assert!(!is_youtube_url("https://notyoutube.com/watch?v=x"));
        assert!(!is_youtube_url("ftp://youtube.com/watch?v=x"));
    }

    #[test]
    fn rejects_hosts_without_a_path() {
        assert!(!is_youtube_url("https://youtube.com"));
        assert!(!is_youtube_url("youtube.com/"));
    }
}
