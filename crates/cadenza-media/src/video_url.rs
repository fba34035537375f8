//! Recognition of streaming-video URLs

use url::Url;

const WATCH_HOSTS: [&str; 3] = ["www.youtube.com", "youtube.com", "m.youtube.com"];
const SHORT_HOST: &str = "youtu.be";

/// Check whether `candidate` is a watch-page URL with a `v` query parameter,
/// or a short link with a non-empty path
pub fn is_valid_video_url(candidate: &str) -> bool {
    let parsed = match Url::parse(candidate.trim()) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }

    let host = match parsed.host_str() {
        Some(host) => host.to_ascii_lowercase(),
        None => return false,
    };

    if WATCH_HOSTS.contains(&host.as_str()) {
        parsed.path() == "/watch"
            && parsed
                .query_pairs()
                .any(|(key, value)| key == "v" && !value.is_empty())
    } else if host == SHORT_HOST {
        parsed.path().len() > 1
    } else {
        false
    }
}
