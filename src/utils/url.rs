//! URL helpers for the summarizer input.

use reqwest::Url;

/// True when `candidate` has both a scheme and a network location.
pub fn is_valid_url(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => !url.scheme().is_empty() && url.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

/// Split a comma separated list of URLs, trimming each entry.
///
/// Empty entries are kept so they show up as failures, the same as any
/// other malformed input.
pub fn split_url_list(input: &str) -> Vec<String> {
    input.split(',').map(|u| u.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_urls() {
        assert!(is_valid_url("https://arxiv.org/abs/1706.03762"));
        assert!(is_valid_url("http://localhost:6333"));
        assert!(is_valid_url("ftp://example.com/file.txt"));
    }

    #[test]
    fn test_invalid_urls() {
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url("mailto:someone@example.com"));
        assert!(!is_valid_url("file:///tmp/notes.txt"));
        assert!(!is_valid_url("/relative/path"));
    }

    #[test]
    fn test_split_url_list_trims() {
        let urls = split_url_list(" https://a.dev ,https://b.dev,, ");
        assert_eq!(urls, vec!["https://a.dev", "https://b.dev", "", ""]);
    }
}
