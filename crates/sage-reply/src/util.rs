//! Small shared helpers for reply processing.

use url::Url;

/// Hard cap on accepted URL length. Anything longer is rejected outright.
pub const MAX_URL_LEN: usize = 2048;

/// A string is a valid URL iff it is at most [`MAX_URL_LEN`] characters,
/// parses as an absolute URL, and uses the `http` or `https` scheme.
pub fn is_valid_url(s: &str) -> bool {
    if s.len() > MAX_URL_LEN {
        return false;
    }
    match Url::parse(s) {
        Ok(u) => matches!(u.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Clip `s` to at most `max` characters on a char boundary.
pub fn clip_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        assert!(is_valid_url("https://a.co"));
        assert!(is_valid_url("http://example.com/path?q=1"));
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(!is_valid_url("ftp://a.co"));
        assert!(!is_valid_url("file:///etc/passwd"));
        assert!(!is_valid_url("javascript:alert(1)"));
    }

    #[test]
    fn rejects_relative_and_garbage() {
        assert!(!is_valid_url("/just/a/path"));
        assert!(!is_valid_url("not a url"));
    }

    #[test]
    fn rejects_oversized() {
        let long = format!("https://example.com/{}", "a".repeat(2100));
        assert!(!is_valid_url(&long));
    }

    #[test]
    fn clip_respects_char_boundaries() {
        assert_eq!(clip_chars("héllo", 2), "hé");
        assert_eq!(clip_chars("short", 80), "short");
    }
}
