//! Hyperlink extraction — separates link targets from prose.
//!
//! Two passes, order mattering: markdown `[label](url)` spans are consumed
//! first so the bare-URL pass never re-captures a URL that was already inside
//! markdown syntax. Invalid URLs are excluded from the result but their
//! matched spans are still removed from the text.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::util::{clip_chars, is_valid_url};

/// Upper bound on returned links (one button row on the platform side).
pub const MAX_LINKS: usize = 5;
/// Upper bound on link label length.
pub const MAX_LABEL_LEN: usize = 80;
/// Label used when a bare URL's hostname cannot be parsed.
const FALLBACK_LABEL: &str = "Link";

/// A link pulled out of prose: a display label and its target URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    pub label: String,
    pub url: String,
}

/// Result of link extraction: prose with link spans removed, plus the links
/// in discovery order, unique by URL, at most [`MAX_LINKS`] of them.
#[derive(Debug, Clone)]
pub struct LinkExtraction {
    pub clean_text: String,
    pub links: Vec<ExtractedLink>,
}

fn md_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([^\]]+)\]\((https?://[^)]+)\)").unwrap())
}

fn bare_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://[^\s)\]]+").unwrap())
}

fn empty_remnant_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\s*\]\s*\(\s*\)").unwrap())
}

fn multi_space_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{2,}").unwrap())
}

fn orphan_bracket_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\]\s*").unwrap())
}

/// Extract markdown links and bare URLs from `text`.
pub fn extract_links(text: &str) -> LinkExtraction {
    let mut links: Vec<ExtractedLink> = Vec::new();

    // Pass 1: markdown links.
    for cap in md_link_re().captures_iter(text) {
        let url = &cap[2];
        if is_valid_url(url) && !links.iter().any(|l| l.url == url) {
            links.push(ExtractedLink {
                label: clip_chars(&cap[1], MAX_LABEL_LEN),
                url: url.to_string(),
            });
        }
    }
    let mut clean = md_link_re().replace_all(text, "").into_owned();

    // Pass 2: bare URLs in the remaining text. The regex crate has no
    // lookbehind, so the "not immediately preceded by `(`" guard is a manual
    // byte check. The guard's scope is intentionally narrow: only `(` is
    // excluded, nothing else.
    let mut spans: Vec<(usize, usize)> = Vec::new();
    for m in bare_url_re().find_iter(&clean) {
        if m.start() > 0 && clean.as_bytes()[m.start() - 1] == b'(' {
            continue;
        }
        let url = m.as_str();
        if is_valid_url(url) && !links.iter().any(|l| l.url == url) {
            links.push(ExtractedLink {
                label: host_label(url),
                url: url.to_string(),
            });
        }
        spans.push((m.start(), m.end()));
    }
    for (start, end) in spans.into_iter().rev() {
        clean.replace_range(start..end, "");
    }

    // Cleanup: empty markdown remnants, doubled spaces, orphan brackets.
    let clean = empty_remnant_re().replace_all(&clean, "");
    let clean = multi_space_re().replace_all(&clean, " ");
    let clean = orphan_bracket_re().replace_all(&clean, " ");

    links.truncate(MAX_LINKS);

    LinkExtraction {
        clean_text: clean.trim().to_string(),
        links,
    }
}

/// Derive a label from a URL's hostname, with one leading `www.` stripped.
fn host_label(url_str: &str) -> String {
    match Url::parse(url_str).ok().and_then(|u| u.host_str().map(String::from)) {
        Some(host) => {
            let host = host.strip_prefix("www.").unwrap_or(&host);
            clip_chars(host, MAX_LABEL_LEN)
        }
        None => FALLBACK_LABEL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_link_extracted_and_removed() {
        let r = extract_links("see [Example](https://example.com) for details");
        assert_eq!(r.links.len(), 1);
        assert_eq!(r.links[0].label, "Example");
        assert_eq!(r.links[0].url, "https://example.com");
        assert_eq!(r.clean_text, "see for details");
    }

    #[test]
    fn bare_url_labeled_by_host_without_www() {
        let r = extract_links("docs at https://www.example.org/guide here");
        assert_eq!(r.links.len(), 1);
        assert_eq!(r.links[0].label, "example.org");
        assert_eq!(r.links[0].url, "https://www.example.org/guide");
        assert!(!r.clean_text.contains("https://"));
    }

    #[test]
    fn subdomain_host_kept_in_label() {
        let r = extract_links("https://sub.example.org/path");
        assert_eq!(r.links[0].label, "sub.example.org");
        assert_eq!(r.clean_text, "");
    }

    #[test]
    fn markdown_consumed_before_bare_pass() {
        let r = extract_links("[One](https://one.io) and https://two.io");
        let urls: Vec<&str> = r.links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["https://one.io", "https://two.io"]);
    }

    #[test]
    fn duplicate_urls_deduped() {
        let r = extract_links(
            "[A](https://same.io) then [B](https://same.io) then https://same.io",
        );
        assert_eq!(r.links.len(), 1);
        assert_eq!(r.links[0].label, "A");
    }

    #[test]
    fn invalid_url_excluded_but_span_removed() {
        let long = format!("[big](https://example.com/{})", "x".repeat(2100));
        let r = extract_links(&format!("start {} end", long));
        assert!(r.links.is_empty());
        assert_eq!(r.clean_text, "start end");
    }

    #[test]
    fn at_most_five_links_earliest_kept() {
        let text = (1..=7)
            .map(|i| format!("https://site{}.io", i))
            .collect::<Vec<_>>()
            .join(" ");
        let r = extract_links(&text);
        assert_eq!(r.links.len(), 5);
        assert_eq!(r.links[0].url, "https://site1.io");
        assert_eq!(r.links[4].url, "https://site5.io");
    }

    #[test]
    fn long_label_clipped_to_eighty() {
        let label = "L".repeat(120);
        let r = extract_links(&format!("[{}](https://example.com)", label));
        assert_eq!(r.links[0].label.chars().count(), 80);
    }

    #[test]
    fn url_preceded_by_paren_left_in_place() {
        let r = extract_links("weird (https://paren.io trailing");
        assert!(r.links.is_empty());
        assert!(r.clean_text.contains("https://paren.io"));
    }

    #[test]
    fn orphan_brackets_cleaned() {
        let r = extract_links("leftover ] bracket");
        assert_eq!(r.clean_text, "leftover bracket");
    }

    #[test]
    fn no_links_returns_text_unchanged() {
        let r = extract_links("plain prose with no targets");
        assert!(r.links.is_empty());
        assert_eq!(r.clean_text, "plain prose with no targets");
    }
}
