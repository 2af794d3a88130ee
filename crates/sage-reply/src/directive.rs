//! Directive extraction — pulls structured instructions out of model output.
//!
//! The model embeds directives in its free-form reply using a fixed bracketed
//! syntax:
//!
//! ```text
//! $nick[<nickname>;<user id>]
//! $embed[<title>;<description>;<footer>;<image>;<thumbnail>;<author>;<url>]
//! ```
//!
//! Keywords are case-insensitive and directives may appear anywhere in the
//! text, any number of times. The producer is a language model, so the parser
//! is tolerant: malformed or incomplete directives are silently skipped, never
//! an error. Every matched span is removed from the text; unrecognized
//! `$word[...]` sequences are left untouched.

use std::sync::OnceLock;

use regex::Regex;

/// Reserved token meaning "this optional field was not supplied".
pub const PLACEHOLDER: &str = "_";

/// A structured instruction extracted from model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Rename(Rename),
    RichContent(RichContent),
}

/// Request to change a member's nickname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub user_id: String,
    pub nickname: String,
}

/// A rich-content block. `description` is the only mandatory field; the
/// others are absent when the wire field was missing or the placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichContent {
    pub title: Option<String>,
    pub description: String,
    pub footer: Option<String>,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
    pub author: Option<String>,
    pub url: Option<String>,
}

/// Result of a directive scan: the input with every matched span removed,
/// plus the directives captured along the way.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub stripped: String,
    pub directives: Vec<Directive>,
}

fn nick_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\$nick\[([^;\]]+);([^\]]+)\]").unwrap())
}

fn embed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\$embed\[([^\]]*)\]").unwrap())
}

/// Scan `raw` for directives, repeat-until-exhausted, and strip every matched
/// span. A span that matches the grammar but fails field validation (e.g. a
/// whitespace-only nickname) still gets stripped — it was directive syntax,
/// just unusable.
pub fn extract(raw: &str) -> Extraction {
    let mut directives = Vec::new();

    for cap in nick_re().captures_iter(raw) {
        let nickname = cap[1].trim();
        let user_id = cap[2].trim();
        if !nickname.is_empty() && !user_id.is_empty() {
            directives.push(Directive::Rename(Rename {
                user_id: user_id.to_string(),
                nickname: nickname.to_string(),
            }));
        }
    }

    for cap in embed_re().captures_iter(raw) {
        if let Some(content) = parse_rich_content(cap[1].trim()) {
            directives.push(Directive::RichContent(content));
        }
    }

    let stripped = nick_re().replace_all(raw, "");
    let stripped = embed_re().replace_all(&stripped, "").into_owned();

    Extraction {
        stripped,
        directives,
    }
}

/// Parse the semicolon-separated body of an `$embed[...]` directive.
///
/// Missing trailing fields are treated as the placeholder; a directive whose
/// description resolves to absent is meaningless and yields `None`.
fn parse_rich_content(body: &str) -> Option<RichContent> {
    let mut parts: Vec<&str> = body.split(';').map(str::trim).collect();
    parts.resize(7, PLACEHOLDER);

    let field = |i: usize| -> Option<String> {
        let v = parts[i];
        if v.is_empty() || v == PLACEHOLDER {
            None
        } else {
            Some(v.to_string())
        }
    };

    let description = field(1)?;
    Some(RichContent {
        title: field(0),
        description,
        footer: field(2),
        image: field(3),
        thumbnail: field(4),
        author: field(5),
        url: field(6),
    })
}
