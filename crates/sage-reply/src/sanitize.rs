//! Text sanitization — repairs the artifacts the model leaves behind once
//! directives have been stripped.
//!
//! The pipeline is an explicit ordered list of pure stages; the order is
//! load-bearing (whitespace collapse must run before code expansion, emoji
//! repair last) and every stage is a no-op when it finds nothing to fix.
//! The function is total: any input produces output, never an error.

use std::sync::OnceLock;

use regex::Regex;

use crate::emoji::EmojiCatalog;

/// Attribution suffix the model habitually appends after footer examples.
/// Only removed when it dangles at the very end of the message.
const ATTRIBUTION_SUFFIX: &str = "By Sage";

/// Run the full sanitization pipeline over directive-stripped text.
pub fn sanitize(text: &str, catalog: Option<&EmojiCatalog>) -> String {
    let stages: &[fn(&str) -> String] = &[
        strip_wrapping_fence,
        strip_attribution,
        strip_leading_colon,
        trim_edge_artifacts,
        collapse_whitespace,
        trim_outer,
        expand_code_shorthand,
    ];

    let mut out = text.to_string();
    for stage in stages {
        out = stage(&out);
    }
    repair_emoji(&out, catalog)
}

/// Stage 1: drop triple-backtick fence markers that wrap the entire message.
/// Models like to fence whole replies; the leading marker (optionally with a
/// language tag) and the trailing marker are each stripped independently.
fn strip_wrapping_fence(s: &str) -> String {
    static LEAD: OnceLock<Regex> = OnceLock::new();
    static TAIL: OnceLock<Regex> = OnceLock::new();
    let lead = LEAD.get_or_init(|| Regex::new(r"^```[A-Za-z0-9_]*\n?").unwrap());
    let tail = TAIL.get_or_init(|| Regex::new(r"\n?```\s*$").unwrap());
    let out = lead.replace(s, "");
    tail.replace(&out, "").into_owned()
}

/// Stage 2: remove the dangling attribution phrase at the end of the message.
fn strip_attribution(s: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(&format!(r"(?i){}\s*$", regex::escape(ATTRIBUTION_SUFFIX))).unwrap()
    });
    re.replace(s, "").into_owned()
}

/// Stage 3: remove a leading bare colon.
fn strip_leading_colon(s: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^\s*:\s*").unwrap());
    re.replace(s, "").into_owned()
}

/// Stage 4: trim trailing and leading runs of quote/asterisk/whitespace
/// characters. Interior content is untouched.
fn trim_edge_artifacts(s: &str) -> String {
    static TAIL: OnceLock<Regex> = OnceLock::new();
    static LEAD: OnceLock<Regex> = OnceLock::new();
    let tail = TAIL.get_or_init(|| Regex::new(r#"[*\s"']+$"#).unwrap());
    let lead = LEAD.get_or_init(|| Regex::new(r#"^\s*[*"']+\s*"#).unwrap());
    let out = tail.replace(s, "");
    lead.replace(&out, "").into_owned()
}

/// Stage 5: collapse any run of two or more whitespace characters to one space.
fn collapse_whitespace(s: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\s{2,}").unwrap());
    re.replace_all(s, " ").into_owned()
}

/// Stage 6: trim outer whitespace.
fn trim_outer(s: &str) -> String {
    s.trim().to_string()
}

/// Stage 7: rewrite every `$[<code>]` span into a standard fenced code block
/// containing the trimmed inner text. The rewrite is literal; the inner
/// content is not escaped.
fn expand_code_shorthand(s: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?s)\$\[(.*?)\]").unwrap());
    re.replace_all(s, |caps: &regex::Captures<'_>| {
        format!("```\n{}\n```", caps[1].trim())
    })
    .into_owned()
}

/// Stage 8: repair malformed emoji references `<:name>` / `<:name:>` against
/// the catalog, substituting the fully-qualified `<:name:id>` form when the
/// name resolves. Unresolved names are left as written. Well-formed
/// `<:name:id>` references never match.
fn repair_emoji(s: &str, catalog: Option<&EmojiCatalog>) -> String {
    let Some(catalog) = catalog else {
        return s.to_string();
    };
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"<:([A-Za-z0-9_]+)(?::>|>)").unwrap());
    re.replace_all(s, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        match catalog.get(name) {
            Some(id) => format!("<:{}:{}>", name, id),
            None => caps[0].to_string(),
        }
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> EmojiCatalog {
        [("think".to_string(), 111u64), ("ok".to_string(), 222u64)]
            .into_iter()
            .collect()
    }

    #[test]
    fn whole_message_fence_is_unwrapped() {
        assert_eq!(sanitize("```\nplain answer\n```", None), "plain answer");
        assert_eq!(sanitize("```text\nplain answer\n```", None), "plain answer");
    }

    #[test]
    fn attribution_suffix_removed_only_at_end() {
        assert_eq!(sanitize("Result: fine. By Sage", None), "Result: fine.");
        assert_eq!(sanitize("by sage   ", None), "");
        assert_eq!(
            sanitize("By Sage is how footers are signed.", None),
            "By Sage is how footers are signed."
        );
    }

    #[test]
    fn leading_colon_removed() {
        assert_eq!(sanitize(": the answer", None), "the answer");
    }

    #[test]
    fn edge_artifacts_trimmed() {
        assert_eq!(sanitize("**\"answer\"**", None), "answer");
        assert_eq!(sanitize("  'quoted'  ", None), "quoted");
    }

    #[test]
    fn whitespace_collapsed() {
        assert_eq!(sanitize("too   many    spaces", None), "too many spaces");
        assert_eq!(sanitize("line\n\nbreaks", None), "line breaks");
    }

    #[test]
    fn code_shorthand_expands_to_fenced_block() {
        assert_eq!(sanitize("$[foo]", None), "```\nfoo\n```");
        assert_eq!(
            sanitize("run this: $[ls -la]", None),
            "run this: ```\nls -la\n```"
        );
    }

    #[test]
    fn code_shorthand_inner_text_is_trimmed() {
        assert_eq!(sanitize("$[  spaced  ]", None), "```\nspaced\n```");
    }

    #[test]
    fn emoji_missing_id_is_repaired() {
        let c = catalog();
        assert_eq!(sanitize("nice <:ok>", Some(&c)), "nice <:ok:222>");
        assert_eq!(sanitize("hmm <:think:>", Some(&c)), "hmm <:think:111>");
    }

    #[test]
    fn unknown_emoji_left_as_written() {
        let c = catalog();
        assert_eq!(sanitize("<:mystery>", Some(&c)), "<:mystery>");
    }

    #[test]
    fn wellformed_emoji_untouched() {
        let c = catalog();
        assert_eq!(sanitize("<:ok:222>", Some(&c)), "<:ok:222>");
    }

    #[test]
    fn no_catalog_means_no_emoji_pass() {
        assert_eq!(sanitize("<:ok>", None), "<:ok>");
    }

    #[test]
    fn pipeline_is_idempotent_on_prose() {
        let messy = ": **Analysis**   follows\n\n<:think> and  more ''";
        let once = sanitize(&sanitize(messy, None), None);
        assert_eq!(once, sanitize(messy, None));

        let with_catalog = sanitize("答え:  ok <:ok>  **", Some(&catalog()));
        assert_eq!(
            sanitize(&with_catalog, Some(&catalog())),
            with_catalog
        );
    }

    #[test]
    fn empty_input_is_fine() {
        assert_eq!(sanitize("", None), "");
        assert_eq!(sanitize("   ", None), "");
    }
}
