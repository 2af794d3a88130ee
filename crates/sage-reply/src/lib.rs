//! Reply processing for model output.
//!
//! Raw model text goes through three stages: directive extraction (structured
//! instructions embedded in the reply), sanitization (artifact repair), and
//! link extraction (targets separated from prose). Every stage is total and
//! synchronous; a reply always produces a [`BotReply`].

pub mod directive;
pub mod emoji;
pub mod links;
pub mod sanitize;
pub mod util;

pub use directive::{Directive, Extraction, Rename, RichContent, PLACEHOLDER};
pub use emoji::EmojiCatalog;
pub use links::{ExtractedLink, LinkExtraction, MAX_LINKS};
pub use util::{clip_chars, is_valid_url};

/// Fully processed model reply, ready for the messaging layer.
#[derive(Debug, Clone)]
pub struct BotReply {
    /// Prose with directive spans and link targets removed.
    pub text: String,
    /// The first rich-content directive, if any was present.
    pub rich_content: Option<RichContent>,
    /// Rename actions in order of appearance.
    pub renames: Vec<Rename>,
    /// Extracted links in discovery order, unique by URL, at most five.
    pub links: Vec<ExtractedLink>,
}

/// Run the complete parse → sanitize → extract-links pipeline.
pub fn parse_reply(raw: &str, catalog: Option<&EmojiCatalog>) -> BotReply {
    let extraction = directive::extract(raw);
    let sanitized = sanitize::sanitize(&extraction.stripped, catalog);
    let LinkExtraction { clean_text, links } = links::extract_links(&sanitized);

    let mut renames = Vec::new();
    let mut rich_content = None;
    for d in extraction.directives {
        match d {
            Directive::Rename(r) => renames.push(r),
            Directive::RichContent(c) => {
                if rich_content.is_none() {
                    rich_content = Some(c);
                }
            }
        }
    }

    BotReply {
        text: clean_text,
        rich_content,
        renames,
        links,
    }
}
