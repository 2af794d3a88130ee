//! Rendering a rich-content directive as a Discord embed.

use serenity::builder::{CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter};

use sage_reply::{clip_chars, is_valid_url, RichContent};

/// Accent colour for reply embeds.
pub const ACCENT_COLOR: u32 = 0x5865F2;
/// Colour for the "joined the conversation" notice.
pub const JOIN_COLOR: u32 = 0x2ECC71;
/// Colour for the "left the channel" notice.
pub const LEAVE_COLOR: u32 = 0xE74C3C;

// Platform field limits, applied at render time.
const MAX_TITLE: usize = 250;
const MAX_DESCRIPTION: usize = 4000;
const MAX_FOOTER: usize = 2048;
const MAX_AUTHOR: usize = 256;

/// Convert literal `\n` sequences the model writes inside directive fields
/// into real newlines.
fn process_text(s: &str) -> String {
    s.replace("\\n", "\n")
}

/// Build the reply embed from a rich-content directive, clipping every field
/// to the platform's limits. Image, thumbnail and URL are dropped unless they
/// pass the shared URL validity rule.
pub fn build_embed(content: &RichContent) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .description(clip_chars(&process_text(&content.description), MAX_DESCRIPTION))
        .colour(ACCENT_COLOR);

    if let Some(title) = &content.title {
        embed = embed.title(clip_chars(title, MAX_TITLE));
    }
    if let Some(footer) = &content.footer {
        embed = embed.footer(CreateEmbedFooter::new(clip_chars(
            &process_text(footer),
            MAX_FOOTER,
        )));
    }
    if let Some(image) = &content.image {
        if is_valid_url(image) {
            embed = embed.image(image);
        }
    }
    if let Some(thumbnail) = &content.thumbnail {
        if is_valid_url(thumbnail) {
            embed = embed.thumbnail(thumbnail);
        }
    }
    if let Some(author) = &content.author {
        embed = embed.author(CreateEmbedAuthor::new(clip_chars(author, MAX_AUTHOR)));
    }
    if let Some(url) = &content.url {
        if is_valid_url(url) {
            embed = embed.url(url);
        }
    }
    embed
}

/// Green notice posted when the bot starts relaying a channel.
pub fn join_embed() -> CreateEmbed {
    CreateEmbed::new()
        .title("Sage joined the conversation")
        .description("Everyone in this channel can talk to it here.")
        .colour(JOIN_COLOR)
}

/// Red notice posted when the bot withdraws from a channel.
pub fn leave_embed() -> CreateEmbed {
    CreateEmbed::new()
        .title("Sage is leaving this channel")
        .description("It will not listen here until invited again.")
        .colour(LEAVE_COLOR)
}
