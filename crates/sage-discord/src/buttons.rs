//! Button rows: extracted links as link buttons, plus the per-channel Stop
//! button that lets anyone dismiss the bot.

use serenity::builder::{CreateActionRow, CreateButton};
use serenity::model::application::ButtonStyle;

use sage_reply::ExtractedLink;

/// Custom-id prefix for Stop buttons; the channel id rides along so the
/// component handler knows which channel to deactivate.
pub const STOP_PREFIX: &str = "sage-stop-";

/// Custom id for a Stop button: `sage-stop-{channel_id}-{nonce}`.
pub fn stop_custom_id(channel_id: u64, nonce: u64) -> String {
    format!("{}{}-{}", STOP_PREFIX, channel_id, nonce)
}

/// Pull the channel id back out of a Stop custom id.
pub fn parse_stop_custom_id(custom_id: &str) -> Option<u64> {
    custom_id
        .strip_prefix(STOP_PREFIX)?
        .split('-')
        .next()?
        .parse()
        .ok()
}

/// One red Stop button in its own row.
pub fn stop_row(custom_id: &str) -> CreateActionRow {
    CreateActionRow::Buttons(vec![CreateButton::new(custom_id)
        .label("Stop")
        .style(ButtonStyle::Danger)])
}

/// A row of link buttons, one per extracted link. `None` when there are no
/// links — the platform rejects empty rows.
pub fn link_row(links: &[ExtractedLink]) -> Option<CreateActionRow> {
    if links.is_empty() {
        return None;
    }
    let buttons = links
        .iter()
        .map(|l| CreateButton::new_link(&l.url).label(&l.label))
        .collect();
    Some(CreateActionRow::Buttons(buttons))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_custom_id_round_trips_channel() {
        let id = stop_custom_id(42, 99);
        assert_eq!(id, "sage-stop-42-99");
        assert_eq!(parse_stop_custom_id(&id), Some(42));
    }

    #[test]
    fn foreign_custom_ids_are_rejected() {
        assert_eq!(parse_stop_custom_id("other-button"), None);
        assert_eq!(parse_stop_custom_id("sage-stop-notanumber-1"), None);
    }

    #[test]
    fn no_links_means_no_row() {
        assert!(link_row(&[]).is_none());
    }
}
