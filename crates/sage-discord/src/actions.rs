//! Execution of rename directives as privileged member edits.

use serenity::builder::EditMember;
use serenity::http::Http;
use serenity::model::id::{GuildId, UserId};
use tracing::warn;

use sage_reply::Rename;

/// Apply every rename directive, collecting one human-readable note per
/// outcome. Failures (bad id, missing permissions, hierarchy) are notes, not
/// errors — the reply still goes out.
pub async fn perform_renames(
    http: &Http,
    guild_id: Option<GuildId>,
    renames: &[Rename],
) -> Vec<String> {
    let mut notes = Vec::new();

    for rename in renames {
        let Some(guild_id) = guild_id else {
            notes.push("Nickname changes only work inside a server.".to_string());
            continue;
        };
        let Ok(user_id) = rename.user_id.parse::<u64>() else {
            warn!(user_id = %rename.user_id, "rename directive with non-numeric user id");
            notes.push(format!("Unknown member id: {}", rename.user_id));
            continue;
        };

        match guild_id
            .edit_member(
                http,
                UserId::new(user_id),
                EditMember::new().nickname(&rename.nickname),
            )
            .await
        {
            Ok(member) => {
                notes.push(format!(
                    "Nickname of {} updated: {}",
                    member.user.name, rename.nickname
                ));
            }
            Err(e) => {
                warn!(error = %e, user_id, "nickname edit failed");
                notes.push("Nickname change failed (permissions or hierarchy).".to_string());
            }
        }
    }

    notes
}
