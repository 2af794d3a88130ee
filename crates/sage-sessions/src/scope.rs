//! Session scoping — where a conversation lives determines its history key.

use std::fmt;

/// The conversational context a message belongs to. Each scope maps to one
/// history key, so a guild channel, a DM and an ephemeral private chat with
/// the same person are three independent conversations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionScope {
    /// A guild text channel the bot has been invited into.
    Channel { guild_id: u64, channel_id: u64 },
    /// A direct-message conversation with one user.
    Direct { user_id: u64 },
    /// An ephemeral private exchange (visible only to the invoker).
    Private { user_id: u64 },
}

impl SessionScope {
    /// Canonical history key for this scope.
    pub fn key(&self) -> String {
        match self {
            SessionScope::Channel {
                guild_id,
                channel_id,
            } => format!("{}:{}", guild_id, channel_id),
            SessionScope::Direct { user_id } => format!("dm:{}", user_id),
            SessionScope::Private { user_id } => format!("priv:{}", user_id),
        }
    }
}

impl fmt::Display for SessionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_key_is_guild_colon_channel() {
        let scope = SessionScope::Channel {
            guild_id: 10,
            channel_id: 20,
        };
        assert_eq!(scope.key(), "10:20");
    }

    #[test]
    fn dm_and_private_keys_are_prefixed() {
        assert_eq!(SessionScope::Direct { user_id: 7 }.key(), "dm:7");
        assert_eq!(SessionScope::Private { user_id: 7 }.key(), "priv:7");
    }

    #[test]
    fn scopes_for_same_user_do_not_collide() {
        let dm = SessionScope::Direct { user_id: 7 }.key();
        let private = SessionScope::Private { user_id: 7 }.key();
        assert_ne!(dm, private);
    }
}
