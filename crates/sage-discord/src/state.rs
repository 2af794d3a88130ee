//! Runtime activation state — which channels and DMs the bot relays, and
//! where its live Stop button sits.

use std::time::Instant;

use dashmap::{DashMap, DashSet};

/// The Stop-button message currently armed in a channel.
#[derive(Debug, Clone, Copy)]
pub struct StopRecord {
    pub message_id: u64,
}

/// Mutable adapter state, independent of any one gateway connection so it
/// survives reconnects.
pub struct RuntimeState {
    /// Guild channels the bot currently relays.
    pub active_channels: DashSet<u64>,
    /// Users whose DM conversations are active.
    pub active_dms: DashSet<u64>,
    /// Per-channel record of the armed Stop button.
    pub stop_messages: DashMap<u64, StopRecord>,
    /// Process start, for the monitoring command.
    pub started: Instant,
}

impl RuntimeState {
    pub fn new() -> Self {
        Self {
            active_channels: DashSet::new(),
            active_dms: DashSet::new(),
            stop_messages: DashMap::new(),
            started: Instant::now(),
        }
    }
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_is_per_channel() {
        let state = RuntimeState::new();
        state.active_channels.insert(1);
        assert!(state.active_channels.contains(&1));
        assert!(!state.active_channels.contains(&2));
        state.active_channels.remove(&1);
        assert!(!state.active_channels.contains(&1));
    }

    #[test]
    fn stop_record_replaces_previous() {
        let state = RuntimeState::new();
        state.stop_messages.insert(1, StopRecord { message_id: 10 });
        state.stop_messages.insert(1, StopRecord { message_id: 20 });
        assert_eq!(state.stop_messages.get(&1).unwrap().message_id, 20);
    }
}
