//! In-memory session store: bounded turn history per session key plus the
//! process-wide active-model setting.
//!
//! All operations are synchronous and never block on I/O. The store gives
//! each key an independent entry; callers are expected to keep at most one
//! exchange in flight per key, as the store itself takes no per-key lock
//! across a read-modify-write spanning an await point.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};

/// Hard cap on turns retained per session. Oldest turns are dropped first.
pub const MAX_TURNS: usize = 150;

/// Speaker role of a turn, serialised with the lowercase wire words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Conversation histories keyed by session key, plus the active model name.
///
/// Histories are created lazily on first append and only ever cleared
/// wholesale. The active model is independent state: set at startup from
/// configuration, changed by an admin command, read on every outbound call.
pub struct SessionStore {
    histories: Mutex<HashMap<String, Vec<Turn>>>,
    active_model: RwLock<String>,
}

impl SessionStore {
    pub fn new(default_model: impl Into<String>) -> Self {
        Self {
            histories: Mutex::new(HashMap::new()),
            active_model: RwLock::new(default_model.into()),
        }
    }

    /// History for `key`, oldest first. Absent and empty are the same thing.
    pub fn get(&self, key: &str) -> Vec<Turn> {
        self.histories
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Store `turns` as the history for `key`, keeping only the most recent
    /// [`MAX_TURNS`] entries.
    pub fn replace(&self, key: &str, mut turns: Vec<Turn>) {
        if turns.len() > MAX_TURNS {
            turns.drain(..turns.len() - MAX_TURNS);
        }
        self.histories.lock().unwrap().insert(key.to_string(), turns);
    }

    /// Record one exchange: the user turn then the assistant turn. May evict
    /// up to two of the oldest turns.
    pub fn append(&self, key: &str, user_turn: Turn, assistant_turn: Turn) {
        let mut turns = self.get(key);
        turns.push(user_turn);
        turns.push(assistant_turn);
        self.replace(key, turns);
    }

    /// Drop every session's history. The active model is untouched.
    pub fn clear_all(&self) {
        self.histories.lock().unwrap().clear();
    }

    /// The model name used for the next outbound request.
    pub fn active_model(&self) -> String {
        self.active_model.read().unwrap().clone()
    }

    /// Switch the active model. Returns the previous name.
    pub fn set_active_model(&self, model: impl Into<String>) -> String {
        let mut guard = self.active_model.write().unwrap();
        std::mem::replace(&mut *guard, model.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_key_yields_empty_history() {
        let store = SessionStore::new("base");
        assert!(store.get("nope").is_empty());
    }

    #[test]
    fn append_adds_user_then_assistant() {
        let store = SessionStore::new("base");
        store.append("k", Turn::user("hi"), Turn::assistant("hello"));
        let turns = store.get("k");
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].content, "hi");
        assert_eq!(turns[1].role, Role::Assistant);
    }

    #[test]
    fn overflow_evicts_oldest_first() {
        let store = SessionStore::new("base");
        for i in 0..76 {
            store.append(
                "k",
                Turn::user(format!("u{}", i)),
                Turn::assistant(format!("a{}", i)),
            );
        }
        let turns = store.get("k");
        assert_eq!(turns.len(), MAX_TURNS);
        // 152 turns written; the oldest two (u0, a0) are gone.
        assert_eq!(turns[0].content, "u1");
        assert_eq!(turns.last().unwrap().content, "a75");
    }

    #[test]
    fn replace_truncates_to_most_recent() {
        let store = SessionStore::new("base");
        let turns: Vec<Turn> = (0..200).map(|i| Turn::user(format!("t{}", i))).collect();
        store.replace("k", turns);
        let kept = store.get("k");
        assert_eq!(kept.len(), MAX_TURNS);
        assert_eq!(kept[0].content, "t50");
        assert_eq!(kept.last().unwrap().content, "t199");
    }

    #[test]
    fn keys_are_independent() {
        let store = SessionStore::new("base");
        store.append("a", Turn::user("1"), Turn::assistant("2"));
        store.append("b", Turn::user("3"), Turn::assistant("4"));
        assert_eq!(store.get("a")[0].content, "1");
        assert_eq!(store.get("b")[0].content, "3");
    }

    #[test]
    fn clear_all_keeps_active_model() {
        let store = SessionStore::new("base");
        store.append("a", Turn::user("1"), Turn::assistant("2"));
        store.set_active_model("other");
        store.clear_all();
        assert!(store.get("a").is_empty());
        assert_eq!(store.active_model(), "other");
    }

    #[test]
    fn set_active_model_returns_previous() {
        let store = SessionStore::new("first");
        let prev = store.set_active_model("second");
        assert_eq!(prev, "first");
        assert_eq!(store.active_model(), "second");
    }

    #[test]
    fn role_serialises_lowercase() {
        let turn = Turn::assistant("x");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "assistant");
    }
}
