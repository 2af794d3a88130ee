//! The relay orchestrator: one user message in, one structured reply out.

use tracing::info;

use sage_reply::{parse_reply, BotReply, EmojiCatalog};
use sage_sessions::{SessionStore, Turn};

use crate::prompt::SYSTEM_PROMPT;
use crate::provider::{ChatRequest, LlmProvider, ProviderError};

/// Run one exchange for `session_key`.
///
/// Builds the outbound message list (system turn, stored history, fresh user
/// text), addresses the store's active model, records the exchange, and runs
/// the raw reply through directive extraction, sanitization and link
/// extraction. The raw assistant text — directives included — is what goes
/// into history, so the model stays consistent with its own directive usage
/// across turns.
///
/// Callers keep at most one exchange in flight per session key.
pub async fn relay_exchange(
    provider: &dyn LlmProvider,
    store: &SessionStore,
    session_key: &str,
    user_text: &str,
    catalog: Option<&EmojiCatalog>,
) -> Result<BotReply, ProviderError> {
    let previous = store.get(session_key);
    let history_len = previous.len();

    let mut messages = Vec::with_capacity(history_len + 2);
    messages.push(Turn::system(SYSTEM_PROMPT));
    messages.extend(previous);
    messages.push(Turn::user(user_text));

    info!(session = %session_key, history = history_len, "prompt in");

    let req = ChatRequest {
        model: store.active_model(),
        messages,
    };
    let resp = provider.send(&req).await?;

    info!(
        session = %session_key,
        model = %resp.model,
        tokens_in = resp.tokens_in,
        tokens_out = resp.tokens_out,
        "prompt out"
    );

    store.append(
        session_key,
        Turn::user(user_text),
        Turn::assistant(resp.content.as_str()),
    );

    Ok(parse_reply(&resp.content, catalog))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::provider::ChatResponse;

    /// Canned provider that records the requests it receives.
    struct CannedProvider {
        reply: String,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl CannedProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
            self.seen.lock().unwrap().push(req.clone());
            Ok(ChatResponse {
                content: self.reply.clone(),
                model: req.model.clone(),
                tokens_in: 1,
                tokens_out: 1,
            })
        }
    }

    #[tokio::test]
    async fn exchange_builds_system_history_user_order() {
        let provider = CannedProvider::new("fine");
        let store = SessionStore::new("llama3.1");
        store.append("k", Turn::user("old q"), Turn::assistant("old a"));

        relay_exchange(&provider, &store, "k", "new q", None)
            .await
            .unwrap();

        let seen = provider.seen.lock().unwrap();
        let msgs = &seen[0].messages;
        assert_eq!(msgs.len(), 4);
        assert_eq!(msgs[0].role, sage_sessions::Role::System);
        assert_eq!(msgs[1].content, "old q");
        assert_eq!(msgs[2].content, "old a");
        assert_eq!(msgs[3].content, "new q");
        assert_eq!(seen[0].model, "llama3.1");
    }

    #[tokio::test]
    async fn raw_reply_is_recorded_and_parsed() {
        let provider = CannedProvider::new("ok $embed[T;details here;By Sage;_;_;_;_]");
        let store = SessionStore::new("llama3.1");

        let reply = relay_exchange(&provider, &store, "k", "q", None)
            .await
            .unwrap();

        assert_eq!(reply.text, "ok");
        assert_eq!(reply.rich_content.unwrap().description, "details here");

        // History keeps the raw assistant content, directive included.
        let turns = store.get("k");
        assert_eq!(turns.len(), 2);
        assert!(turns[1].content.contains("$embed["));
    }

    #[tokio::test]
    async fn active_model_is_read_per_request() {
        let provider = CannedProvider::new("x");
        let store = SessionStore::new("llama3.1");
        store.set_active_model("mistral");

        relay_exchange(&provider, &store, "k", "q", None)
            .await
            .unwrap();

        assert_eq!(provider.seen.lock().unwrap()[0].model, "mistral");
    }
}
