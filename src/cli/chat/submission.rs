//! Turning a query into a user turn and a bot turn.
//!
//! A submission is split in two halves around the remote call. [`begin`]
//! records the user message and returns a [`PendingSubmission`] that remembers
//! which conversation the query belongs to; [`finish`] appends the reply to
//! that conversation by id, whatever is selected by then.

use std::future::{self, Future};

use tracing::{debug, error, warn};

use super::context::AppState;
use super::conversation_state::{ConversationId, Message};
use crate::chat_client::CompletionBackend;
use crate::error::CompletionError;

/// Bot reply used when the chat endpoint could not produce an answer.
pub const ERROR_REPLY: &str = "Sorry, there was an error processing your request.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    conversation_id: ConversationId,
    query: String,
}

impl PendingSubmission {
    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Records `query` as a user message and enters the loading state.
///
/// Returns `None` without touching the state when the query is blank or a
/// previous submission is still loading.
pub fn begin(state: &mut AppState, query: &str) -> Option<PendingSubmission> {
    if query.trim().is_empty() {
        return None;
    }
    if state.is_loading() {
        debug!("Ignoring submission while a reply is pending");
        return None;
    }

    let selected = state.store.current_conversation().map(|c| c.id().clone());
    let conversation_id = match selected {
        Some(id) => id,
        None => {
            let id = state.store.create_conversation(query);
            state.select_conversation(id.clone());
            id
        }
    };

    if let Err(e) = state
        .store
        .append_message(&conversation_id, Message::user(query))
    {
        error!("Failed to record user message: {}", e);
        return None;
    }

    state.clear_pending_query();
    state.set_loading(true);

    Some(PendingSubmission {
        conversation_id,
        query: query.to_string(),
    })
}

/// Appends the outcome of the remote call and leaves the loading state.
pub fn finish(
    state: &mut AppState,
    pending: PendingSubmission,
    outcome: Result<String, CompletionError>,
) -> ConversationId {
    let reply = match outcome {
        Ok(response) => Message::bot(response),
        Err(e) => {
            error!("Error communicating with the chat endpoint: {}", e);
            Message::bot(ERROR_REPLY)
        }
    };

    if let Err(e) = state.store.append_message(&pending.conversation_id, reply) {
        error!("Failed to record bot reply: {}", e);
    }
    state.set_loading(false);

    pending.conversation_id
}

/// Runs a whole submission against `backend`.
///
/// Returns the id of the conversation that received the exchange, or `None`
/// when nothing was submitted.
pub async fn submit(
    state: &mut AppState,
    backend: &dyn CompletionBackend,
    query: &str,
) -> Option<ConversationId> {
    submit_until(state, backend, query, future::pending::<()>()).await
}

/// Like [`submit`], but abandons the remote call once `interrupt` resolves.
///
/// An abandoned call is finished as a failure, so the conversation still gets
/// the fixed error reply and the loading state is cleared.
pub async fn submit_until<F>(
    state: &mut AppState,
    backend: &dyn CompletionBackend,
    query: &str,
    interrupt: F,
) -> Option<ConversationId>
where
    F: Future<Output = ()>,
{
    let pending = begin(state, query)?;
    let outcome = tokio::select! {
        outcome = backend.complete(pending.query()) => outcome,
        _ = interrupt => {
            warn!(conversation_id = %pending.conversation_id(), "Chat request interrupted");
            Err(CompletionError::Interrupted)
        }
    };
    Some(finish(state, pending, outcome))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cli::chat::conversation_state::Role;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Backend that answers from a fixed script and records every query.
    pub(crate) struct FakeBackend {
        replies: Mutex<Vec<Result<String, u16>>>,
        pub(crate) queries: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        pub(crate) fn replying(replies: Vec<Result<&str, u16>>) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .rev()
                        .map(|r| r.map(str::to_string))
                        .collect(),
                ),
                queries: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn echo() -> Self {
            Self::replying(Vec::new())
        }
    }

    #[async_trait]
    impl CompletionBackend for FakeBackend {
        async fn complete(&self, query: &str) -> Result<String, CompletionError> {
            self.queries.lock().unwrap().push(query.to_string());
            match self.replies.lock().unwrap().pop() {
                Some(Ok(reply)) => Ok(reply),
                Some(Err(status)) => Err(CompletionError::Status {
                    status,
                    body: String::new(),
                }),
                None => Ok(format!("echo: {}", query)),
            }
        }
    }

    /// Backend whose reply never arrives.
    struct StalledBackend;

    #[async_trait]
    impl CompletionBackend for StalledBackend {
        async fn complete(&self, _query: &str) -> Result<String, CompletionError> {
            future::pending().await
        }
    }

    #[tokio::test]
    async fn test_interrupted_call_gets_error_reply_and_clears_loading() {
        let mut state = AppState::default();

        let id = submit_until(&mut state, &StalledBackend, "Hello", async {})
            .await
            .unwrap();

        assert_eq!(
            state.store.get(&id).unwrap().messages(),
            &[Message::user("Hello"), Message::bot(ERROR_REPLY)]
        );
        assert!(!state.is_loading());
        assert!(submit_until(&mut state, &FakeBackend::echo(), "again", future::pending())
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_submit_hello_creates_named_conversation() {
        let mut state = AppState::default();
        let backend = FakeBackend::replying(vec![Ok("Hi there")]);

        let id = submit(&mut state, &backend, "Hello").await.unwrap();

        assert_eq!(state.store.len(), 1);
        let conversation = state.store.get(&id).unwrap();
        assert_eq!(conversation.name(), "Hello");
        assert_eq!(
            conversation.messages(),
            &[Message::user("Hello"), Message::bot("Hi there")]
        );
        assert_eq!(state.store.current_id(), Some(&id));
        assert_eq!(*backend.queries.lock().unwrap(), vec!["Hello".to_string()]);
    }

    #[tokio::test]
    async fn test_blank_query_is_a_no_op() {
        let mut state = AppState::default();
        let backend = FakeBackend::echo();

        assert!(submit(&mut state, &backend, "").await.is_none());
        assert!(submit(&mut state, &backend, "   \t\n").await.is_none());

        assert!(state.store.is_empty());
        assert!(state.store.current_id().is_none());
        assert!(backend.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_n_submissions_yield_alternating_turns() {
        let mut state = AppState::default();
        let backend = FakeBackend::echo();
        let queries = ["one", "two", "three", "four"];

        for query in queries {
            submit(&mut state, &backend, query).await.unwrap();
        }

        let messages = state.store.current_messages();
        assert_eq!(messages.len(), 2 * queries.len());
        for (i, query) in queries.iter().enumerate() {
            assert_eq!(messages[2 * i], Message::user(*query));
            assert_eq!(messages[2 * i + 1], Message::bot(format!("echo: {}", query)));
        }
        assert_eq!(state.store.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_appends_single_error_reply_and_clears_loading() {
        let mut state = AppState::default();
        let backend = FakeBackend::replying(vec![Err(500)]);

        let id = submit(&mut state, &backend, "Hello").await.unwrap();

        let messages = state.store.get(&id).unwrap().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], Message::bot(ERROR_REPLY));
        assert_eq!(
            messages.iter().filter(|m| m.content == ERROR_REPLY).count(),
            1
        );
        assert!(!state.is_loading());
    }

    #[tokio::test]
    async fn test_new_conversation_after_start_new() {
        let mut state = AppState::default();
        let backend = FakeBackend::echo();

        let first = submit(&mut state, &backend, "first topic").await.unwrap();
        state.start_new();
        let second = submit(&mut state, &backend, "second topic").await.unwrap();

        assert_ne!(first, second);
        assert_eq!(state.store.len(), 2);
        assert_eq!(state.store.get(&first).unwrap().messages().len(), 2);
        assert_eq!(state.store.get(&second).unwrap().messages().len(), 2);
        assert_eq!(state.store.get(&second).unwrap().name(), "second topic");
        assert_eq!(state.store.current_id(), Some(&second));
    }

    #[test]
    fn test_begin_clears_pending_query_and_sets_loading() {
        let mut state = AppState::default();
        state.set_pending_query("Hello");

        let pending = begin(&mut state, "Hello").unwrap();

        assert_eq!(state.pending_query(), "");
        assert!(state.is_loading());
        assert_eq!(pending.query(), "Hello");
        assert_eq!(state.store.current_messages(), &[Message::user("Hello")]);
    }

    #[test]
    fn test_begin_is_refused_while_loading() {
        let mut state = AppState::default();
        begin(&mut state, "first").unwrap();

        assert!(begin(&mut state, "second").is_none());
        assert_eq!(state.store.current_messages().len(), 1);
    }

    #[test]
    fn test_reply_lands_in_original_conversation_after_selection_change() {
        let mut state = AppState::default();
        let pending = begin(&mut state, "first").unwrap();
        let first = pending.conversation_id().clone();

        state.start_new();
        let other = state.store.create_conversation("other");
        state.select_conversation(other.clone());

        let landed = finish(&mut state, pending, Ok("answer".to_string()));

        assert_eq!(landed, first);
        let messages = state.store.get(&first).unwrap().messages();
        assert_eq!(messages[1].role, Role::Bot);
        assert_eq!(messages[1].content, "answer");
        assert!(state.store.get(&other).unwrap().messages().is_empty());
        assert_eq!(state.store.current_id(), Some(&other));
    }

    #[test]
    fn test_dangling_selection_starts_a_new_conversation() {
        let mut state = AppState::default();
        state.select_conversation(ConversationId::new("missing"));

        let pending = begin(&mut state, "Hello").unwrap();

        assert_eq!(state.store.len(), 1);
        assert_eq!(state.store.current_id(), Some(pending.conversation_id()));
    }

    #[test]
    fn test_query_is_stored_untrimmed_but_named_by_prefix() {
        let mut state = AppState::default();
        let pending = begin(&mut state, "  spaced out question  ").unwrap();

        let conversation = state.store.get(pending.conversation_id()).unwrap();
        assert_eq!(conversation.messages()[0].content, "  spaced out question  ");
        assert_eq!(conversation.name(), "  spaced out question  ");
    }
}
