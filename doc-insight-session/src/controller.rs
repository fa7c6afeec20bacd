//! The chat session controller

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use doc_insight_api::{ChatRequest, HistoryEntry, InsightBackend, SetKeyRequest};
use doc_insight_core::{Conversation, Error, Result, Turn};

use crate::connectivity::ConnectivityMonitor;

/// Shown when the document or the question is blank
pub const EMPTY_INPUT_MSG: &str = "Please paste a document and enter a query.";
/// Shown when a submission is attempted while offline
pub const OFFLINE_MSG: &str = "No internet connection detected. Please check your network.";
/// Shown when the credential field is blank
pub const EMPTY_KEY_MSG: &str = "API Key cannot be empty.";
/// Shown when a call is made while another request is outstanding
pub const BUSY_MSG: &str = "A request is already in progress.";

/// How long the key-set confirmation stays visible
pub const KEY_CONFIRMATION_WINDOW: Duration = Duration::from_secs(3);

/// Owns the conversation and mediates the two backend operations.
///
/// Submission is optimistic: the turn is appended before the request is
/// sent, completed in place on success, and removed again on failure.
/// One request is in flight at a time; front ends should disable their
/// triggers while [`SessionController::is_busy`] is true, and a call made
/// while busy is rejected.
pub struct SessionController {
    backend: Arc<dyn InsightBackend>,
    connectivity: ConnectivityMonitor,
    key_name: String,
    conversation: Conversation,
    last_error: Option<String>,
    busy: bool,
    key_set_at: Option<Instant>,
}

impl SessionController {
    /// Create a controller over an injected backend transport
    pub fn new(
        backend: Arc<dyn InsightBackend>,
        key_name: impl Into<String>,
        connectivity: ConnectivityMonitor,
    ) -> Self {
        Self {
            backend,
            connectivity,
            key_name: key_name.into(),
            conversation: Conversation::new(),
            last_error: None,
            busy: false,
            key_set_at: None,
        }
    }

    /// The conversation so far
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// The most recently surfaced error message, if any
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether a request is currently outstanding
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// The latest known connectivity status
    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Whether the key-set confirmation should still be shown
    pub fn credential_confirmation_visible(&self) -> bool {
        self.key_set_at
            .map(|at| at.elapsed() < KEY_CONFIRMATION_WINDOW)
            .unwrap_or(false)
    }

    /// Forget all turns and any surfaced error
    pub fn reset_conversation(&mut self) {
        self.conversation.clear();
        self.last_error = None;
    }

    /// Submit a question about a document.
    ///
    /// Appends a pending turn immediately, sends the document, question,
    /// and full serialized history (the pending turn included, with its
    /// response unset) to the backend, then completes the last turn on
    /// success or removes it again on failure. Inputs are validated
    /// trimmed but sent as given.
    pub async fn submit_turn(&mut self, document_text: &str, user_query: &str) -> Result<&Turn> {
        if document_text.trim().is_empty() || user_query.trim().is_empty() {
            return Err(self.reject(EMPTY_INPUT_MSG));
        }
        if !self.connectivity.is_online() {
            return Err(self.reject(OFFLINE_MSG));
        }
        if self.busy {
            return Err(self.reject(BUSY_MSG));
        }

        self.last_error = None;
        self.busy = true;
        self.conversation.push_pending(user_query);

        let request = ChatRequest {
            document_text: document_text.to_string(),
            user_query: user_query.to_string(),
            chat_history: self.serialized_history(),
        };

        debug!(
            "Submitting turn {} ({} history entries)",
            self.conversation.len(),
            request.chat_history.len()
        );
        let result = self.backend.chat(&request).await;
        self.busy = false;

        match result {
            Ok(reply) => {
                let turn = self.conversation.complete_last(reply.response)?;
                Ok(turn)
            }
            Err(err) => {
                warn!("Chat request failed, rolling back pending turn: {}", err);
                self.conversation.rollback_last();
                Err(self.fail(format!("Failed to get insights: {}", err)))
            }
        }
    }

    /// Register a session credential with the backend.
    ///
    /// The key lives only in backend memory for the session; the client
    /// keeps nothing but a short-lived confirmation flag. Not gated on
    /// connectivity.
    pub async fn set_credential(&mut self, raw_key: &str) -> Result<()> {
        if raw_key.trim().is_empty() {
            return Err(self.reject(EMPTY_KEY_MSG));
        }
        if self.busy {
            return Err(self.reject(BUSY_MSG));
        }

        self.last_error = None;
        self.key_set_at = None;
        self.busy = true;

        let request = SetKeyRequest {
            key_name: self.key_name.clone(),
            key_value: raw_key.to_string(),
        };

        debug!("Registering API key '{}'", self.key_name);
        let result = self.backend.set_api_key(&request).await;
        self.busy = false;

        match result {
            Ok(()) => {
                self.key_set_at = Some(Instant::now());
                Ok(())
            }
            Err(err) => Err(self.fail(format!("Failed to set API Key: {}", err))),
        }
    }

    /// The conversation as the backend receives it
    fn serialized_history(&self) -> Vec<HistoryEntry> {
        self.conversation
            .turns()
            .iter()
            .map(|turn| HistoryEntry {
                user_query: turn.user_query.clone(),
                ai_response: turn.ai_response.clone(),
            })
            .collect()
    }

    fn reject(&mut self, message: &str) -> Error {
        self.last_error = Some(message.to_string());
        Error::Validation(message.to_string())
    }

    fn fail(&mut self, message: String) -> Error {
        self.last_error = Some(message.clone());
        Error::Backend(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity;
    use async_trait::async_trait;
    use doc_insight_api::{ApiError, ApiResult, ChatResponse};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted in-memory transport; captures every request it receives.
    #[derive(Default)]
    struct FakeBackend {
        chat_requests: Mutex<Vec<ChatRequest>>,
        chat_replies: Mutex<VecDeque<std::result::Result<String, String>>>,
        key_requests: Mutex<Vec<SetKeyRequest>>,
        key_replies: Mutex<VecDeque<std::result::Result<(), String>>>,
    }

    impl FakeBackend {
        fn reply_with(&self, reply: std::result::Result<&str, &str>) {
            self.chat_replies.lock().unwrap().push_back(
                reply
                    .map(ToString::to_string)
                    .map_err(ToString::to_string),
            );
        }

        fn key_reply_with(&self, reply: std::result::Result<(), &str>) {
            self.key_replies
                .lock()
                .unwrap()
                .push_back(reply.map_err(ToString::to_string));
        }

        fn chat_calls(&self) -> usize {
            self.chat_requests.lock().unwrap().len()
        }

        fn key_calls(&self) -> usize {
            self.key_requests.lock().unwrap().len()
        }

        fn last_chat_request(&self) -> ChatRequest {
            self.chat_requests.lock().unwrap().last().unwrap().clone()
        }
    }

    #[async_trait]
    impl InsightBackend for FakeBackend {
        async fn chat(&self, request: &ChatRequest) -> ApiResult<ChatResponse> {
            self.chat_requests.lock().unwrap().push(request.clone());
            match self.chat_replies.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(ChatResponse { response: text }),
                Some(Err(message)) => Err(ApiError::Backend(message)),
                None => Ok(ChatResponse {
                    response: "ok".to_string(),
                }),
            }
        }

        async fn set_api_key(&self, request: &SetKeyRequest) -> ApiResult<()> {
            self.key_requests.lock().unwrap().push(request.clone());
            match self.key_replies.lock().unwrap().pop_front() {
                Some(Ok(())) => Ok(()),
                Some(Err(message)) => Err(ApiError::Backend(message)),
                None => Ok(()),
            }
        }
    }

    fn online_controller(backend: Arc<FakeBackend>) -> SessionController {
        SessionController::new(backend, "my_llm_key", connectivity::always_online())
    }

    #[tokio::test]
    async fn test_submit_appends_pending_turn_before_request_resolves() {
        let backend = Arc::new(FakeBackend::default());
        backend.reply_with(Ok("This paper discusses..."));
        let mut controller = online_controller(backend.clone());

        controller
            .submit_turn("Deep learning paper...", "Summarize")
            .await
            .unwrap();

        // The request captured by the transport proves the pending turn
        // was appended before the call resolved
        let request = backend.last_chat_request();
        assert_eq!(request.chat_history.len(), 1);
        assert_eq!(request.chat_history[0].user_query, "Summarize");
        assert_eq!(request.chat_history[0].ai_response, None);
        assert_eq!(request.document_text, "Deep learning paper...");
        assert_eq!(request.user_query, "Summarize");
    }

    #[tokio::test]
    async fn test_successful_submit_completes_only_the_last_turn() {
        let backend = Arc::new(FakeBackend::default());
        backend.reply_with(Ok("first answer"));
        backend.reply_with(Ok("second answer"));
        let mut controller = online_controller(backend.clone());

        controller.submit_turn("doc", "first question").await.unwrap();
        controller
            .submit_turn("doc", "second question")
            .await
            .unwrap();

        let turns = controller.conversation().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].ai_response.as_deref(), Some("first answer"));
        assert_eq!(turns[1].ai_response.as_deref(), Some("second answer"));

        // Completed turns serialize with their answers; the pending one
        // goes out with its response unset
        let request = backend.last_chat_request();
        assert_eq!(request.chat_history.len(), 2);
        assert_eq!(
            request.chat_history[0].ai_response.as_deref(),
            Some("first answer")
        );
        assert_eq!(request.chat_history[1].ai_response, None);
    }

    #[tokio::test]
    async fn test_failed_submit_rolls_back_the_pending_turn() {
        let backend = Arc::new(FakeBackend::default());
        backend.reply_with(Ok("kept"));
        backend.reply_with(Err("model unavailable"));
        let mut controller = online_controller(backend.clone());

        controller.submit_turn("doc", "first").await.unwrap();
        let err = controller.submit_turn("doc", "second").await.unwrap_err();

        assert!(matches!(err, Error::Backend(_)));
        assert_eq!(
            controller.last_error(),
            Some("Failed to get insights: model unavailable")
        );
        // Net zero turns added by the failed submission
        assert_eq!(controller.conversation().len(), 1);
        assert_eq!(controller.conversation().turns()[0].user_query, "first");
    }

    #[tokio::test]
    async fn test_failed_submit_on_empty_conversation_leaves_it_empty() {
        let backend = Arc::new(FakeBackend::default());
        backend.reply_with(Err("model unavailable"));
        let mut controller = online_controller(backend.clone());

        controller
            .submit_turn("Deep learning paper...", "Summarize")
            .await
            .unwrap_err();

        assert!(controller.conversation().is_empty());
        assert_eq!(
            controller.last_error(),
            Some("Failed to get insights: model unavailable")
        );
    }

    #[tokio::test]
    async fn test_whitespace_query_is_rejected_without_a_network_call() {
        let backend = Arc::new(FakeBackend::default());
        let mut controller = online_controller(backend.clone());

        let err = controller.submit_turn("doc", "   ").await.unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(controller.last_error(), Some(EMPTY_INPUT_MSG));
        assert_eq!(backend.chat_calls(), 0);
        assert!(controller.conversation().is_empty());
    }

    #[tokio::test]
    async fn test_empty_document_is_rejected_without_a_network_call() {
        let backend = Arc::new(FakeBackend::default());
        let mut controller = online_controller(backend.clone());

        controller.submit_turn("", "Summarize").await.unwrap_err();

        assert_eq!(controller.last_error(), Some(EMPTY_INPUT_MSG));
        assert_eq!(backend.chat_calls(), 0);
    }

    #[tokio::test]
    async fn test_offline_submission_is_rejected_without_a_network_call() {
        let backend = Arc::new(FakeBackend::default());
        let (handle, monitor) = connectivity::channel(false);
        let mut controller = SessionController::new(backend.clone(), "my_llm_key", monitor);

        let err = controller.submit_turn("doc", "Summarize").await.unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(controller.last_error(), Some(OFFLINE_MSG));
        assert_eq!(backend.chat_calls(), 0);
        assert!(controller.conversation().is_empty());

        // Back online, the same submission goes through
        handle.set_online(true);
        backend.reply_with(Ok("answer"));
        controller.submit_turn("doc", "Summarize").await.unwrap();
        assert_eq!(controller.conversation().len(), 1);
    }

    #[tokio::test]
    async fn test_accepted_submission_clears_previous_error() {
        let backend = Arc::new(FakeBackend::default());
        backend.reply_with(Err("model unavailable"));
        backend.reply_with(Ok("answer"));
        let mut controller = online_controller(backend.clone());

        controller.submit_turn("doc", "q").await.unwrap_err();
        assert!(controller.last_error().is_some());

        controller.submit_turn("doc", "q").await.unwrap();
        assert!(controller.last_error().is_none());
    }

    #[tokio::test]
    async fn test_untrimmed_inputs_are_sent_as_given() {
        let backend = Arc::new(FakeBackend::default());
        backend.reply_with(Ok("answer"));
        let mut controller = online_controller(backend.clone());

        controller.submit_turn("  doc body  ", " query ").await.unwrap();

        let request = backend.last_chat_request();
        assert_eq!(request.document_text, "  doc body  ");
        assert_eq!(request.user_query, " query ");
    }

    #[tokio::test]
    async fn test_set_credential_registers_under_the_configured_name() {
        let backend = Arc::new(FakeBackend::default());
        let mut controller = online_controller(backend.clone());

        controller.set_credential("sk-test-123").await.unwrap();

        let requests = backend.key_requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].key_name, "my_llm_key");
        assert_eq!(requests[0].key_value, "sk-test-123");
        drop(requests);

        assert!(controller.credential_confirmation_visible());
        assert!(controller.last_error().is_none());
    }

    #[tokio::test]
    async fn test_set_credential_is_idempotent() {
        let backend = Arc::new(FakeBackend::default());
        let mut controller = online_controller(backend.clone());

        controller.set_credential("sk-test-123").await.unwrap();
        controller.set_credential("sk-test-123").await.unwrap();

        assert_eq!(backend.key_calls(), 2);
        assert!(controller.credential_confirmation_visible());
        assert!(controller.last_error().is_none());
    }

    #[tokio::test]
    async fn test_empty_credential_is_rejected_without_a_network_call() {
        let backend = Arc::new(FakeBackend::default());
        let mut controller = online_controller(backend.clone());

        let err = controller.set_credential("   ").await.unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(controller.last_error(), Some(EMPTY_KEY_MSG));
        assert_eq!(backend.key_calls(), 0);
    }

    #[tokio::test]
    async fn test_set_credential_failure_surfaces_backend_message() {
        let backend = Arc::new(FakeBackend::default());
        backend.key_reply_with(Err("Missing 'key_name' or 'key_value'"));
        let mut controller = online_controller(backend.clone());

        controller.set_credential("sk-test-123").await.unwrap_err();

        assert_eq!(
            controller.last_error(),
            Some("Failed to set API Key: Missing 'key_name' or 'key_value'")
        );
        assert!(!controller.credential_confirmation_visible());
    }

    #[tokio::test]
    async fn test_credential_is_never_part_of_chat_history() {
        let backend = Arc::new(FakeBackend::default());
        backend.reply_with(Ok("answer"));
        let mut controller = online_controller(backend.clone());

        controller.set_credential("sk-secret").await.unwrap();
        controller.submit_turn("doc", "q").await.unwrap();

        let request = backend.last_chat_request();
        let serialized = serde_json::to_string(&request).unwrap();
        assert!(!serialized.contains("sk-secret"));
    }

    #[tokio::test]
    async fn test_reset_conversation_drops_turns_and_error() {
        let backend = Arc::new(FakeBackend::default());
        backend.reply_with(Ok("answer"));
        backend.reply_with(Err("model unavailable"));
        let mut controller = online_controller(backend.clone());

        controller.submit_turn("doc", "q").await.unwrap();
        controller.submit_turn("doc", "q2").await.unwrap_err();

        controller.reset_conversation();
        assert!(controller.conversation().is_empty());
        assert!(controller.last_error().is_none());
    }
}
