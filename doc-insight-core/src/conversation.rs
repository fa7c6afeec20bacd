//! Conversation data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One question/answer exchange in a conversation.
///
/// A turn starts out pending (`ai_response` is `None`) and is completed
/// exactly once when the backend answers. A turn whose answer never
/// arrives is removed from the conversation, not left half-filled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// The user's question
    pub user_query: String,
    /// The backend's answer, absent while the request is outstanding
    pub ai_response: Option<String>,
    /// When the question was asked
    pub asked_at: DateTime<Utc>,
}

impl Turn {
    /// Create a new pending turn
    pub fn pending(user_query: impl Into<String>) -> Self {
        Self {
            user_query: user_query.into(),
            ai_response: None,
            asked_at: Utc::now(),
        }
    }

    /// Whether this turn is still waiting for an answer
    pub fn is_pending(&self) -> bool {
        self.ai_response.is_none()
    }
}

/// An ordered, append-only sequence of turns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
    /// Conversation creation time
    pub started_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create an empty conversation
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            turns: Vec::new(),
            started_at: now,
            updated_at: now,
        }
    }

    /// All turns, oldest first
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the conversation has no turns
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The most recent turn, if any
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Append a pending turn for a freshly submitted question
    pub fn push_pending(&mut self, user_query: impl Into<String>) -> &Turn {
        self.turns.push(Turn::pending(user_query));
        self.updated_at = Utc::now();
        self.turns.last().expect("turn just pushed")
    }

    /// Fill in the answer on the most recent turn.
    ///
    /// The last turn must exist and still be pending; turns are completed
    /// exactly once and never overwritten.
    pub fn complete_last(&mut self, ai_response: impl Into<String>) -> crate::Result<&Turn> {
        let turn = self
            .turns
            .last_mut()
            .ok_or_else(|| crate::Error::Conversation("no turn to complete".to_string()))?;
        if turn.ai_response.is_some() {
            return Err(crate::Error::Conversation(
                "last turn is already completed".to_string(),
            ));
        }
        turn.ai_response = Some(ai_response.into());
        self.updated_at = Utc::now();
        Ok(self.turns.last().expect("turn exists"))
    }

    /// Remove the most recent turn, undoing an optimistic append
    pub fn rollback_last(&mut self) -> Option<Turn> {
        let turn = self.turns.pop();
        if turn.is_some() {
            self.updated_at = Utc::now();
        }
        turn
    }

    /// Remove all turns
    pub fn clear(&mut self) {
        self.turns.clear();
        self.updated_at = Utc::now();
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_conversation_is_empty() {
        let conversation = Conversation::new();
        assert!(conversation.is_empty());
        assert_eq!(conversation.len(), 0);
        assert!(conversation.last().is_none());
    }

    #[test]
    fn test_push_pending_appends_in_order() {
        let mut conversation = Conversation::new();
        conversation.push_pending("first");
        conversation.push_pending("second");

        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.turns()[0].user_query, "first");
        assert_eq!(conversation.turns()[1].user_query, "second");
        assert!(conversation.turns().iter().all(Turn::is_pending));
    }

    #[test]
    fn test_complete_last_fills_only_the_last_turn() {
        let mut conversation = Conversation::new();
        conversation.push_pending("first");
        conversation.complete_last("answer one").unwrap();
        conversation.push_pending("second");
        conversation.complete_last("answer two").unwrap();

        assert_eq!(
            conversation.turns()[0].ai_response.as_deref(),
            Some("answer one")
        );
        assert_eq!(
            conversation.turns()[1].ai_response.as_deref(),
            Some("answer two")
        );
    }

    #[test]
    fn test_complete_last_rejects_empty_conversation() {
        let mut conversation = Conversation::new();
        let err = conversation.complete_last("answer").unwrap_err();
        assert!(err.to_string().contains("no turn"));
    }

    #[test]
    fn test_complete_last_rejects_double_completion() {
        let mut conversation = Conversation::new();
        conversation.push_pending("question");
        conversation.complete_last("answer").unwrap();

        let err = conversation.complete_last("again").unwrap_err();
        assert!(err.to_string().contains("already completed"));
    }

    #[test]
    fn test_rollback_last_removes_the_pending_turn() {
        let mut conversation = Conversation::new();
        conversation.push_pending("kept");
        conversation.complete_last("answer").unwrap();
        conversation.push_pending("discarded");

        let removed = conversation.rollback_last().unwrap();
        assert_eq!(removed.user_query, "discarded");
        assert!(removed.is_pending());
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.turns()[0].user_query, "kept");
    }

    #[test]
    fn test_rollback_on_empty_conversation() {
        let mut conversation = Conversation::new();
        assert!(conversation.rollback_last().is_none());
    }
}
