//! Conversation session controller
//!
//! Owns the conversation, the draft, and the idle/awaiting status. A front-end
//! that has to keep drawing while a request is in flight drives the two halves
//! of a submission itself ([`Session::begin_submit`] and
//! [`Session::complete`]); anything that can simply await uses
//! [`Session::submit`].

use crate::backend::ChatBackend;
use crate::error::BackendError;
use crate::state::ChatMessage;

/// Shown in place of an answer whenever the backend could not produce one.
pub const APOLOGY: &str =
    "Sorry, I couldn't connect to the server. Make sure the backend is running on port 8000.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    AwaitingResponse,
}

#[derive(Debug, Default)]
pub struct Session {
    messages: Vec<ChatMessage>,
    draft: String,
    status: SessionStatus,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_busy(&self) -> bool {
        self.status == SessionStatus::AwaitingResponse
    }

    /// Whether a submission would be accepted right now.
    pub fn can_send(&self) -> bool {
        !self.is_busy() && !self.draft.trim().is_empty()
    }

    /// Replace the draft. Allowed while a request is in flight.
    pub fn update_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// First half of a submission.
    ///
    /// Appends the draft as a user message, clears the draft and marks the
    /// session busy, returning the text to send. Returns `None` without
    /// touching anything if the draft is blank or a request is already
    /// outstanding.
    pub fn begin_submit(&mut self) -> Option<String> {
        if !self.can_send() {
            return None;
        }

        let message = std::mem::take(&mut self.draft);
        self.messages.push(ChatMessage::user(message.clone()));
        self.status = SessionStatus::AwaitingResponse;

        tracing::info!(messages = self.messages.len(), "submitted question");
        Some(message)
    }

    /// Second half of a submission: record the outcome and go back to idle.
    pub fn complete(&mut self, outcome: Result<String, BackendError>) {
        if !self.is_busy() {
            tracing::warn!("ignoring backend reply with no request outstanding");
            return;
        }

        let content = match outcome {
            Ok(answer) => answer,
            Err(err) => {
                tracing::warn!(error = %err, "backend unavailable");
                APOLOGY.to_string()
            }
        };

        self.messages.push(ChatMessage::assistant(content));
        self.status = SessionStatus::Idle;
    }

    /// Run a whole submission against `backend`. Returns whether the draft
    /// was accepted.
    pub async fn submit<B: ChatBackend + ?Sized>(&mut self, backend: &B) -> bool {
        let Some(message) = self.begin_submit() else {
            return false;
        };

        let outcome = backend.ask(&message).await;
        self.complete(outcome);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ChatRole;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    /// Answers every question the same way and remembers what it was asked.
    struct ScriptedBackend {
        answer: Option<String>,
        asked: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn answering(answer: &str) -> Self {
            Self {
                answer: Some(answer.to_string()),
                asked: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                answer: None,
                asked: Mutex::new(Vec::new()),
            }
        }

        fn asked(&self) -> Vec<String> {
            self.asked.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn ask(&self, message: &str) -> Result<String, BackendError> {
            self.asked.lock().unwrap().push(message.to_string());
            match &self.answer {
                Some(answer) => Ok(answer.clone()),
                None => Err(BackendError::Status(StatusCode::SERVICE_UNAVAILABLE)),
            }
        }
    }

    #[test]
    fn new_session_is_idle_and_empty() {
        let session = Session::new();
        assert!(session.is_empty());
        assert_eq!(session.draft(), "");
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(!session.can_send());
    }

    #[tokio::test]
    async fn submit_appends_question_then_answer() {
        let backend = ScriptedBackend::answering("X");
        let mut session = Session::new();
        session.update_draft("Is my deposit refundable?");

        assert!(session.submit(&backend).await);

        assert_eq!(
            session.messages(),
            &[
                ChatMessage::user("Is my deposit refundable?"),
                ChatMessage::assistant("X"),
            ]
        );
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(session.draft(), "");
        assert_eq!(backend.asked(), vec!["Is my deposit refundable?"]);
    }

    #[tokio::test]
    async fn blank_drafts_are_ignored() {
        let backend = ScriptedBackend::answering("unused");
        let mut session = Session::new();

        for draft in ["", "   ", "\n\t "] {
            session.update_draft(draft);
            assert!(!session.submit(&backend).await);
            assert!(session.is_empty());
            assert_eq!(session.status(), SessionStatus::Idle);
            assert_eq!(session.draft(), draft);
        }
        assert!(backend.asked().is_empty());
    }

    #[tokio::test]
    async fn submit_while_awaiting_is_ignored() {
        let backend = ScriptedBackend::answering("unused");
        let mut session = Session::new();
        session.update_draft("first");
        assert_eq!(session.begin_submit().as_deref(), Some("first"));

        session.update_draft("second");
        assert!(!session.can_send());
        assert!(!session.submit(&backend).await);
        assert!(session.begin_submit().is_none());

        assert_eq!(session.messages().len(), 1);
        assert!(session.is_busy());
        assert_eq!(session.draft(), "second");
        assert!(backend.asked().is_empty());
    }

    #[test]
    fn draft_can_change_while_awaiting() {
        let mut session = Session::new();
        session.update_draft("first");
        session.begin_submit();

        session.update_draft("typing ahead");
        assert_eq!(session.draft(), "typing ahead");
        assert!(session.is_busy());
    }

    #[tokio::test]
    async fn failure_appends_apology_and_returns_to_idle() {
        let backend = ScriptedBackend::failing();
        let mut session = Session::new();
        session.update_draft("hello");

        assert!(session.submit(&backend).await);

        let last = session.messages().last().unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(last.content, APOLOGY);
        assert_eq!(session.status(), SessionStatus::Idle);

        // Still usable afterwards
        session.update_draft("again");
        assert!(session.can_send());
    }

    #[test]
    fn every_failure_kind_reads_the_same() {
        let failures = vec![
            BackendError::Status(StatusCode::NOT_FOUND),
            BackendError::Status(StatusCode::INTERNAL_SERVER_ERROR),
            BackendError::Malformed(serde_json::from_str::<String>("{").unwrap_err()),
            BackendError::Task("panicked".to_string()),
        ];

        for failure in failures {
            let mut session = Session::new();
            session.update_draft("q");
            session.begin_submit();
            session.complete(Err(failure));
            assert_eq!(session.messages()[1].content, APOLOGY);
        }
    }

    #[test]
    fn user_message_keeps_surrounding_whitespace() {
        let mut session = Session::new();
        session.update_draft("  padded  ");

        assert_eq!(session.begin_submit().as_deref(), Some("  padded  "));
        assert_eq!(session.messages()[0].content, "  padded  ");
    }

    #[test]
    fn stray_completion_is_ignored() {
        let mut session = Session::new();
        session.complete(Ok("late".to_string()));

        assert!(session.is_empty());
        assert_eq!(session.status(), SessionStatus::Idle);
    }

    #[tokio::test]
    async fn conversation_grows_two_messages_per_exchange() {
        let backend = ScriptedBackend::answering("noted");
        let mut session = Session::new();

        for (i, question) in ["one", "two", "three"].into_iter().enumerate() {
            session.update_draft(question);
            assert!(session.submit(&backend).await);
            assert_eq!(session.messages().len(), (i + 1) * 2);
        }

        let roles: Vec<ChatRole> = session.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, [ChatRole::User, ChatRole::Assistant].repeat(3));
    }
}
