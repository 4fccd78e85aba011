//! Session lifecycle management
//!
//! [`SessionManager`] owns the session list, the current session and its
//! transcript. It is the single writer for all of them: the send use case
//! reaches the transcript only through the manager.
//!
//! Invariants kept by every operation:
//!
//! - the session list is never empty
//! - the current session id is always present in the list
//! - the transcript always belongs to the current session

use crate::ports::chat_update::ChatUpdate;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::session_api::{ApiError, SessionApiPort, SessionSummary};
use chrono::Utc;
use kubechat_domain::{
    DEFAULT_SESSION_TITLE, DomainError, Message, MessageId, Session, SessionId, Transcript,
    derive_title, is_blank,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Errors from session lifecycle operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Owner of the session list and the current transcript.
pub struct SessionManager<A: SessionApiPort> {
    api: Arc<A>,
    sessions: Vec<Session>,
    current: SessionId,
    transcript: Transcript,
    tx: mpsc::UnboundedSender<ChatUpdate>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl<A: SessionApiPort> SessionManager<A> {
    /// Create a manager and load the stored sessions.
    ///
    /// Selects the most recent stored session, or creates an ephemeral one
    /// if there is none.
    pub async fn initialize(api: Arc<A>, tx: mpsc::UnboundedSender<ChatUpdate>) -> Self {
        Self::initialize_with_logger(api, tx, Arc::new(NoConversationLogger)).await
    }

    /// Like [`initialize`](Self::initialize), recording lifecycle events to
    /// the given conversation logger.
    pub async fn initialize_with_logger(
        api: Arc<A>,
        tx: mpsc::UnboundedSender<ChatUpdate>,
        conversation_logger: Arc<dyn ConversationLogger>,
    ) -> Self {
        let placeholder = SessionId::new("");
        let mut manager = Self {
            api,
            sessions: Vec::new(),
            current: placeholder.clone(),
            transcript: Transcript::new(placeholder),
            tx,
            conversation_logger,
        };
        manager.list_sessions().await;
        manager
    }

    // ==================== Accessors ====================

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn current_session_id(&self) -> &SessionId {
        &self.current
    }

    pub fn current_session(&self) -> Option<&Session> {
        self.find(&self.current)
    }

    pub fn find(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| &s.id == id)
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    // ==================== Lifecycle operations ====================

    /// Refresh the list from the backend, most recent first.
    ///
    /// Local ephemeral sessions stay ahead of the stored ones. If the list
    /// ends up empty, exactly one ephemeral session is created. A failed
    /// fetch keeps the current list.
    pub async fn list_sessions(&mut self) -> &[Session] {
        match self.api.list_sessions().await {
            Ok(summaries) => {
                debug!("Loaded {} stored sessions", summaries.len());
                let mut sessions: Vec<Session> = self
                    .sessions
                    .iter()
                    .filter(|s| s.is_ephemeral)
                    .cloned()
                    .collect();
                sessions.extend(summaries.into_iter().map(SessionSummary::into_session));
                self.sessions = sessions;
            }
            Err(e) => {
                warn!("Failed to load sessions: {}", e);
            }
        }

        if self.sessions.is_empty() {
            self.create_ephemeral();
        } else if self.find(&self.current).is_none() {
            let most_recent = self.sessions[0].id.clone();
            self.select(most_recent).await;
        }

        self.emit_sessions();
        &self.sessions
    }

    /// Create a new ephemeral session, prepend it and make it current.
    pub fn create_ephemeral(&mut self) -> &Session {
        let session = Session::ephemeral();
        debug!("Created ephemeral session {}", session.id);
        self.current = session.id.clone();
        self.transcript = Transcript::new(session.id.clone());
        self.sessions.insert(0, session);

        self.emit_sessions();
        self.emit(ChatUpdate::CurrentSessionChanged(self.current.clone()));
        self.emit_transcript();
        &self.sessions[0]
    }

    /// Make `id` current and load its transcript.
    ///
    /// A failed history fetch is logged and leaves an empty transcript.
    pub async fn switch_to(&mut self, id: &SessionId) -> Result<(), SessionError> {
        if self.find(id).is_none() {
            return Err(DomainError::SessionNotFound(id.to_string()).into());
        }
        self.select(id.clone()).await;
        Ok(())
    }

    /// Replace the ephemeral session `ephemeral_id` by a stored one.
    ///
    /// The new entry keeps the list position and adopts the server's id and
    /// title. If the session was current, the current id and the transcript
    /// move to the new id. Returns the id to send against; a session that is
    /// already stored is returned unchanged.
    pub async fn persist_on_first_send(
        &mut self,
        ephemeral_id: &SessionId,
    ) -> Result<SessionId, SessionError> {
        let Some(session) = self.find(ephemeral_id) else {
            return Err(DomainError::SessionNotFound(ephemeral_id.to_string()).into());
        };
        if !session.is_ephemeral {
            return Ok(ephemeral_id.clone());
        }

        let created = self.api.create_session(DEFAULT_SESSION_TITLE).await?;
        info!(
            "Persisted session {} as {} ({})",
            ephemeral_id, created.session_id, created.title
        );

        let now = Utc::now();
        let persisted = Session::persisted(created.session_id.clone(), created.title, now, now, 0);
        if let Some(entry) = self.sessions.iter_mut().find(|s| &s.id == ephemeral_id) {
            *entry = persisted;
        }
        if &self.current == ephemeral_id {
            self.current = created.session_id.clone();
            self.transcript.rebind(created.session_id.clone());
            self.emit(ChatUpdate::CurrentSessionChanged(self.current.clone()));
        }

        self.conversation_logger.log(ConversationEvent::new(
            "session_persisted",
            serde_json::json!({
                "ephemeral_id": ephemeral_id.as_str(),
                "session_id": created.session_id.as_str(),
            }),
        ));
        self.emit_sessions();
        Ok(created.session_id)
    }

    /// Rename a stored session.
    pub async fn rename(&mut self, id: &SessionId, title: &str) -> Result<(), SessionError> {
        if is_blank(title) {
            return Err(DomainError::EmptyTitle.into());
        }
        let Some(session) = self.find(id) else {
            return Err(DomainError::SessionNotFound(id.to_string()).into());
        };
        if session.is_ephemeral {
            return Err(DomainError::EphemeralSession.into());
        }

        let title = title.trim();
        self.api.rename_session(id, title).await?;
        if let Some(session) = self.sessions.iter_mut().find(|s| &s.id == id) {
            session.title = title.to_string();
        }

        self.conversation_logger.log(ConversationEvent::new(
            "session_renamed",
            serde_json::json!({ "session_id": id.as_str(), "title": title }),
        ));
        self.emit_sessions();
        Ok(())
    }

    /// Delete a session.
    ///
    /// Ephemeral sessions are removed locally; stored ones only after the
    /// backend confirms. Deleting the only stored session is rejected. When
    /// the current session goes away, the most recent remaining session is
    /// selected, or a new ephemeral one is created.
    pub async fn delete(&mut self, id: &SessionId) -> Result<(), SessionError> {
        let Some(session) = self.find(id) else {
            return Err(DomainError::SessionNotFound(id.to_string()).into());
        };
        let is_ephemeral = session.is_ephemeral;
        let stored = self.sessions.iter().filter(|s| !s.is_ephemeral).count();
        if !is_ephemeral && stored <= 1 {
            return Err(DomainError::LastSession.into());
        }

        if !is_ephemeral {
            self.api.delete_session(id).await?;
            self.conversation_logger.log(ConversationEvent::new(
                "session_deleted",
                serde_json::json!({ "session_id": id.as_str() }),
            ));
        }
        self.sessions.retain(|s| &s.id != id);
        debug!("Deleted session {}", id);

        if &self.current == id {
            match self.sessions.first().map(|s| s.id.clone()) {
                Some(next) => self.select(next).await,
                None => {
                    self.create_ephemeral();
                }
            }
        }

        self.emit_sessions();
        Ok(())
    }

    // ==================== Exchange support ====================

    /// Append a message to the transcript of `session_id`.
    ///
    /// Returns false if `session_id` is no longer current.
    pub fn append_message(&mut self, session_id: &SessionId, message: Message) -> bool {
        if self.transcript.session_id() != session_id {
            return false;
        }
        self.emit(ChatUpdate::MessageAdded(message.clone()));
        self.transcript.push(message);
        true
    }

    /// Mutate a message of the transcript of `session_id`.
    ///
    /// Returns the closure's result and a snapshot of the message, or `None`
    /// if the session is no longer current or the message is gone.
    pub fn update_message<R>(
        &mut self,
        session_id: &SessionId,
        message_id: &MessageId,
        f: impl FnOnce(&mut Message) -> R,
    ) -> Option<(R, Message)> {
        if self.transcript.session_id() != session_id {
            return None;
        }
        let message = self.transcript.get_mut(message_id)?;
        let result = f(message);
        Some((result, message.clone()))
    }

    /// Update session metadata after the backend finished an exchange.
    ///
    /// `first_message` carries the user text when this was the session's
    /// first message: the derived title is pushed to the backend and applied
    /// locally once stored. A failed push is logged and the local title is
    /// kept; the count is bumped either way.
    pub async fn record_exchange(&mut self, session_id: &SessionId, first_message: Option<&str>) {
        let title = match first_message.map(derive_title) {
            Some(title) => match self.api.rename_session(session_id, &title).await {
                Ok(()) => Some(title),
                Err(e) => {
                    warn!("Failed to update session title: {}", e);
                    None
                }
            },
            None => None,
        };

        let Some(session) = self.sessions.iter_mut().find(|s| &s.id == session_id) else {
            debug!("Session {} vanished before metadata update", session_id);
            return;
        };
        if let Some(title) = title {
            session.title = title;
        }
        session.record_exchange();
        self.emit_sessions();
    }

    // ==================== Internals ====================

    async fn select(&mut self, id: SessionId) {
        let is_ephemeral = self.find(&id).is_some_and(|s| s.is_ephemeral);
        self.current = id.clone();
        self.emit(ChatUpdate::CurrentSessionChanged(id.clone()));

        let messages = if is_ephemeral {
            Vec::new()
        } else {
            match self.api.fetch_history(&id).await {
                Ok(history) => history.into_iter().map(|h| h.into_message()).collect(),
                Err(e) => {
                    warn!("Failed to load session history for {}: {}", id, e);
                    Vec::new()
                }
            }
        };

        self.transcript = Transcript::with_messages(id, messages);
        self.emit_transcript();
    }

    fn emit_sessions(&self) {
        self.emit(ChatUpdate::SessionsChanged(self.sessions.clone()));
    }

    fn emit_transcript(&self) {
        self.emit(ChatUpdate::TranscriptLoaded {
            session_id: self.transcript.session_id().clone(),
            messages: self.transcript.messages().to_vec(),
        });
    }

    fn emit(&self, update: ChatUpdate) {
        // The renderer may already be gone during shutdown.
        let _ = self.tx.send(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{MockSessionApi, drain, history, summary};
    use kubechat_domain::Role;

    async fn manager_with(
        api: MockSessionApi,
    ) -> (
        SessionManager<MockSessionApi>,
        Arc<MockSessionApi>,
        mpsc::UnboundedReceiver<ChatUpdate>,
    ) {
        let api = Arc::new(api);
        let (tx, rx) = mpsc::unbounded_channel();
        let manager = SessionManager::initialize(api.clone(), tx).await;
        (manager, api, rx)
    }

    #[tokio::test]
    async fn test_empty_backend_creates_one_ephemeral_session() {
        let (manager, _, _) = manager_with(MockSessionApi::new(vec![])).await;

        assert_eq!(manager.sessions().len(), 1);
        let session = &manager.sessions()[0];
        assert!(session.is_ephemeral);
        assert_eq!(session.title, "New Chat");
        assert_eq!(session.message_count, 0);
        assert_eq!(manager.current_session_id(), &session.id);
        assert!(manager.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_selects_most_recent_and_loads_history() {
        let api = MockSessionApi::new(vec![summary("7", "Pods", 4), summary("3", "Logs", 2)])
            .with_history("7", vec![history("1", Role::User, "list pods")]);
        let (manager, _, _) = manager_with(api).await;

        assert_eq!(manager.sessions().len(), 2);
        assert_eq!(manager.current_session_id().as_str(), "7");
        assert_eq!(manager.transcript().messages().len(), 1);
        assert_eq!(manager.transcript().messages()[0].content, "list pods");
    }

    #[tokio::test]
    async fn test_list_failure_falls_back_to_ephemeral() {
        let api = MockSessionApi::new(vec![]).failing_list();
        let (manager, _, _) = manager_with(api).await;
        assert_eq!(manager.sessions().len(), 1);
        assert!(manager.sessions()[0].is_ephemeral);
    }

    #[tokio::test]
    async fn test_create_ephemeral_prepends_and_selects() {
        let (mut manager, _, mut rx) = manager_with(MockSessionApi::new(vec![summary(
            "7", "Pods", 4,
        )]))
        .await;
        drain(&mut rx);

        let id = manager.create_ephemeral().id.clone();

        assert_eq!(manager.sessions()[0].id, id);
        assert_eq!(manager.sessions().len(), 2);
        assert_eq!(manager.current_session_id(), &id);
        let updates = drain(&mut rx);
        assert!(updates.contains(&ChatUpdate::CurrentSessionChanged(id)));
    }

    #[tokio::test]
    async fn test_refresh_keeps_ephemeral_sessions_first() {
        let (mut manager, _, _) =
            manager_with(MockSessionApi::new(vec![summary("7", "Pods", 4)])).await;
        let temp = manager.create_ephemeral().id.clone();

        manager.list_sessions().await;

        assert_eq!(manager.sessions()[0].id, temp);
        assert_eq!(manager.sessions()[1].id.as_str(), "7");
        assert_eq!(manager.current_session_id(), &temp);
    }

    #[tokio::test]
    async fn test_switch_to_with_failing_history_yields_empty_transcript() {
        let api = MockSessionApi::new(vec![summary("7", "Pods", 4), summary("3", "Logs", 2)])
            .with_history("7", vec![history("1", Role::User, "list pods")])
            .failing_history("3");
        let (mut manager, _, _) = manager_with(api).await;

        manager.switch_to(&SessionId::from("3")).await.unwrap();

        assert_eq!(manager.current_session_id().as_str(), "3");
        assert!(manager.transcript().is_empty());
        assert_eq!(manager.transcript().session_id().as_str(), "3");
    }

    #[tokio::test]
    async fn test_switch_to_unknown_session_is_rejected() {
        let (mut manager, _, _) = manager_with(MockSessionApi::new(vec![])).await;
        let err = manager.switch_to(&SessionId::from("nope")).await.unwrap_err();
        assert_eq!(
            err,
            SessionError::Domain(DomainError::SessionNotFound("nope".to_string()))
        );
    }

    #[tokio::test]
    async fn test_persist_on_first_send_replaces_in_place() {
        let api = MockSessionApi::new(vec![summary("7", "Pods", 4)]).with_created("99", "New Chat");
        let (mut manager, _, _) = manager_with(api).await;
        let older = manager.create_ephemeral().id.clone();
        let temp = manager.create_ephemeral().id.clone();
        manager.transcript.push(Message::user("draft"));

        let new_id = manager.persist_on_first_send(&temp).await.unwrap();

        assert_eq!(new_id.as_str(), "99");
        let ids: Vec<&str> = manager.sessions().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["99", older.as_str(), "7"]);
        assert!(manager.find(&temp).is_none());
        let persisted = manager.find(&new_id).unwrap();
        assert!(!persisted.is_ephemeral);
        assert_eq!(persisted.title, "New Chat");
        assert_eq!(manager.current_session_id(), &new_id);
        assert_eq!(manager.transcript().session_id(), &new_id);
        assert_eq!(manager.transcript().messages().len(), 1);
    }

    #[tokio::test]
    async fn test_persist_failure_leaves_list_untouched() {
        let api = MockSessionApi::new(vec![]);
        let (mut manager, _, _) = manager_with(api).await;
        let temp = manager.current_session_id().clone();

        let err = manager.persist_on_first_send(&temp).await.unwrap_err();

        assert!(matches!(err, SessionError::Api(_)));
        assert_eq!(manager.sessions().len(), 1);
        assert_eq!(manager.current_session_id(), &temp);
        assert!(manager.find(&temp).unwrap().is_ephemeral);
    }

    #[tokio::test]
    async fn test_persist_of_stored_session_is_a_no_op() {
        let api = MockSessionApi::new(vec![summary("7", "Pods", 4)]);
        let (mut manager, api, _) = manager_with(api).await;

        let id = manager
            .persist_on_first_send(&SessionId::from("7"))
            .await
            .unwrap();

        assert_eq!(id.as_str(), "7");
        assert_eq!(api.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_rename_rules() {
        let api = MockSessionApi::new(vec![summary("7", "Pods", 4)]);
        let (mut manager, api, _) = manager_with(api).await;
        let temp = manager.create_ephemeral().id.clone();

        assert_eq!(
            manager.rename(&temp, "Cluster health").await.unwrap_err(),
            SessionError::Domain(DomainError::EphemeralSession)
        );
        assert_eq!(
            manager.rename(&SessionId::from("7"), "   ").await.unwrap_err(),
            SessionError::Domain(DomainError::EmptyTitle)
        );

        manager
            .rename(&SessionId::from("7"), "  Cluster health ")
            .await
            .unwrap();
        assert_eq!(
            manager.find(&SessionId::from("7")).unwrap().title,
            "Cluster health"
        );
        assert_eq!(
            api.renames(),
            vec![("7".to_string(), "Cluster health".to_string())]
        );
    }

    #[tokio::test]
    async fn test_rename_after_persist_succeeds() {
        let api = MockSessionApi::new(vec![]).with_created("99", "New Chat");
        let (mut manager, _, _) = manager_with(api).await;
        let temp = manager.current_session_id().clone();
        let id = manager.persist_on_first_send(&temp).await.unwrap();

        manager.rename(&id, "Node pressure").await.unwrap();
        assert_eq!(manager.find(&id).unwrap().title, "Node pressure");
    }

    #[tokio::test]
    async fn test_delete_sole_stored_session_is_rejected() {
        let (mut manager, api, _) =
            manager_with(MockSessionApi::new(vec![summary("7", "Pods", 4)])).await;

        let err = manager.delete(&SessionId::from("7")).await.unwrap_err();

        assert_eq!(err, SessionError::Domain(DomainError::LastSession));
        assert_eq!(manager.sessions().len(), 1);
        assert!(api.deletes().is_empty());
    }

    #[tokio::test]
    async fn test_delete_current_selects_most_recent_remaining() {
        let api = MockSessionApi::new(vec![
            summary("7", "Pods", 4),
            summary("5", "Logs", 2),
            summary("3", "Nodes", 2),
        ]);
        let (mut manager, api, _) = manager_with(api).await;
        assert_eq!(manager.current_session_id().as_str(), "7");

        manager.delete(&SessionId::from("7")).await.unwrap();

        assert_eq!(api.deletes(), vec!["7".to_string()]);
        assert_eq!(manager.current_session_id().as_str(), "5");
        assert_eq!(manager.sessions().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_ephemeral_is_local() {
        let (mut manager, api, _) =
            manager_with(MockSessionApi::new(vec![summary("7", "Pods", 4)])).await;
        let temp = manager.create_ephemeral().id.clone();

        manager.delete(&temp).await.unwrap();

        assert!(api.deletes().is_empty());
        assert!(manager.find(&temp).is_none());
        assert_eq!(manager.current_session_id().as_str(), "7");
    }

    #[tokio::test]
    async fn test_delete_only_ephemeral_creates_fresh_one() {
        let (mut manager, _, _) = manager_with(MockSessionApi::new(vec![])).await;
        let temp = manager.current_session_id().clone();

        manager.delete(&temp).await.unwrap();

        assert_eq!(manager.sessions().len(), 1);
        assert_ne!(manager.current_session_id(), &temp);
        assert!(manager.sessions()[0].is_ephemeral);
    }

    #[tokio::test]
    async fn test_delete_backend_failure_keeps_session() {
        let api = MockSessionApi::new(vec![summary("7", "Pods", 4), summary("5", "Logs", 2)])
            .failing_delete();
        let (mut manager, _, _) = manager_with(api).await;

        let err = manager.delete(&SessionId::from("5")).await.unwrap_err();

        assert!(matches!(err, SessionError::Api(_)));
        assert_eq!(manager.sessions().len(), 2);
    }

    #[tokio::test]
    async fn test_record_exchange_titles_first_message() {
        let (mut manager, api, _) =
            manager_with(MockSessionApi::new(vec![summary("7", "New Chat", 0)])).await;
        let id = SessionId::from("7");

        manager
            .record_exchange(&id, Some("why is my deployment stuck in CrashLoopBackOff"))
            .await;

        let session = manager.find(&id).unwrap();
        assert_eq!(session.title, "why is my deployment stuck in ...");
        assert_eq!(session.message_count, 2);
        assert_eq!(api.renames().len(), 1);

        manager.record_exchange(&id, None).await;
        assert_eq!(manager.find(&id).unwrap().message_count, 4);
        assert_eq!(api.renames().len(), 1);
    }

    #[tokio::test]
    async fn test_record_exchange_keeps_title_when_push_fails() {
        let (mut manager, api, mut rx) = manager_with(
            MockSessionApi::new(vec![summary("7", "New Chat", 0)]).failing_rename(),
        )
        .await;
        drain(&mut rx);
        let id = SessionId::from("7");

        manager.record_exchange(&id, Some("list pods")).await;

        let session = manager.find(&id).unwrap();
        assert_eq!(session.title, "New Chat");
        assert_eq!(session.message_count, 2);
        assert!(api.renames().is_empty());

        let updates = drain(&mut rx);
        assert!(!updates.iter().any(|u| matches!(u, ChatUpdate::Notification { .. })));
        assert!(updates.iter().any(|u| matches!(
            u,
            ChatUpdate::SessionsChanged(sessions)
                if sessions[0].title == "New Chat" && sessions[0].message_count == 2
        )));
    }

    #[tokio::test]
    async fn test_update_message_requires_current_session() {
        let (mut manager, _, _) =
            manager_with(MockSessionApi::new(vec![summary("7", "Pods", 4), summary("5", "Logs", 2)]))
                .await;
        let id = SessionId::from("7");
        let placeholder = Message::assistant_placeholder();
        let message_id = placeholder.id.clone();
        assert!(manager.append_message(&id, placeholder));

        let (_, snapshot) = manager
            .update_message(&id, &message_id, |m| m.append("ok"))
            .unwrap();
        assert_eq!(snapshot.content, "ok");

        manager.switch_to(&SessionId::from("5")).await.unwrap();
        assert!(manager.update_message(&id, &message_id, |m| m.append("!")).is_none());
        assert!(!manager.append_message(&id, Message::user("late")));
    }
}
