//! Mock ports shared by the use case tests.

use crate::ports::chat_stream::{ChatRequest, ChatStreamPort, EventStream, StreamError};
use crate::ports::chat_update::ChatUpdate;
use crate::ports::session_api::{
    ApiError, CreatedSession, HistoryEntry, SessionApiPort, SessionSummary,
};
use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use kubechat_domain::{ChatEvent, Role, SessionId};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use tokio::sync::mpsc;

pub fn summary(id: &str, title: &str, message_count: u32) -> SessionSummary {
    SessionSummary {
        session_id: SessionId::from(id),
        title: title.to_string(),
        created_at: Utc::now(),
        last_activity: Utc::now(),
        message_count,
    }
}

pub fn history(id: &str, role: Role, message: &str) -> HistoryEntry {
    HistoryEntry {
        id: id.to_string(),
        role,
        message: message.to_string(),
        timestamp: Utc::now(),
    }
}

/// Collect every update sent so far.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<ChatUpdate>) -> Vec<ChatUpdate> {
    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }
    updates
}

// === Session API ===

#[derive(Default)]
pub struct MockSessionApi {
    sessions: Vec<SessionSummary>,
    histories: HashMap<String, Vec<HistoryEntry>>,
    failing_histories: HashSet<String>,
    created: Mutex<VecDeque<CreatedSession>>,
    fail_list: bool,
    fail_delete: bool,
    fail_rename: bool,
    create_calls: Mutex<usize>,
    renames: Mutex<Vec<(String, String)>>,
    deletes: Mutex<Vec<String>>,
}

impl MockSessionApi {
    pub fn new(sessions: Vec<SessionSummary>) -> Self {
        Self {
            sessions,
            ..Default::default()
        }
    }

    pub fn with_history(mut self, id: &str, entries: Vec<HistoryEntry>) -> Self {
        self.histories.insert(id.to_string(), entries);
        self
    }

    pub fn failing_history(mut self, id: &str) -> Self {
        self.failing_histories.insert(id.to_string());
        self
    }

    /// Queue a session returned by the next `create_session` call.
    /// Without one queued, creation fails.
    pub fn with_created(self, id: &str, title: &str) -> Self {
        self.created.lock().unwrap().push_back(CreatedSession {
            session_id: SessionId::from(id),
            title: title.to_string(),
        });
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn failing_rename(mut self) -> Self {
        self.fail_rename = true;
        self
    }

    pub fn create_calls(&self) -> usize {
        *self.create_calls.lock().unwrap()
    }

    pub fn renames(&self) -> Vec<(String, String)> {
        self.renames.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionApiPort for MockSessionApi {
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ApiError> {
        if self.fail_list {
            return Err(ApiError::Status(503));
        }
        Ok(self.sessions.clone())
    }

    async fn fetch_history(&self, session_id: &SessionId) -> Result<Vec<HistoryEntry>, ApiError> {
        if self.failing_histories.contains(session_id.as_str()) {
            return Err(ApiError::Status(500));
        }
        Ok(self
            .histories
            .get(session_id.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn create_session(&self, _title: &str) -> Result<CreatedSession, ApiError> {
        *self.create_calls.lock().unwrap() += 1;
        self.created
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ApiError::Request("connection refused".to_string()))
    }

    async fn rename_session(&self, session_id: &SessionId, title: &str) -> Result<(), ApiError> {
        if self.fail_rename {
            return Err(ApiError::Status(500));
        }
        self.renames
            .lock()
            .unwrap()
            .push((session_id.to_string(), title.to_string()));
        Ok(())
    }

    async fn delete_session(&self, session_id: &SessionId) -> Result<(), ApiError> {
        if self.fail_delete {
            return Err(ApiError::Rejected("session is locked".to_string()));
        }
        self.deletes.lock().unwrap().push(session_id.to_string());
        Ok(())
    }
}

// === Chat stream ===

/// One scripted response of [`MockChatStream`].
pub enum ScriptedResponse {
    /// The request itself fails.
    Refused(StreamError),
    /// The stream yields these items, then ends.
    Items(Vec<Result<ChatEvent, StreamError>>),
    /// The stream yields these items, then never ends.
    Hanging(Vec<Result<ChatEvent, StreamError>>),
}

pub struct MockChatStream {
    responses: Mutex<VecDeque<ScriptedResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatStream {
    pub fn new(responses: Vec<ScriptedResponse>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from(responses)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatStreamPort for MockChatStream {
    async fn open_stream(&self, request: &ChatRequest) -> Result<EventStream, StreamError> {
        self.requests.lock().unwrap().push(request.clone());
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ScriptedResponse::Refused(StreamError::Network(
                "no scripted response".to_string(),
            )));
        match response {
            ScriptedResponse::Refused(e) => Err(e),
            ScriptedResponse::Items(items) => Ok(futures::stream::iter(items).boxed()),
            ScriptedResponse::Hanging(items) => Ok(futures::stream::iter(items)
                .chain(futures::stream::pending())
                .boxed()),
        }
    }
}
