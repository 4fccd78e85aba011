//! HTTP client for the chat backend.

use super::error::{BackendError, Result};
use super::protocol::{
    AckResponse, CreateSessionResponse, Envelope, HistoryResponse, SessionListResponse,
    TitleRequest, WireHistoryEntry, WireSession,
};
use super::sse::decode_events;
use crate::config::FileBackendConfig;
use async_trait::async_trait;
use kubechat_application::{
    ApiError, ChatRequest, ChatStreamPort, CreatedSession, EventStream, HistoryEntry,
    SessionApiPort, SessionSummary, StreamError,
};
use kubechat_domain::SessionId;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

/// Adapter for the chat stream endpoint and the session API.
///
/// The session cookie is sent with every request. Only a connect timeout is
/// configured: the stream body may stay open for as long as the backend
/// keeps investigating.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: Url,
    user_id: String,
}

impl BackendClient {
    /// Create a client from the `[backend]` config section.
    pub fn from_config(config: &FileBackendConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url)?;

        let mut headers = HeaderMap::new();
        if let Some(cookie) = config.session_cookie.as_deref().filter(|c| !c.is_empty()) {
            let value = HeaderValue::from_str(&format!("{}={}", config.cookie_name, cookie))
                .map_err(|e| BackendError::InvalidCookie(e.to_string()))?;
            headers.insert(COOKIE, value);
        }

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .default_headers(headers)
            .build()
            .map_err(BackendError::ClientBuild)?;

        info!("Backend client for {} (user {})", base_url, config.user_id);
        Ok(Self {
            http,
            base_url,
            user_id: config.user_id.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL from path segments (each segment is escaped).
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn sessions_url(&self, session_id: Option<&SessionId>) -> Result<Url> {
        match session_id {
            Some(id) => self.endpoint(&["users", &self.user_id, "sessions", id.as_str()]),
            None => self.endpoint(&["users", &self.user_id, "sessions"]),
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }
        Ok(response)
    }

    async fn call<T: DeserializeOwned + Envelope>(
        &self,
        method: Method,
        url: Url,
        title: Option<&str>,
    ) -> Result<T> {
        debug!("{} {}", method, url.path());
        let mut request = self.http.request(method, url);
        if let Some(title) = title {
            request = request.json(&TitleRequest { title });
        }
        let response = self.send(request).await?;
        let raw = response.text().await?;
        let parsed: T = serde_json::from_str(&raw).map_err(|e| BackendError::ParseError {
            error: e.to_string(),
            raw: raw.clone(),
        })?;
        parsed.check()
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| BackendError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(BackendError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: "cannot be a base".to_string(),
        });
    }
    Ok(url)
}

#[async_trait]
impl ChatStreamPort for BackendClient {
    async fn open_stream(&self, request: &ChatRequest) -> std::result::Result<EventStream, StreamError> {
        let url = self.endpoint(&["chat", "stream"])?;
        debug!("POST {} (session {})", url.path(), request.session_id);
        let response = self.send(self.http.post(url).json(request)).await?;
        Ok(decode_events(response.bytes_stream()))
    }
}

#[async_trait]
impl SessionApiPort for BackendClient {
    async fn list_sessions(&self) -> std::result::Result<Vec<SessionSummary>, ApiError> {
        let response: SessionListResponse =
            self.call(Method::GET, self.sessions_url(None)?, None).await?;
        Ok(response
            .sessions
            .into_iter()
            .map(WireSession::into_summary)
            .collect())
    }

    async fn fetch_history(
        &self,
        session_id: &SessionId,
    ) -> std::result::Result<Vec<HistoryEntry>, ApiError> {
        let mut url = self.sessions_url(Some(session_id))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Request("invalid session URL".to_string()))?
            .push("history");
        let response: HistoryResponse = self.call(Method::GET, url, None).await?;
        Ok(response
            .history
            .into_iter()
            .map(WireHistoryEntry::into_entry)
            .collect())
    }

    async fn create_session(&self, title: &str) -> std::result::Result<CreatedSession, ApiError> {
        let response: CreateSessionResponse = self
            .call(Method::POST, self.sessions_url(None)?, Some(title))
            .await?;
        response
            .data
            .map(|data| data.into_created())
            .ok_or_else(|| ApiError::InvalidResponse("missing session data".to_string()))
    }

    async fn rename_session(
        &self,
        session_id: &SessionId,
        title: &str,
    ) -> std::result::Result<(), ApiError> {
        let _: AckResponse = self
            .call(Method::PUT, self.sessions_url(Some(session_id))?, Some(title))
            .await?;
        Ok(())
    }

    async fn delete_session(&self, session_id: &SessionId) -> std::result::Result<(), ApiError> {
        let _: AckResponse = self
            .call(Method::DELETE, self.sessions_url(Some(session_id))?, None)
            .await?;
        Ok(())
    }
}
