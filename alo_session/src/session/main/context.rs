use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use headers::{Cookie, HeaderMapExt};
use http::HeaderMap;
use http::header::{ACCEPT_ENCODING, ACCEPT_LANGUAGE, USER_AGENT};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::session::config::SessionConfig;
use crate::session::types::{ExecutionMode, SessionData};
use crate::utils::sha256_hex;

use super::handler::SessionHandler;

/// What the session layer needs to know about the incoming request.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    cookies: HashMap<String, String>,
    fingerprint_material: String,
    mode: ExecutionMode,
}

impl RequestInfo {
    /// Collect cookies and client fingerprint material from request headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let cookies = headers
            .typed_get::<Cookie>()
            .map(|cookie| {
                cookie
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        let material: String = [USER_AGENT.as_str(), ACCEPT_LANGUAGE.as_str(), ACCEPT_ENCODING.as_str(), "dnt"]
            .iter()
            .map(|name| {
                headers
                    .get(*name)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default()
            })
            .collect();

        Self {
            cookies,
            fingerprint_material: sha256_hex(&material),
            mode: ExecutionMode::Interactive,
        }
    }

    /// No client: no cookies, empty fingerprint material.
    pub fn non_interactive() -> Self {
        Self {
            cookies: HashMap::new(),
            fingerprint_material: String::new(),
            mode: ExecutionMode::NonInteractive,
        }
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn fingerprint_material(&self) -> &str {
        &self.fingerprint_material
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }
}

pub(crate) struct ActiveSession {
    pub(crate) handler: Arc<dyn SessionHandler>,
    pub(crate) config: Arc<SessionConfig>,
    pub(crate) id: String,
    pub(crate) data: SessionData,
}

/// Session state for one execution context, typically one HTTP request.
///
/// Holds at most one active session. Payload accessors and tokens work on
/// that session; without one they log a warning and return a neutral value.
#[derive(Default)]
pub struct SessionContext {
    request: RequestInfo,
    response: HeaderMap,
    session_id: Option<String>,
    active: Option<ActiveSession>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("request", &self.request)
            .field("session_id", &self.session_id)
            .field("active", &self.active.is_some())
            .finish()
    }
}

impl SessionContext {
    pub fn new(request: RequestInfo) -> Self {
        Self {
            request,
            ..Self::default()
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::new(RequestInfo::from_headers(headers))
    }

    pub fn non_interactive() -> Self {
        Self::new(RequestInfo::non_interactive())
    }

    pub fn request(&self) -> &RequestInfo {
        &self.request
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Id of the session most recently created for this context.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn active_config(&self) -> Option<&SessionConfig> {
        self.active.as_ref().map(|active| active.config.as_ref())
    }

    pub fn data(&self) -> Option<&SessionData> {
        self.active.as_ref().map(|active| &active.data)
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.response
    }

    pub fn response_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.response
    }

    /// Persist the active session and end it.
    pub async fn write_close(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            tracing::warn!("write_close failed: the session must be started first");
            return false;
        };

        let encoded = active.data.encode(&active.config);
        let written = active
            .handler
            .write(self.request.mode(), &active.id, &encoded)
            .await;
        let closed = active.handler.close().await;
        written && closed
    }

    /// Destroy the active session, if there is one.
    ///
    /// Returns whether a session was active.
    pub async fn destroy_safely(&mut self) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };

        if !active.handler.destroy(&mut self.response, &active.id).await {
            tracing::warn!("Session {} was not fully destroyed", active.id);
        }
        active.handler.close().await;
        true
    }

    /// Write-close any active session and return the response headers.
    pub async fn finish(mut self) -> HeaderMap {
        if self.is_active() {
            self.write_close().await;
        }
        self.response
    }

    /// Typed application value stored under `key`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values("get")?.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!("Session value {} has an unexpected type: {}", key, e);
                None
            }
        }
    }

    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.values("get_value")?.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values("contains")
            .is_some_and(|values| values.contains_key(key))
    }

    /// Store an application value. Reserved keys are refused.
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> bool {
        let Some(active) = self.require_active_mut("set") else {
            return false;
        };
        if active.config.is_reserved_key(key) {
            tracing::warn!("Refusing to overwrite reserved session key {}", key);
            return false;
        }

        match serde_json::to_value(value) {
            Ok(value) => {
                active.data.values.insert(key.to_string(), value);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to serialize session value {}: {}", key, e);
                false
            }
        }
    }

    /// Remove an application value, returning whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let Some(active) = self.require_active_mut("remove") else {
            return false;
        };
        if active.config.is_reserved_key(key) {
            tracing::warn!("Refusing to remove reserved session key {}", key);
            return false;
        }
        active.data.values.remove(key).is_some()
    }

    fn values(&self, op: &str) -> Option<&serde_json::Map<String, Value>> {
        self.require_active(op).map(|active| &active.data.values)
    }

    pub(crate) fn require_active(&self, op: &str) -> Option<&ActiveSession> {
        if self.active.is_none() {
            tracing::warn!("{} failed: the session must be started first", op);
        }
        self.active.as_ref()
    }

    pub(crate) fn require_active_mut(&mut self, op: &str) -> Option<&mut ActiveSession> {
        if self.active.is_none() {
            tracing::warn!("{} failed: the session must be started first", op);
        }
        self.active.as_mut()
    }

    pub(crate) fn set_session_id(&mut self, session_id: &str) {
        self.session_id = Some(session_id.to_string());
    }

    pub(crate) fn activate(&mut self, active: ActiveSession) {
        self.active = Some(active);
    }
}
