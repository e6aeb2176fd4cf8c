use async_trait::async_trait;
use http::HeaderMap;
use std::sync::Arc;

use crate::session::config::SessionConfig;
use crate::session::errors::SessionError;
use crate::session::types::{ExecutionMode, SessionData, StartOutcome};
use crate::storage::{SessionStore, StorageError};
use crate::utils::{HashAlgorithm, constant_time_eq, gen_uniqid, random_u32, sha256_hex};

use super::context::{ActiveSession, SessionContext};
use super::cookie::{clear_session_cookie, set_session_cookie};
use super::handler::SessionHandler;

const MAX_ID_ATTEMPTS: usize = 3;

/// A session bound to a store and an id.
///
/// Creating one picks the id (reusing the client's cookie when it looks like
/// one of ours); [`Session::start`] then makes it the active session of a
/// [`SessionContext`].
pub struct Session<S: SessionStore + ?Sized> {
    store: Arc<S>,
    config: Arc<SessionConfig>,
    id: String,
}

impl<S: SessionStore + ?Sized> Clone for Session<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
            id: self.id.clone(),
        }
    }
}

impl<S: SessionStore + ?Sized> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("config", &self.config)
            .finish()
    }
}

impl<S: SessionStore + ?Sized> Session<S> {
    #[tracing::instrument(skip_all)]
    pub async fn new(
        store: Arc<S>,
        config: Arc<SessionConfig>,
        ctx: &mut SessionContext,
    ) -> Result<Self, SessionError> {
        config.validate()?;

        let algorithm = config.id_hash_algorithm();
        let id = match ctx.request().cookie(config.cookie_name()) {
            Some(candidate) if is_plausible_id(candidate, algorithm) => candidate.to_string(),
            _ => {
                generate_unique_id(store.as_ref(), algorithm, ctx.request().fingerprint_material())
                    .await?
            }
        };

        tracing::debug!("Session ID set to {}", id);
        ctx.set_session_id(&id);

        Ok(Self { store, config, id })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &Arc<SessionConfig> {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Whether payloads are written back in the given execution mode.
    pub fn should_persist(&self, mode: ExecutionMode) -> bool {
        mode == ExecutionMode::Interactive || self.config.persist_in_non_interactive_mode()
    }

    /// Make this the active session of `ctx`.
    ///
    /// Refuses (and leaves the current one untouched) when `ctx` already has an
    /// active session.
    #[tracing::instrument(skip_all, fields(session_id = %self.id))]
    pub async fn start(&self, ctx: &mut SessionContext) -> Result<StartOutcome, SessionError> {
        if ctx.is_active() {
            tracing::warn!("A session has already been started, not starting another one");
            return Ok(StartOutcome::AlreadyActive);
        }
        self.begin(ctx).await
    }

    /// Like [`Session::start`], but first writes and closes any session that
    /// is already active in `ctx`.
    #[tracing::instrument(skip_all, fields(session_id = %self.id))]
    pub async fn start_forced(
        &self,
        ctx: &mut SessionContext,
    ) -> Result<StartOutcome, SessionError> {
        if ctx.is_active() {
            ctx.write_close().await;
            tracing::warn!(
                "A session has already been started - it has now been closed to start the new one"
            );
        }
        self.begin(ctx).await
    }

    async fn begin(&self, ctx: &mut SessionContext) -> Result<StartOutcome, SessionError> {
        tracing::debug!("Starting session");

        let handler: Arc<dyn SessionHandler> = Arc::new(self.clone());
        if !handler.open().await {
            return Err(StorageError::Storage("Failed to open session handler".to_string()).into());
        }

        set_session_cookie(ctx.response_headers_mut(), &self.config, &self.id)?;
        ctx.set_session_id(&self.id);

        self.maybe_gc(handler.as_ref()).await;

        let raw = handler.read(&self.id).await;
        let data = SessionData::decode(&raw, &self.config);

        ctx.activate(ActiveSession {
            handler,
            config: Arc::clone(&self.config),
            id: self.id.clone(),
            data,
        });

        if self.identity_check(ctx).await {
            Ok(StartOutcome::Started)
        } else {
            Ok(StartOutcome::IdentityCheckFailed)
        }
    }

    async fn maybe_gc(&self, handler: &dyn SessionHandler) {
        let roll = match random_u32() {
            Ok(roll) => roll,
            Err(e) => {
                tracing::warn!("Skipping session gc: {}", e);
                return;
            }
        };

        if roll % self.config.gc_probability().max(1) == 0 {
            tracing::debug!("Running session gc");
            handler.gc(self.config.timeout()).await;
        }
    }

    /// Bind the session to the client on first use and reject it afterwards
    /// when a different client presents it.
    async fn identity_check(&self, ctx: &mut SessionContext) -> bool {
        let fingerprint = client_fingerprint(ctx.request().fingerprint_material());

        let Some(active) = ctx.require_active_mut("identity check") else {
            return false;
        };
        let stored = active
            .data
            .fingerprint
            .clone()
            .filter(|stored| !stored.is_empty());

        match stored {
            None => {
                active.data.fingerprint = Some(fingerprint);
                tracing::debug!("Bound session {} to client fingerprint", self.id);
            }
            Some(stored) if constant_time_eq(&stored, &fingerprint) => {}
            Some(_) => {
                tracing::warn!("Session identity check failed for session ID {}", self.id);
                ctx.destroy_safely().await;
                return false;
            }
        }

        tracing::debug!("Identity check passed for session ID {}", self.id);
        true
    }
}

#[async_trait]
impl<S: SessionStore + ?Sized> SessionHandler for Session<S> {
    fn config(&self) -> &SessionConfig {
        &self.config
    }

    async fn open(&self) -> bool {
        match self.store.on_start(&self.config).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Session store failed to prepare: {}", e);
                false
            }
        }
    }

    async fn read(&self, session_id: &str) -> String {
        match self.store.read(session_id).await {
            Ok(data) => data.unwrap_or_default(),
            Err(e) => {
                tracing::error!("Failed to read session {}: {}", session_id, e);
                String::new()
            }
        }
    }

    async fn write(&self, mode: ExecutionMode, session_id: &str, data: &str) -> bool {
        if !self.should_persist(mode) {
            tracing::debug!("Not persisting session {} in {:?} mode", session_id, mode);
            return false;
        }

        match self.store.write(session_id, data).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to write session {}: {}", session_id, e);
                false
            }
        }
    }

    async fn destroy(&self, response: &mut HeaderMap, session_id: &str) -> bool {
        let cookie_cleared = match clear_session_cookie(response, &self.config) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to clear session cookie: {}", e);
                false
            }
        };

        let storage_removed = match self.store.destroy(session_id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to remove session {} from store: {}", session_id, e);
                false
            }
        };

        tracing::info!("Destroyed session {}", session_id);
        cookie_cleared && storage_removed
    }

    async fn gc(&self, max_lifetime: u64) -> bool {
        match self.store.gc(max_lifetime).await {
            Ok(removed) => {
                tracing::debug!("Session gc removed {} entries", removed);
                true
            }
            Err(e) => {
                tracing::error!("Session gc failed: {}", e);
                false
            }
        }
    }
}

/// Hex string with the exact length `algorithm` produces.
fn is_plausible_id(candidate: &str, algorithm: HashAlgorithm) -> bool {
    candidate.len() == algorithm.hex_len() && candidate.bytes().all(|b| b.is_ascii_hexdigit())
}

fn client_fingerprint(material: &str) -> String {
    sha256_hex(&format!("AloSession{material}"))
}

async fn generate_unique_id<S: SessionStore + ?Sized>(
    store: &S,
    algorithm: HashAlgorithm,
    fingerprint_material: &str,
) -> Result<String, SessionError> {
    let entropy = format!("session{fingerprint_material}");

    for _ in 0..MAX_ID_ATTEMPTS {
        let candidate = gen_uniqid(algorithm, &entropy)?;
        if !store.id_exists(&candidate).await? {
            return Ok(candidate);
        }
        tracing::warn!("Generated session ID already exists, retrying");
    }

    Err(SessionError::Crypto(format!(
        "Failed to generate a unique session ID after {MAX_ID_ATTEMPTS} attempts"
    )))
}
