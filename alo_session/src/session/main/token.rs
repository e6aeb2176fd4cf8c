use std::collections::BTreeMap;

use serde::Serialize;

use crate::session::config::SessionConfig;
use crate::session::errors::SessionError;
use crate::storage::SessionStore;
use crate::utils::{HashAlgorithm, constant_time_eq, gen_uniqid};

use super::context::SessionContext;
use super::session::Session;

/// A named CSRF token kept in the active session.
///
/// The token itself only remembers its name and the payload key under which
/// the session keeps tokens; the value lives in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    name: String,
    key: String,
}

impl Token {
    pub fn with_config(name: impl Into<String>, config: &SessionConfig) -> Self {
        Self {
            name: name.into(),
            key: config.token_key().to_string(),
        }
    }

    pub fn with_session<S: SessionStore + ?Sized>(
        name: impl Into<String>,
        session: &Session<S>,
    ) -> Self {
        Self::with_config(name, session.config())
    }

    /// Token bound to whatever session is active in `ctx`.
    pub fn from_context(name: impl Into<String>, ctx: &SessionContext) -> Result<Self, SessionError> {
        let config = ctx.active_config().ok_or_else(|| {
            SessionError::InvalidArgument(
                "A token needs a session config or an active session".to_string(),
            )
        })?;
        Ok(Self::with_config(name, config))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Generate a fresh SHA-256 token value, replacing any previous one.
    pub fn create(&self, ctx: &mut SessionContext) -> Option<String> {
        self.create_with(ctx, HashAlgorithm::Sha256)
    }

    pub fn create_with(&self, ctx: &mut SessionContext, algorithm: HashAlgorithm) -> Option<String> {
        let tokens = self.tokens_mut(ctx, "create")?;

        match gen_uniqid(algorithm, &format!("token:{}", self.name)) {
            Ok(value) => {
                tokens.insert(self.name.clone(), value.clone());
                Some(value)
            }
            Err(e) => {
                tracing::error!("Failed to generate token {}: {}", self.name, e);
                None
            }
        }
    }

    pub fn get(&self, ctx: &SessionContext) -> Option<String> {
        self.tokens(ctx, "get")?.get(&self.name).cloned()
    }

    pub fn get_and_remove(&self, ctx: &mut SessionContext) -> Option<String> {
        self.tokens_mut(ctx, "get_and_remove")?.remove(&self.name)
    }

    /// Drop this token, returning whether it existed.
    pub fn remove(&self, ctx: &mut SessionContext) -> bool {
        self.tokens_mut(ctx, "remove")
            .is_some_and(|tokens| tokens.remove(&self.name).is_some())
    }

    /// Drop every token of the session, returning whether there were any.
    pub fn remove_all_tokens(&self, ctx: &mut SessionContext) -> bool {
        self.tokens_mut(ctx, "remove_all_tokens")
            .is_some_and(|tokens| !std::mem::take(tokens).is_empty())
    }

    /// Check `candidate` against the stored value. A matching token is
    /// consumed, so each value verifies once.
    pub fn verify(&self, ctx: &mut SessionContext, candidate: &str) -> bool {
        let Some(tokens) = self.tokens_mut(ctx, "verify") else {
            return false;
        };

        let matched = tokens
            .get(&self.name)
            .is_some_and(|stored| constant_time_eq(stored, candidate));
        if matched {
            tokens.remove(&self.name);
        }
        matched
    }

    fn tokens<'a>(&self, ctx: &'a SessionContext, op: &str) -> Option<&'a BTreeMap<String, String>> {
        let active = ctx.require_active(&format!("Token::{op}"))?;
        if active.config.token_key() != self.key {
            tracing::warn!(
                "Token::{} failed: token key {} does not match the active session",
                op,
                self.key
            );
            return None;
        }
        Some(&active.data.tokens)
    }

    fn tokens_mut<'a>(
        &self,
        ctx: &'a mut SessionContext,
        op: &str,
    ) -> Option<&'a mut BTreeMap<String, String>> {
        let active = ctx.require_active_mut(&format!("Token::{op}"))?;
        if active.config.token_key() != self.key {
            tracing::warn!(
                "Token::{} failed: token key {} does not match the active session",
                op,
                self.key
            );
            return None;
        }
        Some(&mut active.data.tokens)
    }
}
