use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::session::config::SessionConfig;

/// Whether the current execution context serves an interactive client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    #[default]
    Interactive,
    /// Batch jobs, CLI tools: no client, no cookies
    NonInteractive,
}

/// Result of starting a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// Another session was already active in the context and was left alone
    AlreadyActive,
    /// The stored fingerprint did not match the client; the session was destroyed
    IdentityCheckFailed,
}

impl StartOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started)
    }
}

/// Session payload.
///
/// Application values sit next to the two entries the session keeps for
/// itself, the client fingerprint and the CSRF tokens. Those are stored under
/// the configured reserved keys when encoded, and can never be overwritten
/// through the application values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionData {
    pub(crate) values: Map<String, Value>,
    pub(crate) fingerprint: Option<String>,
    pub(crate) tokens: BTreeMap<String, String>,
}

impl SessionData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    pub fn tokens(&self) -> &BTreeMap<String, String> {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.fingerprint.is_none() && self.tokens.is_empty()
    }

    /// Serialize into the JSON object that is handed to the store.
    pub fn encode(&self, config: &SessionConfig) -> String {
        let mut object = self.values.clone();

        if let Some(fingerprint) = &self.fingerprint {
            object.insert(
                config.fingerprint_key().to_string(),
                Value::String(fingerprint.clone()),
            );
        }
        if !self.tokens.is_empty() {
            let tokens = self
                .tokens
                .iter()
                .map(|(name, value)| (name.clone(), Value::String(value.clone())))
                .collect();
            object.insert(config.token_key().to_string(), Value::Object(tokens));
        }

        Value::Object(object).to_string()
    }

    /// Rebuild a payload from what the store returned.
    ///
    /// Never fails: anything that is not a JSON object decodes to an empty
    /// payload, and reserved entries of the wrong shape are dropped.
    pub fn decode(raw: &str, config: &SessionConfig) -> Self {
        if raw.trim().is_empty() {
            tracing::debug!("No stored session payload");
            return Self::default();
        }

        let mut object = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(object)) => object,
            Ok(_) => {
                tracing::warn!("Stored session payload is not an object, starting empty");
                return Self::default();
            }
            Err(e) => {
                tracing::warn!("Failed to decode stored session payload: {}", e);
                return Self::default();
            }
        };

        let fingerprint = match object.remove(config.fingerprint_key()) {
            Some(Value::String(fingerprint)) => Some(fingerprint),
            Some(other) => {
                tracing::warn!("Discarding non-string session fingerprint: {}", other);
                None
            }
            None => None,
        };

        let tokens = match object.remove(config.token_key()) {
            Some(Value::Object(tokens)) => tokens
                .into_iter()
                .filter_map(|(name, value)| match value {
                    Value::String(value) => Some((name, value)),
                    _ => None,
                })
                .collect(),
            Some(other) => {
                tracing::warn!("Discarding malformed session token entry: {}", other);
                BTreeMap::new()
            }
            None => BTreeMap::new(),
        };

        Self {
            values: object,
            fingerprint,
            tokens,
        }
    }
}
