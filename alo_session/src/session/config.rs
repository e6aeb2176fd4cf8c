use std::collections::HashMap;
use std::env;
use std::str::FromStr;

use crate::session::errors::SessionError;
use crate::utils::HashAlgorithm;

/// Where an option can be read from: an env var, or a key in a plain map.
struct ConfigKey {
    env: &'static str,
    map: &'static str,
}

const TIMEOUT: ConfigKey = ConfigKey {
    env: "SESSION_TIMEOUT",
    map: "timeout",
};
const COOKIE_NAME: ConfigKey = ConfigKey {
    env: "SESSION_COOKIE_NAME",
    map: "cookieName",
};
const FINGERPRINT_KEY: ConfigKey = ConfigKey {
    env: "SESSION_FINGERPRINT_KEY",
    map: "fingerprintKey",
};
const TOKEN_KEY: ConfigKey = ConfigKey {
    env: "SESSION_TOKEN_KEY",
    map: "tokenKey",
};
const ID_HASH_ALGORITHM: ConfigKey = ConfigKey {
    env: "SESSION_ID_HASH_ALGORITHM",
    map: "idHashAlgorithm",
};
const KEY_PREFIX: ConfigKey = ConfigKey {
    env: "SESSION_KEY_PREFIX",
    map: "keyPrefix",
};
const TABLE_NAME: ConfigKey = ConfigKey {
    env: "SESSION_TABLE_NAME",
    map: "tableName",
};
const GC_PROBABILITY: ConfigKey = ConfigKey {
    env: "SESSION_GC_PROBABILITY",
    map: "gcProbability",
};
const SECURE_COOKIE: ConfigKey = ConfigKey {
    env: "SESSION_SECURE_COOKIE",
    map: "secureCookie",
};
const PERSIST_NON_INTERACTIVE: ConfigKey = ConfigKey {
    env: "SESSION_PERSIST_NON_INTERACTIVE",
    map: "persistInNonInteractiveMode",
};

/// Session options.
///
/// Build one with [`SessionConfig::default`] and the `with_*` methods, or load
/// it with [`SessionConfig::from_env`] / [`SessionConfig::from_map`]. Once
/// handed to a session it is shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    timeout: u64,
    cookie_name: String,
    fingerprint_key: String,
    token_key: String,
    id_hash_algorithm: HashAlgorithm,
    key_prefix: String,
    table_name: String,
    gc_probability: u32,
    secure_cookie: bool,
    persist_in_non_interactive_mode: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: 300,
            cookie_name: "AloSession".to_string(),
            fingerprint_key: "_fp_".to_string(),
            token_key: "_tk_".to_string(),
            id_hash_algorithm: HashAlgorithm::Sha512,
            key_prefix: "_alo_sess_".to_string(),
            table_name: "alo_session".to_string(),
            gc_probability: 100,
            secure_cookie: true,
            persist_in_non_interactive_mode: false,
        }
    }
}

impl SessionConfig {
    /// Load options from `SESSION_*` environment variables, falling back to
    /// the defaults for anything unset.
    pub fn from_env() -> Result<Self, SessionError> {
        Self::from_lookup(|key| env::var(key.env).ok())
    }

    /// Load options from a map keyed by option name (`timeout`, `cookieName`,
    /// `fingerprintKey`, `tokenKey`, `idHashAlgorithm`, `keyPrefix`,
    /// `tableName`, `gcProbability`, `secureCookie`,
    /// `persistInNonInteractiveMode`). Unknown keys are ignored.
    pub fn from_map(options: &HashMap<String, String>) -> Result<Self, SessionError> {
        Self::from_lookup(|key| options.get(key.map).cloned())
    }

    fn from_lookup(lookup: impl Fn(&ConfigKey) -> Option<String>) -> Result<Self, SessionError> {
        let mut config = Self::default();

        if let Some(value) = lookup(&TIMEOUT) {
            config.timeout = parse_option(&TIMEOUT, &value)?;
        }
        if let Some(value) = lookup(&COOKIE_NAME) {
            config.cookie_name = value;
        }
        if let Some(value) = lookup(&FINGERPRINT_KEY) {
            config.fingerprint_key = value;
        }
        if let Some(value) = lookup(&TOKEN_KEY) {
            config.token_key = value;
        }
        if let Some(value) = lookup(&ID_HASH_ALGORITHM) {
            config.id_hash_algorithm = parse_option(&ID_HASH_ALGORITHM, &value)?;
        }
        if let Some(value) = lookup(&KEY_PREFIX) {
            config.key_prefix = value;
        }
        if let Some(value) = lookup(&TABLE_NAME) {
            config.table_name = value;
        }
        if let Some(value) = lookup(&GC_PROBABILITY) {
            config.gc_probability = parse_option(&GC_PROBABILITY, &value)?;
        }
        if let Some(value) = lookup(&SECURE_COOKIE) {
            config.secure_cookie = parse_bool(&SECURE_COOKIE, &value)?;
        }
        if let Some(value) = lookup(&PERSIST_NON_INTERACTIVE) {
            config.persist_in_non_interactive_mode = parse_bool(&PERSIST_NON_INTERACTIVE, &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the options for values that would break the session or its store.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.timeout == 0 {
            return Err(SessionError::Config(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.gc_probability == 0 {
            return Err(SessionError::Config(
                "gc probability must be greater than zero".to_string(),
            ));
        }
        if !is_cookie_token(&self.cookie_name) {
            return Err(SessionError::Config(format!(
                "Invalid cookie name: {:?}",
                self.cookie_name
            )));
        }
        if self.fingerprint_key.is_empty() || self.token_key.is_empty() {
            return Err(SessionError::Config(
                "Reserved session keys must not be empty".to_string(),
            ));
        }
        if self.fingerprint_key == self.token_key {
            return Err(SessionError::Config(format!(
                "Fingerprint key and token key must differ, both are {:?}",
                self.token_key
            )));
        }
        if !is_sql_identifier(&self.table_name) {
            return Err(SessionError::Config(format!(
                "Invalid table name: {:?}",
                self.table_name
            )));
        }
        Ok(())
    }

    /// Whether `key` is one of the payload keys the session keeps for itself.
    pub fn is_reserved_key(&self, key: &str) -> bool {
        key == self.fingerprint_key || key == self.token_key
    }

    pub fn timeout(&self) -> u64 {
        self.timeout
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn fingerprint_key(&self) -> &str {
        &self.fingerprint_key
    }

    pub fn token_key(&self) -> &str {
        &self.token_key
    }

    pub fn id_hash_algorithm(&self) -> HashAlgorithm {
        self.id_hash_algorithm
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn gc_probability(&self) -> u32 {
        self.gc_probability
    }

    pub fn secure_cookie(&self) -> bool {
        self.secure_cookie
    }

    pub fn persist_in_non_interactive_mode(&self) -> bool {
        self.persist_in_non_interactive_mode
    }

    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cookie_name(mut self, cookie_name: impl Into<String>) -> Self {
        self.cookie_name = cookie_name.into();
        self
    }

    pub fn with_fingerprint_key(mut self, key: impl Into<String>) -> Self {
        self.fingerprint_key = key.into();
        self
    }

    pub fn with_token_key(mut self, key: impl Into<String>) -> Self {
        self.token_key = key.into();
        self
    }

    pub fn with_id_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.id_hash_algorithm = algorithm;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn with_gc_probability(mut self, one_in: u32) -> Self {
        self.gc_probability = one_in;
        self
    }

    pub fn with_secure_cookie(mut self, secure: bool) -> Self {
        self.secure_cookie = secure;
        self
    }

    pub fn with_persist_in_non_interactive_mode(mut self, persist: bool) -> Self {
        self.persist_in_non_interactive_mode = persist;
        self
    }
}

fn parse_option<T>(key: &ConfigKey, value: &str) -> Result<T, SessionError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| {
        SessionError::Config(format!("Invalid value {value:?} for {}: {e}", key.map))
    })
}

fn parse_bool(key: &ConfigKey, value: &str) -> Result<bool, SessionError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SessionError::Config(format!(
            "Invalid value {value:?} for {}: expected a boolean",
            key.map
        ))),
    }
}

/// RFC 7230 token characters, the only ones allowed in a cookie name
fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}

/// A plain or schema-qualified SQL identifier: `name` or `schema.name`, each
/// part matching `[A-Za-z_][A-Za-z0-9_]*`.
pub(crate) fn is_sql_identifier(name: &str) -> bool {
    name.split('.').all(|part| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}
