use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use ring::rand::SecureRandom;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum UtilError {
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Invalid format: {0}")]
    Format(String),
}

/// Hash algorithms usable for session ids and token values.
///
/// Output is always rendered as lowercase hex, so the id length is twice the
/// digest size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 4] = [Self::Sha224, Self::Sha256, Self::Sha384, Self::Sha512];

    /// Hash `input` and return the lowercase hex digest
    pub fn hex_digest(&self, input: &[u8]) -> String {
        match self {
            Self::Sha224 => to_hex(&Sha224::digest(input)),
            Self::Sha256 => to_hex(&Sha256::digest(input)),
            Self::Sha384 => to_hex(&Sha384::digest(input)),
            Self::Sha512 => to_hex(&Sha512::digest(input)),
        }
    }

    /// Length of the hex digest produced by this algorithm
    pub fn hex_len(&self) -> usize {
        match self {
            Self::Sha224 => 56,
            Self::Sha256 => 64,
            Self::Sha384 => 96,
            Self::Sha512 => 128,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = UtilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha224" => Ok(Self::Sha224),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            other => Err(UtilError::Format(format!(
                "Unsupported hash algorithm: {other}"
            ))),
        }
    }
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub(crate) fn sha256_hex(input: &str) -> String {
    HashAlgorithm::Sha256.hex_digest(input.as_bytes())
}

pub(crate) fn random_bytes(len: usize) -> Result<Vec<u8>, UtilError> {
    let rng = ring::rand::SystemRandom::new();
    let mut buf = vec![0u8; len];
    rng.fill(&mut buf)
        .map_err(|_| UtilError::Crypto("Failed to generate random bytes".to_string()))?;
    Ok(buf)
}

pub(crate) fn random_u32() -> Result<u32, UtilError> {
    let bytes = random_bytes(4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Generate a unique, unpredictable hex string.
///
/// `entropy` is mixed into the hash together with 32 random bytes and the
/// current timestamp, so two calls with the same entropy never collide in
/// practice.
pub fn gen_uniqid(algorithm: HashAlgorithm, entropy: &str) -> Result<String, UtilError> {
    let mut input = Vec::with_capacity(entropy.len() + 48);
    input.extend_from_slice(entropy.as_bytes());
    input.extend_from_slice(&random_bytes(32)?);
    let now = Utc::now();
    input.extend_from_slice(&now.timestamp().to_le_bytes());
    input.extend_from_slice(&now.timestamp_subsec_nanos().to_le_bytes());
    Ok(algorithm.hex_digest(&input))
}

pub(crate) fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
