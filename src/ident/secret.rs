//! Secret generation
//!
//! API keys, hex tokens, and passwords. All randomness comes from the
//! thread-local CSPRNG.

use rand::Rng;
use std::fmt;

/// API key prefix; keys look like `mg_sk_<type>_<random>`
pub const API_KEY_PREFIX: &str = "mg_sk";
/// Random bytes in an API key (hex-encoded to 64 characters)
pub const API_KEY_RANDOM_BYTES: usize = 32;
/// Length of a UUID string
pub const UUID_LENGTH: usize = 36;
/// Length of an agent API key: `mg_sk_agent_` (12) + 64 hex characters
pub const API_KEY_LENGTH: usize = 76;
/// Length of a default token: 32 bytes hex-encoded
pub const DEFAULT_TOKEN_LENGTH: usize = 64;
/// Default token size in bytes
pub const DEFAULT_TOKEN_BYTES: usize = 32;
/// Default password length
pub const DEFAULT_PASSWORD_LENGTH: usize = 16;

/// Displayed prefix length of an API key
const API_KEY_DISPLAY_PREFIX: usize = 12;

const PASSWORD_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// API key type
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ApiKeyType {
    #[default]
    Agent,
}

impl ApiKeyType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "agent" => Some(ApiKeyType::Agent),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ApiKeyType::Agent => "agent",
        }
    }
}

impl fmt::Display for ApiKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Random UUID v4
pub fn generate_uuid() -> String {
    super::uid::generate_uuid()
}

/// New API key: `mg_sk_<type>_<64 hex chars>`
pub fn generate_api_key(kind: ApiKeyType) -> String {
    format!(
        "{API_KEY_PREFIX}_{kind}_{}",
        generate_token(API_KEY_RANDOM_BYTES)
    )
}

/// First 12 characters of a key, safe to display
pub fn api_key_prefix(api_key: &str) -> &str {
    match api_key.char_indices().nth(API_KEY_DISPLAY_PREFIX) {
        Some((idx, _)) => &api_key[..idx],
        None => api_key,
    }
}

/// Hex-encoded random token of `num_bytes` bytes
pub fn generate_token(num_bytes: usize) -> String {
    let mut bytes = vec![0u8; num_bytes];
    rand::rng().fill(bytes.as_mut_slice());
    hex::encode(bytes)
}

/// Random alphanumeric password
pub fn generate_password(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| PASSWORD_ALPHABET[rng.random_range(0..PASSWORD_ALPHABET.len())] as char)
        .collect()
}
