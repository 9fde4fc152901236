//! Entity hash chain
//!
//! Each entity state hashes its registry metadata together with the hash of
//! the state before it: `hash = SHA256(fields | previous_hash)`. Domain
//! fields live in their own tables and are not part of this hash.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Hash chain errors
#[derive(Error, Debug)]
pub enum HashChainError {
    #[error("Invalid entity row: {0}")]
    InvalidRow(#[from] serde_json::Error),

    #[error("Chain broken at entry {index}: expected previous_hash {expected}, found {found}")]
    BrokenLink {
        index: usize,
        expected: String,
        found: String,
    },
}

/// Entity registry metadata covered by the hash
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityState {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub derived_from: Option<String>,
    #[serde(default)]
    pub superseded_by: Option<String>,
    #[serde(default)]
    pub superseded_at: Option<String>,
    #[serde(default)]
    pub previous_hash: Option<String>,
}

impl EntityState {
    pub fn new(
        entity_type: impl Into<String>,
        created_at: impl Into<String>,
        updated_at: impl Into<String>,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            created_at: created_at.into(),
            updated_at: updated_at.into(),
            ..Default::default()
        }
    }

    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn with_previous_hash(mut self, hash: impl Into<String>) -> Self {
        self.previous_hash = Some(hash.into());
        self
    }

    /// Hash input, fields in fixed order; absent fields are empty
    pub fn hash_input(&self) -> String {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        format!(
            "type:{}|created_at:{}|updated_at:{}|group_id:{}|derived_from:{}|superseded_by:{}|superseded_at:{}|previous_hash:{}",
            self.entity_type,
            self.created_at,
            self.updated_at,
            opt(&self.group_id),
            opt(&self.derived_from),
            opt(&self.superseded_by),
            opt(&self.superseded_at),
            opt(&self.previous_hash),
        )
    }
}

/// Hex SHA-256 of an entity state
pub fn compute_entity_hash(state: &EntityState) -> String {
    let mut hasher = Sha256::new();
    hasher.update(state.hash_input().as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash a database row given as a JSON object; unknown columns are ignored
pub fn compute_entity_hash_from_row(row: &serde_json::Value) -> Result<String, HashChainError> {
    let state: EntityState = serde_json::from_value(row.clone())?;
    Ok(compute_entity_hash(&state))
}

/// Hash of the state after an update; `current_hash` becomes `previous_hash`
pub fn compute_next_hash(state: &EntityState, current_hash: &str) -> String {
    let next = EntityState {
        previous_hash: Some(current_hash.to_string()),
        ..state.clone()
    };
    compute_entity_hash(&next)
}

/// Check that every state links to the hash of the one before it
pub fn verify_chain(states: &[EntityState]) -> Result<(), HashChainError> {
    for (index, pair) in states.windows(2).enumerate() {
        let expected = compute_entity_hash(&pair[0]);
        let found = pair[1].previous_hash.clone().unwrap_or_default();
        if found != expected {
            return Err(HashChainError::BrokenLink {
                index: index + 1,
                expected,
                found,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIRST_HASH: &str = "70a8d752cfdfff370a338bf3dcf883c918dc8b599718321f6a163145ae7e5d45";
    const SECOND_HASH: &str = "9dd9abf5edb1164a5781446d97dcdd9faa138773e624f3fa2317cda5dcc2b142";

    fn first() -> EntityState {
        EntityState::new("transactions", "2025-01-01T00:00:00Z", "2025-01-01T00:00:00Z")
    }

    fn second() -> EntityState {
        EntityState::new("transactions", "2025-01-01T00:00:00Z", "2025-01-02T00:00:00Z")
            .with_group("g1")
    }

    #[test]
    fn test_hash_input_layout() {
        assert_eq!(
            first().hash_input(),
            "type:transactions|created_at:2025-01-01T00:00:00Z|updated_at:2025-01-01T00:00:00Z|group_id:|derived_from:|superseded_by:|superseded_at:|previous_hash:"
        );
    }

    #[test]
    fn test_known_hash() {
        assert_eq!(compute_entity_hash(&first()), FIRST_HASH);
    }

    #[test]
    fn test_next_hash() {
        assert_eq!(compute_next_hash(&second(), FIRST_HASH), SECOND_HASH);
    }

    #[test]
    fn test_from_row() {
        let row = serde_json::json!({
            "id": "ignored",
            "type": "transactions",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z",
            "group_id": null
        });
        assert_eq!(compute_entity_hash_from_row(&row).unwrap(), FIRST_HASH);
    }

    #[test]
    fn test_from_row_missing_type() {
        let row = serde_json::json!({ "created_at": "x", "updated_at": "y" });
        assert!(compute_entity_hash_from_row(&row).is_err());
    }

    #[test]
    fn test_verify_chain() {
        let chain = vec![first(), second().with_previous_hash(FIRST_HASH)];
        assert!(verify_chain(&chain).is_ok());
        assert!(verify_chain(&[]).is_ok());
    }

    #[test]
    fn test_verify_chain_broken() {
        let chain = vec![first(), second().with_previous_hash("deadbeef")];
        match verify_chain(&chain) {
            Err(HashChainError::BrokenLink { index, found, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(found, "deadbeef");
            }
            other => panic!("Expected broken link, got {other:?}"),
        }
    }
}
