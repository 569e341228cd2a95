//! Token store
//!
//! Owns the mapping from platform identifier to captured credential. At most
//! one credential per platform; capture is idempotent on an unchanged token
//! value. Every successful mutation is persisted through the pluggable
//! [`TokenPersistence`] backend and published to subscribers as a
//! post-mutation snapshot.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::claims::expiry_claim;
use super::status::{classify, TokenStatus};

/// One captured bearer token for one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    /// Capture timestamp, set once when the token is first seen.
    #[serde(rename = "capturedAt")]
    pub captured_at: DateTime<Utc>,
    /// Expiry derived from the token's claims at capture time, if decodable.
    #[serde(rename = "expiresAt", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Full platform-to-credential mapping, as persisted and as published to
/// subscribers.
pub type TokenSnapshot = HashMap<String, Credential>;

/// Persistence backend errors
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Store mutation errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The mutation was applied in memory and published, but the save failed.
    /// In-memory state stays authoritative until the next successful save.
    #[error("failed to persist tokens: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Durable storage for the token mapping.
pub trait TokenPersistence {
    fn load(&self) -> Result<TokenSnapshot, PersistenceError>;
    fn save(&self, tokens: &TokenSnapshot) -> Result<(), PersistenceError>;
}

/// In-memory token mapping backed by a persistence collaborator.
pub struct TokenStore<P: TokenPersistence> {
    tokens: TokenSnapshot,
    persistence: P,
    changes: watch::Sender<TokenSnapshot>,
}

impl<P: TokenPersistence> TokenStore<P> {
    /// Build a store from persisted state. A failed load degrades to an
    /// empty store rather than failing startup.
    pub fn load(persistence: P) -> Self {
        let tokens = persistence.load().unwrap_or_else(|e| {
            warn!("Failed to load stored tokens, starting empty: {}", e);
            TokenSnapshot::default()
        });
        let (changes, _) = watch::channel(tokens.clone());
        Self {
            tokens,
            persistence,
            changes,
        }
    }

    /// Subscribe to post-mutation snapshots. Consumers (a UI, a badge
    /// counter) observe mutations without polling.
    pub fn subscribe(&self) -> watch::Receiver<TokenSnapshot> {
        self.changes.subscribe()
    }

    /// Record a captured token for a platform.
    ///
    /// No-op when the stored token value is unchanged: no write, no
    /// notification, no timestamp churn. Returns whether a write occurred.
    pub fn capture(&mut self, platform: &str, raw_token: &str) -> Result<bool, StoreError> {
        if self.tokens.get(platform).map(|c| c.token.as_str()) == Some(raw_token) {
            debug!(platform, "token unchanged, skipping capture");
            return Ok(false);
        }

        let credential = Credential {
            token: raw_token.to_string(),
            captured_at: Utc::now(),
            expires_at: expiry_claim(raw_token),
        };
        info!(
            platform,
            has_expiry = credential.expires_at.is_some(),
            "captured token"
        );
        self.tokens.insert(platform.to_string(), credential);
        self.publish_and_save()?;
        Ok(true)
    }

    pub fn get(&self, platform: &str) -> Option<&Credential> {
        self.tokens.get(platform)
    }

    pub fn list(&self) -> &TokenSnapshot {
        &self.tokens
    }

    /// Classify the stored credential for a platform against the current
    /// time. Absent entries are `NotConnected`; expired entries stay in the
    /// store and classify as `Expired`.
    pub fn status_of(&self, platform: &str) -> (TokenStatus, String) {
        match self.tokens.get(platform) {
            Some(credential) => classify(credential.expires_at, Utc::now()),
            None => (TokenStatus::NotConnected, "Not connected".to_string()),
        }
    }

    /// Remove one platform's credential, or all of them. Clearing an absent
    /// entry is a successful no-op. Returns whether anything was removed.
    pub fn clear(&mut self, platform: Option<&str>) -> Result<bool, StoreError> {
        let removed = match platform {
            Some(platform) => self.tokens.remove(platform).is_some(),
            None => {
                let had_entries = !self.tokens.is_empty();
                self.tokens.clear();
                had_entries
            }
        };
        if !removed {
            return Ok(false);
        }
        info!(platform = platform.unwrap_or("all"), "cleared tokens");
        self.publish_and_save()?;
        Ok(true)
    }

    /// Publish the snapshot first, then save: subscribers and readers see
    /// the in-memory state even when the save fails.
    fn publish_and_save(&self) -> Result<(), StoreError> {
        self.changes.send_replace(self.tokens.clone());
        self.persistence.save(&self.tokens)?;
        Ok(())
    }
}
