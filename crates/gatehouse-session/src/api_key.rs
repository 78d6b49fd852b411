//! The API-key manager: many long-lived keys per user.
//!
//! Unlike sessions, a user may hold any number of keys. Each key has an
//! integer id assigned by the relational store before issuance, and two
//! store entries:
//!
//! ```text
//! apikey:<token>     → {"v":1,"id":..,"user_id":..,"role":..}
//! apikey-rev:<id>    → "<token>"
//! ```
//!
//! The reverse key lets a key be revoked by id without ever storing or
//! re-displaying the secret. Both entries are written and deleted together
//! in one atomic batch.

use std::time::{Duration, SystemTime};

use gatehouse_protocol::{ApiKeyId, ApiKeyRecord, Codec, JsonCodec, decode_record, encode_record};
use gatehouse_store::{Batch, CredentialStore, keys};

use crate::{ApiKeyConfig, CredentialError, new_token};

/// Issues, validates and revokes API keys.
///
/// The codec type parameter defaults to [`JsonCodec`]; records are always
/// wrapped in a versioned envelope.
pub struct ApiKeyManager<S, C = JsonCodec> {
    store: S,
    codec: C,
    config: ApiKeyConfig,
}

impl<S: CredentialStore> ApiKeyManager<S> {
    pub fn new(store: S, config: ApiKeyConfig) -> Self {
        Self::with_codec(store, JsonCodec, config)
    }
}

impl<S: CredentialStore, C: Codec> ApiKeyManager<S, C> {
    pub fn with_codec(store: S, codec: C, config: ApiKeyConfig) -> Self {
        Self {
            store,
            codec,
            config,
        }
    }

    /// Issues a key for `record` and returns its token.
    ///
    /// This is the only time the token is ever returned. `ttl_hours == 0`
    /// means the key never expires on its own.
    ///
    /// # Errors
    /// - [`CredentialError::Token`] if no secure token could be generated.
    /// - [`CredentialError::Decode`] if the record could not be encoded.
    /// - [`CredentialError::Store`] if the write failed; nothing was stored.
    pub async fn new_api_key(
        &self,
        record: ApiKeyRecord,
        ttl_hours: u32,
    ) -> Result<String, CredentialError> {
        let token = new_token(self.config.token_length)?;
        let value = encode_record(&self.codec, &record)?;
        let ttl = ttl_from_hours(ttl_hours);

        let batch = Batch::new()
            .set(keys::api_key(&token), value, ttl)
            .set(keys::api_key_reverse(record.id.0), token.as_str(), ttl);
        self.store.execute(batch).await?;

        tracing::info!(
            key_id = %record.id,
            user_id = %record.user_id,
            ttl_hours,
            "api key issued"
        );
        Ok(token)
    }

    /// Resolves an API key token to its record.
    ///
    /// # Errors
    /// - [`CredentialError::NotFound`] if the key is unknown, revoked or
    ///   expired.
    /// - [`CredentialError::Decode`] if the stored record is corrupted or
    ///   has an unknown version.
    /// - [`CredentialError::Store`] if the store could not answer.
    pub async fn validate_api_key(&self, token: &str) -> Result<ApiKeyRecord, CredentialError> {
        let raw = self
            .store
            .get(&keys::api_key(token))
            .await?
            .ok_or(CredentialError::NotFound)?;

        decode_record(&self.codec, &raw).map_err(|e| {
            tracing::error!(error = %e, "corrupted api key record");
            CredentialError::Decode(e)
        })
    }

    /// The record of the live key with the given id, without exposing its
    /// token. `Ok(None)` if the key is unknown, revoked or expired.
    pub async fn lookup(&self, id: ApiKeyId) -> Result<Option<ApiKeyRecord>, CredentialError> {
        let Some(token) = self.store.get(&keys::api_key_reverse(id.0)).await? else {
            return Ok(None);
        };
        match self.validate_api_key(&token).await {
            Ok(record) => Ok(Some(record)),
            // Forward key expired between the two reads.
            Err(CredentialError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Revokes the key with the given id.
    ///
    /// Idempotent: revoking an unknown or already revoked key succeeds, so
    /// concurrent revokes of the same key are harmless.
    ///
    /// # Errors
    /// Returns [`CredentialError::Store`] if the store failed.
    pub async fn remove_api_key(&self, id: ApiKeyId) -> Result<(), CredentialError> {
        let reverse = keys::api_key_reverse(id.0);
        let Some(token) = self.store.get(&reverse).await? else {
            tracing::debug!(key_id = %id, "no api key to revoke");
            return Ok(());
        };

        let batch = Batch::new().del(keys::api_key(&token)).del(reverse);
        self.store.execute(batch).await?;

        tracing::info!(key_id = %id, "api key revoked");
        Ok(())
    }

    /// Revokes every key in `issued` whose lifetime has run out by `now`.
    ///
    /// The store already expires keys through their TTL; this sweep is for
    /// callers that keep `(id, created_at, ttl_hours)` rows in a relational
    /// table and want both sides cleaned up on their own schedule. Returns
    /// the ids that were revoked, in input order.
    ///
    /// # Errors
    /// Stops at the first store failure and returns it. Keys revoked before
    /// the failure stay revoked.
    pub async fn revoke_expired(
        &self,
        issued: &[IssuedKey],
        now: SystemTime,
    ) -> Result<Vec<ApiKeyId>, CredentialError> {
        let mut revoked = Vec::new();
        for key in issued.iter().filter(|k| k.is_expired(now)) {
            self.remove_api_key(key.id).await?;
            revoked.push(key.id);
        }

        if !revoked.is_empty() {
            tracing::info!(count = revoked.len(), "expired api keys revoked");
        }
        Ok(revoked)
    }
}

/// A key as the relational store remembers it: enough to decide whether
/// it has expired, but no secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuedKey {
    pub id: ApiKeyId,
    pub created_at: SystemTime,
    /// 0 means the key never expires.
    pub ttl_hours: u32,
}

impl IssuedKey {
    /// Whether `created_at + ttl_hours <= now`. Keys without a TTL never
    /// expire.
    pub fn is_expired(&self, now: SystemTime) -> bool {
        match ttl_from_hours(self.ttl_hours) {
            Some(ttl) => self
                .created_at
                .checked_add(ttl)
                .is_some_and(|deadline| deadline <= now),
            None => false,
        }
    }
}

fn ttl_from_hours(hours: u32) -> Option<Duration> {
    (hours > 0).then(|| Duration::from_secs(u64::from(hours) * 3600))
}
