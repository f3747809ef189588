use std::{collections::HashMap, time::Duration as StdDuration};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;

use super::{ExternalIdentity, IdentityError, IdentityVerifier};

const APPLE_KEYS_URL: &str = "https://appleid.apple.com/auth/keys";
const APPLE_ISSUER: &str = "https://appleid.apple.com";
const KEY_CACHE_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct AppleClaims {
    sub: String,
    email: Option<String>,
}

struct CachedKeys {
    keys: HashMap<String, Jwk>,
    expires_at: DateTime<Utc>,
}

/// Verifies Sign in with Apple identity tokens against Apple's published keys.
pub struct AppleIdentityVerifier {
    client: Client,
    client_id: Option<String>,
    keys_url: String,
    cache: RwLock<Option<CachedKeys>>,
}

impl AppleIdentityVerifier {
    pub fn new(client_id: Option<String>) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(StdDuration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            client_id,
            keys_url: APPLE_KEYS_URL.to_string(),
            cache: RwLock::new(None),
        })
    }

    async fn cached_key(&self, kid: &str) -> Option<Jwk> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|cached| cached.expires_at > Utc::now())
            .and_then(|cached| cached.keys.get(kid).cloned())
    }

    async fn refresh_keys(&self) -> Result<(), IdentityError> {
        let set: JwkSet = self
            .client
            .get(&self.keys_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        tracing::debug!(count = set.keys.len(), "refreshed apple signing keys");

        let keys = set.keys.into_iter().map(|k| (k.kid.clone(), k)).collect();
        *self.cache.write().await = Some(CachedKeys {
            keys,
            expires_at: Utc::now() + Duration::seconds(KEY_CACHE_TTL_SECS),
        });
        Ok(())
    }

    async fn signing_key(&self, kid: &str) -> Result<Jwk, IdentityError> {
        if let Some(key) = self.cached_key(kid).await {
            return Ok(key);
        }
        // unknown kid usually means Apple rotated keys
        self.refresh_keys().await?;
        self.cached_key(kid)
            .await
            .ok_or_else(|| IdentityError::InvalidToken(format!("unknown signing key {kid}")))
    }
}

#[async_trait]
impl IdentityVerifier for AppleIdentityVerifier {
    async fn verify(&self, identity_token: &str) -> Result<ExternalIdentity, IdentityError> {
        let client_id = self.client_id.as_deref().ok_or(IdentityError::NotConfigured)?;

        let header = decode_header(identity_token)
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| IdentityError::InvalidToken("missing key id".into()))?;
        let jwk = self.signing_key(&kid).await?;

        let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[client_id]);
        validation.set_issuer(&[APPLE_ISSUER]);

        let claims = decode::<AppleClaims>(identity_token, &key, &validation)
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))?
            .claims;

        Ok(ExternalIdentity {
            subject: claims.sub,
            email: claims.email.map(|e| e.to_lowercase()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_verifier_refuses_every_token() {
        let verifier = AppleIdentityVerifier::new(None).unwrap();
        let err = verifier.verify("a.b.c").await.unwrap_err();
        assert!(matches!(err, IdentityError::NotConfigured));
    }

    #[tokio::test]
    async fn garbage_token_is_rejected_before_fetching_keys() {
        let verifier = AppleIdentityVerifier::new(Some("com.example.app".into())).unwrap();
        let err = verifier.verify("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidToken(_)));
    }
}
