/**
 * Bearer Token Verification
 *
 * This module verifies OpenID Connect ID tokens issued by an OAuth provider
 * (Google by default) and, for local development, HS256 tokens signed with a
 * shared secret.
 *
 * # Key Sources
 *
 * - **JWKS** - The provider's JSON Web Key Set is fetched over HTTPS and
 *   cached for `jwks_cache_ttl_secs`. A token signed with a key id that is not
 *   in the cache triggers one refresh so rotated keys are picked up. The
 *   signing algorithm is taken from the key's `alg` (RS256 when absent),
 *   never from the token header.
 * - **Shared secret** - A single HMAC key replaces the key set. The same key
 *   signs development tokens issued by `issue_dev_token`.
 *
 * # Validation
 *
 * Every token must carry a valid signature, an unexpired `exp` (60 seconds of
 * leeway), an `iss` from the configured list and, when a client id is
 * configured, a matching `aud`.
 */

use std::time::{Duration, Instant};

use chrono::Utc;
use jsonwebtoken::{
    decode, decode_header, encode,
    jwk::{Jwk, JwkSet},
    Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::backend::server::config::AuthSettings;

/// Clock skew tolerated on `exp`, in seconds
const LEEWAY_SECS: u64 = 60;

/// Lifetime of development tokens
pub const DEV_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

/// Algorithm assumed for keys without an `alg`; OIDC providers sign with it
const DEFAULT_JWKS_ALGORITHM: Algorithm = Algorithm::RS256;

/// Unknown key ids never refresh the key set more often than this
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Token verification errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("malformed Authorization header")]
    MalformedHeader,
    #[error("token header has no key id")]
    MissingKeyId,
    #[error("no signing key with id {0}")]
    UnknownKey(String),
    #[error("failed to fetch signing keys: {0}")]
    KeySet(String),
    #[error("development tokens require a shared secret")]
    DevTokensDisabled,
    #[error("invalid token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// True when the failure is on our side rather than the token's
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AuthError::KeySet(_))
    }
}

/// Claims read from a verified ID token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Stable user identifier at the provider
    pub sub: String,
    pub iss: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// Verifies bearer tokens against the configured key source
pub struct TokenVerifier {
    source: KeySource,
    issuers: Vec<String>,
    audience: Option<String>,
}

enum KeySource {
    SharedSecret {
        decoding: DecodingKey,
        encoding: EncodingKey,
    },
    Jwks(JwksCache),
}

struct JwksCache {
    url: String,
    http: reqwest::Client,
    ttl: Duration,
    min_refresh: Duration,
    cached: RwLock<Option<CachedKeys>>,
}

struct CachedKeys {
    fetched_at: Instant,
    keys: JwkSet,
}

impl TokenVerifier {
    /// Build a verifier from configuration
    ///
    /// A shared secret takes precedence over the JWKS URL.
    pub fn from_settings(settings: &AuthSettings) -> Result<Self, AuthError> {
        let source = match &settings.shared_secret {
            Some(secret) => {
                tracing::warn!("Verifying tokens with a shared secret; do not use in production");
                KeySource::SharedSecret {
                    decoding: DecodingKey::from_secret(secret.as_bytes()),
                    encoding: EncodingKey::from_secret(secret.as_bytes()),
                }
            }
            None => {
                let http = reqwest::Client::builder()
                    .timeout(Duration::from_secs(10))
                    .build()
                    .map_err(|e| AuthError::KeySet(e.to_string()))?;
                tracing::info!("Verifying tokens against {}", settings.jwks_url);
                KeySource::Jwks(JwksCache {
                    url: settings.jwks_url.clone(),
                    http,
                    ttl: Duration::from_secs(settings.jwks_cache_ttl_secs),
                    min_refresh: MIN_REFRESH_INTERVAL,
                    cached: RwLock::new(None),
                })
            }
        };

        Ok(Self {
            source,
            issuers: settings.issuers.clone(),
            audience: settings.audience.clone(),
        })
    }

    /// Verify a token and return its claims
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token)?;

        let (key, algorithm) = match &self.source {
            KeySource::SharedSecret { decoding, .. } => (decoding.clone(), Algorithm::HS256),
            KeySource::Jwks(cache) => {
                let kid = header.kid.as_deref().ok_or(AuthError::MissingKeyId)?;
                cache.key_for(kid).await?
            }
        };

        let mut validation = Validation::new(algorithm);
        validation.leeway = LEEWAY_SECS;
        validation.set_issuer(&self.issuers[..]);
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let data = decode::<Claims>(token, &key, &validation)?;
        Ok(data.claims)
    }

    /// Sign a development token with the shared secret
    ///
    /// The token carries the first configured issuer and the configured
    /// audience so it passes `verify`.
    pub fn issue_dev_token(
        &self,
        subject: &str,
        email: Option<String>,
        name: Option<String>,
    ) -> Result<String, AuthError> {
        let KeySource::SharedSecret { encoding, .. } = &self.source else {
            return Err(AuthError::DevTokensDisabled);
        };

        let now = Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            sub: subject.to_string(),
            iss: self.issuers.first().cloned().unwrap_or_default(),
            aud: self.audience.clone(),
            exp: now + DEV_TOKEN_TTL_SECS,
            iat: Some(now),
            email,
            name,
            picture: None,
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, encoding)?)
    }
}

impl JwksCache {
    async fn key_for(&self, kid: &str) -> Result<(DecodingKey, Algorithm), AuthError> {
        {
            let cached = self.cached.read().await;
            if let Some(cached) = cached.as_ref() {
                let fresh = cached.fetched_at.elapsed() < self.ttl;
                if fresh {
                    if let Some(jwk) = cached.keys.find(kid) {
                        return decoding_key(jwk);
                    }
                    if cached.fetched_at.elapsed() < self.min_refresh {
                        return Err(AuthError::UnknownKey(kid.to_string()));
                    }
                }
            }
        }

        tracing::debug!("Refreshing signing keys (kid {})", kid);
        let keys = self.fetch().await?;
        let key = keys.find(kid).map(decoding_key).transpose()?;
        *self.cached.write().await = Some(CachedKeys {
            fetched_at: Instant::now(),
            keys,
        });

        key.ok_or_else(|| AuthError::UnknownKey(kid.to_string()))
    }

    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                tracing::error!("Failed to fetch JWKS from {}: {:?}", self.url, e);
                AuthError::KeySet(e.to_string())
            })?;

        let keys = response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::KeySet(e.to_string()))?;
        tracing::info!("Fetched {} signing keys", keys.keys.len());
        Ok(keys)
    }
}

/// Key and algorithm a JWK verifies with
fn decoding_key(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), AuthError> {
    let algorithm = match jwk.common.key_algorithm {
        Some(alg) => alg.to_string().parse::<Algorithm>()?,
        None => DEFAULT_JWKS_ALGORITHM,
    };
    Ok((DecodingKey::from_jwk(jwk)?, algorithm))
}
