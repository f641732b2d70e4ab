//! Bearer token issuing and verification.
//!
//! Tokens are HS256 JWTs bound to a configured issuer and audience. Expiry is
//! checked against the system clock by `jsonwebtoken`, so token timestamps come
//! from [`SystemTime`] rather than the store clock.

use std::collections::HashSet;
use std::time::{Duration, SystemTime};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};

use super::errors::AuthError;
use crate::Result;
use crate::account::AccountView;

/// Signing and validation parameters for [`JwtIssuer`].
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenConfig {
    /// HMAC secret.
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    /// Lifetime of an issued token.
    pub expiration_seconds: u64,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiration_seconds", &self.expiration_seconds)
            .finish()
    }
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: "dossier".to_string(),
            audience: "dossier-api".to_string(),
            expiration_seconds: 24 * 60 * 60,
        }
    }

    /// Config with a freshly generated secret. Tokens signed with it do not
    /// survive a restart.
    pub fn random() -> Self {
        let secret: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(48)
            .map(char::from)
            .collect();
        Self::new(secret)
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    pub fn with_expiration_seconds(mut self, seconds: u64) -> Self {
        self.expiration_seconds = seconds;
        self
    }
}

/// Claims carried by an issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account ID
    pub sub: String,
    pub email: String,
    /// `user` or `admin`
    pub role: String,
    pub iss: String,
    pub aud: String,
    /// Expiration (Unix seconds)
    pub exp: u64,
    /// Issued at (Unix seconds)
    pub iat: u64,
    /// Unique token ID
    pub jti: String,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Issues tokens for accounts and recovers their claims.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, account: &AccountView) -> Result<String>;

    /// Validate signature, issuer, audience and expiry.
    fn verify(&self, token: &str) -> Result<Claims>;
}

/// HS256 [`TokenIssuer`].
pub struct JwtIssuer {
    config: TokenConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for JwtIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIssuer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl JwtIssuer {
    /// Build an issuer, rejecting an empty secret.
    pub fn new(config: TokenConfig) -> Result<Self> {
        if config.secret.is_empty() {
            return Err(AuthError::InvalidSecret {
                reason: "secret must not be empty".to_string(),
            }
            .into());
        }
        let encoding = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding = DecodingKey::from_secret(config.secret.as_bytes());
        Ok(Self {
            config,
            encoding,
            decoding,
        })
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.iss = Some(HashSet::from([self.config.issuer.clone()]));
        validation.aud = Some(HashSet::from([self.config.audience.clone()]));
        validation.validate_exp = true;
        validation
    }
}

impl TokenIssuer for JwtIssuer {
    fn issue(&self, account: &AccountView) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_err(|e| AuthError::TokenEncoding {
                reason: format!("system clock before epoch: {e}"),
            })?;
        let expiration = now + Duration::from_secs(self.config.expiration_seconds);

        let claims = Claims {
            sub: account.id.clone(),
            email: account.email.clone(),
            role: account.role.as_str().to_string(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            exp: expiration.as_secs(),
            iat: now.as_secs(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(
            |e| {
                AuthError::TokenEncoding {
                    reason: e.to_string(),
                }
                .into()
            },
        )
    }

    fn verify(&self, token: &str) -> Result<Claims> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation())
            .map(|data| data.claims)
            .map_err(|e| {
                AuthError::InvalidToken {
                    reason: e.to_string(),
                }
                .into()
            })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}
