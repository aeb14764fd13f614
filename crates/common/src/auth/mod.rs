//! Admin authentication
//!
//! Provides:
//! - Admin password verification against a SHA-256 digest
//! - Signed, expiring admin tokens (JWT, HS256)
//! - Axum extractors for the viewer mode of a request

use crate::config::AuthConfig;
use crate::errors::{AppError, Result};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

/// Password used when none is configured
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Subject claim of admin tokens
const ADMIN_SUBJECT: &str = "admin";

/// Longest token lifetime; larger configured values are clamped
pub const MAX_TOKEN_TTL_SECS: u64 = 366 * 24 * 3600;

/// What a request is allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewerMode {
    /// Read-only access
    Observer,
    /// Password-gated access permitting mutations
    Admin,
}

impl ViewerMode {
    pub fn is_admin(self) -> bool {
        self == ViewerMode::Admin
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Subject (always "admin")
    pub sub: String,

    /// Token id
    pub jti: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Issued admin token
#[derive(Debug, Clone, Serialize)]
pub struct AdminToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Password check plus token issuing/validation
pub struct AdminAuth {
    password_digest: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl AdminAuth {
    /// Build from configuration.
    ///
    /// Digest wins over plain password; with neither, the default password
    /// is used. Without a configured secret a random one is generated, so
    /// tokens do not survive a restart.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let password_digest = match (&config.admin_password_sha256, &config.admin_password) {
            (Some(digest), _) => {
                let digest = digest.trim().to_ascii_lowercase();
                if digest.len() != 64 || hex::decode(&digest).is_err() {
                    return Err(AppError::Configuration {
                        message: "auth.admin_password_sha256 must be 64 hex characters".to_string(),
                    });
                }
                digest
            }
            (None, Some(password)) => hash_password(password),
            (None, None) => {
                tracing::warn!("No admin password configured, using the default password");
                hash_password(DEFAULT_ADMIN_PASSWORD)
            }
        };

        let secret = match &config.jwt_secret {
            Some(secret) if !secret.is_empty() => secret.clone(),
            _ => format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()),
        };

        Ok(Self::new(password_digest, &secret, config.session_ttl_secs))
    }

    /// Create from a password digest and signing secret
    pub fn new(password_digest: String, secret: &str, ttl_secs: u64) -> Self {
        Self {
            password_digest,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: ttl_secs.min(MAX_TOKEN_TTL_SECS) as i64,
        }
    }

    /// Compare a submitted password with the configured one
    pub fn verify_password(&self, password: &str) -> bool {
        constant_time_eq(hash_password(password).as_bytes(), self.password_digest.as_bytes())
    }

    /// Check the password and issue a token
    pub fn login(&self, password: &str) -> Result<AdminToken> {
        if !self.verify_password(password) {
            return Err(AppError::InvalidPassword);
        }
        self.issue_token()
    }

    /// Generate a new admin token
    pub fn issue_token(&self) -> Result<AdminToken> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.ttl_secs);

        let claims = AdminClaims {
            sub: ADMIN_SUBJECT.to_string(),
            jti: Uuid::new_v4().to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            AppError::Internal {
                message: format!("Failed to generate token: {}", e),
            }
        })?;

        Ok(AdminToken { token, expires_at })
    }

    /// Validate and decode an admin token
    pub fn validate_token(&self, token: &str) -> Result<AdminClaims> {
        let claims = decode::<AdminClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::Unauthorized {
                    message: "Invalid admin token".to_string(),
                },
            })?;

        if claims.sub != ADMIN_SUBJECT {
            return Err(AppError::Unauthorized {
                message: "Invalid admin token".to_string(),
            });
        }
        Ok(claims)
    }

    /// Resolve the mode for an optional bearer token
    pub fn mode_for(&self, token: Option<&str>) -> Result<ViewerMode> {
        match token {
            None => Ok(ViewerMode::Observer),
            Some(token) => self.validate_token(token).map(|_| ViewerMode::Admin),
        }
    }
}

/// SHA-256 hex digest of a password
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Extract the token from an `Authorization: Bearer` header
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn bearer_from_parts(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer)
}

/// Mode of the current request; invalid or expired tokens are rejected
#[derive(Debug, Clone, Copy)]
pub struct ViewerContext {
    pub mode: ViewerMode,
}

/// Proof that the request carries a valid admin token
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub token_id: String,
}

impl<S> FromRequestParts<S> for ViewerContext
where
    Arc<AdminAuth>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let auth = Arc::<AdminAuth>::from_ref(state);
        let mode = auth.mode_for(bearer_from_parts(parts))?;
        Ok(ViewerContext { mode })
    }
}

impl<S> FromRequestParts<S> for AdminContext
where
    Arc<AdminAuth>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let auth = Arc::<AdminAuth>::from_ref(state);
        let token = bearer_from_parts(parts).ok_or_else(|| AppError::Unauthorized {
            message: "Admin mode required".to_string(),
        })?;
        let claims = auth.validate_token(token)?;
        Ok(AdminContext { token_id: claims.jti })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> AdminAuth {
        AdminAuth::new(hash_password("s3cret"), "test_secret", 3600)
    }

    #[test]
    fn test_huge_ttl_is_clamped() {
        let auth = AdminAuth::new(hash_password("s3cret"), "test_secret", u64::MAX);
        let token = auth.issue_token().unwrap();

        let lifetime = token.expires_at - Utc::now();
        assert!(lifetime <= Duration::seconds(MAX_TOKEN_TTL_SECS as i64));
        assert!(lifetime > Duration::days(365));
        assert!(auth.validate_token(&token.token).is_ok());
    }

    #[test]
    fn test_password_check() {
        let auth = auth();
        assert!(auth.verify_password("s3cret"));
        assert!(!auth.verify_password("S3cret"));
        assert!(!auth.verify_password(""));
        assert!(matches!(auth.login("wrong"), Err(AppError::InvalidPassword)));
    }

    #[test]
    fn test_token_roundtrip() {
        let auth = auth();
        let token = auth.login("s3cret").unwrap();
        let claims = auth.validate_token(&token.token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(auth.mode_for(Some(&token.token)).unwrap(), ViewerMode::Admin);
        assert_eq!(auth.mode_for(None).unwrap(), ViewerMode::Observer);
    }

    #[test]
    fn test_expired_token() {
        let auth = auth();
        let claims = AdminClaims {
            sub: "admin".into(),
            jti: "x".into(),
            exp: Utc::now().timestamp() - 3600,
            iat: Utc::now().timestamp() - 7200,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test_secret")).unwrap();
        assert!(matches!(auth.validate_token(&token), Err(AppError::ExpiredToken)));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let other = AdminAuth::new(hash_password("s3cret"), "another_secret", 3600);
        let token = other.issue_token().unwrap();
        assert!(matches!(
            auth().validate_token(&token.token),
            Err(AppError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_from_config() {
        let config = AuthConfig {
            admin_password: Some("plain".into()),
            ..Default::default()
        };
        assert!(AdminAuth::from_config(&config).unwrap().verify_password("plain"));

        let config = AuthConfig {
            admin_password: Some("ignored".into()),
            admin_password_sha256: Some(hash_password("hashed").to_uppercase()),
            ..Default::default()
        };
        let auth = AdminAuth::from_config(&config).unwrap();
        assert!(auth.verify_password("hashed"));
        assert!(!auth.verify_password("ignored"));

        let config = AuthConfig::default();
        assert!(AdminAuth::from_config(&config).unwrap().verify_password(DEFAULT_ADMIN_PASSWORD));

        let config = AuthConfig {
            admin_password_sha256: Some("abc".into()),
            ..Default::default()
        };
        assert!(matches!(
            AdminAuth::from_config(&config),
            Err(AppError::Configuration { .. })
        ));
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer("Bearer "), None);
        assert_eq!(extract_bearer("Basic abc"), None);
    }
}
