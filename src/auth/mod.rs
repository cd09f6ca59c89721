//! Admin gate: a single shared secret exchanged at login for a
//! short-lived signed token, checked per protected call. No users, no
//! refresh tokens, no RBAC.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::{Duration as ChronoDuration, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::ServiceError;

mod rate_limit;

pub use rate_limit::{cleanup_rate_limits, LoginRateLimitConfig, LoginRateLimiter};

const TOKEN_ISSUER: &str = "storefront-api";
const TOKEN_AUDIENCE: &str = "storefront-admin";

type HmacSha256 = Hmac<Sha256>;

/// Claim structure for admin session tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
    pub iss: String,
    pub aud: String,
}

/// Issued session token plus its lifetime, as returned by login.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Verifies the shared admin secret and issues/validates session tokens.
#[derive(Clone)]
pub struct AdminAuthService {
    admin_password: String,
    token_secret: String,
    token_expiration: Duration,
}

impl AdminAuthService {
    pub fn new(admin_password: String, token_secret: String, token_expiration: Duration) -> Self {
        Self {
            admin_password,
            token_secret,
            token_expiration,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.admin_password.clone(),
            cfg.admin_token_secret.clone(),
            Duration::from_secs(cfg.admin_token_expiration_secs),
        )
    }

    /// Exchanges the shared secret for a session token.
    pub fn login(&self, password: &str) -> Result<TokenResponse, ServiceError> {
        if !self.password_matches(password) {
            return Err(ServiceError::Unauthorized("invalid admin password".into()));
        }

        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.token_expiration)
                .map_err(|_| ServiceError::Internal("invalid token duration".into()))?;

        let claims = Claims {
            sub: "admin".to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            nbf: now.timestamp(),
            iss: TOKEN_ISSUER.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.token_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::Internal(format!("token creation failed: {e}")))?;

        debug!("Admin session token issued");
        Ok(TokenResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_expiration.as_secs(),
        })
    }

    /// Validates a session token and returns its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_audience(&[TOKEN_AUDIENCE]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.token_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                ServiceError::Unauthorized("session token expired".into())
            }
            _ => ServiceError::Unauthorized("invalid session token".into()),
        })
    }

    /// Constant-time comparison: both sides are run through a keyed MAC
    /// first, so neither length nor content leaks through timing.
    fn password_matches(&self, candidate: &str) -> bool {
        let expected = self.mac(self.admin_password.as_bytes());
        let submitted = self.mac(candidate.as_bytes());
        expected
            .iter()
            .zip(submitted.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }

    fn mac(&self, value: &[u8]) -> [u8; 32] {
        let mut mac = HmacSha256::new_from_slice(self.token_secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(value);
        mac.finalize().into_bytes().into()
    }
}

/// Middleware guarding the admin routes: requires a valid bearer token.
pub async fn require_admin(
    State(auth): State<Arc<AdminAuthService>>,
    request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ServiceError::Unauthorized("missing bearer token".into()))?;

    auth.validate_token(token)?;
    Ok(next.run(request).await)
}
