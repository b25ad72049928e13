//! Bearer token verification.
//!
//! # Responsibilities
//! - Extract the credential from `Authorization: Bearer <token>`
//! - Verify the HMAC signature against the shared secret
//! - Reject tokens whose `exp` is at or before the current time
//!
//! # Design Decisions
//! - Purely local check: no database or network lookup
//! - The clock is a parameter so expiry is testable at the boundary
//! - Every signature/structure/expiry failure collapses into one error

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::http::HeaderValue;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::GatewayError;

/// Authorization scheme accepted by the gateway.
pub const BEARER: &str = "Bearer";

/// Verified token payload, as issued by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject as written by the auth service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Registered subject claim, used when `username` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Granted roles. Order and uniqueness are not significant.
    #[serde(default)]
    pub roles: Option<Vec<String>>,

    /// Expiry, seconds since the Unix epoch. Fractional values round up.
    #[serde(deserialize_with = "deserialize_expiry")]
    pub exp: u64,
}

impl Claims {
    pub fn new(subject: impl Into<String>, roles: Vec<String>, exp: u64) -> Self {
        Self {
            username: Some(subject.into()),
            sub: None,
            roles: Some(roles),
            exp,
        }
    }

    pub fn subject(&self) -> Option<&str> {
        self.username.as_deref().or(self.sub.as_deref())
    }

    pub fn roles(&self) -> &[String] {
        self.roles.as_deref().unwrap_or_default()
    }
}

/// NumericDate may carry a fraction. With a whole-second clock,
/// `ceil(exp) <= now` holds exactly when `exp <= now`.
fn deserialize_expiry<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let exp = f64::deserialize(deserializer)?;
    if !exp.is_finite() || exp < 0.0 {
        return Err(D::Error::custom(format!("invalid exp {exp}")));
    }
    Ok(exp.ceil() as u64)
}

/// Verifies bearer credentials against the signing secret.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        // Expiry is compared against the caller's clock in `verify`.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        // `exp` presence and shape are enforced by `Claims` itself, which
        // also accepts fractional values.
        validation.set_required_spec_claims::<&str>(&[]);

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Authenticate the raw `Authorization` header at instant `now` (Unix seconds).
    pub fn verify(&self, header: Option<&HeaderValue>, now: u64) -> Result<Claims, GatewayError> {
        let token = bearer_token(header)?;

        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            GatewayError::InvalidCredential
        })?;

        if data.claims.exp <= now {
            tracing::debug!(exp = data.claims.exp, now, "Token expired");
            return Err(GatewayError::InvalidCredential);
        }

        Ok(data.claims)
    }

    /// Authenticate against the system clock.
    pub fn verify_now(&self, header: Option<&HeaderValue>) -> Result<Claims, GatewayError> {
        self.verify(header, unix_now())
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

/// Split `Bearer <token>` into the credential.
///
/// The header must contain exactly one space; `Bearer  abc` or
/// `Bearer abc def` are malformed.
pub fn bearer_token(header: Option<&HeaderValue>) -> Result<&str, GatewayError> {
    let header = header.ok_or(GatewayError::MissingCredential)?;
    let value = header
        .to_str()
        .map_err(|_| GatewayError::MalformedCredential)?;

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(BEARER), Some(token), None) => Ok(token),
        _ => Err(GatewayError::MalformedCredential),
    }
}

/// Sign `claims` with HS256.
pub fn sign(secret: &[u8], claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &EncodingKey::from_secret(secret))
}

/// Mint a token in the auth service's format, valid for `ttl`.
pub fn issue_token(
    secret: &[u8],
    subject: &str,
    roles: Vec<String>,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims::new(subject, roles, unix_now() + ttl.as_secs());
    sign(secret, &claims)
}

/// Current time in Unix seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
