//! JWT Token Handler
//! Mission: Issue and validate stateless bearer tokens

use crate::auth::models::{Claims, User};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use tracing::debug;

/// Token validation failure
///
/// Expiry is kept distinct from every other failure mode so the access gate
/// can report it separately; bad signature, garbage input, and algorithm
/// mismatch all collapse into `Invalid`.
#[derive(Debug, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Expired => write!(f, "Token expired"),
            TokenError::Invalid => write!(f, "Invalid token"),
        }
    }
}

impl std::error::Error for TokenError {}

/// JWT handler for token operations
pub struct JwtHandler {
    secret: String,
    ttl: Duration,
}

impl JwtHandler {
    /// Create a new JWT handler with a signing secret and token lifetime.
    pub fn new(secret: String, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    /// Issue a signed token for a user.
    ///
    /// Claims carry subject id, email, role, issued-at, and expiry
    /// (`iat + ttl`). Returns the encoded token and its lifetime in seconds.
    pub fn issue(&self, user: &User) -> Result<(String, usize)> {
        let now = Utc::now();
        let expiry = now
            .checked_add_signed(self.ttl)
            .context("Invalid timestamp")?;

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp() as usize,
            exp: expiry.timestamp() as usize,
        };

        debug!(
            "Issuing JWT for user {} ({}), expires at {}",
            user.email, user.id, expiry
        );

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to sign JWT")?;

        let expires_in = self.ttl.num_seconds().max(0) as usize;
        Ok((token, expires_in))
    }

    /// Validate a token and extract its claims.
    ///
    /// Zero leeway: a token is rejected the moment its expiry passes.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })?;

        // jsonwebtoken only rejects exp < now; treat exp == now as expired
        // too so a zero-ttl token is dead on arrival.
        if decoded.claims.exp <= Utc::now().timestamp() as usize {
            return Err(TokenError::Expired);
        }

        debug!("Validated JWT for user {}", decoded.claims.email);

        Ok(decoded.claims)
    }
}
