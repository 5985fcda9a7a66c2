//! Bearer token decoding
//!
//! The client reads the claims of the access token it was given but never
//! verifies the signature: that is the server's job, and the claims are only
//! used as hints for what the UI should offer.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;
use tracing::debug;

use crate::error::DecodeError;
use crate::models::Role;

/// Token type claim
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
    /// Any other token flavour the server may issue
    #[serde(other)]
    Other,
}

impl TokenType {
    fn as_str(self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
            TokenType::Other => "other",
        }
    }
}

/// Subject id, either a string or an integer primary key
#[derive(Deserialize)]
#[serde(untagged)]
enum SubjectId {
    Text(String),
    Number(i64),
}

impl SubjectId {
    fn into_string(self) -> String {
        match self {
            SubjectId::Text(s) => s,
            SubjectId::Number(n) => n.to_string(),
        }
    }
}

/// Payload as it appears on the wire
#[derive(Deserialize)]
struct RawClaims {
    #[serde(default)]
    sub: Option<SubjectId>,
    #[serde(default)]
    user_id: Option<SubjectId>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    role: Option<Role>,
    exp: i64,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(default)]
    token_type: Option<TokenType>,
}

/// Decoded identity and authorization fields of a bearer token
///
/// Only [`TokenCodec`] produces values of this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    subject: String,
    username: Option<String>,
    role: Role,
    expires_at: DateTime<Utc>,
    issued_at: Option<DateTime<Utc>>,
    token_type: Option<TokenType>,
}

impl Claims {
    /// User id (`sub`, or `user_id` when `sub` is absent)
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Username claim, if the server included one
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Role claim; `viewer` when the token carries none
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.issued_at
    }

    pub fn token_type(&self) -> Option<TokenType> {
        self.token_type
    }

    /// Whether the token is expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    fn from_raw(raw: RawClaims) -> Result<Self, DecodeError> {
        let subject = raw
            .sub
            .or(raw.user_id)
            .map(SubjectId::into_string)
            .ok_or_else(|| {
                jsonwebtoken::errors::Error::from(ErrorKind::MissingRequiredClaim(
                    "sub".to_string(),
                ))
            })?;

        let expires_at = DateTime::from_timestamp(raw.exp, 0)
            .ok_or_else(|| jsonwebtoken::errors::Error::from(ErrorKind::InvalidToken))?;
        let issued_at = raw.iat.and_then(|iat| DateTime::from_timestamp(iat, 0));

        Ok(Claims {
            subject,
            username: raw.username.filter(|name| !name.trim().is_empty()),
            role: raw.role.unwrap_or_default(),
            expires_at,
            issued_at,
            token_type: raw.token_type,
        })
    }
}

/// Decodes bearer tokens into [`Claims`] without verifying them
#[derive(Clone)]
pub struct TokenCodec {
    key: DecodingKey,
    validation: Validation,
}

impl Default for TokenCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCodec {
    /// Create a codec; expiry is left to the caller, `exp` must be present
    pub fn new() -> Self {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        TokenCodec {
            key: DecodingKey::from_secret(&[]),
            validation,
        }
    }

    /// Decode any claims-bearing token
    pub fn decode(&self, token: &str) -> Result<Claims, DecodeError> {
        let data = decode::<RawClaims>(token.trim(), &self.key, &self.validation)?;
        let claims = Claims::from_raw(data.claims)?;
        debug!(
            "Decoded token for subject {} expiring at {}",
            claims.subject, claims.expires_at
        );
        Ok(claims)
    }

    /// Decode a token that must be usable as an access token
    pub fn decode_access(&self, token: &str) -> Result<Claims, DecodeError> {
        let claims = self.decode(token)?;
        match claims.token_type {
            Some(kind @ TokenType::Refresh) => Err(DecodeError::WrongTokenType(kind.as_str())),
            _ => Ok(claims),
        }
    }
}
