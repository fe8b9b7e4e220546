//! Token codec: signed, self-contained, time-bounded credentials.
//!
//! The codec only answers "is this string a genuine, unexpired token and for
//! whom". Whether the token is still honoured (not logged out) is the
//! revocation registry's job, see [`crate::CredentialStore`].

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use thiserror::Error;

use slicehouse_core::UserId;

use crate::claims::{TokenClaims, TokenId, TokenValidationError, validate_claims};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("invalid token time window")]
    InvalidTimeWindow,

    #[error("failed to encode token: {0}")]
    Encode(String),
}

impl From<TokenValidationError> for TokenError {
    fn from(value: TokenValidationError) -> Self {
        match value {
            TokenValidationError::Expired => TokenError::Expired,
            TokenValidationError::NotYetValid => TokenError::NotYetValid,
            TokenValidationError::InvalidTimeWindow => TokenError::InvalidTimeWindow,
        }
    }
}

/// A freshly minted token plus the metadata the registry needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub id: TokenId,
    pub expires_at: DateTime<Utc>,
}

/// Encode/decode contract for bearer tokens.
///
/// Implementations must be pure (no I/O) so decoding never suspends a request.
pub trait TokenCodec: Send + Sync {
    /// Mint a token for `sub`, valid from `now` for the codec's TTL.
    fn issue(&self, sub: UserId, now: DateTime<Utc>) -> Result<IssuedToken, TokenError>;

    /// Verify signature and time window, returning the embedded claims.
    fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError>;

    /// Verify the signature only and return the claims regardless of expiry.
    ///
    /// Used to release registry entries for tokens that already expired.
    fn decode_identifier(&self, token: &str) -> Result<TokenClaims, TokenError>;
}

/// HMAC-SHA256 signed JWT codec.
///
/// The secret is loaded once at startup; there is no key rotation, so every
/// token issued by this process verifies for as long as the process runs.
pub struct Hs256TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl Hs256TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        let secret = secret.as_ref();

        // Time checks run through `validate_claims` so expiry is reported
        // the same way regardless of the JWT library's leeway rules.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl core::fmt::Debug for Hs256TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenCodec").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenCodec for Hs256TokenCodec {
    fn issue(&self, sub: UserId, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        // JWT timestamps are whole seconds; truncate so the registry expiry
        // matches what a later decode will see.
        let iat = now.trunc_subsecs(0);
        let exp = iat
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Encode("token lifetime out of range".to_string()))?;
        let claims = TokenClaims {
            sub,
            jti: TokenId::new(),
            iat,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))?;

        Ok(IssuedToken {
            token,
            id: claims.jti,
            expires_at: claims.exp,
        })
    }

    fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let claims = self.decode_identifier(token)?;
        validate_claims(&claims, now)?;
        Ok(claims)
    }

    fn decode_identifier(&self, token: &str) -> Result<TokenClaims, TokenError> {
        jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::ImmatureSignature => TokenError::NotYetValid,
        _ => TokenError::Malformed(err.to_string()),
    }
}
