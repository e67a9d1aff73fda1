//! Signing and verification of access and refresh tokens
//!
//! Purely cryptographic and structural: nothing here consults the session
//! store. A token that decodes cleanly may still belong to a dead session.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::domain::entities::token::{Claims, EncodedToken, TokenPair, TokenType};
use crate::errors::TokenError;

use super::config::TokenServiceConfig;

const ALGORITHM: Algorithm = Algorithm::HS256;

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// HMAC-SHA256 codec holding separate keys for access and refresh tokens
pub struct TokenCodec {
    access: KeyPair,
    refresh: KeyPair,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(config: &TokenServiceConfig) -> Self {
        Self {
            access: KeyPair::from_secret(config.access_secret.as_bytes()),
            refresh: KeyPair::from_secret(config.refresh_secret.as_bytes()),
            issuer: config.issuer.clone(),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
            validation: validation_for(&config.issuer, config.leeway),
        }
    }

    /// Signs `claims` with `secret`, stamping `iat`, `exp = now + ttl` and `iss`
    pub fn encode_with_secret(
        claims: Claims,
        secret: &[u8],
        ttl: Duration,
        issuer: &str,
    ) -> Result<EncodedToken, TokenError> {
        encode_with_key(claims, &EncodingKey::from_secret(secret), ttl, issuer)
    }

    /// Verifies signature, expiry and issuer of `token` against `secret`
    pub fn decode_with_secret(
        token: &str,
        secret: &[u8],
        issuer: &str,
        leeway: u64,
    ) -> Result<Claims, TokenError> {
        decode_with_key(token, &DecodingKey::from_secret(secret), &validation_for(issuer, leeway))
    }

    /// Signs claims with the key and lifetime matching their token type
    pub fn encode(&self, claims: Claims) -> Result<EncodedToken, TokenError> {
        let (keys, ttl) = match claims.token_type {
            TokenType::Access => (&self.access, self.access_ttl),
            TokenType::Refresh => (&self.refresh, self.refresh_ttl),
        };
        encode_with_key(claims, &keys.encoding, ttl, &self.issuer)
    }

    /// Decodes a token that must be of type `expected`
    pub fn decode_expecting(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let keys = match expected {
            TokenType::Access => &self.access,
            TokenType::Refresh => &self.refresh,
        };
        let claims = decode_with_key(token, &keys.decoding, &self.validation)?;
        if claims.token_type != expected {
            return Err(TokenError::TypeMismatch {
                expected: expected.to_string(),
                actual: claims.token_type.to_string(),
            });
        }
        Ok(claims)
    }

    /// Mints a fresh access/refresh pair bound to `session_id`
    pub fn mint_pair(
        &self,
        user_id: Uuid,
        email: &str,
        role: &str,
        session_id: &str,
    ) -> Result<TokenPair, TokenError> {
        let access = self.encode(Claims::new_access_token(user_id, email, role, session_id))?;
        let refresh = self.encode(Claims::new_refresh_token(user_id, email, session_id))?;
        Ok(TokenPair::new(access, refresh, session_id))
    }

    /// Structural decode with no signature, expiry or issuer checks
    ///
    /// Diagnostics only. Never authorize anything with the result.
    pub fn decode_unsafe(token: &str) -> Option<Claims> {
        let mut validation = Validation::new(ALGORITHM);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .ok()
            .map(|data| data.claims)
    }
}

fn validation_for(issuer: &str, leeway: u64) -> Validation {
    let mut validation = Validation::new(ALGORITHM);
    validation.set_issuer(&[issuer]);
    validation.set_required_spec_claims(&["exp", "iss"]);
    validation.validate_exp = true;
    validation.leeway = leeway;
    validation
}

fn encode_with_key(
    mut claims: Claims,
    key: &EncodingKey,
    ttl: Duration,
    issuer: &str,
) -> Result<EncodedToken, TokenError> {
    let now = Utc::now();
    let expires_at = now
        .checked_add_signed(ttl)
        .ok_or(TokenError::EncodingFailed)?;
    claims.iat = now.timestamp();
    claims.exp = expires_at.timestamp();
    claims.iss = issuer.to_string();

    let token = encode(&Header::new(ALGORITHM), &claims, key)
        .map_err(|_| TokenError::EncodingFailed)?;
    let expires_at = claims.expires_at().ok_or(TokenError::EncodingFailed)?;

    Ok(EncodedToken { token, expires_at })
}

fn decode_with_key(
    token: &str,
    key: &DecodingKey,
    validation: &Validation,
) -> Result<Claims, TokenError> {
    decode::<Claims>(token, key, validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidIssuer => TokenError::IssuerMismatch,
            _ => TokenError::Malformed,
        })
}
