use std::collections::HashSet;

use anyhow::Context;
use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind as JwtErrorKind, Algorithm, DecodingKey, EncodingKey,
    Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{config::JwtConfig, state::AppState};

/// JWT payload. `sub` stays a string on the wire so a bad subject is
/// reported separately from a bad token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Why a token was refused. Logged, never sent to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenRejection {
    #[error("token is not a well-formed JWT")]
    Malformed,
    #[error("signature does not match")]
    BadSignature,
    #[error("issuer or audience mismatch")]
    ForeignIssuer,
    #[error("token expired")]
    Expired,
    #[error("subject is not a valid user id")]
    BadSubject,
}

/// Identity established by a verified session token, valid for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub id: Uuid,
}

/// Signing and verification keys for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: TimeDuration,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl SessionKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: TimeDuration::seconds(cfg.ttl_minutes.max(0).saturating_mul(60)),
        }
    }

    pub fn issue(&self, subject: Uuid) -> anyhow::Result<String> {
        self.issue_at(subject, OffsetDateTime::now_utc())
    }

    pub fn issue_at(&self, subject: Uuid, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = now
            .checked_add(self.ttl)
            .context("token expiry out of range")?;
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %subject, "session token issued");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<AuthenticatedIdentity, TokenRejection> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Checks signature, issuer and audience, then expiry against `now`,
    /// then the subject.
    pub fn verify_at(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> Result<AuthenticatedIdentity, TokenRejection> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation())
            .map_err(|e| match e.kind() {
                JwtErrorKind::InvalidSignature => TokenRejection::BadSignature,
                JwtErrorKind::InvalidIssuer | JwtErrorKind::InvalidAudience => {
                    TokenRejection::ForeignIssuer
                }
                JwtErrorKind::ExpiredSignature => TokenRejection::Expired,
                _ => TokenRejection::Malformed,
            })?;

        if data.claims.exp <= now.unix_timestamp() {
            return Err(TokenRejection::Expired);
        }

        let id = Uuid::parse_str(&data.claims.sub).map_err(|_| TokenRejection::BadSubject)?;
        debug!(user_id = %id, "session token verified");
        Ok(AuthenticatedIdentity { id })
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is compared against the caller's clock in verify_at
        validation.validate_exp = false;
        validation.required_spec_claims = ["exp", "sub", "iss", "aud"]
            .into_iter()
            .map(String::from)
            .collect::<HashSet<_>>();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation
    }
}
