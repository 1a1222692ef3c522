use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::session::{AuthenticatedIdentity, SessionKeys};
use crate::error::AppError;

/// Pulls the token out of `Authorization: <scheme> <token>`. Only the
/// bearer scheme is accepted, case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AppError::MissingCredentials("no Authorization header"))?
        .to_str()
        .map_err(|_| AppError::MissingCredentials("Authorization header is not ASCII"))?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AppError::MissingCredentials("expected '<scheme> <token>'"))?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::MissingCredentials("unsupported auth scheme"));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::MissingCredentials("empty bearer token"));
    }
    Ok(token)
}

/// Middleware guarding every route it is layered on. Rejected requests
/// never reach the handler.
pub async fn require_session(
    State(keys): State<SessionKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = {
        let token = bearer_token(req.headers())?;
        keys.verify(token)?
    };
    debug!(user_id = %identity.id, "request authenticated");
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .copied()
            .ok_or(AppError::MissingCredentials("route is not behind the session gate"))
    }
}
