//! Bearer-token authentication middleware.
//!
//! This is the only auth gate in the service: it is installed once on the
//! `/api` router, verifies the credential against the identity provider, and
//! attaches the resolved `Caller` as a request extension. Handlers read the
//! extension and never re-check credentials themselves.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::errors::AppError;
use crate::state::AppState;

fn parse_authorization_bearer(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let (prefix, rest) = trimmed.split_once(' ')?;
    if !prefix.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authorization_bearer)
        .ok_or(AppError::Unauthorized)?;

    let caller = state
        .identity
        .authenticate(token)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("identity verification failed: {e}")))?
        .ok_or_else(|| {
            tracing::warn!(
                path = %req.uri().path(),
                method = %req.method(),
                "Rejected request with invalid credential"
            );
            AppError::Unauthorized
        })?;

    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}
