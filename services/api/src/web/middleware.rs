//! services/api/src/web/middleware.rs
//!
//! Authentication and rate-limiting middleware.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::web::state::AppState;
use habit_tracker_core::ports::PortError;

/// The authenticated user, inserted into request extensions by [`require_auth`].
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

/// Pulls the session token from `Authorization: Bearer` or the `session` cookie.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    bearer.or_else(|| {
        headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())?
            .split(';')
            .find_map(|c| c.trim().strip_prefix("session="))
            .filter(|t| !t.is_empty())
    })
}

/// Middleware that validates the session token and extracts the user_id.
///
/// If valid, inserts an [`AuthUser`] into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let unauthorized = || (StatusCode::UNAUTHORIZED, "Not authorized".to_string());

    // 1. Extract the session token
    let token = session_token(req.headers()).ok_or_else(unauthorized)?;

    // 2. Validate it in the database, get user_id
    let user_id = state
        .db
        .validate_auth_session(token)
        .await
        .map_err(|e| {
            if !matches!(e, PortError::Unauthorized) {
                error!("Failed to validate auth session: {:?}", e);
            }
            unauthorized()
        })?;

    // 3. Insert the user into request extensions and continue to the handler
    req.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(req).await)
}

/// Middleware that refuses clients which exceeded the configured request budget.
pub async fn rate_limit(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if !state.rate_limiter.check(&client) {
        warn!(client = %client, "Rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            "Too many requests, try again later.",
        )
            .into_response();
    }

    next.run(req).await
}
