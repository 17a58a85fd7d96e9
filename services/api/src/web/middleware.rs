//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use paid_survey_core::domain::{AuthSession, Role};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::web::state::AppState;

/// Name of the cookie carrying the auth session id.
pub const SESSION_COOKIE: &str = "session";

/// Reads the auth session id from the `Cookie` header, if present.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| {
            let c = c.trim();
            c.strip_prefix(SESSION_COOKIE)?.strip_prefix('=')
        })
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Middleware that validates the auth session cookie and loads the session.
///
/// If valid, inserts the `AuthSession` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Parse session ID from cookie
    let auth_session_id =
        session_id_from_headers(req.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Look up the live session
    let session = state
        .sessions
        .get_session(&auth_session_id)
        .await
        .map_err(|e| {
            debug!("Rejected auth session: {}", e);
            StatusCode::UNAUTHORIZED
        })?;

    // 3. Insert the session into request extensions
    req.extensions_mut().insert(session);

    // 4. Continue to the handler
    Ok(next.run(req).await)
}

/// Rejects a request whose session does not have the given role.
pub fn ensure_role(session: &AuthSession, role: Role) -> Result<(), (StatusCode, String)> {
    if session.role == role {
        return Ok(());
    }
    warn!(
        "User '{}' ({:?}) tried to reach a {:?} endpoint",
        session.username, session.role, role
    );
    let message = match role {
        Role::Admin => "This page is only available to the admin.",
        Role::Enumerator => "This page is only available to enumerators.",
    };
    Err((StatusCode::FORBIDDEN, message.to_string()))
}
