//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for login, logout, and the current user.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{Duration, Utc};
use paid_survey_core::domain::{AuthSession, Role};
use paid_survey_core::ports::PortError;
use paid_survey_core::questionnaire::FormState;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::config::Config;
use crate::web::middleware::{session_id_from_headers, SESSION_COOKIE};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub username: String,
    #[schema(value_type = String, example = "enumerator")]
    pub role: Role,
}

#[derive(Serialize, ToSchema)]
pub struct CurrentUserResponse {
    pub username: String,
    #[schema(value_type = String, example = "enumerator")]
    pub role: Role,
    /// State of the questionnaire gate: `unvalidated`, `validated` or `stale`.
    #[schema(value_type = String, example = "unvalidated")]
    pub form_state: FormState,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

fn session_cookie(config: &Config, session_id: &str) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        session_id,
        Duration::hours(config.session_ttl_hours).num_seconds()
    );
    if config.secure_cookies {
        cookie.push_str("; Secure");
    }
    cookie
}

fn cleared_cookie(config: &Config) -> String {
    let mut cookie = format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE);
    if config.secure_cookies {
        cookie.push_str("; Secure");
    }
    cookie
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/login - Login with a username and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Verify credentials
    let role = state
        .credentials
        .verify(&req.username, &req.password)
        .await
        .map_err(|e| match e {
            PortError::Unauthorized => {
                warn!("Failed login attempt for user '{}'", req.username);
                (StatusCode::UNAUTHORIZED, "Invalid credentials.".to_string())
            }
            other => {
                error!("Failed to verify credentials: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Authentication error".to_string(),
                )
            }
        })?;

    // 2. Create the auth session
    let expires_at = Utc::now() + Duration::hours(state.config.session_ttl_hours);
    let session = state
        .sessions
        .create_session(&req.username, role, expires_at)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create session".to_string(),
            )
        })?;
    info!("User '{}' logged in as {:?}", session.username, session.role);

    // 3. Return response with cookie
    let response = AuthResponse {
        username: session.username,
        role: session.role,
    };
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&state.config, &session.id))],
        Json(response),
    ))
}

/// POST /auth/logout - Logout and discard the session, including any validated form
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Parse session ID from cookie
    let auth_session_id = session_id_from_headers(&headers)
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    // 2. Delete the auth session
    state
        .sessions
        .delete_session(&auth_session_id)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => (StatusCode::UNAUTHORIZED, "No session found".to_string()),
            other => {
                error!("Failed to delete auth session: {:?}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to logout".to_string())
            }
        })?;
    info!("Session {} logged out", auth_session_id);

    // 3. Clear cookie
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cleared_cookie(&state.config))],
        Json(MessageResponse {
            message: "You have been logged out.".to_string(),
        }),
    ))
}

/// GET /auth/me - The logged-in user and the state of their questionnaire
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current session", body = CurrentUserResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn me_handler(Extension(session): Extension<AuthSession>) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        form_state: session.form_gate.state(),
        username: session.username,
        role: session.role,
    })
}
