pub mod admin;
pub mod auth;
pub mod middleware;
pub mod questionnaire;
pub mod rest;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub use middleware::require_auth;
pub use state::AppState;

/// Builds the API router: public auth routes plus the session-protected
/// questionnaire and admin routes.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/questionnaire", get(questionnaire::form_definition_handler))
        .route("/questionnaire/validate", post(questionnaire::validate_handler))
        .route("/questionnaire/draft", put(questionnaire::draft_handler))
        .route("/questionnaire/submit", post(questionnaire::submit_handler))
        .route("/admin/records", get(admin::list_records_handler))
        .route("/admin/records/export", get(admin::export_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
