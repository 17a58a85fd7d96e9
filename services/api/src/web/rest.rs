//! services/api/src/web/rest.rs
//!
//! The health endpoint and the master definition for the OpenAPI specification.

use axum::Json;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::web::{admin, auth, questionnaire};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        questionnaire::form_definition_handler,
        questionnaire::validate_handler,
        questionnaire::draft_handler,
        questionnaire::submit_handler,
        admin::list_records_handler,
        admin::export_handler,
    ),
    components(
        schemas(
            HealthResponse,
            auth::LoginRequest,
            auth::AuthResponse,
            auth::CurrentUserResponse,
            auth::MessageResponse,
            questionnaire::QuestionnaireRequest,
            questionnaire::FormDefinition,
            questionnaire::ValidateResponse,
            questionnaire::FormStateResponse,
            questionnaire::SubmitResponse,
            admin::RecordsResponse,
        )
    ),
    tags(
        (name = "PAID Questionnaire API", description = "Login-gated PAID-20 diabetes distress data entry and export.")
    )
)]
pub struct ApiDoc;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health - Liveness check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
