//! services/api/src/web/admin.rs
//!
//! Admin dashboard endpoints: view and download the stored questionnaire data.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use paid_survey_core::domain::{AuthSession, Role};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::web::middleware::ensure_role;
use crate::web::state::AppState;

/// File name offered to the browser for the CSV download.
pub const EXPORT_FILE_NAME: &str = "paid_data.csv";

const NO_DATA_MESSAGE: &str = "No data available yet.";

#[derive(Serialize, ToSchema)]
pub struct RecordsResponse {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total: usize,
    /// Set when there is nothing to show yet.
    pub message: Option<String>,
}

/// GET /admin/records - All stored questionnaire rows
#[utoipa::path(
    get,
    path = "/admin/records",
    responses(
        (status = 200, description = "Stored records, or an empty table with a message", body = RecordsResponse),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not the admin"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_records_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
) -> Result<Json<RecordsResponse>, (StatusCode, String)> {
    ensure_role(&session, Role::Admin)?;

    let table = state.records.list_records().await.map_err(|e| {
        error!("Failed to read stored records: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to read data".to_string(),
        )
    })?;

    let response = match table {
        Some(table) => RecordsResponse {
            total: table.len(),
            columns: table.columns,
            rows: table.rows,
            message: None,
        },
        None => RecordsResponse {
            columns: Vec::new(),
            rows: Vec::new(),
            total: 0,
            message: Some(NO_DATA_MESSAGE.to_string()),
        },
    };
    Ok(Json(response))
}

/// GET /admin/records/export - Download the stored data as CSV
#[utoipa::path(
    get,
    path = "/admin/records/export",
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv"),
        (status = 404, description = "No data available yet"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not the admin"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn export_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    ensure_role(&session, Role::Admin)?;

    let data = state
        .records
        .export()
        .await
        .map_err(|e| {
            error!("Failed to export stored records: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to export data".to_string(),
            )
        })?
        .ok_or((StatusCode::NOT_FOUND, NO_DATA_MESSAGE.to_string()))?;

    info!("Admin '{}' exported {} bytes", session.username, data.len());
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        data,
    ))
}
