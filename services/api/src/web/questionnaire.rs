//! services/api/src/web/questionnaire.rs
//!
//! Enumerator endpoints: the form definition, validation, draft edits, and
//! scored submission.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Local;
use paid_survey_core::domain::{
    AuthSession, Gender, ItemResponse, Occupation, PatientInfo, QuestionnaireForm,
    ResponseRecord, Retinopathy, Role,
};
use paid_survey_core::ports::PortError;
use paid_survey_core::questionnaire::{
    responses_from_values, FormGate, FormState, ValidationError, AGE_RANGE, INCOME_PCT_RANGE,
    PATIENT_ID_MAX_CHARS, QUESTIONS, QUESTION_COUNT,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::web::middleware::ensure_role;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// The questionnaire as entered on the form. Omitted fields take the form's
/// initial values.
#[derive(Deserialize, ToSchema)]
pub struct QuestionnaireRequest {
    #[serde(default)]
    pub patient_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_age")]
    pub age: u32,
    /// `null` or omitted when nothing is selected.
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "Female")]
    pub gender: Option<Gender>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "Govt Sector")]
    pub occupation: Option<Occupation>,
    #[serde(default)]
    pub income_pct: u32,
    #[serde(default)]
    pub follow_ups: u32,
    #[serde(default)]
    #[schema(value_type = String, example = "No")]
    pub retinopathy: Retinopathy,
    /// One value from 0 to 4 per question, in question order.
    #[serde(default = "default_responses")]
    pub responses: Vec<u8>,
}

fn default_age() -> u32 {
    *AGE_RANGE.start()
}

fn default_responses() -> Vec<u8> {
    vec![ItemResponse::default().value(); QUESTION_COUNT]
}

impl QuestionnaireRequest {
    pub fn into_form(self) -> Result<QuestionnaireForm, ValidationError> {
        Ok(QuestionnaireForm {
            responses: responses_from_values(&self.responses)?,
            patient: PatientInfo {
                patient_id: self.patient_id,
                name: self.name,
                age: self.age,
                gender: self.gender,
                occupation: self.occupation,
                income_pct: self.income_pct,
                follow_ups: self.follow_ups,
                retinopathy: self.retinopathy,
            },
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct QuestionItem {
    pub number: usize,
    pub text: &'static str,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseOption {
    pub label: &'static str,
    pub value: u8,
}

#[derive(Serialize, ToSchema)]
pub struct FieldLimits {
    pub patient_id_max_chars: usize,
    pub age_min: u32,
    pub age_max: u32,
    pub income_pct_min: u32,
    pub income_pct_max: u32,
}

/// Everything a client needs to render the questionnaire.
#[derive(Serialize, ToSchema)]
pub struct FormDefinition {
    pub enumerator: String,
    pub questions: Vec<QuestionItem>,
    pub response_options: Vec<ResponseOption>,
    pub genders: Vec<&'static str>,
    pub occupations: Vec<&'static str>,
    pub retinopathy_options: Vec<&'static str>,
    pub limits: FieldLimits,
}

#[derive(Serialize, ToSchema)]
pub struct ValidateResponse {
    pub validated: bool,
    pub message: String,
    /// Required fields left empty, when that is why validation failed.
    pub missing_fields: Vec<&'static str>,
}

#[derive(Serialize, ToSchema)]
pub struct FormStateResponse {
    #[schema(value_type = String, example = "stale")]
    pub form_state: FormState,
}

#[derive(Serialize, ToSchema)]
pub struct ScoreBarResponse {
    pub label: &'static str,
    pub value: f64,
}

#[derive(Serialize, ToSchema)]
pub struct SubmitResponse {
    pub message: String,
    pub headline: String,
    pub patient_id: String,
    pub raw_score: u8,
    pub paid_score: f64,
    pub distress_level: &'static str,
    /// Raw and PAID score for the comparison chart.
    pub summary: Vec<ScoreBarResponse>,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Runs `change` on the session's form gate as a single step in the session
/// store and returns what it produced.
async fn update_gate<T, F>(
    state: &AppState,
    session: &AuthSession,
    change: F,
) -> Result<T, (StatusCode, String)>
where
    F: FnOnce(&mut FormGate) -> T + Send,
    T: Send,
{
    let mut change = Some(change);
    let mut outcome = None;
    let result = state
        .sessions
        .update_form_gate(&session.id, &mut |gate: &mut FormGate| {
            if let Some(change) = change.take() {
                outcome = Some(change(gate));
            }
        })
        .await;

    match result {
        Ok(()) => outcome.ok_or_else(|| {
            error!("Form state update for session {} did not run", session.id);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save form state".to_string(),
            )
        }),
        Err(PortError::NotFound(_)) => Err((
            StatusCode::UNAUTHORIZED,
            "Session expired. Please log in again.".to_string(),
        )),
        Err(e) => {
            error!("Failed to save form state for session {}: {:?}", session.id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save form state".to_string(),
            ))
        }
    }
}

fn validation_failure(e: &ValidationError) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ValidateResponse {
            validated: false,
            message: e.to_string(),
            missing_fields: e.missing_fields().to_vec(),
        }),
    )
        .into_response()
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /questionnaire - The questions, choices and field limits of the form
#[utoipa::path(
    get,
    path = "/questionnaire",
    responses(
        (status = 200, description = "Form definition", body = FormDefinition),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not an enumerator")
    )
)]
pub async fn form_definition_handler(
    Extension(session): Extension<AuthSession>,
) -> Result<Json<FormDefinition>, (StatusCode, String)> {
    ensure_role(&session, Role::Enumerator)?;

    Ok(Json(FormDefinition {
        enumerator: session.username,
        questions: QUESTIONS
            .into_iter()
            .enumerate()
            .map(|(i, text)| QuestionItem { number: i + 1, text })
            .collect(),
        response_options: ItemResponse::ALL
            .iter()
            .map(|r| ResponseOption {
                label: r.label(),
                value: r.value(),
            })
            .collect(),
        genders: Gender::ALL.iter().map(|g| g.label()).collect(),
        occupations: Occupation::ALL.iter().map(|o| o.label()).collect(),
        retinopathy_options: vec![Retinopathy::Yes.label(), Retinopathy::No.label()],
        limits: FieldLimits {
            patient_id_max_chars: PATIENT_ID_MAX_CHARS,
            age_min: *AGE_RANGE.start(),
            age_max: *AGE_RANGE.end(),
            income_pct_min: *INCOME_PCT_RANGE.start(),
            income_pct_max: *INCOME_PCT_RANGE.end(),
        },
    }))
}

/// POST /questionnaire/validate - Check required fields and open the submit gate
#[utoipa::path(
    post,
    path = "/questionnaire/validate",
    request_body = QuestionnaireRequest,
    responses(
        (status = 200, description = "All required fields are valid", body = ValidateResponse),
        (status = 422, description = "Required fields missing or out of range", body = ValidateResponse),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not an enumerator")
    )
)]
pub async fn validate_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Json(req): Json<QuestionnaireRequest>,
) -> Result<Response, (StatusCode, String)> {
    ensure_role(&session, Role::Enumerator)?;

    let form = req.into_form();
    let outcome = update_gate(&state, &session, |gate| match form {
        Ok(form) => gate.validate(&form),
        Err(e) => {
            gate.reset();
            Err(e)
        }
    })
    .await?;

    match outcome {
        Ok(()) => {
            info!("User '{}' validated a questionnaire", session.username);
            Ok(Json(ValidateResponse {
                validated: true,
                message: "All required fields are valid. You may now submit.".to_string(),
                missing_fields: Vec::new(),
            })
            .into_response())
        }
        Err(e) => {
            warn!("Validation failed for user '{}': {}", session.username, e);
            Ok(validation_failure(&e))
        }
    }
}

/// PUT /questionnaire/draft - Report the current form contents after an edit
///
/// Changing a validated form closes the submit gate until it is validated again.
#[utoipa::path(
    put,
    path = "/questionnaire/draft",
    request_body = QuestionnaireRequest,
    responses(
        (status = 200, description = "Form state after the edit", body = FormStateResponse),
        (status = 422, description = "Malformed item responses", body = ValidateResponse),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not an enumerator")
    )
)]
pub async fn draft_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Json(req): Json<QuestionnaireRequest>,
) -> Result<Response, (StatusCode, String)> {
    ensure_role(&session, Role::Enumerator)?;

    let form = match req.into_form() {
        Ok(form) => form,
        Err(e) => return Ok(validation_failure(&e)),
    };

    let form_state = update_gate(&state, &session, |gate| {
        gate.record_edit(&form);
        gate.state()
    })
    .await?;

    Ok(Json(FormStateResponse { form_state }).into_response())
}

/// POST /questionnaire/submit - Score the validated form and store it
#[utoipa::path(
    post,
    path = "/questionnaire/submit",
    request_body = QuestionnaireRequest,
    responses(
        (status = 201, description = "Scored and saved", body = SubmitResponse),
        (status = 409, description = "The form was not validated, or changed after validation"),
        (status = 422, description = "Malformed item responses", body = ValidateResponse),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not an enumerator"),
        (status = 500, description = "Failed to save data")
    )
)]
pub async fn submit_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<AuthSession>,
    Json(req): Json<QuestionnaireRequest>,
) -> Result<Response, (StatusCode, String)> {
    ensure_role(&session, Role::Enumerator)?;

    let form = match req.into_form() {
        Ok(form) => form,
        Err(e) => return Ok(validation_failure(&e)),
    };

    // 1. Claim the submit gate; a repeated submit of the same validation finds it closed
    let claim = update_gate(&state, &session, |gate| gate.claim_submit(&form)).await?;
    if let Err(e) = claim {
        warn!("Rejected submission from '{}': {}", session.username, e);
        return Err((StatusCode::CONFLICT, e.to_string()));
    }

    // 2. Score and store, handing the validation back if the write fails
    let record = ResponseRecord::new(Local::now().naive_local(), &session.username, form);
    if let Err(e) = state.records.append_record(&record).await {
        error!("Failed to save questionnaire: {:?}", e);
        update_gate(&state, &session, |gate| gate.reopen(&record.form)).await?;
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to save data".to_string(),
        ));
    }

    let score = record.score;
    info!(
        "User '{}' submitted patient {}: {} ({:.2})",
        session.username,
        record.form.patient.patient_id,
        score.level.label(),
        score.paid
    );

    let response = SubmitResponse {
        message: "Data saved successfully!".to_string(),
        headline: score.headline(),
        patient_id: record.form.patient.patient_id,
        raw_score: score.raw,
        paid_score: score.paid,
        distress_level: score.level.label(),
        summary: score
            .summary()
            .into_iter()
            .map(|bar| ScoreBarResponse {
                label: bar.label,
                value: bar.value,
            })
            .collect(),
    };
    Ok((StatusCode::CREATED, Json(response)).into_response())
}
