pub mod domain;
pub mod ports;
pub mod questionnaire;
pub mod scoring;

pub use domain::{
    AuthSession, Gender, ItemResponse, Occupation, PatientInfo, QuestionnaireForm, RecordTable,
    ResponseRecord, Retinopathy, Role, CSV_COLUMNS, TIMESTAMP_FORMAT,
};
pub use ports::{CredentialVerifier, PortError, PortResult, ResponseStore, SessionStore};
pub use questionnaire::{
    responses_from_values, validate_form, FormGate, FormState, GateError, ValidationError,
    QUESTIONS, QUESTION_COUNT,
};
pub use scoring::{score, DistressLevel, PaidScore, ScoreBar};
