//! crates/paid_survey_core/src/questionnaire.rs
//!
//! The fixed PAID-20 questionnaire: item texts, field limits, the required-field
//! validator, and the gate that controls when a form may be submitted.

use std::ops::RangeInclusive;

use serde::Serialize;
use thiserror::Error;

use crate::domain::{ItemResponse, QuestionnaireForm};

pub const QUESTION_COUNT: usize = 20;
pub const PATIENT_ID_MAX_CHARS: usize = 20;
pub const AGE_RANGE: RangeInclusive<u32> = 1..=120;
pub const INCOME_PCT_RANGE: RangeInclusive<u32> = 0..=100;

pub const QUESTIONS: [&str; QUESTION_COUNT] = [
    "Feeling scared when you think about living with diabetes",
    "Worrying about the future and possible serious complications",
    "Feeling overwhelmed by your diabetes regimen",
    "Feeling angry when you think about having diabetes",
    "Feeling depressed when you think about living with diabetes",
    "Coping with complications of diabetes",
    "Feeling alone with your diabetes",
    "Feeling that your friends and family are not supportive of your diabetes management",
    "Feeling that diabetes limits your social life",
    "Worrying about low blood sugar reactions",
    "Feeling discouraged with your diabetes treatment plan",
    "Feeling worried about future complications",
    "Not accepting your diabetes",
    "Feeling that diabetes is taking up too much of your mental and physical energy",
    "Feeling that you are not in control of your diabetes",
    "Worrying about your sexual life because of diabetes",
    "Feeling guilty when you get off track with your diabetes management",
    "Not feeling motivated to keep up your diabetes management",
    "Worrying about your job or studies being affected by diabetes",
    "Feeling burned out from having to manage diabetes",
];

//=========================================================================================
// Validation
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please complete all required patient fields before submission: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: u32,
        max: u32,
        value: u32,
    },
    #[error("Patient ID must be at most {max} characters, got {len}")]
    PatientIdTooLong { max: usize, len: usize },
    #[error("Expected {expected} item responses, got {got}")]
    ResponseCount { expected: usize, got: usize },
    #[error("Item responses must be between 0 and 4, got {0}")]
    InvalidResponse(u8),
}

impl ValidationError {
    /// Names of the required fields that were left empty, if that is the failure.
    pub fn missing_fields(&self) -> &[&'static str] {
        match self {
            ValidationError::MissingFields(fields) => fields,
            _ => &[],
        }
    }
}

/// Checks that every required patient field is filled in and that numeric
/// fields are within the limits of the form.
pub fn validate_form(form: &QuestionnaireForm) -> Result<(), ValidationError> {
    let patient = &form.patient;

    let mut missing = Vec::new();
    if patient.patient_id.trim().is_empty() {
        missing.push("Patient ID");
    }
    if patient.name.trim().is_empty() {
        missing.push("Full Name");
    }
    if patient.gender.is_none() {
        missing.push("Gender");
    }
    if patient.occupation.is_none() {
        missing.push("Occupation");
    }
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    let id_len = patient.patient_id.chars().count();
    if id_len > PATIENT_ID_MAX_CHARS {
        return Err(ValidationError::PatientIdTooLong {
            max: PATIENT_ID_MAX_CHARS,
            len: id_len,
        });
    }
    check_range("Age", AGE_RANGE, patient.age)?;
    check_range("% income on medicine", INCOME_PCT_RANGE, patient.income_pct)?;

    Ok(())
}

fn check_range(
    field: &'static str,
    range: RangeInclusive<u32>,
    value: u32,
) -> Result<(), ValidationError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            min: *range.start(),
            max: *range.end(),
            value,
        })
    }
}

/// Converts raw answer values (one per question, in order) into responses.
pub fn responses_from_values(
    values: &[u8],
) -> Result<[ItemResponse; QUESTION_COUNT], ValidationError> {
    if values.len() != QUESTION_COUNT {
        return Err(ValidationError::ResponseCount {
            expected: QUESTION_COUNT,
            got: values.len(),
        });
    }
    let mut responses = [ItemResponse::default(); QUESTION_COUNT];
    for (slot, value) in responses.iter_mut().zip(values) {
        *slot = ItemResponse::try_from(*value)?;
    }
    Ok(responses)
}

//=========================================================================================
// Submission Gate
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("Validate the form before submitting.")]
    NotValidated,
    #[error("The form changed after it was validated. Validate it again before submitting.")]
    Stale,
}

/// Externally visible state of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormState {
    Unvalidated,
    Validated,
    Stale,
}

/// Tracks whether the form currently being entered may be submitted.
///
/// A successful validation remembers the exact form that passed. Any later
/// edit that changes the form moves the gate to `Stale`, and submission is
/// only allowed for the form that was validated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormGate {
    #[default]
    Unvalidated,
    Validated(Box<QuestionnaireForm>),
    Stale,
}

impl FormGate {
    pub fn state(&self) -> FormState {
        match self {
            FormGate::Unvalidated => FormState::Unvalidated,
            FormGate::Validated(_) => FormState::Validated,
            FormGate::Stale => FormState::Stale,
        }
    }

    /// Runs the validator. On failure the gate is closed.
    pub fn validate(&mut self, form: &QuestionnaireForm) -> Result<(), ValidationError> {
        match validate_form(form) {
            Ok(()) => {
                *self = FormGate::Validated(Box::new(form.clone()));
                Ok(())
            }
            Err(e) => {
                *self = FormGate::Unvalidated;
                Err(e)
            }
        }
    }

    /// Records the current contents of the form after an edit.
    pub fn record_edit(&mut self, form: &QuestionnaireForm) {
        if let FormGate::Validated(validated) = self {
            if **validated != *form {
                *self = FormGate::Stale;
            }
        }
    }

    /// Checks that `form` is exactly the form that passed validation.
    pub fn authorize_submit(&mut self, form: &QuestionnaireForm) -> Result<(), GateError> {
        self.record_edit(form);
        match self {
            FormGate::Validated(_) => Ok(()),
            FormGate::Stale => Err(GateError::Stale),
            FormGate::Unvalidated => Err(GateError::NotValidated),
        }
    }

    /// Like `authorize_submit`, but also closes the gate on success, so one
    /// validation admits exactly one submission.
    pub fn claim_submit(&mut self, form: &QuestionnaireForm) -> Result<(), GateError> {
        self.authorize_submit(form)?;
        self.reset();
        Ok(())
    }

    /// Gives a claimed form its validation back after it could not be stored.
    /// Does nothing if the gate was used again in the meantime.
    pub fn reopen(&mut self, form: &QuestionnaireForm) {
        if *self == FormGate::Unvalidated {
            *self = FormGate::Validated(Box::new(form.clone()));
        }
    }

    pub fn reset(&mut self) {
        *self = FormGate::Unvalidated;
    }
}
