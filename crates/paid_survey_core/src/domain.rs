//! crates/paid_survey_core/src/domain.rs
//!
//! Defines the pure, core data structures for the questionnaire service.
//! These structs are independent of the HTTP layer and of the storage format.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::questionnaire::{FormGate, ValidationError, QUESTION_COUNT};
use crate::scoring::{score, PaidScore};

/// Format used for the `Timestamp` column of the data file.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Column order of the data file. The header row is exactly this list.
pub const CSV_COLUMNS: [&str; 33] = [
    "Timestamp",
    "Enumerator",
    "Patient_ID",
    "Name",
    "Age",
    "Gender",
    "Occupation",
    "%_Income_on_Medicine",
    "#_Follow_Up_Visits",
    "Diabetic_Retinopathy",
    "Q1",
    "Q2",
    "Q3",
    "Q4",
    "Q5",
    "Q6",
    "Q7",
    "Q8",
    "Q9",
    "Q10",
    "Q11",
    "Q12",
    "Q13",
    "Q14",
    "Q15",
    "Q16",
    "Q17",
    "Q18",
    "Q19",
    "Q20",
    "Raw_Score",
    "PAID_Score",
    "Distress_Level",
];

//=========================================================================================
// Users and Sessions
//=========================================================================================

/// The two kinds of authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Enumerator,
}

impl Role {
    /// Derives the role from a username. Only "admin" (any letter case) is an admin.
    pub fn for_username(username: &str) -> Self {
        if username.trim().to_lowercase() == "admin" {
            Role::Admin
        } else {
            Role::Enumerator
        }
    }
}

/// A browser login session (auth cookie) together with its questionnaire gate.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub form_gate: FormGate,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

//=========================================================================================
// Patient Information
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Occupation {
    Student,
    #[serde(rename = "Corporate Sector")]
    CorporateSector,
    #[serde(rename = "Govt Sector")]
    GovtSector,
    Business,
    #[serde(rename = "Self-employed")]
    SelfEmployed,
}

impl Occupation {
    pub const ALL: [Occupation; 5] = [
        Occupation::Student,
        Occupation::CorporateSector,
        Occupation::GovtSector,
        Occupation::Business,
        Occupation::SelfEmployed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Occupation::Student => "Student",
            Occupation::CorporateSector => "Corporate Sector",
            Occupation::GovtSector => "Govt Sector",
            Occupation::Business => "Business",
            Occupation::SelfEmployed => "Self-employed",
        }
    }
}

/// Answer to "Do you have Diabetic Retinopathy?". The form preselects `Yes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Retinopathy {
    #[default]
    Yes,
    No,
}

impl Retinopathy {
    pub fn label(self) -> &'static str {
        match self {
            Retinopathy::Yes => "Yes",
            Retinopathy::No => "No",
        }
    }
}

/// Patient fields of the questionnaire. `None` for gender or occupation is the
/// unselected state of the dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientInfo {
    pub patient_id: String,
    pub name: String,
    pub age: u32,
    pub gender: Option<Gender>,
    pub occupation: Option<Occupation>,
    pub income_pct: u32,
    pub follow_ups: u32,
    pub retinopathy: Retinopathy,
}

impl Default for PatientInfo {
    fn default() -> Self {
        Self {
            patient_id: String::new(),
            name: String::new(),
            age: 1,
            gender: None,
            occupation: None,
            income_pct: 0,
            follow_ups: 0,
            retinopathy: Retinopathy::default(),
        }
    }
}

//=========================================================================================
// Item Responses
//=========================================================================================

/// One answer on the 5-point PAID scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ItemResponse {
    #[default]
    NotAProblem,
    Minor,
    Moderate,
    SomewhatSerious,
    Serious,
}

impl ItemResponse {
    pub const ALL: [ItemResponse; 5] = [
        ItemResponse::NotAProblem,
        ItemResponse::Minor,
        ItemResponse::Moderate,
        ItemResponse::SomewhatSerious,
        ItemResponse::Serious,
    ];

    pub fn value(self) -> u8 {
        match self {
            ItemResponse::NotAProblem => 0,
            ItemResponse::Minor => 1,
            ItemResponse::Moderate => 2,
            ItemResponse::SomewhatSerious => 3,
            ItemResponse::Serious => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ItemResponse::NotAProblem => "Not a problem (0)",
            ItemResponse::Minor => "Minor problem (1)",
            ItemResponse::Moderate => "Moderate problem (2)",
            ItemResponse::SomewhatSerious => "Somewhat serious problem (3)",
            ItemResponse::Serious => "Serious problem (4)",
        }
    }

    /// Looks up a response by its display label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.label() == label)
    }
}

impl TryFrom<u8> for ItemResponse {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(ValidationError::InvalidResponse(value))
    }
}

impl From<ItemResponse> for u8 {
    fn from(response: ItemResponse) -> Self {
        response.value()
    }
}

/// A completed questionnaire as entered by an enumerator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionnaireForm {
    pub patient: PatientInfo,
    pub responses: [ItemResponse; QUESTION_COUNT],
}

//=========================================================================================
// Stored Records
//=========================================================================================

/// One submitted questionnaire. The score is always derived from the responses.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRecord {
    pub timestamp: NaiveDateTime,
    pub enumerator: String,
    pub form: QuestionnaireForm,
    pub score: PaidScore,
}

impl ResponseRecord {
    pub fn new(timestamp: NaiveDateTime, enumerator: &str, form: QuestionnaireForm) -> Self {
        let score = score(&form.responses);
        Self {
            timestamp,
            enumerator: enumerator.to_string(),
            form,
            score,
        }
    }

    /// The cells of this record in `CSV_COLUMNS` order.
    pub fn to_row(&self) -> Vec<String> {
        let patient = &self.form.patient;
        let mut row = Vec::with_capacity(CSV_COLUMNS.len());
        row.push(self.timestamp.format(TIMESTAMP_FORMAT).to_string());
        row.push(self.enumerator.clone());
        row.push(patient.patient_id.clone());
        row.push(patient.name.clone());
        row.push(patient.age.to_string());
        row.push(patient.gender.map(Gender::label).unwrap_or_default().to_string());
        row.push(
            patient
                .occupation
                .map(Occupation::label)
                .unwrap_or_default()
                .to_string(),
        );
        row.push(patient.income_pct.to_string());
        row.push(patient.follow_ups.to_string());
        row.push(patient.retinopathy.label().to_string());
        row.extend(self.form.responses.iter().map(|r| r.value().to_string()));
        row.push(self.score.raw.to_string());
        row.push(format!("{:.2}", self.score.paid));
        row.push(self.score.level.label().to_string());
        row
    }
}

/// The stored data as an untyped table, as shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RecordTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
