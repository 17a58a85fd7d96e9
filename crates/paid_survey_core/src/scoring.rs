//! crates/paid_survey_core/src/scoring.rs
//!
//! PAID scoring: the raw sum of the 20 item responses, scaled by 1.25 to a
//! 0-100 range, and banded into a distress level.

use serde::Serialize;

use crate::domain::ItemResponse;
use crate::questionnaire::QUESTION_COUNT;

/// Factor that maps the 0-80 raw range onto 0-100.
pub const PAID_WEIGHT: f64 = 1.25;
/// Lowest PAID score in the moderate band.
pub const MODERATE_THRESHOLD: f64 = 40.0;
/// Lowest PAID score in the high band.
pub const HIGH_THRESHOLD: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DistressLevel {
    #[serde(rename = "Low Distress")]
    Low,
    #[serde(rename = "Moderate Distress")]
    Moderate,
    #[serde(rename = "High Distress")]
    High,
}

impl DistressLevel {
    /// Bands a PAID score. Each boundary belongs to the higher band.
    pub fn from_paid_score(paid: f64) -> Self {
        if paid < MODERATE_THRESHOLD {
            DistressLevel::Low
        } else if paid < HIGH_THRESHOLD {
            DistressLevel::Moderate
        } else {
            DistressLevel::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DistressLevel::Low => "Low Distress",
            DistressLevel::Moderate => "Moderate Distress",
            DistressLevel::High => "High Distress",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaidScore {
    pub raw: u8,
    pub paid: f64,
    pub level: DistressLevel,
}

/// One bar of the result chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBar {
    pub label: &'static str,
    pub value: f64,
}

impl PaidScore {
    /// "Your PAID Score is 40.00 / 100"
    pub fn headline(&self) -> String {
        format!("Your PAID Score is {:.2} / 100", self.paid)
    }

    /// Raw and weighted score side by side.
    pub fn summary(&self) -> [ScoreBar; 2] {
        [
            ScoreBar {
                label: "Raw Score",
                value: f64::from(self.raw),
            },
            ScoreBar {
                label: "PAID Score",
                value: self.paid,
            },
        ]
    }
}

pub fn score(responses: &[ItemResponse; QUESTION_COUNT]) -> PaidScore {
    let raw: u8 = responses.iter().map(|r| r.value()).sum();
    let paid = f64::from(raw) * PAID_WEIGHT;
    PaidScore {
        raw,
        paid,
        level: DistressLevel::from_paid_score(paid),
    }
}
