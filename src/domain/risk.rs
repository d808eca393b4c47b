//! Hand-weighted fall-risk score and its logistic probability.
//!
//! This is the function that labels the synthetic cohort. The inference
//! layer also reuses it as a reference value next to the trained model.

use serde::{Deserialize, Serialize};

use super::patient::PatientFeatures;

/// Raw score at which the probability crosses 0.5.
pub const LOGISTIC_CENTER: f64 = 50.0;
/// Divisor controlling the logistic slope.
pub const LOGISTIC_SCALE: f64 = 15.0;

/// Weighted additive risk score. Unbounded; higher is riskier.
///
/// Diabetes, blood-pressure medication, BMI and gender carry no weight.
#[must_use]
pub fn weighted_risk_score(f: &PatientFeatures) -> f64 {
    let mut score = 0.0;

    score += (f64::from(f.age) - 65.0) * 0.5;

    score += (10.0 - f.gait_speed) * 2.5;
    score += (10.0 - f.balance_score) * 2.5;
    score += 10.0 - f.muscle_strength;

    score += f64::from(f.previous_falls) * 5.0;

    score += f64::from(f.num_medications) * 0.8;
    if f.takes_sedatives {
        score += 8.0;
    }

    if f.has_arthritis {
        score += 4.0;
    }
    if f.has_osteoporosis {
        score += 6.0;
    }
    if f.has_parkinsons {
        score += 10.0;
    }

    if f.vision_impairment {
        score += 5.0;
    }
    score += (10.0 - f.cognitive_score) * 0.5;

    if f.uses_walking_aid {
        score += 3.0;
    }
    score += f64::from(f.home_hazards) * 0.8;
    if f.lives_alone {
        score += 2.0;
    }

    score -= f.activity_level * 1.5;

    score
}

/// Logistic squash of a raw risk score into (0, 1).
#[must_use]
pub fn logistic(score: f64) -> f64 {
    1.0 / (1.0 + (-(score - LOGISTIC_CENTER) / LOGISTIC_SCALE).exp())
}

/// Six-month fall probability for a patient.
#[must_use]
pub fn fall_probability(f: &PatientFeatures) -> f64 {
    logistic(weighted_risk_score(f))
}

/// Round to one decimal place.
#[must_use]
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Ordinal risk bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    /// risk score below 30
    Low,
    /// 30 up to (not including) 60
    Medium,
    /// 60 and above
    High,
}

impl RiskCategory {
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Bucket a 0–100 risk score. Intervals are closed-open except the top.
    #[must_use]
    pub fn from_score(risk_score: f64) -> Self {
        if risk_score < 30.0 {
            Self::Low
        } else if risk_score < 60.0 {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Bucket a probability in [0, 1].
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        Self::from_score(probability * 100.0)
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk - maintain current prevention",
            Self::Medium => "Medium risk - preventive measures recommended",
            Self::High => "High risk - immediate action required",
        }
    }

    /// Associated color for TUI display (RGB).
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Self::Low => (16, 185, 129),     // Emerald (#10B981)
            Self::Medium => (251, 191, 36),  // Amber (#FBBF24)
            Self::High => (244, 63, 94),     // Rose (#F43F5E)
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => f.pad("Low"),
            Self::Medium => f.pad("Medium"),
            Self::High => f.pad("High"),
        }
    }
}
