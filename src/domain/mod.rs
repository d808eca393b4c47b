//! Domain layer: Core business types and logic.
//!
//! Pure types and functions with no I/O: patient intake, the hand-weighted
//! risk function, assessments, care plans and evaluation metrics.

mod assessment;
mod metrics;
mod patient;
mod recommendation;
pub mod risk;

pub use assessment::{
    contributing_factors, Assessment, ContributingFactor, Prediction, Severity, Urgency,
    TOP_FACTORS,
};
pub use metrics::{roc_auc, ConfusionMatrix, EvaluationMetrics, MetricsError, ModelMetadata};
pub use patient::{
    BmiCategory, Gender, PatientFeatures, PatientRecord, ScoreFeedback, FEATURE_NAMES,
    N_FEATURES,
};
pub use recommendation::{care_plan, Action, CarePlan};
pub use risk::{fall_probability, weighted_risk_score, RiskCategory};
