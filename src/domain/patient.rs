//! Patient intake types for fall-risk assessment.
//!
//! `PatientFeatures` is the model-facing view (everything the classifier and
//! the risk function consume). `PatientRecord` is one row of a cohort CSV and
//! additionally carries the identifier, the derived risk score/category and
//! the observed outcome.

use serde::{Deserialize, Serialize};

use super::risk::{self, RiskCategory};

/// Number of model features.
pub const N_FEATURES: usize = 20;

/// Ordered feature schema expected by every trained model.
///
/// `risk_score` is deliberately absent (it is a deterministic function of
/// these columns and the label is drawn from it). Gender enters as the single
/// `gender_male` indicator.
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "age",
    "bmi",
    "gait_speed",
    "balance_score",
    "muscle_strength",
    "previous_falls",
    "num_medications",
    "takes_sedatives",
    "takes_blood_pressure_meds",
    "has_arthritis",
    "has_osteoporosis",
    "has_parkinsons",
    "has_diabetes",
    "vision_impairment",
    "cognitive_score",
    "uses_walking_aid",
    "lives_alone",
    "home_hazards",
    "activity_level",
    "gender_male",
];

/// Patient gender as recorded at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl Gender {
    /// Numeric indicator used by the models (1 = male).
    #[must_use]
    pub fn indicator(self) -> f64 {
        match self {
            Self::Male => 1.0,
            Self::Female => 0.0,
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Male => Self::Female,
            Self::Female => Self::Male,
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Male => f.pad("Male"),
            Self::Female => f.pad("Female"),
        }
    }
}

/// Clinical and functional intake variables.
///
/// Functional scores (gait, balance, strength, cognition, activity) are on a
/// 0–10 scale where higher is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientFeatures {
    /// Age in whole years (65–95)
    pub age: u32,
    pub gender: Gender,
    /// Body mass index (kg/m²)
    pub bmi: f64,
    pub gait_speed: f64,
    pub balance_score: f64,
    pub muscle_strength: f64,
    /// Falls in the last 12 months (0–10)
    pub previous_falls: u32,
    /// Total prescribed medications (0–15)
    pub num_medications: u32,
    pub takes_sedatives: bool,
    pub takes_blood_pressure_meds: bool,
    pub has_arthritis: bool,
    pub has_osteoporosis: bool,
    pub has_parkinsons: bool,
    pub has_diabetes: bool,
    pub vision_impairment: bool,
    pub cognitive_score: f64,
    pub uses_walking_aid: bool,
    pub lives_alone: bool,
    /// Count of identified home hazards (0–10)
    pub home_hazards: u32,
    pub activity_level: f64,
}

impl Default for PatientFeatures {
    /// Intake form defaults.
    fn default() -> Self {
        Self {
            age: 75,
            gender: Gender::Male,
            bmi: 27.0,
            gait_speed: 5.0,
            balance_score: 5.0,
            muscle_strength: 5.0,
            previous_falls: 0,
            num_medications: 3,
            takes_sedatives: false,
            takes_blood_pressure_meds: false,
            has_arthritis: false,
            has_osteoporosis: false,
            has_parkinsons: false,
            has_diabetes: false,
            vision_impairment: false,
            cognitive_score: 7.0,
            uses_walking_aid: false,
            lives_alone: false,
            home_hazards: 2,
            activity_level: 5.0,
        }
    }
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

impl PatientFeatures {
    /// Convert features to a vector in `FEATURE_NAMES` order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            f64::from(self.age),
            self.bmi,
            self.gait_speed,
            self.balance_score,
            self.muscle_strength,
            f64::from(self.previous_falls),
            f64::from(self.num_medications),
            flag(self.takes_sedatives),
            flag(self.takes_blood_pressure_meds),
            flag(self.has_arthritis),
            flag(self.has_osteoporosis),
            flag(self.has_parkinsons),
            flag(self.has_diabetes),
            flag(self.vision_impairment),
            self.cognitive_score,
            flag(self.uses_walking_aid),
            flag(self.lives_alone),
            f64::from(self.home_hazards),
            self.activity_level,
            self.gender.indicator(),
        ]
    }

    /// Feature values paired with their schema names.
    #[must_use]
    pub fn named_values(&self) -> Vec<(&'static str, f64)> {
        FEATURE_NAMES.iter().copied().zip(self.to_vec()).collect()
    }

    /// Create features from a vector in `FEATURE_NAMES` order.
    ///
    /// # Errors
    /// Returns error if the length is wrong, a flag is not 0/1, or a count is
    /// negative or fractional.
    pub fn from_vec(v: &[f64]) -> Result<Self, String> {
        if v.len() != N_FEATURES {
            return Err(format!("Expected {N_FEATURES} features, got {}", v.len()));
        }

        let as_flag = |i: usize| -> Result<bool, String> {
            match v[i] {
                x if x == 0.0 => Ok(false),
                x if x == 1.0 => Ok(true),
                x => Err(format!("{} must be 0 or 1, got {x}", FEATURE_NAMES[i])),
            }
        };
        let as_count = |i: usize| -> Result<u32, String> {
            let x = v[i];
            if x < 0.0 || x.fract() != 0.0 || x > f64::from(u32::MAX) {
                return Err(format!(
                    "{} must be a non-negative integer, got {x}",
                    FEATURE_NAMES[i]
                ));
            }
            Ok(x as u32)
        };

        Ok(Self {
            age: as_count(0)?,
            bmi: v[1],
            gait_speed: v[2],
            balance_score: v[3],
            muscle_strength: v[4],
            previous_falls: as_count(5)?,
            num_medications: as_count(6)?,
            takes_sedatives: as_flag(7)?,
            takes_blood_pressure_meds: as_flag(8)?,
            has_arthritis: as_flag(9)?,
            has_osteoporosis: as_flag(10)?,
            has_parkinsons: as_flag(11)?,
            has_diabetes: as_flag(12)?,
            vision_impairment: as_flag(13)?,
            cognitive_score: v[14],
            uses_walking_aid: as_flag(15)?,
            lives_alone: as_flag(16)?,
            home_hazards: as_count(17)?,
            activity_level: v[18],
            gender: if as_flag(19)? { Gender::Male } else { Gender::Female },
        })
    }

    /// Validate that all features are within the intake ranges.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !(65..=95).contains(&self.age) {
            errors.push(format!("Age {} out of range [65, 95]", self.age));
        }
        if !self.bmi.is_finite() || !(15.0..=45.0).contains(&self.bmi) {
            errors.push(format!("BMI {} out of range [15, 45]", self.bmi));
        }
        for (name, value) in [
            ("Gait speed", self.gait_speed),
            ("Balance score", self.balance_score),
            ("Muscle strength", self.muscle_strength),
            ("Cognitive score", self.cognitive_score),
            ("Activity level", self.activity_level),
        ] {
            if !value.is_finite() || !(0.0..=10.0).contains(&value) {
                errors.push(format!("{name} {value} out of range [0, 10]"));
            }
        }
        if self.previous_falls > 10 {
            errors.push(format!(
                "Previous falls {} out of range [0, 10]",
                self.previous_falls
            ));
        }
        if self.num_medications > 15 {
            errors.push(format!(
                "Medications {} out of range [0, 15]",
                self.num_medications
            ));
        }
        if self.home_hazards > 10 {
            errors.push(format!(
                "Home hazards {} out of range [0, 10]",
                self.home_hazards
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Walking-aid rule used by the generator.
    #[must_use]
    pub fn needs_walking_aid(&self) -> bool {
        self.gait_speed < 5.0 || self.balance_score < 5.0 || self.previous_falls > 2
    }

    /// More than five concurrent medications.
    #[must_use]
    pub fn polypharmacy(&self) -> bool {
        self.num_medications > 5
    }

    /// A representative moderate-to-high risk profile for demos.
    #[must_use]
    pub fn sample() -> Self {
        Self {
            age: 82,
            gender: Gender::Female,
            bmi: 24.5,
            gait_speed: 4.0,
            balance_score: 4.5,
            muscle_strength: 5.0,
            previous_falls: 2,
            num_medications: 7,
            takes_sedatives: true,
            takes_blood_pressure_meds: true,
            has_arthritis: true,
            has_osteoporosis: true,
            has_parkinsons: false,
            has_diabetes: false,
            vision_impairment: true,
            cognitive_score: 6.5,
            uses_walking_aid: true,
            lives_alone: true,
            home_hazards: 4,
            activity_level: 3.5,
        }
    }
}

/// Body mass index band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    #[must_use]
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }
}

impl std::fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Underweight => f.pad("Underweight"),
            Self::Normal => f.pad("Normal"),
            Self::Overweight => f.pad("Overweight"),
            Self::Obese => f.pad("Obese"),
        }
    }
}

/// Qualitative reading of a 0–10 functional score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreFeedback {
    Critical,
    BelowAverage,
    Good,
}

impl ScoreFeedback {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score < 3.0 {
            Self::Critical
        } else if score < 5.0 {
            Self::BelowAverage
        } else {
            Self::Good
        }
    }
}

impl std::fmt::Display for ScoreFeedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => f.pad("Critical"),
            Self::BelowAverage => f.pad("Below average"),
            Self::Good => f.pad("Good"),
        }
    }
}

/// One row of a cohort CSV.
///
/// Field order is the column order on disk. Booleans are written as 0/1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub patient_id: String,
    pub age: u32,
    pub gender: Gender,
    pub bmi: f64,
    pub gait_speed: f64,
    pub balance_score: f64,
    pub muscle_strength: f64,
    pub previous_falls: u32,
    pub num_medications: u32,
    #[serde(with = "flag01")]
    pub takes_sedatives: bool,
    #[serde(with = "flag01")]
    pub takes_blood_pressure_meds: bool,
    #[serde(with = "flag01")]
    pub has_arthritis: bool,
    #[serde(with = "flag01")]
    pub has_osteoporosis: bool,
    #[serde(with = "flag01")]
    pub has_parkinsons: bool,
    #[serde(with = "flag01")]
    pub has_diabetes: bool,
    #[serde(with = "flag01")]
    pub vision_impairment: bool,
    pub cognitive_score: f64,
    #[serde(with = "flag01")]
    pub uses_walking_aid: bool,
    #[serde(with = "flag01")]
    pub lives_alone: bool,
    pub home_hazards: u32,
    pub activity_level: f64,
    pub risk_score: f64,
    pub risk_category: RiskCategory,
    #[serde(with = "flag01")]
    pub actual_fall_6months: bool,
}

impl PatientRecord {
    /// Assemble a row from its features, the fall probability and the
    /// sampled outcome. `risk_score` is stored with one decimal and the
    /// category is derived from the stored value.
    #[must_use]
    pub fn new(
        patient_id: impl Into<String>,
        f: &PatientFeatures,
        probability: f64,
        fell: bool,
    ) -> Self {
        let risk_score = risk::round1(probability * 100.0);
        Self {
            patient_id: patient_id.into(),
            age: f.age,
            gender: f.gender,
            bmi: f.bmi,
            gait_speed: f.gait_speed,
            balance_score: f.balance_score,
            muscle_strength: f.muscle_strength,
            previous_falls: f.previous_falls,
            num_medications: f.num_medications,
            takes_sedatives: f.takes_sedatives,
            takes_blood_pressure_meds: f.takes_blood_pressure_meds,
            has_arthritis: f.has_arthritis,
            has_osteoporosis: f.has_osteoporosis,
            has_parkinsons: f.has_parkinsons,
            has_diabetes: f.has_diabetes,
            vision_impairment: f.vision_impairment,
            cognitive_score: f.cognitive_score,
            uses_walking_aid: f.uses_walking_aid,
            lives_alone: f.lives_alone,
            home_hazards: f.home_hazards,
            activity_level: f.activity_level,
            risk_score,
            risk_category: RiskCategory::from_score(risk_score),
            actual_fall_6months: fell,
        }
    }

    /// Model-facing view of this row.
    #[must_use]
    pub fn features(&self) -> PatientFeatures {
        PatientFeatures {
            age: self.age,
            gender: self.gender,
            bmi: self.bmi,
            gait_speed: self.gait_speed,
            balance_score: self.balance_score,
            muscle_strength: self.muscle_strength,
            previous_falls: self.previous_falls,
            num_medications: self.num_medications,
            takes_sedatives: self.takes_sedatives,
            takes_blood_pressure_meds: self.takes_blood_pressure_meds,
            has_arthritis: self.has_arthritis,
            has_osteoporosis: self.has_osteoporosis,
            has_parkinsons: self.has_parkinsons,
            has_diabetes: self.has_diabetes,
            vision_impairment: self.vision_impairment,
            cognitive_score: self.cognitive_score,
            uses_walking_aid: self.uses_walking_aid,
            lives_alone: self.lives_alone,
            home_hazards: self.home_hazards,
            activity_level: self.activity_level,
        }
    }
}

/// Serde adapter writing booleans as `0`/`1`.
mod flag01 {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        match u8::deserialize(d)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(de::Error::custom(format!("expected 0 or 1, got {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_features_to_vec_order() {
        let features = PatientFeatures::sample();
        let vec = features.to_vec();
        assert_eq!(vec.len(), N_FEATURES);
        assert!((vec[0] - 82.0).abs() < f64::EPSILON);
        assert!((vec[5] - 2.0).abs() < f64::EPSILON);
        // Female
        assert!(vec[19].abs() < f64::EPSILON);
    }

    #[test]
    fn test_features_from_vec() {
        let original = PatientFeatures::sample();
        let parsed = PatientFeatures::from_vec(&original.to_vec()).expect("Should parse");
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_from_vec_rejects_bad_flag() {
        let mut v = PatientFeatures::default().to_vec();
        v[7] = 0.5;
        let err = PatientFeatures::from_vec(&v).unwrap_err();
        assert!(err.contains("takes_sedatives"));
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        assert!(PatientFeatures::from_vec(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_validation() {
        assert!(PatientFeatures::default().validate().is_ok());
        assert!(PatientFeatures::sample().validate().is_ok());

        let invalid = PatientFeatures {
            age: 40,
            gait_speed: 11.0,
            num_medications: 20,
            ..Default::default()
        };
        let errors = invalid.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_feature_names_unique() {
        let mut names = FEATURE_NAMES.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), N_FEATURES);
        assert!(!FEATURE_NAMES.contains(&"risk_score"));
        assert_eq!(
            FEATURE_NAMES.iter().filter(|n| n.starts_with("gender")).count(),
            1
        );
    }

    #[test]
    fn test_bmi_category() {
        assert_eq!(BmiCategory::from_bmi(17.0), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(27.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::Obese);
    }

    #[test]
    fn test_score_feedback() {
        assert_eq!(ScoreFeedback::from_score(2.5), ScoreFeedback::Critical);
        assert_eq!(ScoreFeedback::from_score(4.9), ScoreFeedback::BelowAverage);
        assert_eq!(ScoreFeedback::from_score(5.0), ScoreFeedback::Good);
    }

    #[test]
    fn test_record_roundtrip_features() {
        let features = PatientFeatures::sample();
        let record = PatientRecord::new("PT0001", &features, 0.6543, true);
        assert_eq!(record.features(), features);
        assert!((record.risk_score - 65.4).abs() < 1e-9);
        assert_eq!(record.risk_category, RiskCategory::High);
    }
}
