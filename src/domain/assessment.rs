//! Assessment result types.
//!
//! Represents the output of running a trained classifier on one patient,
//! together with the heuristic explanation shown to clinicians.

use serde::{Deserialize, Serialize};

use super::patient::PatientFeatures;
use super::risk::RiskCategory;

/// Number of contributing factors shown per assessment.
pub const TOP_FACTORS: usize = 5;

/// How soon the care team should act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    Routine,
    Soon,
    Immediate,
}

impl Urgency {
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        if probability > 0.7 {
            Self::Immediate
        } else if probability > 0.4 {
            Self::Soon
        } else {
            Self::Routine
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Routine => f.pad("Routine"),
            Self::Soon => f.pad("Soon"),
            Self::Immediate => f.pad("Immediate"),
        }
    }
}

/// Severity tag of a contributing factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Moderate,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Moderate => f.pad("Moderate"),
            Self::High => f.pad("High"),
            Self::Critical => f.pad("Critical"),
        }
    }
}

/// A human-readable risk driver. Points are illustrative and independent of
/// the trained model's coefficients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributingFactor {
    pub name: &'static str,
    pub points: f64,
    pub severity: Severity,
}

/// Heuristic contributing factors, highest points first.
///
/// Returns every triggered factor; callers show the first `TOP_FACTORS`.
#[must_use]
pub fn contributing_factors(f: &PatientFeatures) -> Vec<ContributingFactor> {
    let mut factors = Vec::new();
    let mut push = |name, points, severity| {
        factors.push(ContributingFactor {
            name,
            points,
            severity,
        });
    };

    if f.previous_falls > 0 {
        push(
            "Previous Falls",
            f64::from(f.previous_falls) * 15.0,
            Severity::Critical,
        );
    }
    if f.gait_speed < 5.0 {
        push("Poor Gait Speed", (10.0 - f.gait_speed) * 8.0, Severity::High);
    }
    if f.balance_score < 5.0 {
        push("Poor Balance", (10.0 - f.balance_score) * 8.0, Severity::High);
    }
    if f.age > 80 {
        push(
            "Advanced Age",
            (f64::from(f.age) - 65.0) * 0.8,
            Severity::Moderate,
        );
    }
    if f.polypharmacy() {
        push(
            "Polypharmacy",
            f64::from(f.num_medications) * 3.0,
            Severity::Moderate,
        );
    }
    if f.has_parkinsons {
        push("Parkinson's Disease", 20.0, Severity::Critical);
    }
    if f.uses_walking_aid {
        push("Uses Walking Aid", 12.0, Severity::Moderate);
    }
    if f.home_hazards > 3 {
        push(
            "Home Hazards",
            f64::from(f.home_hazards) * 2.0,
            Severity::Moderate,
        );
    }

    // Stable sort keeps insertion order for equal points.
    factors.sort_by(|a, b| b.points.total_cmp(&a.points));
    factors
}

/// Result of a single classifier prediction (before interpretation).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted probability of a fall within six months
    pub probability: f64,

    /// Binary label (true = fall predicted)
    pub label: bool,
}

impl Prediction {
    #[must_use]
    pub fn new(probability: f64, label: bool) -> Self {
        Self { probability, label }
    }

    /// max(p, 1 - p)
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.probability.max(1.0 - self.probability)
    }

    #[must_use]
    pub fn category(&self) -> RiskCategory {
        RiskCategory::from_probability(self.probability)
    }
}

/// Complete assessment record.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    /// Unique identifier
    pub id: String,

    pub patient_id: String,

    /// Intake values the assessment was computed from
    pub features: PatientFeatures,

    pub prediction: Prediction,

    pub category: RiskCategory,

    pub urgency: Urgency,

    /// Probability from the hand-weighted risk function, for comparison
    pub reference_probability: f64,

    /// Top contributing factors, highest first
    pub factors: Vec<ContributingFactor>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Assessment {
    #[must_use]
    pub fn new(
        patient_id: impl Into<String>,
        features: PatientFeatures,
        prediction: Prediction,
        reference_probability: f64,
    ) -> Self {
        let mut factors = contributing_factors(&features);
        factors.truncate(TOP_FACTORS);
        Self {
            id: uuid_v4(),
            patient_id: patient_id.into(),
            category: prediction.category(),
            urgency: Urgency::from_probability(prediction.probability),
            prediction,
            reference_probability,
            factors,
            features,
            created_at: chrono::Utc::now(),
        }
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.prediction.confidence()
    }
}

/// Generate a random UUID v4.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_thresholds() {
        assert_eq!(Urgency::from_probability(0.2), Urgency::Routine);
        assert_eq!(Urgency::from_probability(0.4), Urgency::Routine);
        assert_eq!(Urgency::from_probability(0.55), Urgency::Soon);
        assert_eq!(Urgency::from_probability(0.71), Urgency::Immediate);
    }

    #[test]
    fn test_confidence() {
        assert!((Prediction::new(0.2, false).confidence() - 0.8).abs() < 1e-12);
        assert!((Prediction::new(0.9, true).confidence() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_factors_sorted_descending() {
        let factors = contributing_factors(&PatientFeatures::sample());
        assert!(!factors.is_empty());
        for pair in factors.windows(2) {
            assert!(pair[0].points >= pair[1].points);
        }
        // gait 4.0 -> 48 points, balance 4.5 -> 44 points, falls 2 -> 30 points
        assert_eq!(factors[0].name, "Poor Gait Speed");
        assert_eq!(factors[1].name, "Poor Balance");
        assert_eq!(factors[2].name, "Previous Falls");
    }

    #[test]
    fn test_no_factors_for_healthy_profile() {
        let healthy = PatientFeatures {
            age: 70,
            gait_speed: 8.0,
            balance_score: 8.0,
            num_medications: 2,
            home_hazards: 1,
            ..Default::default()
        };
        assert!(contributing_factors(&healthy).is_empty());
    }

    #[test]
    fn test_assessment_truncates_factors() {
        let features = PatientFeatures {
            age: 90,
            gait_speed: 2.0,
            balance_score: 2.0,
            previous_falls: 3,
            num_medications: 10,
            has_parkinsons: true,
            uses_walking_aid: true,
            home_hazards: 6,
            ..Default::default()
        };
        assert_eq!(contributing_factors(&features).len(), 8);

        let assessment = Assessment::new("PT0042", features, Prediction::new(0.82, true), 0.9);
        assert_eq!(assessment.factors.len(), TOP_FACTORS);
        assert_eq!(assessment.category, RiskCategory::High);
        assert_eq!(assessment.urgency, Urgency::Immediate);
    }

    #[test]
    fn test_uuid_generation() {
        let id1 = uuid_v4();
        let id2 = uuid_v4();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), 36);
    }

    #[test]
    fn test_assessment_serializes_factors() {
        let a = Assessment::new(
            "PT0003",
            PatientFeatures::sample(),
            Prediction::new(0.75, true),
            0.6,
        );
        let json = serde_json::to_value(&a).expect("serialize");
        let names: Vec<&str> = json["factors"]
            .as_array()
            .expect("factors array")
            .iter()
            .filter_map(|f| f["name"].as_str())
            .collect();
        assert!(names.contains(&"Previous Falls"));
        assert_eq!(json["patient_id"], "PT0003");
    }

    #[test]
    fn test_display_honours_width() {
        assert_eq!(format!("[{:<9}]", Urgency::Soon), "[Soon     ]");
        assert_eq!(format!("[{:>8}]", Severity::High), "[    High]");
    }
}
