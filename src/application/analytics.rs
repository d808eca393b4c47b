//! Analytics service: population statistics over the held-out cohort.

use std::sync::Arc;

use crate::adapters::StorageError;
use crate::domain::{PatientRecord, RiskCategory};
use crate::ports::{CohortStore, Split};
use crate::FallwatchError;

/// Lower bound of the first age band.
const AGE_BAND_START: u32 = 65;
const AGE_BAND_WIDTH: u32 = 5;
const AGE_BAND_COUNT: u32 = 6;

/// Minimum, quartiles and maximum of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiveNumberSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl FiveNumberSummary {
    /// Quartiles use linear interpolation between order statistics.
    /// Returns `None` for an empty sample.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Some(Self {
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Mean risk score of patients in one five-year age band.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeBand {
    /// Inclusive lower age
    pub from: u32,
    /// Inclusive upper age
    pub to: u32,
    pub count: usize,
    pub mean_risk_score: Option<f64>,
}

impl AgeBand {
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}-{}", self.from, self.to)
    }
}

/// Aggregate view of a cohort table.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationSummary {
    pub size: usize,
    /// Low, Medium, High in that order
    pub category_counts: Vec<(RiskCategory, usize)>,
    pub mean_age: f64,
    pub fall_rate: f64,
    pub mean_medications: f64,
    pub high_risk_share: f64,
    pub gait_speed: FiveNumberSummary,
    pub balance_score: FiveNumberSummary,
    pub muscle_strength: FiveNumberSummary,
    pub age_bands: Vec<AgeBand>,
}

impl PopulationSummary {
    /// Summarize a non-empty table.
    ///
    /// # Errors
    /// `EmptyCohort` if there are no rows.
    pub fn from_records(records: &[PatientRecord]) -> Result<Self, FallwatchError> {
        let five = |f: fn(&PatientRecord) -> f64| {
            let values: Vec<f64> = records.iter().map(f).collect();
            FiveNumberSummary::from_values(&values)
                .ok_or_else(|| FallwatchError::EmptyCohort(Split::Test.to_string()))
        };
        let gait_speed = five(|r| r.gait_speed)?;
        let balance_score = five(|r| r.balance_score)?;
        let muscle_strength = five(|r| r.muscle_strength)?;

        let n = records.len() as f64;
        let mean = |f: fn(&PatientRecord) -> f64| records.iter().map(f).sum::<f64>() / n;

        let category_counts: Vec<(RiskCategory, usize)> = RiskCategory::ALL
            .iter()
            .map(|&c| (c, records.iter().filter(|r| r.risk_category == c).count()))
            .collect();
        let high = category_counts
            .iter()
            .find(|(c, _)| *c == RiskCategory::High)
            .map_or(0, |(_, count)| *count);

        let age_bands = (0..AGE_BAND_COUNT)
            .map(|i| {
                let from = AGE_BAND_START + i * AGE_BAND_WIDTH;
                let to = from + AGE_BAND_WIDTH - 1;
                let scores: Vec<f64> = records
                    .iter()
                    .filter(|r| (from..=to).contains(&r.age))
                    .map(|r| r.risk_score)
                    .collect();
                AgeBand {
                    from,
                    to,
                    count: scores.len(),
                    mean_risk_score: (!scores.is_empty())
                        .then(|| scores.iter().sum::<f64>() / scores.len() as f64),
                }
            })
            .collect();

        Ok(Self {
            size: records.len(),
            category_counts,
            mean_age: mean(|r| f64::from(r.age)),
            fall_rate: mean(|r| if r.actual_fall_6months { 1.0 } else { 0.0 }),
            mean_medications: mean(|r| f64::from(r.num_medications)),
            high_risk_share: high as f64 / n,
            gait_speed,
            balance_score,
            muscle_strength,
            age_bands,
        })
    }
}

/// Service for population analytics over the held-out table.
pub struct AnalyticsService<C>
where
    C: CohortStore,
{
    store: Arc<C>,
}

impl<C> AnalyticsService<C>
where
    C: CohortStore,
    C::Error: Into<StorageError>,
{
    /// Create a new analytics service.
    pub fn new(store: Arc<C>) -> Self {
        Self { store }
    }

    /// Summarize the held-out table.
    ///
    /// # Errors
    /// `CohortMissing` if the table does not exist, `EmptyCohort` if it has
    /// no rows, `Storage` if it cannot be parsed.
    pub fn population_summary(&self) -> Result<PopulationSummary, FallwatchError> {
        if !self.store.has_split(Split::Test) {
            return Err(FallwatchError::CohortMissing(format!(
                "{} table has not been generated",
                Split::Test
            )));
        }

        let records = self
            .store
            .load_split(Split::Test)
            .map_err(|e| match e.into() {
                StorageError::NotFound(path) => {
                    FallwatchError::CohortMissing(path.display().to_string())
                }
                other => FallwatchError::Storage(other),
            })?;

        let summary = PopulationSummary::from_records(&records)?;
        tracing::info!(
            "Population summary: {} patients, fall rate {:.1}%, high risk {:.1}%",
            summary.size,
            summary.fall_rate * 100.0,
            summary.high_risk_share * 100.0
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::files::CsvCohortStore;
    use crate::application::CohortGenerator;
    use crate::domain::PatientFeatures;
    use tempfile::tempdir;

    #[test]
    fn test_five_number_summary() {
        let s = FiveNumberSummary::from_values(&[4.0, 1.0, 3.0, 2.0, 5.0]).expect("non-empty");
        assert_eq!(
            s,
            FiveNumberSummary {
                min: 1.0,
                q1: 2.0,
                median: 3.0,
                q3: 4.0,
                max: 5.0
            }
        );

        let even = FiveNumberSummary::from_values(&[1.0, 2.0, 3.0, 4.0]).expect("non-empty");
        assert!((even.median - 2.5).abs() < 1e-12);
        assert!((even.q1 - 1.75).abs() < 1e-12);
        assert!(FiveNumberSummary::from_values(&[]).is_none());
    }

    #[test]
    fn test_summary_on_hand_built_cohort() {
        let young = PatientFeatures {
            age: 66,
            num_medications: 2,
            ..Default::default()
        };
        let old = PatientFeatures {
            age: 91,
            num_medications: 8,
            ..Default::default()
        };
        let records = vec![
            PatientRecord::new("PT0001", &young, 0.20, false),
            PatientRecord::new("PT0002", &young, 0.40, true),
            PatientRecord::new("PT0003", &old, 0.80, true),
            PatientRecord::new("PT0004", &old, 0.70, false),
        ];

        let s = PopulationSummary::from_records(&records).expect("summary");
        assert_eq!(s.size, 4);
        assert_eq!(
            s.category_counts,
            vec![
                (RiskCategory::Low, 1),
                (RiskCategory::Medium, 1),
                (RiskCategory::High, 2)
            ]
        );
        assert!((s.mean_age - 78.5).abs() < 1e-12);
        assert!((s.fall_rate - 0.5).abs() < 1e-12);
        assert!((s.mean_medications - 5.0).abs() < 1e-12);
        assert!((s.high_risk_share - 0.5).abs() < 1e-12);

        assert_eq!(s.age_bands.len(), 6);
        assert_eq!(s.age_bands[0].label(), "65-69");
        assert_eq!(s.age_bands[0].count, 2);
        assert!((s.age_bands[0].mean_risk_score.expect("band") - 30.0).abs() < 1e-9);
        assert_eq!(s.age_bands[5].label(), "90-94");
        assert!((s.age_bands[5].mean_risk_score.expect("band") - 75.0).abs() < 1e-9);
        assert!(s.age_bands[2].mean_risk_score.is_none());
    }

    #[test]
    fn test_population_summary_from_store() {
        let dir = tempdir().expect("tempdir");
        let store = Arc::new(CsvCohortStore::new(dir.path()));
        store
            .save_split(Split::Test, &CohortGenerator::new(42).generate(200))
            .expect("save");

        let s = AnalyticsService::new(store).population_summary().expect("summary");
        assert_eq!(s.size, 200);
        let counted: usize = s.category_counts.iter().map(|(_, c)| c).sum();
        assert_eq!(counted, 200);
        let banded: usize = s.age_bands.iter().map(|b| b.count).sum();
        assert_eq!(banded, 200);
        assert!(s.gait_speed.min <= s.gait_speed.median && s.gait_speed.median <= s.gait_speed.max);
    }

    #[test]
    fn test_missing_table_is_cohort_missing() {
        let dir = tempdir().expect("tempdir");
        let service = AnalyticsService::new(Arc::new(CsvCohortStore::new(dir.path())));
        assert!(matches!(
            service.population_summary(),
            Err(FallwatchError::CohortMissing(_))
        ));
    }

    #[test]
    fn test_empty_table() {
        assert!(matches!(
            PopulationSummary::from_records(&[]),
            Err(FallwatchError::EmptyCohort(_))
        ));
    }
}
