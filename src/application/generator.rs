//! Synthetic cohort generator.
//!
//! Produces correlated elderly-patient records whose fall outcome is drawn
//! from the hand-weighted risk function. All draws come from one seeded
//! ChaCha20 stream, in a fixed order per record, so the same seed and counts
//! always produce byte-identical tables.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, Poisson, StandardNormal};

use crate::domain::risk::{fall_probability, round1};
use crate::domain::{Gender, PatientFeatures, PatientRecord, RiskCategory};
use crate::ports::{CohortStore, Split};
use crate::FallwatchError;

/// Default training table size.
pub const DEFAULT_TRAIN_SIZE: usize = 800;
/// Default held-out table size.
pub const DEFAULT_TEST_SIZE: usize = 200;

/// Seeded record generator. IDs continue across calls to `generate`.
pub struct CohortGenerator {
    rng: ChaCha20Rng,
    next_id: usize,
}

impl CohortGenerator {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Draw `count` records.
    pub fn generate(&mut self, count: usize) -> Vec<PatientRecord> {
        (0..count).map(|_| self.next_record()).collect()
    }

    /// Draw a training table followed by a held-out table from the same
    /// stream. Held-out IDs continue the training sequence.
    pub fn generate_split(
        &mut self,
        n_train: usize,
        n_test: usize,
    ) -> (Vec<PatientRecord>, Vec<PatientRecord>) {
        let train = self.generate(n_train);
        let test = self.generate(n_test);
        (train, test)
    }

    fn normal(&mut self, mean: f64, std: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        mean + std * z
    }

    /// Normal draw, clamped then stored at one decimal.
    fn score(&mut self, mean: f64, std: f64, lo: f64, hi: f64) -> f64 {
        round1(self.normal(mean, std).clamp(lo, hi))
    }

    /// Poisson draw capped at `cap`. A non-positive rate yields 0.
    fn count(&mut self, rate: f64, cap: u32) -> u32 {
        match Poisson::new(rate) {
            Ok(poisson) => {
                let k: f64 = poisson.sample(&mut self.rng);
                (k as u32).min(cap)
            }
            Err(_) => 0,
        }
    }

    fn bernoulli(&mut self, p: f64) -> bool {
        self.rng.gen::<f64>() < p
    }

    fn next_record(&mut self) -> PatientRecord {
        let age: u32 = self.rng.gen_range(65..95);
        let gender = if self.rng.gen_bool(0.5) {
            Gender::Male
        } else {
            Gender::Female
        };
        let af = (f64::from(age) - 65.0) / 30.0;

        let bmi = self.score(27.0, 4.5, 18.0, 40.0);

        let gait_speed = self.score(7.0 - 4.0 * af, 1.5, 0.0, 10.0);
        let balance_score = self.score(7.0 - 4.0 * af, 1.5, 0.0, 10.0);
        let muscle_strength = self.score(7.0 - 3.0 * af, 1.5, 0.0, 10.0);

        let previous_falls = self.count(((10.0 - gait_speed) + (10.0 - balance_score)) / 4.0, 10);
        let num_medications = self.count(3.0 + 4.0 * af, 15);

        let meds = f64::from(num_medications);
        let takes_sedatives = self.bernoulli(meds / 20.0);
        let takes_blood_pressure_meds = self.bernoulli(meds / 15.0);

        let has_arthritis = self.bernoulli(0.3 + 0.4 * af);
        let has_osteoporosis = self.bernoulli(0.2 + 0.3 * af);
        let has_parkinsons = self.bernoulli(0.05 + 0.15 * af);
        let has_diabetes = self.bernoulli(0.25);
        let vision_impairment = self.bernoulli(0.2 + 0.3 * af);

        let cognitive_score = self.score(8.0 - 3.0 * af, 1.5, 0.0, 10.0);

        let lives_alone_draw = self.bernoulli(0.4);
        let home_hazards = self.count(2.0 + (10.0 - gait_speed) * 0.5, 10);

        let activity_mean = 8.0
            - 3.0 * af
            - if has_arthritis { 1.0 } else { 0.0 }
            - if has_parkinsons { 2.0 } else { 0.0 };
        let activity_level = self.score(activity_mean, 1.5, 0.0, 10.0);

        let mut features = PatientFeatures {
            age,
            gender,
            bmi,
            gait_speed,
            balance_score,
            muscle_strength,
            previous_falls,
            num_medications,
            takes_sedatives,
            takes_blood_pressure_meds,
            has_arthritis,
            has_osteoporosis,
            has_parkinsons,
            has_diabetes,
            vision_impairment,
            cognitive_score,
            uses_walking_aid: false,
            lives_alone: lives_alone_draw,
            home_hazards,
            activity_level,
        };
        features.uses_walking_aid = features.needs_walking_aid();

        let probability = fall_probability(&features);
        let fell = self.bernoulli(probability);

        let id = format!("PT{:04}", self.next_id);
        self.next_id += 1;
        PatientRecord::new(id, &features, probability, fell)
    }
}

/// Per-category slice of a cohort summary.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStats {
    pub category: RiskCategory,
    pub count: usize,
    /// Observed fall rate, `None` when the category is empty
    pub fall_rate: Option<f64>,
}

/// Headline statistics of a generated table.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortSummary {
    pub count: usize,
    pub fall_rate: f64,
    /// Low, Medium, High in that order
    pub by_category: Vec<CategoryStats>,
}

impl CohortSummary {
    #[must_use]
    pub fn from_records(records: &[PatientRecord]) -> Self {
        let falls = records.iter().filter(|r| r.actual_fall_6months).count();
        let by_category = RiskCategory::ALL
            .iter()
            .map(|&category| {
                let rows: Vec<_> = records
                    .iter()
                    .filter(|r| r.risk_category == category)
                    .collect();
                let fell = rows.iter().filter(|r| r.actual_fall_6months).count();
                CategoryStats {
                    category,
                    count: rows.len(),
                    fall_rate: (!rows.is_empty()).then(|| fell as f64 / rows.len() as f64),
                }
            })
            .collect();

        Self {
            count: records.len(),
            fall_rate: if records.is_empty() {
                0.0
            } else {
                falls as f64 / records.len() as f64
            },
            by_category,
        }
    }

    /// Emit the summary through `tracing`.
    pub fn log(&self, split: Split) {
        tracing::info!(
            "{} cohort: {} patients, fall rate {:.1}%",
            split,
            self.count,
            self.fall_rate * 100.0
        );
        for stats in &self.by_category {
            match stats.fall_rate {
                Some(rate) => tracing::info!(
                    "  {:<6} {:>5} patients, fall rate {:5.1}%",
                    stats.category,
                    stats.count,
                    rate * 100.0
                ),
                None => tracing::info!("  {:<6} {:>5} patients", stats.category, stats.count),
            }
        }
    }
}

/// Generates both cohort tables and writes them through a `CohortStore`.
pub struct CohortService<C>
where
    C: CohortStore,
{
    store: Arc<C>,
}

impl<C> CohortService<C>
where
    C: CohortStore,
    C::Error: Into<crate::adapters::StorageError>,
{
    pub fn new(store: Arc<C>) -> Self {
        Self { store }
    }

    /// Generate and persist the training and held-out tables.
    ///
    /// # Errors
    /// Returns error if either table cannot be written.
    pub fn generate(
        &self,
        seed: u64,
        n_train: usize,
        n_test: usize,
    ) -> Result<(CohortSummary, CohortSummary), FallwatchError> {
        tracing::info!(
            "Generating cohort (seed={}, train={}, test={})",
            seed,
            n_train,
            n_test
        );
        let (train, test) = CohortGenerator::new(seed).generate_split(n_train, n_test);

        self.store
            .save_split(Split::Train, &train)
            .map_err(|e| FallwatchError::Storage(e.into()))?;
        self.store
            .save_split(Split::Test, &test)
            .map_err(|e| FallwatchError::Storage(e.into()))?;

        let train_summary = CohortSummary::from_records(&train);
        let test_summary = CohortSummary::from_records(&test);
        train_summary.log(Split::Train);
        test_summary.log(Split::Test);
        Ok((train_summary, test_summary))
    }
}
