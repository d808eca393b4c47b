//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod analytics;
mod generator;
mod inference;
mod training;

pub use analytics::{AgeBand, AnalyticsService, FiveNumberSummary, PopulationSummary};
pub use generator::{
    CategoryStats, CohortGenerator, CohortService, CohortSummary, DEFAULT_TEST_SIZE,
    DEFAULT_TRAIN_SIZE,
};
pub use inference::{InferenceService, SimulatorInput, SIMULATION_ID};
pub use training::{
    design_matrix, labels, CandidateResult, TrainingReport, TrainingService, TOP_FEATURES,
};
