//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides a clinical-themed interface for:
//! - Dashboard with model metrics and session summary
//! - Patient intake and assessment results
//! - What-if risk simulation
//! - Population analytics

mod app;
mod styles;
mod ui;

pub use app::App;
pub use styles::MedicalTheme;
