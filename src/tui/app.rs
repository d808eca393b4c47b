//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Service integration
//! - Report export

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::files::{report_file_name, write_assessment_report, CsvCohortStore, FsArtifactStore};
use crate::adapters::StorageError;
use crate::application::{AnalyticsService, InferenceService};
use crate::config::AppConfig;
use crate::domain::Assessment;

use super::ui::{
    analytics::{render_analytics, AnalyticsState},
    assessment::{render_assessment, AssessmentState},
    dashboard::{render_dashboard, DashboardState},
    patient::{render_patient_form, PatientFormState},
    render_disclaimer,
    simulator::{render_simulator, SimulatorState},
};

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    PatientForm,
    Assessment,
    Simulator,
    Analytics,
}

/// Main application state
pub struct App {
    /// Current screen
    screen: Screen,

    /// Whether the app should quit
    should_quit: bool,

    inference_service: InferenceService,

    analytics_service: AnalyticsService<CsvCohortStore>,

    /// Exported reports land here
    report_dir: PathBuf,

    dashboard_state: DashboardState,
    patient_form_state: PatientFormState,
    assessment_state: AssessmentState,
    simulator_state: SimulatorState,
    analytics_state: AnalyticsState,
}

impl App {
    /// Create a new application instance from configuration.
    ///
    /// The model must already be trained; the dashboard refuses to start
    /// without it.
    ///
    /// # Errors
    /// Returns error if the model artifacts cannot be loaded.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let store = FsArtifactStore::new(&config.model_dir);
        let inference_service = InferenceService::load(&store).with_context(|| {
            format!(
                "Failed to load model from {:?}. Run `fallwatch train` first or set FALLWATCH_MODEL_DIR.",
                config.model_dir
            )
        })?;

        tracing::info!(
            "Loaded {} model (auc={:.3}) from {:?}",
            inference_service.metadata().model_type,
            inference_service.metadata().auc,
            config.model_dir
        );

        let analytics_service =
            AnalyticsService::new(Arc::new(CsvCohortStore::new(&config.data_dir)));

        Ok(Self::with_dependencies(
            inference_service,
            analytics_service,
            config.report_dir.clone(),
        ))
    }

    /// Create application with injected dependencies.
    #[must_use]
    pub fn with_dependencies(
        inference_service: InferenceService,
        analytics_service: AnalyticsService<CsvCohortStore>,
        report_dir: PathBuf,
    ) -> Self {
        Self {
            screen: Screen::Dashboard,
            should_quit: false,
            dashboard_state: DashboardState::from_service(&inference_service),
            inference_service,
            analytics_service,
            report_dir,
            patient_form_state: PatientFormState::default(),
            assessment_state: AssessmentState::default(),
            simulator_state: SimulatorState::default(),
            analytics_state: AnalyticsState::default(),
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Main loop
        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(f.area());

                let content_area = chunks[0];
                match self.screen {
                    Screen::Dashboard => render_dashboard(f, content_area, &self.dashboard_state),
                    Screen::PatientForm => {
                        render_patient_form(f, content_area, &self.patient_form_state);
                    }
                    Screen::Assessment => {
                        render_assessment(f, content_area, &self.assessment_state);
                    }
                    Screen::Simulator => render_simulator(f, content_area, &self.simulator_state),
                    Screen::Analytics => render_analytics(f, content_area, &self.analytics_state),
                }

                render_disclaimer(f, chunks[1]);
            })?;

            // Short poll to stay responsive
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::PatientForm => self.handle_patient_form_key(key),
            Screen::Assessment => self.handle_assessment_key(key),
            Screen::Simulator => self.handle_simulator_key(key),
            Screen::Analytics => self.handle_analytics_key(key),
        }
    }

    fn open_patient_form(&mut self) {
        self.patient_form_state = PatientFormState::default();
        self.screen = Screen::PatientForm;
    }

    fn handle_dashboard_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('n' | 'N') => self.open_patient_form(),
            KeyCode::Char('s' | 'S') => {
                if self.simulator_state.result.is_none() {
                    self.simulator_state.recompute(&self.inference_service);
                }
                self.screen = Screen::Simulator;
            }
            KeyCode::Char('a' | 'A') => {
                self.analytics_state.refresh(&self.analytics_service);
                self.screen = Screen::Analytics;
            }
            KeyCode::Char('f' | 'F') => {
                self.dashboard_state.show_fingerprint = !self.dashboard_state.show_fingerprint;
            }
            KeyCode::Char('q' | 'Q') => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    fn handle_patient_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.screen = Screen::Dashboard;
            }
            KeyCode::Up | KeyCode::BackTab => {
                self.patient_form_state.prev_field();
            }
            KeyCode::Down | KeyCode::Tab => {
                self.patient_form_state.next_field();
            }
            KeyCode::F(2) => {
                self.patient_form_state.load_sample_data();
            }
            KeyCode::Char(c) => {
                self.patient_form_state.input_char(c);
            }
            KeyCode::Backspace => {
                self.patient_form_state.delete_char();
            }
            KeyCode::Delete => {
                self.patient_form_state.clear_field();
            }
            KeyCode::Enter => {
                self.submit_patient_form();
            }
            _ => {}
        }
    }

    fn handle_assessment_key(&mut self, key: KeyCode) {
        let complete = matches!(self.assessment_state, AssessmentState::Complete { .. });
        let failed = matches!(self.assessment_state, AssessmentState::Error { .. });
        match key {
            KeyCode::Char('e' | 'E') if complete => self.export_report(),
            KeyCode::Enter if failed => {
                self.screen = Screen::PatientForm;
            }
            KeyCode::Char('n' | 'N') => self.open_patient_form(),
            KeyCode::Esc | KeyCode::Enter => {
                self.screen = Screen::Dashboard;
            }
            _ => {}
        }
    }

    fn handle_simulator_key(&mut self, key: KeyCode) {
        let changed = match key {
            KeyCode::Esc => {
                self.screen = Screen::Dashboard;
                false
            }
            KeyCode::Up => {
                self.simulator_state.prev();
                false
            }
            KeyCode::Down | KeyCode::Tab => {
                self.simulator_state.next();
                false
            }
            KeyCode::Left => self.simulator_state.adjust(-1),
            KeyCode::Right => self.simulator_state.adjust(1),
            KeyCode::Char('r' | 'R') => {
                self.simulator_state.reset();
                true
            }
            _ => false,
        };

        if changed {
            self.simulator_state.recompute(&self.inference_service);
        }
    }

    fn handle_analytics_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.screen = Screen::Dashboard;
            }
            KeyCode::Char('r' | 'R') => {
                self.analytics_state.refresh(&self.analytics_service);
            }
            _ => {}
        }
    }

    fn submit_patient_form(&mut self) {
        let features = match self.patient_form_state.to_patient_features() {
            Ok(features) => features,
            Err(e) => {
                self.patient_form_state.error_message = Some(e);
                return;
            }
        };

        if let Err(errors) = features.validate() {
            self.patient_form_state.error_message = Some(errors.join(", "));
            return;
        }

        let patient_id = self.patient_form_state.patient_id().to_string();
        self.assessment_state = match self.inference_service.assess(&patient_id, features) {
            Ok(assessment) => {
                self.dashboard_state.session.record(assessment.category);
                AssessmentState::Complete {
                    assessment: Box::new(assessment),
                    export_message: None,
                }
            }
            Err(e) => {
                tracing::error!("Assessment failed: {}", e);
                AssessmentState::Error {
                    message: e.to_string(),
                }
            }
        };
        self.screen = Screen::Assessment;
    }

    fn export_report(&mut self) {
        let AssessmentState::Complete {
            assessment,
            export_message,
        } = &mut self.assessment_state
        else {
            return;
        };

        *export_message = Some(match export_assessment(&self.report_dir, assessment) {
            Ok(path) => {
                tracing::info!("Exported report to {:?}", path);
                format!("Saved {}", path.display())
            }
            Err(e) => {
                tracing::error!("Report export failed: {}", e);
                format!("Export failed: {e}")
            }
        });
    }
}

/// Write a one-row CSV report into `dir`, creating it if needed.
fn export_assessment(dir: &Path, assessment: &Assessment) -> Result<PathBuf, StorageError> {
    std::fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;
    let name = report_file_name(
        &assessment.patient_id,
        assessment.created_at.date_naive(),
    );
    let path = dir.join(name);
    let file = File::create(&path).map_err(|e| StorageError::io(&path, e))?;
    write_assessment_report(BufWriter::new(file), assessment)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PatientFeatures, Prediction};
    use tempfile::tempdir;

    #[test]
    fn test_export_creates_report_dir() {
        let dir = tempdir().expect("tempdir");
        let reports = dir.path().join("nested").join("reports");
        let assessment = Assessment::new(
            "PT0007",
            PatientFeatures::sample(),
            Prediction::new(0.8, true),
            0.7,
        );

        let path = export_assessment(&reports, &assessment).expect("export");
        assert!(path.starts_with(&reports));
        let name = path.file_name().and_then(|n| n.to_str()).expect("name");
        assert!(name.starts_with("fall_risk_assessment_PT0007_"));

        let contents = std::fs::read_to_string(&path).expect("read");
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.starts_with("Patient ID,"));
    }
}
