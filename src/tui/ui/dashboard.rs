//! Dashboard view: Main overview screen.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::application::InferenceService;
use crate::domain::{ModelMetadata, RiskCategory};
use crate::tui::styles::MedicalTheme;

/// Number of model weights listed on the dashboard.
const SHOWN_WEIGHTS: usize = 8;

/// Assessments run in this session, by category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub total: usize,
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl SessionSummary {
    pub fn record(&mut self, category: RiskCategory) {
        self.total += 1;
        match category {
            RiskCategory::Low => self.low += 1,
            RiskCategory::Medium => self.medium += 1,
            RiskCategory::High => self.high += 1,
        }
    }
}

/// Dashboard state for rendering.
pub struct DashboardState {
    pub metadata: ModelMetadata,
    pub fingerprint: Option<String>,
    pub show_fingerprint: bool,
    /// Feature importances, largest first
    pub weights: Vec<(String, f64)>,
    pub session: SessionSummary,
}

impl DashboardState {
    #[must_use]
    pub fn from_service(service: &InferenceService) -> Self {
        let weights = service.feature_importances().unwrap_or_else(|e| {
            tracing::warn!("Model weights unavailable: {}", e);
            Vec::new()
        });
        Self {
            metadata: service.metadata().clone(),
            fingerprint: service.fingerprint().map(str::to_string),
            show_fingerprint: false,
            weights,
            session: SessionSummary::default(),
        }
    }
}

/// Render the main dashboard view.
pub fn render_dashboard(f: &mut Frame, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
        ])
        .split(area);

    super::render_header(f, chunks[0], "Fallwatch", "Six-Month Fall Risk Assessment");

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[1]);

    render_model_panels(f, columns[0], state);
    render_session_panels(f, columns[1], state);
}

fn metric_gauge(title: &str, value: f64) -> Gauge<'static> {
    Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(format!(" {title} "), MedicalTheme::text_secondary()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(MedicalTheme::gauge(value))
        .ratio(value.clamp(0.0, 1.0))
        .label(format!("{:.1}%", value * 100.0))
}

fn render_model_panels(f: &mut Frame, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Model info
            Constraint::Length(3), // AUC
            Constraint::Length(3), // Accuracy
            Constraint::Length(3), // Sensitivity
            Constraint::Length(3), // Specificity
            Constraint::Min(0),
        ])
        .margin(1)
        .split(area);

    let m = &state.metadata;
    let fingerprint = if state.show_fingerprint {
        state
            .fingerprint
            .as_deref()
            .map_or("<in-memory>".to_string(), |fp| fp.chars().take(16).collect())
    } else {
        "hidden (press [F])".to_string()
    };

    let info = vec![
        Line::from(vec![
            Span::styled("  Model: ", MedicalTheme::text_secondary()),
            Span::styled(m.model_type.clone(), MedicalTheme::text()),
        ]),
        Line::from(vec![
            Span::styled("  Features: ", MedicalTheme::text_secondary()),
            Span::styled(m.n_features.to_string(), MedicalTheme::text()),
        ]),
        Line::from(vec![
            Span::styled("  Train / test rows: ", MedicalTheme::text_secondary()),
            Span::styled(
                format!("{} / {}", m.training_samples, m.test_samples),
                MedicalTheme::text(),
            ),
        ]),
        Line::from(vec![
            Span::styled("  AUC: ", MedicalTheme::text_secondary()),
            Span::styled(format!("{:.3}", m.auc), MedicalTheme::text()),
        ]),
        Line::from(vec![
            Span::styled("  Fingerprint: ", MedicalTheme::text_secondary()),
            Span::styled(fingerprint, MedicalTheme::text_muted()),
        ]),
    ];

    let info_block = Block::default()
        .title(Span::styled(" Model ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    f.render_widget(Paragraph::new(info).block(info_block), chunks[0]);

    f.render_widget(metric_gauge("AUC", m.auc), chunks[1]);
    f.render_widget(metric_gauge("Accuracy", m.accuracy), chunks[2]);
    f.render_widget(metric_gauge("Sensitivity", m.sensitivity), chunks[3]);
    f.render_widget(metric_gauge("Specificity", m.specificity), chunks[4]);
}

fn render_session_panels(f: &mut Frame, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),                         // Session
            Constraint::Length(SHOWN_WEIGHTS as u16 + 2), // Model weights
            Constraint::Min(0),                            // Actions
        ])
        .margin(1)
        .split(area);

    let s = state.session;
    let session_lines = if s.total == 0 {
        vec![Line::from(Span::styled(
            "  No assessments yet. Press [N] to start.",
            MedicalTheme::text_muted(),
        ))]
    } else {
        vec![
            Line::from(vec![
                Span::styled("  Assessments: ", MedicalTheme::text_secondary()),
                Span::styled(s.total.to_string(), MedicalTheme::text()),
            ]),
            Line::from(vec![
                Span::styled("  Low: ", MedicalTheme::text_secondary()),
                Span::styled(
                    s.low.to_string(),
                    MedicalTheme::risk_category(RiskCategory::Low),
                ),
                Span::styled("  Medium: ", MedicalTheme::text_secondary()),
                Span::styled(
                    s.medium.to_string(),
                    MedicalTheme::risk_category(RiskCategory::Medium),
                ),
                Span::styled("  High: ", MedicalTheme::text_secondary()),
                Span::styled(
                    s.high.to_string(),
                    MedicalTheme::risk_category(RiskCategory::High),
                ),
            ]),
        ]
    };
    let session_block = Block::default()
        .title(Span::styled(" This Session ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    f.render_widget(Paragraph::new(session_lines).block(session_block), chunks[0]);

    let weight_lines: Vec<Line> = if state.weights.is_empty() {
        vec![Line::from(Span::styled(
            "  Unavailable",
            MedicalTheme::text_muted(),
        ))]
    } else {
        state
            .weights
            .iter()
            .take(SHOWN_WEIGHTS)
            .map(|(name, weight)| {
                let bar = "█".repeat((weight * 40.0).round() as usize);
                Line::from(vec![
                    Span::styled(format!("  {name:<26}"), MedicalTheme::text_secondary()),
                    Span::styled(format!("{:>5.1}% ", weight * 100.0), MedicalTheme::text()),
                    Span::styled(bar, MedicalTheme::focused()),
                ])
            })
            .collect()
    };
    let weights_block = Block::default()
        .title(Span::styled(" Model Weights ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    f.render_widget(Paragraph::new(weight_lines).block(weights_block), chunks[1]);

    let actions = [
        ("N", "New Assessment"),
        ("S", "Risk Simulator"),
        ("A", "Population Analytics"),
        ("F", "Toggle Fingerprint"),
        ("Q", "Quit"),
    ]
    .iter()
    .map(|(key, desc)| {
        Line::from(vec![
            Span::styled(format!("[{key}] "), MedicalTheme::key_hint()),
            Span::styled(*desc, MedicalTheme::key_desc()),
        ])
    })
    .collect::<Vec<_>>();

    let actions_block = Block::default()
        .title(Span::styled(" Quick Actions ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    f.render_widget(Paragraph::new(actions).block(actions_block), chunks[2]);
}
