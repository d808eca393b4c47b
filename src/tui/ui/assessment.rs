//! Assessment result view: category, probability, drivers and care plan.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::domain::{care_plan, Assessment, RiskCategory};
use crate::tui::styles::MedicalTheme;

/// Assessment screen state
#[derive(Debug, Clone, Default)]
pub enum AssessmentState {
    /// Nothing assessed yet
    #[default]
    Idle,
    /// Completed with result
    Complete {
        assessment: Box<Assessment>,
        export_message: Option<String>,
    },
    /// Error occurred
    Error { message: String },
}

/// Render the assessment result screen
pub fn render_assessment(f: &mut Frame, area: Rect, state: &AssessmentState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    let subtitle = match state {
        AssessmentState::Complete { assessment, .. } => format!("Patient {}", assessment.patient_id),
        _ => "Six-Month Fall Risk".to_string(),
    };
    super::render_header(f, chunks[0], "Assessment", &subtitle);

    match state {
        AssessmentState::Idle => render_idle(f, chunks[1]),
        AssessmentState::Complete { assessment, .. } => render_result(f, chunks[1], assessment),
        AssessmentState::Error { message } => render_error(f, chunks[1], message),
    }

    render_assessment_footer(f, chunks[2], state);
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "No assessment yet",
            MedicalTheme::text_secondary(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press [N] to enter patient data",
            MedicalTheme::text_muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_result(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(14), Constraint::Min(0)])
        .split(columns[0]);

    render_risk_panel(f, left[0], assessment);
    render_factors(f, left[1], assessment);
    render_care_plan(f, columns[1], assessment.category);
}

fn render_risk_panel(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let block = Block::default()
        .title(Span::styled(" Result ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Category
            Constraint::Length(3), // Probability
            Constraint::Min(0),    // Details
        ])
        .margin(1)
        .split(inner);

    let risk_style = MedicalTheme::risk_category(assessment.category);
    let icon = match assessment.category {
        RiskCategory::Low => "OK",
        RiskCategory::Medium | RiskCategory::High => "!",
    };

    let category = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("{icon} {} Risk", assessment.category),
            risk_style.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            assessment.category.description(),
            MedicalTheme::text_secondary(),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(category, chunks[0]);

    let probability = assessment.prediction.probability;
    let prob_gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(" Fall Probability ", MedicalTheme::text_secondary()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(risk_style)
        .ratio(probability.clamp(0.0, 1.0))
        .label(format!("{:.1}%", probability * 100.0));
    f.render_widget(prob_gauge, chunks[1]);

    let urgency_style = match assessment.category {
        RiskCategory::Low => MedicalTheme::success(),
        RiskCategory::Medium => MedicalTheme::warning(),
        RiskCategory::High => MedicalTheme::danger(),
    };
    let details = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("Confidence: ", MedicalTheme::text_secondary()),
            Span::styled(
                format!("{:.1}%", assessment.confidence() * 100.0),
                MedicalTheme::text(),
            ),
        ]),
        Line::from(vec![
            Span::styled("Urgency: ", MedicalTheme::text_secondary()),
            Span::styled(assessment.urgency.to_string(), urgency_style),
        ]),
        Line::from(vec![
            Span::styled("Weighted score: ", MedicalTheme::text_secondary()),
            Span::styled(
                format!("{:.1}%", assessment.reference_probability * 100.0),
                MedicalTheme::text_muted(),
            ),
        ]),
    ])
    .alignment(Alignment::Center);
    f.render_widget(details, chunks[2]);
}

fn render_factors(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let lines: Vec<Line> = if assessment.factors.is_empty() {
        vec![Line::from(Span::styled(
            "  No major risk factors identified",
            MedicalTheme::success(),
        ))]
    } else {
        assessment
            .factors
            .iter()
            .map(|factor| {
                Line::from(vec![
                    Span::styled(
                        format!("  {:<9}", factor.severity.to_string()),
                        MedicalTheme::severity(factor.severity),
                    ),
                    Span::styled(format!("{:<22}", factor.name), MedicalTheme::text()),
                    Span::styled(format!("+{:.0}", factor.points), MedicalTheme::text_muted()),
                ])
            })
            .collect()
    };

    let block = Block::default()
        .title(Span::styled(" Contributing Factors ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_care_plan(f: &mut Frame, area: Rect, category: RiskCategory) {
    let plan = care_plan(category);
    let risk_style = MedicalTheme::risk_category(category);

    let mut lines = vec![
        Line::from(Span::styled(
            plan.headline,
            risk_style.add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(plan.actions_heading, MedicalTheme::subtitle())),
    ];
    for (i, action) in plan.actions.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!(" {}. ", i + 1), MedicalTheme::text_muted()),
            Span::styled(action.title, MedicalTheme::text()),
        ]));
        lines.push(Line::from(Span::styled(
            format!("    {}", action.detail),
            MedicalTheme::text_secondary(),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        plan.timeline_heading,
        MedicalTheme::subtitle(),
    )));
    for step in plan.timeline {
        lines.push(Line::from(vec![
            Span::styled(" • ", MedicalTheme::text_muted()),
            Span::styled(step, MedicalTheme::text()),
        ]));
    }

    let block = Block::default()
        .title(Span::styled(" Care Plan ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Error", MedicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_assessment_footer(f: &mut Frame, area: Rect, state: &AssessmentState) {
    if let AssessmentState::Complete {
        export_message: Some(msg),
        ..
    } = state
    {
        let footer = Paragraph::new(Line::from(vec![
            Span::styled("[E] ", MedicalTheme::key_hint()),
            Span::styled(msg.clone(), MedicalTheme::info()),
        ]))
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(MedicalTheme::border()),
        );
        f.render_widget(footer, area);
        return;
    }

    let hints: &[(&str, &str)] = match state {
        AssessmentState::Complete { .. } => {
            &[("E", "Export Report"), ("N", "New Assessment"), ("Esc", "Dashboard")]
        }
        AssessmentState::Error { .. } => &[("Enter", "Back to Form"), ("Esc", "Dashboard")],
        AssessmentState::Idle => &[("N", "New Assessment"), ("Esc", "Dashboard")],
    };
    super::render_key_hints(f, area, hints);
}
