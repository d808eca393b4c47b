//! What-if simulator: six sliders, live prediction.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::application::{InferenceService, SimulatorInput};
use crate::domain::Assessment;
use crate::tui::styles::MedicalTheme;

/// One adjustable simulator input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slider {
    Age,
    GaitSpeed,
    Balance,
    PreviousFalls,
    Medications,
    Activity,
}

impl Slider {
    pub const ALL: [Self; 6] = [
        Self::Age,
        Self::GaitSpeed,
        Self::Balance,
        Self::PreviousFalls,
        Self::Medications,
        Self::Activity,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Age => "Age",
            Self::GaitSpeed => "Gait Speed",
            Self::Balance => "Balance",
            Self::PreviousFalls => "Previous Falls",
            Self::Medications => "Medications",
            Self::Activity => "Activity Level",
        }
    }

    /// (min, max, step)
    #[must_use]
    pub fn range(self) -> (f64, f64, f64) {
        match self {
            Self::Age => (65.0, 95.0, 1.0),
            Self::GaitSpeed | Self::Balance | Self::Activity => (0.0, 10.0, 0.5),
            Self::PreviousFalls => (0.0, 10.0, 1.0),
            Self::Medications => (0.0, 15.0, 1.0),
        }
    }

    #[must_use]
    pub fn get(self, input: &SimulatorInput) -> f64 {
        match self {
            Self::Age => f64::from(input.age),
            Self::GaitSpeed => input.gait_speed,
            Self::Balance => input.balance_score,
            Self::PreviousFalls => f64::from(input.previous_falls),
            Self::Medications => f64::from(input.num_medications),
            Self::Activity => input.activity_level,
        }
    }

    fn set(self, input: &mut SimulatorInput, value: f64) {
        match self {
            Self::Age => input.age = value as u32,
            Self::GaitSpeed => input.gait_speed = value,
            Self::Balance => input.balance_score = value,
            Self::PreviousFalls => input.previous_falls = value as u32,
            Self::Medications => input.num_medications = value as u32,
            Self::Activity => input.activity_level = value,
        }
    }
}

/// Simulator screen state
#[derive(Debug, Clone, Default)]
pub struct SimulatorState {
    pub input: SimulatorInput,
    pub selected: usize,
    pub result: Option<Result<Assessment, String>>,
}

impl SimulatorState {
    #[must_use]
    pub fn selected_slider(&self) -> Slider {
        Slider::ALL[self.selected]
    }

    pub fn next(&mut self) {
        self.selected = (self.selected + 1) % Slider::ALL.len();
    }

    pub fn prev(&mut self) {
        self.selected = (self.selected + Slider::ALL.len() - 1) % Slider::ALL.len();
    }

    /// Move the selected slider by `steps` increments, clamped to its range.
    /// Returns true if the value changed.
    pub fn adjust(&mut self, steps: i32) -> bool {
        let slider = self.selected_slider();
        let (min, max, step) = slider.range();
        let current = slider.get(&self.input);
        let next = (current + f64::from(steps) * step).clamp(min, max);
        if next == current {
            return false;
        }
        slider.set(&mut self.input, next);
        true
    }

    pub fn reset(&mut self) {
        self.input = SimulatorInput::default();
    }

    /// Re-score the current input.
    pub fn recompute(&mut self, service: &InferenceService) {
        self.result = Some(service.simulate(&self.input).map_err(|e| e.to_string()));
    }
}

/// Render the simulator screen
pub fn render_simulator(f: &mut Frame, area: Rect, state: &SimulatorState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    super::render_header(f, chunks[0], "Risk Simulator", "What-if Analysis");

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .margin(1)
        .split(chunks[1]);

    render_sliders(f, columns[0], state);
    render_simulation_result(f, columns[1], state);

    super::render_key_hints(
        f,
        chunks[2],
        &[
            ("↑↓", "Select"),
            ("←→", "Adjust"),
            ("R", "Reset"),
            ("Esc", "Dashboard"),
        ],
    );
}

fn render_sliders(f: &mut Frame, area: Rect, state: &SimulatorState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            Slider::ALL
                .iter()
                .map(|_| Constraint::Length(3))
                .chain(std::iter::once(Constraint::Min(0)))
                .collect::<Vec<_>>(),
        )
        .split(area);

    for (i, slider) in Slider::ALL.iter().enumerate() {
        let (min, max, step) = slider.range();
        let value = slider.get(&state.input);
        let is_selected = i == state.selected;
        let label = if step < 1.0 {
            format!("{value:.1}")
        } else {
            format!("{value:.0}")
        };

        let gauge = Gauge::default()
            .block(
                Block::default()
                    .title(Span::styled(
                        format!(" {} ", slider.label()),
                        if is_selected {
                            MedicalTheme::focused()
                        } else {
                            MedicalTheme::text_secondary()
                        },
                    ))
                    .borders(Borders::ALL)
                    .border_style(if is_selected {
                        MedicalTheme::border_focused()
                    } else {
                        MedicalTheme::border()
                    }),
            )
            .gauge_style(MedicalTheme::info())
            .ratio(((value - min) / (max - min)).clamp(0.0, 1.0))
            .label(label);
        f.render_widget(gauge, rows[i]);
    }
}

fn render_simulation_result(f: &mut Frame, area: Rect, state: &SimulatorState) {
    let block = Block::default()
        .title(Span::styled(" Predicted Risk ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let assessment = match &state.result {
        None => {
            let p = Paragraph::new(Span::styled("Adjust a slider", MedicalTheme::text_muted()))
                .alignment(Alignment::Center);
            f.render_widget(p, inner);
            return;
        }
        Some(Err(message)) => {
            let p = Paragraph::new(vec![
                Line::from(Span::styled("! Error", MedicalTheme::danger())),
                Line::from(Span::styled(message.clone(), MedicalTheme::text())),
            ])
            .alignment(Alignment::Center);
            f.render_widget(p, inner);
            return;
        }
        Some(Ok(a)) => a,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .margin(1)
        .split(inner);

    let risk_style = MedicalTheme::risk_category(assessment.category);
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            format!("{} Risk", assessment.category),
            risk_style.add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center),
        chunks[0],
    );

    let p = assessment.prediction.probability;
    f.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).border_style(MedicalTheme::border()))
            .gauge_style(risk_style)
            .ratio(p.clamp(0.0, 1.0))
            .label(format!("{:.1}%", p * 100.0)),
        chunks[1],
    );

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Urgency: ", MedicalTheme::text_secondary()),
            Span::styled(assessment.urgency.to_string(), MedicalTheme::text()),
        ]),
        Line::from(vec![
            Span::styled("Weighted score: ", MedicalTheme::text_secondary()),
            Span::styled(
                format!("{:.1}%", assessment.reference_probability * 100.0),
                MedicalTheme::text_muted(),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled("Fixed: BMI 27, strength 5, cognition 7,", MedicalTheme::text_muted())),
        Line::from(Span::styled("2 home hazards, male, no conditions", MedicalTheme::text_muted())),
    ];
    if let Some(top) = assessment.factors.first() {
        lines.insert(
            2,
            Line::from(vec![
                Span::styled("Top factor: ", MedicalTheme::text_secondary()),
                Span::styled(top.name, MedicalTheme::severity(top.severity)),
            ]),
        );
    }
    f.render_widget(Paragraph::new(lines), chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjust_clamps_to_range() {
        let mut state = SimulatorState::default();
        assert_eq!(state.selected_slider(), Slider::Age);
        for _ in 0..40 {
            state.adjust(1);
        }
        assert_eq!(state.input.age, 95);
        assert!(!state.adjust(1));
        assert!(state.adjust(-1));
        assert_eq!(state.input.age, 94);
    }

    #[test]
    fn test_half_steps_for_scores() {
        let mut state = SimulatorState::default();
        state.next();
        assert_eq!(state.selected_slider(), Slider::GaitSpeed);
        state.adjust(1);
        assert!((state.input.gait_speed - 5.5).abs() < 1e-12);
        for _ in 0..30 {
            state.adjust(-1);
        }
        assert_eq!(state.input.gait_speed, 0.0);
    }

    #[test]
    fn test_selection_wraps() {
        let mut state = SimulatorState::default();
        state.prev();
        assert_eq!(state.selected_slider(), Slider::Activity);
        state.next();
        assert_eq!(state.selected_slider(), Slider::Age);
    }

    #[test]
    fn test_counts_stay_integral() {
        let mut state = SimulatorState::default();
        state.selected = 4;
        state.adjust(-10);
        assert_eq!(state.input.num_medications, 0);
        state.adjust(20);
        assert_eq!(state.input.num_medications, 15);
    }
}
