//! Analytics view: population statistics over the held-out cohort.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::application::{AnalyticsService, FiveNumberSummary, PopulationSummary};
use crate::ports::CohortStore;
use crate::tui::styles::MedicalTheme;
use crate::FallwatchError;

/// Analytics state
#[derive(Debug, Clone, Default)]
pub struct AnalyticsState {
    pub summary: Option<PopulationSummary>,
    /// Recoverable condition, e.g. no cohort generated yet
    pub warning: Option<String>,
    pub error: Option<String>,
}

impl AnalyticsState {
    /// Recompute from the held-out table.
    pub fn refresh<C>(&mut self, service: &AnalyticsService<C>)
    where
        C: CohortStore,
        C::Error: Into<crate::adapters::StorageError>,
    {
        *self = match service.population_summary() {
            Ok(summary) => Self {
                summary: Some(summary),
                ..Self::default()
            },
            Err(FallwatchError::CohortMissing(detail)) => {
                tracing::warn!("Analytics unavailable: {}", detail);
                Self {
                    warning: Some(format!(
                        "No held-out cohort found ({detail}). Run `fallwatch generate` first."
                    )),
                    ..Self::default()
                }
            }
            Err(e) => {
                tracing::error!("Analytics failed: {}", e);
                Self {
                    error: Some(e.to_string()),
                    ..Self::default()
                }
            }
        };
    }
}

/// Render the analytics view
pub fn render_analytics(f: &mut Frame, area: Rect, state: &AnalyticsState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    super::render_header(f, chunks[0], "Population Analytics", "Held-out Cohort");
    render_analytics_content(f, chunks[1], state);
    super::render_key_hints(f, chunks[2], &[("R", "Refresh"), ("Esc", "Back")]);
}

fn render_analytics_content(f: &mut Frame, area: Rect, state: &AnalyticsState) {
    if let Some(err) = &state.error {
        render_message(f, area, "! Cannot Load Statistics", err, MedicalTheme::danger());
        return;
    }
    if let Some(warning) = &state.warning {
        render_message(f, area, "Analytics unavailable", warning, MedicalTheme::warning());
        return;
    }
    let Some(summary) = &state.summary else {
        render_message(
            f,
            area,
            "No statistics available",
            "Press [R] to refresh",
            MedicalTheme::text_muted(),
        );
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(0)])
        .margin(1)
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(30),
            Constraint::Percentage(40),
        ])
        .split(rows[0]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    render_overview(f, top[0], summary);
    render_distribution(f, top[1], summary);
    render_functional_scores(f, top[2], summary);
    render_age_bands(f, bottom[0], summary);
    render_high_risk(f, bottom[1], summary);
}

fn render_message(f: &mut Frame, area: Rect, title: &str, message: &str, style: ratatui::style::Style) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(title.to_string(), style)),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(style),
    );

    f.render_widget(content, area);
}

fn stat_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label:<18}"), MedicalTheme::text_secondary()),
        Span::styled(value, MedicalTheme::text()),
    ])
}

fn render_overview(f: &mut Frame, area: Rect, s: &PopulationSummary) {
    let lines = vec![
        stat_line("Patients", s.size.to_string()),
        stat_line("Average age", format!("{:.1}", s.mean_age)),
        stat_line("Fall rate", format!("{:.1}%", s.fall_rate * 100.0)),
        stat_line("Avg medications", format!("{:.1}", s.mean_medications)),
        stat_line("High risk", format!("{:.1}%", s.high_risk_share * 100.0)),
    ];
    let block = Block::default()
        .title(Span::styled(" Overview ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_distribution(f: &mut Frame, area: Rect, s: &PopulationSummary) {
    let lines: Vec<Line> = s
        .category_counts
        .iter()
        .map(|(category, count)| {
            let share = if s.size == 0 {
                0.0
            } else {
                *count as f64 / s.size as f64
            };
            Line::from(vec![
                Span::styled(
                    format!("  {:<8}", category.to_string()),
                    MedicalTheme::risk_category(*category),
                ),
                Span::styled(format!("{count:>5}"), MedicalTheme::text()),
                Span::styled(format!("  {:>5.1}%", share * 100.0), MedicalTheme::text_muted()),
            ])
        })
        .collect();
    let block = Block::default()
        .title(Span::styled(" Risk Categories ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn five_number_line(label: &str, v: &FiveNumberSummary) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label:<10}"), MedicalTheme::text_secondary()),
        Span::styled(
            format!(
                "{:>4.1} {:>4.1} {:>4.1} {:>4.1} {:>4.1}",
                v.min, v.q1, v.median, v.q3, v.max
            ),
            MedicalTheme::text(),
        ),
    ])
}

fn render_functional_scores(f: &mut Frame, area: Rect, s: &PopulationSummary) {
    let lines = vec![
        Line::from(Span::styled(
            "            min   q1  med   q3  max",
            MedicalTheme::text_muted(),
        )),
        five_number_line("Gait", &s.gait_speed),
        five_number_line("Balance", &s.balance_score),
        five_number_line("Strength", &s.muscle_strength),
    ];
    let block = Block::default()
        .title(Span::styled(" Functional Scores ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_age_bands(f: &mut Frame, area: Rect, s: &PopulationSummary) {
    let labels: Vec<String> = s.age_bands.iter().map(|b| b.label()).collect();
    let data: Vec<(&str, u64)> = labels
        .iter()
        .zip(&s.age_bands)
        .map(|(label, band)| {
            (
                label.as_str(),
                band.mean_risk_score.map_or(0, |m| m.round().max(0.0) as u64),
            )
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .title(Span::styled(" Mean Risk Score by Age ", MedicalTheme::subtitle()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .data(data.as_slice())
        .bar_width(6)
        .bar_gap(2)
        .max(100)
        .bar_style(MedicalTheme::info())
        .value_style(MedicalTheme::header())
        .label_style(MedicalTheme::text_secondary());
    f.render_widget(chart, area);
}

fn render_high_risk(f: &mut Frame, area: Rect, s: &PopulationSummary) {
    let block = Block::default()
        .title(Span::styled(" Prevalence ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .margin(1)
        .split(inner);

    let gauge = |title: &'static str, value: f64| {
        Gauge::default()
            .block(
                Block::default()
                    .title(Span::styled(title, MedicalTheme::text_secondary()))
                    .borders(Borders::ALL)
                    .border_style(MedicalTheme::border()),
            )
            .gauge_style(MedicalTheme::gauge(1.0 - value))
            .ratio(value.clamp(0.0, 1.0))
            .label(format!("{:.1}%", value * 100.0))
    };
    f.render_widget(gauge(" Observed Fall Rate ", s.fall_rate), chunks[0]);
    f.render_widget(gauge(" High Risk Share ", s.high_risk_share), chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::files::CsvCohortStore;
    use crate::application::CohortGenerator;
    use crate::ports::Split;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_missing_cohort_is_warning() {
        let dir = tempdir().expect("tempdir");
        let service = AnalyticsService::new(Arc::new(CsvCohortStore::new(dir.path())));
        let mut state = AnalyticsState::default();
        state.refresh(&service);
        assert!(state.summary.is_none());
        assert!(state.warning.is_some());
        assert!(state.error.is_none());
    }

    #[test]
    fn test_refresh_loads_summary() {
        let dir = tempdir().expect("tempdir");
        let store = CsvCohortStore::new(dir.path());
        store
            .save_split(Split::Test, &CohortGenerator::new(3).generate(40))
            .expect("save");
        let service = AnalyticsService::new(Arc::new(store));

        let mut state = AnalyticsState {
            warning: Some("stale".to_string()),
            ..AnalyticsState::default()
        };
        state.refresh(&service);
        assert_eq!(state.summary.as_ref().map(|s| s.size), Some(40));
        assert!(state.warning.is_none());
    }
}
