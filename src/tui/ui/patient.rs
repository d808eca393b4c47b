//! Patient intake form.

use std::collections::HashMap;

use rand::Rng;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::domain::{PatientFeatures, FEATURE_NAMES};
use crate::tui::styles::MedicalTheme;

/// Form field definition
#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub hint: &'static str,
    /// Schema column this field fills; `None` for the patient ID
    pub feature: Option<&'static str>,
    pub value: String,
    pub min: f64,
    pub max: f64,
}

impl FormField {
    fn number(label: &'static str, hint: &'static str, feature: &'static str, min: f64, max: f64) -> Self {
        Self {
            label,
            hint,
            feature: Some(feature),
            value: String::new(),
            min,
            max,
        }
    }

    fn flag(label: &'static str, feature: &'static str) -> Self {
        Self::number(label, "0=no, 1=yes", feature, 0.0, 1.0)
    }
}

/// Patient form state
pub struct PatientFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl Default for PatientFormState {
    fn default() -> Self {
        let fields = vec![
            FormField {
                label: "Patient ID",
                hint: "e.g. PT1234",
                feature: None,
                value: String::new(),
                min: 0.0,
                max: 0.0,
            },
            FormField::number("Age", "years (65-95)", "age", 65.0, 95.0),
            FormField::number("Gender", "1=male, 0=female", "gender_male", 0.0, 1.0),
            FormField::number("BMI", "kg/m² (15-45)", "bmi", 15.0, 45.0),
            FormField::number("Gait Speed", "0-10, higher is better", "gait_speed", 0.0, 10.0),
            FormField::number("Balance", "0-10, higher is better", "balance_score", 0.0, 10.0),
            FormField::number("Muscle Strength", "0-10", "muscle_strength", 0.0, 10.0),
            FormField::number("Activity Level", "0-10, protective", "activity_level", 0.0, 10.0),
            FormField::number("Previous Falls", "last 12 months (0-10)", "previous_falls", 0.0, 10.0),
            FormField::number("Medications", "count (0-15)", "num_medications", 0.0, 15.0),
            FormField::flag("Sedatives", "takes_sedatives"),
            FormField::flag("BP Medication", "takes_blood_pressure_meds"),
            FormField::flag("Arthritis", "has_arthritis"),
            FormField::flag("Osteoporosis", "has_osteoporosis"),
            FormField::flag("Parkinson's", "has_parkinsons"),
            FormField::flag("Diabetes", "has_diabetes"),
            FormField::flag("Vision Impairment", "vision_impairment"),
            FormField::number("Cognitive Score", "0-10, higher is better", "cognitive_score", 0.0, 10.0),
            FormField::flag("Walking Aid", "uses_walking_aid"),
            FormField::flag("Lives Alone", "lives_alone"),
            FormField::number("Home Hazards", "count (0-10)", "home_hazards", 0.0, 10.0),
        ];

        let mut state = Self {
            fields,
            selected_field: 0,
            error_message: None,
        };
        state.fill(&PatientFeatures::default());
        state.fields[0].value = format!("PT{}", rand::thread_rng().gen_range(1000..10000));
        state
    }
}

impl PatientFormState {
    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Add a character to the current field
    pub fn input_char(&mut self, c: char) {
        let field = &mut self.fields[self.selected_field];
        let accepted = if field.feature.is_none() {
            c.is_ascii_alphanumeric() || c == '-' || c == '_'
        } else {
            c.is_ascii_digit() || c == '.'
        };
        if accepted {
            field.value.push(c);
            self.error_message = None;
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        self.fields[self.selected_field].value.pop();
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        self.fields[self.selected_field].value.clear();
    }

    fn fill(&mut self, features: &PatientFeatures) {
        let values: HashMap<&str, f64> = features.named_values().into_iter().collect();
        for field in &mut self.fields {
            if let Some(v) = field.feature.and_then(|name| values.get(name)) {
                field.value = v.to_string();
            }
        }
    }

    /// Load the demo profile
    pub fn load_sample_data(&mut self) {
        self.fill(&PatientFeatures::sample());
        self.error_message = None;
    }

    #[must_use]
    pub fn patient_id(&self) -> &str {
        self.fields[0].value.trim()
    }

    /// Parse, range-check and convert to PatientFeatures
    ///
    /// # Errors
    /// Returns the first field that is empty, unparseable or out of bounds.
    pub fn to_patient_features(&self) -> Result<PatientFeatures, String> {
        if self.patient_id().is_empty() {
            return Err("Patient ID: Required".to_string());
        }

        let mut by_name = HashMap::with_capacity(FEATURE_NAMES.len());
        for field in &self.fields {
            let Some(feature) = field.feature else {
                continue;
            };
            let value: f64 = field
                .value
                .trim()
                .parse()
                .map_err(|_| format!("{}: Invalid number", field.label))?;

            if value < field.min || value > field.max {
                return Err(format!(
                    "{}: Value must be between {} and {}",
                    field.label, field.min, field.max
                ));
            }
            by_name.insert(feature, value);
        }

        let values = FEATURE_NAMES
            .iter()
            .map(|name| {
                by_name
                    .get(name)
                    .copied()
                    .ok_or_else(|| format!("{name}: Missing field"))
            })
            .collect::<Result<Vec<f64>, String>>()?;

        PatientFeatures::from_vec(&values)
    }
}

/// Render the patient data input form
pub fn render_patient_form(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    super::render_header(f, chunks[0], "Patient Intake", "Clinical and Functional Assessment");
    render_form_fields(f, chunks[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let mid = (state.fields.len() + 1) / 2;

    render_field_column(f, columns[0], &state.fields[..mid], 0, state.selected_field);
    render_field_column(
        f,
        columns[1],
        &state.fields[mid..],
        mid,
        state.selected_field,
    );
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let lines: Vec<Line> = fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let is_selected = offset + i == selected;
            let label_style = if is_selected {
                MedicalTheme::focused()
            } else {
                MedicalTheme::text_secondary()
            };
            let value = if field.value.is_empty() {
                Span::styled(field.hint, MedicalTheme::text_muted())
            } else {
                Span::styled(field.value.clone(), MedicalTheme::text())
            };
            Line::from(vec![
                Span::styled(if is_selected { "▶ " } else { "  " }, label_style),
                Span::styled(format!("{:<18}", field.label), label_style),
                value,
                if is_selected {
                    Span::styled("▌", MedicalTheme::cursor())
                } else {
                    Span::raw("")
                },
                Span::styled(
                    if field.value.is_empty() {
                        String::new()
                    } else {
                        format!("  {}", field.hint)
                    },
                    MedicalTheme::text_muted(),
                ),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &PatientFormState) {
    if let Some(err) = &state.error_message {
        let footer = Paragraph::new(Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ]))
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(MedicalTheme::border()),
        );
        f.render_widget(footer, area);
        return;
    }

    super::render_key_hints(
        f,
        area,
        &[
            ("↑↓", "Navigate"),
            ("Enter", "Assess"),
            ("F2", "Sample Profile"),
            ("Del", "Clear Field"),
            ("Esc", "Cancel"),
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        let state = PatientFormState::default();
        assert!(state.patient_id().starts_with("PT"));
        let features = state.to_patient_features().expect("defaults parse");
        assert_eq!(features, PatientFeatures::default());
    }

    #[test]
    fn test_sample_profile() {
        let mut state = PatientFormState::default();
        state.load_sample_data();
        assert_eq!(
            state.to_patient_features().expect("sample parses"),
            PatientFeatures::sample()
        );
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut state = PatientFormState::default();
        state.selected_field = 1;
        state.clear_field();
        for c in "99".chars() {
            state.input_char(c);
        }
        let err = state.to_patient_features().unwrap_err();
        assert!(err.starts_with("Age"));
    }

    #[test]
    fn test_flag_must_be_integral() {
        let mut state = PatientFormState::default();
        let idx = state
            .fields
            .iter()
            .position(|f| f.feature == Some("takes_sedatives"))
            .expect("field");
        state.fields[idx].value = "0.5".to_string();
        assert!(state.to_patient_features().is_err());
    }

    #[test]
    fn test_id_field_accepts_letters() {
        let mut state = PatientFormState::default();
        state.clear_field();
        for c in "PT0042".chars() {
            state.input_char(c);
        }
        assert_eq!(state.patient_id(), "PT0042");

        // numeric fields drop letters
        state.next_field();
        state.clear_field();
        state.input_char('x');
        assert!(state.fields[1].value.is_empty());
    }
}
