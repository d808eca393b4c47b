//! CSV exports of assessments.

use std::io::Write;

use serde::Serialize;

use super::StorageError;
use crate::domain::Assessment;

/// `fall_risk_assessment_<patient>_<YYYYMMDD>.csv`, with any character that
/// is unsafe in a file name replaced by `_`.
#[must_use]
pub fn report_file_name(patient_id: &str, date: chrono::NaiveDate) -> String {
    let safe: String = patient_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("fall_risk_assessment_{safe}_{}.csv", date.format("%Y%m%d"))
}

fn percent(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

/// Write a one-row report: assessment summary followed by every model
/// feature.
///
/// # Errors
/// Returns error if the writer fails.
pub fn write_assessment_report<W: Write>(
    writer: W,
    assessment: &Assessment,
) -> Result<(), StorageError> {
    let named = assessment.features.named_values();

    let mut header = vec![
        "Patient ID",
        "Assessment Date",
        "Age",
        "Gender",
        "Risk Category",
        "Fall Probability",
        "Model Confidence",
    ];
    header.extend(named.iter().map(|(name, _)| *name));

    let mut row = vec![
        assessment.patient_id.clone(),
        assessment.created_at.format("%Y-%m-%d %H:%M").to_string(),
        assessment.features.age.to_string(),
        assessment.features.gender.to_string(),
        assessment.category.to_string(),
        percent(assessment.prediction.probability),
        percent(assessment.confidence()),
    ];
    row.extend(named.iter().map(|(_, value)| value.to_string()));

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&header)?;
    wtr.write_record(&row)?;
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

#[derive(Serialize)]
struct PredictionRow<'a> {
    patient_id: &'a str,
    predicted_fall: u8,
    fall_probability: f64,
    risk_category: String,
    urgency: String,
    reference_probability: f64,
}

/// Write batch predictions, one row per assessment.
///
/// # Errors
/// Returns error if the writer fails.
pub fn write_predictions<W: Write>(
    writer: W,
    assessments: &[Assessment],
) -> Result<(), StorageError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for a in assessments {
        wtr.serialize(PredictionRow {
            patient_id: &a.patient_id,
            predicted_fall: u8::from(a.prediction.label),
            fall_probability: (a.prediction.probability * 10_000.0).round() / 10_000.0,
            risk_category: a.category.to_string(),
            urgency: a.urgency.to_string(),
            reference_probability: (a.reference_probability * 10_000.0).round() / 10_000.0,
        })?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PatientFeatures, Prediction, FEATURE_NAMES};

    fn assessment() -> Assessment {
        Assessment::new("PT0042", PatientFeatures::sample(), Prediction::new(0.654, true), 0.71)
    }

    #[test]
    fn test_report_file_name() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 9).expect("valid date");
        assert_eq!(
            report_file_name("PT0042", date),
            "fall_risk_assessment_PT0042_20240309.csv"
        );
        assert_eq!(
            report_file_name("../x y", date),
            "fall_risk_assessment____x_y_20240309.csv"
        );
    }

    #[test]
    fn test_report_layout() {
        let mut buf = Vec::new();
        write_assessment_report(&mut buf, &assessment()).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let header: Vec<&str> = lines[0].split(',').collect();
        assert_eq!(header.len(), 7 + FEATURE_NAMES.len());
        assert_eq!(header[0], "Patient ID");
        assert_eq!(header[7], "age");
        assert_eq!(header.last(), Some(&"gender_male"));

        let row: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(row[0], "PT0042");
        assert_eq!(row[4], "High");
        assert_eq!(row[5], "65.4%");
        assert_eq!(row[6], "65.4%");
    }

    #[test]
    fn test_predictions_csv() {
        let mut buf = Vec::new();
        write_predictions(&mut buf, &[assessment()]).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with(
            "patient_id,predicted_fall,fall_probability,risk_category,urgency,reference_probability"
        ));
        assert!(text.contains("PT0042,1,0.654,High,Soon,0.71"));
    }
}
