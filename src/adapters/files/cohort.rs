//! CSV cohort tables.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use super::StorageError;
use crate::domain::PatientRecord;
use crate::ports::{CohortStore, Split};

pub const TRAIN_FILE: &str = "fall_risk_train.csv";
pub const TEST_FILE: &str = "fall_risk_test.csv";

/// Header row, in `PatientRecord` field order.
pub const COHORT_COLUMNS: [&str; 24] = [
    "patient_id",
    "age",
    "gender",
    "bmi",
    "gait_speed",
    "balance_score",
    "muscle_strength",
    "previous_falls",
    "num_medications",
    "takes_sedatives",
    "takes_blood_pressure_meds",
    "has_arthritis",
    "has_osteoporosis",
    "has_parkinsons",
    "has_diabetes",
    "vision_impairment",
    "cognitive_score",
    "uses_walking_aid",
    "lives_alone",
    "home_hazards",
    "activity_level",
    "risk_score",
    "risk_category",
    "actual_fall_6months",
];

/// Serialize records as CSV with a header row.
///
/// # Errors
/// Returns error if a row cannot be written.
pub fn write_records<W: Write>(writer: W, records: &[PatientRecord]) -> Result<(), StorageError> {
    let mut wtr = csv::Writer::from_writer(writer);
    // serde only emits the header alongside the first row
    if records.is_empty() {
        wtr.write_record(COHORT_COLUMNS)?;
    }
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Parse CSV records with a header row.
///
/// # Errors
/// Returns error on a malformed row or unexpected header.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<PatientRecord>, StorageError> {
    let mut rdr = csv::Reader::from_reader(reader);
    rdr.deserialize()
        .collect::<Result<Vec<PatientRecord>, csv::Error>>()
        .map_err(StorageError::from)
}

/// Cohort tables in a data directory.
#[derive(Debug, Clone)]
pub struct CsvCohortStore {
    dir: PathBuf,
}

impl CsvCohortStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn path(&self, split: Split) -> PathBuf {
        self.dir.join(match split {
            Split::Train => TRAIN_FILE,
            Split::Test => TEST_FILE,
        })
    }

    /// Read any cohort-shaped CSV, not only the two managed splits.
    ///
    /// # Errors
    /// Returns error if the file is missing or malformed.
    pub fn load_path(path: &Path) -> Result<Vec<PatientRecord>, StorageError> {
        let file = File::open(path).map_err(|e| StorageError::io(path, e))?;
        read_records(file)
    }
}

impl CohortStore for CsvCohortStore {
    type Error = StorageError;

    fn save_split(&self, split: Split, records: &[PatientRecord]) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| StorageError::io(&self.dir, e))?;
        let path = self.path(split);
        let file = File::create(&path).map_err(|e| StorageError::io(&path, e))?;
        write_records(std::io::BufWriter::new(file), records)?;
        tracing::info!("Wrote {} {} rows to {:?}", records.len(), split, path);
        Ok(())
    }

    fn load_split(&self, split: Split) -> Result<Vec<PatientRecord>, StorageError> {
        let path = self.path(split);
        let records = Self::load_path(&path)?;
        tracing::debug!("Read {} {} rows from {:?}", records.len(), split, path);
        Ok(records)
    }

    fn has_split(&self, split: Split) -> bool {
        self.path(split).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PatientFeatures;
    use tempfile::tempdir;

    fn sample_records() -> Vec<PatientRecord> {
        vec![
            PatientRecord::new("PT0001", &PatientFeatures::sample(), 0.7123, true),
            PatientRecord::new("PT0002", &PatientFeatures::default(), 0.2049, false),
        ]
    }

    #[test]
    fn test_header_and_flag_encoding() {
        let mut buf = Vec::new();
        write_records(&mut buf, &sample_records()).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        let mut lines = text.lines();

        assert_eq!(
            lines.next().expect("header"),
            "patient_id,age,gender,bmi,gait_speed,balance_score,muscle_strength,\
             previous_falls,num_medications,takes_sedatives,takes_blood_pressure_meds,\
             has_arthritis,has_osteoporosis,has_parkinsons,has_diabetes,vision_impairment,\
             cognitive_score,uses_walking_aid,lives_alone,home_hazards,activity_level,\
             risk_score,risk_category,actual_fall_6months"
        );
        let first = lines.next().expect("row");
        assert!(first.starts_with("PT0001,82,Female,24.5,4.0,4.5,5.0,2,7,1,1,1,1,0,0,1,6.5,1,1,4,3.5,71.2,High,1"));
    }

    #[test]
    fn test_empty_write_keeps_header() {
        let mut buf = Vec::new();
        write_records(&mut buf, &[]).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert_eq!(text, format!("{}\n", COHORT_COLUMNS.join(",")));
        assert!(read_records(text.as_bytes()).expect("read").is_empty());
    }

    #[test]
    fn test_column_constant_matches_serde_header() {
        let mut buf = Vec::new();
        write_records(&mut buf, &sample_records()).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        let header: Vec<&str> = text.lines().next().expect("header").split(',').collect();
        assert_eq!(header, COHORT_COLUMNS);
    }

    #[test]
    fn test_store_roundtrip() {
        let dir = tempdir().expect("tempdir");
        let store = CsvCohortStore::new(dir.path().join("data"));
        assert!(!store.has_split(Split::Test));

        let records = sample_records();
        store.save_split(Split::Test, &records).expect("save");
        assert!(store.has_split(Split::Test));
        assert!(!store.has_split(Split::Train));

        let loaded = store.load_split(Split::Test).expect("load");
        assert_eq!(loaded, records);
    }

    #[test]
    fn test_missing_split_is_not_found() {
        let dir = tempdir().expect("tempdir");
        let store = CsvCohortStore::new(dir.path());
        let err = store.load_split(Split::Train).unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn test_bad_flag_rejected() {
        let mut buf = Vec::new();
        write_records(&mut buf, &sample_records()[..1]).expect("write");
        let text = String::from_utf8(buf).expect("utf8").replace(",High,1", ",High,2");
        assert!(read_records(text.as_bytes()).is_err());
    }
}
