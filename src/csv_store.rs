use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::data_store::DataStore;
use crate::dataset::Dataset;
use crate::error::DashboardError;
use crate::stop_record::StopRecord;

/// Stop log exported as a headered CSV file.
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> CsvStore {
        CsvStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DataStore for CsvStore {
    async fn fetch_all(&self) -> Result<Dataset, DashboardError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| DashboardError::unavailable(format!("{}: {e}", self.path.display())))?;
        let log = StopRecord::read_csv(bytes.as_slice())
            .map_err(|e| DashboardError::unavailable(format!("{}: {e}", self.path.display())))?;
        Ok(Dataset::from(log))
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::predict;
    use crate::stop_record::Gender;
    use crate::submission::StopSubmission;
    use chrono::{NaiveDate, NaiveTime};
    use std::io::Write;

    const HEADER: &str = "stop_date,stop_time,county_name,driver_gender,driver_age,\
driver_race,search_conducted,search_type,drugs_related_stop,stop_duration,violation,stop_outcome\n";

    #[tokio::test]
    async fn test_reads_rows_in_file_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{HEADER}2021-03-04,08:15,Kent,male,30,White,0,,0,0-15 Min,Speeding,Warning\n\
             2021-03-05,09:45,Kent,female,41,Black,1,Frisk,1,16-30 Min,DUI,Arrest Driver\n"
        )
        .unwrap();

        let store = CsvStore::new(file.path());
        let dataset = store.fetch_all().await.unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[0].violation, "Speeding");
        assert_eq!(dataset.records()[1].search_type, "Frisk");
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("missing.csv"));
        let err = store.fetch_all().await.unwrap_err();
        assert!(matches!(err, DashboardError::DataStoreUnavailable(_)));
    }

    #[tokio::test]
    async fn test_malformed_row_is_skipped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{HEADER}not-a-date,08:15,Kent,male,30,White,0,,0,0-15 Min,Speeding,Warning\n\
             2021-03-05,09:45,Kent,female,,Black,1,Frisk,1,16-30 Min,DUI,Arrest Driver\n\
             2021-03-06,10:00,Kent,male,52,White,0,,0,0-15 Min,Seatbelt,Citation\n"
        )
        .unwrap();

        let dataset = CsvStore::new(file.path()).fetch_all().await.unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.skipped_rows(), 2);
        assert_eq!(dataset.records()[0].violation, "Seatbelt");
    }

    #[tokio::test]
    async fn test_padded_duration_offered_and_matched() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{HEADER}2021-03-04,08:15,Kent,M,30,White,0,,0, 0-15 Min,Speeding,Arrest Driver\n\
             2021-03-05,09:45,Kent,M,30,White,0,,0, 0-15 Min,Speeding,Arrest Driver\n"
        )
        .unwrap();

        let dataset = CsvStore::new(file.path()).fetch_all().await.unwrap();
        let offered = dataset.stop_durations();
        assert_eq!(offered, vec!["0-15 Min"]);

        let form = StopSubmission {
            stop_date: NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
            stop_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            county_name: "Kent".to_string(),
            driver_gender: Gender::Male,
            driver_age: 30,
            driver_race: "White".to_string(),
            search_conducted: false,
            search_type: "None".to_string(),
            drugs_related_stop: false,
            stop_duration: offered[0].clone(),
            vehicle_number: "KA01AB0001".to_string(),
        };
        let candidate = form.validate(&offered).unwrap();
        let prediction = predict(&dataset, &candidate);
        assert_eq!(prediction.matched_records, 2);
        assert_eq!(prediction.predicted_outcome, "Arrest Driver");
        assert_eq!(prediction.predicted_violation, "Speeding");
    }
}
