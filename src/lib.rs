//! Traffic-stop ledger dashboard.
//!
//! The stop log is read from a [`DataStore`](data_store::DataStore) once per
//! interaction; the resulting [`Dataset`](dataset::Dataset) feeds the key
//! metrics, the canned [`query_catalog`] and the majority-vote
//! [`estimator`].

pub mod bulk_load;
pub mod config;
pub mod csv_store;
pub mod data_store;
pub mod dataset;
pub mod elastic_store;
pub mod error;
pub mod estimator;
pub mod query_catalog;
pub mod report;
pub mod server;
pub mod stop_record;
pub mod submission;

pub use data_store::{DataStore, Snapshot};
pub use dataset::Dataset;
pub use error::DashboardError;
pub use estimator::{predict, CandidateQuery, PredictionResult};
pub use query_catalog::{CatalogQuery, QueryResult};
pub use stop_record::{Gender, StopRecord};

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{NaiveDate, NaiveTime};

    use crate::stop_record::{Gender, StopRecord};

    /// A 30-year-old male driver, no search, not drug related, 0-15 Min.
    pub fn stop(violation: &str, outcome: &str) -> StopRecord {
        StopRecord {
            stop_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            stop_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            county_name: "Kent".to_string(),
            driver_gender: Gender::Male,
            driver_age: 30,
            driver_race: "White".to_string(),
            search_conducted: false,
            search_type: String::new(),
            drugs_related_stop: false,
            stop_duration: "0-15 Min".to_string(),
            violation: violation.to_string(),
            stop_outcome: outcome.to_string(),
            vehicle_number: None,
        }
    }
}
