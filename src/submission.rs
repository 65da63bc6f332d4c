//! New-stop form: validation into a [`CandidateQuery`] and the prediction summary.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::DashboardError;
use crate::estimator::{CandidateQuery, PredictionResult};
use crate::stop_record::Gender;

pub const MIN_DRIVER_AGE: u32 = 16;
pub const MAX_DRIVER_AGE: u32 = 100;

/// Everything entered on the "add new police log" form.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StopSubmission {
    pub stop_date: NaiveDate,
    pub stop_time: NaiveTime,
    pub county_name: String,
    pub driver_gender: Gender,
    pub driver_age: u32,
    pub driver_race: String,
    pub search_conducted: bool,
    pub search_type: String,
    pub drugs_related_stop: bool,
    pub stop_duration: String,
    pub vehicle_number: String,
}

impl StopSubmission {
    /// Checks the form and extracts the features used for prediction.
    ///
    /// `durations` are the stop durations offered by the current snapshot;
    /// when it is empty any duration is accepted.
    pub fn validate(&self, durations: &[String]) -> Result<CandidateQuery, DashboardError> {
        let required = [
            ("county name", &self.county_name),
            ("driver race", &self.driver_race),
            ("search type", &self.search_type),
            ("stop duration", &self.stop_duration),
            ("vehicle number", &self.vehicle_number),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(DashboardError::invalid_submission(format!("{field} is required")));
        }
        if !(MIN_DRIVER_AGE..=MAX_DRIVER_AGE).contains(&self.driver_age) {
            return Err(DashboardError::invalid_submission(format!(
                "driver age must be between {MIN_DRIVER_AGE} and {MAX_DRIVER_AGE}, got {}",
                self.driver_age
            )));
        }
        let entered = self.stop_duration.trim();
        let stop_duration = if durations.is_empty() {
            entered
        } else {
            // the offered value, as stored, is what the estimator compares against
            durations.iter().map(String::as_str).find(|d| d.trim() == entered).ok_or_else(|| {
                DashboardError::invalid_submission(format!(
                    "stop duration '{entered}' is not one of: {}",
                    durations.join(", ")
                ))
            })?
        };

        Ok(CandidateQuery {
            driver_gender: self.driver_gender,
            driver_age: self.driver_age,
            search_conducted: self.search_conducted,
            stop_duration: stop_duration.to_string(),
            drugs_related_stop: self.drugs_related_stop,
        })
    }
}

/// Natural-language summary of a prediction for a submitted stop.
#[derive(Debug, Clone, Copy)]
pub struct PredictionSummary<'a> {
    pub submission: &'a StopSubmission,
    pub prediction: &'a PredictionResult,
}

impl<'a> PredictionSummary<'a> {
    pub fn new(submission: &'a StopSubmission, prediction: &'a PredictionResult) -> Self {
        PredictionSummary { submission, prediction }
    }
}

impl fmt::Display for PredictionSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.submission;
        let search_text = if s.search_conducted {
            "A search was conducted"
        } else {
            "No search was conducted"
        };
        let drug_text = if s.drugs_related_stop {
            "was drug-related"
        } else {
            "was not drug-related"
        };

        writeln!(f, "Prediction Summary")?;
        writeln!(f, "- Predicted Violation: {}", self.prediction.predicted_violation)?;
        writeln!(f, "- Predicted Stop Outcome: {}", self.prediction.predicted_outcome)?;
        writeln!(f)?;
        writeln!(
            f,
            "A {}-year-old {} driver in {} was stopped at {} on {}.",
            s.driver_age,
            s.driver_gender,
            s.county_name,
            s.stop_time.format("%I:%M %p"),
            s.stop_date
        )?;
        writeln!(f, "{search_text}, and the stop {drug_text}.")?;
        writeln!(f, "Stop duration: {}.", s.stop_duration)?;
        write!(f, "Vehicle Number: {}.", s.vehicle_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> StopSubmission {
        StopSubmission {
            stop_date: NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
            stop_time: NaiveTime::from_hms_opt(14, 5, 0).unwrap(),
            county_name: "Kent".to_string(),
            driver_gender: Gender::Female,
            driver_age: 27,
            driver_race: "Asian".to_string(),
            search_conducted: false,
            search_type: "None".to_string(),
            drugs_related_stop: true,
            stop_duration: "0-15 Min".to_string(),
            vehicle_number: "TN09XY4321".to_string(),
        }
    }

    #[test]
    fn test_valid_submission_becomes_candidate() {
        let query = submission().validate(&["0-15 Min".to_string()]).unwrap();
        assert_eq!(
            query,
            CandidateQuery {
                driver_gender: Gender::Female,
                driver_age: 27,
                search_conducted: false,
                stop_duration: "0-15 Min".to_string(),
                drugs_related_stop: true,
            }
        );
    }

    #[test]
    fn test_blank_field_rejected() {
        let mut form = submission();
        form.vehicle_number = "  ".to_string();
        let err = form.validate(&[]).unwrap_err();
        let DashboardError::InvalidSubmission(msg) = err else {
            panic!("expected an invalid submission");
        };
        assert_eq!(msg, "vehicle number is required");
    }

    #[test]
    fn test_age_range_enforced() {
        let mut form = submission();
        form.driver_age = 15;
        assert!(form.validate(&[]).is_err());
        form.driver_age = 101;
        assert!(form.validate(&[]).is_err());
        form.driver_age = 100;
        assert!(form.validate(&[]).is_ok());
    }

    #[test]
    fn test_unknown_duration_rejected_when_choices_exist() {
        let mut form = submission();
        form.stop_duration = "2 hours".to_string();
        assert!(form.validate(&["0-15 Min".to_string()]).is_err());
        assert!(form.validate(&[]).is_ok());
    }

    #[test]
    fn test_duration_matches_offered_value() {
        let mut form = submission();
        form.stop_duration = " 0-15 Min ".to_string();
        let query = form.validate(&["16-30 Min".to_string(), "0-15 Min".to_string()]).unwrap();
        assert_eq!(query.stop_duration, "0-15 Min");
    }

    #[test]
    fn test_summary_text() {
        let form = submission();
        let prediction = PredictionResult {
            predicted_violation: "Speeding".to_string(),
            predicted_outcome: "Citation".to_string(),
            matched_records: 4,
        };
        let text = PredictionSummary::new(&form, &prediction).to_string();
        assert_eq!(
            text,
            "Prediction Summary\n\
             - Predicted Violation: Speeding\n\
             - Predicted Stop Outcome: Citation\n\
             \n\
             A 27-year-old female driver in Kent was stopped at 02:05 PM on 2024-05-17.\n\
             No search was conducted, and the stop was drug-related.\n\
             Stop duration: 0-15 Min.\n\
             Vehicle Number: TN09XY4321."
        );
    }
}
