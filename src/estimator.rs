//! Majority-vote estimate of a new stop's violation and outcome.
//!
//! Historical stops that agree with the candidate on every matching feature
//! vote; the most common violation and the most common outcome win
//! independently of each other.

use serde::{Deserialize, Serialize};

use crate::dataset::{first_seen_counts, Dataset};
use crate::stop_record::{Gender, StopRecord};

pub const DEFAULT_OUTCOME: &str = "warning";
pub const DEFAULT_VIOLATION: &str = "speeding";

/// Features of a submitted stop that are compared against history.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CandidateQuery {
    pub driver_gender: Gender,
    pub driver_age: u32,
    pub search_conducted: bool,
    pub stop_duration: String,
    pub drugs_related_stop: bool,
}

impl CandidateQuery {
    /// Exact equality on all five features.
    pub fn matches(&self, record: &StopRecord) -> bool {
        record.driver_gender == self.driver_gender
            && record.driver_age == self.driver_age
            && record.search_conducted == self.search_conducted
            && record.stop_duration == self.stop_duration
            && record.drugs_related_stop == self.drugs_related_stop
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictionResult {
    pub predicted_violation: String,
    pub predicted_outcome: String,
    /// Number of historical stops that voted; zero means the defaults were used.
    pub matched_records: usize,
}

impl PredictionResult {
    fn fallback() -> PredictionResult {
        PredictionResult {
            predicted_violation: DEFAULT_VIOLATION.to_string(),
            predicted_outcome: DEFAULT_OUTCOME.to_string(),
            matched_records: 0,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.matched_records == 0
    }
}

pub fn predict(dataset: &Dataset, query: &CandidateQuery) -> PredictionResult {
    let similar: Vec<&StopRecord> = dataset.iter().filter(|r| query.matches(r)).collect();

    let outcome = mode(similar.iter().map(|r| r.stop_outcome.as_str()));
    let violation = mode(similar.iter().map(|r| r.violation.as_str()));

    let result = match (violation, outcome) {
        (Some(violation), Some(outcome)) => PredictionResult {
            predicted_violation: violation.to_string(),
            predicted_outcome: outcome.to_string(),
            matched_records: similar.len(),
        },
        _ => PredictionResult::fallback(),
    };

    tracing::debug!(
        matched = result.matched_records,
        violation = %result.predicted_violation,
        outcome = %result.predicted_outcome,
        "estimated stop outcome"
    );
    result
}

/// Most frequent value; the earliest value wins a tie.
pub fn mode<'a, I>(values: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&str, usize)> = None;
    for (value, count) in first_seen_counts(values) {
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((value, count)),
        }
    }
    best.map(|(value, _)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::stop;

    fn query() -> CandidateQuery {
        CandidateQuery {
            driver_gender: Gender::Male,
            driver_age: 30,
            search_conducted: false,
            stop_duration: "5-10 min".to_string(),
            drugs_related_stop: false,
        }
    }

    fn matching(violation: &str, outcome: &str) -> StopRecord {
        let mut record = stop(violation, outcome);
        record.driver_age = 30;
        record.stop_duration = "5-10 min".to_string();
        record
    }

    #[test]
    fn test_tie_goes_to_first_encountered_outcome() {
        let dataset = Dataset::new(vec![
            matching("speeding", "warning"),
            matching("speeding", "citation"),
        ]);
        let result = predict(&dataset, &query());
        assert_eq!(result.predicted_violation, "speeding");
        assert_eq!(result.predicted_outcome, "warning");
        assert_eq!(result.matched_records, 2);
    }

    #[test]
    fn test_no_match_returns_defaults() {
        let mut other = matching("seatbelt", "arrest");
        other.driver_gender = Gender::Female;
        let dataset = Dataset::new(vec![other]);
        let result = predict(&dataset, &query());
        assert_eq!(result.predicted_outcome, "warning");
        assert_eq!(result.predicted_violation, "speeding");
        assert!(result.is_fallback());
    }

    #[test]
    fn test_empty_dataset_returns_defaults() {
        let result = predict(&Dataset::empty(), &query());
        assert_eq!(result, PredictionResult::fallback());
    }

    #[test]
    fn test_modes_are_independent() {
        let dataset = Dataset::new(vec![
            matching("equipment", "arrest"),
            matching("speeding", "citation"),
            matching("speeding", "warning"),
            matching("equipment", "citation"),
            matching("speeding", "arrest"),
            matching("moving violation", "citation"),
        ]);
        let result = predict(&dataset, &query());
        assert_eq!(result.predicted_violation, "speeding");
        assert_eq!(result.predicted_outcome, "citation");
    }

    #[test]
    fn test_every_feature_must_match() {
        let mut searched = matching("dui", "arrest");
        searched.search_conducted = true;
        let mut drugs = matching("dui", "arrest");
        drugs.drugs_related_stop = true;
        let mut older = matching("dui", "arrest");
        older.driver_age = 31;
        let mut longer = matching("dui", "arrest");
        longer.stop_duration = "30+ min".to_string();
        let dataset =
            Dataset::new(vec![searched, drugs, older, longer, matching("other", "citation")]);

        let result = predict(&dataset, &query());
        assert_eq!(result.predicted_violation, "other");
        assert_eq!(result.predicted_outcome, "citation");
        assert_eq!(result.matched_records, 1);
    }

    #[test]
    fn test_out_of_range_age_still_runs() {
        let mut q = query();
        q.driver_age = 7;
        let mut young = matching("speeding", "citation");
        young.driver_age = 7;
        let result = predict(&Dataset::new(vec![young]), &q);
        assert_eq!(result.predicted_outcome, "citation");
    }

    #[test]
    fn test_mode_prefers_earliest_on_tie() {
        assert_eq!(mode(["b", "a", "a", "b"]), Some("b"));
        assert_eq!(mode(["b", "a", "a"]), Some("a"));
        assert_eq!(mode(std::iter::empty::<&str>()), None);
    }
}
