use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

use crate::stop_record::{StopLog, StopRecord};

/// Read-only snapshot of the stop log, in table order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<StopRecord>,
    skipped_rows: usize,
}

impl Dataset {
    pub fn new(records: Vec<StopRecord>) -> Dataset {
        Dataset {
            records,
            skipped_rows: 0,
        }
    }

    pub fn with_skipped_rows(mut self, skipped_rows: usize) -> Dataset {
        self.skipped_rows = skipped_rows;
        self
    }

    /// Rows of the source that could not be read into a record.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    pub fn empty() -> Dataset {
        Dataset::default()
    }

    pub fn records(&self) -> &[StopRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StopRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn metrics(&self) -> KeyMetrics {
        let mut metrics = KeyMetrics {
            total_stops: self.records.len(),
            ..KeyMetrics::default()
        };
        for record in &self.records {
            if record.is_arrest() {
                metrics.arrests += 1;
            }
            if record.is_warning() {
                metrics.warnings += 1;
            }
            if record.drugs_related_stop {
                metrics.drug_related_stops += 1;
            }
        }
        metrics
    }

    /// Distinct non-blank stop durations, in the order they first appear.
    ///
    /// Values are offered exactly as stored so a chosen duration matches
    /// its records.
    pub fn stop_durations(&self) -> Vec<String> {
        let mut seen = Vec::<String>::new();
        for record in &self.records {
            let duration = record.stop_duration.as_str();
            if !duration.trim().is_empty() && !seen.iter().any(|d| d == duration) {
                seen.push(duration.to_string());
            }
        }
        seen
    }

    pub fn violation_chart(&self) -> Chart {
        Chart::from_counts(
            "Stops by Violation Type",
            value_counts(self.records.iter().map(|r| r.violation.as_str())),
            self.records.len(),
        )
    }

    /// Labels are the normalized `male`/`female`, whichever spelling
    /// (`M`, `F`, ...) the log stores.
    pub fn gender_chart(&self) -> Chart {
        Chart::from_counts(
            "Driver Gender Distribution",
            value_counts(self.records.iter().map(|r| r.driver_gender.as_str())),
            self.records.len(),
        )
    }
}

impl From<Vec<StopRecord>> for Dataset {
    fn from(records: Vec<StopRecord>) -> Self {
        Dataset::new(records)
    }
}

impl From<StopLog> for Dataset {
    fn from(log: StopLog) -> Self {
        Dataset::new(log.records).with_skipped_rows(log.skipped_rows)
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a StopRecord;
    type IntoIter = std::slice::Iter<'a, StopRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KeyMetrics {
    pub total_stops: usize,
    pub arrests: usize,
    pub warnings: usize,
    pub drug_related_stops: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSlice {
    pub label: String,
    pub count: usize,
    /// Fraction of all stops in the snapshot, 0.0 to 1.0.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: &'static str,
    pub slices: Vec<ChartSlice>,
}

impl Chart {
    fn from_counts(title: &'static str, counts: Vec<(&str, usize)>, total: usize) -> Chart {
        let slices = counts
            .into_iter()
            .map(|(label, count)| ChartSlice {
                label: label.to_string(),
                count,
                share: if total == 0 { 0.0 } else { count as f64 / total as f64 },
            })
            .collect();
        Chart { title, slices }
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

/// Counts occurrences of each value, ordered by descending count.
/// Equal counts keep the order in which the values were first seen.
pub fn value_counts<T, I>(values: I) -> Vec<(T, usize)>
where
    T: Eq + Hash + Copy,
    I: IntoIterator<Item = T>,
{
    let mut counts = first_seen_counts(values);
    // stable sort keeps first-seen order among ties
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Counts occurrences of each value, in the order values were first seen.
pub fn first_seen_counts<T, I>(values: I) -> Vec<(T, usize)>
where
    T: Eq + Hash + Copy,
    I: IntoIterator<Item = T>,
{
    let mut slots: HashMap<T, usize> = HashMap::new();
    let mut counts: Vec<(T, usize)> = Vec::new();
    for value in values {
        match slots.get(&value) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                slots.insert(value, counts.len());
                counts.push((value, 1));
            }
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::stop;

    #[test]
    fn test_metrics_match_outcome_text() {
        let mut a = stop("Speeding", "Arrest Driver");
        a.drugs_related_stop = true;
        let dataset = Dataset::new(vec![
            a,
            stop("Speeding", "Warning"),
            stop("Seatbelt", "Citation"),
            stop("Other", "ARREST passenger"),
        ]);
        let metrics = dataset.metrics();
        assert_eq!(metrics.total_stops, 4);
        assert_eq!(metrics.arrests, 2);
        assert_eq!(metrics.warnings, 1);
        assert_eq!(metrics.drug_related_stops, 1);
    }

    #[test]
    fn test_empty_dataset_metrics_and_charts() {
        let dataset = Dataset::empty();
        assert_eq!(dataset.metrics(), KeyMetrics::default());
        assert!(dataset.violation_chart().is_empty());
        assert!(dataset.gender_chart().is_empty());
        assert!(dataset.stop_durations().is_empty());
    }

    #[test]
    fn test_value_counts_descending_with_stable_ties() {
        let counts = value_counts(["b", "a", "c", "a", "c", "d"]);
        assert_eq!(counts, vec![("a", 2), ("c", 2), ("b", 1), ("d", 1)]);
    }

    #[test]
    fn test_violation_chart_shares() {
        let dataset = Dataset::new(vec![
            stop("Speeding", "Warning"),
            stop("Speeding", "Citation"),
            stop("Seatbelt", "Warning"),
            stop("Speeding", "Warning"),
        ]);
        let chart = dataset.violation_chart();
        assert_eq!(chart.slices.len(), 2);
        assert_eq!(chart.slices[0].label, "Speeding");
        assert_eq!(chart.slices[0].count, 3);
        assert!((chart.slices[0].share - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stop_durations_first_seen_and_non_empty() {
        let mut a = stop("Speeding", "Warning");
        a.stop_duration = "16-30 Min".to_string();
        let mut b = stop("Speeding", "Warning");
        b.stop_duration = " ".to_string();
        let c = stop("Speeding", "Warning");
        let d = a.clone();
        let dataset = Dataset::new(vec![a, b, c, d]);
        assert_eq!(dataset.stop_durations(), vec!["16-30 Min", "0-15 Min"]);
    }

    #[test]
    fn test_skipped_rows_carried_from_log() {
        let log = StopLog {
            records: vec![stop("Speeding", "Warning")],
            skipped_rows: 3,
        };
        let dataset = Dataset::from(log);
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.skipped_rows(), 3);
        assert_eq!(Dataset::empty().skipped_rows(), 0);
    }
}
