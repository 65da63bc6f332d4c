//! The fixed set of aggregate queries offered on the dashboard.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{json, Value};

use crate::dataset::{first_seen_counts, value_counts, Dataset};
use crate::error::DashboardError;
use crate::stop_record::contains_ignore_case;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CatalogQuery {
    TotalStops,
    StopsByViolation,
    ArrestsVsWarnings,
    AverageDriverAge,
    TopSearchTypes,
    StopsByGender,
    TopArrestViolation,
}

impl CatalogQuery {
    pub const ALL: [CatalogQuery; 7] = [
        CatalogQuery::TotalStops,
        CatalogQuery::StopsByViolation,
        CatalogQuery::ArrestsVsWarnings,
        CatalogQuery::AverageDriverAge,
        CatalogQuery::TopSearchTypes,
        CatalogQuery::StopsByGender,
        CatalogQuery::TopArrestViolation,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            CatalogQuery::TotalStops => "Total Number of Police Stops",
            CatalogQuery::StopsByViolation => "Count of Stops by Violation Type",
            CatalogQuery::ArrestsVsWarnings => "Number of Arrests vs. Warnings",
            CatalogQuery::AverageDriverAge => "Average Age of Drivers Stopped",
            CatalogQuery::TopSearchTypes => "Top 5 Most Frequent Search Types",
            CatalogQuery::StopsByGender => "Count of Stops by Gender",
            CatalogQuery::TopArrestViolation => "Most Common Violation for Arrests",
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            CatalogQuery::TotalStops => "total-stops",
            CatalogQuery::StopsByViolation => "stops-by-violation",
            CatalogQuery::ArrestsVsWarnings => "arrests-vs-warnings",
            CatalogQuery::AverageDriverAge => "average-driver-age",
            CatalogQuery::TopSearchTypes => "top-search-types",
            CatalogQuery::StopsByGender => "stops-by-gender",
            CatalogQuery::TopArrestViolation => "top-arrest-violation",
        }
    }

    /// Looks a query up by its title or its id.
    pub fn lookup(name: &str) -> Result<CatalogQuery, DashboardError> {
        let name = name.trim();
        CatalogQuery::ALL
            .into_iter()
            .find(|q| q.id().eq_ignore_ascii_case(name) || q.title() == name)
            .ok_or_else(|| DashboardError::InvalidQuery(name.to_string()))
    }

    pub fn execute(&self, dataset: &Dataset) -> QueryResult {
        let result = match self {
            CatalogQuery::TotalStops => {
                QueryResult::single("total_stops", json!(dataset.len()))
            }
            CatalogQuery::StopsByViolation => QueryResult::counts(
                "violation",
                value_counts(dataset.iter().map(|r| r.violation.as_str())),
            ),
            CatalogQuery::ArrestsVsWarnings => QueryResult::counts(
                "stop_outcome",
                first_seen_counts(dataset.iter().map(|r| r.stop_outcome.as_str())),
            ),
            CatalogQuery::AverageDriverAge => {
                let average = if dataset.is_empty() {
                    Value::Null
                } else {
                    let sum: u64 = dataset.iter().map(|r| u64::from(r.driver_age)).sum();
                    json!(sum as f64 / dataset.len() as f64)
                };
                QueryResult::single("average_age", average)
            }
            CatalogQuery::TopSearchTypes => {
                let mut counts = value_counts(
                    dataset
                        .iter()
                        .map(|r| r.search_type.as_str())
                        .filter(|t| !t.trim().is_empty()),
                );
                counts.truncate(5);
                QueryResult::counts("search_type", counts)
            }
            // grouped on the normalized gender, so `M` and `male` share a row
            CatalogQuery::StopsByGender => QueryResult::counts(
                "driver_gender",
                first_seen_counts(dataset.iter().map(|r| r.driver_gender.as_str())),
            ),
            CatalogQuery::TopArrestViolation => {
                let mut counts = value_counts(
                    dataset
                        .iter()
                        .filter(|r| contains_ignore_case(&r.stop_outcome, "arrest"))
                        .map(|r| r.violation.as_str()),
                );
                counts.truncate(1);
                QueryResult::counts("violation", counts)
            }
        };
        tracing::debug!(query = self.id(), rows = result.rows.len(), "ran catalog query");
        result
    }
}

impl fmt::Display for CatalogQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for CatalogQuery {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CatalogQuery::lookup(s)
    }
}

/// Runs the named query over a snapshot.
pub fn run(name: &str, dataset: &Dataset) -> Result<QueryResult, DashboardError> {
    Ok(CatalogQuery::lookup(name)?.execute(dataset))
}

/// A small table: named columns and rows of JSON cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    fn single(column: &str, value: Value) -> QueryResult {
        QueryResult {
            columns: vec![column.to_string()],
            rows: vec![vec![value]],
        }
    }

    fn counts(column: &str, counts: Vec<(&str, usize)>) -> QueryResult {
        QueryResult {
            columns: vec![column.to_string(), "count".to_string()],
            rows: counts
                .into_iter()
                .map(|(value, count)| vec![json!(value), json!(count)])
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
