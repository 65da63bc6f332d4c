use async_trait::async_trait;

use crate::dataset::Dataset;
use crate::error::DashboardError;
use crate::query_catalog::{CatalogQuery, QueryResult};

/// Source of the stop log. Each call reads a fresh copy of the table.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn fetch_all(&self) -> Result<Dataset, DashboardError>;

    /// Evaluates a catalog query against a freshly fetched snapshot.
    async fn fetch_aggregate(&self, query: CatalogQuery) -> Result<QueryResult, DashboardError> {
        let dataset = self.fetch_all().await?;
        Ok(query.execute(&dataset))
    }

    fn describe(&self) -> String;
}

/// The dataset used for one interaction, and why it is empty if the store failed.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub dataset: Dataset,
    pub notice: Option<String>,
}

impl Snapshot {
    /// Fetches the whole log; an unreachable store degrades to an empty snapshot.
    pub async fn take(store: &dyn DataStore) -> Snapshot {
        match store.fetch_all().await {
            Ok(dataset) => {
                let skipped = dataset.skipped_rows();
                tracing::info!(
                    store = %store.describe(),
                    records = dataset.len(),
                    skipped,
                    "fetched stop log"
                );
                let notice = (skipped > 0)
                    .then(|| format!("Skipped {skipped} unreadable row(s) in the stop log."));
                Snapshot { dataset, notice }
            }
            Err(err) => {
                tracing::warn!(store = %store.describe(), error = %err, "serving empty stop log");
                Snapshot {
                    dataset: Dataset::empty(),
                    notice: Some(format!("Database connection error: {err}")),
                }
            }
        }
    }
}
