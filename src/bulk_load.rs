use std::ops::AddAssign;

use elasticsearch::http::response::Response;
use elasticsearch::params::Refresh;
use elasticsearch::{BulkOperation, BulkOperations, BulkParts, Elasticsearch};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::Value;

use crate::error::DashboardError;
use crate::stop_record::StopRecord;

const DEFAULT_BATCH_SIZE: usize = 10_000;
const DEFAULT_SIMULTANEOUS_REQUESTS: usize = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadResults {
    pub num_total: usize,
    pub num_created: usize,
    pub num_failed: usize,
}

impl LoadResults {
    pub fn new() -> LoadResults {
        LoadResults::default()
    }
}

impl AddAssign for LoadResults {
    fn add_assign(&mut self, other: Self) {
        self.num_total += other.num_total;
        self.num_created += other.num_created;
        self.num_failed += other.num_failed;
    }
}

#[derive(Serialize)]
struct IndexedStop<'a> {
    row: usize,
    #[serde(flatten)]
    record: &'a StopRecord,
}

/// Bulk-indexes stop records; document ids and the `row` field are the
/// 1-based position of the record in the loaded file.
pub struct BulkStopLoad<'a> {
    client: &'a Elasticsearch,
    index: &'a str,
    batch_size: usize,
    throttle: usize,
    refresh: Refresh,
}

impl<'a> BulkStopLoad<'a> {
    pub fn new(client: &'a Elasticsearch, index: &'a str) -> BulkStopLoad<'a> {
        BulkStopLoad {
            client,
            index,
            batch_size: DEFAULT_BATCH_SIZE,
            throttle: DEFAULT_SIMULTANEOUS_REQUESTS,
            refresh: Refresh::False,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> BulkStopLoad<'a> {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_throttle(mut self, throttle: usize) -> BulkStopLoad<'a> {
        self.throttle = throttle.max(1);
        self
    }

    pub fn with_refresh(mut self, refresh: Refresh) -> BulkStopLoad<'a> {
        self.refresh = refresh;
        self
    }

    pub async fn load(&self, records: &[StopRecord]) -> Result<LoadResults, DashboardError> {
        let batches = records
            .chunks(self.batch_size)
            .enumerate()
            .map(|(n, batch)| (n * self.batch_size, batch));

        let mut responses = stream::iter(batches)
            .map(|(offset, batch)| self.load_batch(offset, batch))
            .buffer_unordered(self.throttle);

        let mut tally = LoadResults::new();
        while let Some(batch_results) = responses.next().await {
            tally += batch_results?;
        }
        Ok(tally)
    }

    async fn load_batch(
        &self,
        offset: usize,
        batch: &[StopRecord],
    ) -> Result<LoadResults, DashboardError> {
        let mut ops = BulkOperations::new();
        for (i, record) in batch.iter().enumerate() {
            let row = offset + i + 1;
            ops.push(BulkOperation::create(row.to_string(), IndexedStop { row, record }))
                .map_err(DashboardError::unavailable)?;
        }

        let response = self
            .client
            .bulk(BulkParts::Index(self.index))
            .body(vec![ops])
            .refresh(self.refresh)
            .send()
            .await
            .map_err(DashboardError::unavailable)?;

        let results = summarize_response(response).await?;
        tracing::info!(
            index = self.index,
            first_row = offset + 1,
            created = results.num_created,
            failed = results.num_failed,
            "bulk batch indexed"
        );
        Ok(results)
    }
}

async fn summarize_response(response: Response) -> Result<LoadResults, DashboardError> {
    let response = response
        .json::<Value>()
        .await
        .map_err(DashboardError::unavailable)?;
    tally_bulk_items(&response)
}

fn tally_bulk_items(response: &Value) -> Result<LoadResults, DashboardError> {
    let items = response["items"]
        .as_array()
        .ok_or_else(|| DashboardError::unavailable("bulk response without items"))?;
    let mut num_created = 0;
    let mut num_failed = 0;
    for item in items {
        match item.get("create") {
            Some(created_item) if created_item.get("error").is_some() => num_failed += 1,
            Some(_) => num_created += 1,
            None => {
                return Err(DashboardError::unavailable(
                    "found response besides create and errors",
                ))
            }
        }
    }
    Ok(LoadResults {
        num_failed,
        num_created,
        num_total: num_created + num_failed,
    })
}
