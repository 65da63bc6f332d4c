use async_trait::async_trait;
use elasticsearch::auth::Credentials;
use elasticsearch::cert::CertificateValidation;
use elasticsearch::http::transport::SingleNodeConnectionPool;
use elasticsearch::http::transport::TransportBuilder;
use elasticsearch::http::Url;
use elasticsearch::{Elasticsearch, SearchParts};
use serde_json::{json, Value};

use crate::bulk_load::BulkStopLoad;
use crate::data_store::DataStore;
use crate::dataset::Dataset;
use crate::error::DashboardError;
use crate::stop_record::StopRecord;

pub const DEFAULT_INDEX: &str = "police-logs";
const DEFAULT_PAGE_SIZE: usize = 1_000;

/// Stop log held in an Elasticsearch index, one document per row.
///
/// Documents carry a `row` field written by the bulk loader; reads page
/// through the index in `row` order with `search_after`.
pub struct ElasticStore {
    client: Elasticsearch,
    uri: String,
    index: String,
    page_size: usize,
}

impl ElasticStore {
    pub fn builder() -> ElasticStoreBuilder {
        ElasticStoreBuilder::new()
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn bulk_loader(&self) -> BulkStopLoad<'_> {
        BulkStopLoad::new(&self.client, &self.index)
    }

    async fn fetch_page(&self, search_after: Option<&Value>) -> Result<Vec<Value>, DashboardError> {
        let mut body = json!({
            "size": self.page_size,
            "query": { "match_all": {} },
            "sort": [{ "row": "asc" }],
        });
        if let Some(after) = search_after {
            body["search_after"] = after.clone();
        }

        let response = self
            .client
            .search(SearchParts::Index(&[self.index.as_str()]))
            .body(body)
            .send()
            .await
            .map_err(DashboardError::unavailable)?
            .error_for_status_code()
            .map_err(DashboardError::unavailable)?;
        let mut page = response
            .json::<Value>()
            .await
            .map_err(DashboardError::unavailable)?;

        match page["hits"]["hits"].take() {
            Value::Array(hits) => Ok(hits),
            _ => Err(DashboardError::unavailable("search response without hits")),
        }
    }
}

#[async_trait]
impl DataStore for ElasticStore {
    async fn fetch_all(&self) -> Result<Dataset, DashboardError> {
        let mut records = Vec::new();
        let mut search_after: Option<Value> = None;
        loop {
            let hits = self.fetch_page(search_after.as_ref()).await?;
            let page_len = hits.len();
            for mut hit in hits {
                search_after = Some(hit["sort"].take());
                let record: StopRecord = serde_json::from_value(hit["_source"].take())
                    .map_err(|e| {
                        DashboardError::unavailable(format!("malformed stop document: {e}"))
                    })?;
                records.push(record);
            }
            tracing::debug!(
                index = %self.index,
                page = page_len,
                total = records.len(),
                "read stop page"
            );
            if page_len < self.page_size {
                break;
            }
        }
        Ok(Dataset::new(records))
    }

    fn describe(&self) -> String {
        format!("elasticsearch:{}/{}", self.uri.trim_end_matches('/'), self.index)
    }
}

pub struct ElasticStoreBuilder {
    uri: String,
    credentials: Option<Credentials>,
    index: Option<String>,
    page_size: usize,
}

impl ElasticStoreBuilder {
    pub fn new() -> ElasticStoreBuilder {
        ElasticStoreBuilder {
            uri: String::from("https://127.0.0.1:9200/"),
            credentials: None,
            index: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_uri(mut self, uri: String) -> ElasticStoreBuilder {
        self.uri = uri;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> ElasticStoreBuilder {
        self.credentials = Option::from(credentials);
        self
    }

    pub fn with_index(mut self, index: String) -> ElasticStoreBuilder {
        self.index = Some(index);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> ElasticStoreBuilder {
        self.page_size = page_size.max(1);
        self
    }

    pub fn build(self) -> Result<ElasticStore, DashboardError> {
        let url = Url::parse(&self.uri).map_err(|e| {
            DashboardError::Config(format!("invalid Elasticsearch url '{}': {e}", self.uri))
        })?;
        let conn_pool = SingleNodeConnectionPool::new(url);
        let mut transport_builder = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .cert_validation(CertificateValidation::None);
        if let Some(credentials) = self.credentials {
            transport_builder = transport_builder.auth(credentials);
        }
        let transport = transport_builder
            .build()
            .map_err(|e| DashboardError::Config(e.to_string()))?;
        let client = Elasticsearch::new(transport);
        match self.index {
            Some(index) => Ok(ElasticStore {
                client,
                uri: self.uri,
                index,
                page_size: self.page_size,
            }),
            None => Err(DashboardError::Config("Index name is required.".into())),
        }
    }
}

impl Default for ElasticStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_index() {
        let err = ElasticStore::builder().build().err().unwrap();
        assert!(matches!(err, DashboardError::Config(msg) if msg.contains("Index")));
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        let result = ElasticStore::builder()
            .with_uri("not a url".to_string())
            .with_index(DEFAULT_INDEX.to_string())
            .build();
        assert!(matches!(result, Err(DashboardError::Config(_))));
    }

    #[test]
    fn test_describe_names_index() {
        let store = ElasticStore::builder()
            .with_uri("http://localhost:9200/".to_string())
            .with_index("stops".to_string())
            .with_page_size(0)
            .build()
            .unwrap();
        assert_eq!(store.describe(), "elasticsearch:http://localhost:9200/stops");
        assert_eq!(store.page_size, 1);
    }

    #[tokio::test]
    async fn test_unreachable_cluster_is_unavailable() {
        let store = ElasticStore::builder()
            .with_uri("http://127.0.0.1:1/".to_string())
            .with_index("stops".to_string())
            .build()
            .unwrap();
        let err = store.fetch_all().await.unwrap_err();
        assert!(matches!(err, DashboardError::DataStoreUnavailable(_)));
    }
}
