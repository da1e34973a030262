//! HTTP client for the hosted search cluster.

use super::bulk::{decode_bulk_response, encode_bulk, WriteOutcome};
use super::error::ElasticError;
use super::esql::EsqlTable;
use super::index::{ClusterInfo, IncidentIndex, IndexSetup, IndexStats};
use super::mapping::{check_mapping, index_body, properties_from_response};
use crate::incident::IncidentRecord;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Client bound to one cluster and one index.
pub struct ElasticClient {
    client: Client,
    base_url: String,
    api_key: String,
    index: String,
}

impl ElasticClient {
    /// # Arguments
    /// * `base_url` - Cluster URL, e.g. "https://abc.us-central1.gcp.cloud.es.io".
    /// * `api_key` - Encoded API key sent as `Authorization: ApiKey <key>`.
    /// * `index` - Index all document operations target.
    /// * `timeout` - Per-request timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        index: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ElasticError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ElasticError::Connection(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            index: index.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("Authorization", format!("ApiKey {}", self.api_key))
    }

    /// Send a request, turning transport, auth and throttling failures into
    /// errors. Other statuses are left to the caller.
    async fn execute(&self, builder: RequestBuilder) -> Result<Response, ElasticError> {
        let response = builder.send().await.map_err(ElasticError::from_reqwest)?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let message = response.text().await.unwrap_or_default();
            return Err(ElasticError::Unauthorized {
                status: status.as_u16(),
                message,
            });
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ElasticError::RateLimited);
        }
        Ok(response)
    }

    async fn json_body(response: Response) -> Result<Value, ElasticError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ElasticError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        response
            .json()
            .await
            .map_err(|e| ElasticError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }

    /// `GET /`
    pub async fn info(&self) -> Result<ClusterInfo, ElasticError> {
        let response = self.execute(self.request(Method::GET, "/")).await?;
        let body = Self::json_body(response).await?;
        Ok(ClusterInfo {
            cluster_name: body["cluster_name"].as_str().unwrap_or("unknown").to_string(),
            version: body["version"]["number"].as_str().unwrap_or("unknown").to_string(),
        })
    }

    /// `HEAD /{index}`
    pub async fn index_exists(&self) -> Result<bool, ElasticError> {
        let path = format!("/{}", self.index);
        let response = self.execute(self.request(Method::HEAD, &path)).await?;
        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(ElasticError::Api {
                status: s.as_u16(),
                message: format!("Unexpected status checking index {}", self.index),
            }),
        }
    }

    /// `PUT /{index}`. Returns false if the index already existed.
    pub async fn create_index(&self, body: &Value) -> Result<bool, ElasticError> {
        let path = format!("/{}", self.index);
        let response = self
            .execute(self.request(Method::PUT, &path).json(body))
            .await?;
        if response.status() == StatusCode::BAD_REQUEST {
            let text = response.text().await.unwrap_or_default();
            if text.contains("resource_already_exists_exception") {
                return Ok(false);
            }
            return Err(ElasticError::Api {
                status: 400,
                message: text,
            });
        }
        Self::json_body(response).await?;
        Ok(true)
    }

    /// `GET /{index}/_mapping`
    pub async fn get_mapping(&self) -> Result<Value, ElasticError> {
        let path = format!("/{}/_mapping", self.index);
        let response = self.execute(self.request(Method::GET, &path)).await?;
        Self::json_body(response).await
    }

    /// `POST /_bulk?refresh=wait_for` with one `index` action per record.
    pub async fn bulk(&self, records: &[IncidentRecord]) -> Result<Vec<WriteOutcome>, ElasticError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let body = encode_bulk(&self.index, records)?;
        debug!(index = %self.index, documents = records.len(), "Sending bulk request");

        let response = self
            .execute(
                self.request(Method::POST, "/_bulk?refresh=wait_for")
                    .header("Content-Type", "application/x-ndjson")
                    .body(body),
            )
            .await?;
        let body = Self::json_body(response).await?;
        decode_bulk_response(&body, records.len())
    }

    /// `GET /{index}/_doc/{id}`
    pub async fn get_document(&self, id: &str) -> Result<Option<IncidentRecord>, ElasticError> {
        let path = format!("/{}/_doc/{}", self.index, urlencoding::encode(id));
        let response = self.execute(self.request(Method::GET, &path)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = Self::json_body(response).await?;
        if !body["found"].as_bool().unwrap_or(false) {
            return Ok(None);
        }
        let source = body.get("_source").cloned().ok_or_else(|| {
            ElasticError::InvalidResponse(format!("Document {} has no _source", id))
        })?;
        serde_json::from_value(source)
            .map(Some)
            .map_err(|e| ElasticError::InvalidResponse(format!("Bad document {}: {}", id, e)))
    }

    /// `POST /{index}/_search`
    pub async fn search(&self, body: &Value) -> Result<Value, ElasticError> {
        let path = format!("/{}/_search", self.index);
        let response = self
            .execute(self.request(Method::POST, &path).json(body))
            .await?;
        Self::json_body(response).await
    }

    /// `POST /_query`. The query names its own source index.
    pub async fn esql(&self, query: &str) -> Result<EsqlTable, ElasticError> {
        debug!(query = %query, "Running ES|QL query");
        let response = self
            .execute(
                self.request(Method::POST, "/_query")
                    .json(&EsqlTable::request_body(query)),
            )
            .await?;
        EsqlTable::from_response(Self::json_body(response).await?)
    }
}

#[async_trait]
impl IncidentIndex for ElasticClient {
    fn name(&self) -> &str {
        &self.index
    }

    async fn verify_connection(&self) -> Result<ClusterInfo, ElasticError> {
        let info = self.info().await?;
        info!(
            cluster = %info.cluster_name,
            version = %info.version,
            url = %self.base_url,
            "Connected to search cluster"
        );
        Ok(info)
    }

    async fn ensure_index(&self, semantic_search: bool) -> Result<IndexSetup, ElasticError> {
        if !self.index_exists().await? && self.create_index(&index_body(semantic_search)).await? {
            info!(index = %self.index, semantic_search, "Created index");
            return Ok(IndexSetup {
                created: true,
                ..Default::default()
            });
        }

        let response = self.get_mapping().await?;
        let properties = properties_from_response(&response, &self.index).ok_or_else(|| {
            ElasticError::InvalidResponse(format!("No mapping returned for {}", self.index))
        })?;
        let mapping = check_mapping(properties);
        if !mapping.missing.is_empty() {
            warn!(
                index = %self.index,
                fields = ?mapping.missing,
                "Existing index does not declare some incident fields"
            );
        }
        info!(index = %self.index, "Index already exists");
        Ok(IndexSetup {
            created: false,
            mapping,
        })
    }

    async fn bulk_upsert(
        &self,
        records: &[IncidentRecord],
    ) -> Result<Vec<WriteOutcome>, ElasticError> {
        self.bulk(records).await
    }

    async fn get_incident(
        &self,
        incident_id: &str,
    ) -> Result<Option<IncidentRecord>, ElasticError> {
        self.get_document(incident_id).await
    }

    async fn stats(&self) -> Result<IndexStats, ElasticError> {
        let response = self.search(&IndexStats::query()).await?;
        IndexStats::from_search_response(&response)
    }
}
