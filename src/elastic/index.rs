//! The incident index abstraction used by the ingestion loader.

use super::bulk::WriteOutcome;
use super::error::ElasticError;
use super::mapping::MappingCheck;
use crate::incident::IncidentRecord;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Identity of the cluster behind an index.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterInfo {
    pub cluster_name: String,
    pub version: String,
}

/// Result of making sure the index exists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSetup {
    /// True if this call created the index.
    pub created: bool,
    /// Comparison of an existing index's mapping with the declared one.
    /// Always empty for a freshly created index.
    pub mapping: MappingCheck,
}

/// Aggregate figures read back after ingestion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexStats {
    pub total_documents: u64,
    pub by_severity: Vec<(String, u64)>,
    pub by_type: Vec<(String, u64)>,
    pub total_cost_usd: f64,
    pub total_downtime_hours: f64,
    pub avg_downtime_hours: Option<f64>,
}

impl IndexStats {
    /// Search body computing every figure in one request.
    pub fn query() -> Value {
        json!({
            "size": 0,
            "track_total_hits": true,
            "aggs": {
                "by_severity": { "terms": { "field": "severity", "size": 10 } },
                "by_type": { "terms": { "field": "incident_type", "size": 10 } },
                "total_cost_usd": { "sum": { "field": "cost_usd" } },
                "total_downtime_hours": { "sum": { "field": "downtime_hours" } },
                "avg_downtime_hours": { "avg": { "field": "downtime_hours" } }
            }
        })
    }

    pub fn from_search_response(response: &Value) -> Result<Self, ElasticError> {
        let total_documents = match &response["hits"]["total"] {
            Value::Object(total) => total.get("value").and_then(Value::as_u64),
            other => other.as_u64(),
        }
        .ok_or_else(|| ElasticError::InvalidResponse("Search response has no hit total".into()))?;

        let aggs = &response["aggregations"];
        Ok(Self {
            total_documents,
            by_severity: buckets(&aggs["by_severity"]),
            by_type: buckets(&aggs["by_type"]),
            total_cost_usd: aggs["total_cost_usd"]["value"].as_f64().unwrap_or(0.0),
            total_downtime_hours: aggs["total_downtime_hours"]["value"].as_f64().unwrap_or(0.0),
            avg_downtime_hours: aggs["avg_downtime_hours"]["value"].as_f64(),
        })
    }
}

fn buckets(agg: &Value) -> Vec<(String, u64)> {
    agg["buckets"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|b| {
                    let key = b["key"].as_str()?.to_string();
                    let count = b["doc_count"].as_u64()?;
                    Some((key, count))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// A named collection of incident documents keyed by `incident_id`.
///
/// Implementations must treat a write of an existing id as a replacement,
/// so that re-ingesting identical data never produces duplicates.
#[async_trait]
pub trait IncidentIndex: Send + Sync {
    /// Index name documents are written to.
    fn name(&self) -> &str;

    /// Check reachability and credentials. Called before any write.
    async fn verify_connection(&self) -> Result<ClusterInfo, ElasticError>;

    /// Create the index with the declared mapping if it does not exist,
    /// otherwise compare the live mapping against it.
    async fn ensure_index(&self, semantic_search: bool) -> Result<IndexSetup, ElasticError>;

    /// Write documents, returning one outcome per record in input order.
    /// An `Err` means the request as a whole failed and no per-document
    /// outcome is known.
    async fn bulk_upsert(&self, records: &[IncidentRecord])
        -> Result<Vec<WriteOutcome>, ElasticError>;

    async fn get_incident(&self, incident_id: &str)
        -> Result<Option<IncidentRecord>, ElasticError>;

    async fn stats(&self) -> Result<IndexStats, ElasticError>;
}
