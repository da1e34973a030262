//! In-process index used for dry runs and tests.

use super::bulk::{WriteFailure, WriteOutcome};
use super::error::ElasticError;
use super::index::{ClusterInfo, IncidentIndex, IndexSetup, IndexStats};
use crate::incident::IncidentRecord;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    created: bool,
    documents: BTreeMap<String, IncidentRecord>,
}

/// Keeps documents in a map keyed by `incident_id`.
///
/// Fields registered with [`MemoryIndex::rejecting_field`] behave like a
/// field whose mapping disagrees with the data: any document carrying a
/// value for it fails with a parsing error.
pub struct MemoryIndex {
    name: String,
    rejected_fields: HashSet<String>,
    state: RwLock<State>,
}

impl MemoryIndex {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rejected_fields: HashSet::new(),
            state: RwLock::new(State::default()),
        }
    }

    pub fn rejecting_field(mut self, field: impl Into<String>) -> Self {
        self.rejected_fields.insert(field.into());
        self
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn documents(&self) -> Vec<IncidentRecord> {
        self.state.read().await.documents.values().cloned().collect()
    }

    fn rejected_field_of(&self, record: &IncidentRecord) -> Option<&str> {
        self.rejected_fields
            .iter()
            .find(|f| record.has_field(f))
            .map(String::as_str)
    }
}

#[async_trait]
impl IncidentIndex for MemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn verify_connection(&self) -> Result<ClusterInfo, ElasticError> {
        Ok(ClusterInfo {
            cluster_name: "in-memory".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    async fn ensure_index(&self, _semantic_search: bool) -> Result<IndexSetup, ElasticError> {
        let mut state = self.state.write().await;
        let created = !state.created;
        state.created = true;
        Ok(IndexSetup {
            created,
            ..Default::default()
        })
    }

    async fn bulk_upsert(
        &self,
        records: &[IncidentRecord],
    ) -> Result<Vec<WriteOutcome>, ElasticError> {
        let mut state = self.state.write().await;
        let outcomes = records
            .iter()
            .map(|record| {
                if let Some(field) = self.rejected_field_of(record) {
                    return WriteOutcome::Failed(WriteFailure::new(
                        400,
                        "document_parsing_exception",
                        format!(
                            "failed to parse field [{}] in document with id '{}'",
                            field, record.incident_id
                        ),
                    ));
                }
                match state
                    .documents
                    .insert(record.incident_id.clone(), record.clone())
                {
                    Some(_) => WriteOutcome::Updated,
                    None => WriteOutcome::Created,
                }
            })
            .collect();
        Ok(outcomes)
    }

    async fn get_incident(
        &self,
        incident_id: &str,
    ) -> Result<Option<IncidentRecord>, ElasticError> {
        Ok(self.state.read().await.documents.get(incident_id).cloned())
    }

    async fn stats(&self) -> Result<IndexStats, ElasticError> {
        let state = self.state.read().await;
        let docs = &state.documents;

        let mut by_severity: HashMap<String, u64> = HashMap::new();
        let mut by_type: HashMap<String, u64> = HashMap::new();
        let mut downtime_values = 0u64;
        let mut stats = IndexStats {
            total_documents: docs.len() as u64,
            ..Default::default()
        };

        for record in docs.values() {
            if let Some(severity) = record.severity {
                *by_severity.entry(severity.as_str().to_string()).or_default() += 1;
            }
            if let Some(kind) = &record.incident_type {
                *by_type.entry(kind.clone()).or_default() += 1;
            }
            stats.total_cost_usd += record.cost_usd.unwrap_or(0.0);
            if let Some(hours) = record.downtime_hours {
                stats.total_downtime_hours += hours;
                downtime_values += 1;
            }
        }

        stats.avg_downtime_hours =
            (downtime_values > 0).then(|| stats.total_downtime_hours / downtime_values as f64);
        stats.by_severity = sorted_buckets(by_severity);
        stats.by_type = sorted_buckets(by_type);
        Ok(stats)
    }
}

/// Order buckets like a terms aggregation: count descending, then key.
fn sorted_buckets(counts: HashMap<String, u64>) -> Vec<(String, u64)> {
    let mut buckets: Vec<_> = counts.into_iter().collect();
    buckets.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    buckets.truncate(10);
    buckets
}
