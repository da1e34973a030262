//! Validates raw incident values and bulk-writes them to an index.

use super::report::{DocumentOutcome, DocumentReport, FieldConflict, IngestReport, Rejection};
use super::source::RawEntry;
use crate::elastic::{ElasticError, IncidentIndex, WriteOutcome};
use crate::incident::{IncidentRecord, RawIncident, DOCUMENT_FIELDS};
use chrono::Utc;
use indicatif::ProgressBar;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone)]
pub struct LoaderSettings {
    /// Documents per bulk request.
    pub batch_size: usize,
    /// Create the index with a semantic copy of `description`.
    pub semantic_search: bool,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            semantic_search: true,
        }
    }
}

/// Errors that stop a whole run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Cannot reach index {index}: {source}")]
    Connection {
        index: String,
        #[source]
        source: ElasticError,
    },

    #[error("Failed to prepare index {index}: {source}")]
    IndexSetup {
        index: String,
        #[source]
        source: ElasticError,
    },

    #[error("Ingestion aborted after {written} documents were written: {source}")]
    Aborted {
        written: usize,
        #[source]
        source: ElasticError,
    },
}

/// A validated record waiting to be written, with its input position.
struct Pending {
    position: usize,
    record: IncidentRecord,
}

pub struct IngestionLoader {
    index: Arc<dyn IncidentIndex>,
    settings: LoaderSettings,
    progress: ProgressBar,
}

impl IngestionLoader {
    pub fn new(index: Arc<dyn IncidentIndex>, settings: LoaderSettings) -> Self {
        Self {
            index,
            settings,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report written documents on a progress bar.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Ingest `raw` into the index.
    ///
    /// The connection is checked and the index prepared before any record
    /// is written; failures there abort the run. After that, invalid records
    /// and failed batches are recorded in the report and the run goes on,
    /// except for an authorization failure, which no later batch could
    /// survive either.
    pub async fn run(&self, raw: Vec<Value>) -> Result<IngestReport, IngestError> {
        self.run_entries(raw.into_iter().map(Ok).collect()).await
    }

    /// Like [`IngestionLoader::run`], for input where some positions could
    /// not be decoded at all. Those are reported as rejected.
    pub async fn run_entries(&self, raw: Vec<RawEntry>) -> Result<IngestReport, IngestError> {
        let index_name = self.index.name().to_string();
        let mut report = IngestReport::new(&index_name);
        let mut outcomes: Vec<Option<DocumentOutcome>> = vec![None; raw.len()];
        let mut ids: Vec<Option<String>> = vec![None; raw.len()];

        self.index
            .verify_connection()
            .await
            .map_err(|source| IngestError::Connection {
                index: index_name.clone(),
                source,
            })?;

        let setup = self
            .index
            .ensure_index(self.settings.semantic_search)
            .await
            .map_err(|source| IngestError::IndexSetup {
                index: index_name.clone(),
                source,
            })?;
        report.index_created = setup.created;

        let mut conflicting: BTreeSet<String> = BTreeSet::new();
        for conflict in &setup.mapping.conflicts {
            error!(
                index = %index_name,
                field = %conflict.field,
                expected = %conflict.expected,
                actual = %conflict.actual,
                "Index mapping conflicts with incident field"
            );
            conflicting.insert(conflict.field.clone());
            report.mapping_conflicts.push(FieldConflict {
                field: conflict.field.clone(),
                detail: format!(
                    "index maps it as {}, expected {}",
                    conflict.actual, conflict.expected
                ),
            });
        }

        let pending = self.validate_all(raw, &mut outcomes, &mut ids, &mut report);

        let batch_size = self.settings.batch_size.max(1);
        self.progress.set_length(pending.len() as u64);
        let mut written = 0usize;

        for (batch_no, batch) in pending.chunks(batch_size).enumerate() {
            let mut to_send: Vec<&Pending> = Vec::with_capacity(batch.len());
            for item in batch {
                match conflicting.iter().find(|f| item.record.has_field(f)) {
                    Some(field) => {
                        warn!(
                            incident_id = %item.record.incident_id,
                            field = %field,
                            "Rejecting record carrying a conflicting field"
                        );
                        outcomes[item.position] = Some(DocumentOutcome::Rejected(
                            Rejection::MappingConflict {
                                field: field.clone(),
                            },
                        ));
                        self.progress.inc(1);
                    }
                    None => to_send.push(item),
                }
            }
            if to_send.is_empty() {
                continue;
            }

            let records: Vec<IncidentRecord> = to_send.iter().map(|p| p.record.clone()).collect();
            debug!(batch = batch_no, documents = records.len(), "Writing batch");

            match self.index.bulk_upsert(&records).await {
                Ok(results) => {
                    for (item, result) in to_send.iter().zip(results) {
                        let outcome = match result {
                            WriteOutcome::Created => DocumentOutcome::Created,
                            WriteOutcome::Updated => DocumentOutcome::Updated,
                            WriteOutcome::Failed(failure) => {
                                warn!(
                                    incident_id = %item.record.incident_id,
                                    status = failure.status,
                                    kind = %failure.kind,
                                    reason = %failure.reason,
                                    "Index refused document"
                                );
                                if let Some(field) = failure
                                    .field
                                    .as_deref()
                                    .filter(|_| failure.is_mapping_conflict())
                                    .filter(|f| DOCUMENT_FIELDS.contains(f))
                                {
                                    if conflicting.insert(field.to_string()) {
                                        error!(
                                            index = %index_name,
                                            field = %field,
                                            "Mapping conflict detected, later records carrying this field will be rejected"
                                        );
                                        report.mapping_conflicts.push(FieldConflict {
                                            field: field.to_string(),
                                            detail: failure.reason.clone(),
                                        });
                                    }
                                }
                                DocumentOutcome::Failed(format!(
                                    "{} ({}): {}",
                                    failure.kind, failure.status, failure.reason
                                ))
                            }
                        };
                        if matches!(outcome, DocumentOutcome::Created | DocumentOutcome::Updated) {
                            written += 1;
                        }
                        outcomes[item.position] = Some(outcome);
                    }
                }
                Err(e) if e.is_auth() => {
                    error!(index = %index_name, error = %e, "Authorization failed, aborting ingestion");
                    self.progress.abandon();
                    return Err(IngestError::Aborted { written, source: e });
                }
                Err(e) => {
                    error!(
                        index = %index_name,
                        batch = batch_no,
                        documents = to_send.len(),
                        error = %e,
                        "Bulk request failed, marking batch as failed"
                    );
                    for item in &to_send {
                        outcomes[item.position] = Some(DocumentOutcome::Failed(e.to_string()));
                    }
                }
            }
            self.progress.inc(to_send.len() as u64);
        }
        self.progress.finish_and_clear();

        report.documents = outcomes
            .into_iter()
            .zip(ids)
            .enumerate()
            .map(|(position, (outcome, incident_id))| DocumentReport {
                position,
                incident_id,
                // Every position is either rejected during validation or
                // belongs to exactly one batch.
                outcome: outcome
                    .unwrap_or_else(|| DocumentOutcome::Failed("not processed".to_string())),
            })
            .collect();
        report.finished_at = Utc::now();

        info!(
            index = %index_name,
            total = report.total(),
            created = report.created(),
            updated = report.updated(),
            rejected = report.rejected(),
            failed = report.failed(),
            duplicates = report.duplicate_ids.len(),
            unsearchable = report.unsearchable,
            "Ingestion finished"
        );
        Ok(report)
    }

    fn validate_all(
        &self,
        raw: Vec<RawEntry>,
        outcomes: &mut [Option<DocumentOutcome>],
        ids: &mut [Option<String>],
        report: &mut IngestReport,
    ) -> Vec<Pending> {
        let mut pending = Vec::with_capacity(raw.len());
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (position, entry) in raw.into_iter().enumerate() {
            // Pull the id out before decoding so malformed records can
            // still be reported by id.
            ids[position] = entry.as_ref().ok().and_then(|value| {
                value
                    .get("incident_id")
                    .and_then(Value::as_str)
                    .filter(|s| !s.trim().is_empty())
                    .map(str::to_string)
            });

            let validated = entry
                .and_then(RawIncident::from_value)
                .and_then(RawIncident::validate);
            match validated {
                Ok(record) => {
                    if !record.is_searchable() {
                        report.unsearchable += 1;
                        debug!(incident_id = %record.incident_id, "Record has no description");
                    }
                    let count = seen.entry(record.incident_id.clone()).or_insert(0);
                    *count += 1;
                    if *count == 2 {
                        warn!(incident_id = %record.incident_id, "Duplicate incident id in input, last occurrence wins");
                        report.duplicate_ids.push(record.incident_id.clone());
                    }
                    pending.push(Pending { position, record });
                }
                Err(e) => {
                    warn!(
                        position,
                        incident_id = ids[position].as_deref().unwrap_or("-"),
                        error = %e,
                        "Rejecting invalid record"
                    );
                    outcomes[position] = Some(DocumentOutcome::Rejected(Rejection::Invalid(e)));
                }
            }
        }
        pending
    }
}
