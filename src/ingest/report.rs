//! Outcome of an ingestion run.

use crate::incident::ValidationError;
use chrono::{DateTime, Utc};

/// Why a record was not sent to the index.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    Invalid(ValidationError),
    /// The record carries a value for a field the index cannot store.
    MappingConflict { field: String },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Invalid(e) => write!(f, "{}", e),
            Rejection::MappingConflict { field } => {
                write!(f, "field {} conflicts with the index mapping", field)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    Created,
    Updated,
    Rejected(Rejection),
    /// The index refused the document or the request carrying it failed.
    Failed(String),
}

/// Outcome for the record at `position` in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentReport {
    pub position: usize,
    pub incident_id: Option<String>,
    pub outcome: DocumentOutcome,
}

/// A field the index refuses to store, and how that was learned.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConflict {
    pub field: String,
    pub detail: String,
}

#[derive(Debug, Clone)]
pub struct IngestReport {
    pub index: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub index_created: bool,
    /// One entry per input record, in input order.
    pub documents: Vec<DocumentReport>,
    /// Ids that appear more than once in the input. The last occurrence wins.
    pub duplicate_ids: Vec<String>,
    /// Valid records without a description; stored but invisible to
    /// semantic search.
    pub unsearchable: usize,
    pub mapping_conflicts: Vec<FieldConflict>,
}

impl IngestReport {
    pub(crate) fn new(index: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            index: index.into(),
            started_at: now,
            finished_at: now,
            index_created: false,
            documents: Vec::new(),
            duplicate_ids: Vec::new(),
            unsearchable: 0,
            mapping_conflicts: Vec::new(),
        }
    }

    fn count(&self, pred: impl Fn(&DocumentOutcome) -> bool) -> usize {
        self.documents.iter().filter(|d| pred(&d.outcome)).count()
    }

    pub fn total(&self) -> usize {
        self.documents.len()
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Created))
    }

    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Updated))
    }

    pub fn rejected(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Rejected(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Failed(_)))
    }

    /// Documents now present in the index from this run.
    pub fn indexed(&self) -> usize {
        self.created() + self.updated()
    }

    pub fn has_mapping_conflicts(&self) -> bool {
        !self.mapping_conflicts.is_empty()
    }

    /// True when every input record was written.
    pub fn is_clean(&self) -> bool {
        self.indexed() == self.total() && !self.has_mapping_conflicts()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn problems(&self) -> impl Iterator<Item = &DocumentReport> {
        self.documents.iter().filter(|d| {
            matches!(
                d.outcome,
                DocumentOutcome::Rejected(_) | DocumentOutcome::Failed(_)
            )
        })
    }

    pub fn outcome_of(&self, incident_id: &str) -> Option<&DocumentOutcome> {
        self.documents
            .iter()
            .rev()
            .find(|d| d.incident_id.as_deref() == Some(incident_id))
            .map(|d| &d.outcome)
    }
}
