//! Bulk request encoding and per-item result decoding.

use super::error::ElasticError;
use crate::incident::IncidentRecord;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};

lazy_static! {
    static ref PARSE_FIELD_RE: Regex =
        Regex::new(r"failed to parse field \[([^\]]+)\]").expect("valid regex");
    static ref STRICT_FIELD_RE: Regex =
        Regex::new(r"dynamic introduction of \[([^\]]+)\]").expect("valid regex");
    // Causes that blame one value, not the field's type.
    static ref VALUE_CAUSE_RE: Regex =
        Regex::new(r"(?i)out of range|only finite values").expect("valid regex");
}

/// Result of writing one document.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    Created,
    Updated,
    Failed(WriteFailure),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteFailure {
    pub status: u16,
    pub kind: String,
    pub reason: String,
    /// Document field the cluster could not store, when the error names one.
    pub field: Option<String>,
}

impl WriteFailure {
    pub fn new(status: u16, kind: impl Into<String>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let field = field_from_reason(&reason);
        Self {
            status,
            kind: kind.into(),
            reason,
            field,
        }
    }

    /// Whether the failure comes from the index mapping refusing a field.
    ///
    /// A value the field type cannot hold (an integer overflow, say) fails
    /// only its own document and is not a conflict.
    pub fn is_mapping_conflict(&self) -> bool {
        self.field.is_some()
            && !VALUE_CAUSE_RE.is_match(&self.reason)
            && matches!(
                self.kind.as_str(),
                "mapper_parsing_exception"
                    | "document_parsing_exception"
                    | "strict_dynamic_mapping_exception"
                    | "illegal_argument_exception"
            )
    }
}

pub(crate) fn field_from_reason(reason: &str) -> Option<String> {
    PARSE_FIELD_RE
        .captures(reason)
        .or_else(|| STRICT_FIELD_RE.captures(reason))
        .map(|c| c[1].to_string())
}

/// Encode records as an NDJSON bulk body of `index` actions keyed by
/// `incident_id`, so a repeated write replaces the previous document.
pub fn encode_bulk(index: &str, records: &[IncidentRecord]) -> Result<String, ElasticError> {
    let mut body = String::new();
    for record in records {
        let action = json!({ "index": { "_index": index, "_id": record.incident_id } });
        let line = serde_json::to_string(&action)
            .map_err(|e| ElasticError::Serialization(e.to_string()))?;
        body.push_str(&line);
        body.push('\n');
        let doc = serde_json::to_string(record)
            .map_err(|e| ElasticError::Serialization(e.to_string()))?;
        body.push_str(&doc);
        body.push('\n');
    }
    Ok(body)
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    #[serde(default)]
    status: u16,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<BulkItemError>,
}

#[derive(Debug, Deserialize)]
struct BulkItemError {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    caused_by: Option<Box<BulkItemError>>,
}

impl BulkItemError {
    /// Joined reason chain; the field name is often only in a nested cause.
    fn full_reason(&self) -> String {
        let mut reason = self.reason.clone();
        let mut cause = self.caused_by.as_deref();
        while let Some(c) = cause {
            if !c.reason.is_empty() {
                reason.push_str(": ");
                reason.push_str(&c.reason);
            }
            cause = c.caused_by.as_deref();
        }
        reason
    }
}

/// Decode a bulk response into one outcome per submitted document, in
/// submission order.
pub fn decode_bulk_response(
    body: &Value,
    expected: usize,
) -> Result<Vec<WriteOutcome>, ElasticError> {
    let response: BulkResponse = serde_json::from_value(body.clone())
        .map_err(|e| ElasticError::InvalidResponse(format!("Bad bulk response: {}", e)))?;

    if response.items.len() != expected {
        return Err(ElasticError::InvalidResponse(format!(
            "Bulk response has {} items, expected {}",
            response.items.len(),
            expected
        )));
    }

    response
        .items
        .into_iter()
        .map(|entry| {
            // Each entry is keyed by its action name ("index" here).
            let inner = entry
                .as_object()
                .and_then(|o| o.values().next())
                .cloned()
                .ok_or_else(|| ElasticError::InvalidResponse("Empty bulk item".to_string()))?;
            let item: BulkItem = serde_json::from_value(inner)
                .map_err(|e| ElasticError::InvalidResponse(format!("Bad bulk item: {}", e)))?;
            Ok(item_outcome(item))
        })
        .collect()
}

fn item_outcome(item: BulkItem) -> WriteOutcome {
    if let Some(error) = item.error {
        return WriteOutcome::Failed(WriteFailure::new(item.status, &error.kind, error.full_reason()));
    }
    match (item.status, item.result.as_deref()) {
        (_, Some("created")) | (201, None) => WriteOutcome::Created,
        (_, Some("updated")) | (_, Some("noop")) | (200, None) => WriteOutcome::Updated,
        (status, result) => WriteOutcome::Failed(WriteFailure::new(
            status,
            "unexpected_result",
            format!("Unexpected bulk item result {:?}", result),
        )),
    }
}
