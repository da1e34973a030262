//! Incident document shape.
//!
//! Field names and JSON types are shared with the hosted search and ES|QL
//! layers, so they must not be renamed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of an incident, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// Exact, case-sensitive parse. Stored values are compared verbatim by
    /// the hosted query layer, so "high" is not accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn profile(&self) -> SeverityProfile {
        match self {
            Self::Critical => SeverityProfile {
                response_time_hours: 1,
                escalation_required: true,
                description: "Immediate threat to life, catastrophic equipment failure, or major environmental release",
            },
            Self::High => SeverityProfile {
                response_time_hours: 4,
                escalation_required: true,
                description: "Significant safety risk, major production loss, or regulatory violation",
            },
            Self::Medium => SeverityProfile {
                response_time_hours: 24,
                escalation_required: false,
                description: "Moderate risk, production impact, equipment damage without immediate danger",
            },
            Self::Low => SeverityProfile {
                response_time_hours: 72,
                escalation_required: false,
                description: "Minor incident, near-miss, or procedural deviation",
            },
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operational response targets attached to a severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityProfile {
    pub response_time_hours: u32,
    pub escalation_required: bool,
    pub description: &'static str,
}

/// One validated incident document.
///
/// Absent optional fields are omitted from the serialized document rather
/// than written as `null`, so reading a document back yields exactly the
/// values that were ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub incident_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub well_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_vibration_hz: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_temp_celsius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_pressure_psi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downtime_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_count: Option<u32>,
}

impl IncidentRecord {
    /// A record with only its key set.
    pub fn with_id(incident_id: impl Into<String>) -> Self {
        Self {
            incident_id: incident_id.into(),
            incident_type: None,
            location: None,
            well_id: None,
            equipment_id: None,
            description: None,
            sensor_vibration_hz: None,
            sensor_temp_celsius: None,
            sensor_pressure_psi: None,
            severity: None,
            root_cause: None,
            remediation: None,
            assigned_team: None,
            cost_usd: None,
            downtime_hours: None,
            recurrence_count: None,
        }
    }

    /// Whether the hosted semantic search can match this record.
    pub fn is_searchable(&self) -> bool {
        self.description
            .as_deref()
            .map(|d| !d.trim().is_empty())
            .unwrap_or(false)
    }

    /// Whether the record carries a value for the given document field.
    pub fn has_field(&self, field: &str) -> bool {
        match field {
            "incident_id" => true,
            "incident_type" => self.incident_type.is_some(),
            "location" => self.location.is_some(),
            "well_id" => self.well_id.is_some(),
            "equipment_id" => self.equipment_id.is_some(),
            "description" => self.description.is_some(),
            "sensor_vibration_hz" => self.sensor_vibration_hz.is_some(),
            "sensor_temp_celsius" => self.sensor_temp_celsius.is_some(),
            "sensor_pressure_psi" => self.sensor_pressure_psi.is_some(),
            "severity" => self.severity.is_some(),
            "root_cause" => self.root_cause.is_some(),
            "remediation" => self.remediation.is_some(),
            "assigned_team" => self.assigned_team.is_some(),
            "cost_usd" => self.cost_usd.is_some(),
            "downtime_hours" => self.downtime_hours.is_some(),
            "recurrence_count" => self.recurrence_count.is_some(),
            _ => false,
        }
    }

    pub fn to_document(&self) -> serde_json::Value {
        // Serializing a plain struct of strings and finite numbers cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Document fields in declaration order.
pub const DOCUMENT_FIELDS: [&str; 16] = [
    "incident_id",
    "incident_type",
    "location",
    "well_id",
    "equipment_id",
    "description",
    "sensor_vibration_hz",
    "sensor_temp_celsius",
    "sensor_pressure_psi",
    "severity",
    "root_cause",
    "remediation",
    "assigned_team",
    "cost_usd",
    "downtime_hours",
    "recurrence_count",
];
