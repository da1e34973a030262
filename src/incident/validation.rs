//! Validation of raw input records into [`IncidentRecord`]s.

use super::model::{IncidentRecord, Severity};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An input record as read from a dataset, before any checks.
///
/// Numeric fields are kept wide (`i64` for the count) so that negative
/// values reach validation instead of failing inside the decoder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawIncident {
    pub incident_id: Option<String>,
    pub incident_type: Option<String>,
    pub location: Option<String>,
    pub well_id: Option<String>,
    pub equipment_id: Option<String>,
    pub description: Option<String>,
    pub sensor_vibration_hz: Option<f64>,
    pub sensor_temp_celsius: Option<f64>,
    pub sensor_pressure_psi: Option<f64>,
    pub severity: Option<String>,
    pub root_cause: Option<String>,
    pub remediation: Option<String>,
    pub assigned_team: Option<String>,
    pub cost_usd: Option<f64>,
    pub downtime_hours: Option<f64>,
    pub recurrence_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field {field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("Field {0} must be a finite number")]
    NotFinite(&'static str),

    #[error("Field {field} is out of range for the index mapping (got {value})")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("Invalid severity \"{0}\", expected one of LOW, MEDIUM, HIGH, CRITICAL")]
    InvalidSeverity(String),

    #[error("Malformed record: {0}")]
    Malformed(String),
}

impl RawIncident {
    /// Decode a single JSON value. Type mismatches and unknown fields are
    /// reported as [`ValidationError::Malformed`].
    pub fn from_value(value: serde_json::Value) -> Result<Self, ValidationError> {
        serde_json::from_value(value).map_err(|e| ValidationError::Malformed(e.to_string()))
    }

    pub fn validate(self) -> Result<IncidentRecord, ValidationError> {
        let incident_id = match self.incident_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => return Err(ValidationError::MissingField("incident_id")),
        };

        let severity = match self.severity {
            Some(s) => Some(Severity::parse(&s).ok_or(ValidationError::InvalidSeverity(s))?),
            None => None,
        };

        let sensor_vibration_hz = finite("sensor_vibration_hz", self.sensor_vibration_hz)?;
        let sensor_temp_celsius = finite("sensor_temp_celsius", self.sensor_temp_celsius)?;
        let sensor_pressure_psi = finite("sensor_pressure_psi", self.sensor_pressure_psi)?;
        let cost_usd = non_negative("cost_usd", self.cost_usd)?;
        let downtime_hours = non_negative("downtime_hours", self.downtime_hours)?;

        let recurrence_count = match self.recurrence_count {
            None => None,
            Some(n) if n < 0 => {
                return Err(ValidationError::Negative {
                    field: "recurrence_count",
                    value: n as f64,
                })
            }
            // Mapped as `integer`, a signed 32-bit value.
            Some(n) if n > i64::from(i32::MAX) => {
                return Err(ValidationError::OutOfRange {
                    field: "recurrence_count",
                    value: n as f64,
                })
            }
            Some(n) => Some(n as u32),
        };

        Ok(IncidentRecord {
            incident_id,
            incident_type: self.incident_type,
            location: self.location,
            well_id: self.well_id,
            equipment_id: self.equipment_id,
            description: self.description,
            sensor_vibration_hz,
            sensor_temp_celsius,
            sensor_pressure_psi,
            severity,
            root_cause: self.root_cause,
            remediation: self.remediation,
            assigned_team: self.assigned_team,
            cost_usd,
            downtime_hours,
            recurrence_count,
        })
    }
}

impl From<IncidentRecord> for RawIncident {
    fn from(record: IncidentRecord) -> Self {
        Self {
            incident_id: Some(record.incident_id),
            incident_type: record.incident_type,
            location: record.location,
            well_id: record.well_id,
            equipment_id: record.equipment_id,
            description: record.description,
            sensor_vibration_hz: record.sensor_vibration_hz,
            sensor_temp_celsius: record.sensor_temp_celsius,
            sensor_pressure_psi: record.sensor_pressure_psi,
            severity: record.severity.map(|s| s.as_str().to_string()),
            root_cause: record.root_cause,
            remediation: record.remediation,
            assigned_team: record.assigned_team,
            cost_usd: record.cost_usd,
            downtime_hours: record.downtime_hours,
            recurrence_count: record.recurrence_count.map(i64::from),
        }
    }
}

/// Numeric fields are mapped as `float`, so anything beyond `f32` range
/// would be refused by the index.
fn finite(field: &'static str, value: Option<f64>) -> Result<Option<f64>, ValidationError> {
    match value {
        Some(v) if !v.is_finite() => Err(ValidationError::NotFinite(field)),
        Some(v) if v.abs() > f64::from(f32::MAX) => {
            Err(ValidationError::OutOfRange { field, value: v })
        }
        other => Ok(other),
    }
}

fn non_negative(field: &'static str, value: Option<f64>) -> Result<Option<f64>, ValidationError> {
    match finite(field, value)? {
        Some(v) if v < 0.0 => Err(ValidationError::Negative { field, value: v }),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawIncident {
        RawIncident::from_value(value).unwrap()
    }

    #[test]
    fn test_minimal_record_with_only_id_is_valid() {
        let record = raw(json!({"incident_id": "INC-001"})).validate().unwrap();
        assert_eq!(record, IncidentRecord::with_id("INC-001"));
    }

    #[test]
    fn test_example_record_keeps_exact_values() {
        let record = raw(json!({
            "incident_id": "INC-001",
            "sensor_vibration_hz": 145,
            "severity": "HIGH",
            "cost_usd": 90000,
            "downtime_hours": 15
        }))
        .validate()
        .unwrap();

        assert_eq!(record.incident_id, "INC-001");
        assert_eq!(record.sensor_vibration_hz, Some(145.0));
        assert_eq!(record.severity, Some(Severity::High));
        assert_eq!(record.cost_usd, Some(90000.0));
        assert_eq!(record.downtime_hours, Some(15.0));
        assert_eq!(record.recurrence_count, None);
    }

    #[test]
    fn test_missing_or_blank_id_is_rejected() {
        let err = raw(json!({"severity": "LOW"})).validate().unwrap_err();
        assert_eq!(err, ValidationError::MissingField("incident_id"));

        let err = raw(json!({"incident_id": "  "})).validate().unwrap_err();
        assert_eq!(err, ValidationError::MissingField("incident_id"));
    }

    #[test]
    fn test_negative_numeric_fields_are_rejected() {
        let err = raw(json!({"incident_id": "A", "cost_usd": -1.0}))
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::Negative {
                field: "cost_usd",
                value: -1.0
            }
        );

        let err = raw(json!({"incident_id": "A", "downtime_hours": -0.5}))
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Negative {
                field: "downtime_hours",
                ..
            }
        ));

        let err = raw(json!({"incident_id": "A", "recurrence_count": -3}))
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::Negative {
                field: "recurrence_count",
                ..
            }
        ));
    }

    #[test]
    fn test_zero_is_accepted_for_numeric_fields() {
        let record = raw(json!({
            "incident_id": "A",
            "cost_usd": 0,
            "downtime_hours": 0.0,
            "recurrence_count": 0
        }))
        .validate()
        .unwrap();
        assert_eq!(record.cost_usd, Some(0.0));
        assert_eq!(record.recurrence_count, Some(0));
    }

    #[test]
    fn test_negative_sensor_temperature_is_allowed() {
        let record = raw(json!({"incident_id": "A", "sensor_temp_celsius": -12.5}))
            .validate()
            .unwrap();
        assert_eq!(record.sensor_temp_celsius, Some(-12.5));
    }

    #[test]
    fn test_recurrence_count_must_fit_an_integer_field() {
        let err = raw(json!({"incident_id": "A", "recurrence_count": 3_000_000_000i64}))
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRange {
                field: "recurrence_count",
                value: 3_000_000_000.0
            }
        );

        let record = raw(json!({"incident_id": "A", "recurrence_count": i32::MAX}))
            .validate()
            .unwrap();
        assert_eq!(record.recurrence_count, Some(i32::MAX as u32));
    }

    #[test]
    fn test_float_fields_must_fit_a_float_mapping() {
        let err = raw(json!({"incident_id": "A", "cost_usd": 1e300}))
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::OutOfRange {
                field: "cost_usd",
                ..
            }
        ));

        let err = raw(json!({"incident_id": "A", "sensor_temp_celsius": -1e39}))
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::OutOfRange {
                field: "sensor_temp_celsius",
                ..
            }
        ));

        let record = raw(json!({"incident_id": "A", "sensor_pressure_psi": 3.0e38}))
            .validate()
            .unwrap();
        assert_eq!(record.sensor_pressure_psi, Some(3.0e38));
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let mut record = raw(json!({"incident_id": "A"}));
        record.cost_usd = Some(f64::NAN);
        assert_eq!(
            record.clone().validate().unwrap_err(),
            ValidationError::NotFinite("cost_usd")
        );

        record.cost_usd = None;
        record.sensor_pressure_psi = Some(f64::INFINITY);
        assert_eq!(
            record.validate().unwrap_err(),
            ValidationError::NotFinite("sensor_pressure_psi")
        );
    }

    #[test]
    fn test_invalid_severity() {
        let err = raw(json!({"incident_id": "A", "severity": "high"}))
            .validate()
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidSeverity("high".to_string()));
    }

    #[test]
    fn test_unknown_fields_and_wrong_types_are_malformed() {
        let err = RawIncident::from_value(json!({"incident_id": "A", "status": "OPEN"})).unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(_)));

        let err = RawIncident::from_value(json!({"incident_id": "A", "cost_usd": "lots"})).unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(_)));

        let err = RawIncident::from_value(json!(["not", "an", "object"])).unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(_)));
    }

    #[test]
    fn test_record_converts_back_to_raw_losslessly() {
        let mut record = IncidentRecord::with_id("INC-9");
        record.severity = Some(Severity::Critical);
        record.recurrence_count = Some(4);
        record.description = Some("Gas kick during tripping".to_string());

        let again = RawIncident::from(record.clone()).validate().unwrap();
        assert_eq!(again, record);
    }
}
