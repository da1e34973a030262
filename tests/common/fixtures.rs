//! Test data builders

use oilfield_incident_intel::config::{AppConfig, EnvConfig};
use oilfield_incident_intel::incident::{generate_dataset, IncidentRecord};
use serde_json::{json, Value};

/// The incident used throughout the round-trip tests.
pub fn incident_001() -> Value {
    json!({
        "incident_id": "INC-001",
        "incident_type": "Pump Failure",
        "location": "Permian Basin - Site A",
        "well_id": "WELL-101",
        "equipment_id": "ESP-0042",
        "description": "Electric submersible pump tripped on high vibration; bearing noise reported by field crew.",
        "sensor_vibration_hz": 145.5,
        "sensor_temp_celsius": 92.3,
        "sensor_pressure_psi": 2150.0,
        "severity": "CRITICAL",
        "root_cause": "Bearing wear",
        "remediation": "Replaced bearing assembly and realigned shaft",
        "assigned_team": "Mechanical Maintenance",
        "cost_usd": 48250.75,
        "downtime_hours": 18.5,
        "recurrence_count": 2
    })
}

/// A minimal valid record with only the required id and a description.
pub fn minimal_incident(id: &str) -> Value {
    json!({
        "incident_id": id,
        "description": format!("Routine inspection finding for {}", id),
        "severity": "LOW"
    })
}

/// `count` synthetic incidents as raw documents.
pub fn synthetic_incidents(count: usize) -> Vec<Value> {
    generate_dataset(count, 7)
        .iter()
        .map(IncidentRecord::to_document)
        .collect()
}

pub fn env_for(elasticsearch_url: &str, kibana_url: Option<&str>, api_key: &str) -> EnvConfig {
    EnvConfig {
        elasticsearch_url: Some(elasticsearch_url.to_string()),
        kibana_url: kibana_url.map(str::to_string),
        api_key: Some(api_key.to_string()),
        ..Default::default()
    }
}

pub fn app_config(elasticsearch_url: &str, kibana_url: Option<&str>, api_key: &str) -> AppConfig {
    AppConfig::resolve(&env_for(elasticsearch_url, kibana_url, api_key), None)
        .expect("test config resolves")
}
