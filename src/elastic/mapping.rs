//! Index mapping for incident documents and comparison against a live index.

use serde_json::{json, Map, Value};

/// Field holding the semantic copy of `description`, populated by the host.
pub const SEMANTIC_FIELD: &str = "description_semantic";

/// Declared type of each document field, as stored in the index.
pub const FIELD_TYPES: [(&str, &str); 16] = [
    ("incident_id", "keyword"),
    ("incident_type", "keyword"),
    ("location", "keyword"),
    ("well_id", "keyword"),
    ("equipment_id", "keyword"),
    ("description", "text"),
    ("sensor_vibration_hz", "float"),
    ("sensor_temp_celsius", "float"),
    ("sensor_pressure_psi", "float"),
    ("severity", "keyword"),
    ("root_cause", "text"),
    ("remediation", "text"),
    ("assigned_team", "keyword"),
    ("cost_usd", "float"),
    ("downtime_hours", "float"),
    ("recurrence_count", "integer"),
];

/// Body for index creation. The mapping is strict: documents carrying a
/// field not listed here are refused by the cluster.
pub fn index_body(semantic_search: bool) -> Value {
    let mut properties = Map::new();
    for (field, ty) in FIELD_TYPES {
        let mut spec = json!({ "type": ty });
        if field == "description" {
            spec["analyzer"] = json!("english");
            if semantic_search {
                spec["copy_to"] = json!(SEMANTIC_FIELD);
            }
        }
        properties.insert(field.to_string(), spec);
    }
    if semantic_search {
        properties.insert(SEMANTIC_FIELD.to_string(), json!({ "type": "semantic_text" }));
    }

    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 0
        },
        "mappings": {
            "dynamic": "strict",
            "properties": Value::Object(properties)
        }
    })
}

/// A field whose type in the live index differs from the declared one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingConflict {
    pub field: String,
    pub expected: String,
    pub actual: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingCheck {
    pub conflicts: Vec<MappingConflict>,
    /// Declared fields the live index does not know about yet.
    pub missing: Vec<String>,
}

/// Compare the `properties` of a live index mapping with the declared types.
pub fn check_mapping(properties: &Map<String, Value>) -> MappingCheck {
    let mut check = MappingCheck::default();
    for (field, expected) in FIELD_TYPES {
        match properties.get(field) {
            None => check.missing.push(field.to_string()),
            Some(spec) => {
                // Object fields have no "type" key, only nested "properties".
                let actual = spec
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("object");
                if !compatible(expected, actual) {
                    check.conflicts.push(MappingConflict {
                        field: field.to_string(),
                        expected: expected.to_string(),
                        actual: actual.to_string(),
                    });
                }
            }
        }
    }
    check
}

fn compatible(expected: &str, actual: &str) -> bool {
    const FLOATING: [&str; 4] = ["float", "double", "half_float", "scaled_float"];
    const INTEGRAL: [&str; 4] = ["integer", "long", "short", "byte"];
    expected == actual
        || (FLOATING.contains(&expected) && FLOATING.contains(&actual))
        || (INTEGRAL.contains(&expected) && (INTEGRAL.contains(&actual) || FLOATING.contains(&actual)))
        || (expected == "keyword" && actual == "constant_keyword")
}

/// Extract the `properties` object of `index` from a `GET /{index}/_mapping`
/// response. The response is keyed by the concrete index name, which differs
/// from the requested name when it is an alias.
pub fn properties_from_response<'a>(
    response: &'a Value,
    index: &str,
) -> Option<&'a Map<String, Value>> {
    let entry = response
        .get(index)
        .or_else(|| response.as_object().and_then(|o| o.values().next()))?;
    entry.get("mappings")?.get("properties")?.as_object()
}
