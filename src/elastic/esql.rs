//! ES|QL request body and tabular response.

use super::error::ElasticError;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EsqlColumn {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Columns and rows returned by `POST /_query`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EsqlTable {
    #[serde(default)]
    pub columns: Vec<EsqlColumn>,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl EsqlTable {
    pub fn request_body(query: &str) -> Value {
        json!({ "query": query })
    }

    pub fn from_response(body: Value) -> Result<Self, ElasticError> {
        let table: Self = serde_json::from_value(body)
            .map_err(|e| ElasticError::InvalidResponse(format!("Bad ES|QL response: {}", e)))?;
        if let Some(row) = table.values.iter().find(|r| r.len() != table.columns.len()) {
            return Err(ElasticError::InvalidResponse(format!(
                "ES|QL row has {} values for {} columns",
                row.len(),
                table.columns.len()
            )));
        }
        Ok(table)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Value of `column` in row `row`, `None` when either is missing.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c.name == column)?;
        self.values.get(row)?.get(idx)
    }

    /// Cells of every row rendered as display text.
    pub fn text_rows(&self) -> Vec<Vec<String>> {
        self.values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect()
    }
}

/// Display text for one ES|QL cell. Nulls show as "-", fractional numbers
/// keep two decimals.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .map(|f| format!("{:.2}", f))
            .unwrap_or_else(|| n.to_string()),
        other => other.to_string(),
    }
}
