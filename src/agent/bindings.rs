//! Declarative agent definitions published to the hosted agent builder.
//!
//! Nothing here executes a tool. A definition only names which hosted tools
//! an agent may call and carries the instructions that steer it.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use thiserror::Error;

/// Identifiers of the platform tools the agents are bound to.
pub mod tool_ids {
    pub const SEARCH: &str = "platform.core.search";
    pub const EXECUTE_ESQL: &str = "platform.core.execute_esql";
    pub const GENERATE_ESQL: &str = "platform.core.generate_esql";
    pub const GET_DOCUMENT_BY_ID: &str = "platform.core.get_document_by_id";
    pub const GET_INDEX_MAPPING: &str = "platform.core.get_index_mapping";
    pub const LIST_INDICES: &str = "platform.core.list_indices";
    pub const GET_WORKFLOW_EXECUTION_STATUS: &str = "platform.core.get_workflow_execution_status";
}

pub const TRIAGE_AGENT_ID: &str = "oilfield-triage";
pub const ANALYTICS_AGENT_ID: &str = "oilfield-analytics";

lazy_static! {
    static ref AGENT_ID_RE: Regex = Regex::new(r"^[a-z][a-z0-9_-]*$").expect("valid regex");
    static ref TOOL_ID_RE: Regex =
        Regex::new(r"^[a-z][a-z0-9_]*(\.[a-z][a-z0-9_]*)+$").expect("valid regex");
}

/// The two agents a console session can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum AgentRole {
    Triage,
    Analytics,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Triage => "triage",
            AgentRole::Analytics => "analytics",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "triage" => Some(AgentRole::Triage),
            "analytics" => Some(AgentRole::Analytics),
            _ => None,
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One hosted tool an agent may invoke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolBinding {
    pub tool_id: String,
    /// Why the agent has the tool. Shown to operators, not sent to the host.
    #[serde(skip)]
    pub purpose: String,
}

impl ToolBinding {
    pub fn new(tool_id: impl Into<String>, purpose: impl Into<String>) -> Self {
        Self {
            tool_id: tool_id.into(),
            purpose: purpose.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentDefinition {
    pub id: String,
    pub role: AgentRole,
    pub name: String,
    pub description: String,
    pub instructions: String,
    pub labels: Vec<String>,
    pub tools: Vec<ToolBinding>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindingError {
    #[error("Invalid agent id \"{0}\": must match [a-z][a-z0-9_-]*")]
    InvalidAgentId(String),

    #[error("Agent {agent}: invalid tool id \"{tool_id}\"")]
    InvalidToolId { agent: String, tool_id: String },

    #[error("Agent {agent}: tool {tool_id} is bound more than once")]
    DuplicateTool { agent: String, tool_id: String },

    #[error("Agent {agent}: {field} must not be empty")]
    EmptyField { agent: String, field: &'static str },
}

impl AgentDefinition {
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn tool_ids(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.tool_id.as_str()).collect()
    }

    /// Every problem with this definition, in a stable order.
    pub fn problems(&self) -> Vec<BindingError> {
        let mut problems = Vec::new();
        if !AGENT_ID_RE.is_match(&self.id) {
            problems.push(BindingError::InvalidAgentId(self.id.clone()));
        }
        if self.name.trim().is_empty() {
            problems.push(BindingError::EmptyField {
                agent: self.id.clone(),
                field: "name",
            });
        }
        if self.instructions.trim().is_empty() {
            problems.push(BindingError::EmptyField {
                agent: self.id.clone(),
                field: "instructions",
            });
        }

        let mut seen = HashSet::new();
        for tool in &self.tools {
            if !TOOL_ID_RE.is_match(&tool.tool_id) {
                problems.push(BindingError::InvalidToolId {
                    agent: self.id.clone(),
                    tool_id: tool.tool_id.clone(),
                });
            } else if !seen.insert(tool.tool_id.as_str()) {
                problems.push(BindingError::DuplicateTool {
                    agent: self.id.clone(),
                    tool_id: tool.tool_id.clone(),
                });
            }
        }
        problems
    }

    pub fn validate(&self) -> Result<(), BindingError> {
        match self.problems().into_iter().next() {
            Some(problem) => Err(problem),
            None => Ok(()),
        }
    }

    /// Body for creating the agent on the host. Updates use the same body
    /// without `id`.
    pub fn to_payload(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "description": self.description,
            "labels": self.labels,
            "configuration": {
                "instructions": self.instructions,
                "tools": [{ "tool_ids": self.tool_ids() }]
            }
        })
    }

    pub fn to_update_payload(&self) -> Value {
        let mut payload = self.to_payload();
        if let Some(obj) = payload.as_object_mut() {
            obj.remove("id");
        }
        payload
    }
}

/// Index and agent ids the built-in definitions are generated for.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    pub index: String,
    pub triage_agent_id: String,
    pub analytics_agent_id: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            index: crate::config::DEFAULT_INDEX.to_string(),
            triage_agent_id: TRIAGE_AGENT_ID.to_string(),
            analytics_agent_id: ANALYTICS_AGENT_ID.to_string(),
        }
    }
}

impl AgentSettings {
    pub fn agent_id(&self, role: AgentRole) -> &str {
        match role {
            AgentRole::Triage => &self.triage_agent_id,
            AgentRole::Analytics => &self.analytics_agent_id,
        }
    }
}

pub fn triage_agent(index: &str) -> AgentDefinition {
    let instructions = format!(
        "You are an oilfield incident triage specialist. Incident history is stored in the \
index `{index}`; each document has incident_id, incident_type, location, well_id, \
equipment_id, description, sensor_vibration_hz, sensor_temp_celsius, sensor_pressure_psi, \
severity (LOW, MEDIUM, HIGH, CRITICAL), root_cause, remediation, assigned_team, cost_usd, \
downtime_hours and recurrence_count.

When the user describes a new incident:
1. Search `{index}` for semantically similar historical incidents using the description.
2. Rank the matches by severity, CRITICAL first, then by similarity.
3. Report the matched incidents with their incident_id, severity and location.
4. State the most probable root cause and the remediation that worked before.
5. Estimate cost (cost_usd) and downtime (downtime_hours) from the matches.
6. Name the assigned_team that handled the closest matches.

CRITICAL and HIGH incidents require escalation: say so explicitly, with a target response \
of 1 hour for CRITICAL and 4 hours for HIGH. Only cite incidents that exist in the index. \
If nothing similar is found, say so instead of guessing."
    );

    AgentDefinition {
        id: TRIAGE_AGENT_ID.to_string(),
        role: AgentRole::Triage,
        name: "Oilfield Incident Triage".to_string(),
        description: "Matches new incident reports against historical incidents and recommends a response."
            .to_string(),
        instructions,
        labels: vec!["oilfield".to_string(), "triage".to_string()],
        tools: vec![
            ToolBinding::new(tool_ids::SEARCH, "find similar incidents by description"),
            ToolBinding::new(tool_ids::GET_DOCUMENT_BY_ID, "open a specific incident by id"),
            ToolBinding::new(tool_ids::GET_INDEX_MAPPING, "inspect incident field types"),
            ToolBinding::new(tool_ids::LIST_INDICES, "locate the incident index"),
            ToolBinding::new(tool_ids::EXECUTE_ESQL, "rank and filter matched incidents"),
        ],
    }
}

pub fn analytics_agent(index: &str) -> AgentDefinition {
    let instructions = format!(
        "You are an oilfield operations analyst. Answer trend and aggregate questions about \
the incidents stored in the index `{index}` by generating and running ES|QL queries.

Typical questions: distribution of incidents by severity, total and average cost_usd, \
downtime_hours by incident_type, recurrence_count patterns, and the highest-risk locations \
and equipment. Reference queries:

FROM {index} | STATS count = COUNT(*) BY severity | SORT count DESC
FROM {index} | STATS total_cost = SUM(cost_usd), avg_downtime = AVG(downtime_hours) BY incident_type | SORT total_cost DESC
FROM {index} | STATS incidents = COUNT(*), critical = COUNT(*) WHERE severity == \"CRITICAL\" BY location | SORT critical DESC, incidents DESC | LIMIT 10
FROM {index} | WHERE recurrence_count > 2 | STATS repeat_incidents = COUNT(*) BY equipment_id | SORT repeat_incidents DESC | LIMIT 20

Always show the figures you computed, name the fields they come from, and keep \
currency in USD. Do not invent data that the query did not return."
    );

    AgentDefinition {
        id: ANALYTICS_AGENT_ID.to_string(),
        role: AgentRole::Analytics,
        name: "Oilfield Incident Analytics".to_string(),
        description: "Answers aggregate and trend questions over the incident history with ES|QL."
            .to_string(),
        instructions,
        labels: vec!["oilfield".to_string(), "analytics".to_string()],
        tools: vec![
            ToolBinding::new(tool_ids::GENERATE_ESQL, "turn a question into ES|QL"),
            ToolBinding::new(tool_ids::EXECUTE_ESQL, "run the generated query"),
            ToolBinding::new(tool_ids::GET_INDEX_MAPPING, "inspect incident field types"),
            ToolBinding::new(tool_ids::LIST_INDICES, "locate the incident index"),
            ToolBinding::new(
                tool_ids::GET_WORKFLOW_EXECUTION_STATUS,
                "follow long-running workflow executions",
            ),
        ],
    }
}

pub fn default_agents(settings: &AgentSettings) -> Vec<AgentDefinition> {
    vec![
        triage_agent(&settings.index).with_id(&settings.triage_agent_id),
        analytics_agent(&settings.index).with_id(&settings.analytics_agent_id),
    ]
}
