//! Hosted agent definitions and the client that talks to the agent host.

pub mod bindings;
mod client;
mod types;

pub use bindings::{
    analytics_agent, default_agents, tool_ids, triage_agent, AgentDefinition, AgentRole,
    AgentSettings, BindingError, ToolBinding,
};
pub use client::{AgentBuilderClient, AgentEndpoint, AgentError, PublishOutcome};
pub use types::{ConverseReply, ConverseRequest};
