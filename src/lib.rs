//! Oilfield Incident Intelligence Library
//!
//! Incident ingestion into a search index, fixed ES|QL reports over it,
//! declarative bindings for the hosted triage and analytics agents, and a
//! console that talks to them.

pub mod agent;
pub mod analytics;
pub mod cli_style;
pub mod config;
pub mod console;
pub mod elastic;
pub mod incident;
pub mod ingest;

// Re-export commonly used types for convenience
pub use agent::{AgentBuilderClient, AgentEndpoint, AgentRole, AgentSettings};
pub use config::{AppConfig, ConfigError, EnvConfig, FileConfig};
pub use console::ConsoleSession;
pub use elastic::{ElasticClient, IncidentIndex, MemoryIndex};
pub use incident::{IncidentRecord, Severity};
pub use ingest::{IngestReport, IngestionLoader, LoaderSettings};
