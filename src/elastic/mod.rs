//! Search cluster access: HTTP client, index mapping, bulk codec and an
//! in-memory stand-in.

mod bulk;
mod client;
mod cloud_id;
mod error;
mod esql;
mod index;
pub mod mapping;
mod memory;

pub use bulk::{WriteFailure, WriteOutcome};
pub use client::ElasticClient;
pub use cloud_id::{decode_cloud_id, CloudEndpoints, CloudIdError};
pub use error::ElasticError;
pub use esql::{cell_text, EsqlColumn, EsqlTable};
pub use index::{ClusterInfo, IncidentIndex, IndexSetup, IndexStats};
pub use mapping::{MappingCheck, MappingConflict};
pub use memory::MemoryIndex;
