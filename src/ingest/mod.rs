//! Incident ingestion: reading datasets and loading them into an index.

mod loader;
mod report;
mod source;

pub use loader::{IngestError, IngestionLoader, LoaderSettings, DEFAULT_BATCH_SIZE};
pub use report::{DocumentOutcome, DocumentReport, FieldConflict, IngestReport, Rejection};
pub use source::{load_raw_records, RawEntry, SourceError};
