mod dataset;
mod model;
mod validation;

pub use dataset::{generate_dataset, save_dataset, DEFAULT_DATASET_SIZE, DEFAULT_SEED};
pub use model::{IncidentRecord, Severity, SeverityProfile, DOCUMENT_FIELDS};
pub use validation::{RawIncident, ValidationError};
