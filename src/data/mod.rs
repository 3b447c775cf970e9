//! Data module - CSV loading, normalization and geographic enrichment

mod loader;
mod processor;

pub use loader::{LoaderError, SourceTables, CAUSE_FILE, DIVIPOLA_FILE, MORTALITY_FILE};
pub use processor::{ProcessorError, RecordProcessor};
