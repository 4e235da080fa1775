// ============================================================
// CSVMEND
// ============================================================
// Validate and repair CSV inventory files: tolerant line parsing,
// per-field validation, duplicate detection and encoding recovery

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

pub use application::{BulkProcessor, CsvRepairer};
pub use domain::{AppError, FileReport, RepairOptions, Result, RunStatus};
