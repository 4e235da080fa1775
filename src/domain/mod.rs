// ============================================================
// DOMAIN LAYER
// ============================================================
// Core value types for CSV validation and repair
// No I/O, no external services

pub mod error;
mod issue;
mod options;
mod report;

pub use error::{AppError, Result};
pub use issue::ValidationIssue;
pub use options::RepairOptions;
pub use report::{
    ArchiveService, BulkSummary, DetectionMethod, EncodingDecision, FileOutcome, FileReport,
    FolderSource, RunStatus,
};
