// ============================================================
// RUN REPORTS & COLLABORATOR SEAMS
// ============================================================
// Result types for single-file and bulk runs, plus the traits the
// pipeline consumes for folder enumeration and archival

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::Result;
use super::issue::ValidationIssue;

/// How the input encoding was determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionMethod {
    /// A byte-order mark identified the encoding
    Bom,

    /// The encoding was found by probing the fallback chain
    FallbackProbe,
}

/// Encoding chosen for an input file, fixed before any line is parsed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingDecision {
    /// Encoding label, e.g. "utf-8", "windows-1252"
    pub name: String,

    /// Detection method used
    pub method: DetectionMethod,
}

impl EncodingDecision {
    pub fn new(name: &str, method: DetectionMethod) -> Self {
        Self {
            name: name.to_string(),
            method,
        }
    }

    /// UTF-8 inputs (with or without BOM) need no encoding notice
    pub fn is_utf8(&self) -> bool {
        self.name.starts_with("utf-8")
    }
}

/// Outcome classification for a processed file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Zero issues detected
    Clean,

    /// Issues were detected (and possibly repaired)
    IssuesFound,
}

/// Result of validating/repairing a single CSV file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// Every issue found, in arrival order
    pub issues: Vec<ValidationIssue>,

    /// Logical rows processed (blank lines excluded)
    pub rows_processed: usize,

    /// Whether row 1 was recognized as a header and passed through
    pub header_detected: bool,

    /// Encoding used to decode the input
    pub encoding: EncodingDecision,

    /// Repaired CSV location, `None` when no output was written
    pub output_path: Option<PathBuf>,

    /// Log location, `None` when no log was warranted
    pub log_path: Option<PathBuf>,
}

impl FileReport {
    pub fn status(&self) -> RunStatus {
        if self.issues.is_empty() {
            RunStatus::Clean
        } else {
            RunStatus::IssuesFound
        }
    }
}

/// Per-file entry in a bulk run summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub name: String,
    pub status: String,
    pub issues: usize,
    pub rows: usize,
}

/// Aggregate counters for a bulk run over one folder
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkSummary {
    pub total_files: usize,
    pub clean: usize,
    pub with_issues: usize,
    pub failed: usize,
    pub total_issues: usize,
    pub total_rows: usize,
    pub archived: usize,
    pub files: Vec<FileOutcome>,
}

/// Supplies candidate CSV files for bulk processing
pub trait FolderSource {
    fn candidate_files(&self, folder: &Path) -> Result<Vec<PathBuf>>;
}

/// Archives an original file into a destination folder, returning the
/// archive location
pub trait ArchiveService {
    fn archive(&self, file: &Path, dest_dir: &Path) -> Result<PathBuf>;
}
