// ============================================================
// BULK FOLDER PROCESSOR
// ============================================================
// Sequential validate/repair over every candidate CSV in a folder,
// with per-folder output layout and optional archival of originals

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::domain::error::AppError;
use crate::domain::{
    ArchiveService, BulkSummary, FileOutcome, FolderSource, RepairOptions, Result, RunStatus,
};

use super::repairer::CsvRepairer;

/// Subfolder receiving repaired CSVs
pub const CLEAN_DIR: &str = "CleanCSVs";
/// Subfolder receiving per-file logs
pub const LOG_DIR: &str = "Logs";
/// Subfolder receiving archived originals
pub const ARCHIVE_DIR: &str = "Archive";

/// Runs the single-file pipeline over a whole folder.
///
/// Files are processed one at a time in name order. A failure on one file
/// is recorded in the summary and never aborts the rest of the run.
pub struct BulkProcessor {
    options: RepairOptions,
    output_folder: Option<PathBuf>,
    use_subfolders: bool,
}

impl BulkProcessor {
    pub fn new(options: RepairOptions) -> Self {
        Self {
            options,
            output_folder: None,
            use_subfolders: true,
        }
    }

    /// Route outputs under this folder instead of the input folder
    pub fn with_output_folder(mut self, folder: Option<PathBuf>) -> Self {
        self.output_folder = folder;
        self
    }

    /// Toggle the CleanCSVs/Logs/Archive layout; when off, outputs land
    /// flat in the output folder under single-file naming
    pub fn with_subfolders(mut self, use_subfolders: bool) -> Self {
        self.use_subfolders = use_subfolders;
        self
    }

    pub fn process_folder(
        &self,
        folder: &Path,
        source: &dyn FolderSource,
        archiver: Option<&dyn ArchiveService>,
    ) -> Result<BulkSummary> {
        let files = source.candidate_files(folder)?;
        let mut summary = BulkSummary::default();
        if files.is_empty() {
            warn!(folder = %folder.display(), "No candidate CSV files found");
            return Ok(summary);
        }

        let base = self.output_folder.as_deref().unwrap_or(folder);
        let (clean_dir, log_dir) = if self.use_subfolders {
            (base.join(CLEAN_DIR), base.join(LOG_DIR))
        } else {
            (base.to_path_buf(), base.to_path_buf())
        };
        let archive_dir = base.join(ARCHIVE_DIR);

        // logs are written even on dry runs; output and archive dirs are not
        Self::ensure_dir(&log_dir)?;
        if !self.options.dry_run {
            Self::ensure_dir(&clean_dir)?;
            if archiver.is_some() {
                Self::ensure_dir(&archive_dir)?;
            }
        }

        summary.total_files = files.len();
        info!(
            folder = %folder.display(),
            files = files.len(),
            "Starting bulk run"
        );

        for file in &files {
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("(unnamed)")
                .to_string();
            let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or("output");

            // subfolder layout keeps original names; the flat layout falls
            // back to single-file naming so originals are never clobbered
            let out_name = if self.use_subfolders {
                name.clone()
            } else {
                format!("{}_repaired.csv", stem)
            };
            let file_options = self.options.clone().with_paths(
                clean_dir.join(out_name),
                log_dir.join(format!("{}_repair_log.txt", stem)),
            );

            match CsvRepairer::new(file_options).process(file) {
                Ok(report) => {
                    let status = match report.status() {
                        RunStatus::Clean => {
                            summary.clean += 1;
                            "clean"
                        }
                        RunStatus::IssuesFound => {
                            summary.with_issues += 1;
                            "issues"
                        }
                    };
                    summary.total_issues += report.issues.len();
                    summary.total_rows += report.rows_processed;
                    summary.files.push(FileOutcome {
                        name: name.clone(),
                        status: status.to_string(),
                        issues: report.issues.len(),
                        rows: report.rows_processed,
                    });

                    if !self.options.dry_run {
                        if let Some(archiver) = archiver {
                            match archiver.archive(file, &archive_dir) {
                                Ok(dest) => {
                                    summary.archived += 1;
                                    info!(file = %name, dest = %dest.display(), "Archived original");
                                }
                                Err(e) => {
                                    warn!(file = %name, error = %e, "Failed to archive original");
                                }
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(file = %name, error = %e, "Processing failed");
                    summary.failed += 1;
                    summary.files.push(FileOutcome {
                        name,
                        status: "failed".to_string(),
                        issues: 0,
                        rows: 0,
                    });
                }
            }
        }

        info!(
            total = summary.total_files,
            clean = summary.clean,
            with_issues = summary.with_issues,
            failed = summary.failed,
            issues = summary.total_issues,
            "Bulk run complete"
        );
        Ok(summary)
    }

    fn ensure_dir(dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .map_err(|e| AppError::IoError(format!("Failed to create {}: {}", dir.display(), e)))
    }
}

/// Enumerates `*.csv` files directly inside a folder, skipping files this
/// tool produced on a previous run.
pub struct FsFolderSource;

impl FolderSource for FsFolderSource {
    fn candidate_files(&self, folder: &Path) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(folder).map_err(|e| {
            AppError::IoError(format!("Failed to read folder {}: {}", folder.display(), e))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| AppError::IoError(e.to_string()))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let has_csv_ext = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
            if !has_csv_ext {
                continue;
            }
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            // skip files produced by earlier runs of this tool
            if stem.ends_with("_repaired") || stem.ends_with("_missing_files") {
                continue;
            }
            files.push(path);
        }
        // name order keeps runs deterministic across platforms
        files.sort();
        Ok(files)
    }
}

/// Moves originals into the archive folder, falling back to copy-and-delete
/// when a rename crosses filesystems.
pub struct FsArchiveService;

impl ArchiveService for FsArchiveService {
    fn archive(&self, file: &Path, dest_dir: &Path) -> Result<PathBuf> {
        let name = file
            .file_name()
            .ok_or_else(|| AppError::IoError(format!("No file name in {}", file.display())))?;
        let dest = dest_dir.join(name);

        if fs::rename(file, &dest).is_err() {
            fs::copy(file, &dest).map_err(|e| {
                AppError::IoError(format!("Failed to archive {}: {}", file.display(), e))
            })?;
            fs::remove_file(file).map_err(|e| {
                AppError::IoError(format!("Failed to remove {}: {}", file.display(), e))
            })?;
        }
        Ok(dest)
    }
}
