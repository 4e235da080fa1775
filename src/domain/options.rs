// ============================================================
// REPAIR OPTIONS
// ============================================================
// Configuration bundle for a validation/repair run

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Options controlling one validation/repair run.
///
/// The default is conservative: validate only, report issues, never touch
/// the input or write a repaired file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairOptions {
    /// Apply field repairs and write a repaired CSV (default: validate only)
    pub repair: bool,

    /// Never write output files or archive originals
    pub dry_run: bool,

    /// Suppress the output write when zero issues were found
    pub skip_rewrite_if_clean: bool,

    /// Force CRC32 normalization (uppercase, hex-only, pad/truncate to 8)
    /// independently of `repair`
    pub normalize_crc32: bool,

    /// Restrict repairs to the CRC32 field, leaving all other fields as-is
    pub normalize_only: bool,

    /// Record a non-UTF-8 input encoding as a validation issue
    /// (default: informational notice only)
    pub flag_non_utf8: bool,

    /// Output path override (default: `<stem>_repaired.csv` beside the input)
    pub output_path: Option<PathBuf>,

    /// Log path override (default: `<stem>_repair_log.txt` beside the input)
    pub log_path: Option<PathBuf>,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            repair: false,
            dry_run: false,
            skip_rewrite_if_clean: false,
            normalize_crc32: false,
            normalize_only: false,
            flag_non_utf8: false,
            output_path: None,
            log_path: None,
        }
    }
}

impl RepairOptions {
    /// Create options with the conservative defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable field repairs
    pub fn with_repair(mut self, repair: bool) -> Self {
        self.repair = repair;
        self
    }

    /// Enable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Skip rewriting files that had no issues
    pub fn with_skip_rewrite_if_clean(mut self, skip: bool) -> Self {
        self.skip_rewrite_if_clean = skip;
        self
    }

    /// Force CRC32 normalization
    pub fn with_normalize_crc32(mut self, normalize: bool) -> Self {
        self.normalize_crc32 = normalize;
        self
    }

    /// Normalize CRC32 only, leave other fields untouched
    pub fn with_normalize_only(mut self, normalize_only: bool) -> Self {
        self.normalize_only = normalize_only;
        self
    }

    /// Treat a non-UTF-8 input encoding as an issue
    pub fn with_flag_non_utf8(mut self, flag: bool) -> Self {
        self.flag_non_utf8 = flag;
        self
    }

    /// Override both the output and log destinations
    pub fn with_paths(mut self, output: PathBuf, log: PathBuf) -> Self {
        self.output_path = Some(output);
        self.log_path = Some(log);
        self
    }

    /// Whether the CRC32 field gets repaired this run
    pub fn crc32_repair_enabled(&self) -> bool {
        self.normalize_crc32 || self.repair
    }

    /// Whether fields other than CRC32 get repaired this run
    pub fn general_repair_enabled(&self) -> bool {
        self.repair && !self.normalize_only
    }
}
