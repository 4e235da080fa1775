// ============================================================
// COMMAND-LINE INTERFACE
// ============================================================
// Thin clap layer mapping flags onto the run options

use std::path::PathBuf;

use clap::Parser;

use crate::domain::RepairOptions;

/// Validate and repair CSV inventory files (FileName, Size, CRC32, Path,
/// Comment).
#[derive(Parser, Debug)]
#[command(name = "csvmend", version, about)]
pub struct Cli {
    /// CSV file to validate or repair
    #[arg(value_name = "FILE", required_unless_present = "bulk")]
    pub input: Option<PathBuf>,

    /// Process every CSV in this folder instead of a single file
    #[arg(long, value_name = "FOLDER", conflicts_with = "input")]
    pub bulk: Option<PathBuf>,

    /// Destination for the repaired CSV (default: <stem>_repaired.csv)
    #[arg(short, long, value_name = "PATH", conflicts_with = "bulk")]
    pub output: Option<PathBuf>,

    /// Destination for the issue log (default: <stem>_repair_log.txt)
    #[arg(long, value_name = "PATH", conflicts_with = "bulk")]
    pub log: Option<PathBuf>,

    /// Folder receiving bulk outputs (default: the input folder)
    #[arg(long, value_name = "FOLDER", requires = "bulk")]
    pub output_folder: Option<PathBuf>,

    /// Write bulk outputs flat instead of under CleanCSVs/Logs/Archive
    #[arg(long, requires = "bulk")]
    pub no_subfolders: bool,

    /// Move originals into the Archive folder after bulk processing
    #[arg(long, requires = "bulk", conflicts_with = "input")]
    pub archive: bool,

    /// Apply repairs and write a repaired CSV (default: validate only)
    #[arg(short, long)]
    pub repair: bool,

    /// Report issues without writing any files
    #[arg(long)]
    pub dry_run: bool,

    /// Skip writing the repaired CSV when no issues are found
    #[arg(long)]
    pub no_rewrite_if_clean: bool,

    /// Normalize CRC32 values even when --repair is off
    #[arg(long)]
    pub normalize_crc32: bool,

    /// Restrict repairs to the CRC32 field
    #[arg(long)]
    pub normalize_only: bool,

    /// Record non-UTF-8 input encodings as validation issues
    #[arg(long = "flag-nonutf8")]
    pub flag_non_utf8: bool,
}

impl Cli {
    pub fn to_options(&self) -> RepairOptions {
        let mut options = RepairOptions::new()
            .with_repair(self.repair)
            .with_dry_run(self.dry_run)
            .with_skip_rewrite_if_clean(self.no_rewrite_if_clean)
            .with_normalize_crc32(self.normalize_crc32)
            .with_normalize_only(self.normalize_only)
            .with_flag_non_utf8(self.flag_non_utf8);
        options.output_path = self.output.clone();
        options.log_path = self.log.clone();
        options
    }
}
