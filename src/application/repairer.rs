// ============================================================
// CSV REPAIRER USE CASE
// ============================================================
// Orchestrate one file through decode → parse → validate →
// duplicate check → optional rewrite → log

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use csv::{QuoteStyle, WriterBuilder};
use tracing::info;

use crate::domain::error::AppError;
use crate::domain::{
    EncodingDecision, FileReport, RepairOptions, Result, ValidationIssue,
};
use crate::infrastructure::csv::{
    validate_comment, validate_crc32, validate_filename, validate_path, validate_size,
    DuplicateDetector, EncodingResolver, LineParser,
};

const HEADER_NAME_LABELS: [&str; 3] = ["filename", "file", "name"];
const HEADER_CRC_LABELS: [&str; 3] = ["crc32", "crc", "checksum"];

/// Validation/repair pipeline for a single CSV inventory file.
///
/// Owns the row list and issue list for one run exclusively; nothing is
/// shared across files.
pub struct CsvRepairer {
    options: RepairOptions,
}

impl CsvRepairer {
    /// Create a repairer with the given run options
    pub fn new(options: RepairOptions) -> Self {
        Self { options }
    }

    /// Create with the conservative validate-only defaults
    pub fn with_defaults() -> Self {
        Self::new(RepairOptions::default())
    }

    pub fn options(&self) -> &RepairOptions {
        &self.options
    }

    /// Process one input file.
    ///
    /// Field defects and parse fallbacks are recorded as issues and never
    /// abort the row; decode and write failures surface as `Err` and mark
    /// the whole file failed.
    pub fn process(&self, input: &Path) -> Result<FileReport> {
        let output_path = self
            .options
            .output_path
            .clone()
            .unwrap_or_else(|| Self::default_output_path(input));
        let log_path = self
            .options
            .log_path
            .clone()
            .unwrap_or_else(|| Self::default_log_path(input));

        info!(input = %input.display(), "Validating CSV");

        let decoded = EncodingResolver::decode_file(input)?;

        let mut issues: Vec<ValidationIssue> = Vec::new();
        if !decoded.decision.is_utf8() && self.options.flag_non_utf8 {
            issues.push(ValidationIssue::new(
                0,
                0,
                "File",
                format!("Non-UTF-8 encoding detected: {}", decoded.decision.name),
                input.display().to_string(),
            ));
        }

        let general_repair = self.options.general_repair_enabled();
        let crc_repair = self.options.crc32_repair_enabled();

        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut row_lines: Vec<usize> = Vec::new();
        let mut line_num = 0usize;
        let mut header_detected = false;

        for raw_line in &decoded.lines {
            // blank lines are skipped before row numbering
            if raw_line.trim().is_empty() {
                continue;
            }
            line_num += 1;

            let (mut fields, parse_issue) = LineParser::parse_line(raw_line, line_num).into_parts();
            if let Some(issue) = parse_issue {
                issues.push(issue);
            }
            if fields.is_empty() || (fields.len() == 1 && fields[0].is_empty()) {
                continue;
            }

            if line_num == 1 && fields.len() >= 3 && Self::is_header_row(&fields) {
                header_detected = true;
                info!("Header row detected on line 1, skipping validation");
                rows.push(fields);
                row_lines.push(line_num);
                continue;
            }

            if fields.len() < 4 {
                issues.push(ValidationIssue::new(
                    line_num,
                    0,
                    "Row",
                    format!(
                        "Insufficient fields (found {}, expected at least 4)",
                        fields.len()
                    ),
                    raw_line.trim(),
                ));
                while fields.len() < 4 {
                    fields.push(String::new());
                }
            }

            let filename = validate_filename(&fields[0], line_num, &mut issues, general_repair);
            let size = validate_size(&fields[1], line_num, &mut issues, general_repair);
            let crc32 = validate_crc32(&fields[2], line_num, &mut issues, crc_repair);
            let path = validate_path(&fields[3], line_num, &mut issues, general_repair);
            // fields beyond the path were split off an unquoted comment;
            // rejoin them with the commas the parser consumed
            let comment = if fields.len() >= 5 {
                validate_comment(&fields[4..].join(","))
            } else {
                String::new()
            };

            rows.push(vec![filename, size, crc32, path, comment]);
            row_lines.push(line_num);
        }

        DuplicateDetector::detect(&rows, &row_lines, header_detected, &mut issues);

        let written_output = if self.options.dry_run {
            None
        } else if self.options.skip_rewrite_if_clean && issues.is_empty() {
            info!("No issues found; skipping rewrite of the original CSV as requested");
            None
        } else {
            self.write_output(&output_path, &rows)?;
            Some(output_path)
        };

        let written_log = if !issues.is_empty() || self.options.normalize_crc32 {
            self.write_log(
                &log_path,
                input,
                written_output.as_deref(),
                &decoded.decision,
                line_num,
                &issues,
                header_detected,
            )?;
            Some(log_path)
        } else {
            None
        };

        info!(
            rows = line_num,
            issues = issues.len(),
            encoding = %decoded.decision.name,
            "Validation complete"
        );

        Ok(FileReport {
            issues,
            rows_processed: line_num,
            header_detected,
            encoding: decoded.decision,
            output_path: written_output,
            log_path: written_log,
        })
    }

    /// Header detection applies to logical row 1 only: the name column or
    /// the checksum column must carry a known label.
    fn is_header_row(fields: &[String]) -> bool {
        let name = fields[0].to_lowercase();
        let crc = fields[2].to_lowercase();
        HEADER_NAME_LABELS.contains(&name.as_str()) || HEADER_CRC_LABELS.contains(&crc.as_str())
    }

    /// Output is always UTF-8 with every field quoted, so a rewritten file
    /// re-parses without any of the ambiguity the input had.
    ///
    /// Flexible records: a pass-through header keeps however many columns it
    /// had, which may differ from the 5-field data rows.
    fn write_output(&self, path: &Path, rows: &[Vec<String>]) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .flexible(true)
            .from_path(path)
            .map_err(|e| {
                AppError::WriteError(format!("Failed to create {}: {}", path.display(), e))
            })?;
        for row in rows {
            writer.write_record(row).map_err(|e| {
                AppError::WriteError(format!("Failed to write {}: {}", path.display(), e))
            })?;
        }
        writer.flush().map_err(|e| {
            AppError::WriteError(format!("Failed to flush {}: {}", path.display(), e))
        })?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn write_log(
        &self,
        path: &Path,
        input: &Path,
        output: Option<&Path>,
        encoding: &EncodingDecision,
        rows_processed: usize,
        issues: &[ValidationIssue],
        header_detected: bool,
    ) -> Result<()> {
        let bar = "=".repeat(80);
        let mode = if self.options.dry_run {
            "DRY RUN (validation only)"
        } else {
            "REPAIR"
        };
        let yes_no = |flag: bool| if flag { "Yes" } else { "No" };

        let mut log = String::new();
        log.push_str("CSV Validation and Repair Log\n");
        log.push_str(&bar);
        log.push('\n');
        log.push_str(&format!("Input File: {}\n", input.display()));
        log.push_str(&format!(
            "Output File: {}\n",
            output.map_or_else(|| "(none)".to_string(), |p| p.display().to_string())
        ));
        log.push_str(&format!(
            "Timestamp: {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        log.push_str(&format!("Mode: {}\n", mode));
        log.push_str(&format!(
            "Normalize CRC32: {}\n",
            yes_no(self.options.normalize_crc32)
        ));
        log.push_str(&format!(
            "Normalize Only: {}\n",
            yes_no(self.options.normalize_only)
        ));
        log.push_str(&format!("Encoding: {}\n", encoding.name));
        log.push_str(&format!("\nTotal Rows Processed: {}\n", rows_processed));
        log.push_str(&format!("Total Issues Found: {}\n", issues.len()));
        log.push_str(&format!(
            "Header Row Detected: {}\n",
            yes_no(header_detected)
        ));
        log.push_str(&format!("\n{}\n\n", bar));
        log.push_str("Issues Found:\n");
        log.push_str(&"-".repeat(80));
        log.push('\n');
        for issue in issues {
            log.push_str(&issue.to_string());
            log.push('\n');
        }

        fs::write(path, log).map_err(|e| {
            AppError::WriteError(format!("Failed to write log {}: {}", path.display(), e))
        })
    }

    fn default_output_path(input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        let ext = input.extension().and_then(|s| s.to_str()).unwrap_or("csv");
        input.with_file_name(format!("{}_repaired.{}", stem, ext))
    }

    fn default_log_path(input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        input.with_file_name(format!("{}_repair_log.txt", stem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RunStatus;
    use std::fs;

    fn write_input(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_clean_input_round_trips_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(
            dir.path(),
            "clean.csv",
            "\"a.jpg\",\"1000\",\"ABCD1234\",\"\\path\\\",\"note\"\n",
        );

        let repairer = CsvRepairer::new(RepairOptions::new().with_repair(true));
        let report = repairer.process(&input).unwrap();

        assert_eq!(report.status(), RunStatus::Clean);
        assert!(report.issues.is_empty());
        let rows = read_rows(report.output_path.as_ref().unwrap());
        assert_eq!(
            rows,
            vec![vec!["a.jpg", "1000", "ABCD1234", "\\path\\", "note"]]
        );
        // a clean run without normalization warrants no log
        assert!(report.log_path.is_none());
    }

    #[test]
    fn test_every_row_emitted_with_exactly_five_fields() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(
            dir.path(),
            "counts.csv",
            "a.jpg,10,ABCD1234\nb.jpg,20,DEADBEEF,\\p\\\nc.jpg,30,CAFEBABE,\\q\\,one,two,three\n",
        );

        let repairer = CsvRepairer::new(RepairOptions::new().with_repair(true));
        let report = repairer.process(&input).unwrap();

        let rows = read_rows(report.output_path.as_ref().unwrap());
        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert_eq!(row.len(), 5);
        }
        assert!(report
            .issues
            .iter()
            .any(|i| i.kind.starts_with("Insufficient fields (found 3")));
    }

    #[test]
    fn test_comment_recombination() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(
            dir.path(),
            "comments.csv",
            "a.jpg,10,ABCDEF12,\\path\\,note, with comma\n",
        );

        let repairer = CsvRepairer::new(RepairOptions::new().with_repair(true));
        let report = repairer.process(&input).unwrap();
        let rows = read_rows(report.output_path.as_ref().unwrap());
        assert_eq!(rows[0][4], "note, with comma");
    }

    #[test]
    fn test_escaped_path_boundary_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(
            dir.path(),
            "escaped.csv",
            "file.pdf,12345,ABCDEF12,\\Some\\Path\\With\\Comma\\,Comment text\n",
        );

        let repairer = CsvRepairer::new(RepairOptions::new().with_repair(true));
        let report = repairer.process(&input).unwrap();
        assert!(report.issues.is_empty());
        let rows = read_rows(report.output_path.as_ref().unwrap());
        assert_eq!(rows[0][3], "\\Some\\Path\\With\\Comma\\");
        assert_eq!(rows[0][4], "Comment text");
    }

    #[test]
    fn test_validation_only_is_idempotent_and_leaves_input_alone() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(
            dir.path(),
            "dirty.csv",
            "  a.jpg ,12x4,abcd,\\ok\\,note\n",
        );
        let before = fs::read(&input).unwrap();

        let options = RepairOptions::new().with_dry_run(true);
        let first = CsvRepairer::new(options.clone()).process(&input).unwrap();
        let second = CsvRepairer::new(options).process(&input).unwrap();

        let kinds = |report: &FileReport| {
            report
                .issues
                .iter()
                .map(|i| (i.line, i.field, i.kind.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(kinds(&first), kinds(&second));
        assert!(!first.issues.is_empty());
        assert!(first.output_path.is_none());
        assert_eq!(fs::read(&input).unwrap(), before);
        // no repaired values in validation-only mode
        assert!(first.issues.iter().all(|i| i.repaired.is_none()));
    }

    #[test]
    fn test_dry_run_still_writes_log_for_issues() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "log.csv", "a.jpg,xx,GGGG,\\p\\\n");

        let repairer = CsvRepairer::new(RepairOptions::new().with_dry_run(true));
        let report = repairer.process(&input).unwrap();

        assert!(report.output_path.is_none());
        let log_path = report.log_path.expect("log should be written");
        let log = fs::read_to_string(log_path).unwrap();
        assert!(log.starts_with("CSV Validation and Repair Log"));
        assert!(log.contains("Mode: DRY RUN (validation only)"));
        assert!(log.contains("Normalize CRC32: No"));
        assert!(log.contains("Normalize Only: No"));
        assert!(log.contains(&format!("Total Issues Found: {}", report.issues.len())));
        assert!(log.contains("Header Row Detected: No"));
        assert!(log.contains("Line 1, Field 2 (Size):"));
    }

    #[test]
    fn test_skip_rewrite_if_clean_suppresses_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(
            dir.path(),
            "clean.csv",
            "\"a.jpg\",\"1\",\"ABCD1234\",\"\\p\\\",\"\"\n",
        );

        let repairer = CsvRepairer::new(
            RepairOptions::new()
                .with_repair(true)
                .with_skip_rewrite_if_clean(true),
        );
        let report = repairer.process(&input).unwrap();

        assert_eq!(report.status(), RunStatus::Clean);
        assert!(report.output_path.is_none());
        assert!(!dir.path().join("clean_repaired.csv").exists());
    }

    #[test]
    fn test_normalize_only_touches_crc_alone() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(
            dir.path(),
            "norm.csv",
            "\"  file.txt  \",\"100\",\"abcd1234\",\"\\path\\\",\"\"\n",
        );

        let repairer = CsvRepairer::new(
            RepairOptions::new()
                .with_repair(true)
                .with_normalize_crc32(true)
                .with_normalize_only(true),
        );
        let report = repairer.process(&input).unwrap();

        let rows = read_rows(report.output_path.as_ref().unwrap());
        assert_eq!(rows[0][0], "  file.txt  ");
        assert_eq!(rows[0][2], "ABCD1234");
        // normalization was requested, so a log is written even with no issues
        assert!(report.log_path.is_some());
    }

    #[test]
    fn test_header_row_passes_through_first() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(
            dir.path(),
            "header.csv",
            "FileName,Size,CRC32,Path,Comment\ndata.jpg,9000,EEFFAABB,\\data\\,Important, note, here\n",
        );

        let repairer = CsvRepairer::new(RepairOptions::new().with_repair(true));
        let report = repairer.process(&input).unwrap();

        assert!(report.header_detected);
        let rows = read_rows(report.output_path.as_ref().unwrap());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "FileName");
        assert_eq!(rows[1][4], "Important, note, here");
    }

    #[test]
    fn test_short_header_row_does_not_break_output_write() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(
            dir.path(),
            "short_header.csv",
            "FileName,Size,CRC32,Path\na.jpg,1,ABCD1234,\\p\\\n",
        );

        let repairer = CsvRepairer::new(RepairOptions::new().with_repair(true));
        let report = repairer.process(&input).unwrap();

        assert!(report.header_detected);
        let rows = read_rows(report.output_path.as_ref().unwrap());
        // the 4-column header keeps its width; data rows get the full five
        assert_eq!(rows[0], vec!["FileName", "Size", "CRC32", "Path"]);
        assert_eq!(rows[1], vec!["a.jpg", "1", "ABCD1234", "\\p\\", ""]);
    }

    #[test]
    fn test_duplicate_fingerprints_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(
            dir.path(),
            "dups.csv",
            "a.jpg,100,ABCD1234,\\p\\\nb.jpg,100,abcd1234,\\q\\\nc.jpg,999,ABCD1234,\\r\\\n",
        );

        let repairer = CsvRepairer::new(RepairOptions::new().with_dry_run(true));
        let report = repairer.process(&input).unwrap();

        let dup_issues: Vec<_> = report
            .issues
            .iter()
            .filter(|i| i.kind.starts_with("Duplicate CRC32"))
            .collect();
        assert_eq!(dup_issues.len(), 2);
        assert!(dup_issues.iter().all(|i| i.kind.contains("lines: 1, 2")));
        assert!(dup_issues.iter().all(|i| i.line != 3));
    }

    #[test]
    fn test_blank_lines_not_counted() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(
            dir.path(),
            "blanks.csv",
            "\n  \na.jpg,1,ABCD1234,\\p\\\n\nb.jpg,2,DEADBEEF,\\q\\\n",
        );

        let repairer = CsvRepairer::new(RepairOptions::new().with_dry_run(true));
        let report = repairer.process(&input).unwrap();
        assert_eq!(report.rows_processed, 2);
    }

    #[test]
    fn test_latin1_input_survives_to_utf8_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.csv");
        // 'é' encoded as 0xE9, malformed as UTF-8
        let mut bytes = b"fil".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b".txt,100,12345678,\\path\\\n");
        fs::write(&path, bytes).unwrap();

        let repairer = CsvRepairer::new(RepairOptions::new().with_repair(true));
        let report = repairer.process(&path).unwrap();

        assert!(!report.encoding.is_utf8());
        let output = fs::read_to_string(report.output_path.as_ref().unwrap()).unwrap();
        assert!(output.contains('é'));
        // not flagged as an issue unless opted in
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_flag_non_utf8_records_issue() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.csv");
        let mut bytes = b"file".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b".txt,100,12345678,\\path\\\n");
        fs::write(&path, bytes).unwrap();

        let repairer = CsvRepairer::new(
            RepairOptions::new()
                .with_dry_run(true)
                .with_flag_non_utf8(true),
        );
        let report = repairer.process(&path).unwrap();

        assert_eq!(report.issues.len(), 1);
        let issue = &report.issues[0];
        assert_eq!(issue.line, 0);
        assert_eq!(issue.field, 0);
        assert_eq!(issue.field_name, "File");
        assert!(issue.kind.starts_with("Non-UTF-8 encoding detected"));
    }

    #[test]
    fn test_missing_file_is_a_hard_failure() {
        let dir = tempfile::tempdir().unwrap();
        let result = CsvRepairer::with_defaults().process(&dir.path().join("nope.csv"));
        assert!(matches!(result, Err(AppError::IoError(_))));
    }
}
