// ============================================================
// LINE PARSER
// ============================================================
// Recover ordered fields from one raw CSV line. Handles RFC-4180
// quoting mixed with legacy unescaped commas and literal backslash
// path separators that must not be torn apart by the delimiter.

use csv::{ReaderBuilder, StringRecord};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::domain::ValidationIssue;

/// Backslash-delimited region whose closing backslash sits directly before
/// a comma, e.g. `\Specials\MediaMarkt\,`. Greedy so the full span between
/// the outer backslashes is captured.
static REGION_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\\.*\\,").unwrap());

/// One-or-more backslashes directly before a comma; region restoration can
/// leave a doubled backslash behind.
static BACKSLASH_RUN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\+,").unwrap());

const REGION_PLACEHOLDER_PREFIX: &str = "<<<CSV_REGION_";

/// Result of parsing one line.
///
/// `Recovered` means the strict parse failed and the fields come from the
/// best-effort comma split; the attached issue belongs in the run's issue
/// log. The parser never panics past this boundary.
#[derive(Debug, Clone)]
pub enum LineParse {
    Clean(Vec<String>),
    Recovered {
        fields: Vec<String>,
        issue: ValidationIssue,
    },
}

impl LineParse {
    pub fn into_parts(self) -> (Vec<String>, Option<ValidationIssue>) {
        match self {
            LineParse::Clean(fields) => (fields, None),
            LineParse::Recovered { fields, issue } => (fields, Some(issue)),
        }
    }
}

/// Quote- and backslash-aware parser for one line of a CRC32 inventory.
pub struct LineParser;

impl LineParser {
    /// Parse a raw line into an ordered field list.
    ///
    /// Output fields are never individually quoted; output quoting policy
    /// belongs to the writer.
    pub fn parse_line(raw: &str, line_num: usize) -> LineParse {
        let line = raw.trim_end_matches(|c| c == '\r' || c == '\n');

        let mut regions: Vec<String> = Vec::new();
        let masked = Self::mask_regions(line, &mut regions);

        match Self::rfc_split(&masked) {
            Ok(mut fields) => {
                Self::restore_regions(&mut fields, &regions);
                for field in fields.iter_mut() {
                    *field = Self::unquote_if_quoted(field);
                }
                Self::normalize_backslash_runs(&mut fields);
                Self::split_merged_path_comment(line, &mut fields);
                LineParse::Clean(fields)
            }
            Err(err) => {
                let mut fields = Self::comma_split_fallback(&masked);
                let issue = ValidationIssue::new(
                    line_num,
                    0,
                    "Row",
                    format!("CSV parsing error: {}", err),
                    line,
                );
                Self::restore_regions(&mut fields, &regions);
                Self::normalize_backslash_runs(&mut fields);
                for field in fields.iter_mut() {
                    *field = Self::unquote_if_quoted(field);
                }
                Self::split_merged_path_comment(line, &mut fields);
                LineParse::Recovered { fields, issue }
            }
        }
    }

    /// Substitute each protected backslash region with an indexed placeholder
    /// token, keeping the original text in `regions` for restoration after
    /// delimiter-aware parsing. Lines that already contain the marker text
    /// are left unmasked rather than risking a collision.
    fn mask_regions(line: &str, regions: &mut Vec<String>) -> String {
        if line.contains(REGION_PLACEHOLDER_PREFIX) {
            return line.to_string();
        }
        REGION_PATTERN
            .replace_all(line, |caps: &Captures<'_>| {
                let matched = &caps[0];
                // keep the outer backslashes, drop the trailing comma
                let region = &matched[..matched.len() - 1];
                let idx = regions.len();
                regions.push(region.to_string());
                format!("{},", Self::placeholder(idx))
            })
            .into_owned()
    }

    fn placeholder(idx: usize) -> String {
        format!("{}{}>>>", REGION_PLACEHOLDER_PREFIX, idx)
    }

    fn restore_regions(fields: &mut [String], regions: &[String]) {
        if regions.is_empty() {
            return;
        }
        for field in fields.iter_mut() {
            for (idx, region) in regions.iter().enumerate() {
                let token = Self::placeholder(idx);
                if field.contains(&token) {
                    *field = field.replace(&token, region);
                }
            }
        }
    }

    /// Strict RFC-4180 field split of a single line: doublequote escaping on,
    /// no whitespace trimming, flexible field count.
    fn rfc_split(line: &str) -> Result<Vec<String>, csv::Error> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_bytes());
        let mut record = StringRecord::new();
        if reader.read_record(&mut record)? {
            Ok(record.iter().map(str::to_string).collect())
        } else {
            Ok(Vec::new())
        }
    }

    /// Fields that still carry literal surrounding quotes (malformed input or
    /// the fallback path) are unquoted here so the writer does not re-quote
    /// an already-quoted value and double the quotes.
    fn unquote_if_quoted(field: &str) -> String {
        let bytes = field.as_bytes();
        if bytes.len() >= 2 && bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"' {
            field[1..field.len() - 1].replace("\"\"", "\"")
        } else {
            field.to_string()
        }
    }

    /// Collapse any run of backslashes directly before a comma down to a
    /// single backslash plus the comma.
    fn normalize_backslash_runs(fields: &mut [String]) {
        for field in fields.iter_mut() {
            if BACKSLASH_RUN_PATTERN.is_match(field) {
                *field = BACKSLASH_RUN_PATTERN.replace_all(field, r"\,").into_owned();
            }
        }
    }

    /// When the raw line used a literal backslash+comma sequence but the parse
    /// produced a combined Path+Comment field (exactly 4 fields), split that
    /// field at its first comma and restore the trailing backslash onto the
    /// path portion unless it already ends with one.
    fn split_merged_path_comment(raw_line: &str, fields: &mut Vec<String>) {
        if fields.len() != 4 || !raw_line.contains("\\,") {
            return;
        }
        if let Some((path_part, comment_part)) = fields[3].clone().split_once(',') {
            let path = if path_part.ends_with('\\') {
                path_part.to_string()
            } else {
                format!("{}\\", path_part)
            };
            let comment = comment_part.to_string();
            fields[3] = path;
            fields.push(comment);
        }
    }

    /// Best-effort split used when the strict parse fails: split by comma and
    /// re-join any fragment that ends in a backslash with its successor (the
    /// comma was inside an escaped region).
    fn comma_split_fallback(masked: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut parts = masked.split(',');
        let mut current = parts.next().unwrap_or("").to_string();
        for part in parts {
            if current.ends_with('\\') {
                current.push(',');
                current.push_str(part);
            } else {
                fields.push(current);
                current = part.to_string();
            }
        }
        fields.push(current);
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Vec<String> {
        LineParser::parse_line(line, 1).into_parts().0
    }

    #[test]
    fn test_simple_row() {
        let fields = parse("a.jpg,1000,ABCD1234,\\path\\,comment\n");
        assert_eq!(fields, vec!["a.jpg", "1000", "ABCD1234", "\\path\\", "comment"]);
    }

    #[test]
    fn test_escaped_comma_inside_path() {
        let fields = parse("file.pdf,12345,ABCDEF12,\\Some\\Path\\With\\Comma\\,Comment text\n");
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[0], "file.pdf");
        assert_eq!(fields[1], "12345");
        assert_eq!(fields[2], "ABCDEF12");
        assert_eq!(fields[3], "\\Some\\Path\\With\\Comma\\");
        assert!(fields[3].ends_with('\\'));
        assert!(!fields[3].ends_with("\\\\"));
        assert_eq!(fields[4], "Comment text");
    }

    #[test]
    fn test_unquoted_comment_with_comma_splits() {
        // the pipeline rejoins fields 4+; the parser just reports the split
        let fields = parse("a.jpg,10,ABCDEF12,\\path\\,note, with comma");
        assert_eq!(fields.len(), 6);
        assert_eq!(fields[3], "\\path\\");
        assert_eq!(fields[4], "note");
        assert_eq!(fields[5], " with comma");
    }

    #[test]
    fn test_quoted_comment_with_doubled_quotes() {
        let raw = "bp_009.jpg,1978743,956820FA,\\2006-09-02__BeautyAngel-by-Rasputin\\,\"in the \"\"2006-09-16__Krasa-kama-by-Rasputin\"\" zip file from\"\n";
        let fields = parse(raw);
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[3], "\\2006-09-02__BeautyAngel-by-Rasputin\\");
        assert_eq!(
            fields[4],
            "in the \"2006-09-16__Krasa-kama-by-Rasputin\" zip file from"
        );
    }

    #[test]
    fn test_quoted_field_with_comma_preserved() {
        let fields = parse("a.jpg,10,ABCDEF12,\\p\\,\"note, with comma\"");
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[4], "note, with comma");
    }

    #[test]
    fn test_quoted_path_with_escaped_comma_splits_merged_field() {
        let fields = parse("a.jpg,1,ABCDEF12,\"\\path\\,note\"");
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[3], "\\path\\");
        assert_eq!(fields[4], "note");
    }

    #[test]
    fn test_leading_space_not_trimmed() {
        let fields = parse("a.jpg, 10,ABCDEF12,\\p\\");
        assert_eq!(fields[1], " 10");
    }

    #[test]
    fn test_short_row_passes_through() {
        let fields = parse("a.jpg,10,ABCDEF12");
        assert_eq!(fields, vec!["a.jpg", "10", "ABCDEF12"]);
    }

    #[test]
    fn test_fallback_rejoins_backslash_fragments() {
        let fields = LineParser::comma_split_fallback("a.jpg,10,AB,\\x\\,rest");
        assert_eq!(fields, vec!["a.jpg", "10", "AB", "\\x\\,rest"]);
    }

    #[test]
    fn test_backslash_run_normalized() {
        let mut fields = vec!["\\path\\\\,tail".to_string()];
        LineParser::normalize_backslash_runs(&mut fields);
        assert_eq!(fields[0], "\\path\\,tail");
    }

    #[test]
    fn test_unquote_collapses_doubled_quotes() {
        assert_eq!(
            LineParser::unquote_if_quoted("\"say \"\"hi\"\"\""),
            "say \"hi\""
        );
        assert_eq!(LineParser::unquote_if_quoted("plain"), "plain");
        assert_eq!(LineParser::unquote_if_quoted("\""), "\"");
    }

    #[test]
    fn test_empty_line_yields_no_fields() {
        assert!(parse("").is_empty());
    }
}
