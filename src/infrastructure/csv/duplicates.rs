// ============================================================
// DUPLICATE DETECTOR
// ============================================================
// Post-pass over all parsed rows flagging repeated (CRC32, Size)
// fingerprints. Detection only, nothing is mutated.

use std::collections::HashMap;

use crate::domain::ValidationIssue;

/// Flags rows whose normalized (CRC32, Size) pair occurs more than once.
pub struct DuplicateDetector;

impl DuplicateDetector {
    /// Scan the processed rows and append one issue per member of every
    /// colliding fingerprint group, citing the full list of line numbers.
    ///
    /// `rows` and `line_numbers` are parallel; when `skip_first` is set the
    /// first row is a detected header and is excluded from keying.
    pub fn detect(
        rows: &[Vec<String>],
        line_numbers: &[usize],
        skip_first: bool,
        issues: &mut Vec<ValidationIssue>,
    ) {
        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
        // keys in first-seen order so the log stays deterministic
        let mut key_order: Vec<String> = Vec::new();

        for (idx, row) in rows.iter().enumerate() {
            if skip_first && idx == 0 && line_numbers[idx] == 1 {
                continue;
            }
            let crc_field = row.get(2).map(String::as_str).unwrap_or("");
            let size_field = row.get(1).map(String::as_str).unwrap_or("");

            let Some(key) = Self::fingerprint(crc_field, size_field) else {
                continue;
            };

            let members = groups.entry(key.clone()).or_insert_with(|| {
                key_order.push(key);
                Vec::new()
            });
            members.push(idx);
        }

        for key in &key_order {
            let indices = &groups[key];
            if indices.len() < 2 {
                continue;
            }
            let lines: Vec<String> = indices
                .iter()
                .map(|&i| line_numbers[i].to_string())
                .collect();
            let lines_str = lines.join(", ");
            let (crc_part, size_part) = key.split_once(':').unwrap_or((key.as_str(), ""));

            for &i in indices {
                let original = rows[i].get(2).cloned().unwrap_or_default();
                issues.push(ValidationIssue::new(
                    line_numbers[i],
                    3,
                    "CRC32",
                    format!(
                        "Duplicate CRC32 value found; CRC={}, Size={}; also used on lines: {}",
                        crc_part, size_part, lines_str
                    ),
                    original,
                ));
            }
        }
    }

    /// Derive the transient duplicate key: hex-only uppercased CRC padded or
    /// truncated to 8, joined with the size (integer-parsed when possible,
    /// trimmed text otherwise). Rows with no hex in the CRC produce no key.
    fn fingerprint(crc_field: &str, size_field: &str) -> Option<String> {
        let hex_only: String = crc_field
            .chars()
            .filter(|c| c.is_ascii_hexdigit())
            .collect::<String>()
            .to_uppercase();
        if hex_only.is_empty() {
            return None;
        }
        let mut norm_crc = format!("{:0>8}", hex_only);
        norm_crc.truncate(8);

        let trimmed_size = size_field.trim();
        let norm_size = match trimmed_size.parse::<i64>() {
            Ok(n) => n.to_string(),
            Err(_) => trimmed_size.to_string(),
        };

        Some(format!("{}:{}", norm_crc, norm_size))
    }
}
