// ============================================================
// FIELD VALIDATORS
// ============================================================
// Stateless per-field validate/repair functions. Each one records every
// defect it finds; the value is only changed when `repair` is set, so
// validation-only runs are side-effect-free.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::ValidationIssue;

/// Characters never valid in a Windows filename, control chars included
static FILENAME_INVALID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new("[<>:\"|?*\\x00-\\x1f]").unwrap());

/// Characters never valid in a path; `:` and `\` stay legal here
static PATH_INVALID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new("[<>\"|?*\\x00-\\x1f]").unwrap());

static CRC32_UPPER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9A-F]{8}$").unwrap());
static CRC32_ANY_CASE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Fa-f]{8}$").unwrap());

/// Sentinel substituted for an empty filename under repair
pub const MISSING_FILENAME: &str = "MISSING_FILENAME.jpg";

/// Validate the FileName field: non-empty, no control characters or
/// `<>:"|?*`. Unicode is preserved.
pub fn validate_filename(
    value: &str,
    line_num: usize,
    issues: &mut Vec<ValidationIssue>,
    repair: bool,
) -> String {
    let original = value;

    if original.trim().is_empty() {
        issues.push(ValidationIssue::new(
            line_num,
            1,
            "FileName",
            "Empty filename",
            original,
        ));
        return if repair {
            MISSING_FILENAME.to_string()
        } else {
            original.to_string()
        };
    }

    let mut filename = if repair {
        original.trim().to_string()
    } else {
        original.to_string()
    };

    if FILENAME_INVALID_PATTERN.is_match(&filename) {
        if repair {
            let repaired = FILENAME_INVALID_PATTERN
                .replace_all(&filename, "_")
                .into_owned();
            issues.push(ValidationIssue::repaired(
                line_num,
                1,
                "FileName",
                "Invalid filename characters",
                original,
                repaired.clone(),
            ));
            filename = repaired;
        } else {
            issues.push(ValidationIssue::new(
                line_num,
                1,
                "FileName",
                "Invalid filename characters",
                original,
            ));
        }
    }

    if repair && original != filename {
        issues.push(ValidationIssue::repaired(
            line_num,
            1,
            "FileName",
            "Whitespace trimmed or characters replaced",
            original,
            filename.clone(),
        ));
    }

    filename
}

/// Validate the Size field: an all-digit string.
pub fn validate_size(
    value: &str,
    line_num: usize,
    issues: &mut Vec<ValidationIssue>,
    repair: bool,
) -> String {
    let original = value;
    let size = if repair { original.trim() } else { original };

    if !size.is_empty() && size.chars().all(|c| c.is_ascii_digit()) {
        return size.to_string();
    }

    let digits_only: String = size.chars().filter(|c| c.is_ascii_digit()).collect();
    if !digits_only.is_empty() {
        if repair {
            issues.push(ValidationIssue::repaired(
                line_num,
                2,
                "Size",
                "Non-digit characters removed",
                original,
                digits_only.clone(),
            ));
            digits_only
        } else {
            issues.push(ValidationIssue::new(
                line_num,
                2,
                "Size",
                "Non-digit characters detected",
                original,
            ));
            original.to_string()
        }
    } else if repair {
        issues.push(ValidationIssue::repaired(
            line_num,
            2,
            "Size",
            "Invalid size - no digits found",
            original,
            "0",
        ));
        "0".to_string()
    } else {
        issues.push(ValidationIssue::new(
            line_num,
            2,
            "Size",
            "Invalid size - no digits found",
            original,
        ));
        original.to_string()
    }
}

/// Validate the CRC32 field: exactly 8 hex characters. Checking is
/// case-insensitive; repairing uppercases and pads/truncates to 8.
pub fn validate_crc32(
    value: &str,
    line_num: usize,
    issues: &mut Vec<ValidationIssue>,
    repair: bool,
) -> String {
    let original = value;
    let candidate = if repair {
        original.trim().to_uppercase()
    } else {
        original.trim().to_string()
    };

    let valid = if repair {
        CRC32_UPPER_PATTERN.is_match(&candidate)
    } else {
        CRC32_ANY_CASE_PATTERN.is_match(&candidate)
    };
    if valid {
        return candidate;
    }

    let hex_only: String = candidate
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .collect::<String>()
        .to_uppercase();

    match hex_only.len() {
        8 => {
            if repair {
                issues.push(ValidationIssue::repaired(
                    line_num,
                    3,
                    "CRC32",
                    "Non-hex characters removed",
                    original,
                    hex_only.clone(),
                ));
                hex_only
            } else {
                issues.push(ValidationIssue::new(
                    line_num,
                    3,
                    "CRC32",
                    "Non-hex characters present",
                    original,
                ));
                original.to_string()
            }
        }
        n if n > 8 => {
            if repair {
                let truncated = hex_only[..8].to_string();
                issues.push(ValidationIssue::repaired(
                    line_num,
                    3,
                    "CRC32",
                    "CRC32 truncated to 8 characters",
                    original,
                    truncated.clone(),
                ));
                truncated
            } else {
                issues.push(ValidationIssue::new(
                    line_num,
                    3,
                    "CRC32",
                    "CRC32 too long",
                    original,
                ));
                original.to_string()
            }
        }
        n if n > 0 => {
            if repair {
                let padded = format!("{:0>8}", hex_only);
                issues.push(ValidationIssue::repaired(
                    line_num,
                    3,
                    "CRC32",
                    "CRC32 padded with zeros",
                    original,
                    padded.clone(),
                ));
                padded
            } else {
                issues.push(ValidationIssue::new(
                    line_num,
                    3,
                    "CRC32",
                    "CRC32 too short",
                    original,
                ));
                original.to_string()
            }
        }
        _ => {
            if repair {
                issues.push(ValidationIssue::repaired(
                    line_num,
                    3,
                    "CRC32",
                    "Invalid CRC32 - no valid hex found",
                    original,
                    "00000000",
                ));
                "00000000".to_string()
            } else {
                issues.push(ValidationIssue::new(
                    line_num,
                    3,
                    "CRC32",
                    "Invalid CRC32 - no valid hex found",
                    original,
                ));
                original.to_string()
            }
        }
    }
}

/// Validate the Path field: no control characters or `<>"|?*`; Unicode and
/// backslashes are preserved.
pub fn validate_path(
    value: &str,
    line_num: usize,
    issues: &mut Vec<ValidationIssue>,
    repair: bool,
) -> String {
    let original = value;
    let mut path = if repair {
        original.trim().to_string()
    } else {
        original.to_string()
    };

    if PATH_INVALID_PATTERN.is_match(&path) {
        if repair {
            let repaired = PATH_INVALID_PATTERN.replace_all(&path, "_").into_owned();
            issues.push(ValidationIssue::repaired(
                line_num,
                4,
                "Path",
                "Invalid path characters removed",
                original,
                repaired.clone(),
            ));
            path = repaired;
        } else {
            issues.push(ValidationIssue::new(
                line_num,
                4,
                "Path",
                "Invalid path characters present",
                original,
            ));
        }
    }

    if repair && original != path && !path.is_empty() {
        issues.push(ValidationIssue::repaired(
            line_num,
            4,
            "Path",
            "Whitespace or invalid characters removed",
            original,
            path.clone(),
        ));
    }

    path
}

/// Comments are freeform: trim surrounding whitespace, nothing else.
pub fn validate_comment(value: &str) -> String {
    value.trim().to_string()
}
