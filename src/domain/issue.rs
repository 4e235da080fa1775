// ============================================================
// VALIDATION ISSUE
// ============================================================
// Immutable record of a single defect found while processing a row

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single issue found during validation or repair.
///
/// `field` is 1-based to match the column numbering used in repair logs;
/// 0 means the issue applies to the whole row (or the whole file when
/// `line` is also 0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Logical row number (blank lines are not counted)
    pub line: usize,

    /// Column number, 0 for row-level issues
    pub field: usize,

    /// Field label as it appears in the log ("FileName", "CRC32", "Row", ...)
    pub field_name: String,

    /// Free-text classification of the defect
    pub kind: String,

    /// Value as it appeared in the input
    pub original: String,

    /// Value after repair, absent when nothing was changed
    pub repaired: Option<String>,
}

impl ValidationIssue {
    pub fn new(
        line: usize,
        field: usize,
        field_name: &str,
        kind: impl Into<String>,
        original: impl Into<String>,
    ) -> Self {
        Self {
            line,
            field,
            field_name: field_name.to_string(),
            kind: kind.into(),
            original: original.into(),
            repaired: None,
        }
    }

    pub fn repaired(
        line: usize,
        field: usize,
        field_name: &str,
        kind: impl Into<String>,
        original: impl Into<String>,
        repaired: impl Into<String>,
    ) -> Self {
        Self {
            line,
            field,
            field_name: field_name.to_string(),
            kind: kind.into(),
            original: original.into(),
            repaired: Some(repaired.into()),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Line {}, Field {} ({}): {} - Original: '{}'",
            self.line, self.field, self.field_name, self.kind, self.original
        )?;
        if let Some(fixed) = &self.repaired {
            write!(f, " → Fixed to: '{}'", fixed)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_without_repair() {
        let issue = ValidationIssue::new(3, 2, "Size", "Non-digit characters detected", "12a4");
        assert_eq!(
            issue.to_string(),
            "Line 3, Field 2 (Size): Non-digit characters detected - Original: '12a4'"
        );
    }

    #[test]
    fn test_render_with_repair() {
        let issue =
            ValidationIssue::repaired(7, 3, "CRC32", "CRC32 padded with zeros", "AB12", "0000AB12");
        assert_eq!(
            issue.to_string(),
            "Line 7, Field 3 (CRC32): CRC32 padded with zeros - Original: 'AB12' → Fixed to: '0000AB12'"
        );
    }
}
