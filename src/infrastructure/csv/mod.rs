// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// Encoding detection, line parsing, field validation and
// duplicate-fingerprint detection

mod duplicates;
mod encoding;
mod line_parser;
mod validators;

pub use duplicates::DuplicateDetector;
pub use encoding::{DecodedFile, EncodingResolver};
pub use line_parser::{LineParse, LineParser};
pub use validators::{
    validate_comment, validate_crc32, validate_filename, validate_path, validate_size,
    MISSING_FILENAME,
};
