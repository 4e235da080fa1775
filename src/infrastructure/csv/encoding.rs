// ============================================================
// ENCODING RESOLVER
// ============================================================
// Decode CSV inventories of unknown encoding: BOM sniffing first,
// then an ordered fallback chain of candidate encodings

use std::fs;
use std::path::Path;

use encoding_rs::{Encoding, ISO_8859_2, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1250, WINDOWS_1252};
use tracing::info;

use crate::domain::error::AppError;
use crate::domain::{DetectionMethod, EncodingDecision, Result};

/// Decoded text of one input file plus the encoding that produced it
#[derive(Debug, Clone)]
pub struct DecodedFile {
    /// Decoded lines, line terminators removed
    pub lines: Vec<String>,

    /// Winning encoding and how it was found
    pub decision: EncodingDecision,
}

/// BOM signature found at the start of the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BomSignature {
    Utf32Le,
    Utf32Be,
    Utf16Le,
    Utf16Be,
    Utf8Sig,
}

/// Resolves the byte-to-text decoding for one input file.
///
/// The decision is made once, before any line is parsed, and never
/// changes for the rest of the run.
pub struct EncodingResolver;

impl EncodingResolver {
    /// Decode a file, trying the BOM first and then the fallback chain.
    ///
    /// Fails with `DecodeError` only when every candidate fails; the
    /// caller aborts processing of this file but not of a whole batch.
    pub fn decode_file(path: &Path) -> Result<DecodedFile> {
        let bytes = fs::read(path)
            .map_err(|e| AppError::IoError(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::decode_bytes(&bytes).ok_or_else(|| {
            AppError::DecodeError(format!(
                "Could not decode {} with any supported encoding",
                path.display()
            ))
        })
    }

    /// Decode a raw byte buffer. Returns `None` when no candidate encoding
    /// decodes the whole buffer without error.
    pub fn decode_bytes(bytes: &[u8]) -> Option<DecodedFile> {
        if let Some(bom) = Self::sniff_bom(bytes) {
            if let Some(decoded) = Self::decode_with_bom(bytes, bom) {
                return Some(decoded);
            }
            // BOM decode failed, fall through to the probe chain
        }

        Self::probe_fallback_chain(bytes)
    }

    /// Match known BOM signatures against the first 4 bytes.
    /// UTF-32 LE must be checked before UTF-16 LE (shared FF FE prefix).
    fn sniff_bom(bytes: &[u8]) -> Option<BomSignature> {
        if bytes.starts_with(&[0xFF, 0xFE, 0x00, 0x00]) {
            Some(BomSignature::Utf32Le)
        } else if bytes.starts_with(&[0x00, 0x00, 0xFE, 0xFF]) {
            Some(BomSignature::Utf32Be)
        } else if bytes.starts_with(&[0xFF, 0xFE]) {
            Some(BomSignature::Utf16Le)
        } else if bytes.starts_with(&[0xFE, 0xFF]) {
            Some(BomSignature::Utf16Be)
        } else if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
            Some(BomSignature::Utf8Sig)
        } else {
            None
        }
    }

    fn decode_with_bom(bytes: &[u8], bom: BomSignature) -> Option<DecodedFile> {
        let (name, text) = match bom {
            BomSignature::Utf32Le => ("utf-32", Self::decode_utf32(&bytes[4..], true)?),
            BomSignature::Utf32Be => ("utf-32-be", Self::decode_utf32(&bytes[4..], false)?),
            BomSignature::Utf16Le => ("utf-16", Self::decode_strict(UTF_16LE, &bytes[2..])?),
            BomSignature::Utf16Be => ("utf-16", Self::decode_strict(UTF_16BE, &bytes[2..])?),
            BomSignature::Utf8Sig => ("utf-8-sig", Self::decode_strict(UTF_8, &bytes[3..])?),
        };

        let decision = EncodingDecision::new(name, DetectionMethod::Bom);
        if !decision.is_utf8() {
            info!(encoding = name, "File encoding detected via BOM");
        }
        Some(Self::into_lines(text, decision))
    }

    /// Probe the ordered fallback list. The Windows ANSI codepage probe is
    /// platform-only and therefore skipped here; latin-1/iso-8859-1 fold
    /// into windows-1252 under WHATWG encoding rules.
    fn probe_fallback_chain(bytes: &[u8]) -> Option<DecodedFile> {
        // utf-8-sig only applies when the BOM bytes are actually present
        if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
            if let Some(text) = Self::decode_strict(UTF_8, &bytes[3..]) {
                let decision = EncodingDecision::new("utf-8-sig", DetectionMethod::FallbackProbe);
                return Some(Self::into_lines(text, decision));
            }
        }

        const CHAIN: [(&str, &'static Encoding); 5] = [
            ("utf-8", UTF_8),
            ("windows-1250", WINDOWS_1250),
            ("windows-1252", WINDOWS_1252),
            ("iso-8859-2", ISO_8859_2),
            ("utf-16", UTF_16LE),
        ];

        for (name, encoding) in CHAIN {
            if let Some(text) = Self::decode_strict(encoding, bytes) {
                let decision = EncodingDecision::new(name, DetectionMethod::FallbackProbe);
                if !decision.is_utf8() {
                    info!(encoding = name, "File encoding detected via fallback probe");
                }
                return Some(Self::into_lines(text, decision));
            }
        }

        None
    }

    /// Decode with a hard failure on any malformed sequence (no replacement
    /// characters): a candidate must decode the whole file cleanly to win.
    fn decode_strict(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
        let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
        if had_errors {
            None
        } else {
            Some(text.into_owned())
        }
    }

    /// encoding_rs deliberately omits UTF-32, so BOM-announced UTF-32 input
    /// is decoded by hand: 4-byte scalar values, no partial trailing chunk.
    fn decode_utf32(bytes: &[u8], little_endian: bool) -> Option<String> {
        if bytes.len() % 4 != 0 {
            return None;
        }
        let mut text = String::with_capacity(bytes.len() / 4);
        for chunk in bytes.chunks_exact(4) {
            let raw = if little_endian {
                u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
            } else {
                u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
            };
            text.push(char::from_u32(raw)?);
        }
        Some(text)
    }

    /// Split decoded text into lines, stripping any BOM character that
    /// survived decoding from the first line.
    fn into_lines(text: String, decision: EncodingDecision) -> DecodedFile {
        let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
        if let Some(first) = lines.first_mut() {
            let stripped = first.trim_start_matches('\u{feff}');
            if stripped.len() != first.len() {
                *first = stripped.to_string();
            }
        }
        DecodedFile { lines, decision }
    }
}
