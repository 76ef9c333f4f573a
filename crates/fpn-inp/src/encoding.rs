//! Text-encoding detection for FPN files.
//!
//! FPN files are written by tools running under many locales, so the same
//! format turns up as UTF-8, GB18030/GBK, Big5 or a Western code page. Only
//! ASCII numerals, separators and keywords matter downstream, so a wrong but
//! permissive guess is acceptable; a hard decode failure is not.
//!
//! Detection order, first hit wins:
//! 1. byte-order mark (UTF-8, UTF-16LE, UTF-16BE)
//! 2. strict decode of the first `probe_lines` lines with each ranked candidate
//! 3. statistical guess (`chardet` feature)
//! 4. windows-1252, which decodes any byte stream

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use encoding_rs::{BIG5, Encoding, GB18030, UTF_8, WINDOWS_1252};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{FpnError, Result};

/// How an encoding was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    ByteOrderMark,
    Candidate,
    Statistical,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedEncoding {
    pub encoding: &'static Encoding,
    pub source: DetectionSource,
}

impl DetectedEncoding {
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }
}

pub fn default_candidates() -> Vec<&'static Encoding> {
    vec![UTF_8, GB18030, BIG5]
}

/// Permissive single-byte decoder used when nothing else fits.
pub fn fallback_encoding() -> &'static Encoding {
    WINDOWS_1252
}

#[derive(Debug, Clone)]
pub struct SniffOptions {
    pub probe_lines: usize,
    pub candidates: Vec<&'static Encoding>,
    pub statistical_guess: bool,
}

impl Default for SniffOptions {
    fn default() -> Self {
        Self {
            probe_lines: 1000,
            candidates: default_candidates(),
            statistical_guess: true,
        }
    }
}

/// Probe the encoding of the file at `path`.
///
/// Only I/O failures are reported; an undecidable file resolves to the
/// fallback encoding.
pub fn sniff_encoding(path: impl AsRef<Path>, options: &SniffOptions) -> Result<DetectedEncoding> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| FpnError::io(path, e))?;
    let prefix = read_line_prefix(BufReader::new(file), options.probe_lines)
        .map_err(|e| FpnError::io(path, e))?;
    let detected = sniff_bytes(&prefix, options);
    debug!(
        path = %path.display(),
        encoding = detected.name(),
        source = ?detected.source,
        "detected file encoding"
    );
    Ok(detected)
}

/// Detect the encoding of an in-memory prefix of a file.
pub fn sniff_bytes(prefix: &[u8], options: &SniffOptions) -> DetectedEncoding {
    if let Some((encoding, _bom_len)) = Encoding::for_bom(prefix) {
        return DetectedEncoding {
            encoding,
            source: DetectionSource::ByteOrderMark,
        };
    }

    if let Some(encoding) = options.candidates.iter().copied().find(|enc| {
        enc.decode_without_bom_handling_and_without_replacement(prefix)
            .is_some()
    }) {
        return DetectedEncoding {
            encoding,
            source: DetectionSource::Candidate,
        };
    }

    if options.statistical_guess
        && let Some(encoding) = statistical_guess(prefix)
    {
        return DetectedEncoding {
            encoding,
            source: DetectionSource::Statistical,
        };
    }

    warn!(
        fallback = fallback_encoding().name(),
        "no candidate encoding decodes the file prefix, using fallback"
    );
    DetectedEncoding {
        encoding: fallback_encoding(),
        source: DetectionSource::Fallback,
    }
}

#[cfg(feature = "chardet")]
fn statistical_guess(prefix: &[u8]) -> Option<&'static Encoding> {
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(prefix, true);
    Some(detector.guess(None, true))
}

#[cfg(not(feature = "chardet"))]
fn statistical_guess(_prefix: &[u8]) -> Option<&'static Encoding> {
    None
}

/// Read at most `max_lines` raw lines (newlines included).
pub fn read_line_prefix<R: BufRead>(mut reader: R, max_lines: usize) -> std::io::Result<Vec<u8>> {
    let mut prefix = Vec::new();
    for _ in 0..max_lines {
        if reader.read_until(b'\n', &mut prefix)? == 0 {
            break;
        }
    }
    Ok(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn utf8_bom_wins_without_candidate_trial() {
        let options = SniffOptions {
            candidates: Vec::new(),
            statistical_guess: false,
            ..SniffOptions::default()
        };
        let detected = sniff_bytes(b"\xEF\xBB\xBFNODE , 1, 0, 0, 0\n", &options);
        assert_eq!(detected.encoding, UTF_8);
        assert_eq!(detected.source, DetectionSource::ByteOrderMark);
    }

    #[test]
    fn utf16_marks_are_recognised() {
        let options = SniffOptions::default();
        let le = sniff_bytes(b"\xFF\xFEN\0O\0", &options);
        assert_eq!(le.encoding, encoding_rs::UTF_16LE);
        let be = sniff_bytes(b"\xFE\xFF\0N\0O", &options);
        assert_eq!(be.encoding, encoding_rs::UTF_16BE);
    }

    #[test]
    fn plain_ascii_is_utf8_by_candidate() {
        let detected = sniff_bytes(b"NODE , 1, 0, 0, 0\n", &SniffOptions::default());
        assert_eq!(detected.encoding, UTF_8);
        assert_eq!(detected.source, DetectionSource::Candidate);
    }

    #[test]
    fn gb18030_names_fall_through_to_second_candidate() {
        // "MSET , 1, 中文" encoded as GB18030
        let bytes = b"MSET , 1, \xD6\xD0\xCE\xC4\n";
        let detected = sniff_bytes(bytes, &SniffOptions::default());
        assert_eq!(detected.encoding, GB18030);
        assert_eq!(detected.source, DetectionSource::Candidate);
    }

    #[test]
    fn undecidable_prefix_uses_single_byte_fallback() {
        let options = SniffOptions {
            candidates: vec![UTF_8],
            statistical_guess: false,
            ..SniffOptions::default()
        };
        let detected = sniff_bytes(b"MSET , 1, \xFF\xFE\xFD\n", &options);
        assert_eq!(detected.encoding, WINDOWS_1252);
        assert_eq!(detected.source, DetectionSource::Fallback);
    }

    #[cfg(feature = "chardet")]
    #[test]
    fn statistical_guess_runs_when_no_candidate_decodes() {
        // GBK: "土层粘土与砂土", "中风化岩石"
        let bytes = b"MSET , 1, \xCD\xC1\xB2\xE3\xD5\xB3\xCD\xC1\xD3\xEB\xC9\xB0\xCD\xC1\n\
MSET , 2, \xD6\xD0\xB7\xE7\xBB\xAF\xD1\xD2\xCA\xAF\n";
        let options = SniffOptions {
            candidates: vec![UTF_8],
            statistical_guess: true,
            ..SniffOptions::default()
        };
        let detected = sniff_bytes(bytes, &options);
        assert_eq!(detected.source, DetectionSource::Statistical);
        let (text, had_errors) = detected
            .encoding
            .decode_without_bom_handling(bytes);
        assert!(!had_errors);
        assert!(text.contains("中风化岩石"));
    }

    #[test]
    fn only_leading_lines_are_inspected() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        for i in 0..5 {
            writeln!(file, "NODE , {}, 0, 0, 0", i + 1).unwrap();
        }
        // invalid UTF-8 after the inspected lines
        file.write_all(b"MSET , 1, \xD6\xD0\n").unwrap();

        let options = SniffOptions {
            probe_lines: 5,
            ..SniffOptions::default()
        };
        let detected = sniff_encoding(file.path(), &options).expect("sniff should succeed");
        assert_eq!(detected.encoding, UTF_8);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = sniff_encoding(dir.path().join("missing.fpn"), &SniffOptions::default())
            .expect_err("missing file should fail");
        assert!(matches!(err, FpnError::Io { .. }));
    }
}
