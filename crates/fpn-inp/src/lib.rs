//! Streaming reader for FPN geotechnical neutral files.
//!
//! This crate covers everything below the engineering model:
//! - **Encoding detection** (byte-order mark, ranked candidates, statistical guess, fallback)
//! - **Decoded line streaming** with replacement of malformed byte sequences
//! - **Line classification** by leading keyword token
//! - **Record decoders** for every supported keyword, with unit conversion
//! - **Coordinate-offset probe** over the leading `NODE` records
//!
//! Stage accumulation and model assembly live in `fpn-model`.

pub mod dof;
pub mod encoding;
pub mod error;
pub mod keyword;
pub mod lines;
pub mod offset;
pub mod record;

use encoding_rs::Encoding;

pub use dof::{DOF_CODE_LEN, DOF_NAMES, DofCode};
pub use encoding::{
    DetectedEncoding, DetectionSource, SniffOptions, default_candidates, fallback_encoding,
    read_line_prefix, sniff_bytes, sniff_encoding,
};
pub use error::{DecodeError, FpnError, Result};
pub use keyword::{Keyword, LineClass, classify};
pub use lines::DecodedLines;
pub use offset::{CoordinateOffset, compute_coordinate_offset, probe_coordinate_offset};
pub use record::{
    CommandKind, ConstRecord, GroupCommandRecord, Id, LineRecord, MatgenRecord, MatporoRecord,
    MisoRecord, MnlmcRecord, NamedRecord, NodeRecord, PlateRecord, PrestressRecord, Record,
    SectionRecord, StageRecord, VolumeKind, VolumeRecord, decode, decode_continuation,
};

/// Knobs for the three reading passes.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Lines inspected by the encoding probe.
    pub probe_lines: usize,
    /// Valid `NODE` records the coordinate offset is taken over.
    pub offset_sample_limit: usize,
    /// Ranked encodings tried with a strict decode.
    pub candidate_encodings: Vec<&'static Encoding>,
    pub statistical_guess: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            probe_lines: 1000,
            offset_sample_limit: 1000,
            candidate_encodings: default_candidates(),
            statistical_guess: true,
        }
    }
}

impl ParseOptions {
    /// Replace the candidate list from WHATWG labels (`"utf-8"`, `"gbk"`, ...).
    ///
    /// Unknown labels are skipped and returned so the caller can report them.
    pub fn with_candidate_labels<S: AsRef<str>>(mut self, labels: &[S]) -> (Self, Vec<String>) {
        let mut unknown = Vec::new();
        self.candidate_encodings = labels
            .iter()
            .filter_map(|label| {
                let label = label.as_ref();
                let found = Encoding::for_label(label.trim().as_bytes());
                if found.is_none() {
                    unknown.push(label.to_string());
                }
                found
            })
            .collect();
        (self, unknown)
    }

    pub fn sniff_options(&self) -> SniffOptions {
        SniffOptions {
            probe_lines: self.probe_lines,
            candidates: self.candidate_encodings.clone(),
            statistical_guess: self.statistical_guess,
        }
    }
}
