//! Per-parse statistics.

use std::collections::BTreeMap;

use serde::Serialize;

use fpn_inp::{CoordinateOffset, DetectionSource, Keyword};

use crate::model::FpnModel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodingSummary {
    pub name: String,
    pub source: DetectionSource,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseSummary {
    pub encoding: Option<EncodingSummary>,
    /// A malformed byte sequence was replaced during the main pass.
    pub had_replacements: bool,
    pub offset: CoordinateOffset,
    pub total_lines: usize,
    /// Successfully decoded records per keyword.
    pub record_counts: BTreeMap<Keyword, usize>,
    pub decode_failures: usize,
    pub unrecognized_lines: usize,
    pub unrecognized_tokens: BTreeMap<String, usize>,
    pub orphan_continuations: usize,
    pub dropped_commands: usize,
    pub duplicate_ids: usize,
    pub nodes: usize,
    pub volume_elements: usize,
    pub line_elements: usize,
    pub plate_elements: usize,
    pub materials: usize,
    pub boundary_groups: usize,
    pub stages: usize,
}

impl ParseSummary {
    pub fn count(&self, keyword: Keyword) -> usize {
        self.record_counts.get(&keyword).copied().unwrap_or(0)
    }

    pub fn total_records(&self) -> usize {
        self.record_counts.values().sum()
    }

    pub fn total_elements(&self) -> usize {
        self.volume_elements + self.line_elements + self.plate_elements
    }

    /// Fill the collection sizes from the finished model.
    pub fn record_model(&mut self, model: &FpnModel) {
        self.offset = model.offset;
        self.nodes = model.nodes.len();
        self.volume_elements = model.volumes.len();
        self.line_elements = model.lines.len();
        self.plate_elements = model.plates.len();
        self.materials = model.materials.len();
        self.boundary_groups = model.boundary_groups.len();
        self.stages = model.stages.len();
    }
}
