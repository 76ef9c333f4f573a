//! Three-pass parse: encoding probe, coordinate-offset probe, main pass.

use std::io;
use std::path::Path;

use tracing::{debug, info, warn};

use fpn_inp::{
    CoordinateOffset, DecodeError, DecodedLines, FpnError, LineClass, ParseOptions, Record,
    Result, classify, compute_coordinate_offset, decode, decode_continuation,
    probe_coordinate_offset, read_line_prefix, sniff_bytes, sniff_encoding,
};

use crate::assembler::ModelAssembler;
use crate::model::FpnModel;
use crate::stage::{CommandOutcome, ParserState, StageAccumulator};
use crate::summary::{EncodingSummary, ParseSummary};

/// Label used in errors for in-memory input.
const MEMORY_SOURCE: &str = "<memory>";

#[derive(Debug, Clone)]
pub struct ParsedFpn {
    pub model: FpnModel,
    pub summary: ParseSummary,
}

/// Parse the FPN file at `path`.
///
/// Only I/O failures are returned; malformed lines are counted in the
/// summary and skipped.
pub fn parse_fpn_file(path: impl AsRef<Path>, options: &ParseOptions) -> Result<ParsedFpn> {
    let path = path.as_ref();
    let detected = sniff_encoding(path, &options.sniff_options())?;
    let offset = compute_coordinate_offset(path, detected.encoding, options.offset_sample_limit)?;

    let mut lines = DecodedLines::open(path, detected.encoding)?;
    let mut pass = MainPass::new(offset);
    pass.run(&mut lines).map_err(|e| FpnError::io(path, e))?;

    let mut parsed = pass.finish();
    parsed.summary.encoding = Some(EncodingSummary {
        name: detected.name().to_string(),
        source: detected.source,
    });
    parsed.summary.had_replacements = lines.had_replacements();
    log_summary(&path.display().to_string(), &parsed.summary);
    Ok(parsed)
}

/// Parse FPN content already held in memory, with the same three passes.
pub fn parse_fpn_bytes(bytes: &[u8], options: &ParseOptions) -> Result<ParsedFpn> {
    let prefix =
        read_line_prefix(bytes, options.probe_lines).map_err(|e| FpnError::io(MEMORY_SOURCE, e))?;
    let detected = sniff_bytes(&prefix, &options.sniff_options());
    let offset = probe_coordinate_offset(
        DecodedLines::new(bytes, detected.encoding),
        options.offset_sample_limit,
    )
    .map_err(|e| FpnError::io(MEMORY_SOURCE, e))?;

    let mut lines = DecodedLines::new(bytes, detected.encoding);
    let mut pass = MainPass::new(offset);
    pass.run(&mut lines)
        .map_err(|e| FpnError::io(MEMORY_SOURCE, e))?;

    let mut parsed = pass.finish();
    parsed.summary.encoding = Some(EncodingSummary {
        name: detected.name().to_string(),
        source: detected.source,
    });
    parsed.summary.had_replacements = lines.had_replacements();
    log_summary(MEMORY_SOURCE, &parsed.summary);
    Ok(parsed)
}

fn log_summary(source: &str, summary: &ParseSummary) {
    info!(
        source,
        lines = summary.total_lines,
        nodes = summary.nodes,
        elements = summary.total_elements(),
        materials = summary.materials,
        stages = summary.stages,
        failures = summary.decode_failures,
        "parsed FPN input"
    );
    if summary.total_elements() == 0 {
        warn!(source, "no elements decoded");
    }
}

/// Line dispatch of the main pass.
struct MainPass {
    assembler: ModelAssembler,
    stages: StageAccumulator,
    summary: ParseSummary,
}

impl MainPass {
    fn new(offset: CoordinateOffset) -> Self {
        Self {
            assembler: ModelAssembler::new(offset),
            stages: StageAccumulator::new(),
            summary: ParseSummary::default(),
        }
    }

    fn run<I>(&mut self, lines: I) -> io::Result<()>
    where
        I: IntoIterator<Item = io::Result<String>>,
    {
        let mut state = ParserState::default();
        for (idx, line) in lines.into_iter().enumerate() {
            let line = line?;
            self.summary.total_lines += 1;
            self.dispatch(&mut state, idx + 1, &line);
        }
        Ok(())
    }

    fn dispatch(&mut self, state: &mut ParserState, line_no: usize, line: &str) {
        let line = line.trim();
        match classify(line, state.continuation_open()) {
            LineClass::Skip => {}
            LineClass::Continuation => {
                let Some(pending) = state.pending() else {
                    return;
                };
                match decode_continuation(pending.kind, line) {
                    Ok(ids) => {
                        self.stages.extend_pending(state, ids);
                    }
                    Err(err) => self.decode_failed(line_no, &err),
                }
            }
            LineClass::Orphan => {
                self.summary.orphan_continuations += 1;
                debug!(line = line_no, "continuation line without open command, skipped");
            }
            LineClass::Unrecognized(token) => {
                state.close_pending();
                self.summary.unrecognized_lines += 1;
                *self
                    .summary
                    .unrecognized_tokens
                    .entry(token.to_ascii_uppercase())
                    .or_insert(0) += 1;
            }
            LineClass::Record(keyword) => {
                state.close_pending();
                match decode(keyword, line) {
                    Ok(record) => {
                        *self.summary.record_counts.entry(keyword).or_insert(0) += 1;
                        self.apply(state, record);
                    }
                    Err(err) => self.decode_failed(line_no, &err),
                }
            }
        }
    }

    fn apply(&mut self, state: &mut ParserState, record: Record) {
        match record {
            Record::Stage(rec) => self.stages.open_stage(state, rec),
            Record::GroupCommand(rec) => {
                if self.stages.apply_command(state, rec) == CommandOutcome::Dropped {
                    self.summary.dropped_commands += 1;
                }
            }
            other => self.assembler.add(other),
        }
    }

    fn decode_failed(&mut self, line_no: usize, err: &DecodeError) {
        self.summary.decode_failures += 1;
        debug!(line = line_no, error = %err, "line skipped");
    }

    fn finish(self) -> ParsedFpn {
        let mut summary = self.summary;
        summary.duplicate_ids = self.assembler.duplicates();
        let model = self.assembler.finish(self.stages.into_stages());
        summary.record_model(&model);
        ParsedFpn { model, summary }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use fpn_inp::{CommandKind, Keyword, VolumeKind};

    use super::*;

    fn parse(raw: &str) -> ParsedFpn {
        parse_fpn_bytes(raw.as_bytes(), &ParseOptions::default()).expect("in-memory parse")
    }

    #[test]
    fn minimal_model_end_to_end() {
        let parsed = parse(
            "NODE ,1,0,0,0\nNODE ,2,1000000,0,0\nTETRA ,1,1,1,2,3,4\nSTAGE ,1,0,Stage1\nMADD ,1,1,1\n",
        );
        let model = &parsed.model;

        assert_eq!(model.nodes.len(), 2);
        assert_eq!(model.node(1).unwrap().coords, [0.0, 0.0, 0.0]);
        assert_eq!(model.node(2).unwrap().coords, [1_000_000.0, 0.0, 0.0]);

        let tetra = model.volumes.get(1).unwrap();
        assert_eq!(tetra.kind, VolumeKind::Tetra);
        assert_eq!(tetra.kind.as_str(), "tetra");
        assert_eq!(tetra.material, 1);

        assert_eq!(model.stages.len(), 1);
        let stage = model.stage(1).unwrap();
        assert_eq!(stage.name, "Stage1");
        assert_eq!(stage.active.materials, BTreeSet::from([1]));
    }

    #[test]
    fn malformed_element_line_is_skipped() {
        let parsed = parse(
            "NODE ,1,0,0,0\nTETRA ,abc,1,1,2,3,4\nTETRA ,2,1,1,2,3,4\n",
        );
        assert_eq!(parsed.model.volumes.len(), 1);
        assert_eq!(parsed.summary.decode_failures, 1);
        assert_eq!(parsed.summary.count(Keyword::Tetra), 1);
    }

    #[test]
    fn keyword_line_closes_continuation() {
        let parsed = parse(
            "\
STAGE ,1,0,Init
MADD  ,1,4,1,2
      ,3,4
MADD  ,1,1,10
$$ comment lines keep the cursor open
      ,11
LSET  ,1,Surcharge
      ,12
",
        );
        let stage = parsed.model.stage(1).unwrap();
        assert_eq!(stage.active.materials, BTreeSet::from([1, 2, 3, 4, 10, 11]));
        assert_eq!(stage.commands.len(), 4);
        assert_eq!(parsed.summary.orphan_continuations, 1);
    }

    #[test]
    fn all_group_commands_continue() {
        let parsed = parse("STAGE ,1,0,S\nLADD ,1,1,1\n ,2\nBADD ,1,1,5\n ,6\n");
        let stage = parsed.model.stage(1).unwrap();
        assert_eq!(stage.active.loads, BTreeSet::from([1, 2]));
        assert_eq!(stage.active.boundaries, BTreeSet::from([5, 6]));
    }

    #[test]
    fn commands_before_first_stage_are_counted_as_dropped() {
        let parsed = parse("MADD ,1,1,1\n ,2\nSTAGE ,1,0,S\n");
        assert_eq!(parsed.summary.dropped_commands, 1);
        assert_eq!(parsed.summary.orphan_continuations, 1);
        assert!(parsed.model.stage(1).unwrap().active.is_empty());
    }

    #[test]
    fn live_sets_equal_log_replay() {
        let parsed = parse(
            "\
STAGE ,1,0,S1
MADD ,1,3,1,2,3
MDEL ,1,1,2
 ,3
MADD ,1,1,3
STAGE ,2,0,S2
MDEL ,2,1,1
",
        );
        for stage in parsed.model.stages.iter() {
            assert_eq!(
                crate::stage::ActiveGroups::replay(&stage.commands),
                stage.active
            );
        }
        let s1 = parsed.model.stage(1).unwrap();
        assert_eq!(s1.active.materials, BTreeSet::from([1, 3]));
        assert_eq!(s1.commands[2].kind, CommandKind::DeleteMaterials);
        assert!(s1.commands[2].continuation);
        let as_of_2 = parsed.model.active_groups_as_of(2).unwrap();
        assert_eq!(as_of_2.materials, BTreeSet::from([3]));
    }

    #[test]
    fn header_records_are_counted_as_unrecognized() {
        let parsed = parse("VER, 2.0.0\nUNIT, KN,M,J,C\nNODE ,1,0,0,0\n");
        assert_eq!(parsed.summary.unrecognized_lines, 2);
        assert_eq!(parsed.summary.unrecognized_tokens.get("VER"), Some(&1));
        assert_eq!(parsed.summary.total_lines, 3);
    }

    #[test]
    fn utf8_bom_is_detected_and_stripped() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice(b"NODE ,1,5,5,5\n");
        let parsed = parse_fpn_bytes(&bytes, &ParseOptions::default()).unwrap();
        let encoding = parsed.summary.encoding.unwrap();
        assert_eq!(encoding.name, "UTF-8");
        assert_eq!(encoding.source, fpn_inp::DetectionSource::ByteOrderMark);
        assert_eq!(parsed.model.nodes.len(), 1);
    }
}
