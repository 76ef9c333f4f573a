//! Engineering model assembled from an FPN file.
//!
//! [`parse_fpn_file`] runs the three sequential passes (encoding probe,
//! coordinate-offset probe, main pass) and returns the [`FpnModel`] together
//! with a [`ParseSummary`]. Stage activation is available per stage and
//! replayed "as of" any stage through [`FpnModel::active_groups_as_of`].

pub mod assembler;
pub mod collection;
pub mod entities;
pub mod material;
pub mod model;
pub mod parse;
pub mod stage;
pub mod summary;

pub use assembler::ModelAssembler;
pub use collection::Ordered;
pub use entities::{
    BoundaryGroup, Constraint, ElementRef, LineElement, LoadGroup, MeshSet, Node, PlateElement,
    PlateKind, Prestress, ShellProperty, TrussSection, VolumeElement,
};
pub use material::{
    DEFAULT_TYPE_TAG, Material, MaterialKey, MaterialPatch, MaterialSource, MaterialValue,
};
pub use model::FpnModel;
pub use parse::{ParsedFpn, parse_fpn_bytes, parse_fpn_file};
pub use stage::{
    ActiveGroups, AnalysisStage, CommandOutcome, GroupCommand, ParserState, PendingCommand,
    StageAccumulator,
};
pub use summary::{EncodingSummary, ParseSummary};

pub use fpn_inp::{Id, ParseOptions};
