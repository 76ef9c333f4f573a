//! Projection of an assembled FPN model into Kratos solver input.
//!
//! [`project`] scopes the model to the activation as of an optional stage and
//! groups it into element blocks and sub-model partitions. The writers turn a
//! [`Projection`] into the three files of an [`OutputBundle`]:
//! - `<name>.mdpa`: nodes, element blocks, prestress data and sub-model parts
//! - `<name>_materials.json`: one property entry per material partition
//! - `<name>_constraints.json`: displacement and rotation constraint processes

pub mod error;
pub mod materials;
pub mod mdpa;
mod output;
pub mod process;
pub mod projection;
pub mod taxonomy;

pub use error::{ProjectionError, Result};
pub use materials::{
    ConstitutiveLaw, MaterialsFile, build_materials, render_materials, write_materials,
};
pub use mdpa::{PRESTRESS_VARIABLE, render_mdpa, write_mdpa};
pub use output::{OutputBundle, write_output_bundle};
pub use process::{
    ConstraintProcesses, build_constraint_processes, constraint_processes_value,
    processes_for_code, render_constraint_processes, write_constraint_processes,
};
pub use projection::{
    BOTTOM_PART, BoundaryPartition, CodePartition, DEFAULT_TRUSS_AREA, ElementBlock, ElementPrestress,
    Families, MaterialPartition, ProjectedElement, ProjectedNode, Projection, ProjectionOptions,
    project,
};
pub use taxonomy::{SourceKind, TargetElement, target_element};
