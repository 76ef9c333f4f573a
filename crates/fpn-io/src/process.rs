//! Constraint processes for the boundary code partitions.
//!
//! Each `BND_<gid>_C<code>` partition gets a `DISPLACEMENT` process from the
//! first three flags and, when any rotation is fixed, a `ROTATION` process from
//! the last three. Constrained components carry `0.0`, free ones `null`.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use fpn_inp::DofCode;

use crate::error::{ProjectionError, Result};
use crate::output::ensure_parent_dir;
use crate::projection::Projection;

pub const PROCESS_NAME: &str = "AssignVectorVariableProcess";

#[derive(Debug, Clone, Serialize)]
pub struct ConstraintProcesses {
    pub constraints_process_list: Vec<ProcessEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessEntry {
    pub python_module: &'static str,
    pub kratos_module: &'static str,
    pub process_name: &'static str,
    #[serde(rename = "Parameters")]
    pub parameters: ProcessParameters,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessParameters {
    pub model_part_name: String,
    pub variable_name: &'static str,
    pub constrained: [bool; 3],
    pub value: [Option<f64>; 3],
    /// Always `[0.0, "End"]`.
    pub interval: (f64, &'static str),
}

impl ProcessEntry {
    fn assign(model_part_name: String, variable_name: &'static str, flags: [bool; 3]) -> Self {
        Self {
            python_module: "assign_vector_variable_process",
            kratos_module: "KratosMultiphysics",
            process_name: PROCESS_NAME,
            parameters: ProcessParameters {
                model_part_name,
                variable_name,
                constrained: flags,
                value: flags.map(|fixed| fixed.then_some(0.0)),
                interval: (0.0, "End"),
            },
        }
    }
}

/// Processes for one code partition, displacement first.
pub fn processes_for_code(model_part_name: &str, code: &DofCode) -> Vec<ProcessEntry> {
    let mut out = vec![ProcessEntry::assign(
        model_part_name.to_string(),
        "DISPLACEMENT",
        code.translations(),
    )];
    if code.any_rotation() {
        out.push(ProcessEntry::assign(
            model_part_name.to_string(),
            "ROTATION",
            code.rotations(),
        ));
    }
    out
}

pub fn build_constraint_processes(projection: &Projection) -> ConstraintProcesses {
    let constraints_process_list = projection
        .boundaries
        .iter()
        .flat_map(|bnd| {
            bnd.codes.iter().flat_map(move |c| {
                let part = projection.qualified(&bnd.code_part_name(&c.code));
                processes_for_code(&part, &c.code)
            })
        })
        .collect();
    ConstraintProcesses {
        constraints_process_list,
    }
}

pub fn render_constraint_processes(processes: &ConstraintProcesses) -> Result<String> {
    Ok(serde_json::to_string_pretty(processes)?)
}

/// Same document as [`render_constraint_processes`], as a JSON value.
pub fn constraint_processes_value(projection: &Projection) -> Result<Value> {
    Ok(serde_json::to_value(build_constraint_processes(projection))?)
}

pub fn write_constraint_processes(path: impl AsRef<Path>, projection: &Projection) -> Result<()> {
    let path = path.as_ref();
    let body = render_constraint_processes(&build_constraint_processes(projection))?;
    ensure_parent_dir(path).map_err(|e| ProjectionError::io(path, e))?;
    fs::write(path, body).map_err(|e| ProjectionError::io(path, e))
}
