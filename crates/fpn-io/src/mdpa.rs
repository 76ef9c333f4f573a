//! MDPA writer: nodes, element blocks, elemental prestress and sub-model parts.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use fpn_inp::Id;

use crate::error::{ProjectionError, Result};
use crate::output::ensure_parent_dir;
use crate::projection::Projection;

/// Variable name carrying the initial truss stress.
pub const PRESTRESS_VARIABLE: &str = "TRUSS_PRESTRESS_PK2";

pub fn render_mdpa(projection: &Projection) -> Result<String> {
    let mut out = String::new();
    write_blocks(&mut out, projection)?;
    Ok(out)
}

pub fn write_mdpa(path: impl AsRef<Path>, projection: &Projection) -> Result<()> {
    let path = path.as_ref();
    let body = render_mdpa(projection)?;
    ensure_parent_dir(path).map_err(|e| ProjectionError::io(path, e))?;
    fs::write(path, body).map_err(|e| ProjectionError::io(path, e))
}

fn write_blocks<W: std::fmt::Write>(out: &mut W, p: &Projection) -> std::fmt::Result {
    writeln!(out, "Begin ModelPartData")?;
    writeln!(out, "End ModelPartData")?;
    writeln!(out)?;

    for part in &p.materials {
        writeln!(out, "Begin Properties {}", part.material)?;
        writeln!(out, "End Properties")?;
        writeln!(out)?;
    }

    writeln!(out, "Begin Nodes")?;
    for node in &p.nodes {
        let [x, y, z] = node.coords;
        writeln!(out, "{} {x} {y} {z}", node.id)?;
    }
    writeln!(out, "End Nodes")?;
    writeln!(out)?;

    for block in &p.element_blocks {
        writeln!(out, "Begin Elements {}", block.target.name())?;
        for e in &block.elements {
            write!(out, "{} {}", e.id, e.property)?;
            for n in &e.nodes {
                write!(out, " {n}")?;
            }
            writeln!(out)?;
        }
        writeln!(out, "End Elements")?;
        writeln!(out)?;
    }

    if !p.prestress.is_empty() {
        writeln!(out, "Begin ElementalData {PRESTRESS_VARIABLE}")?;
        for item in &p.prestress {
            writeln!(out, "{} {}", item.element, item.stress)?;
        }
        writeln!(out, "End ElementalData")?;
        writeln!(out)?;
    }

    for part in &p.materials {
        sub_model_part(out, &part.name(), part.nodes.iter(), Some(&part.elements))?;
    }

    for bnd in &p.boundaries {
        sub_model_part(out, &bnd.part_name(), bnd.nodes.iter(), None)?;
        for code in &bnd.codes {
            sub_model_part(out, &bnd.code_part_name(&code.code), code.nodes.iter(), None)?;
        }
    }

    Ok(())
}

fn sub_model_part<'a, W: std::fmt::Write>(
    out: &mut W,
    name: &str,
    nodes: impl Iterator<Item = &'a Id>,
    elements: Option<&[Id]>,
) -> std::fmt::Result {
    writeln!(out, "Begin SubModelPart {name}")?;
    writeln!(out, "  Begin SubModelPartNodes")?;
    for n in nodes {
        writeln!(out, "  {n}")?;
    }
    writeln!(out, "  End SubModelPartNodes")?;
    if let Some(elements) = elements {
        writeln!(out, "  Begin SubModelPartElements")?;
        for e in elements {
            writeln!(out, "  {e}")?;
        }
        writeln!(out, "  End SubModelPartElements")?;
    }
    writeln!(out, "End SubModelPart")?;
    writeln!(out)
}
