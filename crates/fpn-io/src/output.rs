use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use fpn_model::FpnModel;

use crate::error::{ProjectionError, Result};
use crate::materials::write_materials;
use crate::mdpa::write_mdpa;
use crate::process::write_constraint_processes;
use crate::projection::{Projection, ProjectionOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputBundle {
    pub mdpa_path: PathBuf,
    pub materials_path: PathBuf,
    pub constraints_path: PathBuf,
}

/// Write `<name>.mdpa`, `<name>_materials.json` and `<name>_constraints.json`
/// into `dir`.
pub fn write_output_bundle(
    dir: impl AsRef<Path>,
    name: &str,
    model: &FpnModel,
    projection: &Projection,
    options: &ProjectionOptions,
) -> Result<OutputBundle> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| ProjectionError::io(dir, e))?;

    let mdpa_path = dir.join(format!("{name}.mdpa"));
    let materials_path = dir.join(format!("{name}_materials.json"));
    let constraints_path = dir.join(format!("{name}_constraints.json"));

    write_mdpa(&mdpa_path, projection)?;
    write_materials(&materials_path, model, projection, options.default_truss_area)?;
    write_constraint_processes(&constraints_path, projection)?;

    info!(
        dir = %dir.display(),
        name,
        stage = ?projection.stage,
        elements = projection.element_count(),
        "wrote output bundle"
    );
    Ok(OutputBundle {
        mdpa_path,
        materials_path,
        constraints_path,
    })
}

pub(crate) fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
