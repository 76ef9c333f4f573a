//! Materials file: one property entry per emitted material partition.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use fpn_model::{FpnModel, Material};

use crate::error::{ProjectionError, Result};
use crate::output::ensure_parent_dir;
use crate::projection::{MaterialPartition, Projection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConstitutiveLaw {
    #[serde(rename = "LinearElastic3DLaw")]
    LinearElastic3D,
    #[serde(rename = "SmallStrainDplusDminusDamageModifiedMohrCoulombVonMises3D")]
    MohrCoulomb,
    #[serde(rename = "TrussConstitutiveLaw")]
    Truss,
    #[serde(rename = "LinearElasticPlaneStress2DLaw")]
    PlaneStress2D,
}

impl ConstitutiveLaw {
    /// Law for a partition: element family first, then strength parameters.
    pub fn select(part: &MaterialPartition, material: Option<&Material>) -> Self {
        if part.families.only_lines() {
            ConstitutiveLaw::Truss
        } else if part.families.only_plates() {
            ConstitutiveLaw::PlaneStress2D
        } else if material.is_some_and(Material::has_strength) {
            ConstitutiveLaw::MohrCoulomb
        } else {
            ConstitutiveLaw::LinearElastic3D
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MaterialsFile {
    pub properties: Vec<PropertyEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyEntry {
    pub model_part_name: String,
    pub properties_id: u32,
    #[serde(rename = "Material")]
    pub material: MaterialEntry,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaterialEntry {
    pub constitutive_law: LawName,
    #[serde(rename = "Variables")]
    pub variables: BTreeMap<&'static str, f64>,
    #[serde(rename = "Tables")]
    pub tables: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LawName {
    pub name: ConstitutiveLaw,
}

pub fn build_materials(
    model: &FpnModel,
    projection: &Projection,
    default_truss_area: f64,
) -> MaterialsFile {
    let properties = projection
        .materials
        .iter()
        .map(|part| {
            let material = model.material(part.material);
            if material.is_none() {
                warn!(material = part.material, "referenced material has no record");
            }
            let law = ConstitutiveLaw::select(part, material);

            let mut variables = BTreeMap::new();
            if let Some(m) = material {
                let present = [
                    ("DENSITY", m.density()),
                    ("YOUNG_MODULUS", m.elastic_modulus()),
                    ("POISSON_RATIO", m.poisson_ratio()),
                ];
                variables.extend(present.into_iter().filter_map(|(k, v)| Some((k, v?))));
                if law == ConstitutiveLaw::MohrCoulomb {
                    if let Some(phi) = m.friction_angle() {
                        variables.insert("FRICTION_ANGLE", phi);
                    }
                    if let Some(c) = m.cohesion() {
                        variables.insert("COHESION", c);
                    }
                }
            }
            match law {
                ConstitutiveLaw::Truss => {
                    variables.insert("CROSS_AREA", part.cross_area.unwrap_or(default_truss_area));
                }
                ConstitutiveLaw::PlaneStress2D => {
                    if let Some(t) = part.thickness {
                        variables.insert("THICKNESS", t);
                    }
                }
                _ => {}
            }

            PropertyEntry {
                model_part_name: projection.qualified(&part.name()),
                properties_id: part.material,
                material: MaterialEntry {
                    constitutive_law: LawName { name: law },
                    variables,
                    tables: BTreeMap::new(),
                },
            }
        })
        .collect();
    MaterialsFile { properties }
}

pub fn render_materials(file: &MaterialsFile) -> Result<String> {
    Ok(serde_json::to_string_pretty(file)?)
}

pub fn write_materials(
    path: impl AsRef<Path>,
    model: &FpnModel,
    projection: &Projection,
    default_truss_area: f64,
) -> Result<()> {
    let path = path.as_ref();
    let body = render_materials(&build_materials(model, projection, default_truss_area))?;
    ensure_parent_dir(path).map_err(|e| ProjectionError::io(path, e))?;
    fs::write(path, body).map_err(|e| ProjectionError::io(path, e))
}
