//! Canonical materials merged from `MISO`, `MATGEN`, `MATPORO` and `MNLMC`.
//!
//! Each sub-record kind owns a disjoint set of property keys. Merging a patch
//! only fills keys the patch's source owns and that are still unset, so the
//! order in which sub-records appear never changes the result.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt::{Display, Formatter};

use serde::Serialize;
use tracing::warn;

use fpn_inp::{Id, Keyword, MatgenRecord, MatporoRecord, MisoRecord, MnlmcRecord};

/// Type tag reported for materials no `MISO` record has tagged.
pub const DEFAULT_TYPE_TAG: &str = "soil";

/// Sub-record kinds that contribute to a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MaterialSource {
    Miso,
    Matgen,
    Matporo,
    Mnlmc,
}

impl MaterialSource {
    pub fn keyword(self) -> Keyword {
        match self {
            MaterialSource::Miso => Keyword::Miso,
            MaterialSource::Matgen => Keyword::Matgen,
            MaterialSource::Matporo => Keyword::Matporo,
            MaterialSource::Mnlmc => Keyword::Mnlmc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialKey {
    Name,
    TypeTag,
    ElasticModulus,
    PoissonRatio,
    Density,
    Permeability,
    Porosity,
    FrictionAngle,
    Cohesion,
}

impl MaterialKey {
    pub fn owner(self) -> MaterialSource {
        match self {
            MaterialKey::Name | MaterialKey::TypeTag => MaterialSource::Miso,
            MaterialKey::ElasticModulus | MaterialKey::PoissonRatio | MaterialKey::Density => {
                MaterialSource::Matgen
            }
            MaterialKey::Permeability | MaterialKey::Porosity => MaterialSource::Matporo,
            MaterialKey::FrictionAngle | MaterialKey::Cohesion => MaterialSource::Mnlmc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MaterialValue {
    Text(String),
    Number(f64),
}

impl Display for MaterialValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MaterialValue::Text(s) => f.write_str(s),
            MaterialValue::Number(v) => write!(f, "{v}"),
        }
    }
}

/// Values carried by one material sub-record.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialPatch {
    pub id: Id,
    pub source: MaterialSource,
    values: Vec<(MaterialKey, MaterialValue)>,
}

impl MaterialPatch {
    pub fn new(id: Id, source: MaterialSource) -> Self {
        Self {
            id,
            source,
            values: Vec::new(),
        }
    }

    fn text(mut self, key: MaterialKey, value: Option<String>) -> Self {
        if let Some(value) = value {
            self.values.push((key, MaterialValue::Text(value)));
        }
        self
    }

    fn number(mut self, key: MaterialKey, value: Option<f64>) -> Self {
        if let Some(value) = value {
            self.values.push((key, MaterialValue::Number(value)));
        }
        self
    }

    pub fn values(&self) -> &[(MaterialKey, MaterialValue)] {
        &self.values
    }
}

impl From<MisoRecord> for MaterialPatch {
    fn from(rec: MisoRecord) -> Self {
        MaterialPatch::new(rec.id, MaterialSource::Miso)
            .text(MaterialKey::Name, rec.name)
            .text(MaterialKey::TypeTag, rec.type_tag)
    }
}

impl From<MatgenRecord> for MaterialPatch {
    fn from(rec: MatgenRecord) -> Self {
        MaterialPatch::new(rec.id, MaterialSource::Matgen)
            .number(MaterialKey::ElasticModulus, rec.elastic_modulus)
            .number(MaterialKey::PoissonRatio, rec.poisson_ratio)
            .number(MaterialKey::Density, rec.density)
    }
}

impl From<MatporoRecord> for MaterialPatch {
    fn from(rec: MatporoRecord) -> Self {
        MaterialPatch::new(rec.id, MaterialSource::Matporo)
            .number(MaterialKey::Permeability, rec.permeability)
            .number(MaterialKey::Porosity, rec.porosity)
    }
}

impl From<MnlmcRecord> for MaterialPatch {
    fn from(rec: MnlmcRecord) -> Self {
        MaterialPatch::new(rec.id, MaterialSource::Mnlmc)
            .number(MaterialKey::FrictionAngle, rec.friction_angle)
            .number(MaterialKey::Cohesion, rec.cohesion)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub id: Id,
    pub properties: BTreeMap<MaterialKey, MaterialValue>,
}

impl Material {
    pub fn new(id: Id) -> Self {
        Self {
            id,
            properties: BTreeMap::new(),
        }
    }

    /// Fill the keys `patch` owns that are not set yet.
    ///
    /// Returns how many keys were filled. Keys owned by another sub-record
    /// kind are rejected.
    pub fn merge(&mut self, patch: MaterialPatch) -> usize {
        let mut filled = 0;
        for (key, value) in patch.values {
            if key.owner() != patch.source {
                warn!(
                    material = self.id,
                    key = ?key,
                    source = ?patch.source,
                    "material key not owned by its sub-record, ignored"
                );
                continue;
            }
            if let Entry::Vacant(slot) = self.properties.entry(key) {
                slot.insert(value);
                filled += 1;
            }
        }
        filled
    }

    pub fn name(&self) -> Option<&str> {
        self.text(MaterialKey::Name)
    }

    pub fn display_name(&self) -> String {
        self.name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Material_{}", self.id))
    }

    pub fn type_tag(&self) -> &str {
        self.text(MaterialKey::TypeTag).unwrap_or(DEFAULT_TYPE_TAG)
    }

    pub fn number(&self, key: MaterialKey) -> Option<f64> {
        match self.properties.get(&key) {
            Some(MaterialValue::Number(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn text(&self, key: MaterialKey) -> Option<&str> {
        match self.properties.get(&key) {
            Some(MaterialValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn elastic_modulus(&self) -> Option<f64> {
        self.number(MaterialKey::ElasticModulus)
    }

    pub fn poisson_ratio(&self) -> Option<f64> {
        self.number(MaterialKey::PoissonRatio)
    }

    pub fn density(&self) -> Option<f64> {
        self.number(MaterialKey::Density)
    }

    pub fn friction_angle(&self) -> Option<f64> {
        self.number(MaterialKey::FrictionAngle)
    }

    pub fn cohesion(&self) -> Option<f64> {
        self.number(MaterialKey::Cohesion)
    }

    pub fn porosity(&self) -> Option<f64> {
        self.number(MaterialKey::Porosity)
    }

    pub fn permeability(&self) -> Option<f64> {
        self.number(MaterialKey::Permeability)
    }

    /// Friction angle or cohesion is strictly positive.
    pub fn has_strength(&self) -> bool {
        self.friction_angle().is_some_and(|phi| phi > 0.0)
            || self.cohesion().is_some_and(|c| c > 0.0)
    }
}
