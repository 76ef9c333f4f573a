//! Projection of an assembled model, optionally scoped to one stage.
//!
//! With a stage selected, activation is replayed as of that stage: an element
//! is emitted when its material is active, a boundary group when it is
//! active, a prestress when its load group is active.
//!
//! When no emitted boundary partition carries a constraint code, the nodes at
//! the lowest elevation are fixed in translation as `BND_BOTTOM` so the model
//! is not free to move as a rigid body.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use fpn_inp::{DofCode, Id};
use fpn_model::{ActiveGroups, ElementRef, FpnModel};

use crate::error::{ProjectionError, Result};
use crate::taxonomy::{SourceKind, TargetElement, target_element};

/// Cross-section area used for trusses whose section gives none [m²].
pub const DEFAULT_TRUSS_AREA: f64 = 1.0e-3;

/// Partition name of the bottom fixity fallback.
pub const BOTTOM_PART: &str = "BOTTOM";

/// Relative elevation band of the bottom fixity fallback.
pub const BOTTOM_RELATIVE_TOLERANCE: f64 = 0.01;

/// Elevation band used when the lowest node sits exactly at zero.
pub const BOTTOM_ZERO_TOLERANCE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionOptions {
    /// Root model part the partitions hang under.
    pub model_part_name: String,
    /// Emit only nodes referenced by emitted elements.
    pub only_referenced_nodes: bool,
    pub default_truss_area: f64,
    /// Fix the lowest nodes when no emitted boundary carries a constraint.
    pub bottom_fixity: bool,
    /// Elevation band for the bottom nodes; `None` takes 1% of the lowest
    /// elevation, or [`BOTTOM_ZERO_TOLERANCE`] when that is zero.
    pub bottom_tolerance: Option<f64>,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            model_part_name: "Structure".to_string(),
            only_referenced_nodes: true,
            default_truss_area: DEFAULT_TRUSS_AREA,
            bottom_fixity: true,
            bottom_tolerance: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedNode {
    pub id: Id,
    pub coords: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectedElement {
    pub id: Id,
    /// Properties id, equal to the resolved material id.
    pub property: Id,
    pub nodes: Vec<Id>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementBlock {
    pub target: TargetElement,
    pub elements: Vec<ProjectedElement>,
}

/// Which element families reference a material.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Families {
    pub volume: bool,
    pub plate: bool,
    pub line: bool,
}

impl Families {
    pub fn only_lines(&self) -> bool {
        self.line && !self.volume && !self.plate
    }

    pub fn only_plates(&self) -> bool {
        self.plate && !self.volume && !self.line
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialPartition {
    pub material: Id,
    pub nodes: BTreeSet<Id>,
    pub elements: Vec<Id>,
    pub families: Families,
    /// First positive truss area among the partition's line sections.
    pub cross_area: Option<f64>,
    /// First positive shell thickness among the partition's plate sections.
    pub thickness: Option<f64>,
}

impl MaterialPartition {
    fn new(material: Id) -> Self {
        Self {
            material,
            nodes: BTreeSet::new(),
            elements: Vec::new(),
            families: Families::default(),
            cross_area: None,
            thickness: None,
        }
    }

    pub fn name(&self) -> String {
        format!("MAT_{}", self.material)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodePartition {
    pub code: DofCode,
    pub nodes: BTreeSet<Id>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundaryPartition {
    /// Source boundary group; `None` for the bottom fixity fallback.
    pub group: Option<Id>,
    pub name: String,
    pub nodes: Vec<Id>,
    /// One partition per distinct constraint code, in code order.
    pub codes: Vec<CodePartition>,
}

impl BoundaryPartition {
    fn key(&self) -> String {
        match self.group {
            Some(id) => id.to_string(),
            None => BOTTOM_PART.to_string(),
        }
    }

    pub fn part_name(&self) -> String {
        format!("BND_{}", self.key())
    }

    pub fn code_part_name(&self, code: &DofCode) -> String {
        format!("BND_{}_C{}", self.key(), code.as_code())
    }

    pub fn is_bottom_fixity(&self) -> bool {
        self.group.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementPrestress {
    pub element: Id,
    /// Axial force over cross-section area.
    pub stress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub model_part_name: String,
    pub stage: Option<Id>,
    pub nodes: Vec<ProjectedNode>,
    /// Non-empty blocks in [`TargetElement::ALL`] order.
    pub element_blocks: Vec<ElementBlock>,
    /// Sorted by material id.
    pub materials: Vec<MaterialPartition>,
    pub boundaries: Vec<BoundaryPartition>,
    pub prestress: Vec<ElementPrestress>,
    /// Element node references with no matching node.
    pub dangling_node_refs: usize,
    /// Elements left out because they reference undefined nodes.
    pub dropped_elements: Vec<Id>,
}

impl Projection {
    pub fn element_count(&self) -> usize {
        self.element_blocks.iter().map(|b| b.elements.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.element_count() == 0
    }

    pub fn qualified(&self, part: &str) -> String {
        format!("{}.{part}", self.model_part_name)
    }
}

/// Project `model`, scoped to the activation as of `stage` when given.
pub fn project(
    model: &FpnModel,
    stage: Option<Id>,
    options: &ProjectionOptions,
) -> Result<Projection> {
    let active = stage
        .map(|id| {
            model
                .active_groups_as_of(id)
                .ok_or(ProjectionError::UnknownStage(id))
        })
        .transpose()?;

    let mut blocks: Vec<Vec<ProjectedElement>> = vec![Vec::new(); TargetElement::ALL.len()];
    let mut partitions: BTreeMap<Id, MaterialPartition> = BTreeMap::new();
    let mut referenced: HashSet<Id> = HashSet::new();
    let mut emitted_lines: HashSet<Id> = HashSet::new();
    let mut dangling_node_refs = 0usize;
    let mut dropped_elements: Vec<Id> = Vec::new();

    for element in model.elements() {
        let material = model.material_for_element(element);
        if let Some(active) = &active
            && !active.materials.contains(&material)
        {
            continue;
        }

        let missing = element
            .nodes()
            .iter()
            .filter(|&&n| model.node(n).is_none())
            .count();
        if missing > 0 {
            debug!(element = element.id(), missing, "element references undefined nodes, dropped");
            dangling_node_refs += missing;
            dropped_elements.push(element.id());
            continue;
        }
        referenced.extend(element.nodes().iter().copied());

        let target = target_element(SourceKind::of(element));
        blocks[target.position()].push(ProjectedElement {
            id: element.id(),
            property: material,
            nodes: element.nodes().to_vec(),
        });

        let part = partitions
            .entry(material)
            .or_insert_with(|| MaterialPartition::new(material));
        part.elements.push(element.id());
        part.nodes.extend(element.nodes().iter().copied());
        match element {
            ElementRef::Volume(_) => part.families.volume = true,
            ElementRef::Plate(e) => {
                part.families.plate = true;
                if part.thickness.is_none() {
                    part.thickness = model
                        .shells
                        .get(e.property)
                        .and_then(|s| s.thickness)
                        .filter(|t| *t > 0.0);
                }
            }
            ElementRef::Line(e) => {
                part.families.line = true;
                emitted_lines.insert(e.id);
                if part.cross_area.is_none() {
                    part.cross_area = model
                        .trusses
                        .get(e.property)
                        .and_then(|s| s.area)
                        .filter(|a| *a > 0.0);
                }
            }
        }
    }

    if !dropped_elements.is_empty() {
        warn!(
            elements = dropped_elements.len(),
            refs = dangling_node_refs,
            "dropped elements referencing undefined nodes"
        );
    }

    let nodes: Vec<ProjectedNode> = model
        .nodes
        .iter()
        .filter(|n| !options.only_referenced_nodes || referenced.contains(&n.id))
        .map(|n| ProjectedNode {
            id: n.id,
            coords: n.coords,
        })
        .collect();
    let emitted_nodes: HashSet<Id> = nodes.iter().map(|n| n.id).collect();

    let element_blocks: Vec<ElementBlock> = TargetElement::ALL
        .iter()
        .zip(blocks)
        .filter(|(_, elements)| !elements.is_empty())
        .map(|(&target, elements)| ElementBlock { target, elements })
        .collect();

    let mut boundaries = project_boundaries(model, active.as_ref(), &emitted_nodes);
    if options.bottom_fixity
        && boundaries.iter().all(|b| b.codes.is_empty())
        && let Some(bottom) = bottom_fixity(&nodes, options.bottom_tolerance)
    {
        debug!(nodes = bottom.nodes.len(), "no active constraints, fixing bottom nodes");
        boundaries.push(bottom);
    }
    let prestress = project_prestress(model, active.as_ref(), &emitted_lines, options);

    let projection = Projection {
        model_part_name: options.model_part_name.clone(),
        stage,
        nodes,
        element_blocks,
        materials: partitions.into_values().collect(),
        boundaries,
        prestress,
        dangling_node_refs,
        dropped_elements,
    };
    if projection.is_empty() {
        warn!(stage = ?stage, "projection has no elements");
    }
    debug!(
        stage = ?stage,
        nodes = projection.nodes.len(),
        elements = projection.element_count(),
        materials = projection.materials.len(),
        boundaries = projection.boundaries.len(),
        "projected model"
    );
    Ok(projection)
}

fn project_boundaries(
    model: &FpnModel,
    active: Option<&ActiveGroups>,
    emitted_nodes: &HashSet<Id>,
) -> Vec<BoundaryPartition> {
    model
        .boundary_groups
        .iter()
        .filter(|g| active.is_none_or(|a| a.boundaries.contains(&g.id)))
        .filter_map(|group| {
            let nodes: BTreeSet<Id> = group
                .nodes
                .iter()
                .copied()
                .filter(|n| emitted_nodes.contains(n))
                .collect();
            if nodes.is_empty() {
                debug!(group = group.id, "boundary group has no emitted nodes, skipped");
                return None;
            }

            let mut by_code: BTreeMap<String, CodePartition> = BTreeMap::new();
            for c in group
                .constraints
                .iter()
                .filter(|c| emitted_nodes.contains(&c.node))
            {
                by_code
                    .entry(c.code.as_code())
                    .or_insert_with(|| CodePartition {
                        code: c.code,
                        nodes: BTreeSet::new(),
                    })
                    .nodes
                    .insert(c.node);
            }

            Some(BoundaryPartition {
                group: Some(group.id),
                name: group.name.clone(),
                nodes: nodes.into_iter().collect(),
                codes: by_code.into_values().collect(),
            })
        })
        .collect()
}

/// Translation fixity on the nodes within `tolerance` of the lowest elevation.
fn bottom_fixity(nodes: &[ProjectedNode], tolerance: Option<f64>) -> Option<BoundaryPartition> {
    let z_min = nodes.iter().map(|n| n.coords[2]).reduce(f64::min)?;
    let tolerance = tolerance.unwrap_or(if z_min == 0.0 {
        BOTTOM_ZERO_TOLERANCE
    } else {
        z_min.abs() * BOTTOM_RELATIVE_TOLERANCE
    });
    let bottom: BTreeSet<Id> = nodes
        .iter()
        .filter(|n| (n.coords[2] - z_min).abs() <= tolerance)
        .map(|n| n.id)
        .collect();
    Some(BoundaryPartition {
        group: None,
        name: BOTTOM_PART.to_string(),
        nodes: bottom.iter().copied().collect(),
        codes: vec![CodePartition {
            code: DofCode::new([true, true, true, false, false, false]),
            nodes: bottom,
        }],
    })
}

fn project_prestress(
    model: &FpnModel,
    active: Option<&ActiveGroups>,
    emitted_lines: &HashSet<Id>,
    options: &ProjectionOptions,
) -> Vec<ElementPrestress> {
    model
        .prestresses
        .iter()
        .filter(|p| active.is_none_or(|a| a.loads.contains(&p.load_group)))
        .filter_map(|p| {
            if !emitted_lines.contains(&p.element) {
                debug!(element = p.element, "prestress on element not emitted as line");
                return None;
            }
            let area = model
                .lines
                .get(p.element)
                .and_then(|e| model.trusses.get(e.property))
                .and_then(|s| s.area)
                .filter(|a| *a > 0.0)
                .unwrap_or(options.default_truss_area);
            Some(ElementPrestress {
                element: p.element,
                stress: p.force / area,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use fpn_model::{ParseOptions, parse_fpn_bytes};

    use super::*;

    const TWO_STAGES: &str = "\
NODE ,1,0,0,0
NODE ,2,1,0,0
NODE ,3,0,1,0
NODE ,4,0,0,1
NODE ,5,1,1,1
NODE ,6,2,2,2
TETRA ,1,1,1,2,3,4
TETRA ,2,2,2,3,4,5
LINE ,3,9,4,5
PETRUSS ,9,Anchor,1,7,0.002
CONST ,1,1,111000
CONST ,1,6,111000
CONST ,1,2,110000
PSTRST ,3,3,100.
STAGE ,1,0,Init
MADD ,1,1,1
BADD ,1,1,1
STAGE ,2,0,Dig
MADD ,2,2,2,7
LADD ,2,1,3
";

    fn model() -> FpnModel {
        parse_fpn_bytes(TWO_STAGES.as_bytes(), &ParseOptions::default())
            .expect("parse")
            .model
    }

    #[test]
    fn whole_model_without_stage() {
        let p = project(&model(), None, &ProjectionOptions::default()).unwrap();
        assert_eq!(p.element_count(), 3);
        let names: Vec<_> = p.element_blocks.iter().map(|b| b.target.name()).collect();
        assert_eq!(names, vec!["SmallDisplacementElement3D4N", "TrussElement3D2N"]);
        // node 6 is not referenced by any element
        assert_eq!(p.nodes.len(), 5);
        let ids: Vec<_> = p.materials.iter().map(|m| m.material).collect();
        assert_eq!(ids, vec![1, 2, 7]);
        assert_eq!(p.prestress.len(), 1);
        assert_eq!(p.prestress[0].stress, 100.0 / 0.002);
    }

    #[test]
    fn stage_scopes_elements_and_groups() {
        let model = model();
        let first = project(&model, Some(1), &ProjectionOptions::default()).unwrap();
        assert_eq!(first.element_count(), 1);
        assert_eq!(first.materials.len(), 1);
        assert!(first.prestress.is_empty());

        let bnd = &first.boundaries[0];
        assert_eq!(bnd.part_name(), "BND_1");
        assert_eq!(bnd.nodes, vec![1, 2]);
        let codes: Vec<_> = bnd.codes.iter().map(|c| bnd.code_part_name(&c.code)).collect();
        assert_eq!(codes, vec!["BND_1_C110000", "BND_1_C111000"]);

        let second = project(&model, Some(2), &ProjectionOptions::default()).unwrap();
        assert_eq!(second.element_count(), 3);
        assert_eq!(second.prestress.len(), 1);
        let truss = second.materials.iter().find(|m| m.material == 7).unwrap();
        assert!(truss.families.only_lines());
        assert_eq!(truss.cross_area, Some(0.002));
        assert_eq!(truss.nodes, BTreeSet::from([4, 5]));
    }

    #[test]
    fn unknown_stage_is_an_error() {
        let err = project(&model(), Some(42), &ProjectionOptions::default()).unwrap_err();
        assert!(matches!(err, ProjectionError::UnknownStage(42)));
    }

    #[test]
    fn empty_stage_projects_to_empty_output() {
        let parsed = parse_fpn_bytes(
            b"NODE ,1,0,0,0\nSTAGE ,1,0,Empty\n",
            &ParseOptions::default(),
        )
        .unwrap();
        let p = project(&parsed.model, Some(1), &ProjectionOptions::default()).unwrap();
        assert!(p.is_empty());
        assert!(p.nodes.is_empty());
        assert!(p.materials.is_empty());
    }

    #[test]
    fn all_nodes_kept_when_requested() {
        let options = ProjectionOptions {
            only_referenced_nodes: false,
            ..ProjectionOptions::default()
        };
        let p = project(&model(), None, &options).unwrap();
        assert_eq!(p.nodes.len(), 6);
        assert_eq!(p.boundaries[0].nodes, vec![1, 2, 6]);
    }

    const UNCONSTRAINED: &str = "\
NODE ,1,0,0,-20
NODE ,2,1,0,-20.1
NODE ,3,0,1,-19
NODE ,4,0,0,0
NODE ,5,0,0,-30
TETRA ,1,1,1,2,3,4
CONST ,3,5,111000
STAGE ,1,0,Init
MADD ,1,1,1
BADD ,1,1,3
";

    #[test]
    fn unconstrained_stage_fixes_bottom_nodes() {
        let parsed = parse_fpn_bytes(UNCONSTRAINED.as_bytes(), &ParseOptions::default()).unwrap();
        let p = project(&parsed.model, Some(1), &ProjectionOptions::default()).unwrap();
        // group 3 only constrains node 5, which no emitted element references
        assert_eq!(p.boundaries.len(), 1);
        let bottom = &p.boundaries[0];
        assert!(bottom.is_bottom_fixity());
        assert_eq!(bottom.part_name(), "BND_BOTTOM");
        assert_eq!(bottom.nodes, vec![1, 2]);
        assert_eq!(bottom.codes.len(), 1);
        assert_eq!(bottom.code_part_name(&bottom.codes[0].code), "BND_BOTTOM_C111000");
        assert_eq!(bottom.codes[0].nodes, BTreeSet::from([1, 2]));
    }

    #[test]
    fn bottom_fixity_respects_options() {
        let parsed = parse_fpn_bytes(UNCONSTRAINED.as_bytes(), &ParseOptions::default()).unwrap();
        let wide = ProjectionOptions {
            bottom_tolerance: Some(1.5),
            ..ProjectionOptions::default()
        };
        let p = project(&parsed.model, Some(1), &wide).unwrap();
        assert_eq!(p.boundaries[0].nodes, vec![1, 2, 3]);

        let off = ProjectionOptions {
            bottom_fixity: false,
            ..ProjectionOptions::default()
        };
        let p = project(&parsed.model, Some(1), &off).unwrap();
        assert!(p.boundaries.is_empty());
    }

    #[test]
    fn active_constraints_suppress_bottom_fixity() {
        let p = project(&model(), Some(1), &ProjectionOptions::default()).unwrap();
        assert!(p.boundaries.iter().all(|b| !b.is_bottom_fixity()));
    }

    #[test]
    fn elements_with_undefined_nodes_are_dropped() {
        let parsed = parse_fpn_bytes(
            b"NODE ,1,0,0,0\nNODE ,2,1,0,0\nTETRA ,1,1,1,2,3,4\nLINE ,2,2,1,2\n",
            &ParseOptions::default(),
        )
        .unwrap();
        let p = project(&parsed.model, None, &ProjectionOptions::default()).unwrap();
        assert_eq!(p.dangling_node_refs, 2);
        assert_eq!(p.dropped_elements, vec![1]);
        assert_eq!(p.element_count(), 1);
        assert_eq!(p.element_blocks[0].elements[0].id, 2);
        let ids: Vec<_> = p.materials.iter().map(|m| m.material).collect();
        assert_eq!(ids, vec![2]);
        assert_eq!(p.nodes.len(), 2);
    }
}
