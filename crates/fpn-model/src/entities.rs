//! Mesh and group entities of an assembled FPN model.

use serde::Serialize;

use fpn_inp::{DofCode, Id, VolumeKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: Id,
    /// Offset-adjusted coordinates.
    pub coords: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeElement {
    pub id: Id,
    pub kind: VolumeKind,
    pub material: Id,
    pub nodes: Vec<Id>,
}

/// Two-node reinforcement member (anchor, strut, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineElement {
    pub id: Id,
    pub property: Id,
    pub nodes: [Id; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlateKind {
    Triangle,
    Quad,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlateElement {
    pub id: Id,
    pub property: Id,
    pub nodes: Vec<Id>,
}

impl PlateElement {
    pub fn kind(&self) -> PlateKind {
        if self.nodes.len() == 3 {
            PlateKind::Triangle
        } else {
            PlateKind::Quad
        }
    }
}

/// Any element, borrowed from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRef<'a> {
    Volume(&'a VolumeElement),
    Line(&'a LineElement),
    Plate(&'a PlateElement),
}

impl ElementRef<'_> {
    pub fn id(&self) -> Id {
        match self {
            ElementRef::Volume(e) => e.id,
            ElementRef::Line(e) => e.id,
            ElementRef::Plate(e) => e.id,
        }
    }

    pub fn nodes(&self) -> &[Id] {
        match self {
            ElementRef::Volume(e) => &e.nodes,
            ElementRef::Line(e) => &e.nodes,
            ElementRef::Plate(e) => &e.nodes,
        }
    }
}

/// `PSHELL` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShellProperty {
    pub id: Id,
    pub name: String,
    pub material: Option<Id>,
    pub thickness: Option<f64>,
}

/// `PETRUSS` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrussSection {
    pub id: Id,
    pub name: String,
    pub material: Option<Id>,
    pub area: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeshSet {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadGroup {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constraint {
    pub group: Id,
    pub node: Id,
    pub code: DofCode,
}

impl Constraint {
    /// Translation X/Y/Z then rotation X/Y/Z.
    pub fn dofs(&self) -> [bool; 6] {
        self.code.flags()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundaryGroup {
    pub id: Id,
    pub name: String,
    /// Constrained nodes in file order; a node constrained twice appears twice.
    pub nodes: Vec<Id>,
    pub constraints: Vec<Constraint>,
}

impl BoundaryGroup {
    pub fn default_name(id: Id) -> String {
        format!("Boundary_{id}")
    }

    pub fn new(id: Id) -> Self {
        Self {
            id,
            name: Self::default_name(id),
            nodes: Vec::new(),
            constraints: Vec::new(),
        }
    }
}

/// Axial prestress on a line element, attached to a load group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prestress {
    pub load_group: Id,
    pub element: Id,
    pub force: f64,
}
