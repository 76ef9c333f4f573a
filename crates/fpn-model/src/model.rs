//! The assembled FPN model and its look-ups.

use fpn_inp::{CoordinateOffset, Id};

use crate::collection::Ordered;
use crate::entities::{
    BoundaryGroup, ElementRef, LineElement, LoadGroup, MeshSet, Node, PlateElement, Prestress,
    ShellProperty, TrussSection, VolumeElement,
};
use crate::material::Material;
use crate::stage::{ActiveGroups, AnalysisStage, GroupCommand};

/// Every collection iterates in file order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct FpnModel {
    pub offset: CoordinateOffset,
    pub nodes: Ordered<Node>,
    pub volumes: Ordered<VolumeElement>,
    pub lines: Ordered<LineElement>,
    pub plates: Ordered<PlateElement>,
    pub shells: Ordered<ShellProperty>,
    pub trusses: Ordered<TrussSection>,
    pub materials: Ordered<Material>,
    pub mesh_sets: Ordered<MeshSet>,
    pub load_groups: Ordered<LoadGroup>,
    pub boundary_groups: Ordered<BoundaryGroup>,
    pub prestresses: Vec<Prestress>,
    pub stages: Ordered<AnalysisStage>,
}

impl FpnModel {
    pub fn node(&self, id: Id) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn stage(&self, id: Id) -> Option<&AnalysisStage> {
        self.stages.get(id)
    }

    pub fn material(&self, id: Id) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn element_count(&self) -> usize {
        self.volumes.len() + self.lines.len() + self.plates.len()
    }

    /// Volume, then plate, then line elements.
    pub fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.volumes
            .iter()
            .map(ElementRef::Volume)
            .chain(self.plates.iter().map(ElementRef::Plate))
            .chain(self.lines.iter().map(ElementRef::Line))
    }

    /// Activation as of stage `id`: the command logs of that stage and every
    /// stage opened before it, merged by sequence number and replayed in
    /// file order.
    pub fn active_groups_as_of(&self, id: Id) -> Option<ActiveGroups> {
        let position = self.stages.iter().position(|s| s.id == id)?;
        let mut commands: Vec<&GroupCommand> = self.stages.as_slice()[..=position]
            .iter()
            .flat_map(|s| s.commands.iter())
            .collect();
        commands.sort_by_key(|c| c.sequence);
        Some(ActiveGroups::replay(commands))
    }

    /// Material an element is assigned to.
    ///
    /// Plates and lines go through their section's material and fall back to
    /// the property id when the section names none.
    pub fn material_for_element(&self, element: ElementRef<'_>) -> Id {
        match element {
            ElementRef::Volume(e) => e.material,
            ElementRef::Plate(e) => self
                .shells
                .get(e.property)
                .and_then(|s| s.material)
                .unwrap_or(e.property),
            ElementRef::Line(e) => self
                .trusses
                .get(e.property)
                .and_then(|s| s.material)
                .unwrap_or(e.property),
        }
    }
}
