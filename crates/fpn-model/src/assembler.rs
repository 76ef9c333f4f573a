//! Collects decoded records into the final model collections.

use tracing::debug;

use fpn_inp::{CoordinateOffset, Id, NamedRecord, Record, SectionRecord};

use crate::collection::Ordered;
use crate::entities::{
    BoundaryGroup, Constraint, LineElement, LoadGroup, MeshSet, Node, PlateElement, Prestress,
    ShellProperty, TrussSection, VolumeElement,
};
use crate::material::{Material, MaterialPatch};
use crate::model::FpnModel;
use crate::stage::AnalysisStage;

#[derive(Debug, Default)]
pub struct ModelAssembler {
    offset: CoordinateOffset,
    nodes: Ordered<Node>,
    volumes: Ordered<VolumeElement>,
    lines: Ordered<LineElement>,
    plates: Ordered<PlateElement>,
    shells: Ordered<ShellProperty>,
    trusses: Ordered<TrussSection>,
    materials: Ordered<Material>,
    mesh_sets: Ordered<MeshSet>,
    load_groups: Ordered<LoadGroup>,
    boundary_groups: Ordered<BoundaryGroup>,
    prestresses: Vec<Prestress>,
    duplicates: usize,
}

impl ModelAssembler {
    pub fn new(offset: CoordinateOffset) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }

    /// Number of records dropped because their id was already taken.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Add one non-stage record. Stage records and group commands belong to
    /// the stage accumulator and are ignored here.
    pub fn add(&mut self, record: Record) {
        match record {
            Record::Node(rec) => {
                let node = Node {
                    id: rec.id,
                    coords: self.offset.apply(rec.x, rec.y, rec.z),
                };
                self.insert("node", rec.id, |a| a.nodes.insert_first(rec.id, node));
            }
            Record::Volume(rec) => {
                let element = VolumeElement {
                    id: rec.id,
                    kind: rec.kind,
                    material: rec.material,
                    nodes: rec.nodes,
                };
                self.insert("volume element", rec.id, |a| a.volumes.insert_first(rec.id, element));
            }
            Record::Line(rec) => {
                let element = LineElement {
                    id: rec.id,
                    property: rec.property,
                    nodes: rec.nodes,
                };
                self.insert("line element", rec.id, |a| a.lines.insert_first(rec.id, element));
            }
            Record::Plate(rec) => {
                let element = PlateElement {
                    id: rec.id,
                    property: rec.property,
                    nodes: rec.nodes,
                };
                self.insert("plate element", rec.id, |a| a.plates.insert_first(rec.id, element));
            }
            Record::Shell(rec) => {
                let id = rec.id;
                let shell = shell_property(rec);
                self.insert("shell property", id, |a| a.shells.insert_first(id, shell));
            }
            Record::Truss(rec) => {
                let id = rec.id;
                let truss = truss_section(rec);
                self.insert("truss section", id, |a| a.trusses.insert_first(id, truss));
            }
            Record::Miso(rec) => self.merge_material(rec.into()),
            Record::Matgen(rec) => self.merge_material(rec.into()),
            Record::Matporo(rec) => self.merge_material(rec.into()),
            Record::Mnlmc(rec) => self.merge_material(rec.into()),
            Record::MeshSet(NamedRecord { id, name }) => {
                let set = MeshSet {
                    id,
                    name: name.unwrap_or_else(|| format!("MeshSet_{id}")),
                };
                self.insert("mesh set", id, |a| a.mesh_sets.insert_first(id, set));
            }
            Record::LoadSet(NamedRecord { id, name }) => {
                let group = LoadGroup {
                    id,
                    name: name.unwrap_or_else(|| format!("LoadGroup_{id}")),
                };
                self.insert("load group", id, |a| a.load_groups.insert_first(id, group));
            }
            Record::BoundarySet(NamedRecord { id, name }) => {
                let group = self
                    .boundary_groups
                    .get_or_insert_with(id, || BoundaryGroup::new(id));
                if let Some(name) = name {
                    group.name = name;
                }
            }
            Record::Constraint(rec) => {
                let group = self
                    .boundary_groups
                    .get_or_insert_with(rec.group, || BoundaryGroup::new(rec.group));
                group.nodes.push(rec.node);
                group.constraints.push(Constraint {
                    group: rec.group,
                    node: rec.node,
                    code: rec.code,
                });
            }
            Record::Prestress(rec) => self.prestresses.push(Prestress {
                load_group: rec.load_group,
                element: rec.element,
                force: rec.force,
            }),
            Record::Stage(_) | Record::GroupCommand(_) => {}
        }
    }

    fn insert(&mut self, what: &str, id: Id, insert: impl FnOnce(&mut Self) -> bool) {
        if !insert(self) {
            self.duplicates += 1;
            debug!(kind = what, id, "duplicate id, first record kept");
        }
    }

    fn merge_material(&mut self, patch: MaterialPatch) {
        let id = patch.id;
        self.materials
            .get_or_insert_with(id, || Material::new(id))
            .merge(patch);
    }

    pub fn finish(self, stages: Ordered<AnalysisStage>) -> FpnModel {
        FpnModel {
            offset: self.offset,
            nodes: self.nodes,
            volumes: self.volumes,
            lines: self.lines,
            plates: self.plates,
            shells: self.shells,
            trusses: self.trusses,
            materials: self.materials,
            mesh_sets: self.mesh_sets,
            load_groups: self.load_groups,
            boundary_groups: self.boundary_groups,
            prestresses: self.prestresses,
            stages,
        }
    }
}

fn shell_property(rec: SectionRecord) -> ShellProperty {
    ShellProperty {
        id: rec.id,
        name: rec.name.unwrap_or_else(|| format!("Shell_{}", rec.id)),
        material: rec.material,
        thickness: rec.value,
    }
}

fn truss_section(rec: SectionRecord) -> TrussSection {
    TrussSection {
        id: rec.id,
        name: rec.name.unwrap_or_else(|| format!("Truss_{}", rec.id)),
        material: rec.material,
        area: rec.value,
    }
}

#[cfg(test)]
mod tests {
    use fpn_inp::{ConstRecord, DofCode, MatgenRecord, MisoRecord, NodeRecord};

    use super::*;

    #[test]
    fn constraint_before_declaration_creates_default_group() {
        let mut a = ModelAssembler::default();
        a.add(Record::Constraint(ConstRecord {
            group: 7,
            node: 12,
            code: DofCode::parse("111000"),
        }));
        let model = a.finish(Ordered::new());

        let group = model.boundary_groups.get(7).expect("group 7 created");
        assert_eq!(group.name, BoundaryGroup::default_name(7));
        assert_eq!(group.nodes, vec![12]);
        assert_eq!(group.constraints[0].dofs(), [true, true, true, false, false, false]);
    }

    #[test]
    fn later_declaration_backfills_name_and_keeps_constraints() {
        let mut a = ModelAssembler::default();
        a.add(Record::Constraint(ConstRecord {
            group: 3,
            node: 1,
            code: DofCode::parse("1"),
        }));
        a.add(Record::BoundarySet(NamedRecord {
            id: 3,
            name: Some("Base".into()),
        }));
        let model = a.finish(Ordered::new());
        let group = model.boundary_groups.get(3).unwrap();
        assert_eq!(group.name, "Base");
        assert_eq!(group.constraints.len(), 1);
    }

    #[test]
    fn nodes_are_offset_and_deduplicated() {
        let mut a = ModelAssembler::new(CoordinateOffset {
            offset: [10.0, 20.0, 30.0],
            sample_size: 1,
        });
        a.add(Record::Node(NodeRecord {
            id: 1,
            x: 15.0,
            y: 25.0,
            z: 35.0,
        }));
        a.add(Record::Node(NodeRecord {
            id: 1,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }));
        assert_eq!(a.duplicates(), 1);
        let model = a.finish(Ordered::new());
        assert_eq!(model.nodes.len(), 1);
        assert_eq!(model.nodes.get(1).unwrap().coords, [5.0, 5.0, 5.0]);
    }

    #[test]
    fn material_sub_records_merge_by_id() {
        let mut a = ModelAssembler::default();
        a.add(Record::Matgen(MatgenRecord {
            id: 2,
            elastic_modulus: Some(5e6),
            poisson_ratio: None,
            density: Some(1800.0),
        }));
        a.add(Record::Miso(MisoRecord {
            id: 2,
            name: Some("Fill".into()),
            type_tag: None,
        }));
        let model = a.finish(Ordered::new());
        assert_eq!(model.materials.len(), 1);
        let m = model.materials.get(2).unwrap();
        assert_eq!(m.display_name(), "Fill");
        assert_eq!(m.density(), Some(1800.0));
    }
}
