//! Typed records and their per-keyword decoders.
//!
//! Each decoder splits one line on the field separator, trims every field,
//! checks the keyword's minimum field count and converts the fields it
//! needs. Any failure rejects the whole line.

use serde::{Deserialize, Serialize};

use crate::dof::DofCode;
use crate::error::DecodeError;
use crate::keyword::{FIELD_SEPARATOR, Keyword};

/// Identifier shared by every FPN namespace (nodes, elements, groups, ...).
pub type Id = u32;

/// Standard gravity used to turn unit weight into mass density [m/s²].
pub const STANDARD_GRAVITY: f64 = 9.80665;
/// Elastic modulus is written in mega units.
pub const MEGA: f64 = 1.0e6;
/// Cohesion is written in kilo units.
pub const KILO: f64 = 1.0e3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeKind {
    Tetra,
    Hexa,
    Penta,
}

impl VolumeKind {
    pub fn node_count(self) -> usize {
        match self {
            VolumeKind::Tetra => 4,
            VolumeKind::Hexa => 8,
            VolumeKind::Penta => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VolumeKind::Tetra => "tetra",
            VolumeKind::Hexa => "hexa",
            VolumeKind::Penta => "penta",
        }
    }

    fn from_keyword(keyword: Keyword) -> Option<Self> {
        match keyword {
            Keyword::Tetra => Some(VolumeKind::Tetra),
            Keyword::Hexa => Some(VolumeKind::Hexa),
            Keyword::Penta => Some(VolumeKind::Penta),
            _ => None,
        }
    }
}

/// The four stage group commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CommandKind {
    AddMaterials,
    DeleteMaterials,
    AddLoads,
    AddBoundaries,
}

impl CommandKind {
    pub fn keyword(self) -> Keyword {
        match self {
            CommandKind::AddMaterials => Keyword::Madd,
            CommandKind::DeleteMaterials => Keyword::Mdel,
            CommandKind::AddLoads => Keyword::Ladd,
            CommandKind::AddBoundaries => Keyword::Badd,
        }
    }

    pub fn from_keyword(keyword: Keyword) -> Option<Self> {
        match keyword {
            Keyword::Madd => Some(CommandKind::AddMaterials),
            Keyword::Mdel => Some(CommandKind::DeleteMaterials),
            Keyword::Ladd => Some(CommandKind::AddLoads),
            Keyword::Badd => Some(CommandKind::AddBoundaries),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub id: Id,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeRecord {
    pub id: Id,
    pub kind: VolumeKind,
    pub material: Id,
    pub nodes: Vec<Id>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    pub id: Id,
    pub property: Id,
    pub nodes: [Id; 2],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlateRecord {
    pub id: Id,
    pub property: Id,
    pub nodes: Vec<Id>,
}

/// `PSHELL` / `PETRUSS`: a section with an optional material and one
/// optional scalar (thickness for shells, area for trusses).
#[derive(Debug, Clone, PartialEq)]
pub struct SectionRecord {
    pub id: Id,
    pub name: Option<String>,
    pub material: Option<Id>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MisoRecord {
    pub id: Id,
    pub name: Option<String>,
    pub type_tag: Option<String>,
}

/// General material data, already converted to base units.
#[derive(Debug, Clone, PartialEq)]
pub struct MatgenRecord {
    pub id: Id,
    pub elastic_modulus: Option<f64>,
    pub poisson_ratio: Option<f64>,
    pub density: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatporoRecord {
    pub id: Id,
    pub permeability: Option<f64>,
    pub porosity: Option<f64>,
}

/// Mohr-Coulomb strength data, cohesion already in base units.
#[derive(Debug, Clone, PartialEq)]
pub struct MnlmcRecord {
    pub id: Id,
    pub friction_angle: Option<f64>,
    pub cohesion: Option<f64>,
}

/// `MSET`, `LSET` and `BSET` declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRecord {
    pub id: Id,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRecord {
    pub id: Id,
    pub stage_type: i32,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCommandRecord {
    pub kind: CommandKind,
    /// Stage id written on the command line itself.
    pub stage: Id,
    pub declared_count: Option<u32>,
    pub ids: Vec<Id>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstRecord {
    pub group: Id,
    pub node: Id,
    pub code: DofCode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrestressRecord {
    pub load_group: Id,
    pub element: Id,
    pub force: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Node(NodeRecord),
    Volume(VolumeRecord),
    Line(LineRecord),
    Plate(PlateRecord),
    Shell(SectionRecord),
    Truss(SectionRecord),
    Miso(MisoRecord),
    Matgen(MatgenRecord),
    Matporo(MatporoRecord),
    Mnlmc(MnlmcRecord),
    MeshSet(NamedRecord),
    Stage(StageRecord),
    GroupCommand(GroupCommandRecord),
    LoadSet(NamedRecord),
    BoundarySet(NamedRecord),
    Constraint(ConstRecord),
    Prestress(PrestressRecord),
}

/// Decode a line already classified as `keyword`.
pub fn decode(keyword: Keyword, line: &str) -> Result<Record, DecodeError> {
    let f = Fields::split(keyword, line)?;

    let record = match keyword {
        Keyword::Node => Record::Node(decode_node(&f)?),
        Keyword::Tetra | Keyword::Hexa | Keyword::Penta => {
            let kind = VolumeKind::from_keyword(keyword)
                .ok_or_else(|| f.error("not a volume element keyword"))?;
            Record::Volume(VolumeRecord {
                id: f.id(1, "element id")?,
                kind,
                material: f.id(2, "material id")?,
                nodes: f.id_run(3, kind.node_count())?,
            })
        }
        Keyword::Line => {
            let nodes = f.id_run(3, 2)?;
            Record::Line(LineRecord {
                id: f.id(1, "element id")?,
                property: f.id(2, "property id")?,
                nodes: [nodes[0], nodes[1]],
            })
        }
        Keyword::Tria | Keyword::Ctria => Record::Plate(decode_plate(&f, 3)?),
        Keyword::Quad | Keyword::Cquad => Record::Plate(decode_plate(&f, 4)?),
        Keyword::Pshell => Record::Shell(decode_section(&f)?),
        Keyword::Petruss => Record::Truss(decode_section(&f)?),
        Keyword::Miso => Record::Miso(MisoRecord {
            id: f.id(1, "material id")?,
            name: f.text(2),
            type_tag: f.text(3),
        }),
        Keyword::Matgen => Record::Matgen(MatgenRecord {
            id: f.id(1, "material id")?,
            elastic_modulus: f.opt_float(2, "elastic modulus")?.map(|e| e * MEGA),
            poisson_ratio: f.opt_float(5, "poisson ratio")?,
            density: f
                .opt_float(6, "unit weight")?
                .map(|gamma| gamma / STANDARD_GRAVITY * 1000.0),
        }),
        Keyword::Matporo => Record::Matporo(MatporoRecord {
            id: f.id(1, "material id")?,
            permeability: f.opt_float(2, "permeability")?,
            porosity: f.opt_float(3, "porosity")?,
        }),
        Keyword::Mnlmc => Record::Mnlmc(MnlmcRecord {
            id: f.id(1, "material id")?,
            friction_angle: f.opt_float(2, "friction angle")?,
            cohesion: f.opt_float(5, "cohesion")?.map(|c| c * KILO),
        }),
        Keyword::Mset => Record::MeshSet(decode_named(&f)?),
        Keyword::Lset => Record::LoadSet(decode_named(&f)?),
        Keyword::Bset => Record::BoundarySet(decode_named(&f)?),
        Keyword::Stage => Record::Stage(StageRecord {
            id: f.id(1, "stage id")?,
            stage_type: f.opt_int(2, "stage type")?.unwrap_or(0),
            name: f.text(3),
        }),
        Keyword::Madd | Keyword::Mdel | Keyword::Ladd | Keyword::Badd => {
            let kind = CommandKind::from_keyword(keyword)
                .ok_or_else(|| f.error("not a group command keyword"))?;
            let declared_count = f
                .opt_int(2, "group count")?
                .map(|n| u32::try_from(n).map_err(|_| f.error(format!("negative group count {n}"))))
                .transpose()?;
            Record::GroupCommand(GroupCommandRecord {
                kind,
                stage: f.id(1, "stage id")?,
                declared_count,
                ids: f.id_tail(3)?,
            })
        }
        Keyword::Const => Record::Constraint(ConstRecord {
            group: f.id(1, "boundary group id")?,
            node: f.id(2, "node id")?,
            code: DofCode::parse(f.raw(3)),
        }),
        Keyword::Pstrst => Record::Prestress(PrestressRecord {
            load_group: f.id(1, "load group id")?,
            element: f.id(2, "element id")?,
            force: f.float(3, "force")?,
        }),
    };

    Ok(record)
}

/// Decode a bare-separator line continuing a group command: every
/// non-empty field is another group id.
pub fn decode_continuation(kind: CommandKind, line: &str) -> Result<Vec<Id>, DecodeError> {
    let f = Fields {
        keyword: kind.keyword(),
        parts: line.split(FIELD_SEPARATOR).map(str::trim).collect(),
    };
    f.id_tail(0)
}

/// Decode only the raw coordinates of a `NODE` line, for the offset probe.
pub fn decode_node_line(line: &str) -> Result<NodeRecord, DecodeError> {
    decode_node(&Fields::split(Keyword::Node, line)?)
}

fn decode_node(f: &Fields<'_>) -> Result<NodeRecord, DecodeError> {
    Ok(NodeRecord {
        id: f.id(1, "node id")?,
        x: f.float(2, "x coordinate")?,
        y: f.float(3, "y coordinate")?,
        z: f.float(4, "z coordinate")?,
    })
}

fn decode_plate(f: &Fields<'_>, count: usize) -> Result<PlateRecord, DecodeError> {
    Ok(PlateRecord {
        id: f.id(1, "element id")?,
        property: f.id(2, "property id")?,
        nodes: f.id_run(3, count)?,
    })
}

fn decode_section(f: &Fields<'_>) -> Result<SectionRecord, DecodeError> {
    Ok(SectionRecord {
        id: f.id(1, "property id")?,
        name: f.text(2),
        material: f.opt_id(4, "material id")?,
        value: f.opt_float(5, "section value")?,
    })
}

fn decode_named(f: &Fields<'_>) -> Result<NamedRecord, DecodeError> {
    Ok(NamedRecord {
        id: f.id(1, "group id")?,
        name: f.text(2),
    })
}

struct Fields<'a> {
    keyword: Keyword,
    parts: Vec<&'a str>,
}

impl<'a> Fields<'a> {
    fn split(keyword: Keyword, line: &'a str) -> Result<Self, DecodeError> {
        let parts: Vec<&str> = line.split(FIELD_SEPARATOR).map(str::trim).collect();
        if parts.len() < keyword.min_fields() {
            return Err(DecodeError::new(
                keyword,
                format!(
                    "expected at least {} fields, found {}",
                    keyword.min_fields(),
                    parts.len()
                ),
            ));
        }
        Ok(Self { keyword, parts })
    }

    fn error(&self, message: impl Into<String>) -> DecodeError {
        DecodeError::new(self.keyword, message)
    }

    fn raw(&self, idx: usize) -> &'a str {
        self.parts.get(idx).copied().unwrap_or_default()
    }

    fn text(&self, idx: usize) -> Option<String> {
        let value = self.raw(idx);
        (!value.is_empty()).then(|| value.to_string())
    }

    fn id(&self, idx: usize, what: &str) -> Result<Id, DecodeError> {
        self.opt_id(idx, what)?
            .ok_or_else(|| self.error(format!("missing {what} (field {idx})")))
    }

    fn opt_id(&self, idx: usize, what: &str) -> Result<Option<Id>, DecodeError> {
        let value = self.raw(idx);
        if value.is_empty() {
            return Ok(None);
        }
        match value.parse::<Id>() {
            Ok(0) => Err(self.error(format!("{what} must be positive"))),
            Ok(id) => Ok(Some(id)),
            Err(_) => Err(self.error(format!("invalid {what}: {value:?}"))),
        }
    }

    fn opt_int(&self, idx: usize, what: &str) -> Result<Option<i32>, DecodeError> {
        let value = self.raw(idx);
        if value.is_empty() {
            return Ok(None);
        }
        value
            .parse::<i32>()
            .map(Some)
            .map_err(|_| self.error(format!("invalid {what}: {value:?}")))
    }

    fn float(&self, idx: usize, what: &str) -> Result<f64, DecodeError> {
        self.opt_float(idx, what)?
            .ok_or_else(|| self.error(format!("missing {what} (field {idx})")))
    }

    fn opt_float(&self, idx: usize, what: &str) -> Result<Option<f64>, DecodeError> {
        let value = self.raw(idx);
        if value.is_empty() {
            return Ok(None);
        }
        match value.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(self.error(format!("invalid {what}: {value:?}"))),
        }
    }

    /// Exactly `count` required ids starting at `start`.
    fn id_run(&self, start: usize, count: usize) -> Result<Vec<Id>, DecodeError> {
        (start..start + count)
            .map(|idx| self.id(idx, "node id"))
            .collect()
    }

    /// Every non-empty field from `start` on, as ids.
    fn id_tail(&self, start: usize) -> Result<Vec<Id>, DecodeError> {
        self.parts
            .iter()
            .enumerate()
            .skip(start)
            .filter(|(_, value)| !value.is_empty())
            .map(|(idx, _)| self.id(idx, "group id"))
            .collect()
    }
}
