//! Source element kind to target element name.

use serde::Serialize;

use fpn_inp::VolumeKind;
use fpn_model::ElementRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TargetElement {
    SmallDisplacement3D4N,
    SmallDisplacement3D6N,
    SmallDisplacement3D8N,
    ShellThin3N,
    ShellThin4N,
    Truss3D2N,
}

impl TargetElement {
    /// Block order in the written file.
    pub const ALL: [TargetElement; 6] = [
        TargetElement::SmallDisplacement3D4N,
        TargetElement::SmallDisplacement3D6N,
        TargetElement::SmallDisplacement3D8N,
        TargetElement::ShellThin3N,
        TargetElement::ShellThin4N,
        TargetElement::Truss3D2N,
    ];

    /// Used when the source kind has no entry in the table.
    pub const FALLBACK: TargetElement = TargetElement::SmallDisplacement3D4N;

    pub fn name(self) -> &'static str {
        match self {
            TargetElement::SmallDisplacement3D4N => "SmallDisplacementElement3D4N",
            TargetElement::SmallDisplacement3D6N => "SmallDisplacementElement3D6N",
            TargetElement::SmallDisplacement3D8N => "SmallDisplacementElement3D8N",
            TargetElement::ShellThin3N => "ShellThinElementCorotational3D3N",
            TargetElement::ShellThin4N => "ShellThinElementCorotational3D4N",
            TargetElement::Truss3D2N => "TrussElement3D2N",
        }
    }

    pub fn position(self) -> usize {
        TargetElement::ALL
            .iter()
            .position(|&t| t == self)
            .unwrap_or(0)
    }
}

/// Element kind as seen in the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Volume(VolumeKind),
    /// Plate with the given node count.
    Plate(usize),
    Line,
}

impl SourceKind {
    pub fn of(element: ElementRef<'_>) -> Self {
        match element {
            ElementRef::Volume(e) => SourceKind::Volume(e.kind),
            ElementRef::Plate(e) => SourceKind::Plate(e.nodes.len()),
            ElementRef::Line(_) => SourceKind::Line,
        }
    }
}

pub fn target_element(kind: SourceKind) -> TargetElement {
    match kind {
        SourceKind::Volume(VolumeKind::Tetra) => TargetElement::SmallDisplacement3D4N,
        SourceKind::Volume(VolumeKind::Penta) => TargetElement::SmallDisplacement3D6N,
        SourceKind::Volume(VolumeKind::Hexa) => TargetElement::SmallDisplacement3D8N,
        SourceKind::Plate(3) => TargetElement::ShellThin3N,
        SourceKind::Plate(4) => TargetElement::ShellThin4N,
        SourceKind::Line => TargetElement::Truss3D2N,
        SourceKind::Plate(_) => TargetElement::FALLBACK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_source_kind() {
        assert_eq!(
            target_element(SourceKind::Volume(VolumeKind::Tetra)).name(),
            "SmallDisplacementElement3D4N"
        );
        assert_eq!(
            target_element(SourceKind::Volume(VolumeKind::Hexa)).name(),
            "SmallDisplacementElement3D8N"
        );
        assert_eq!(
            target_element(SourceKind::Volume(VolumeKind::Penta)).name(),
            "SmallDisplacementElement3D6N"
        );
        assert_eq!(
            target_element(SourceKind::Plate(3)).name(),
            "ShellThinElementCorotational3D3N"
        );
        assert_eq!(
            target_element(SourceKind::Plate(4)).name(),
            "ShellThinElementCorotational3D4N"
        );
        assert_eq!(target_element(SourceKind::Line).name(), "TrussElement3D2N");
    }

    #[test]
    fn unknown_plate_arity_falls_back() {
        assert_eq!(target_element(SourceKind::Plate(5)), TargetElement::FALLBACK);
    }

    #[test]
    fn block_positions_are_contiguous() {
        for (i, t) in TargetElement::ALL.iter().enumerate() {
            assert_eq!(t.position(), i);
        }
    }
}
