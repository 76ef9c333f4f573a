//! Converts the excavation fixture stage by stage and checks the written files.

use std::fs;
use std::path::PathBuf;

use fpn_io::{ProjectionOptions, project, write_output_bundle};
use fpn_model::{FpnModel, ParseOptions, parse_fpn_file};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("../../tests/fixtures/fpn");
    path.push(name);
    path
}

fn excavation() -> FpnModel {
    parse_fpn_file(fixture_path("excavation.fpn"), &ParseOptions::default())
        .expect("excavation.fpn should parse")
        .model
}

#[test]
fn initial_stage_has_soil_and_wall_but_no_anchor() {
    let model = excavation();
    let p = project(&model, Some(1), &ProjectionOptions::default()).unwrap();
    assert_eq!(p.element_count(), 7);
    let names: Vec<_> = p.element_blocks.iter().map(|b| b.target.name()).collect();
    assert_eq!(
        names,
        vec![
            "SmallDisplacementElement3D4N",
            "ShellThinElementCorotational3D3N",
            "ShellThinElementCorotational3D4N",
        ]
    );
    let materials: Vec<_> = p.materials.iter().map(|m| m.material).collect();
    assert_eq!(materials, vec![1, 2, 5]);
    assert_eq!(p.boundaries.len(), 1);
    assert_eq!(p.boundaries[0].nodes, vec![1, 2, 3, 4]);
    assert!(p.prestress.is_empty());
}

#[test]
fn excavation_stage_bundle() {
    let model = excavation();
    let options = ProjectionOptions::default();
    let p = project(&model, Some(2), &options).unwrap();
    assert_eq!(p.element_count(), 5);

    let dir = tempfile::tempdir().expect("create temp dir");
    let out = write_output_bundle(dir.path(), "excavation_stage_2", &model, &p, &options)
        .expect("bundle should write");

    let mdpa = fs::read_to_string(&out.mdpa_path).unwrap();
    assert!(mdpa.contains("Begin Elements TrussElement3D2N\n30 6 5 9\nEnd Elements"));
    assert!(mdpa.contains("Begin SubModelPart MAT_6\n"));
    assert!(!mdpa.contains("Begin SubModelPart MAT_2\n"));
    assert!(mdpa.contains("Begin SubModelPart BND_8_C110111\n"));
    assert!(mdpa.contains("Begin ElementalData TRUSS_PRESTRESS_PK2\n30 "));

    let materials: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out.materials_path).unwrap()).unwrap();
    let props = materials["properties"].as_array().unwrap();
    let laws: Vec<_> = props
        .iter()
        .map(|p| p["Material"]["constitutive_law"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        laws,
        vec![
            "SmallStrainDplusDminusDamageModifiedMohrCoulombVonMises3D",
            "LinearElasticPlaneStress2DLaw",
            "TrussConstitutiveLaw",
        ]
    );
    assert_eq!(props[2]["Material"]["Variables"]["CROSS_AREA"], 0.00014);
    assert_eq!(props[1]["Material"]["Variables"]["THICKNESS"], 0.8);

    let constraints: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out.constraints_path).unwrap()).unwrap();
    let list = constraints["constraints_process_list"].as_array().unwrap();
    let targets: Vec<_> = list
        .iter()
        .map(|p| {
            (
                p["Parameters"]["model_part_name"].as_str().unwrap(),
                p["Parameters"]["variable_name"].as_str().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        targets,
        vec![
            ("Structure.BND_7_C111000", "DISPLACEMENT"),
            ("Structure.BND_8_C110111", "DISPLACEMENT"),
            ("Structure.BND_8_C110111", "ROTATION"),
        ]
    );
}

#[test]
fn whole_model_keeps_every_element() {
    let model = excavation();
    let p = project(&model, None, &ProjectionOptions::default()).unwrap();
    assert_eq!(p.element_count(), model.element_count());
    assert_eq!(p.nodes.len(), 9);
}
