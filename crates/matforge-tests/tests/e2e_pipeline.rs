//! End-to-end pipeline tests: raw shader bag through conversion into
//! backend text.
//!
//! ```bash
//! cargo test -p matforge-tests --test e2e_pipeline
//! ```

use matforge_export::{lux, luxcore, ExportCache};
use matforge_ir::{Channel, DiagnosticCode, MaterialKind, NodeKind};
use matforge_tests::fixtures;
use serde_json::json;

#[test]
fn test_plain_bag_becomes_matte_in_both_backends() {
    let object = fixtures::object("chair01");
    let out = fixtures::convert(&object, "Seat", &fixtures::plain_bag());
    assert!(out.diagnostics.is_empty());
    assert!(matches!(out.material.kind, MaterialKind::Matte { .. }));

    let mut cache = ExportCache::new();
    let lux_out = lux::export_material(&out.material, &mut cache);
    assert!(lux_out.diagnostics.is_empty());
    assert!(lux_out
        .text
        .contains("MakeNamedMaterial \"chair01:Seat\" \"string type\" [\"matte\"]"));

    let mut cache = ExportCache::new();
    let core_out = luxcore::export_material(&out.material, &mut cache);
    assert!(core_out.diagnostics.is_empty());
    assert!(core_out
        .text
        .contains("scene.materials.chair01_Seat.type = matte"));
}

#[test]
fn test_textured_bag_binds_and_exports_the_image_map() {
    let object = fixtures::object("chair01");
    let out = fixtures::convert(&object, "Seat", &fixtures::textured_bag("textures\\wood.jpg"));
    assert!(out.material.channel_node(Channel::Diffuse).is_some());

    let mut cache = ExportCache::new();
    let lux_out = lux::export_material(&out.material, &mut cache);
    // Backslashes are normalized on conversion already.
    assert!(lux_out
        .text
        .contains("\"string filename\" [\"textures/wood.jpg\"]"));
    assert!(lux_out.text.contains("\"texture Kd\" [\"chair01:Seat:DiffTex\"]"));

    let mut cache = ExportCache::new();
    let core_out = luxcore::export_material(&out.material, &mut cache);
    assert!(core_out
        .text
        .contains("scene.textures.chair01_Seat_DiffTex.file = \"textures/wood.jpg\""));
}

#[test]
fn test_specular_evidence_classifies_glossy() {
    let object = fixtures::object("chair01");
    let out = fixtures::convert(&object, "Trim", &fixtures::glossy_bag());
    let MaterialKind::Glossy { u_glossiness, .. } = out.material.kind else {
        panic!("expected glossy, got {:?}", out.material.kind);
    };
    assert!(u_glossiness > 0);

    let mut cache = ExportCache::new();
    let lux_out = lux::export_material(&out.material, &mut cache);
    assert!(lux_out.text.contains("[\"glossy\"]"));
    assert!(lux_out.text.contains("\"float uroughness\""));
}

#[test]
fn test_alpha_bag_forces_the_two_material_blend() {
    let object = fixtures::object("fig01");
    let out = fixtures::convert(&object, "Veil", &fixtures::alpha_bag(0.5));
    assert!(out.material.alpha.is_active());

    let mut cache = ExportCache::new();
    let lux_out = lux::export_material(&out.material, &mut cache);
    assert!(lux_out.text.contains("MakeNamedMaterial \"fig01:Veil_Null\""));
    assert!(lux_out.text.contains("MakeNamedMaterial \"fig01:Veil_BaseMat\""));
    assert!(lux_out
        .text
        .contains("MakeNamedMaterial \"fig01:Veil\" \"string type\" [\"mix\"]"));

    let mut cache = ExportCache::new();
    let core_out = luxcore::export_material(&out.material, &mut cache);
    assert!(core_out.text.contains("scene.materials.fig01_Veil_Null.type = null"));
    assert!(core_out.text.contains("scene.materials.fig01_Veil.type = mix"));
}

#[test]
fn test_bump_bag_emits_the_clamp_chain() {
    let object = fixtures::object("wall01");
    let out = fixtures::convert(&object, "Brick", &fixtures::bump_bag());
    assert!(out.material.modifiers.bump.is_some());

    let mut cache = ExportCache::new();
    let lux_out = lux::export_material(&out.material, &mut cache);
    assert!(lux_out.text.contains("Texture \"BM_wall01:Brick_limits\""));
    assert!(lux_out.text.contains("\"texture bumpmap\" [\"wall01:Brick_bumpmap\"]"));

    let mut cache = ExportCache::new();
    let core_out = luxcore::export_material(&out.material, &mut cache);
    assert!(core_out
        .text
        .contains("scene.materials.wall01_Brick.bumptex = \"wall01_Brick_bumpmap\""));
}

#[test]
fn test_malformed_bag_degrades_to_gray_matte() {
    let object = fixtures::object("chair01");
    let out = fixtures::convert(&object, "Seat", &json!([1, 2, 3]));
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].code, DiagnosticCode::MalformedShaderData);
    assert!(matches!(out.material.kind, MaterialKind::Matte { .. }));

    // The fallback still exports cleanly.
    let mut cache = ExportCache::new();
    let lux_out = lux::export_material(&out.material, &mut cache);
    assert!(lux_out.diagnostics.is_empty());
    assert!(lux_out.text.contains("MakeNamedMaterial \"chair01:Seat\""));
}

#[test]
fn test_light_named_object_bypasses_channel_conversion() {
    let object = fixtures::object("RealityLight1");
    let out = fixtures::convert(
        &object,
        "Emitter",
        &json!({ "source": "poser", "lightGain": 3.0 }),
    );
    assert!(matches!(out.material.kind, MaterialKind::Light { gain, .. } if gain == 3.0));

    let mut cache = ExportCache::new();
    let lux_out = lux::export_material(&out.material, &mut cache);
    assert!(lux_out.text.contains("AreaLightSource \"area\" \"float gain\" [3]"));
}

#[test]
fn test_skin_flag_wins_over_specular_heuristics() {
    let object = fixtures::object("fig01");
    let mut raw = fixtures::glossy_bag();
    raw["isSkin"] = json!(true);
    let out = fixtures::convert(&object, "Face", &raw);
    assert!(matches!(out.material.kind, MaterialKind::Skin { .. }));

    let mut cache = ExportCache::new();
    let lux_out = lux::export_material(&out.material, &mut cache);
    assert!(lux_out.text.contains("[\"glossytranslucent\"]"));
    assert!(lux_out.text.contains("\"bool onesided\" [\"true\"]"));
}

#[test]
fn test_forced_kind_bypasses_classification() {
    let object = fixtures::object("chair01");
    let store = matforge_convert::InMemoryPresetStore::new();
    let out = matforge_convert::convert_material_as(
        &object,
        "Seat",
        &fixtures::plain_bag(),
        &store,
        MaterialKind::Mirror,
    );
    assert!(matches!(out.material.kind, MaterialKind::Mirror));
    assert!(out.material.edited);

    let mut cache = ExportCache::new();
    let lux_out = lux::export_material(&out.material, &mut cache);
    assert!(lux_out.text.contains("[\"mirror\"]"));
    assert!(lux_out.text.contains("\"float filmindex\" [1.5]"));
}

#[test]
fn test_constant_diffuse_is_a_constant_node() {
    let object = fixtures::object("chair01");
    let out = fixtures::convert(&object, "Seat", &fixtures::plain_bag());
    let id = out.material.channel_node(Channel::Diffuse).unwrap();
    assert!(matches!(
        out.material.pool.get(id).kind,
        NodeKind::Constant { .. }
    ));
}
