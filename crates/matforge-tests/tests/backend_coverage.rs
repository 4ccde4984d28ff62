//! Every material kind through both backends: Lux maps each kind natively,
//! LuxCore degrades the four kinds it cannot express and says so.
//!
//! ```bash
//! cargo test -p matforge-tests --test backend_coverage
//! ```

use matforge_export::{lux, luxcore, ExportCache};
use matforge_ir::{
    Channel, DiagnosticCode, Material, MaterialKind, NodeKind, Rgb, TextureNode, ValueDomain,
};
use pretty_assertions::assert_eq;

const ALL_KINDS: [&str; 12] = [
    "MAT", "GLS", "SKN", "GLA", "MTL", "MIR", "VLV", "WTR", "CLO", "LGT", "NUL", "MIX",
];

fn material_of(code: &str) -> Material {
    let kind = MaterialKind::from_short_name(code).unwrap();
    let kind = match kind {
        // An empty mix would reference nameless siblings.
        MaterialKind::Mix { amount, .. } => MaterialKind::Mix {
            material1: "Base".into(),
            material2: "Shine".into(),
            amount,
        },
        other => other,
    };
    let mut mat = Material::new(format!("Test{code}"), "prop01", "prop01.obj", kind);
    mat.pool.insert(TextureNode::new(
        "kd",
        ValueDomain::Color,
        NodeKind::Constant {
            color: Rgb::gray(0.5),
        },
    ));
    mat.set_channel(Channel::Diffuse, "kd");
    mat
}

#[test]
fn test_lux_maps_every_kind_natively() {
    for code in ALL_KINDS {
        let mat = material_of(code);
        let mut cache = ExportCache::new();
        let out = lux::export_material(&mat, &mut cache);
        assert!(
            out.diagnostics.is_empty(),
            "{code}: {:?}",
            out.diagnostics
        );
        assert!(
            out.text.contains(&format!("\"prop01:Test{code}\"")),
            "{code} missing its named statement"
        );
    }
}

#[test]
fn test_luxcore_degrades_exactly_the_unsupported_kinds() {
    for code in ALL_KINDS {
        let mat = material_of(code);
        let mut cache = ExportCache::new();
        let out = luxcore::export_material(&mat, &mut cache);
        let degraded = out
            .diagnostics
            .iter()
            .filter(|d| d.code == DiagnosticCode::UnsupportedKindForBackend)
            .count();
        let expected = usize::from(matches!(code, "SKN" | "VLV" | "WTR" | "CLO"));
        assert_eq!(degraded, expected, "{code}");
    }
}

#[test]
fn test_lux_kind_type_words() {
    let cases = [
        ("MAT", "[\"matte\"]"),
        ("GLS", "[\"glossy\"]"),
        ("SKN", "[\"glossytranslucent\"]"),
        ("GLA", "[\"glass\"]"),
        ("MTL", "[\"metal2\"]"),
        ("MIR", "[\"mirror\"]"),
        ("VLV", "[\"velvet\"]"),
        ("WTR", "[\"glass2\"]"),
        ("CLO", "[\"cloth\"]"),
        ("NUL", "[\"null\"]"),
        ("MIX", "[\"mix\"]"),
    ];
    for (code, needle) in cases {
        let mat = material_of(code);
        let mut cache = ExportCache::new();
        let out = lux::export_material(&mat, &mut cache);
        assert!(out.text.contains(needle), "{code}: {}", out.text);
    }
}

#[test]
fn test_luxcore_kind_type_words() {
    let cases = [
        ("MAT", "type = matte"),
        ("GLS", "type = glossy2"),
        ("SKN", "type = glossy2"),
        ("GLA", "type = glass"),
        ("MTL", "type = metal2"),
        ("MIR", "type = mirror"),
        ("VLV", "type = matte"),
        ("WTR", "type = glass"),
        ("CLO", "type = matte"),
        ("NUL", "type = null"),
        ("MIX", "type = mix"),
    ];
    for (code, needle) in cases {
        let mat = material_of(code);
        let mut cache = ExportCache::new();
        let out = luxcore::export_material(&mat, &mut cache);
        assert!(out.text.contains(needle), "{code}: {}", out.text);
    }
}

#[test]
fn test_light_kind_emits_the_area_light() {
    let mat = material_of("LGT");
    let mut cache = ExportCache::new();
    let out = lux::export_material(&mat, &mut cache);
    assert!(out.text.contains("AreaLightSource \"area\" \"float gain\" [1]"));

    let mut cache = ExportCache::new();
    let out = luxcore::export_material(&mat, &mut cache);
    assert!(out.text.contains("scene.materials.prop01_TestLGT.emission.gain = 1 1 1"));
}

#[test]
fn test_hidden_material_exports_null_in_both_backends() {
    let mut mat = material_of("GLS");
    mat.visible_in_render = false;
    let mut cache = ExportCache::new();
    let out = lux::export_material(&mat, &mut cache);
    assert!(out.text.contains("[\"null\"]"));

    let mut cache = ExportCache::new();
    let out = luxcore::export_material(&mat, &mut cache);
    assert!(out.text.contains("scene.materials.prop01_TestGLS.type = null"));
}

#[test]
fn test_metal_emits_a_fresnel_texture() {
    let mat = material_of("MTL");
    let mut cache = ExportCache::new();
    let out = lux::export_material(&mat, &mut cache);
    assert!(out.text.contains("\"fresnel\" \"fresnelcolor\""));
    assert!(out.text.contains("\"texture fresnel\" [\"prop01:TestMTL_fresnel\"]"));

    let mut cache = ExportCache::new();
    let out = luxcore::export_material(&mat, &mut cache);
    assert!(out.text.contains("scene.textures.prop01_TestMTL_fresnel.type = fresnelcolor"));
    assert!(out.text.contains("scene.materials.prop01_TestMTL.fresnel = \"prop01_TestMTL_fresnel\""));
}
