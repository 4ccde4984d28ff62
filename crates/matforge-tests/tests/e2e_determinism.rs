//! Determinism tests: identical inputs must produce byte-identical backend
//! text and stable fingerprints, run after run.
//!
//! ```bash
//! cargo test -p matforge-tests --test e2e_determinism
//! ```

use matforge_export::{lux, luxcore, ExportCache};
use matforge_tests::fixtures;
use pretty_assertions::assert_eq;

fn converted(bag: &serde_json::Value) -> matforge_ir::Material {
    let object = fixtures::object("chair01");
    fixtures::convert(&object, "Seat", bag).material
}

#[test]
fn test_lux_export_is_byte_identical_across_runs() {
    let mat = converted(&fixtures::textured_bag("wood.jpg"));
    let mut c1 = ExportCache::new();
    let mut c2 = ExportCache::new();
    assert_eq!(
        lux::export_material(&mat, &mut c1).text,
        lux::export_material(&mat, &mut c2).text
    );
}

#[test]
fn test_luxcore_export_is_byte_identical_across_runs() {
    let mat = converted(&fixtures::bump_bag());
    let mut c1 = ExportCache::new();
    let mut c2 = ExportCache::new();
    assert_eq!(
        luxcore::export_material(&mat, &mut c1).text,
        luxcore::export_material(&mat, &mut c2).text
    );
}

#[test]
fn test_conversion_is_repeatable() {
    let object = fixtures::object("chair01");
    let raw = fixtures::glossy_bag();
    let a = fixtures::convert(&object, "Seat", &raw).material;
    let b = fixtures::convert(&object, "Seat", &raw).material;
    assert_eq!(a.kind, b.kind);
    assert_eq!(a.channels, b.channels);

    let mut c1 = ExportCache::new();
    let mut c2 = ExportCache::new();
    assert_eq!(
        lux::export_material(&a, &mut c1).text,
        lux::export_material(&b, &mut c2).text
    );
}

#[test]
fn test_fingerprint_is_stable_and_content_sensitive() {
    let mut a = converted(&fixtures::textured_bag("wood.jpg"));
    let mut b = converted(&fixtures::textured_bag("wood.jpg"));
    let mut c = converted(&fixtures::textured_bag("marble.jpg"));
    assert_eq!(a.fingerprint_id(), b.fingerprint_id());
    assert_ne!(a.fingerprint_id(), c.fingerprint_id());
}

#[test]
fn test_export_all_preserves_material_order() {
    let object = fixtures::object("chair01");
    let seat = fixtures::convert(&object, "Seat", &fixtures::plain_bag()).material;
    let trim = fixtures::convert(&object, "Trim", &fixtures::glossy_bag()).material;

    let mut cache = ExportCache::new();
    let out = lux::export_all([&seat, &trim], &mut cache);
    let seat_at = out.text.find("MakeNamedMaterial \"chair01:Seat\"");
    let trim_at = out.text.find("MakeNamedMaterial \"chair01:Trim\"");
    assert!(seat_at.is_some() && trim_at.is_some());
    assert!(seat_at < trim_at);
}

#[test]
fn test_textures_are_defined_before_the_material_statement() {
    let mat = converted(&fixtures::textured_bag("wood.jpg"));
    let mut cache = ExportCache::new();
    let text = lux::export_material(&mat, &mut cache).text;
    let tex_at = text.find("Texture \"chair01:Seat:DiffTex\"");
    let mat_at = text.find("MakeNamedMaterial \"chair01:Seat\"");
    assert!(tex_at.is_some() && mat_at.is_some());
    assert!(tex_at < mat_at);
}
