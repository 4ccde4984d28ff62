//! Shared raw shader bags and conversion helpers.
//!
//! The bags mirror what host adapters actually hand over: nested
//! string-keyed maps with a flat `nodes` table, sloppy about optional
//! fields.

use matforge_convert::{convert_material, Conversion, InMemoryPresetStore, ObjectContext, PresetStore};
use serde_json::{json, Value};

/// Standard test object.
pub fn object(id: &str) -> ObjectContext {
    ObjectContext::new(id, format!("{id}.obj"))
}

/// Converts against an empty preset store.
pub fn convert(object: &ObjectContext, material_name: &str, raw: &Value) -> Conversion {
    convert_material(object, material_name, raw, &InMemoryPresetStore::new())
}

pub fn convert_with_store(
    object: &ObjectContext,
    material_name: &str,
    raw: &Value,
    store: &dyn PresetStore,
) -> Conversion {
    convert_material(object, material_name, raw, store)
}

/// A bag with only a diffuse color, the simplest convertible material.
pub fn plain_bag() -> Value {
    json!({
        "source": "poser",
        "diffuse": { "color": [0.6, 0.4, 0.3] }
    })
}

/// Diffuse driven by an image map node.
pub fn textured_bag(file: &str) -> Value {
    json!({
        "source": "poser",
        "diffuse": { "color": [1.0, 1.0, 1.0], "map": "DiffTex" },
        "nodes": {
            "DiffTex": { "type": 170, "fileName": file, "gamma": 2.2 }
        }
    })
}

/// Specular evidence plus a low roughness, which classifies as glossy.
pub fn glossy_bag() -> Value {
    json!({
        "source": "poser",
        "uRoughness": 0.2,
        "diffuse": { "color": [0.6, 0.4, 0.3] },
        "specular": { "color": [0.8, 0.8, 0.8] }
    })
}

/// A textured diffuse with a partially transparent alpha map.
pub fn alpha_bag(strength: f64) -> Value {
    json!({
        "source": "poser",
        "diffuse": { "color": [1.0, 1.0, 1.0], "map": "DiffTex" },
        "alpha": { "strength": strength, "map": "AlphaTex" },
        "nodes": {
            "DiffTex": { "type": 170, "fileName": "lace.jpg" },
            "AlphaTex": { "type": 170, "fileName": "lace_alpha.jpg" }
        }
    })
}

/// A diffuse plus a clamped bump map.
pub fn bump_bag() -> Value {
    json!({
        "source": "poser",
        "diffuse": { "color": [0.5, 0.5, 0.5] },
        "bump": {
            "map": "BumpTex",
            "strength": 0.8,
            "pos": 0.002,
            "neg": -0.002
        },
        "nodes": {
            "BumpTex": { "type": 170, "fileName": "brick_bump.jpg" }
        }
    })
}
