//! Matforge conversion front end
//!
//! Builds canonical [`matforge_ir`] materials from the raw, string-keyed
//! shader bags produced by host-application adapters:
//!
//! - **Bag adapter**: the only module that reads raw [`serde_json::Value`]
//!   data; everything missing or mistyped degrades to neutral defaults.
//! - **Node converter**: turns the bag's flat node table into pool nodes
//!   with structural sharing and per-channel private copies.
//! - **Classifier**: ordered heuristics deciding the material kind, after
//!   explicit hints and preset overrides have had their say.
//! - **Preset overrides**: content-addressable lookup of curated shader
//!   records, merged into the converted material under explicit policies.
//!
//! # Example
//!
//! ```
//! use matforge_convert::{convert_material, InMemoryPresetStore, ObjectContext};
//! use matforge_ir::MaterialKind;
//! use serde_json::json;
//!
//! let raw = json!({
//!     "diffuse": { "color": [0.6, 0.4, 0.3], "map": "WoodTex" },
//!     "nodes": { "WoodTex": { "type": 170, "fileName": "wood.jpg" } }
//! });
//! let object = ObjectContext::new("chair01", "chair01.obj");
//! let store = InMemoryPresetStore::new();
//! let out = convert_material(&object, "Seat", &raw, &store);
//! assert!(out.diagnostics.is_empty());
//! assert!(matches!(out.material.kind, MaterialKind::Matte { .. }));
//! ```

pub mod bag;
pub mod classify;
pub mod convert;
pub mod nodes;
pub mod preset;

pub use bag::ShaderBag;
pub use classify::{Classifier, SurfaceTraits};
pub use convert::{convert_material, convert_material_as, Conversion, ObjectContext};
pub use nodes::NodeConverter;
pub use preset::{
    apply_preset, InMemoryPresetStore, MergePolicy, PresetError, PresetRecord, PresetStore,
};
