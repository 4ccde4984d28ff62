//! Matforge Render Backends
//!
//! Turns converted [`matforge_ir::Material`]s into renderer input: the Lux
//! backend emits `Texture`/`MakeNamedMaterial` statement text, the LuxCore
//! backend emits `scene.textures.*`/`scene.materials.*` property lines.
//!
//! Both backends share one rule: a node is emitted at most once per export
//! run. The [`ExportCache`] carries that state across materials, so two
//! materials using the same bitmap with the same tiling reference a single
//! emitted texture. Create one cache per backend per run and drop it when
//! the run's text has been written out.
//!
//! # Example
//!
//! ```
//! use matforge_export::{lux, ExportCache};
//! use matforge_ir::{Channel, Material, MaterialKind, NodeKind, Rgb, TextureNode, ValueDomain};
//!
//! let mut mat = Material::new("Seat", "chair01", "chair01.obj", MaterialKind::default_matte());
//! mat.pool.insert(TextureNode::new(
//!     "kd",
//!     ValueDomain::Color,
//!     NodeKind::Constant { color: Rgb::gray(0.5) },
//! ));
//! mat.set_channel(Channel::Diffuse, "kd");
//!
//! let mut cache = ExportCache::new();
//! let out = lux::export_material(&mat, &mut cache);
//! assert!(out.text.contains("MakeNamedMaterial \"chair01:Seat\""));
//! ```

use matforge_ir::Diagnostic;

pub mod cache;
mod fmt;
pub mod lux;
pub mod luxcore;

pub use cache::ExportCache;

/// Text produced by a backend plus the recoverable problems hit along the
/// way. Diagnostics never abort an export; the text is always usable.
#[derive(Debug, Clone, Default)]
pub struct ExportOutput {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}
