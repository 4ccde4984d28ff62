//! Matforge Canonical Material IR
//!
//! This crate defines the renderer-independent intermediate representation
//! used by the matforge conversion pipeline:
//!
//! - **Texture nodes**: one shading-graph element (an image map, a constant,
//!   a combinator, a procedural noise, ...), owned by a per-material arena.
//! - **Node pool**: the arena plus a name index. Node inputs reference arena
//!   indices that must already exist at insertion time, so the graph is a DAG
//!   by construction.
//! - **Materials**: a closed sum of material kinds with per-kind parameters,
//!   a channel map binding channel names to graph roots, and shared value
//!   structs for the alpha channel and surface modifiers.
//! - **Fingerprints**: content-addressable shader ids used by the preset
//!   override system.
//! - **Dependency resolver**: the topological node ordering consumed by the
//!   backend exporters.
//!
//! # Example
//!
//! ```
//! use matforge_ir::{Material, MaterialKind, Channel, NodePool, TextureNode};
//! use matforge_ir::node::{NodeKind, ValueDomain};
//! use matforge_ir::color::Rgb;
//!
//! let mut pool = NodePool::new();
//! let kd = pool.insert(TextureNode::new(
//!     "seat_diffuse",
//!     ValueDomain::Color,
//!     NodeKind::Constant { color: Rgb::new(0.5, 0.2, 0.2) },
//! ));
//! let mut mat = Material::new("Seat", "chair01", "chair01.obj", MaterialKind::default_matte());
//! mat.pool = pool;
//! mat.set_channel(Channel::Diffuse, "seat_diffuse");
//! assert_eq!(mat.channel_node(Channel::Diffuse), Some(kd));
//! ```

pub mod color;
pub mod deps;
pub mod error;
pub mod fingerprint;
pub mod material;
pub mod node;
pub mod pool;

pub use color::Rgb;
pub use deps::dependency_order;
pub use error::{Diagnostic, DiagnosticCode};
pub use fingerprint::{default_fingerprint, shader_fingerprint, texture_file_name};
pub use material::{
    AlphaChannel, BumpMap, Channel, ClothPreset, DisplacementMap, GlassKind, Material,
    MaterialKind, MetalPreset, SurfaceModifiers,
};
pub use node::{MathOp, NodeId, NodeInput, NodeKind, NoiseBasis, NoiseKind, TextureNode, ValueDomain};
pub use pool::NodePool;
