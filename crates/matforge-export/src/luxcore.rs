//! LuxCore property-list backend.
//!
//! Emits `scene.textures.<name>.<key> = <value>` and
//! `scene.materials.<name>.<key> = <value>` lines. Kinds with no native
//! LuxCore mapping degrade to the closest supported one: Skin renders as
//! glossy, Velvet and Cloth as matte, Water as glass; each degrade is
//! surfaced as a warning diagnostic.
//!
//! Property path segments cannot carry the `object:material:node` separator,
//! so every emitted name goes through [`prop_name`] first.

use std::collections::HashMap;

use matforge_ir::{dependency_order, Channel, Diagnostic, Material, NodeId};

use crate::cache::ExportCache;
use crate::ExportOutput;

mod material;
mod texture;

/// Exports one material as LuxCore property lines.
pub fn export_material(mat: &Material, cache: &mut ExportCache) -> ExportOutput {
    let (order, diags) = dependency_order(mat);
    let mut em = Emitter {
        mat,
        unique: prop_name(&mat.unique_name()),
        cache,
        names: HashMap::new(),
        out: String::new(),
        diags,
    };
    for id in order {
        em.emit_node(id);
    }
    em.emit_material();
    ExportOutput {
        text: em.out,
        diagnostics: em.diags,
    }
}

/// Exports a whole run through one shared emission cache.
pub fn export_all<'a>(
    materials: impl IntoIterator<Item = &'a Material>,
    cache: &mut ExportCache,
) -> ExportOutput {
    let mut text = String::new();
    let mut diagnostics = Vec::new();
    for mat in materials {
        let out = export_material(mat, cache);
        text.push_str(&out.text);
        diagnostics.extend(out.diagnostics);
    }
    ExportOutput { text, diagnostics }
}

/// Rewrites a name into a legal property path segment.
pub fn prop_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' => c,
            _ => '_',
        })
        .collect()
}

struct Emitter<'a> {
    mat: &'a Material,
    unique: String,
    cache: &'a mut ExportCache,
    names: HashMap<NodeId, String>,
    out: String,
    diags: Vec<Diagnostic>,
}

impl Emitter<'_> {
    fn qualified(&self, node_name: &str) -> String {
        format!("{}_{}", self.unique, prop_name(node_name))
    }

    fn node_ref(&self, id: NodeId) -> String {
        match self.names.get(&id) {
            Some(name) => name.clone(),
            None => self.qualified(&self.mat.pool.get(id).name),
        }
    }

    fn channel_ref(&self, channel: Channel) -> Option<String> {
        let id = self.mat.channel_node(channel)?;
        Some(self.node_ref(id))
    }

    fn tex_line(&mut self, name: &str, key: &str, value: &str) {
        self.out
            .push_str(&format!("scene.textures.{name}.{key} = {value}\n"));
    }

    fn mat_line(&mut self, name: &str, key: &str, value: &str) {
        self.out
            .push_str(&format!("scene.materials.{name}.{key} = {value}\n"));
    }
}
