//! Dependency-ordered node listing.
//!
//! Backends emit one named texture per node and may only reference nodes
//! emitted earlier in the same stream, so every export starts from the
//! postorder this module computes.

use std::collections::HashSet;

use crate::error::{Diagnostic, DiagnosticCode};
use crate::material::{Channel, Material};
use crate::node::NodeId;

/// All channels, in emission order.
const CHANNEL_ORDER: [Channel; 6] = [
    Channel::Diffuse,
    Channel::Specular,
    Channel::Glossiness,
    Channel::Coat,
    Channel::Translucence,
    Channel::Ambient,
];

/// Lists every node reachable from the material's channel bindings, alpha
/// map, and surface modifiers, in an order where each node appears after
/// everything it references. Shared nodes appear exactly once.
///
/// A channel bound to a name missing from the pool yields an unresolved
/// reference diagnostic instead of failing the whole listing.
pub fn dependency_order(material: &Material) -> (Vec<NodeId>, Vec<Diagnostic>) {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut diags = Vec::new();

    let mut visit_root = |name: &str, order: &mut Vec<NodeId>, diags: &mut Vec<Diagnostic>| {
        match material.pool.lookup(name) {
            Some(id) => postorder(material, id, &mut visited, order),
            None => diags.push(Diagnostic::for_material(
                DiagnosticCode::UnresolvedNodeReference,
                format!("channel references unknown node {name:?}"),
                material.unique_name(),
            )),
        }
    };

    for channel in CHANNEL_ORDER {
        if let Some(name) = material.channels.get(&channel) {
            visit_root(name, &mut order, &mut diags);
        }
    }
    if let Some(name) = &material.alpha.map {
        visit_root(name, &mut order, &mut diags);
    }
    if let Some(bump) = &material.modifiers.bump {
        visit_root(&bump.map, &mut order, &mut diags);
    }
    if let Some(disp) = &material.modifiers.displacement {
        visit_root(&disp.map, &mut order, &mut diags);
    }

    (order, diags)
}

fn postorder(
    material: &Material,
    id: NodeId,
    visited: &mut HashSet<NodeId>,
    order: &mut Vec<NodeId>,
) {
    if !visited.insert(id) {
        return;
    }
    for dep in material.pool.get(id).references() {
        postorder(material, dep, visited, order);
    }
    order.push(id);
}
