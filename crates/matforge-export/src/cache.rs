//! Per-run texture emission cache.
//!
//! A node is emitted into the output text once per export run; every later
//! occurrence is referenced by the name recorded here. Image maps are keyed
//! by their content (file plus sampling parameters), so two materials that
//! read the same bitmap with the same settings share one emitted texture
//! even though each owns a private copy of the node. Everything else is
//! keyed by its material-qualified name, which makes repeated export of the
//! same material idempotent without ever colliding across materials.
//!
//! One cache serves exactly one backend for one run; the recorded names are
//! backend-formatted and must not leak into another backend's output.

use std::collections::HashMap;

use matforge_ir::{NodeKind, TextureNode, ValueDomain};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    /// Content identity of an image map. Floats are compared bitwise; the
    /// converter never produces NaN parameters.
    Image {
        file: String,
        gain: u64,
        gamma: u64,
        u_tile: u64,
        v_tile: u64,
        u_offset: u64,
        v_offset: u64,
        normal_map: bool,
        numeric: bool,
    },
    /// Material-qualified name of any other node, or the name of a derived
    /// texture (float variant, clamp, amount wrapper).
    Named(String),
}

fn key_for(material_unique: &str, node: &TextureNode) -> CacheKey {
    match &node.kind {
        NodeKind::ImageMap {
            file,
            gain,
            gamma,
            u_tile,
            v_tile,
            u_offset,
            v_offset,
            normal_map,
        } => CacheKey::Image {
            file: file.clone(),
            gain: gain.to_bits(),
            gamma: gamma.to_bits(),
            u_tile: u_tile.to_bits(),
            v_tile: v_tile.to_bits(),
            u_offset: u_offset.to_bits(),
            v_offset: v_offset.to_bits(),
            normal_map: *normal_map,
            numeric: node.domain == ValueDomain::Numeric,
        },
        _ => CacheKey::Named(format!("{material_unique}:{}", node.name)),
    }
}

/// Names already emitted in the current export run.
#[derive(Debug, Default)]
pub struct ExportCache {
    emitted: HashMap<CacheKey, String>,
}

impl ExportCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets every recorded emission. Call between runs, never between
    /// materials of the same run.
    pub fn clear(&mut self) {
        self.emitted.clear();
    }

    /// The name this node was already emitted under, if any.
    pub fn lookup(&self, material_unique: &str, node: &TextureNode) -> Option<&str> {
        self.emitted
            .get(&key_for(material_unique, node))
            .map(String::as_str)
    }

    /// Records that `node` was emitted under `emitted_name`.
    pub fn record(&mut self, material_unique: &str, node: &TextureNode, emitted_name: String) {
        self.emitted
            .entry(key_for(material_unique, node))
            .or_insert(emitted_name);
    }

    /// Whether a derived texture was already emitted under this exact name.
    pub fn contains_name(&self, name: &str) -> bool {
        self.emitted.contains_key(&CacheKey::Named(name.to_string()))
    }

    /// Records a derived texture emitted under its own name.
    pub fn record_name(&mut self, name: &str) {
        self.emitted
            .entry(CacheKey::Named(name.to_string()))
            .or_insert_with(|| name.to_string());
    }

    pub fn len(&self) -> usize {
        self.emitted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emitted.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matforge_ir::Rgb;
    use pretty_assertions::assert_eq;

    fn image(name: &str, file: &str) -> TextureNode {
        TextureNode::new(
            name,
            ValueDomain::Color,
            NodeKind::ImageMap {
                file: file.into(),
                gain: 1.0,
                gamma: 2.2,
                u_tile: 1.0,
                v_tile: 1.0,
                u_offset: 0.0,
                v_offset: 0.0,
                normal_map: false,
            },
        )
    }

    #[test]
    fn test_image_maps_share_by_content_across_materials() {
        let mut cache = ExportCache::new();
        let a = image("diffMap", "skin.jpg");
        let b = image("colorMap", "skin.jpg");
        cache.record("Fig:Face", &a, "Fig:Face:diffMap".into());
        assert_eq!(cache.lookup("Fig:Lips", &b), Some("Fig:Face:diffMap"));
    }

    #[test]
    fn test_image_maps_with_different_tiling_do_not_share() {
        let mut cache = ExportCache::new();
        let a = image("diffMap", "skin.jpg");
        let mut b = image("diffMap", "skin.jpg");
        if let NodeKind::ImageMap { u_tile, .. } = &mut b.kind {
            *u_tile = 2.0;
        }
        cache.record("Fig:Face", &a, "Fig:Face:diffMap".into());
        assert_eq!(cache.lookup("Fig:Lips", &b), None);
    }

    #[test]
    fn test_other_nodes_are_material_scoped() {
        let mut cache = ExportCache::new();
        let c = TextureNode::new(
            "kd",
            ValueDomain::Color,
            NodeKind::Constant { color: Rgb::WHITE },
        );
        cache.record("Fig:Face", &c, "Fig:Face:kd".into());
        assert_eq!(cache.lookup("Fig:Face", &c), Some("Fig:Face:kd"));
        assert_eq!(cache.lookup("Fig:Lips", &c), None);
    }

    #[test]
    fn test_derived_names() {
        let mut cache = ExportCache::new();
        assert!(!cache.contains_name("Fig:Face:bump_float"));
        cache.record_name("Fig:Face:bump_float");
        assert!(cache.contains_name("Fig:Face:bump_float"));
    }
}
