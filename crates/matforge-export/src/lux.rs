//! Lux statement-format backend.
//!
//! Emits one `Texture` statement per node in dependency order, followed by
//! the `MakeNamedMaterial` statement(s) for the material itself. Every
//! material kind has a native mapping here, so nothing degrades.
//!
//! Node names are qualified as `object:material:node` so textures from
//! different materials never collide; image maps sharing file and sampling
//! parameters are deduplicated across materials through the run cache.

use std::collections::HashMap;

use log::debug;

use matforge_ir::{dependency_order, Channel, Diagnostic, Material, NodeId};

use crate::cache::ExportCache;
use crate::ExportOutput;

mod material;
mod texture;

/// Exports one material: its texture statements, derived bump/displacement
/// and alpha textures, and its material statement(s).
pub fn export_material(mat: &Material, cache: &mut ExportCache) -> ExportOutput {
    let (order, diags) = dependency_order(mat);
    debug!("exporting {} ({} nodes)", mat.unique_name(), order.len());
    let mut em = Emitter {
        mat,
        unique: mat.unique_name(),
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

/// Exports a whole run: every material in order, sharing one emission
/// cache so common textures are defined exactly once.
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

/// State carried through the emission of one material.
struct Emitter<'a> {
    mat: &'a Material,
    unique: String,
    cache: &'a mut ExportCache,
    /// Emitted (possibly cache-shared) name of every visited node.
    names: HashMap<NodeId, String>,
    out: String,
    diags: Vec<Diagnostic>,
}

impl Emitter<'_> {
    fn qualified(&self, node_name: &str) -> String {
        format!("{}:{}", self.unique, node_name)
    }

    /// The name this node was emitted under in the current run.
    fn node_ref(&self, id: NodeId) -> String {
        match self.names.get(&id) {
            Some(name) => name.clone(),
            // Only reachable for nodes outside the dependency order, which
            // the resolver has already diagnosed.
            None => self.qualified(&self.mat.pool.get(id).name),
        }
    }

    /// Reference to the node bound to a channel, if the binding resolves.
    fn channel_ref(&self, channel: Channel) -> Option<String> {
        let id = self.mat.channel_node(channel)?;
        Some(self.node_ref(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matforge_ir::{
        AlphaChannel, BumpMap, MaterialKind, NodeKind, Rgb, TextureNode, ValueDomain,
    };
    use pretty_assertions::assert_eq;

    fn constant(name: &str, color: Rgb) -> TextureNode {
        TextureNode::new(name, ValueDomain::Color, NodeKind::Constant { color })
    }

    fn image(name: &str, file: &str, normal_map: bool) -> TextureNode {
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
                normal_map,
            },
        )
    }

    fn matte(name: &str) -> Material {
        let mut mat = Material::new(name, "Prop", "prop.obj", MaterialKind::default_matte());
        mat.pool.insert(constant("kd", Rgb::MEDIUM_GRAY));
        mat.set_channel(Channel::Diffuse, "kd");
        mat
    }

    #[test]
    fn test_matte_statement_shape() {
        let mat = matte("Seat");
        let mut cache = ExportCache::new();
        let out = export_material(&mat, &mut cache);
        assert!(out.diagnostics.is_empty());
        assert!(out
            .text
            .contains("Texture \"Prop:Seat:kd\" \"color\" \"constant\" \"color value\" [0.5000 0.5000 0.5000]"));
        assert!(out.text.contains(
            "MakeNamedMaterial \"Prop:Seat\" \"string type\" [\"matte\"] \"texture Kd\" [\"Prop:Seat:kd\"] \"float sigma\" [0.4]"
        ));
    }

    #[test]
    fn test_textures_precede_references() {
        let mat = matte("Seat");
        let mut cache = ExportCache::new();
        let out = export_material(&mat, &mut cache);
        let tex_pos = out.text.find("Texture \"Prop:Seat:kd\"").unwrap();
        let use_pos = out.text.find("\"texture Kd\"").unwrap();
        assert!(tex_pos < use_pos);
    }

    #[test]
    fn test_shared_image_map_emitted_once_per_run() {
        let mut a = Material::new("Face", "Fig", "fig.obj", MaterialKind::default_matte());
        a.pool.insert(image("diffMap", "skin.jpg", false));
        a.set_channel(Channel::Diffuse, "diffMap");
        let mut b = Material::new("Lips", "Fig", "fig.obj", MaterialKind::default_matte());
        b.pool.insert(image("colorMap", "skin.jpg", false));
        b.set_channel(Channel::Diffuse, "colorMap");

        let mut cache = ExportCache::new();
        let out = export_all([&a, &b], &mut cache);
        assert_eq!(out.text.matches("\"string filename\" [\"skin.jpg\"]").count(), 1);
        // the second material references the first emission
        assert!(out.text.contains(
            "MakeNamedMaterial \"Fig:Lips\" \"string type\" [\"matte\"] \"texture Kd\" [\"Fig:Face:diffMap\"]"
        ));
    }

    #[test]
    fn test_alpha_blend_emits_null_and_base() {
        let mut mat = matte("Veil");
        mat.alpha = AlphaChannel {
            map: None,
            strength: 0.5,
        };
        let mut cache = ExportCache::new();
        let out = export_material(&mat, &mut cache);
        assert!(out
            .text
            .contains("MakeNamedMaterial \"Prop:Veil_Null\" \"string type\" [\"null\"]"));
        assert!(out
            .text
            .contains("MakeNamedMaterial \"Prop:Veil_BaseMat\" \"string type\" [\"matte\"]"));
        assert!(out.text.contains("\"float amount\" [0.5]"));
        assert!(out
            .text
            .contains("\"string namedmaterial2\" [\"Prop:Veil_BaseMat\"]"));
    }

    #[test]
    fn test_full_alpha_matches_disabled_alpha() {
        let mat = matte("Seat");
        let mut with_default = matte("Seat");
        with_default.alpha = AlphaChannel {
            map: None,
            strength: 1.0,
        };
        let mut c1 = ExportCache::new();
        let mut c2 = ExportCache::new();
        assert_eq!(
            export_material(&mat, &mut c1).text,
            export_material(&with_default, &mut c2).text
        );
    }

    #[test]
    fn test_bump_clamp_chain_names() {
        let mut mat = matte("Wall");
        mat.pool
            .insert(image("bumpMap", "bricks_b.png", false));
        mat.modifiers.bump = Some(BumpMap {
            map: "bumpMap".into(),
            strength: 0.66,
            positive: 0.001,
            negative: -0.001,
        });
        let mut cache = ExportCache::new();
        let out = export_material(&mat, &mut cache);
        assert!(out.text.contains("Texture \"BM_Prop:Wall_limits\" \"float\" \"mix\""));
        assert!(out.text.contains("Texture \"Prop:Wall_bumpmap\" \"float\" \"scale\""));
        assert!(out.text.contains("\"texture bumpmap\" [\"Prop:Wall_bumpmap\"]"));
        // the color map got a float variant for the numeric slot
        assert!(out.text.contains("Texture \"Prop:Wall:bumpMap_float\" \"float\" \"imagemap\""));
    }

    #[test]
    fn test_normal_map_bump_uses_amplitude_scale() {
        let mut mat = matte("Wall");
        mat.pool.insert(image("nm", "wall_n.png", true));
        mat.modifiers.bump = Some(BumpMap {
            map: "nm".into(),
            strength: 0.66,
            positive: 0.001,
            negative: -0.001,
        });
        let mut cache = ExportCache::new();
        let out = export_material(&mat, &mut cache);
        assert!(out.text.contains("Texture \"Prop:Wall_nmAmplitude\" \"float\" \"scale\""));
        assert!(!out.text.contains("BM_Prop:Wall_limits"));
    }

    #[test]
    fn test_glossy_roughness_arithmetic() {
        let mut mat = matte("Chrome");
        mat.pool.insert(constant("ks", Rgb::BLACK));
        mat.set_channel(Channel::Specular, "ks");
        mat.kind = MaterialKind::Glossy {
            u_glossiness: 10000,
            v_glossiness: 8000,
            top_coat: false,
            translucent: false,
        };
        let mut cache = ExportCache::new();
        let out = export_material(&mat, &mut cache);
        // 10000 steps down to 9999 to avoid a degenerate zero roughness
        assert!(out.text.contains("\"float uroughness\" [0.0001]"));
        assert!(out.text.contains("\"float vroughness\" [0.2]"));
    }

    #[test]
    fn test_light_material_emits_area_light() {
        let mut mat = matte("Panel");
        mat.kind = MaterialKind::Light {
            gain: 2.0,
            use_alpha: false,
        };
        let mut cache = ExportCache::new();
        let out = export_material(&mat, &mut cache);
        assert!(out
            .text
            .contains("MakeNamedMaterial \"Prop:Panel\" \"string type\" [\"null\"]"));
        assert!(out.text.contains("AreaLightSource \"area\" \"float gain\" [2]"));
    }

    #[test]
    fn test_hidden_material_exports_null() {
        let mut mat = matte("ReL_Back");
        mat.visible_in_render = false;
        let mut cache = ExportCache::new();
        let out = export_material(&mat, &mut cache);
        assert!(out
            .text
            .contains("MakeNamedMaterial \"Prop:ReL_Back\" \"string type\" [\"null\"]"));
        assert!(!out.text.contains("\"matte\""));
    }

    #[test]
    fn test_repeated_export_is_byte_identical() {
        let mat = matte("Seat");
        let mut c1 = ExportCache::new();
        let mut c2 = ExportCache::new();
        assert_eq!(
            export_material(&mat, &mut c1).text,
            export_material(&mat, &mut c2).text
        );
    }
}
