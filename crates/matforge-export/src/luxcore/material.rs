//! Material property emission for the LuxCore backend, including the
//! degrade table for kinds LuxCore has no native mapping for.

use log::warn;

use matforge_ir::material::sanitize_name;
use matforge_ir::{
    Channel, Diagnostic, DiagnosticCode, GlassKind, MaterialKind, MetalPreset, NodeId, NodePool,
    Rgb,
};

use super::{prop_name, Emitter};
use crate::fmt::{col, num};

fn contains_normal_map(pool: &NodePool, id: NodeId) -> bool {
    let node = pool.get(id);
    node.is_normal_map() || node.references().into_iter().any(|d| contains_normal_map(pool, d))
}

fn metal_reflectance(preset: MetalPreset) -> Rgb {
    match preset {
        MetalPreset::Aluminum => Rgb::new(0.913, 0.921, 0.925),
        MetalPreset::Copper => Rgb::new(0.955, 0.638, 0.538),
        MetalPreset::Gold => Rgb::new(1.0, 0.766, 0.336),
        MetalPreset::Nickel => Rgb::new(0.66, 0.609, 0.526),
        MetalPreset::Silver => Rgb::new(0.972, 0.96, 0.915),
    }
}

impl Emitter<'_> {
    pub(super) fn emit_material(&mut self) {
        let unique = self.unique.clone();
        if !self.mat.visible_in_render {
            self.mat_line(&unique, "type", "null");
            return;
        }
        match self.mat.kind.clone() {
            MaterialKind::Null => {
                self.mat_line(&unique, "type", "null");
                return;
            }
            MaterialKind::Light { gain, .. } => {
                self.emit_light(gain);
                return;
            }
            MaterialKind::Mix {
                material1,
                material2,
                amount,
            } => {
                self.emit_material_mix(&material1, &material2, amount);
                return;
            }
            _ => {}
        }

        let alpha_active = self.mat.alpha.is_active();
        let base_name = if alpha_active {
            format!("{unique}_BaseMat")
        } else {
            unique.clone()
        };
        self.base_material_properties(&base_name);
        if alpha_active {
            self.emit_alpha_blend();
        }
        if self.mat.emits_light {
            self.emit_emission(&base_name);
        }
    }

    fn base_material_properties(&mut self, mat_name: &str) {
        let mat_name = mat_name.to_string();
        self.emit_displacement_textures();
        match self.mat.kind.clone() {
            MaterialKind::Matte { translucent, .. } => {
                if translucent {
                    self.mat_line(&mat_name, "type", "mattetranslucent");
                    let kr = self.channel_value(Channel::Diffuse, Rgb::MEDIUM_GRAY);
                    self.mat_line(&mat_name, "kr", &kr);
                    let kt = self.channel_value(Channel::Translucence, Rgb::PURE_WHITE);
                    self.mat_line(&mat_name, "kt", &kt);
                } else {
                    self.mat_line(&mat_name, "type", "matte");
                    let kd = self.channel_value(Channel::Diffuse, Rgb::MEDIUM_GRAY);
                    self.mat_line(&mat_name, "kd", &kd);
                }
            }
            MaterialKind::Glossy {
                u_glossiness,
                v_glossiness,
                top_coat,
                translucent,
            } => {
                if translucent {
                    self.mat_line(&mat_name, "type", "glossytranslucent");
                    let kt = self.channel_value(Channel::Translucence, Rgb::PURE_WHITE);
                    self.mat_line(&mat_name, "kt", &kt);
                } else {
                    self.mat_line(&mat_name, "type", "glossy2");
                }
                self.glossy_properties(&mat_name, u_glossiness, v_glossiness, top_coat);
            }
            MaterialKind::Skin {
                u_glossiness,
                v_glossiness,
                top_coat,
                ..
            } => {
                self.degrade("skin", "glossy2");
                self.mat_line(&mat_name, "type", "glossy2");
                self.glossy_properties(&mat_name, u_glossiness, v_glossiness, top_coat);
            }
            MaterialKind::Glass { glass_kind, ior } => {
                match glass_kind {
                    GlassKind::Standard => self.mat_line(&mat_name, "type", "glass"),
                    GlassKind::Architectural => self.mat_line(&mat_name, "type", "archglass"),
                    GlassKind::Frosted => {
                        self.mat_line(&mat_name, "type", "roughglass");
                        self.mat_line(&mat_name, "uroughness", "0.5");
                        self.mat_line(&mat_name, "vroughness", "0.5");
                    }
                }
                let kr = self.channel_value(Channel::Specular, Rgb::PURE_WHITE);
                self.mat_line(&mat_name, "kr", &kr);
                let kt = self.channel_value(Channel::Diffuse, Rgb::PURE_WHITE);
                self.mat_line(&mat_name, "kt", &kt);
                self.mat_line(&mat_name, "interiorior", &num(ior));
            }
            MaterialKind::Metal {
                preset,
                h_polish,
                v_polish,
            } => {
                let fresnel = format!("{}_fresnel", self.unique);
                if !self.cache.contains_name(&fresnel) {
                    self.tex_line(&fresnel, "type", "fresnelcolor");
                    self.tex_line(&fresnel, "kr", &col(metal_reflectance(preset)));
                    self.cache.record_name(&fresnel);
                }
                // Polish 0-10000 maps onto roughness; exactly zero roughness
                // renders black, hence the floor.
                let rough = |polish: i32| {
                    let r = 1.0 - f64::from(polish) / 10000.0;
                    if r < 0.0005 {
                        0.0008
                    } else {
                        r
                    }
                };
                self.mat_line(&mat_name, "type", "metal2");
                self.mat_line(&mat_name, "fresnel", &format!("\"{fresnel}\""));
                self.mat_line(&mat_name, "uroughness", &num(rough(h_polish)));
                self.mat_line(&mat_name, "vroughness", &num(rough(v_polish)));
            }
            MaterialKind::Mirror => {
                self.mat_line(&mat_name, "type", "mirror");
                let kr = self.channel_value(Channel::Diffuse, Rgb::PURE_WHITE);
                self.mat_line(&mat_name, "kr", &kr);
            }
            MaterialKind::Velvet { .. } => {
                self.degrade("velvet", "matte");
                self.mat_line(&mat_name, "type", "matte");
                let kd = self.channel_value(Channel::Diffuse, Rgb::MEDIUM_GRAY);
                self.mat_line(&mat_name, "kd", &kd);
            }
            MaterialKind::Water { .. } => {
                self.degrade("water", "glass");
                self.mat_line(&mat_name, "type", "glass");
                self.mat_line(&mat_name, "interiorior", "1.33");
            }
            MaterialKind::Cloth { .. } => {
                self.degrade("cloth", "matte");
                self.mat_line(&mat_name, "type", "matte");
                let kd = self.channel_value(Channel::Diffuse, Rgb::MEDIUM_GRAY);
                self.mat_line(&mat_name, "kd", &kd);
            }
            // Dispatched before base emission; kept to satisfy the closed
            // sum without a panic path.
            MaterialKind::Light { .. } | MaterialKind::Null | MaterialKind::Mix { .. } => {
                self.mat_line(&mat_name, "type", "null");
            }
        }
        self.emit_bump(&mat_name);
    }

    fn degrade(&mut self, from: &str, to: &str) {
        warn!("{}: {from} has no LuxCore mapping, exporting as {to}", self.mat.name);
        self.diags.push(Diagnostic::for_material(
            DiagnosticCode::UnsupportedKindForBackend,
            format!("{from} is not supported by LuxCore, exporting as {to}"),
            self.mat.name.clone(),
        ));
    }

    /// Kd, Ks, and the u/v roughness inverted from the 0-10000 glossiness
    /// scale; a glossiness map turns the roughness into driven mix textures.
    fn glossy_properties(
        &mut self,
        mat_name: &str,
        u_glossiness: i32,
        v_glossiness: i32,
        top_coat: bool,
    ) {
        let kd = self.channel_value(Channel::Diffuse, Rgb::MEDIUM_GRAY);
        self.mat_line(mat_name, "kd", &kd);
        let ks = self.channel_value(Channel::Specular, Rgb::new(0.1, 0.1, 0.1));
        self.mat_line(mat_name, "ks", &ks);
        if top_coat {
            if let Some(ka) = self.channel_ref(Channel::Coat) {
                self.mat_line(mat_name, "ka", &format!("\"{ka}\""));
                self.mat_line(mat_name, "d", "0.5");
            }
        }
        // 10000 would round to a degenerate zero roughness.
        let clamp = |g: i32| if g >= 10000 { 9999 } else { g };
        let u = (10000.0 - f64::from(clamp(u_glossiness))) / 10000.0;
        let v = (10000.0 - f64::from(clamp(v_glossiness))) / 10000.0;
        let Some(kg) = self.channel_ref(Channel::Glossiness) else {
            self.mat_line(mat_name, "uroughness", &num(u));
            self.mat_line(mat_name, "vroughness", &num(v));
            return;
        };
        // Map pixels drive the roughness between fully rough (black) and
        // the configured gloss (white); the mix flips the scale.
        let u_name = format!("{}_uGloss", self.unique);
        if !self.cache.contains_name(&u_name) {
            self.tex_line(&u_name, "type", "mix");
            self.tex_line(&u_name, "texture1", "1.0");
            self.tex_line(&u_name, "texture2", &num(u));
            self.tex_line(&u_name, "amount", &format!("\"{kg}\""));
            self.cache.record_name(&u_name);
        }
        let v_name = if u == v {
            u_name.clone()
        } else {
            let v_name = format!("{}_vGloss", self.unique);
            if !self.cache.contains_name(&v_name) {
                self.tex_line(&v_name, "type", "mix");
                self.tex_line(&v_name, "texture1", "1.0");
                self.tex_line(&v_name, "texture2", &num(v));
                self.tex_line(&v_name, "amount", &format!("\"{kg}\""));
                self.cache.record_name(&v_name);
            }
            v_name
        };
        self.mat_line(mat_name, "uroughness", &format!("\"{u_name}\""));
        self.mat_line(mat_name, "vroughness", &format!("\"{v_name}\""));
    }

    /// A quoted texture reference for the channel, or an inline fallback
    /// color.
    fn channel_value(&self, channel: Channel, fallback: Rgb) -> String {
        match self.channel_ref(channel) {
            Some(t) => format!("\"{t}\""),
            None => col(fallback),
        }
    }

    fn emit_bump(&mut self, mat_name: &str) {
        let Some(bump) = self.mat.modifiers.bump.clone() else {
            return;
        };
        let Some(id) = self.mat.pool.lookup(&bump.map) else {
            // Already diagnosed by the dependency resolver.
            return;
        };
        let base = self.node_ref(id);
        if contains_normal_map(&self.mat.pool, id) {
            if bump.strength == 1.0 {
                self.mat_line(mat_name, "normaltex", &format!("\"{base}\""));
                return;
            }
            let name = format!("{}_nmAmplitude", self.unique);
            if !self.cache.contains_name(&name) {
                self.tex_line(&name, "type", "scale");
                self.tex_line(&name, "texture1", &format!("\"{base}\""));
                self.tex_line(&name, "texture2", &num(bump.strength));
                self.cache.record_name(&name);
            }
            self.mat_line(mat_name, "normaltex", &format!("\"{name}\""));
            return;
        }
        // Clamp the map between the negative and positive bounds, then
        // scale by the strength.
        let limits = format!("BM_{}_limits", self.unique);
        if !self.cache.contains_name(&limits) {
            self.tex_line(&limits, "type", "mix");
            self.tex_line(&limits, "texture1", &num(bump.negative));
            self.tex_line(&limits, "texture2", &num(bump.positive));
            self.tex_line(&limits, "amount", &format!("\"{base}\""));
            self.cache.record_name(&limits);
        }
        let scaled = format!("{}_bumpmap", self.unique);
        if !self.cache.contains_name(&scaled) {
            self.tex_line(&scaled, "type", "scale");
            self.tex_line(&scaled, "texture1", &format!("\"{limits}\""));
            self.tex_line(&scaled, "texture2", &num(bump.strength));
            self.cache.record_name(&scaled);
        }
        self.mat_line(mat_name, "bumptex", &format!("\"{scaled}\""));
    }

    /// Displacement uses the same clamp-then-scale chain; the geometry side
    /// references `{map}_dispmap` by convention.
    fn emit_displacement_textures(&mut self) {
        let Some(disp) = self.mat.modifiers.displacement.clone() else {
            return;
        };
        let Some(id) = self.mat.pool.lookup(&disp.map) else {
            return;
        };
        let base = self.node_ref(id);
        let limits = format!("DM_{}_limits", self.unique);
        if !self.cache.contains_name(&limits) {
            self.tex_line(&limits, "type", "mix");
            self.tex_line(&limits, "texture1", &num(disp.negative));
            self.tex_line(&limits, "texture2", &num(disp.positive));
            self.tex_line(&limits, "amount", &format!("\"{base}\""));
            self.cache.record_name(&limits);
        }
        let scaled = format!("{base}_dispmap");
        if !self.cache.contains_name(&scaled) {
            self.tex_line(&scaled, "type", "scale");
            self.tex_line(&scaled, "texture1", &format!("\"{limits}\""));
            self.tex_line(&scaled, "texture2", &num(disp.strength));
            self.cache.record_name(&scaled);
        }
    }

    /// The two-material alpha blend: a null, the already-emitted base, and
    /// a mix keyed by the alpha amount or map.
    fn emit_alpha_blend(&mut self) {
        let unique = self.unique.clone();
        let alpha = self.mat.alpha.clone();
        let null_name = format!("{unique}_Null");
        self.mat_line(&null_name, "type", "null");
        self.mat_line(&unique, "type", "mix");
        self.mat_line(&unique, "material1", &format!("\"{null_name}\""));
        self.mat_line(&unique, "material2", &format!("\"{unique}_BaseMat\""));
        let amount = match alpha.map.as_deref().and_then(|n| self.mat.pool.lookup(n)) {
            Some(id) => {
                let mut name = self.node_ref(id);
                if alpha.strength < 1.0 {
                    let scaled = format!("{name}_amount");
                    if !self.cache.contains_name(&scaled) {
                        self.tex_line(&scaled, "type", "scale");
                        self.tex_line(&scaled, "texture1", &format!("\"{name}\""));
                        self.tex_line(&scaled, "texture2", &num(alpha.strength));
                        self.cache.record_name(&scaled);
                    }
                    name = scaled;
                }
                format!("\"{name}\"")
            }
            None => num(alpha.strength),
        };
        self.mat_line(&unique, "amount", &amount);
    }

    fn emit_light(&mut self, gain: f64) {
        let unique = self.unique.clone();
        self.mat_line(&unique, "type", "matte");
        let kd = self.channel_value(Channel::Diffuse, Rgb::PURE_WHITE);
        self.mat_line(&unique, "kd", &kd);
        let l = self.channel_value(Channel::Diffuse, Rgb::PURE_WHITE);
        self.mat_line(&unique, "emission", &l);
        self.mat_line(&unique, "emission.gain", &format!(
            "{} {} {}",
            num(gain),
            num(gain),
            num(gain)
        ));
    }

    /// An ambient-driven emitter attached to an ordinary material.
    fn emit_emission(&mut self, mat_name: &str) {
        let Some(l) = self.channel_ref(Channel::Ambient) else {
            return;
        };
        let gain = num(self.mat.light_gain);
        self.mat_line(mat_name, "emission", &format!("\"{l}\""));
        self.mat_line(mat_name, "emission.gain", &format!("{gain} {gain} {gain}"));
    }

    fn emit_material_mix(&mut self, material1: &str, material2: &str, amount: f64) {
        let unique = self.unique.clone();
        let obj = prop_name(&sanitize_name(&self.mat.object_id));
        self.mat_line(&unique, "type", "mix");
        let m1 = format!("{obj}_{}", prop_name(&sanitize_name(material1)));
        self.mat_line(&unique, "material1", &format!("\"{m1}\""));
        let m2 = format!("{obj}_{}", prop_name(&sanitize_name(material2)));
        self.mat_line(&unique, "material2", &format!("\"{m2}\""));
        self.mat_line(&unique, "amount", &num(amount));
    }
}
