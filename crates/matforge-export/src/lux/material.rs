//! Material statement generation for the Lux backend.

use matforge_ir::material::sanitize_name;
use matforge_ir::{Channel, MaterialKind, GlassKind, MetalPreset, NodeId, NodePool, Rgb};

use super::Emitter;
use crate::fmt::{col, num};

/// True when any node in the subgraph is a tangent-space normal map, which
/// switches the bump emission from the clamp chain to an amplitude scale.
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
            self.out.push_str(&format!(
                "# Mat: {unique} (hidden)\nMakeNamedMaterial \"{unique}\" \"string type\" [\"null\"] \n"
            ));
            return;
        }
        match self.mat.kind.clone() {
            MaterialKind::Null => {
                self.out.push_str(&format!(
                    "# Mat: {unique}\nMakeNamedMaterial \"{unique}\" \"string type\" [\"null\"] \n"
                ));
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
        let stmt = self.base_material_statement(&base_name);
        self.out.push_str(&stmt);
        if alpha_active {
            self.emit_alpha_blend();
        }
        if self.mat.emits_light {
            self.emit_area_light();
        }
    }

    fn base_material_statement(&mut self, mat_name: &str) -> String {
        // Derived textures must land in the stream before the statement
        // that references them.
        let bump = self.bump_clause();
        self.emit_displacement_textures();

        let mut s = format!("# Mat: {mat_name}\n");
        match self.mat.kind.clone() {
            MaterialKind::Matte {
                roughness,
                translucent,
            } => {
                if translucent {
                    let kr = self.channel_param("Kr", Channel::Diffuse, Rgb::MEDIUM_GRAY);
                    let kt = self.channel_param("Kt", Channel::Translucence, Rgb::PURE_WHITE);
                    s.push_str(&format!(
                        "MakeNamedMaterial \"{mat_name}\" \"string type\" [\"mattetranslucent\"] \
                         {kr} \"float sigma\" [{}] {kt} \"bool energyconserving\" [\"true\"]",
                        num(roughness)
                    ));
                } else {
                    let kd = self.channel_param("Kd", Channel::Diffuse, Rgb::MEDIUM_GRAY);
                    s.push_str(&format!(
                        "MakeNamedMaterial \"{mat_name}\" \"string type\" [\"matte\"] \
                         {kd} \"float sigma\" [{}]",
                        num(roughness)
                    ));
                }
            }
            MaterialKind::Glossy {
                u_glossiness,
                v_glossiness,
                top_coat,
                translucent,
            } => {
                let kd = self.channel_param("Kd", Channel::Diffuse, Rgb::MEDIUM_GRAY);
                let ka = if top_coat {
                    self.ka_clause()
                } else {
                    String::new()
                };
                let ks = self.ks_clause(u_glossiness, v_glossiness);
                if translucent {
                    let kt = self.channel_param("Kt", Channel::Translucence, Rgb::PURE_WHITE);
                    s.push_str(&format!(
                        "MakeNamedMaterial \"{mat_name}\" \"string type\" [\"glossytranslucent\"] \
                         \"bool onesided\" [\"false\"] {kt} {kd}{ka}{ks}"
                    ));
                } else {
                    s.push_str(&format!(
                        "MakeNamedMaterial \"{mat_name}\" \"string type\" [\"glossy\"] {kd}{ka}{ks}"
                    ));
                }
            }
            MaterialKind::Skin {
                u_glossiness,
                v_glossiness,
                top_coat,
                ..
            } => {
                let kd = self.channel_param("Kd", Channel::Diffuse, Rgb::MEDIUM_GRAY);
                let ka = if top_coat {
                    self.ka_clause()
                } else {
                    String::new()
                };
                let ks = self.ks_clause(u_glossiness, v_glossiness);
                s.push_str(&format!(
                    "MakeNamedMaterial \"{mat_name}\" \"string type\" [\"glossytranslucent\"] \
                     \"bool onesided\" [\"true\"] \"bool multibounce\" [\"false\"] \
                     {kd} \"float d\" [0.25] \"color Kt\" [1.0000 1.0000 1.0000]{ka}{ks}"
                ));
            }
            MaterialKind::Glass { glass_kind, ior } => {
                let kr = self.channel_param("Kr", Channel::Specular, Rgb::PURE_WHITE);
                let kt = self.channel_param("Kt", Channel::Diffuse, Rgb::PURE_WHITE);
                match glass_kind {
                    GlassKind::Standard => s.push_str(&format!(
                        "MakeNamedMaterial \"{mat_name}\" \"string type\" [\"glass\"] \
                         \"float index\" [{}] {kr} {kt}",
                        num(ior)
                    )),
                    GlassKind::Architectural => s.push_str(&format!(
                        "MakeNamedMaterial \"{mat_name}\" \"string type\" [\"glass\"] \
                         \"float index\" [{}] {kr} {kt} \"bool architectural\" [\"true\"]",
                        num(ior)
                    )),
                    GlassKind::Frosted => s.push_str(&format!(
                        "MakeNamedMaterial \"{mat_name}\" \"string type\" [\"roughglass\"] \
                         \"float uroughness\" [0.5] \"float vroughness\" [0.5] \
                         \"float index\" [{}] {kr} {kt}",
                        num(ior)
                    )),
                }
            }
            MaterialKind::Metal {
                preset,
                h_polish,
                v_polish,
            } => {
                let fresnel = format!("{}_fresnel", self.unique);
                if !self.cache.contains_name(&fresnel) {
                    self.out.push_str(&format!(
                        "Texture \"{fresnel}\" \"fresnel\" \"fresnelcolor\" \"color Kr\" [{}]\n",
                        col(metal_reflectance(preset))
                    ));
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
                s.push_str(&format!(
                    "MakeNamedMaterial \"{mat_name}\" \"string type\" [\"metal2\"] \
                     \"texture fresnel\" [\"{fresnel}\"] \
                     \"float uroughness\" [{}] \"float vroughness\" [{}]",
                    num(rough(h_polish)),
                    num(rough(v_polish))
                ));
            }
            MaterialKind::Mirror => {
                let kr = self.channel_param("Kr", Channel::Diffuse, Rgb::PURE_WHITE);
                s.push_str(&format!(
                    "MakeNamedMaterial \"{mat_name}\" \"string type\" [\"mirror\"] {kr} \
                     \"float film\" [0] \"float filmindex\" [1.5]"
                ));
            }
            MaterialKind::Velvet { thickness } => {
                let kd = self.channel_param("Kd", Channel::Diffuse, Rgb::MEDIUM_GRAY);
                s.push_str(&format!(
                    "MakeNamedMaterial \"{mat_name}\" \"string type\" [\"velvet\"] \
                     \"float thickness\" [{}] {kd} \
                     \"float p1\" [-2] \"float p2\" [10] \"float p3\" [2]",
                    num(thickness)
                ));
            }
            MaterialKind::Water { .. } => {
                s.push_str(&format!(
                    "MakeNamedMaterial \"{mat_name}\" \"string type\" [\"glass2\"] \
                     \"bool architectural\" [\"false\"] \"bool dispersion\" [\"false\"]"
                ));
            }
            MaterialKind::Cloth {
                preset,
                u_repeat,
                v_repeat,
            } => {
                let warp_kd = self.channel_param("warp_Kd", Channel::Diffuse, Rgb::MEDIUM_GRAY);
                let warp_ks = self.channel_param("warp_Ks", Channel::Specular, Rgb::BLACK);
                let weft_kd = self.channel_param("weft_Kd", Channel::Diffuse, Rgb::MEDIUM_GRAY);
                let weft_ks = self.channel_param("weft_Ks", Channel::Specular, Rgb::BLACK);
                s.push_str(&format!(
                    "MakeNamedMaterial \"{mat_name}\" \"string type\" [\"cloth\"] \
                     \"string presetname\" [\"{}\"] {warp_kd} {warp_ks} {weft_kd} {weft_ks} \
                     \"float repeat_u\" [{}] \"float repeat_v\" [{}]",
                    preset.name(),
                    num(u_repeat),
                    num(v_repeat)
                ));
            }
            // Dispatched before base emission; kept to satisfy the closed
            // sum without a panic path.
            MaterialKind::Light { .. } | MaterialKind::Null | MaterialKind::Mix { .. } => {
                s.push_str(&format!(
                    "MakeNamedMaterial \"{mat_name}\" \"string type\" [\"null\"]"
                ));
            }
        }
        s.push_str(&bump);
        s.push('\n');
        s
    }

    /// A texture reference for the channel, or an inline fallback color.
    fn channel_param(&self, slot: &str, channel: Channel, fallback: Rgb) -> String {
        match self.channel_ref(channel) {
            Some(t) => format!("\"texture {slot}\" [\"{t}\"]"),
            None => format!("\"color {slot}\" [{}]", col(fallback)),
        }
    }

    /// Specular parameters: Ks plus u/v roughness, inverted from the
    /// 0-10000 glossiness scale. A glossiness map turns the roughness into
    /// driven mix textures.
    fn ks_clause(&mut self, u_glossiness: i32, v_glossiness: i32) -> String {
        // Exactly 10000 rounds to a degenerate zero roughness in the
        // renderer, so it steps down one notch.
        let clamp = |g: i32| if g >= 10000 { 9999 } else { g };
        let u = (10000.0 - f64::from(clamp(u_glossiness))) / 10000.0;
        let v = (10000.0 - f64::from(clamp(v_glossiness))) / 10000.0;
        let ks = self.channel_param("Ks", Channel::Specular, Rgb::new(0.1, 0.1, 0.1));
        let Some(kg) = self.mat.channel_node(Channel::Glossiness) else {
            return format!(
                " {ks} \"float uroughness\" [{}] \"float vroughness\" [{}]",
                num(u),
                num(v)
            );
        };
        // Map pixels drive the roughness between fully rough (black) and
        // the configured gloss (white); the mix flips the scale.
        let kg = self.float_ref(kg);
        let u_name = format!("{}_uGloss", self.unique);
        if !self.cache.contains_name(&u_name) {
            self.out.push_str(&format!(
                "Texture \"{u_name}\" \"float\" \"mix\" \"float tex1\" [1.0] \
                 \"float tex2\" [{}] \"texture amount\" [\"{kg}\"]\n",
                num(u)
            ));
            self.cache.record_name(&u_name);
        }
        let v_name = if u == v {
            u_name.clone()
        } else {
            let v_name = format!("{}_vGloss", self.unique);
            if !self.cache.contains_name(&v_name) {
                self.out.push_str(&format!(
                    "Texture \"{v_name}\" \"float\" \"mix\" \"float tex1\" [1.0] \
                     \"float tex2\" [{}] \"texture amount\" [\"{kg}\"]\n",
                    num(v)
                ));
                self.cache.record_name(&v_name);
            }
            v_name
        };
        format!(
            " {ks} \"texture uroughness\" [\"{u_name}\"] \"texture vroughness\" [\"{v_name}\"]"
        )
    }

    /// Top coat: the renderer wants absorption, so the coat color is
    /// inverted through a white-minus-color subtract texture.
    fn ka_clause(&mut self) -> String {
        let Some(ka) = self.channel_ref(Channel::Coat) else {
            return String::new();
        };
        let white = format!("{}_inv_tex1", self.unique);
        let inv = format!("{}_Ka_invert", self.unique);
        if !self.cache.contains_name(&inv) {
            self.out.push_str(&format!(
                "Texture \"{white}\" \"color\" \"constant\" \"color value\" [1.0000 1.0000 1.0000]\n"
            ));
            self.out.push_str(&format!(
                "Texture \"{inv}\" \"color\" \"subtract\" \
                 \"texture tex1\" [\"{white}\"] \"texture tex2\" [\"{ka}\"]\n"
            ));
            self.cache.record_name(&inv);
        }
        format!(" \"texture Ka\" [\"{inv}\"] \"float d\" [0.5]")
    }

    /// Emits the bump textures and returns the `bumpmap` parameter clause.
    fn bump_clause(&mut self) -> String {
        let Some(bump) = self.mat.modifiers.bump.clone() else {
            return String::new();
        };
        let Some(id) = self.mat.pool.lookup(&bump.map) else {
            // Already diagnosed by the dependency resolver.
            return String::new();
        };
        let base = self.float_ref(id);
        if contains_normal_map(&self.mat.pool, id) {
            if bump.strength != 1.0 {
                let name = format!("{}_nmAmplitude", self.unique);
                if !self.cache.contains_name(&name) {
                    self.out.push_str(&format!(
                        "Texture \"{name}\" \"float\" \"scale\" \
                         \"texture tex1\" [\"{base}\"] \"float tex2\" [{}]\n",
                        num(bump.strength)
                    ));
                    self.cache.record_name(&name);
                }
                return format!(" \"texture bumpmap\" [\"{name}\"]");
            }
            return format!(" \"texture bumpmap\" [\"{base}\"]");
        }
        // Clamp the map between the negative and positive bounds, then
        // scale by the strength.
        let limits = format!("BM_{}_limits", self.unique);
        if !self.cache.contains_name(&limits) {
            self.out.push_str(&format!(
                "Texture \"{limits}\" \"float\" \"mix\" \"float tex1\" [{}] \
                 \"float tex2\" [{}] \"texture amount\" [\"{base}\"]\n",
                num(bump.negative),
                num(bump.positive)
            ));
            self.cache.record_name(&limits);
        }
        let scaled = format!("{}_bumpmap", self.unique);
        if !self.cache.contains_name(&scaled) {
            self.out.push_str(&format!(
                "Texture \"{scaled}\" \"float\" \"scale\" \
                 \"texture tex1\" [\"{limits}\"] \"float tex2\" [{}]\n",
                num(bump.strength)
            ));
            self.cache.record_name(&scaled);
        }
        format!(" \"texture bumpmap\" [\"{scaled}\"]")
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
        let base = self.float_ref(id);
        let limits = format!("DM_{}_limits", self.unique);
        if !self.cache.contains_name(&limits) {
            self.out.push_str(&format!(
                "Texture \"{limits}\" \"float\" \"mix\" \"float tex1\" [{}] \
                 \"float tex2\" [{}] \"texture amount\" [\"{base}\"]\n",
                num(disp.negative),
                num(disp.positive)
            ));
            self.cache.record_name(&limits);
        }
        let scaled = format!("{base}_dispmap");
        if !self.cache.contains_name(&scaled) {
            self.out.push_str(&format!(
                "Texture \"{scaled}\" \"float\" \"scale\" \
                 \"texture tex1\" [\"{limits}\"] \"float tex2\" [{}]\n",
                num(disp.strength)
            ));
            self.cache.record_name(&scaled);
        }
    }

    /// The two-material alpha blend: a null, the already-emitted base, and
    /// a mix keyed by the alpha amount or map.
    fn emit_alpha_blend(&mut self) {
        let unique = self.unique.clone();
        let alpha = self.mat.alpha.clone();
        let amount = match alpha.map.as_deref().and_then(|n| self.mat.pool.lookup(n)) {
            Some(id) => {
                let mut name = self.float_ref(id);
                if alpha.strength < 1.0 {
                    let scaled = format!("{name}_amount");
                    if !self.cache.contains_name(&scaled) {
                        self.out.push_str(&format!(
                            "Texture \"{scaled}\" \"float\" \"scale\" \
                             \"texture tex1\" [\"{name}\"] \"float tex2\" [{}]\n",
                            num(alpha.strength)
                        ));
                        self.cache.record_name(&scaled);
                    }
                    name = scaled;
                }
                format!("\"texture amount\" [\"{name}\"]")
            }
            None => format!("\"float amount\" [{}]", num(alpha.strength)),
        };
        self.out.push_str(&format!(
            "#\n# Mat: {unique}\n#\n\
             MakeNamedMaterial \"{unique}_Null\" \"string type\" [\"null\"] \n\
             MakeNamedMaterial \"{unique}\" \"string type\" [\"mix\"] {amount} \
             \"string namedmaterial1\" [\"{unique}_Null\"] \
             \"string namedmaterial2\" [\"{unique}_BaseMat\"] \n"
        ));
    }

    fn emit_light(&mut self, gain: f64) {
        let unique = self.unique.clone();
        let mut s = format!(
            "#\n# Mat: {unique} (light)\n#\n\
             MakeNamedMaterial \"{unique}\" \"string type\" [\"null\"] \n\
             AreaLightSource \"area\" \"float gain\" [{}] ",
            num(gain)
        );
        match self.channel_ref(Channel::Diffuse) {
            Some(t) => s.push_str(&format!("\"texture L\" [\"{t}\"] \n")),
            None => s.push_str("\"color L\" [1.0 1.0 1.0] \n"),
        }
        self.out.push_str(&s);
    }

    /// An ambient-driven emitter attached to an ordinary material.
    fn emit_area_light(&mut self) {
        let Some(l) = self.channel_ref(Channel::Ambient) else {
            return;
        };
        self.out.push_str(&format!(
            "AreaLightSource \"area\" \"float gain\" [{}] \"texture L\" [\"{l}\"] \n",
            num(self.mat.light_gain)
        ));
    }

    fn emit_material_mix(&mut self, material1: &str, material2: &str, amount: f64) {
        let unique = self.unique.clone();
        let obj = sanitize_name(&self.mat.object_id);
        self.out.push_str(&format!(
            "#\n# Mat: {unique}\n#\n\
             MakeNamedMaterial \"{unique}\" \"string type\" [\"mix\"] \
             \"float amount\" [{}] \
             \"string namedmaterial1\" [\"{obj}:{}\"] \
             \"string namedmaterial2\" [\"{obj}:{}\"] \n",
            num(amount),
            sanitize_name(material1),
            sanitize_name(material2)
        ));
    }
}
