//! Texture statement generation for the Lux backend.

use matforge_ir::{MathOp, NodeId, NodeInput, NodeKind, NoiseBasis, NoiseKind, Rgb, TextureNode, ValueDomain};

use super::Emitter;
use crate::fmt::{col, num};

fn domain_str(domain: ValueDomain) -> &'static str {
    match domain {
        ValueDomain::Numeric => "float",
        ValueDomain::Color => "color",
    }
}

fn math_fn(op: MathOp) -> &'static str {
    match op {
        MathOp::Add => "add",
        MathOp::Subtract => "subtract",
        // Multiply and pass-through both map onto the scale texture.
        MathOp::Multiply | MathOp::None => "scale",
    }
}

fn rgb_channel_str(channel: u8) -> &'static str {
    match channel {
        0 => "red",
        1 => "green",
        2 => "blue",
        _ => "mean",
    }
}

#[allow(clippy::too_many_arguments)]
fn image_map_statement(
    name: &str,
    data: &str,
    file: &str,
    gain: f64,
    gamma: f64,
    u_tile: f64,
    v_tile: f64,
    u_offset: f64,
    v_offset: f64,
    normal_map: bool,
) -> String {
    let map_type = if normal_map { "normalmap" } else { "imagemap" };
    // The host's v axis points the other way, hence the negated vscale.
    format!(
        "Texture \"{name}\" \"{data}\" \"{map_type}\" \
         \"float uscale\" [{}] \"float vscale\" [{}] \
         \"float udelta\" [{}] \"float vdelta\" [{}] \
         \"string filename\" [\"{}\"] \"string wrap\" [\"repeat\"] \
         \"string mapping\" [\"uv\"] \"string filtertype\" [\"bilinear\"] \
         \"float gain\" [{}] \"float gamma\" [{}]\n",
        num(u_tile),
        num(-v_tile),
        num(u_offset),
        num(v_offset),
        file.replace('\\', "/"),
        num(gain),
        num(gamma),
    )
}

fn constant_statement(name: &str, domain: ValueDomain, color: Rgb) -> String {
    match domain {
        ValueDomain::Color => format!(
            "Texture \"{name}\" \"color\" \"constant\" \"color value\" [{}]\n",
            col(color)
        ),
        // A numeric constant is a gray, any channel is equivalent.
        ValueDomain::Numeric => format!(
            "Texture \"{name}\" \"float\" \"constant\" \"float value\" [{:.4}]\n",
            color.r
        ),
    }
}

impl Emitter<'_> {
    /// Emits the texture statement for one node, unless the run cache
    /// already holds an equivalent emission to reference instead.
    pub(super) fn emit_node(&mut self, id: NodeId) {
        let node = self.mat.pool.get(id).clone();
        if let Some(existing) = self.cache.lookup(&self.unique, &node) {
            let existing = existing.to_string();
            self.names.insert(id, existing);
            return;
        }
        let name = self.qualified(&node.name);
        self.names.insert(id, name.clone());
        let stmt = self.texture_statement(&node, &name);
        self.out.push_str(&stmt);
        self.cache.record(&self.unique, &node, name);
    }

    /// Name of a numeric reading of this node. Color image maps get a float
    /// copy emitted under `{name}_float`; everything else converts in place.
    pub(super) fn float_ref(&mut self, id: NodeId) -> String {
        let node = self.mat.pool.get(id).clone();
        let base = self.node_ref(id);
        if node.domain == ValueDomain::Numeric {
            return base;
        }
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
            } => {
                let name = format!("{base}_float");
                if !self.cache.contains_name(&name) {
                    self.out.push_str(&image_map_statement(
                        &name, "float", file, *gain, *gamma, *u_tile, *v_tile, *u_offset,
                        *v_offset, *normal_map,
                    ));
                    self.cache.record_name(&name);
                }
                name
            }
            _ => base,
        }
    }

    fn texture_statement(&mut self, node: &TextureNode, name: &str) -> String {
        let dt = domain_str(node.domain);
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
            } => image_map_statement(
                name, dt, file, *gain, *gamma, *u_tile, *v_tile, *u_offset, *v_offset,
                *normal_map,
            ),
            NodeKind::Constant { color } => constant_statement(name, node.domain, *color),
            NodeKind::Mix { tex1, tex2, amount } => {
                let p1 = self.input_param("tex1", tex1, node.domain);
                let p2 = self.input_param("tex2", tex2, node.domain);
                let pa = self.amount_param(amount);
                format!("Texture \"{name}\" \"{dt}\" \"mix\" {p1} {p2} {pa}\n")
            }
            NodeKind::Math {
                tex1,
                tex2,
                amount1,
                amount2,
                op,
            } => {
                let func = math_fn(*op);
                let p1 = self.math_operand(1, *tex1, *amount1);
                let p2 = self.math_operand(2, *tex2, *amount2);
                format!("Texture \"{name}\" \"float\" \"{func}\" {p1} {p2}\n")
            }
            NodeKind::ColorMath {
                tex1,
                tex2,
                color1,
                color2,
                op,
            } => self.color_math_statement(name, dt, *tex1, *tex2, *color1, *color2, *op),
            NodeKind::Component {
                tex,
                channel,
                color,
            } => self.component_statement(name, node.domain, *tex, *channel, *color),
            NodeKind::Noise {
                kind,
                basis,
                size,
                detail,
                brightness,
                contrast,
                hard,
                distortion,
            } => noise_statement(
                name, *kind, *basis, *size, *detail, *brightness, *contrast, *hard, *distortion,
            ),
            NodeKind::Band {
                stops,
                offsets,
                amount,
            } => {
                let mut s = format!("Texture \"{name}\" \"{dt}\" \"band\"");
                for (i, stop) in stops.iter().enumerate() {
                    s.push_str(&format!(" \"color tex{}\" [{}]", i + 1, col(*stop)));
                }
                s.push_str(&format!(
                    " \"float offsets\" [{:.3} {:.3} {:.3} {:.3}]",
                    offsets[0], offsets[1], offsets[2], offsets[3]
                ));
                s.push(' ');
                s.push_str(&self.amount_param(amount));
                s.push('\n');
                s
            }
            NodeKind::FresnelColor { color, tex } => {
                self.fresnel_statement(name, *color, *tex)
            }
        }
    }

    /// One typed parameter for a mix/band input slot.
    fn input_param(&self, slot: &str, input: &NodeInput, domain: ValueDomain) -> String {
        match input {
            NodeInput::Node(id) => format!("\"texture {slot}\" [\"{}\"]", self.node_ref(*id)),
            NodeInput::Value(v) => format!("\"float {slot}\" [{}]", num(*v)),
            NodeInput::Color(c) => match domain {
                ValueDomain::Color => format!("\"color {slot}\" [{}]", col(*c)),
                ValueDomain::Numeric => format!("\"float {slot}\" [{:.4}]", c.luma()),
            },
        }
    }

    /// The amount slot is always numeric; color nodes feeding it get a
    /// float variant.
    fn amount_param(&mut self, input: &NodeInput) -> String {
        match input {
            NodeInput::Node(id) => {
                let name = self.float_ref(*id);
                format!("\"texture amount\" [\"{name}\"]")
            }
            NodeInput::Value(v) => format!("\"float amount\" [{}]", num(*v)),
            NodeInput::Color(c) => format!("\"float amount\" [{:.4}]", c.luma()),
        }
    }

    /// One math operand: a bare amount, a texture, or a texture scaled by
    /// its amount through a derived `_amount{n}` texture.
    fn math_operand(&mut self, slot: usize, tex: Option<NodeId>, amount: f64) -> String {
        let Some(id) = tex else {
            return format!("\"float tex{slot}\" [{}]", num(amount));
        };
        let mut name = self.float_ref(id);
        if amount != 1.0 {
            let wrapped = format!("{name}_amount{slot}");
            if !self.cache.contains_name(&wrapped) {
                self.out.push_str(&format!(
                    "Texture \"{wrapped}\" \"float\" \"scale\" \
                     \"texture tex1\" [\"{name}\"] \"float tex2\" [{}]\n",
                    num(amount)
                ));
                self.cache.record_name(&wrapped);
            }
            name = wrapped;
        }
        format!("\"texture tex{slot}\" [\"{name}\"]")
    }

    fn color_math_statement(
        &mut self,
        name: &str,
        dt: &str,
        tex1: Option<NodeId>,
        tex2: Option<NodeId>,
        color1: Rgb,
        color2: Rgb,
        op: MathOp,
    ) -> String {
        if op == MathOp::None {
            // Pass-through: the node is its own tint of the first input.
            return match tex1 {
                Some(id) => {
                    let t = self.node_ref(id);
                    format!(
                        "Texture \"{name}\" \"{dt}\" \"scale\" \
                         \"color tex1\" [{}] \"texture tex2\" [\"{t}\"]\n",
                        col(color1)
                    )
                }
                None => format!(
                    "Texture \"{name}\" \"{dt}\" \"constant\" \"color value\" [{}]\n",
                    col(color1)
                ),
            };
        }
        let func = math_fn(op);
        let p1 = self.color_math_side(1, tex1, color1, name);
        let p2 = self.color_math_side(2, tex2, color2, name);
        format!("Texture \"{name}\" \"{dt}\" \"{func}\" {p1} {p2}\n")
    }

    /// One side of a color combinator: `color * texture` collapses to the
    /// raw texture when the color is pure white, otherwise a derived
    /// `_colormix{n}` scale texture carries the tint.
    fn color_math_side(
        &mut self,
        slot: usize,
        tex: Option<NodeId>,
        color: Rgb,
        name: &str,
    ) -> String {
        match tex {
            Some(id) => {
                let t = self.node_ref(id);
                if color.is_pure_white() {
                    format!("\"texture tex{slot}\" [\"{t}\"]")
                } else {
                    let mixed = format!("{name}_colormix{slot}");
                    if !self.cache.contains_name(&mixed) {
                        self.out.push_str(&format!(
                            "Texture \"{mixed}\" \"color\" \"scale\" \
                             \"color tex1\" [{}] \"texture tex2\" [\"{t}\"]\n",
                            col(color)
                        ));
                        self.cache.record_name(&mixed);
                    }
                    format!("\"texture tex{slot}\" [\"{mixed}\"]")
                }
            }
            None => format!("\"color tex{slot}\" [{}]", col(color)),
        }
    }

    fn component_statement(
        &mut self,
        name: &str,
        domain: ValueDomain,
        tex: Option<NodeId>,
        channel: u8,
        color: Rgb,
    ) -> String {
        match domain {
            ValueDomain::Color => match tex {
                // Grayscale read of a map, re-expanded to color through a
                // black-to-white mix driven by the float reading.
                Some(id) => {
                    let f = self.float_ref(id);
                    format!(
                        "Texture \"{name}\" \"color\" \"mix\" \
                         \"color tex1\" [0.0000 0.0000 0.0000] \
                         \"color tex2\" [1.0000 1.0000 1.0000] \
                         \"texture amount\" [\"{f}\"]\n"
                    )
                }
                None => constant_statement(name, ValueDomain::Color, color),
            },
            ValueDomain::Numeric => match tex {
                Some(id) => {
                    let inner = self.mat.pool.get(id).clone();
                    if let NodeKind::ImageMap { file, .. } = &inner.kind {
                        format!(
                            "Texture \"{name}\" \"float\" \"imagemap\" \
                             \"string filename\" [\"{}\"] \"string wrap\" [\"repeat\"] \
                             \"string channel\" [\"{}\"]\n",
                            file.replace('\\', "/"),
                            rgb_channel_str(channel)
                        )
                    } else {
                        let f = self.float_ref(id);
                        format!(
                            "Texture \"{name}\" \"float\" \"scale\" \
                             \"texture tex1\" [\"{f}\"] \"float tex2\" [1]\n"
                        )
                    }
                }
                None => format!(
                    "Texture \"{name}\" \"float\" \"constant\" \"float value\" [{:.4}]\n",
                    color.luma()
                ),
            },
        }
    }

    fn fresnel_statement(&mut self, name: &str, color: Rgb, tex: Option<NodeId>) -> String {
        match tex {
            None => format!(
                "Texture \"{name}\" \"fresnel\" \"fresnelcolor\" \"color Kr\" [{}]\n",
                col(color)
            ),
            Some(id) => {
                let t = self.node_ref(id);
                if color.is_pure_white() {
                    format!(
                        "Texture \"{name}\" \"fresnel\" \"fresnelcolor\" \"texture Kr\" [\"{t}\"]\n"
                    )
                } else {
                    let mixed = format!("{name}_kr");
                    if !self.cache.contains_name(&mixed) {
                        self.out.push_str(&format!(
                            "Texture \"{mixed}\" \"color\" \"scale\" \
                             \"color tex1\" [{}] \"texture tex2\" [\"{t}\"]\n",
                            col(color)
                        ));
                        self.cache.record_name(&mixed);
                    }
                    format!(
                        "Texture \"{name}\" \"fresnel\" \"fresnelcolor\" \"texture Kr\" [\"{mixed}\"]\n"
                    )
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn noise_statement(
    name: &str,
    kind: NoiseKind,
    basis: NoiseBasis,
    size: f64,
    detail: f64,
    brightness: f64,
    contrast: f64,
    hard: bool,
    distortion: f64,
) -> String {
    let basis = match basis {
        NoiseBasis::OriginalPerlin => "blender_original",
        NoiseBasis::ImprovedPerlin => "improved_perlin",
    };
    let placement = "\"string coordinates\" [\"global\"] \
                     \"vector translate\" [0.0 0.0 0.0] \
                     \"vector rotate\" [0.0 0.0 0.0] \
                     \"vector scale\" [1.0 1.0 1.0]";
    match kind {
        NoiseKind::Clouds => format!(
            "Texture \"{name}\" \"float\" \"blender_clouds\" \
             \"float bright\" [{}] \"float contrast\" [{}] \
             \"string noisetype\" [\"{}\"] \"string noisebasis\" [\"{basis}\"] \
             \"float noisesize\" [{}] \"integer noisedepth\" [{}] {placement}\n",
            num(brightness),
            num(contrast),
            if hard { "hard_noise" } else { "soft_noise" },
            num(size),
            detail as i64,
        ),
        NoiseKind::Fbm => format!(
            "Texture \"{name}\" \"float\" \"fbm\" \
             \"integer octaves\" [{}] \"float roughness\" [{}] {placement}\n",
            detail as i64,
            num(contrast),
        ),
        NoiseKind::DistortedNoise => format!(
            "Texture \"{name}\" \"float\" \"blender_distortednoise\" \
             \"string type\" [\"{basis}\"] \"string noisebasis\" [\"{basis}\"] \
             \"float bright\" [{}] \"float contrast\" [{}] \
             \"float distamount\" [{}] \"float noisesize\" [{}] \
             \"float nabla\" [0.25] {placement}\n",
            num(brightness),
            num(contrast),
            num(distortion),
            num(size),
        ),
    }
}
