//! Texture property emission for the LuxCore backend.
//!
//! LuxCore converts between color and float readings implicitly, so no
//! float-variant copies are needed here; a color texture referenced from a
//! numeric slot is used as-is.

use matforge_ir::{
    MathOp, NodeId, NodeInput, NodeKind, NoiseBasis, NoiseKind, Rgb, TextureNode, ValueDomain,
};

use super::Emitter;
use crate::fmt::{col, num};

fn math_type(op: MathOp) -> &'static str {
    match op {
        MathOp::Add => "add",
        MathOp::Subtract => "subtract",
        MathOp::Multiply | MathOp::None => "scale",
    }
}

fn basis_str(basis: NoiseBasis) -> &'static str {
    match basis {
        NoiseBasis::OriginalPerlin => "blender_original",
        NoiseBasis::ImprovedPerlin => "improved_perlin",
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

impl Emitter<'_> {
    pub(super) fn emit_node(&mut self, id: NodeId) {
        let node = self.mat.pool.get(id).clone();
        if let Some(existing) = self.cache.lookup(&self.unique, &node) {
            let existing = existing.to_string();
            self.names.insert(id, existing);
            return;
        }
        let name = self.qualified(&node.name);
        self.names.insert(id, name.clone());
        self.texture_properties(&node, &name);
        self.cache.record(&self.unique, &node, name);
    }

    fn texture_properties(&mut self, node: &TextureNode, name: &str) {
        match &node.kind {
            NodeKind::ImageMap {
                file,
                gain,
                gamma,
                u_tile,
                v_tile,
                u_offset,
                v_offset,
                ..
            } => {
                self.tex_line(name, "type", "imagemap");
                self.tex_line(name, "file", &format!("\"{}\"", file.replace('\\', "/")));
                self.tex_line(name, "gamma", &num(*gamma));
                self.tex_line(name, "gain", &num(*gain));
                self.tex_line(name, "mapping.type", "uvmapping2d");
                self.tex_line(
                    name,
                    "mapping.uvscale",
                    &format!("{} {}", num(*u_tile), num(-v_tile)),
                );
                self.tex_line(
                    name,
                    "mapping.uvdelta",
                    &format!("{} {}", num(*u_offset), num(*v_offset)),
                );
            }
            NodeKind::Constant { color } => match node.domain {
                ValueDomain::Color => {
                    self.tex_line(name, "type", "constfloat3");
                    self.tex_line(name, "value", &col(*color));
                }
                ValueDomain::Numeric => {
                    self.tex_line(name, "type", "constfloat1");
                    self.tex_line(name, "value", &format!("{:.4}", color.r));
                }
            },
            NodeKind::Mix { tex1, tex2, amount } => {
                self.tex_line(name, "type", "mix");
                let t1 = self.input_value(tex1);
                self.tex_line(name, "texture1", &t1);
                let t2 = self.input_value(tex2);
                self.tex_line(name, "texture2", &t2);
                let a = self.input_value(amount);
                self.tex_line(name, "amount", &a);
            }
            NodeKind::Math {
                tex1,
                tex2,
                amount1,
                amount2,
                op,
            } => {
                let t1 = self.scaled_operand(name, 1, *tex1, *amount1);
                let t2 = self.scaled_operand(name, 2, *tex2, *amount2);
                self.tex_line(name, "type", math_type(*op));
                self.tex_line(name, "texture1", &t1);
                self.tex_line(name, "texture2", &t2);
            }
            NodeKind::ColorMath {
                tex1,
                tex2,
                color1,
                color2,
                op,
            } => {
                let t1 = self.tinted_side(name, 1, *tex1, *color1);
                if *op == MathOp::None {
                    // Pass-through tint of the first input.
                    self.tex_line(name, "type", "scale");
                    self.tex_line(name, "texture1", &t1);
                    self.tex_line(name, "texture2", "1.0 1.0 1.0");
                    return;
                }
                let t2 = self.tinted_side(name, 2, *tex2, *color2);
                self.tex_line(name, "type", math_type(*op));
                self.tex_line(name, "texture1", &t1);
                self.tex_line(name, "texture2", &t2);
            }
            NodeKind::Component {
                tex,
                channel,
                color,
            } => match tex {
                Some(id) => {
                    let inner = self.mat.pool.get(*id).clone();
                    if let NodeKind::ImageMap { file, .. } = &inner.kind {
                        self.tex_line(name, "type", "imagemap");
                        self.tex_line(
                            name,
                            "file",
                            &format!("\"{}\"", file.replace('\\', "/")),
                        );
                        self.tex_line(name, "channel", rgb_channel_str(*channel));
                    } else {
                        let t = self.node_ref(*id);
                        self.tex_line(name, "type", "scale");
                        self.tex_line(name, "texture1", &format!("\"{t}\""));
                        self.tex_line(name, "texture2", "1.0");
                    }
                }
                None => {
                    self.tex_line(name, "type", "constfloat1");
                    self.tex_line(name, "value", &format!("{:.4}", color.luma()));
                }
            },
            NodeKind::Noise {
                kind,
                basis,
                size,
                detail,
                brightness,
                contrast,
                hard,
                distortion,
            } => match kind {
                NoiseKind::Clouds => {
                    self.tex_line(name, "type", "blender_clouds");
                    self.tex_line(
                        name,
                        "noisetype",
                        if *hard { "hard_noise" } else { "soft_noise" },
                    );
                    self.tex_line(name, "noisebasis", basis_str(*basis));
                    self.tex_line(name, "noisesize", &num(*size));
                    self.tex_line(name, "noisedepth", &format!("{}", *detail as i64));
                    self.tex_line(name, "bright", &num(*brightness));
                    self.tex_line(name, "contrast", &num(*contrast));
                }
                NoiseKind::Fbm => {
                    self.tex_line(name, "type", "fbm");
                    self.tex_line(name, "octaves", &format!("{}", *detail as i64));
                    self.tex_line(name, "roughness", &num(*contrast));
                }
                NoiseKind::DistortedNoise => {
                    self.tex_line(name, "type", "blender_distortednoise");
                    self.tex_line(name, "noise_distortion", basis_str(*basis));
                    self.tex_line(name, "noisebasis", basis_str(*basis));
                    self.tex_line(name, "noisesize", &num(*size));
                    self.tex_line(name, "distamount", &num(*distortion));
                    self.tex_line(name, "bright", &num(*brightness));
                    self.tex_line(name, "contrast", &num(*contrast));
                }
            },
            NodeKind::Band {
                stops,
                offsets,
                amount,
            } => {
                self.tex_line(name, "type", "band");
                let a = self.input_value(amount);
                self.tex_line(name, "amount", &a);
                for (i, (stop, offset)) in stops.iter().zip(offsets.iter()).enumerate() {
                    self.tex_line(name, &format!("offset{i}"), &format!("{offset:.3}"));
                    self.tex_line(name, &format!("value{i}"), &col(*stop));
                }
            }
            NodeKind::FresnelColor { color, tex } => {
                self.tex_line(name, "type", "fresnelcolor");
                match tex {
                    Some(id) => {
                        let t = self.node_ref(*id);
                        self.tex_line(name, "kr", &format!("\"{t}\""));
                    }
                    None => {
                        let c = col(*color);
                        self.tex_line(name, "kr", &c);
                    }
                }
            }
        }
    }

    /// A texture slot value: a quoted reference or an inline literal.
    fn input_value(&self, input: &NodeInput) -> String {
        match input {
            NodeInput::Node(id) => format!("\"{}\"", self.node_ref(*id)),
            NodeInput::Value(v) => num(*v),
            NodeInput::Color(c) => col(*c),
        }
    }

    /// A math operand, wrapped in a derived scale texture when its amount
    /// is not 1.
    fn scaled_operand(
        &mut self,
        name: &str,
        slot: usize,
        tex: Option<NodeId>,
        amount: f64,
    ) -> String {
        let Some(id) = tex else {
            return num(amount);
        };
        let t = self.node_ref(id);
        if amount == 1.0 {
            return format!("\"{t}\"");
        }
        let wrapped = format!("{name}_amount{slot}");
        if !self.cache.contains_name(&wrapped) {
            self.tex_line(&wrapped, "type", "scale");
            self.tex_line(&wrapped, "texture1", &format!("\"{t}\""));
            self.tex_line(&wrapped, "texture2", &num(amount));
            self.cache.record_name(&wrapped);
        }
        format!("\"{wrapped}\"")
    }

    /// One side of a color combinator, tinted through a derived scale
    /// texture unless the tint is pure white.
    fn tinted_side(&mut self, name: &str, slot: usize, tex: Option<NodeId>, color: Rgb) -> String {
        let Some(id) = tex else {
            return col(color);
        };
        let t = self.node_ref(id);
        if color.is_pure_white() {
            return format!("\"{t}\"");
        }
        let mixed = format!("{name}_colormix{slot}");
        if !self.cache.contains_name(&mixed) {
            self.tex_line(&mixed, "type", "scale");
            self.tex_line(&mixed, "texture1", &col(color));
            self.tex_line(&mixed, "texture2", &format!("\"{t}\""));
            self.cache.record_name(&mixed);
        }
        format!("\"{mixed}\"")
    }
}
