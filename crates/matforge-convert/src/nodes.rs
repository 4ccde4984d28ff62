//! Conversion of raw bag node data into pool nodes.
//!
//! Host node graphs arrive as a flat `nodes` table of name → parameter map,
//! with a numeric `type` code per entry. The converter resolves names
//! against the material's pool so a map referenced by several channels is
//! built once, unless the caller forces a private copy (alpha, bump and
//! displacement carry per-channel strength data that must not leak into a
//! sibling channel's use of the same base map).

use log::debug;
use serde_json::{Map, Value};

use matforge_ir::node::{
    MathOp, NodeInput, NodeKind, NoiseBasis, NoiseKind, TextureNode, ValueDomain,
};
use matforge_ir::{NodeId, NodePool, Rgb};

use crate::bag::ShaderBag;

/// Host node type codes.
const TYPE_BAND: u64 = 100;
const TYPE_WOOD: u64 = 111;
const TYPE_CLOUDS: u64 = 130;
const TYPE_CONSTANT: u64 = 140;
const TYPE_FBM: u64 = 160;
const TYPE_FRESNEL: u64 = 165;
const TYPE_IMAGE_MAP: u64 = 170;
const TYPE_MIX: u64 = 190;
const TYPE_DISTORTED_NOISE: u64 = 225;
const TYPE_COLOR_MATH: u64 = 230;
const TYPE_MATH: u64 = 235;
const TYPE_COMPONENT: u64 = 250;

/// Converts bag node data into nodes of one material's pool.
pub struct NodeConverter<'a, 'p> {
    bag: &'a ShaderBag<'a>,
    pool: &'p mut NodePool,
}

impl<'a, 'p> NodeConverter<'a, 'p> {
    pub fn new(bag: &'a ShaderBag<'a>, pool: &'p mut NodePool) -> Self {
        Self { bag, pool }
    }

    /// Resolves `name` to a pool node, converting it from bag data on first
    /// use. Returns `None` for names absent from the bag or of an
    /// unsupported type; the caller falls back to the channel's color.
    ///
    /// A node already converted under a different value domain is not
    /// shared; the new use gets a domain-suffixed name so a numeric reading
    /// of a map can coexist with a color reading of the same map.
    pub fn convert(
        &mut self,
        name: &str,
        domain: ValueDomain,
        force_unique: bool,
    ) -> Option<NodeId> {
        let mut key = name.to_string();
        if let Some(existing) = self.pool.lookup(name) {
            if self.pool.get(existing).domain == domain {
                if !force_unique {
                    return Some(existing);
                }
                key = self.pool.unique_name(name);
            } else {
                key = format!(
                    "{}::{}",
                    name,
                    match domain {
                        ValueDomain::Color => "color",
                        ValueDomain::Numeric => "numeric",
                    }
                );
                if !force_unique {
                    if let Some(variant) = self.pool.lookup(&key) {
                        return Some(variant);
                    }
                }
            }
        }

        let data = self.bag.node_data(name)?.clone();
        let type_code = data.get("type").and_then(Value::as_u64).unwrap_or(0);
        match type_code {
            TYPE_BAND => Some(self.convert_band(&key, &data, force_unique)),
            TYPE_CLOUDS => Some(self.convert_clouds(&key, &data, domain)),
            TYPE_CONSTANT => Some(self.convert_constant(&key, &data, domain)),
            TYPE_FBM => Some(self.convert_fbm(&key, &data, domain)),
            TYPE_FRESNEL => Some(self.convert_fresnel(&key, &data, force_unique)),
            TYPE_IMAGE_MAP => Some(self.convert_image_map(&key, &data, domain)),
            TYPE_MIX => Some(self.convert_mix(&key, &data, domain, force_unique)),
            TYPE_DISTORTED_NOISE => Some(self.convert_distorted_noise(&key, &data, domain)),
            TYPE_COLOR_MATH => Some(self.convert_color_math(&key, &data, domain, force_unique)),
            TYPE_MATH => Some(self.convert_math(&key, &data, domain, force_unique)),
            TYPE_COMPONENT => Some(self.convert_component(&key, &data, domain, force_unique)),
            // Wood has no renderer-side equivalent and is dropped outright.
            TYPE_WOOD => {
                debug!("wood node {name:?} has no conversion, skipping");
                None
            }
            other => {
                debug!("unsupported node type {other} for {name:?}, skipping");
                None
            }
        }
    }

    /// Inserts a plain constant under `name`.
    pub fn insert_constant(&mut self, name: &str, domain: ValueDomain, color: Rgb) -> NodeId {
        self.pool
            .insert(TextureNode::new(name, domain, NodeKind::Constant { color }))
    }

    fn convert_image_map(&mut self, key: &str, data: &Map<String, Value>, domain: ValueDomain) -> NodeId {
        let file = data
            .get("fileName")
            .and_then(Value::as_str)
            .unwrap_or("")
            .replace('\\', "/");
        let kind = NodeKind::ImageMap {
            file,
            gain: num(data, "gain", 1.0),
            gamma: num(data, "gamma", 2.2),
            u_tile: num(data, "u tile", 1.0),
            v_tile: num(data, "v tile", 1.0),
            u_offset: num(data, "u offset", 0.0),
            v_offset: num(data, "v offset", 0.0),
            normal_map: data
                .get("isNormalMap")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        };
        self.pool.insert(TextureNode::new(key, domain, kind))
    }

    fn convert_constant(&mut self, key: &str, data: &Map<String, Value>, domain: ValueDomain) -> NodeId {
        let mut color = color_of(data, "value");
        // Diffuse-node gain attenuates the color when below 1.
        let gain = num(data, "gain", 1.0);
        if gain < 1.0 {
            color = color.dimmed(gain);
        }
        self.insert_constant(key, domain, color)
    }

    fn convert_band(&mut self, key: &str, data: &Map<String, Value>, force_unique: bool) -> NodeId {
        let stops = [
            color_of(data, "tex1"),
            color_of(data, "tex2"),
            color_of(data, "tex3"),
            color_of(data, "tex4"),
        ];
        let raw_offsets = data.get("offsets").and_then(Value::as_array);
        let mut offsets = [0.0; 4];
        if let Some(list) = raw_offsets {
            for (slot, v) in offsets.iter_mut().zip(list) {
                *slot = v.as_f64().unwrap_or(0.0);
            }
        }
        let amount = match str_of(data, "amount map") {
            Some(map) => match self.convert(map, ValueDomain::Numeric, true) {
                Some(id) => NodeInput::Node(id),
                None => NodeInput::Value(num(data, "amount", 0.5)),
            },
            None => NodeInput::Value(num(data, "amount", 0.5)),
        };
        let _ = force_unique;
        self.pool.insert(TextureNode::new(
            key,
            ValueDomain::Color,
            NodeKind::Band {
                stops,
                offsets,
                amount,
            },
        ))
    }

    fn convert_fresnel(&mut self, key: &str, data: &Map<String, Value>, force_unique: bool) -> NodeId {
        let color = color_of(data, "color");
        let tex = str_of(data, "map")
            .and_then(|map| self.convert(map, ValueDomain::Color, force_unique));
        self.pool.insert(TextureNode::new(
            key,
            ValueDomain::Color,
            NodeKind::FresnelColor { color, tex },
        ))
    }

    fn convert_color_math(
        &mut self,
        key: &str,
        data: &Map<String, Value>,
        domain: ValueDomain,
        force_unique: bool,
    ) -> NodeId {
        // Hosts plug color math into numeric channels freely; a numeric
        // reading defers to the math converter.
        if domain == ValueDomain::Numeric {
            return self.convert_math(key, data, domain, force_unique);
        }
        let mut op = function_of(data);

        let (tex1, color1) = self.color_math_side(key, data, "value 1", 1, force_unique);
        let (tex2, color2) = self.color_math_side(key, data, "value 2", 2, force_unique);

        if tex1.is_none() && tex2.is_none() && color1 == color2 {
            return self.insert_constant(key, ValueDomain::Color, color1);
        }
        if tex1.is_none() || tex2.is_none() {
            op = MathOp::None;
        }
        self.pool.insert(TextureNode::new(
            key,
            ValueDomain::Color,
            NodeKind::ColorMath {
                tex1,
                tex2,
                color1,
                color2,
                op,
            },
        ))
    }

    /// One side of a color math node: an optional sub-map plus a tint.
    /// A side with no map collapses its color into the tint slot.
    fn color_math_side(
        &mut self,
        key: &str,
        data: &Map<String, Value>,
        value_key: &str,
        index: usize,
        force_unique: bool,
    ) -> (Option<NodeId>, Rgb) {
        let side = data.get(value_key).and_then(Value::as_object);
        let color = side
            .map(|s| color_of(s, "color"))
            .unwrap_or(Rgb::PURE_BLACK);
        let map = side.and_then(|s| str_of(s, "map"));
        match map.and_then(|m| self.convert(m, ValueDomain::Color, force_unique)) {
            Some(id) => (Some(id), color),
            None => {
                let c = self.insert_constant(
                    &format!("{key}_tex{index}"),
                    ValueDomain::Color,
                    color,
                );
                (Some(c), Rgb::PURE_WHITE)
            }
        }
    }

    fn convert_math(
        &mut self,
        key: &str,
        data: &Map<String, Value>,
        domain: ValueDomain,
        force_unique: bool,
    ) -> NodeId {
        if domain == ValueDomain::Color {
            // A numeric node read in a color slot becomes a grayscale
            // component extraction over the first linked sub-map.
            let side1 = data.get("value 1").and_then(Value::as_object);
            let side2 = data.get("value 2").and_then(Value::as_object);
            let map = side1
                .and_then(|s| str_of(s, "map"))
                .or_else(|| side2.and_then(|s| str_of(s, "map")));
            return match map.and_then(|m| self.convert(m, ValueDomain::Numeric, force_unique)) {
                Some(tex) => self.pool.insert(TextureNode::new(
                    key,
                    ValueDomain::Color,
                    NodeKind::Component {
                        tex: Some(tex),
                        channel: 0,
                        color: Rgb::PURE_WHITE,
                    },
                )),
                None => self.insert_constant(key, ValueDomain::Color, Rgb::WHITE),
            };
        }

        let side = |s: &Map<String, Value>, k: &str| s.get(k).and_then(Value::as_object).cloned();
        let side1 = side(data, "value 1");
        let side2 = side(data, "value 2");
        let amount1 = side1.as_ref().map(|s| num(s, "value", 0.0)).unwrap_or(0.0);
        let amount2 = side2.as_ref().map(|s| num(s, "value", 0.0)).unwrap_or(0.0);
        let tex1 = side1
            .as_ref()
            .and_then(|s| str_of(s, "map"))
            .and_then(|m| self.convert(m, ValueDomain::Numeric, force_unique));
        let tex2 = side2
            .as_ref()
            .and_then(|s| str_of(s, "map"))
            .and_then(|m| self.convert(m, ValueDomain::Numeric, force_unique));
        self.pool.insert(TextureNode::new(
            key,
            ValueDomain::Numeric,
            NodeKind::Math {
                tex1,
                tex2,
                amount1,
                amount2,
                op: function_of(data),
            },
        ))
    }

    fn convert_mix(
        &mut self,
        key: &str,
        data: &Map<String, Value>,
        domain: ValueDomain,
        force_unique: bool,
    ) -> NodeId {
        let tex1 = self.mix_side(key, data, domain, force_unique, 1);
        let tex2 = self.mix_side(key, data, domain, force_unique, 2);

        let mut amount = NodeInput::Value(num(data, "mix", 0.5));
        if let Some(map) = str_of(data, "mix map") {
            if let Some(id) = self.convert(map, ValueDomain::Numeric, force_unique) {
                amount = NodeInput::Node(id);
            }
        }

        // Mixing two identical constants collapses to one constant.
        if let (NodeKind::Constant { color: c1 }, NodeKind::Constant { color: c2 }) =
            (&self.pool.get(tex1).kind, &self.pool.get(tex2).kind)
        {
            if c1 == c2 {
                let color = *c1;
                return self.insert_constant(&format!("{key}_color"), domain, color);
            }
        }
        self.pool.insert(TextureNode::new(
            key,
            domain,
            NodeKind::Mix {
                tex1: NodeInput::Node(tex1),
                tex2: NodeInput::Node(tex2),
                amount,
            },
        ))
    }

    /// One mix input: a pure-white color defers entirely to the sub-map, a
    /// tinted map gets joined with its color via a multiply, and a bare
    /// color becomes a constant (collapsed to its gray value in color
    /// context, matching the host's grayscale mixing convention).
    fn mix_side(
        &mut self,
        key: &str,
        data: &Map<String, Value>,
        domain: ValueDomain,
        force_unique: bool,
        index: usize,
    ) -> NodeId {
        let mut color = color_of(data, &format!("tex{index} color"));
        let map = str_of(data, &format!("tex{index} map"))
            .and_then(|m| self.convert(m, domain, force_unique));
        match map {
            Some(tex) if color.is_pure_white() => tex,
            Some(tex) => {
                let join_name = format!("{key}_mix{index}");
                let kind = match domain {
                    ValueDomain::Numeric => NodeKind::Math {
                        tex1: Some(tex),
                        tex2: None,
                        amount1: 1.0,
                        amount2: 0.0,
                        op: MathOp::Multiply,
                    },
                    ValueDomain::Color => NodeKind::ColorMath {
                        tex1: Some(tex),
                        tex2: None,
                        color1: color,
                        color2: Rgb::PURE_WHITE,
                        op: MathOp::None,
                    },
                };
                self.pool.insert(TextureNode::new(&join_name, domain, kind))
            }
            None => {
                if domain == ValueDomain::Color {
                    color = Rgb::gray(color.luma());
                }
                self.insert_constant(&format!("{key}_clr{index}"), domain, color)
            }
        }
    }

    fn convert_component(
        &mut self,
        key: &str,
        data: &Map<String, Value>,
        domain: ValueDomain,
        force_unique: bool,
    ) -> NodeId {
        let tex = str_of(data, "map")
            .and_then(|m| self.convert(m, ValueDomain::Color, force_unique));
        let channel = data.get("channel").and_then(Value::as_u64).unwrap_or(0) as u8;
        self.pool.insert(TextureNode::new(
            key,
            domain,
            NodeKind::Component {
                tex,
                channel,
                color: color_of(data, "color"),
            },
        ))
    }

    fn convert_clouds(&mut self, key: &str, data: &Map<String, Value>, domain: ValueDomain) -> NodeId {
        let kind = NodeKind::Noise {
            kind: NoiseKind::Clouds,
            basis: basis_of(data, "noise basis"),
            size: num(data, "size", 1.0),
            detail: num(data, "depth", 2.0),
            brightness: num(data, "brightness", 1.0),
            contrast: num(data, "contrast", 1.0),
            hard: str_of(data, "style") == Some("hard"),
            distortion: 0.0,
        };
        self.insert_noise(key, kind, domain)
    }

    fn convert_fbm(&mut self, key: &str, data: &Map<String, Value>, domain: ValueDomain) -> NodeId {
        let kind = NodeKind::Noise {
            kind: NoiseKind::Fbm,
            basis: NoiseBasis::OriginalPerlin,
            size: num(data, "scale", 1.0),
            detail: num(data, "octaves", 4.0),
            brightness: 1.0,
            contrast: num(data, "roughness", 0.5),
            hard: false,
            distortion: 0.0,
        };
        self.insert_noise(key, kind, domain)
    }

    fn convert_distorted_noise(
        &mut self,
        key: &str,
        data: &Map<String, Value>,
        domain: ValueDomain,
    ) -> NodeId {
        let kind = NodeKind::Noise {
            kind: NoiseKind::DistortedNoise,
            basis: basis_of(data, "noise basis"),
            size: num(data, "size", 1.0),
            detail: 2.0,
            brightness: num(data, "brightness", 1.0),
            contrast: num(data, "contrast", 1.0),
            hard: false,
            distortion: num(data, "amount", 1.0),
        };
        self.insert_noise(key, kind, domain)
    }

    /// Noise is numeric by nature; a color reading wraps it in a
    /// black-to-white mix driven by the noise value.
    fn insert_noise(&mut self, key: &str, kind: NodeKind, domain: ValueDomain) -> NodeId {
        if domain == ValueDomain::Numeric {
            return self
                .pool
                .insert(TextureNode::new(key, ValueDomain::Numeric, kind));
        }
        let noise = self.pool.insert(TextureNode::new(
            &format!("{key}_noise"),
            ValueDomain::Numeric,
            kind,
        ));
        let black = self.insert_constant(&format!("{key}_low"), ValueDomain::Color, Rgb::PURE_BLACK);
        let white = self.insert_constant(&format!("{key}_high"), ValueDomain::Color, Rgb::PURE_WHITE);
        self.pool.insert(TextureNode::new(
            key,
            ValueDomain::Color,
            NodeKind::Mix {
                tex1: NodeInput::Node(black),
                tex2: NodeInput::Node(white),
                amount: NodeInput::Node(noise),
            },
        ))
    }
}

fn num(data: &Map<String, Value>, key: &str, default: f64) -> f64 {
    data.get(key).and_then(Value::as_f64).unwrap_or(default)
}

fn str_of<'m>(data: &'m Map<String, Value>, key: &str) -> Option<&'m str> {
    match data.get(key).and_then(Value::as_str) {
        None | Some("") => None,
        s => s,
    }
}

fn color_of(data: &Map<String, Value>, key: &str) -> Rgb {
    match data.get(key) {
        Some(v) => Rgb::from_float_list(v),
        None => Rgb::PURE_BLACK,
    }
}

fn function_of(data: &Map<String, Value>) -> MathOp {
    match data.get("function").and_then(Value::as_str) {
        Some("m") => MathOp::Multiply,
        Some("a") => MathOp::Add,
        _ => MathOp::Subtract,
    }
}

fn basis_of(data: &Map<String, Value>, key: &str) -> NoiseBasis {
    if str_of(data, key) == Some("improved perlin") {
        NoiseBasis::ImprovedPerlin
    } else {
        NoiseBasis::OriginalPerlin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn convert_one(raw: serde_json::Value, name: &str, domain: ValueDomain) -> (NodePool, Option<NodeId>) {
        let bag = ShaderBag::parse(&raw).unwrap();
        let mut pool = NodePool::new();
        let id = NodeConverter::new(&bag, &mut pool).convert(name, domain, false);
        (pool, id)
    }

    #[test]
    fn test_image_map_conversion() {
        let raw = json!({"nodes": {"Kd": {
            "type": 170, "fileName": "tex\\wood.jpg", "gain": 0.8,
            "u tile": 2.0, "v tile": 2.0, "isNormalMap": false
        }}});
        let (pool, id) = convert_one(raw, "Kd", ValueDomain::Color);
        let node = pool.get(id.unwrap());
        match &node.kind {
            NodeKind::ImageMap { file, gain, u_tile, .. } => {
                assert_eq!(file, "tex/wood.jpg");
                assert_eq!(*gain, 0.8);
                assert_eq!(*u_tile, 2.0);
            }
            other => panic!("expected image map, got {other:?}"),
        }
    }

    #[test]
    fn test_sharing_and_forced_copies() {
        let raw = json!({"nodes": {"Kd": {"type": 140, "value": [0.5, 0.5, 0.5]}}});
        let bag = ShaderBag::parse(&raw).unwrap();
        let mut pool = NodePool::new();
        let mut conv = NodeConverter::new(&bag, &mut pool);
        let a = conv.convert("Kd", ValueDomain::Color, false).unwrap();
        let b = conv.convert("Kd", ValueDomain::Color, false).unwrap();
        assert_eq!(a, b);
        let c = conv.convert("Kd", ValueDomain::Color, true).unwrap();
        assert_ne!(a, c);
        assert_eq!(pool.get(c).name, "Kd_2");
    }

    #[test]
    fn test_domain_conflict_renames() {
        let raw = json!({"nodes": {"Map": {"type": 170, "fileName": "m.png"}}});
        let bag = ShaderBag::parse(&raw).unwrap();
        let mut pool = NodePool::new();
        let mut conv = NodeConverter::new(&bag, &mut pool);
        let color = conv.convert("Map", ValueDomain::Color, false).unwrap();
        let numeric = conv.convert("Map", ValueDomain::Numeric, false).unwrap();
        // the numeric variant is itself shared on re-request
        let again = conv.convert("Map", ValueDomain::Numeric, false).unwrap();
        assert_ne!(color, numeric);
        assert_eq!(numeric, again);
        assert_eq!(pool.get(numeric).name, "Map::numeric");
        assert_eq!(pool.get(numeric).domain, ValueDomain::Numeric);
    }

    #[test]
    fn test_unknown_node_type_skipped() {
        let raw = json!({"nodes": {"Odd": {"type": 999}}});
        let (_, id) = convert_one(raw, "Odd", ValueDomain::Color);
        assert!(id.is_none());
    }

    #[test]
    fn test_wood_node_skipped() {
        let raw = json!({"nodes": {"Grain": {"type": 111, "size": 2.0}}});
        let (pool, id) = convert_one(raw, "Grain", ValueDomain::Color);
        assert!(id.is_none());
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn test_mix_collapses_identical_constants() {
        let raw = json!({"nodes": {"M": {
            "type": 190, "mix": 0.5,
            "tex1 color": [0.2, 0.2, 0.2],
            "tex2 color": [0.2, 0.2, 0.2]
        }}});
        let (pool, id) = convert_one(raw, "M", ValueDomain::Color);
        let node = pool.get(id.unwrap());
        assert!(matches!(node.kind, NodeKind::Constant { .. }));
        assert_eq!(node.name, "M_color");
    }

    #[test]
    fn test_mix_sides_are_node_references() {
        let raw = json!({"nodes": {
            "M": {
                "type": 190, "mix": 0.3,
                "tex1 color": [0.2, 0.4, 0.6],
                "tex2 color": [1.0, 1.0, 1.0],
                "tex2 map": "Wood"
            },
            "Wood": {"type": 170, "fileName": "wood.jpg"}
        }});
        let (pool, id) = convert_one(raw, "M", ValueDomain::Color);
        let node = pool.get(id.unwrap());
        match &node.kind {
            NodeKind::Mix { tex1, tex2, amount } => {
                let left = tex1.node().unwrap();
                let right = tex2.node().unwrap();
                assert!(matches!(pool.get(left).kind, NodeKind::Constant { .. }));
                assert_eq!(pool.get(left).name, "M_clr1");
                assert!(matches!(pool.get(right).kind, NodeKind::ImageMap { .. }));
                assert_eq!(*amount, NodeInput::Value(0.3));
            }
            other => panic!("expected mix, got {other:?}"),
        }
    }

    #[test]
    fn test_numeric_noise_wrapped_for_color_use() {
        let raw = json!({"nodes": {"N": {
            "type": 130, "size": 2.0, "depth": 3.0, "style": "hard"
        }}});
        let (pool, id) = convert_one(raw, "N", ValueDomain::Color);
        let node = pool.get(id.unwrap());
        match &node.kind {
            NodeKind::Mix { tex1, tex2, amount } => {
                let noise = amount.node().expect("noise drives the mix");
                assert!(matches!(
                    pool.get(noise).kind,
                    NodeKind::Noise { kind: NoiseKind::Clouds, hard: true, .. }
                ));
                let low = tex1.node().unwrap();
                let high = tex2.node().unwrap();
                match &pool.get(low).kind {
                    NodeKind::Constant { color } => assert_eq!(*color, Rgb::PURE_BLACK),
                    other => panic!("expected low constant, got {other:?}"),
                }
                match &pool.get(high).kind {
                    NodeKind::Constant { color } => assert_eq!(*color, Rgb::PURE_WHITE),
                    other => panic!("expected high constant, got {other:?}"),
                }
            }
            other => panic!("expected mix wrapper, got {other:?}"),
        }
    }

    #[test]
    fn test_color_math_defers_to_math_in_numeric_slot() {
        let raw = json!({"nodes": {
            "CM": {"type": 230, "function": "a",
                   "value 1": {"value": 0.3, "map": "Sub"},
                   "value 2": {"value": 0.7}},
            "Sub": {"type": 140, "value": [0.1, 0.1, 0.1]}
        }});
        let (pool, id) = convert_one(raw, "CM", ValueDomain::Numeric);
        let node = pool.get(id.unwrap());
        match &node.kind {
            NodeKind::Math { amount1, amount2, op, .. } => {
                assert_eq!(*amount1, 0.3);
                assert_eq!(*amount2, 0.7);
                assert_eq!(*op, MathOp::Add);
            }
            other => panic!("expected math, got {other:?}"),
        }
        assert_eq!(node.domain, ValueDomain::Numeric);
    }
}
