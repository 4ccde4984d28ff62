//! The legacy shader bag adapter.
//!
//! Host adapters hand the converter a nested string-keyed map. Everything in
//! it is optional except the top-level object itself; missing or mistyped
//! entries fall back to neutral values so one sloppy exporter cannot abort a
//! whole conversion run. This is the only module that touches raw
//! [`serde_json::Value`] channel data.

use serde_json::{Map, Value};

use matforge_ir::Rgb;

/// Well-known channel keys, as written by the host adapters.
pub const KEY_DIFFUSE: &str = "diffuse";
pub const KEY_DIFFUSE2: &str = "diffuse 2";
pub const KEY_SPECULAR: &str = "specular";
pub const KEY_SPECULAR2: &str = "specular 2";
pub const KEY_COAT: &str = "coat";
pub const KEY_TRANSLUCENCE: &str = "translucence";
pub const KEY_AMBIENT: &str = "ambient";
pub const KEY_ALPHA: &str = "alpha";
pub const KEY_BUMP: &str = "bump";
pub const KEY_DISPLACEMENT: &str = "displacement";

/// A validated view over one material's raw shader data.
pub struct ShaderBag<'a> {
    map: &'a Map<String, Value>,
    nodes: Option<&'a Map<String, Value>>,
}

impl<'a> ShaderBag<'a> {
    /// Validates the top-level shape. The only hard requirements are that
    /// the value is an object and that `nodes`, when present, is an object
    /// too; everything else degrades to defaults.
    pub fn parse(raw: &'a Value) -> Option<Self> {
        let map = raw.as_object()?;
        let nodes = match map.get("nodes") {
            None => None,
            Some(v) => Some(v.as_object()?),
        };
        Some(Self { map, nodes })
    }

    /// The material name as exported by the host, if any.
    pub fn name(&self) -> Option<&'a str> {
        self.map.get("name").and_then(Value::as_str)
    }

    /// Origin renderer tag (`source`), lowercased conventionally by hosts.
    pub fn source(&self) -> &'a str {
        self.map
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// The explicit type hint; `"undefined"` is the host's none sentinel.
    pub fn type_hint(&self) -> Option<&'a str> {
        match self.map.get("type").and_then(Value::as_str) {
            None | Some("undefined") | Some("") => None,
            Some(hint) => Some(hint),
        }
    }

    pub fn preset(&self) -> Option<&'a str> {
        match self.map.get("preset").and_then(Value::as_str) {
            None | Some("") => None,
            Some(p) => Some(p),
        }
    }

    pub fn is_skin(&self) -> bool {
        self.bool_value("isSkin", false)
    }

    pub fn u_roughness(&self) -> f64 {
        self.f64_value("uRoughness", 0.0)
    }

    pub fn v_roughness(&self) -> f64 {
        self.f64_value("vRoughness", self.u_roughness())
    }

    /// Node name of the roughness map, if one is linked.
    pub fn roughness_map(&self) -> Option<&'a str> {
        non_empty_str(self.map.get("roughness map"))
    }

    /// Node name of the normal map, if one is linked.
    pub fn normal_map(&self) -> Option<&'a str> {
        non_empty_str(self.map.get("normalMap"))
    }

    pub fn light_gain(&self) -> f64 {
        self.f64_value("lightGain", 0.0)
    }

    pub fn light_alpha(&self) -> bool {
        self.bool_value("lightAlpha", false)
    }

    /// One channel sub-map; absent channels read as an empty bag.
    pub fn channel(&self, key: &str) -> ChannelBag<'a> {
        ChannelBag {
            map: self.map.get(key).and_then(Value::as_object),
        }
    }

    pub fn has_channel(&self, key: &str) -> bool {
        self.map.get(key).and_then(Value::as_object).is_some()
    }

    /// The raw data of one named node from the bag's `nodes` table.
    pub fn node_data(&self, name: &str) -> Option<&'a Map<String, Value>> {
        self.nodes?.get(name)?.as_object()
    }

    pub fn f64_value(&self, key: &str, default: f64) -> f64 {
        self.map.get(key).and_then(Value::as_f64).unwrap_or(default)
    }

    pub fn bool_value(&self, key: &str, default: bool) -> bool {
        self.map.get(key).and_then(Value::as_bool).unwrap_or(default)
    }
}

/// One channel's sub-map: a color, an optional map reference, and scalars.
#[derive(Clone, Copy)]
pub struct ChannelBag<'a> {
    map: Option<&'a Map<String, Value>>,
}

impl<'a> ChannelBag<'a> {
    pub fn exists(&self) -> bool {
        self.map.is_some()
    }

    /// Channel color; an unset color reads as black.
    pub fn color(&self) -> Rgb {
        match self.map.and_then(|m| m.get("color")) {
            Some(v) => Rgb::from_float_list(v),
            None => Rgb::PURE_BLACK,
        }
    }

    pub fn has_color(&self) -> bool {
        self.map.map(|m| m.contains_key("color")).unwrap_or(false)
    }

    /// Name of this channel's map node, if linked.
    pub fn map_name(&self) -> Option<&'a str> {
        non_empty_str(self.map.and_then(|m| m.get("map")))
    }

    pub fn strength(&self) -> f64 {
        self.scalar("strength", 1.0)
    }

    /// Positive clamp bound for bump/displacement channels.
    pub fn positive(&self) -> f64 {
        self.scalar("pos", 0.001)
    }

    /// Negative clamp bound for bump/displacement channels.
    pub fn negative(&self) -> f64 {
        self.scalar("neg", -0.001)
    }

    pub fn flag(&self, key: &str, default: bool) -> bool {
        self.map
            .and_then(|m| m.get(key))
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    pub fn scalar(&self, key: &str, default: f64) -> f64 {
        self.map
            .and_then(|m| m.get(key))
            .and_then(Value::as_f64)
            .unwrap_or(default)
    }
}

fn non_empty_str(v: Option<&Value>) -> Option<&str> {
    match v.and_then(Value::as_str) {
        None | Some("") => None,
        s => s,
    }
}
