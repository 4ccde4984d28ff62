//! The material IR: a closed sum of material kinds plus the shared channel
//! map, alpha channel, and surface modifier data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::fingerprint::shader_fingerprint;
use crate::node::{NodeId, NodeKind};
use crate::pool::NodePool;

/// Default matte micro-roughness (sigma).
pub const DEFAULT_MATTE_ROUGHNESS: f64 = 0.4;

/// Floor for glossiness values on the 0-10000 scale; a zero would make the
/// specular lobe degenerate.
pub const MIN_GLOSSINESS: i32 = 1200;

/// Floor for metal polish on the 0-10000 scale.
pub const METAL_DEFAULT_POLISH: i32 = 9500;

/// Named channel slots a material may bind to a node in its pool.
///
/// Ordering is part of the export contract: channels are always walked in
/// this order so repeated runs emit identical text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Diffuse,
    Specular,
    Glossiness,
    Coat,
    Translucence,
    Ambient,
}

impl Channel {
    /// The key used for this channel in preset payloads and host bags.
    pub fn key(&self) -> &'static str {
        match self {
            Channel::Diffuse => "diffuse",
            Channel::Specular => "specular",
            Channel::Glossiness => "glossiness",
            Channel::Coat => "coat",
            Channel::Translucence => "translucence",
            Channel::Ambient => "ambient",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "diffuse" => Channel::Diffuse,
            "specular" => Channel::Specular,
            "glossiness" => Channel::Glossiness,
            "coat" => Channel::Coat,
            "translucence" => Channel::Translucence,
            "ambient" => Channel::Ambient,
            _ => return None,
        })
    }
}

/// Metal presets understood by the backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetalPreset {
    Aluminum,
    Copper,
    Gold,
    Nickel,
    Silver,
}

impl MetalPreset {
    pub fn name(&self) -> &'static str {
        match self {
            MetalPreset::Aluminum => "aluminum",
            MetalPreset::Copper => "copper",
            MetalPreset::Gold => "gold",
            MetalPreset::Nickel => "nickel",
            MetalPreset::Silver => "silver",
        }
    }
}

/// Cloth weave presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClothPreset {
    Denim,
    SilkCharmeuse,
    SilkShantung,
}

impl ClothPreset {
    pub fn name(&self) -> &'static str {
        match self {
            ClothPreset::Denim => "denim",
            ClothPreset::SilkCharmeuse => "silk_charmeuse",
            ClothPreset::SilkShantung => "silk_shantung",
        }
    }
}

/// Glass sub-types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlassKind {
    Standard,
    Architectural,
    Frosted,
}

/// The closed set of material kinds.
///
/// Adding a variant here is a compile error in every backend until its
/// exporter (or degrade mapping) is updated, which is the point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaterialKind {
    Matte {
        roughness: f64,
        translucent: bool,
    },
    Glossy {
        u_glossiness: i32,
        v_glossiness: i32,
        top_coat: bool,
        translucent: bool,
    },
    Skin {
        u_glossiness: i32,
        v_glossiness: i32,
        fresnel: f64,
        top_coat: bool,
    },
    Glass {
        glass_kind: GlassKind,
        ior: f64,
    },
    Metal {
        preset: MetalPreset,
        h_polish: i32,
        v_polish: i32,
    },
    Mirror,
    Velvet {
        thickness: f64,
    },
    Water {
        clarity: f64,
    },
    Cloth {
        preset: ClothPreset,
        u_repeat: f64,
        v_repeat: f64,
    },
    /// Light-emitting surface; the actual light is exported elsewhere.
    Light {
        gain: f64,
        use_alpha: bool,
    },
    /// Invisible pass-through.
    Null,
    /// Blend of two sibling materials by name.
    Mix {
        material1: String,
        material2: String,
        amount: f64,
    },
}

impl MaterialKind {
    /// A gray matte material, the universal fallback.
    pub fn default_matte() -> Self {
        MaterialKind::Matte {
            roughness: DEFAULT_MATTE_ROUGHNESS,
            translucent: false,
        }
    }

    pub fn default_glossy() -> Self {
        MaterialKind::Glossy {
            u_glossiness: MIN_GLOSSINESS,
            v_glossiness: MIN_GLOSSINESS,
            top_coat: false,
            translucent: false,
        }
    }

    /// Three-letter code used in preset records.
    pub fn short_name(&self) -> &'static str {
        match self {
            MaterialKind::Matte { .. } => "MAT",
            MaterialKind::Glossy { .. } => "GLS",
            MaterialKind::Skin { .. } => "SKN",
            MaterialKind::Glass { .. } => "GLA",
            MaterialKind::Metal { .. } => "MTL",
            MaterialKind::Mirror => "MIR",
            MaterialKind::Velvet { .. } => "VLV",
            MaterialKind::Water { .. } => "WTR",
            MaterialKind::Cloth { .. } => "CLO",
            MaterialKind::Light { .. } => "LGT",
            MaterialKind::Null => "NUL",
            MaterialKind::Mix { .. } => "MIX",
        }
    }

    /// Builds the kind identified by a short code, with default parameters.
    pub fn from_short_name(code: &str) -> Option<Self> {
        Some(match code {
            "MAT" => MaterialKind::default_matte(),
            "GLS" => MaterialKind::default_glossy(),
            "SKN" => MaterialKind::Skin {
                u_glossiness: MIN_GLOSSINESS,
                v_glossiness: MIN_GLOSSINESS,
                fresnel: 0.07,
                top_coat: false,
            },
            "GLA" => MaterialKind::Glass {
                glass_kind: GlassKind::Standard,
                ior: 1.52,
            },
            "MTL" => MaterialKind::Metal {
                preset: MetalPreset::Aluminum,
                h_polish: METAL_DEFAULT_POLISH,
                v_polish: METAL_DEFAULT_POLISH,
            },
            "MIR" => MaterialKind::Mirror,
            "VLV" => MaterialKind::Velvet { thickness: 0.1 },
            "WTR" => MaterialKind::Water { clarity: 1.0 },
            "CLO" => MaterialKind::Cloth {
                preset: ClothPreset::Denim,
                u_repeat: 1.0,
                v_repeat: 1.0,
            },
            "LGT" => MaterialKind::Light {
                gain: 1.0,
                use_alpha: false,
            },
            "NUL" => MaterialKind::Null,
            "MIX" => MaterialKind::Mix {
                material1: String::new(),
                material2: String::new(),
                amount: 0.5,
            },
            _ => return None,
        })
    }
}

/// Alpha channel data shared by every kind that supports transparency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaChannel {
    /// Name of the alpha map node in the material's pool, if any.
    pub map: Option<String>,
    /// Opacity in 0.0-1.0; 1.0 with no map means fully opaque.
    pub strength: f64,
}

impl AlphaChannel {
    /// True when the channel actually affects the render and therefore
    /// forces the two-material blend emission.
    pub fn is_active(&self) -> bool {
        self.map.is_some() || self.strength < 1.0
    }
}

impl Default for AlphaChannel {
    fn default() -> Self {
        Self {
            map: None,
            strength: 1.0,
        }
    }
}

/// A bump map binding with its clamp bounds and strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BumpMap {
    /// Node name in the material's pool.
    pub map: String,
    pub strength: f64,
    pub positive: f64,
    pub negative: f64,
}

/// A displacement map binding with its clamp bounds and strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplacementMap {
    pub map: String,
    pub strength: f64,
    pub positive: f64,
    pub negative: f64,
    pub subdivisions: u32,
}

/// Surface modifiers shared by the displaceable kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceModifiers {
    pub bump: Option<BumpMap>,
    pub displacement: Option<DisplacementMap>,
}

/// A converted material: kind, channel bindings, and the exclusively-owned
/// node pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    /// Unique within the owning object.
    pub name: String,
    /// Internal name of the owning object.
    pub object_id: String,
    /// Geometry file of the owning object; part of the fingerprint identity.
    pub geometry_file: String,
    pub kind: MaterialKind,
    /// Channel name to node-name bindings. Resolution against the pool can
    /// fail (an unresolved reference diagnostic), so bindings stay by name.
    pub channels: BTreeMap<Channel, String>,
    pub pool: NodePool,
    pub alpha: AlphaChannel,
    pub modifiers: SurfaceModifiers,
    /// Set when the ambient channel carried a non-black color and a positive
    /// light gain.
    pub emits_light: bool,
    pub light_gain: f64,
    pub visible_in_render: bool,
    /// True once any field changed after the initial conversion.
    pub edited: bool,
    /// Id of the preset set that produced this material, if any.
    pub preset_set_id: Option<String>,
    fingerprint: Option<String>,
}

impl Material {
    pub fn new(
        name: impl Into<String>,
        object_id: impl Into<String>,
        geometry_file: impl Into<String>,
        kind: MaterialKind,
    ) -> Self {
        Self {
            name: name.into(),
            object_id: object_id.into(),
            geometry_file: geometry_file.into(),
            kind,
            channels: BTreeMap::new(),
            pool: NodePool::new(),
            alpha: AlphaChannel::default(),
            modifiers: SurfaceModifiers::default(),
            emits_light: false,
            light_gain: 0.0,
            visible_in_render: true,
            edited: false,
            preset_set_id: None,
            fingerprint: None,
        }
    }

    /// Globally unique export name, `object:material` with separator-hostile
    /// characters stripped.
    pub fn unique_name(&self) -> String {
        format!(
            "{}:{}",
            sanitize_name(&self.object_id),
            sanitize_name(&self.name)
        )
    }

    pub fn set_channel(&mut self, channel: Channel, node_name: impl Into<String>) {
        self.channels.insert(channel, node_name.into());
    }

    pub fn clear_channel(&mut self, channel: Channel) {
        self.channels.remove(&channel);
    }

    /// Resolves a channel binding against the pool.
    pub fn channel_node(&self, channel: Channel) -> Option<NodeId> {
        self.channels
            .get(&channel)
            .and_then(|name| self.pool.lookup(name))
    }

    /// Collects the texture identities linked to this material: image-map
    /// file names from the diffuse chain, the diffuse constant's color name
    /// when no map exists, and any alpha map files. This is the texture list
    /// fed into the fingerprint.
    pub fn texture_identities(&self) -> Vec<String> {
        let mut ids = Vec::new();
        if let Some(diffuse) = self.channel_node(Channel::Diffuse) {
            self.collect_image_files(diffuse, &mut ids);
            if ids.is_empty() {
                if let NodeKind::Constant { color } = &self.pool.get(diffuse).kind {
                    ids.push(color.hex_name());
                }
            }
        }
        if let Some(alpha_name) = &self.alpha.map {
            if let Some(alpha) = self.pool.lookup(alpha_name) {
                self.collect_image_files(alpha, &mut ids);
            }
        }
        ids
    }

    fn collect_image_files(&self, root: NodeId, out: &mut Vec<String>) {
        let node = self.pool.get(root);
        if let NodeKind::ImageMap { file, .. } = &node.kind {
            out.push(file.clone());
        }
        for dep in node.references() {
            self.collect_image_files(dep, out);
        }
    }

    /// The content-addressable id of this material, computed on first use
    /// and cached until the material is edited.
    pub fn fingerprint_id(&mut self) -> String {
        if self.fingerprint.is_none() {
            let textures = self.texture_identities();
            self.fingerprint = Some(shader_fingerprint(
                &self.geometry_file,
                &self.name,
                &textures,
            ));
        }
        self.fingerprint.clone().unwrap_or_default()
    }

    /// Marks the material as user-modified and invalidates the cached
    /// fingerprint.
    pub fn mark_edited(&mut self) {
        self.edited = true;
        self.fingerprint = None;
    }

    /// Rebuilds this material as a different kind, keeping the channel map,
    /// pool, alpha channel, and modifiers.
    pub fn change_kind(&mut self, new_kind: MaterialKind) {
        self.kind = new_kind;
        self.mark_edited();
    }

    /// Per-kind constant color used when a preset or fallback needs a
    /// neutral diffuse.
    pub fn fallback_diffuse() -> Rgb {
        Rgb::gray(0.5)
    }
}

/// Strips characters that collide with the exporters' name separators.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ':' | '"' | '[' | ']' | '\\' | '\n' | '\t' => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeKind, TextureNode, ValueDomain};

    #[test]
    fn test_short_name_round_trip() {
        for code in [
            "MAT", "GLS", "SKN", "GLA", "MTL", "MIR", "VLV", "WTR", "CLO", "LGT", "NUL", "MIX",
        ] {
            let kind = MaterialKind::from_short_name(code).expect(code);
            assert_eq!(kind.short_name(), code);
        }
        assert!(MaterialKind::from_short_name("XXX").is_none());
    }

    #[test]
    fn test_unique_name_is_sanitized() {
        let mat = Material::new("Tor:so", "Figure 1", "fig.obj", MaterialKind::default_matte());
        assert_eq!(mat.unique_name(), "Figure 1:Tor_so");
    }

    #[test]
    fn test_alpha_active() {
        let mut alpha = AlphaChannel::default();
        assert!(!alpha.is_active());
        alpha.strength = 0.5;
        assert!(alpha.is_active());
        alpha.strength = 1.0;
        alpha.map = Some("mask".into());
        assert!(alpha.is_active());
    }

    #[test]
    fn test_texture_identities_prefers_image_files() {
        let mut mat = Material::new("Seat", "chair01", "chair01.obj", MaterialKind::default_matte());
        let img = TextureNode::new(
            "wood",
            ValueDomain::Color,
            NodeKind::ImageMap {
                file: "textures/wood.jpg".into(),
                gain: 1.0,
                gamma: 2.2,
                u_tile: 1.0,
                v_tile: 1.0,
                u_offset: 0.0,
                v_offset: 0.0,
                normal_map: false,
            },
        );
        mat.pool.insert(img);
        mat.set_channel(Channel::Diffuse, "wood");
        assert_eq!(mat.texture_identities(), vec!["textures/wood.jpg"]);
    }

    #[test]
    fn test_texture_identities_falls_back_to_color_name() {
        let mut mat = Material::new("Seat", "chair01", "chair01.obj", MaterialKind::default_matte());
        mat.pool.insert(TextureNode::new(
            "kd",
            ValueDomain::Color,
            NodeKind::Constant {
                color: Rgb::new(1.0, 0.0, 0.0),
            },
        ));
        mat.set_channel(Channel::Diffuse, "kd");
        assert_eq!(mat.texture_identities(), vec!["#ff0000"]);
    }

    #[test]
    fn test_fingerprint_cached_until_edit() {
        let mut mat = Material::new("Seat", "chair01", "chair01.obj", MaterialKind::default_matte());
        let a = mat.fingerprint_id();
        let b = mat.fingerprint_id();
        assert_eq!(a, b);
        mat.mark_edited();
        assert!(mat.edited);
        // same inputs still produce the same id after invalidation
        assert_eq!(mat.fingerprint_id(), a);
    }
}
