//! The conversion pipeline: raw host shader data in, classified material out.
//!
//! Stages, in order: parse the bag, build the channel node graph, assemble
//! the material, look up a preset override by fingerprint, then classify
//! heuristically if no override decided the kind. Every failure along the
//! way degrades locally and is reported in the returned diagnostic list;
//! one bad material never aborts a run.

use log::warn;
use serde_json::Value;

use matforge_ir::material::METAL_DEFAULT_POLISH;
use matforge_ir::node::{MathOp, NodeKind, TextureNode, ValueDomain};
use matforge_ir::{
    BumpMap, Channel, Diagnostic, DiagnosticCode, DisplacementMap, Material, MaterialKind, NodeId,
    NodePool, Rgb,
};

use crate::bag::{self, ShaderBag};
use crate::classify::{Classifier, SurfaceTraits};
use crate::nodes::NodeConverter;
use crate::preset::{apply_preset, MergePolicy, PresetStore};

/// Glossiness correction for the biased-to-unbiased renderer difference.
const SPECULAR_CORRECTION: f64 = 0.7;

/// Specular colors without a map are far too bright for unbiased renderers.
const SPECULAR_NO_MAP_DIM: f64 = 0.25;

/// Bump values use a much larger magnitude convention than normal maps;
/// this rescales bump output when the two are merged into one slot.
const BUMP_TO_NORMAL_SCALE: f64 = 0.0008;

/// Bump strength adjustment applied when a bump map is merged with a
/// normal map.
const BUMP_STRENGTH_CORRECTION: f64 = 0.66;

/// Identity of the object that owns the materials being converted.
#[derive(Debug, Clone)]
pub struct ObjectContext {
    /// Internal object name, unique within the scene.
    pub object_id: String,
    /// Geometry file backing the object; part of the fingerprint identity.
    pub geometry_file: String,
}

impl ObjectContext {
    pub fn new(object_id: impl Into<String>, geometry_file: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            geometry_file: geometry_file.into(),
        }
    }
}

/// A converted material plus everything that went wrong on the way.
#[derive(Debug)]
pub struct Conversion {
    pub material: Material,
    pub diagnostics: Vec<Diagnostic>,
}

/// Converts one raw shader bag, classifying the kind via hint, preset
/// override, and heuristics, in that order.
pub fn convert_material(
    object: &ObjectContext,
    material_name: &str,
    raw: &Value,
    store: &dyn PresetStore,
) -> Conversion {
    convert_inner(object, material_name, raw, store, None)
}

/// Converts with a caller-chosen kind, bypassing preset lookup and
/// classification. Used when the user re-kinds an existing material.
pub fn convert_material_as(
    object: &ObjectContext,
    material_name: &str,
    raw: &Value,
    store: &dyn PresetStore,
    kind: MaterialKind,
) -> Conversion {
    convert_inner(object, material_name, raw, store, Some(kind))
}

fn convert_inner(
    object: &ObjectContext,
    material_name: &str,
    raw: &Value,
    store: &dyn PresetStore,
    forced_kind: Option<MaterialKind>,
) -> Conversion {
    let mut diags = Vec::new();
    let Some(bag) = ShaderBag::parse(raw) else {
        warn!(
            "invalid shader data for {}:{}, substituting gray matte",
            object.object_id, material_name
        );
        diags.push(Diagnostic::for_material(
            DiagnosticCode::MalformedShaderData,
            "shader data is not the expected nested map",
            format!("{}:{}", object.object_id, material_name),
        ));
        return fallback_matte(object, material_name, diags);
    };

    let classifier = Classifier::new();
    let special = classifier.special_name(&object.object_id, material_name);
    if let Some((kind @ MaterialKind::Light { .. }, _)) = &special {
        // Mesh-light props skip channel conversion entirely.
        let mut kind = kind.clone();
        if let MaterialKind::Light { gain, use_alpha } = &mut kind {
            let bag_gain = bag.light_gain();
            if bag_gain > 0.0 {
                *gain = bag_gain;
            }
            *use_alpha = bag.light_alpha();
        }
        let material = Material::new(material_name, &object.object_id, &object.geometry_file, kind);
        return Conversion {
            material,
            diagnostics: diags,
        };
    }

    let mut pipeline = Pipeline {
        bag: &bag,
        mat_id: material_name,
        unique: format!("{}:{}", object.object_id, material_name),
        pool: NodePool::new(),
        diags,
    };

    let mut material = Material::new(
        material_name,
        &object.object_id,
        &object.geometry_file,
        MaterialKind::default_matte(),
    );

    // Channel graph construction.
    let diffuse = pipeline.diffuse();
    let (u_glossiness, v_glossiness) = pipeline.glossiness_values();
    let specular = pipeline.specular();
    let glossiness_map = pipeline.glossiness_map();
    let coat = pipeline.coat();
    let translucence = pipeline.translucence();
    let alpha = pipeline.alpha();
    let bump = pipeline.bump();
    let displacement = pipeline.displacement();
    let (emits_light, light_gain, ambient) = pipeline.ambient();

    let traits = SurfaceTraits {
        diffuse_node: Some(diffuse),
        specular_node: Some(specular),
        specular_color: pipeline.bag.channel(bag::KEY_SPECULAR).color(),
        has_specular_map: pipeline
            .bag
            .channel(bag::KEY_SPECULAR)
            .map_name()
            .is_some(),
        has_alt_specular_map: pipeline
            .bag
            .channel(bag::KEY_SPECULAR2)
            .map_name()
            .is_some(),
        specular_is_flat: matches!(
            pipeline.pool.get(specular).kind,
            NodeKind::Constant { .. }
        ),
        u_glossiness,
        v_glossiness,
    };

    let Pipeline {
        pool, mut diags, ..
    } = pipeline;

    material.pool = pool;
    set_channel_node(&mut material, Channel::Diffuse, Some(diffuse));
    set_channel_node(&mut material, Channel::Specular, Some(specular));
    set_channel_node(&mut material, Channel::Glossiness, glossiness_map);
    set_channel_node(&mut material, Channel::Coat, coat);
    set_channel_node(&mut material, Channel::Translucence, translucence);
    set_channel_node(&mut material, Channel::Ambient, ambient);
    material.alpha = alpha;
    material.modifiers.bump = bump;
    material.modifiers.displacement = displacement;
    // Hair props are never converted to emitters.
    if emits_light && !object.object_id.starts_with("figureHair") {
        material.emits_light = true;
        material.light_gain = light_gain;
    }

    let has_coat = coat.is_some();
    let translucent = translucence.is_some();
    let finish = |kind| finish_kind(kind, &traits, has_coat, translucent);

    if let Some(kind) = forced_kind {
        material.kind = finish(kind);
        material.mark_edited();
        return Conversion {
            material,
            diagnostics: diags,
        };
    }

    if let Some((kind, visible)) = special {
        material.kind = finish(kind);
        material.visible_in_render = visible;
        return Conversion {
            material,
            diagnostics: diags,
        };
    }

    if let Some(hint) = bag.type_hint() {
        match classifier.kind_hint(hint, bag.preset()) {
            Some(kind) => {
                material.kind = finish(kind);
                return Conversion {
                    material,
                    diagnostics: diags,
                };
            }
            None => {
                warn!("unknown material type hint {hint:?}, falling through");
            }
        }
    }

    // Preset override: full fingerprint first, then the texture-free
    // default that matches the object regardless of applied textures.
    let fingerprint = material.fingerprint_id();
    match store.find(&fingerprint) {
        Ok(Some(record)) => {
            apply_preset(&mut material, &record, MergePolicy::Replace, &mut diags);
            material.edited = false;
            return Conversion {
                material,
                diagnostics: diags,
            };
        }
        Ok(None) => {}
        Err(err) => {
            warn!("preset lookup failed for {fingerprint}: {err}");
            diags.push(Diagnostic::for_material(
                DiagnosticCode::PresetLookupFailure,
                err.to_string(),
                material.unique_name(),
            ));
        }
    }

    let default_record = match store.find_default(&object.geometry_file, material_name) {
        Ok(found) => found,
        Err(err) => {
            warn!("default preset lookup failed: {err}");
            diags.push(Diagnostic::for_material(
                DiagnosticCode::PresetLookupFailure,
                err.to_string(),
                material.unique_name(),
            ));
            None
        }
    };

    if let Some(record) = &default_record {
        let type_only = record
            .type_only
            .as_deref()
            .map(|tag| tag.contains(bag.source()))
            .unwrap_or(false);
        if type_only {
            material.kind = finish(record.kind.clone());
            material.preset_set_id = Some(record.set_id.clone());
            return Conversion {
                material,
                diagnostics: diags,
            };
        }
    }

    material.kind = finish(classifier.heuristic_kind(material_name, bag.is_skin(), &traits));

    // A default preset overlays the heuristic result without clobbering
    // channels that carry real texture data.
    if let Some(record) = default_record {
        apply_preset(&mut material, &record, MergePolicy::ShallowReplace, &mut diags);
        material.edited = false;
    }

    Conversion {
        material,
        diagnostics: diags,
    }
}

fn set_channel_node(material: &mut Material, channel: Channel, node: Option<NodeId>) {
    if let Some(id) = node {
        let name = material.pool.get(id).name.clone();
        material.set_channel(channel, name);
    }
}

/// Patches classifier- or preset-chosen kinds with the parameters gathered
/// during channel conversion.
fn finish_kind(
    kind: MaterialKind,
    traits: &SurfaceTraits,
    has_coat: bool,
    translucent: bool,
) -> MaterialKind {
    match kind {
        MaterialKind::Matte { roughness, .. } => MaterialKind::Matte {
            roughness,
            translucent,
        },
        MaterialKind::Glossy { .. } => MaterialKind::Glossy {
            u_glossiness: traits.u_glossiness,
            v_glossiness: traits.v_glossiness,
            top_coat: has_coat,
            translucent,
        },
        MaterialKind::Skin { fresnel, .. } => MaterialKind::Skin {
            u_glossiness: traits.u_glossiness,
            v_glossiness: (traits.u_glossiness as f64 * 0.76) as i32,
            fresnel,
            top_coat: has_coat,
        },
        MaterialKind::Metal { preset, .. } => MaterialKind::Metal {
            preset,
            h_polish: METAL_DEFAULT_POLISH.max(traits.u_glossiness),
            v_polish: METAL_DEFAULT_POLISH.max(traits.v_glossiness),
        },
        other => other,
    }
}

fn fallback_matte(object: &ObjectContext, name: &str, diagnostics: Vec<Diagnostic>) -> Conversion {
    let mut material = Material::new(
        name,
        &object.object_id,
        &object.geometry_file,
        MaterialKind::default_matte(),
    );
    let node = format!("{name}_diffuse");
    material.pool.insert(TextureNode::new(
        &node,
        ValueDomain::Color,
        NodeKind::Constant {
            color: Material::fallback_diffuse(),
        },
    ));
    material.set_channel(Channel::Diffuse, node);
    Conversion {
        material,
        diagnostics,
    }
}

/// Per-material channel graph builder.
struct Pipeline<'a> {
    bag: &'a ShaderBag<'a>,
    mat_id: &'a str,
    unique: String,
    pool: NodePool,
    diags: Vec<Diagnostic>,
}

impl<'a> Pipeline<'a> {
    /// Resolves one channel map name, diagnosing names missing from the
    /// bag's node table.
    fn convert_map(&mut self, map: &str, domain: ValueDomain, unique: bool) -> Option<NodeId> {
        let id = NodeConverter::new(self.bag, &mut self.pool).convert(map, domain, unique);
        if id.is_none() {
            warn!("channel map {map:?} is not convertible, using channel color");
            self.diags.push(Diagnostic::for_material(
                DiagnosticCode::UnresolvedNodeReference,
                format!("channel map {map:?} is missing from the node table"),
                self.unique.clone(),
            ));
        }
        id
    }

    fn insert_constant(&mut self, name: &str, color: Rgb) -> NodeId {
        self.pool.insert(TextureNode::new(
            name,
            ValueDomain::Color,
            NodeKind::Constant { color },
        ))
    }

    /// Joins a converted map with its channel color. A pure-white color is
    /// a no-op tint and the map is used directly.
    fn tint(&mut self, id: NodeId, color: Rgb, name: &str) -> NodeId {
        if color.is_pure_white() {
            return id;
        }
        self.pool.insert(TextureNode::new(
            name,
            ValueDomain::Color,
            NodeKind::ColorMath {
                tex1: Some(id),
                tex2: None,
                color1: color,
                color2: Rgb::PURE_WHITE,
                op: MathOp::None,
            },
        ))
    }

    fn is_constant_of(&self, id: NodeId, test: impl Fn(&Rgb) -> bool) -> bool {
        match &self.pool.get(id).kind {
            NodeKind::Constant { color } => test(color),
            _ => false,
        }
    }

    /// Diffuse plus the alternate-diffuse combination rules.
    fn diffuse(&mut self) -> NodeId {
        let d = self.bag.channel(bag::KEY_DIFFUSE);
        let mut color = d.color();
        let mut diffuse = d
            .map_name()
            .and_then(|m| self.convert_map(m, ValueDomain::Color, false))
            .map(|id| self.tint(id, color, &format!("{}_diffuse", self.mat_id)));

        let d2 = self.bag.channel(bag::KEY_DIFFUSE2);
        if let Some(map2) = d2.map_name() {
            if let Some(raw2) = self.convert_map(map2, ValueDomain::Color, false) {
                let second = self.tint(raw2, d2.color(), &format!("{}_diffuse2", self.mat_id));
                diffuse = match diffuse {
                    // Additive combine only when the primary carries real
                    // color data; a pure white or black primary defers
                    // entirely to the alternate.
                    Some(first)
                        if !self.is_constant_of(first, Rgb::is_pure_white)
                            && !self.is_constant_of(first, Rgb::is_black) =>
                    {
                        Some(self.pool.insert(TextureNode::new(
                            &format!("{}_diffuse1_2::mixer", self.mat_id),
                            ValueDomain::Color,
                            NodeKind::ColorMath {
                                tex1: Some(first),
                                tex2: Some(second),
                                color1: Rgb::PURE_WHITE,
                                color2: Rgb::PURE_WHITE,
                                op: MathOp::Add,
                            },
                        )))
                    }
                    _ => Some(second),
                };
            }
        }

        diffuse.unwrap_or_else(|| {
            // Exact white and black destabilize the render; nudge them.
            if color.is_pure_white() {
                color = Rgb::WHITE;
            } else if color.is_black() {
                color = Rgb::BLACK;
            }
            self.insert_constant(&format!("{}_diffuse", self.mat_id), color)
        })
    }

    fn glossiness_values(&self) -> (i32, i32) {
        (
            corrected_glossiness(self.bag.u_roughness()),
            corrected_glossiness(self.bag.v_roughness()),
        )
    }

    /// Primary specular, combined multiplicatively with the alternate
    /// specular channel when one is present.
    fn specular(&mut self) -> NodeId {
        let primary = self.convert_specular(bag::KEY_SPECULAR, "1");
        let s2 = self.bag.channel(bag::KEY_SPECULAR2);
        if s2.map_name().is_some() || (s2.exists() && !s2.color().is_black()) {
            let secondary = self.convert_specular(bag::KEY_SPECULAR2, "2");
            return self.pool.insert(TextureNode::new(
                &format!("{}_CombinedSpec", self.mat_id),
                ValueDomain::Color,
                NodeKind::ColorMath {
                    tex1: Some(primary),
                    tex2: Some(secondary),
                    color1: Rgb::PURE_WHITE,
                    color2: Rgb::PURE_WHITE,
                    op: MathOp::Multiply,
                },
            ));
        }
        primary
    }

    fn convert_specular(&mut self, key: &str, suffix: &str) -> NodeId {
        let channel = self.bag.channel(key);
        let color = channel.color();
        if let Some(map) = channel.map_name() {
            if let Some(id) = self.convert_map(map, ValueDomain::Color, false) {
                // Specular maps read with linear gamma.
                if let NodeKind::ImageMap { gamma, .. } = &mut self.pool.get_mut(id).kind {
                    *gamma = 1.0;
                }
                if !color.is_pure_white() {
                    return self.tint(id, color, &format!("{}_Ks{}", self.mat_id, suffix));
                }
                // A flat specular constant must not be brighter than the
                // lightness cap.
                if let NodeKind::Constant { color } = &mut self.pool.get_mut(id).kind {
                    *color = color.with_lightness_cap(Rgb::MAX_SPECULAR_LIGHTNESS);
                }
                return id;
            }
        }
        self.insert_constant(
            &format!("{}_Ks{}", self.mat_id, suffix),
            color.dimmed(SPECULAR_NO_MAP_DIM),
        )
    }

    fn glossiness_map(&mut self) -> Option<NodeId> {
        let map = self.bag.roughness_map()?;
        self.convert_map(map, ValueDomain::Numeric, false)
    }

    /// Coat and translucence share the same shape: a numeric map converted
    /// privately, re-tagged as color, tinted by the channel color.
    fn tinted_overlay(&mut self, key: &str, name_suffix: &str) -> Option<NodeId> {
        let channel = self.bag.channel(key);
        let color = channel.color();
        if let Some(map) = channel.map_name() {
            if let Some(id) = self.convert_map(map, ValueDomain::Numeric, true) {
                self.pool.get_mut(id).domain = ValueDomain::Color;
                let name = format!("{}_{}", self.mat_id, name_suffix);
                return Some(self.tint(id, color, &name));
            }
        }
        if !color.is_pure_white() {
            return Some(
                self.insert_constant(&format!("{}_{}", self.mat_id, name_suffix), color),
            );
        }
        None
    }

    fn coat(&mut self) -> Option<NodeId> {
        self.tinted_overlay(bag::KEY_COAT, "Ka")
    }

    fn translucence(&mut self) -> Option<NodeId> {
        let channel = self.bag.channel(bag::KEY_TRANSLUCENCE);
        if !channel.flag("on", false) {
            return None;
        }
        self.tinted_overlay(bag::KEY_TRANSLUCENCE, "Kt")
    }

    fn alpha(&mut self) -> matforge_ir::AlphaChannel {
        let channel = self.bag.channel(bag::KEY_ALPHA);
        let strength = channel.strength();
        let map = channel
            .map_name()
            .and_then(|m| self.convert_map(m, ValueDomain::Numeric, true))
            .map(|id| self.pool.get(id).name.clone());
        matforge_ir::AlphaChannel { map, strength }
    }

    /// Bump and normal maps share one output slot; when both are present
    /// they merge through an additive combinator, with the bump side
    /// rescaled to the normal map's magnitude convention.
    fn bump(&mut self) -> Option<BumpMap> {
        let channel = self.bag.channel(bag::KEY_BUMP);
        let bump = channel
            .map_name()
            .and_then(|m| self.convert_map(m, ValueDomain::Numeric, true));
        let normal = self
            .bag
            .normal_map()
            .and_then(|m| self.convert_map(m, ValueDomain::Numeric, true));
        if let Some(id) = normal {
            if let NodeKind::ImageMap { normal_map, .. } = &mut self.pool.get_mut(id).kind {
                *normal_map = true;
            }
        }

        match (bump, normal) {
            (Some(bm), Some(nm)) => {
                let mixer = self.pool.insert(TextureNode::new(
                    &format!("{}_bmMixer", self.mat_id),
                    ValueDomain::Numeric,
                    NodeKind::Math {
                        tex1: Some(bm),
                        tex2: Some(nm),
                        amount1: BUMP_TO_NORMAL_SCALE,
                        amount2: 1.0,
                        op: MathOp::Add,
                    },
                ));
                Some(BumpMap {
                    map: self.pool.get(mixer).name.clone(),
                    strength: channel.strength() * BUMP_STRENGTH_CORRECTION,
                    positive: channel.positive(),
                    negative: channel.negative(),
                })
            }
            (Some(bm), None) => Some(BumpMap {
                map: self.pool.get(bm).name.clone(),
                strength: channel.strength(),
                positive: channel.positive(),
                negative: channel.negative(),
            }),
            (None, Some(nm)) => Some(BumpMap {
                map: self.pool.get(nm).name.clone(),
                strength: 1.0,
                positive: channel.positive(),
                negative: channel.negative(),
            }),
            (None, None) => None,
        }
    }

    fn displacement(&mut self) -> Option<DisplacementMap> {
        let channel = self.bag.channel(bag::KEY_DISPLACEMENT);
        let map = channel.map_name()?;
        let id = self.convert_map(map, ValueDomain::Numeric, true)?;
        Some(DisplacementMap {
            map: self.pool.get(id).name.clone(),
            strength: channel.strength(),
            positive: channel.positive(),
            negative: channel.negative(),
            subdivisions: channel.scalar("subdivision", 0.0) as u32,
        })
    }

    /// Ambient drives light emission: a non-black ambient color with a
    /// positive light gain turns the surface into an emitter.
    fn ambient(&mut self) -> (bool, f64, Option<NodeId>) {
        let channel = self.bag.channel(bag::KEY_AMBIENT);
        let color = channel.color();
        let gain = self.bag.light_gain();
        if channel.exists() && !color.is_black() && gain > 0.0 {
            let emitter = channel
                .map_name()
                .and_then(|m| self.convert_map(m, ValueDomain::Color, false))
                .map(|id| {
                    self.pool.insert(TextureNode::new(
                        &format!("{}_emitter", self.mat_id),
                        ValueDomain::Color,
                        NodeKind::ColorMath {
                            tex1: Some(id),
                            tex2: None,
                            color1: color,
                            color2: Rgb::PURE_WHITE,
                            op: MathOp::None,
                        },
                    ))
                });
            return (true, gain, emitter);
        }
        (false, 0.0, None)
    }
}

/// Roughness 0.0-1.0 to glossiness on the 0-10000 scale, corrected down for
/// unbiased rendering, with a floor replacing degenerate zeros.
fn corrected_glossiness(roughness: f64) -> i32 {
    let glossiness = ((1.0 - roughness) * 10000.0) as i32;
    let glossiness = (glossiness as f64 * SPECULAR_CORRECTION) as i32;
    if glossiness == 0 {
        matforge_ir::material::MIN_GLOSSINESS
    } else {
        glossiness
    }
}
