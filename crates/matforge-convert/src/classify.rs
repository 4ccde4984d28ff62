//! Heuristic material classification.
//!
//! The classifier is an explicit value constructed once per conversion
//! context; its name tables and thresholds are owned data, so two contexts
//! can never interfere with each other.

use matforge_ir::material::{MIN_GLOSSINESS, METAL_DEFAULT_POLISH};
use matforge_ir::{ClothPreset, GlassKind, MaterialKind, MetalPreset, NodeId, Rgb};

/// Facts about a material's converted channels that drive the
/// matte-versus-glossy decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceTraits {
    pub diffuse_node: Option<NodeId>,
    pub specular_node: Option<NodeId>,
    pub specular_color: Rgb,
    /// A map was linked to the specular channel in the bag.
    pub has_specular_map: bool,
    /// The alternate specular channel carries a map.
    pub has_alt_specular_map: bool,
    /// The converted specular node is a flat constant, or absent entirely.
    pub specular_is_flat: bool,
    pub u_glossiness: i32,
    pub v_glossiness: i32,
}

/// Ordered-heuristic material classifier.
pub struct Classifier {
    /// Glossiness at or below this, on the 0-10000 scale, reads as matte.
    matte_glossiness: i32,
    glass_needle: &'static str,
    light_prefix: &'static str,
    water_material: &'static str,
    /// Helper prop materials that render as invisible matte.
    hidden_materials: [&'static str; 3],
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            matte_glossiness: MIN_GLOSSINESS,
            glass_needle: "glass",
            light_prefix: "RealityLight",
            water_material: "RealityWater",
            hidden_materials: ["ReL_Back", "ReL_Handle", "RealityIBLSphere"],
        }
    }
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves an explicit type hint into a kind with default parameters.
    /// Accepts both the long names written by hosts and three-letter codes.
    pub fn kind_hint(&self, hint: &str, preset: Option<&str>) -> Option<MaterialKind> {
        let kind = match hint {
            "matte" => MaterialKind::default_matte(),
            "glossy" => MaterialKind::default_glossy(),
            "skin" => MaterialKind::from_short_name("SKN")?,
            "glass" => MaterialKind::Glass {
                glass_kind: glass_kind_from_preset(preset),
                ior: 1.52,
            },
            "metal" => MaterialKind::Metal {
                preset: metal_preset(preset),
                h_polish: METAL_DEFAULT_POLISH,
                v_polish: METAL_DEFAULT_POLISH,
            },
            "mirror" => MaterialKind::Mirror,
            "velvet" => MaterialKind::from_short_name("VLV")?,
            "water" => MaterialKind::from_short_name("WTR")?,
            "cloth" => MaterialKind::Cloth {
                preset: cloth_preset(preset),
                u_repeat: 1.0,
                v_repeat: 1.0,
            },
            "light" => MaterialKind::from_short_name("LGT")?,
            "null" => MaterialKind::Null,
            other => MaterialKind::from_short_name(other)?,
        };
        Some(kind)
    }

    /// Well-known names that bypass classification entirely. Returns the
    /// kind plus whether the material stays visible in renders.
    pub fn special_name(&self, object_id: &str, material_name: &str) -> Option<(MaterialKind, bool)> {
        if object_id.starts_with(self.light_prefix) || material_name.starts_with(self.light_prefix)
        {
            return Some((
                MaterialKind::Light {
                    gain: 1.0,
                    use_alpha: false,
                },
                true,
            ));
        }
        if material_name == self.water_material {
            return Some((MaterialKind::Water { clarity: 1.0 }, true));
        }
        if self.hidden_materials.contains(&material_name) {
            return Some((MaterialKind::default_matte(), false));
        }
        None
    }

    /// Steps after hint and preset resolution: skin flag, glass-name
    /// heuristic, then the specular evidence.
    pub fn heuristic_kind(
        &self,
        material_name: &str,
        is_skin: bool,
        traits: &SurfaceTraits,
    ) -> MaterialKind {
        if is_skin {
            return MaterialKind::Skin {
                u_glossiness: traits.u_glossiness,
                v_glossiness: (traits.u_glossiness as f64 * 0.76) as i32,
                fresnel: 0.07,
                top_coat: false,
            };
        }
        if material_name.to_lowercase().contains(self.glass_needle) {
            return MaterialKind::Glass {
                glass_kind: GlassKind::Standard,
                ior: 1.52,
            };
        }
        if traits.has_specular_map || !traits.specular_color.is_black() {
            return self.glossy(traits);
        }
        if self.looks_matte(traits) {
            MaterialKind::default_matte()
        } else {
            self.glossy(traits)
        }
    }

    fn glossy(&self, traits: &SurfaceTraits) -> MaterialKind {
        MaterialKind::Glossy {
            u_glossiness: traits.u_glossiness,
            v_glossiness: traits.v_glossiness,
            top_coat: false,
            translucent: false,
        }
    }

    fn looks_matte(&self, traits: &SurfaceTraits) -> bool {
        // Diffuse and specular resolve to the same node.
        if traits.diffuse_node.is_some() && traits.diffuse_node == traits.specular_node {
            return true;
        }
        // Uniform low glossiness with no alternate specular map.
        if traits.u_glossiness == traits.v_glossiness
            && traits.u_glossiness <= self.matte_glossiness
            && !traits.has_alt_specular_map
        {
            return true;
        }
        // Black specular with a flat (or missing) specular map.
        traits.specular_color.is_black() && traits.specular_is_flat
    }
}

fn glass_kind_from_preset(preset: Option<&str>) -> GlassKind {
    match preset {
        Some("architectural") => GlassKind::Architectural,
        Some("frosted") => GlassKind::Frosted,
        _ => GlassKind::Standard,
    }
}

fn metal_preset(preset: Option<&str>) -> MetalPreset {
    match preset {
        Some("steel") => MetalPreset::Nickel,
        Some("copper") => MetalPreset::Copper,
        Some("gold") => MetalPreset::Gold,
        Some("silver") => MetalPreset::Silver,
        _ => MetalPreset::Aluminum,
    }
}

fn cloth_preset(preset: Option<&str>) -> ClothPreset {
    match preset {
        Some("silk") => ClothPreset::SilkCharmeuse,
        _ => ClothPreset::Denim,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traits() -> SurfaceTraits {
        SurfaceTraits {
            specular_color: Rgb::PURE_BLACK,
            specular_is_flat: true,
            u_glossiness: MIN_GLOSSINESS,
            v_glossiness: MIN_GLOSSINESS,
            ..SurfaceTraits::default()
        }
    }

    #[test]
    fn test_skin_flag_wins() {
        let c = Classifier::new();
        let kind = c.heuristic_kind("Torso", true, &traits());
        match kind {
            MaterialKind::Skin { u_glossiness, v_glossiness, fresnel, .. } => {
                assert_eq!(v_glossiness, (u_glossiness as f64 * 0.76) as i32);
                assert_eq!(fresnel, 0.07);
            }
            other => panic!("expected skin, got {other:?}"),
        }
    }

    #[test]
    fn test_glass_name_heuristic() {
        let c = Classifier::new();
        assert!(matches!(
            c.heuristic_kind("WindowGlass", false, &traits()),
            MaterialKind::Glass { .. }
        ));
        assert!(matches!(
            c.heuristic_kind("GLASS pane", false, &traits()),
            MaterialKind::Glass { .. }
        ));
    }

    #[test]
    fn test_specular_map_forces_glossy() {
        let c = Classifier::new();
        let mut t = traits();
        t.has_specular_map = true;
        // low glossiness would otherwise read as matte
        assert!(matches!(
            c.heuristic_kind("Suit", false, &t),
            MaterialKind::Glossy { .. }
        ));
    }

    #[test]
    fn test_black_flat_specular_reads_matte() {
        let c = Classifier::new();
        assert!(matches!(
            c.heuristic_kind("Wall", false, &traits()),
            MaterialKind::Matte { .. }
        ));
    }

    #[test]
    fn test_bright_specular_reads_glossy() {
        let c = Classifier::new();
        let mut t = traits();
        t.specular_color = Rgb::new(0.5, 0.5, 0.5);
        assert!(matches!(
            c.heuristic_kind("Wall", false, &t),
            MaterialKind::Glossy { .. }
        ));
    }

    #[test]
    fn test_special_names() {
        let c = Classifier::new();
        assert!(matches!(
            c.special_name("RealityLight 1", "Panel"),
            Some((MaterialKind::Light { .. }, true))
        ));
        assert!(matches!(
            c.special_name("Pond", "RealityWater"),
            Some((MaterialKind::Water { .. }, true))
        ));
        assert_eq!(
            c.special_name("Lamp", "ReL_Handle"),
            Some((MaterialKind::default_matte(), false))
        );
        assert_eq!(c.special_name("Chair", "Seat"), None);
    }

    #[test]
    fn test_hints() {
        let c = Classifier::new();
        assert!(matches!(
            c.kind_hint("metal", Some("steel")),
            Some(MaterialKind::Metal { preset: MetalPreset::Nickel, .. })
        ));
        assert!(matches!(
            c.kind_hint("glass", Some("frosted")),
            Some(MaterialKind::Glass { glass_kind: GlassKind::Frosted, .. })
        ));
        assert!(matches!(c.kind_hint("GLS", None), Some(MaterialKind::Glossy { .. })));
        assert_eq!(c.kind_hint("banana", None), None);
    }
}
