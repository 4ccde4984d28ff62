//! Linear RGB color values and the normalization helpers used by the
//! conversion pipeline.

use serde::{Deserialize, Serialize};

const EPS: f64 = 1.0 / 512.0;

/// A linear RGB triple with components in the 0.0-1.0 range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    /// Replacement for an exactly pure-white color. Exact white destabilizes
    /// the shading math of unbiased renderers, so conversions silently
    /// substitute this near-white instead.
    pub const WHITE: Rgb = Rgb::new(240.0 / 255.0, 240.0 / 255.0, 240.0 / 255.0);

    /// Replacement for an exactly pure-black color.
    pub const BLACK: Rgb = Rgb::new(15.0 / 255.0, 15.0 / 255.0, 15.0 / 255.0);

    /// Neutral mid gray, used as a last-resort stand-in for unconvertible
    /// grayscale nodes.
    pub const MEDIUM_GRAY: Rgb = Rgb::new(0.5, 0.5, 0.5);

    /// Exact white.
    pub const PURE_WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    /// Exact black.
    pub const PURE_BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

    /// Maximum HSL lightness allowed for a constant specular color, on the
    /// 0.0-1.0 scale. Brighter specular constants overpower unbiased
    /// renderers.
    pub const MAX_SPECULAR_LIGHTNESS: f64 = 25.0 / 255.0;

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(v: f64) -> Self {
        Self { r: v, g: v, b: v }
    }

    /// Parses a `[r, g, b]` float list; anything malformed reads as black,
    /// the same as an unset host color.
    pub fn from_float_list(value: &serde_json::Value) -> Self {
        match value.as_array() {
            Some(list) if list.len() >= 3 => {
                let c = |i: usize| list[i].as_f64().unwrap_or(0.0).clamp(0.0, 1.0);
                Rgb::new(c(0), c(1), c(2))
            }
            _ => Rgb::PURE_BLACK,
        }
    }

    /// True when every component is at full brightness.
    pub fn is_pure_white(&self) -> bool {
        self.r >= 1.0 - EPS && self.g >= 1.0 - EPS && self.b >= 1.0 - EPS
    }

    /// True when the color is black within tolerance.
    pub fn is_black(&self) -> bool {
        self.r <= EPS && self.g <= EPS && self.b <= EPS
    }

    /// Scales every component by `factor`.
    pub fn dimmed(&self, factor: f64) -> Self {
        Rgb::new(self.r * factor, self.g * factor, self.b * factor)
    }

    /// HSL lightness: midpoint of the min and max components.
    pub fn lightness(&self) -> f64 {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        (max + min) / 2.0
    }

    /// Caps the HSL lightness at `cap`, preserving hue by scaling all
    /// components uniformly.
    pub fn with_lightness_cap(&self, cap: f64) -> Self {
        let l = self.lightness();
        if l <= cap || l == 0.0 {
            *self
        } else {
            self.dimmed(cap / l)
        }
    }

    /// Luma on the integer-weighted scale used by the host applications:
    /// `(11 r + 16 g + 5 b) / 32`.
    pub fn luma(&self) -> f64 {
        (11.0 * self.r + 16.0 * self.g + 5.0 * self.b) / 32.0
    }

    /// CSS-style `#rrggbb` name, used as the identity of a constant-color
    /// texture when computing fingerprints.
    pub fn hex_name(&self) -> String {
        let q = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", q(self.r), q(self.g), q(self.b))
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Rgb::PURE_WHITE
    }
}
