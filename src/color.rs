// src/color.rs
//! Shader color math reproduced on the CPU.
//!
//! These functions mirror the composition shaders bit-for-bit where a value
//! is folded into a uniform instead of being computed per-pixel: HDR tint
//! normalization, Rec.709 grayscale weights, matcap attenuation, rim
//! intensity. Keeping them here means the decision logic and the GPU passes
//! agree on the numbers.

use glam::{Vec3, Vec4};

/// Rec.709 luma weights used for every grayscale extraction.
pub const REC709_LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Rec.709 luma of an RGB triple.
#[inline]
pub fn luma_709(rgb: [f32; 3]) -> f32 {
    Vec3::from_array(rgb).dot(Vec3::from_array(REC709_LUMA))
}

/// HDR→LDR tone mapping for tint colors.
///
/// Already-LDR colors (max(r,g,b) <= 1.0) pass through unchanged. HDR colors
/// are normalized by their maximum channel and gamma-corrected with 1/2.2.
/// Alpha is never touched. Idempotent: the first application lands the color
/// in LDR, so a second application is the identity.
pub fn tone_map_hdr(color: [f32; 4]) -> [f32; 4] {
    let c = Vec4::from_array(color);
    let max = c.x.max(c.y).max(c.z);
    if max <= 1.0 {
        return color;
    }
    let inv_gamma = 1.0 / 2.2;
    let normalized = Vec3::new(c.x, c.y, c.z) / max;
    [
        normalized.x.powf(inv_gamma),
        normalized.y.powf(inv_gamma),
        normalized.z.powf(inv_gamma),
        c.w,
    ]
}

/// The two matcap composition families. Which one applies changes the
/// formula, not just a constant, so the split is preserved as a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcapBlendClass {
    /// Normal / add / screen modes: main color is pulled toward black.
    Additive,
    /// Multiply mode: main color is pulled toward white.
    Multiplicative,
}

impl MatcapBlendClass {
    /// Classify the shader's numeric blend-mode property
    /// (0 = normal, 1 = add, 2 = screen, 3 = multiply).
    pub fn from_mode(mode: f32) -> Self {
        if mode >= 3.0 {
            MatcapBlendClass::Multiplicative
        } else {
            MatcapBlendClass::Additive
        }
    }

    /// Attenuation target the main color is pulled toward.
    pub fn target(&self) -> f32 {
        match self {
            MatcapBlendClass::Additive => 0.0,
            MatcapBlendClass::Multiplicative => 1.0,
        }
    }

    /// Interpolation weight derived from the shader's matcap strength.
    pub fn weight(&self, strength: f32) -> f32 {
        match self {
            MatcapBlendClass::Additive => strength * 0.8,
            MatcapBlendClass::Multiplicative => strength,
        }
    }
}

/// Per-channel main-color attenuation under a matcap layer:
/// `channel * lerp(channel, target, weight)`.
#[inline]
pub fn matcap_attenuate(channel: f32, strength: f32, class: MatcapBlendClass) -> f32 {
    channel * lerp(channel, class.target(), class.weight(strength))
}

/// Base rim-light intensity before the rim color tint is applied.
///
/// Non-environmental rims contribute a fixed 0.5; environmental rims scale
/// that by the shader's environmental strength. Both are modulated by the
/// rim color's alpha.
#[inline]
pub fn rim_intensity(environmental: bool, env_strength: f32, rim_alpha: f32) -> f32 {
    let base = if environmental {
        0.5 * env_strength
    } else {
        0.5
    };
    base * rim_alpha
}

/// Texture tiling transform (scale + offset), as declared on the source
/// material. Identity when the family has no concept of tiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexTransform {
    pub scale: [f32; 2],
    pub offset: [f32; 2],
}

impl TexTransform {
    pub const IDENTITY: Self = Self {
        scale: [1.0, 1.0],
        offset: [0.0, 0.0],
    };

    pub fn from_vector(v: [f32; 4]) -> Self {
        Self {
            scale: [v[0], v[1]],
            offset: [v[2], v[3]],
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Packed (scale.xy, offset.xy) form consumed by the composition shaders.
    pub fn to_vector(&self) -> [f32; 4] {
        [self.scale[0], self.scale[1], self.offset[0], self.offset[1]]
    }
}

impl Default for TexTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_tone_map_ldr_identity() {
        let ldr = [0.3, 0.9, 1.0, 0.5];
        assert_eq!(tone_map_hdr(ldr), ldr);
    }

    #[test]
    fn test_tone_map_idempotent() {
        let hdr = [2.0, 1.0, 0.5, 0.75];
        let once = tone_map_hdr(hdr);
        let twice = tone_map_hdr(once);
        assert_eq!(once, twice);
        // Alpha untouched
        assert_eq!(once[3], 0.75);
        // Max channel normalized to 1.0 before gamma, so it stays 1.0
        assert!(approx(once[0], 1.0));
    }

    #[test]
    fn test_tone_map_applies_gamma() {
        let out = tone_map_hdr([4.0, 2.0, 0.0, 1.0]);
        assert!(approx(out[0], 1.0));
        assert!(approx(out[1], 0.5f32.powf(1.0 / 2.2)));
        assert!(approx(out[2], 0.0));
    }

    #[test]
    fn test_luma_weights() {
        assert!(approx(luma_709([1.0, 1.0, 1.0]), 1.0));
        assert!(approx(luma_709([0.0, 1.0, 0.0]), 0.7152));
    }

    #[test]
    fn test_matcap_additive_scenario() {
        // strength 0.25, channel 0.8: 0.8 * lerp(0.8, 0, 0.2) = 0.512
        let out = matcap_attenuate(0.8, 0.25, MatcapBlendClass::Additive);
        assert!(approx(out, 0.512));
    }

    #[test]
    fn test_matcap_multiplicative_pulls_toward_white() {
        let out = matcap_attenuate(0.5, 1.0, MatcapBlendClass::Multiplicative);
        // lerp(0.5, 1.0, 1.0) = 1.0, so the channel is left as-is
        assert!(approx(out, 0.5));
    }

    #[test]
    fn test_matcap_blend_classification() {
        assert_eq!(MatcapBlendClass::from_mode(0.0), MatcapBlendClass::Additive);
        assert_eq!(MatcapBlendClass::from_mode(2.0), MatcapBlendClass::Additive);
        assert_eq!(
            MatcapBlendClass::from_mode(3.0),
            MatcapBlendClass::Multiplicative
        );
    }

    #[test]
    fn test_rim_intensity_scenario() {
        // environmental, strength 0.6, rim alpha 0.5 => 0.5 * 0.6 * 0.5
        assert!(approx(rim_intensity(true, 0.6, 0.5), 0.15));
        assert!(approx(rim_intensity(false, 0.6, 0.5), 0.25));
    }

    #[test]
    fn test_transform_roundtrip() {
        let t = TexTransform::from_vector([2.0, 2.0, 0.5, 0.25]);
        assert!(!t.is_identity());
        assert_eq!(t.to_vector(), [2.0, 2.0, 0.5, 0.25]);
        assert!(TexTransform::default().is_identity());
    }
}
