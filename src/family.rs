// src/family.rs
//! Shader family classification and the uniform property vocabulary.
//!
//! Dozens of shader-specific property names are normalized behind one fixed
//! vocabulary. Families form a closed tagged union — no string reflection at
//! bake time; the classifier runs once per material and everything after is
//! a typed read. Every accessor answers every query: families lacking a
//! concept return the neutral default (white for multiplier tints, black for
//! additive colors, false, identity transform, no texture).

use crate::color::{MatcapBlendClass, TexTransform};
use crate::material::{SourceMaterial, TextureData};

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Closed set of supported source-shader families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderFamily {
    /// Multi-layer toon shaders (lilToon-style vocabulary).
    LayeredToon,
    /// The built-in physically-based shader vocabulary.
    StandardPbr,
    /// Anything unrecognized; only main texture/color are trusted.
    Unverified,
}

impl ShaderFamily {
    pub fn name(&self) -> &'static str {
        match self {
            ShaderFamily::LayeredToon => "LayeredToon",
            ShaderFamily::StandardPbr => "StandardPbr",
            ShaderFamily::Unverified => "Unverified",
        }
    }

    /// Capability record: which features this family can feed. Built once
    /// per family; generators consult it instead of probing properties.
    pub fn caps(&self) -> FamilyCaps {
        match self {
            ShaderFamily::LayeredToon => FamilyCaps {
                shadow: true,
                normal: true,
                emission: true,
                matcap: true,
                rim: true,
                specular: true,
                occlusion: false,
            },
            ShaderFamily::StandardPbr => FamilyCaps {
                shadow: false,
                normal: true,
                emission: true,
                matcap: false,
                rim: false,
                specular: true,
                occlusion: true,
            },
            ShaderFamily::Unverified => FamilyCaps {
                shadow: false,
                normal: false,
                emission: false,
                matcap: false,
                rim: false,
                specular: false,
                occlusion: false,
            },
        }
    }
}

/// Per-family feature capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyCaps {
    pub shadow: bool,
    pub normal: bool,
    pub emission: bool,
    pub matcap: bool,
    pub rim: bool,
    pub specular: bool,
    pub occlusion: bool,
}

enum Pattern {
    Prefix(&'static str),
    Contains(&'static str),
}

/// Ordered classification table; first match wins. Patterns are matched
/// against the lowercased shader name.
const FAMILY_TABLE: &[(Pattern, ShaderFamily)] = &[
    (Pattern::Contains("liltoon"), ShaderFamily::LayeredToon),
    (Pattern::Prefix("standard"), ShaderFamily::StandardPbr),
];

/// Pure classification over the shader's declared name.
pub fn classify(shader_name: &str) -> ShaderFamily {
    let lowered = shader_name.to_lowercase();
    for (pattern, family) in FAMILY_TABLE {
        let hit = match pattern {
            Pattern::Prefix(p) => lowered.starts_with(p),
            Pattern::Contains(p) => lowered.contains(p),
        };
        if hit {
            return *family;
        }
    }
    ShaderFamily::Unverified
}

/// The uniform vocabulary every family wrapper answers. Defaults are the
/// neutral values; families override only the concepts they carry.
pub trait FamilyVocabulary<'a> {
    fn material(&self) -> &'a SourceMaterial;

    fn main_color(&self) -> [f32; 4] {
        WHITE
    }
    fn main_texture(&self) -> Option<&'a TextureData> {
        None
    }
    fn main_transform(&self) -> TexTransform {
        TexTransform::IDENTITY
    }

    fn use_shadow(&self) -> bool {
        false
    }
    fn shadow_tint(&self) -> [f32; 4] {
        WHITE
    }
    fn shadow_strength(&self) -> f32 {
        0.0
    }

    fn normal_map(&self) -> Option<&'a TextureData> {
        None
    }
    fn normal_strength(&self) -> f32 {
        1.0
    }

    fn use_emission(&self) -> bool {
        false
    }
    fn emission_color(&self) -> [f32; 4] {
        BLACK
    }
    fn emission_map(&self) -> Option<&'a TextureData> {
        None
    }
    fn emission_blend_mask(&self) -> Option<&'a TextureData> {
        None
    }
    fn use_emission_second(&self) -> bool {
        false
    }
    fn emission_second_color(&self) -> [f32; 4] {
        BLACK
    }
    fn emission_second_map(&self) -> Option<&'a TextureData> {
        None
    }

    fn use_matcap(&self) -> bool {
        false
    }
    fn matcap_texture(&self) -> Option<&'a TextureData> {
        None
    }
    fn matcap_color(&self) -> [f32; 4] {
        WHITE
    }
    fn matcap_blend_class(&self) -> MatcapBlendClass {
        MatcapBlendClass::Additive
    }
    fn matcap_strength(&self) -> f32 {
        0.0
    }
    fn matcap_mask(&self) -> Option<&'a TextureData> {
        None
    }

    fn use_rim(&self) -> bool {
        false
    }
    fn rim_color(&self) -> [f32; 4] {
        BLACK
    }
    /// Environmental-lighting factor of the rim; 0 means non-environmental.
    fn rim_enable_lighting(&self) -> f32 {
        0.0
    }

    fn metallic(&self) -> f32 {
        0.0
    }
    fn metallic_map(&self) -> Option<&'a TextureData> {
        None
    }
    fn smoothness(&self) -> f32 {
        0.0
    }
    fn smoothness_map(&self) -> Option<&'a TextureData> {
        None
    }
    /// Source channel of the smoothness mask within its map
    /// (0..3 = r/g/b/a).
    fn smoothness_source_channel(&self) -> u32 {
        0
    }
    fn occlusion_map(&self) -> Option<&'a TextureData> {
        None
    }
    fn occlusion_strength(&self) -> f32 {
        1.0
    }
}

/// Wrapper over a lilToon-style layered toon material.
pub struct LayeredToonView<'a> {
    mat: &'a SourceMaterial,
}

impl<'a> LayeredToonView<'a> {
    fn toggled(&self, name: &str) -> bool {
        self.mat.float(name).unwrap_or(0.0) > 0.5
    }
}

impl<'a> FamilyVocabulary<'a> for LayeredToonView<'a> {
    fn material(&self) -> &'a SourceMaterial {
        self.mat
    }

    fn main_color(&self) -> [f32; 4] {
        self.mat.color("_Color").unwrap_or(WHITE)
    }
    fn main_texture(&self) -> Option<&'a TextureData> {
        self.mat.texture("_MainTex")
    }
    fn main_transform(&self) -> TexTransform {
        self.mat
            .vector("_MainTex_ST")
            .map(TexTransform::from_vector)
            .unwrap_or(TexTransform::IDENTITY)
    }

    fn use_shadow(&self) -> bool {
        self.toggled("_UseShadow")
    }
    fn shadow_tint(&self) -> [f32; 4] {
        self.mat.color("_ShadowColor").unwrap_or(WHITE)
    }
    fn shadow_strength(&self) -> f32 {
        self.mat.float("_ShadowStrength").unwrap_or(0.0)
    }

    fn normal_map(&self) -> Option<&'a TextureData> {
        if self.toggled("_UseBumpMap") {
            self.mat.texture("_BumpMap")
        } else {
            None
        }
    }
    fn normal_strength(&self) -> f32 {
        self.mat.float("_BumpScale").unwrap_or(1.0)
    }

    fn use_emission(&self) -> bool {
        self.toggled("_UseEmission")
    }
    fn emission_color(&self) -> [f32; 4] {
        self.mat.color("_EmissionColor").unwrap_or(BLACK)
    }
    fn emission_map(&self) -> Option<&'a TextureData> {
        self.mat.texture("_EmissionMap")
    }
    fn emission_blend_mask(&self) -> Option<&'a TextureData> {
        self.mat.texture("_EmissionBlendMask")
    }
    fn use_emission_second(&self) -> bool {
        self.toggled("_UseEmission2nd")
    }
    fn emission_second_color(&self) -> [f32; 4] {
        self.mat.color("_Emission2ndColor").unwrap_or(BLACK)
    }
    fn emission_second_map(&self) -> Option<&'a TextureData> {
        self.mat.texture("_Emission2ndMap")
    }

    fn use_matcap(&self) -> bool {
        self.toggled("_UseMatCap")
    }
    fn matcap_texture(&self) -> Option<&'a TextureData> {
        self.mat.texture("_MatCapTex")
    }
    fn matcap_color(&self) -> [f32; 4] {
        self.mat.color("_MatCapColor").unwrap_or(WHITE)
    }
    fn matcap_blend_class(&self) -> MatcapBlendClass {
        MatcapBlendClass::from_mode(self.mat.float("_MatCapBlendMode").unwrap_or(0.0))
    }
    fn matcap_strength(&self) -> f32 {
        self.mat.float("_MatCapMainStrength").unwrap_or(0.0)
    }
    fn matcap_mask(&self) -> Option<&'a TextureData> {
        self.mat.texture("_MatCapBlendMask")
    }

    fn use_rim(&self) -> bool {
        self.toggled("_UseRim")
    }
    fn rim_color(&self) -> [f32; 4] {
        self.mat.color("_RimColor").unwrap_or(BLACK)
    }
    fn rim_enable_lighting(&self) -> f32 {
        self.mat.float("_RimEnableLighting").unwrap_or(0.0)
    }

    fn metallic(&self) -> f32 {
        self.mat.float("_Metallic").unwrap_or(0.0)
    }
    fn metallic_map(&self) -> Option<&'a TextureData> {
        self.mat.texture("_MetallicGlossMap")
    }
    fn smoothness(&self) -> f32 {
        self.mat.float("_Smoothness").unwrap_or(0.0)
    }
    fn smoothness_map(&self) -> Option<&'a TextureData> {
        self.mat.texture("_SmoothnessTex")
    }
}

/// Wrapper over the built-in physically-based vocabulary.
pub struct StandardPbrView<'a> {
    mat: &'a SourceMaterial,
}

impl<'a> FamilyVocabulary<'a> for StandardPbrView<'a> {
    fn material(&self) -> &'a SourceMaterial {
        self.mat
    }

    fn main_color(&self) -> [f32; 4] {
        self.mat.color("_Color").unwrap_or(WHITE)
    }
    fn main_texture(&self) -> Option<&'a TextureData> {
        self.mat.texture("_MainTex")
    }
    fn main_transform(&self) -> TexTransform {
        self.mat
            .vector("_MainTex_ST")
            .map(TexTransform::from_vector)
            .unwrap_or(TexTransform::IDENTITY)
    }

    fn normal_map(&self) -> Option<&'a TextureData> {
        self.mat.texture("_BumpMap")
    }
    fn normal_strength(&self) -> f32 {
        self.mat.float("_BumpScale").unwrap_or(1.0)
    }

    fn use_emission(&self) -> bool {
        let c = self.emission_color();
        self.emission_map().is_some() || c[0] > 0.0 || c[1] > 0.0 || c[2] > 0.0
    }
    fn emission_color(&self) -> [f32; 4] {
        self.mat.color("_EmissionColor").unwrap_or(BLACK)
    }
    fn emission_map(&self) -> Option<&'a TextureData> {
        self.mat.texture("_EmissionMap")
    }

    fn metallic(&self) -> f32 {
        self.mat.float("_Metallic").unwrap_or(0.0)
    }
    fn metallic_map(&self) -> Option<&'a TextureData> {
        self.mat.texture("_MetallicGlossMap")
    }
    fn smoothness(&self) -> f32 {
        self.mat.float("_Glossiness").unwrap_or(0.0)
    }
    fn smoothness_map(&self) -> Option<&'a TextureData> {
        // Standard stores smoothness in the metallic map's alpha channel.
        self.mat.texture("_MetallicGlossMap")
    }
    fn smoothness_source_channel(&self) -> u32 {
        3
    }
    fn occlusion_map(&self) -> Option<&'a TextureData> {
        self.mat.texture("_OcclusionMap")
    }
    fn occlusion_strength(&self) -> f32 {
        self.mat.float("_OcclusionStrength").unwrap_or(1.0)
    }
}

/// Minimal pass-through wrapper for unrecognized shaders: only the main
/// texture and color are trusted; everything else is neutral.
pub struct UnverifiedView<'a> {
    mat: &'a SourceMaterial,
}

impl<'a> FamilyVocabulary<'a> for UnverifiedView<'a> {
    fn material(&self) -> &'a SourceMaterial {
        self.mat
    }

    fn main_color(&self) -> [f32; 4] {
        self.mat.color("_Color").unwrap_or(WHITE)
    }
    fn main_texture(&self) -> Option<&'a TextureData> {
        self.mat.texture("_MainTex")
    }
}

/// Per-family view over a [`SourceMaterial`], built once per conversion.
pub enum MaterialWrapper<'a> {
    LayeredToon(LayeredToonView<'a>),
    StandardPbr(StandardPbrView<'a>),
    Unverified(UnverifiedView<'a>),
}

macro_rules! forward {
    ($( fn $name:ident(&self) -> $ret:ty; )*) => {
        $(
            pub fn $name(&self) -> $ret {
                match self {
                    MaterialWrapper::LayeredToon(v) => v.$name(),
                    MaterialWrapper::StandardPbr(v) => v.$name(),
                    MaterialWrapper::Unverified(v) => v.$name(),
                }
            }
        )*
    };
}

impl<'a> MaterialWrapper<'a> {
    /// Classify and wrap. Never fails: unknown shaders get the minimal
    /// pass-through wrapper.
    pub fn build(mat: &'a SourceMaterial) -> Self {
        match classify(mat.shader_name()) {
            ShaderFamily::LayeredToon => MaterialWrapper::LayeredToon(LayeredToonView { mat }),
            ShaderFamily::StandardPbr => MaterialWrapper::StandardPbr(StandardPbrView { mat }),
            ShaderFamily::Unverified => MaterialWrapper::Unverified(UnverifiedView { mat }),
        }
    }

    pub fn family(&self) -> ShaderFamily {
        match self {
            MaterialWrapper::LayeredToon(_) => ShaderFamily::LayeredToon,
            MaterialWrapper::StandardPbr(_) => ShaderFamily::StandardPbr,
            MaterialWrapper::Unverified(_) => ShaderFamily::Unverified,
        }
    }

    pub fn source(&self) -> &'a SourceMaterial {
        match self {
            MaterialWrapper::LayeredToon(v) => v.material(),
            MaterialWrapper::StandardPbr(v) => v.material(),
            MaterialWrapper::Unverified(v) => v.material(),
        }
    }

    forward! {
        fn main_color(&self) -> [f32; 4];
        fn main_texture(&self) -> Option<&'a TextureData>;
        fn main_transform(&self) -> TexTransform;
        fn use_shadow(&self) -> bool;
        fn shadow_tint(&self) -> [f32; 4];
        fn shadow_strength(&self) -> f32;
        fn normal_map(&self) -> Option<&'a TextureData>;
        fn normal_strength(&self) -> f32;
        fn use_emission(&self) -> bool;
        fn emission_color(&self) -> [f32; 4];
        fn emission_map(&self) -> Option<&'a TextureData>;
        fn emission_blend_mask(&self) -> Option<&'a TextureData>;
        fn use_emission_second(&self) -> bool;
        fn emission_second_color(&self) -> [f32; 4];
        fn emission_second_map(&self) -> Option<&'a TextureData>;
        fn use_matcap(&self) -> bool;
        fn matcap_texture(&self) -> Option<&'a TextureData>;
        fn matcap_color(&self) -> [f32; 4];
        fn matcap_blend_class(&self) -> MatcapBlendClass;
        fn matcap_strength(&self) -> f32;
        fn matcap_mask(&self) -> Option<&'a TextureData>;
        fn use_rim(&self) -> bool;
        fn rim_color(&self) -> [f32; 4];
        fn rim_enable_lighting(&self) -> f32;
        fn metallic(&self) -> f32;
        fn metallic_map(&self) -> Option<&'a TextureData>;
        fn smoothness(&self) -> f32;
        fn smoothness_map(&self) -> Option<&'a TextureData>;
        fn smoothness_source_channel(&self) -> u32;
        fn occlusion_map(&self) -> Option<&'a TextureData>;
        fn occlusion_strength(&self) -> f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::PropertyValue;

    #[test]
    fn test_classification_table() {
        assert_eq!(classify("liltoon/shadow"), ShaderFamily::LayeredToon);
        assert_eq!(classify("LilToon/SHADOW"), ShaderFamily::LayeredToon);
        assert_eq!(classify("Hidden/lilToonOutline"), ShaderFamily::LayeredToon);
        assert_eq!(classify("Standard"), ShaderFamily::StandardPbr);
        assert_eq!(classify("standard (specular setup)"), ShaderFamily::StandardPbr);
        assert_eq!(classify("Custom/Sparkle"), ShaderFamily::Unverified);
        assert_eq!(classify(""), ShaderFamily::Unverified);
    }

    #[test]
    fn test_unverified_wrapper_is_minimal() {
        // Even if an unknown shader happens to declare emission properties,
        // the unverified wrapper does not trust them.
        let mat = SourceMaterial::new("Custom/Sparkle")
            .with("_Color", PropertyValue::Color([0.5, 0.5, 0.5, 1.0]))
            .with("_EmissionColor", PropertyValue::Color([1.0, 0.0, 0.0, 1.0]))
            .with("_UseEmission", PropertyValue::Float(1.0));
        let wrapper = MaterialWrapper::build(&mat);
        assert_eq!(wrapper.family(), ShaderFamily::Unverified);
        assert_eq!(wrapper.main_color(), [0.5, 0.5, 0.5, 1.0]);
        assert!(!wrapper.use_emission());
        assert_eq!(wrapper.emission_color(), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_layered_toon_vocabulary() {
        let mat = SourceMaterial::new("liltoon")
            .with("_Color", PropertyValue::Color([1.0, 0.9, 0.8, 1.0]))
            .with("_UseShadow", PropertyValue::Float(1.0))
            .with("_ShadowColor", PropertyValue::Color([0.6, 0.5, 0.7, 1.0]))
            .with("_UseMatCap", PropertyValue::Float(1.0))
            .with("_MatCapBlendMode", PropertyValue::Float(3.0))
            .with("_MatCapMainStrength", PropertyValue::Float(0.25))
            .with("_RimEnableLighting", PropertyValue::Float(0.6));
        let wrapper = MaterialWrapper::build(&mat);
        assert!(wrapper.use_shadow());
        assert_eq!(wrapper.shadow_tint(), [0.6, 0.5, 0.7, 1.0]);
        assert_eq!(
            wrapper.matcap_blend_class(),
            MatcapBlendClass::Multiplicative
        );
        assert_eq!(wrapper.matcap_strength(), 0.25);
        assert_eq!(wrapper.rim_enable_lighting(), 0.6);
        // Concepts absent from the material come back neutral
        assert!(wrapper.normal_map().is_none());
        assert_eq!(wrapper.occlusion_strength(), 1.0);
    }

    #[test]
    fn test_standard_pbr_vocabulary() {
        let mat = SourceMaterial::new("Standard")
            .with("_Metallic", PropertyValue::Float(0.7))
            .with("_Glossiness", PropertyValue::Float(0.4))
            .with("_EmissionColor", PropertyValue::Color([0.0, 0.0, 0.0, 1.0]));
        let wrapper = MaterialWrapper::build(&mat);
        assert_eq!(wrapper.metallic(), 0.7);
        assert_eq!(wrapper.smoothness(), 0.4);
        // Black emission with no map: not emissive
        assert!(!wrapper.use_emission());
        // Standard has no matcap concept
        assert!(!wrapper.use_matcap());
        assert_eq!(wrapper.matcap_strength(), 0.0);
    }

    #[test]
    fn test_caps_record() {
        assert!(ShaderFamily::LayeredToon.caps().matcap);
        assert!(!ShaderFamily::StandardPbr.caps().matcap);
        assert!(ShaderFamily::StandardPbr.caps().occlusion);
        let unverified = ShaderFamily::Unverified.caps();
        assert!(!unverified.emission && !unverified.specular && !unverified.normal);
    }
}
