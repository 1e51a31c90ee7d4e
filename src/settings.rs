// src/settings.rs
//! Conversion settings: one variant per target style, plus the platform tag.
//!
//! Settings are value objects — immutable for the duration of a single
//! conversion. Every field participates in `cache_key()`, so changing any
//! user-visible knob invalidates exactly the bakes it affects.

/// Target platform for the converted material. Drives the compressed-format
/// advice attached to outputs and participates in cache keys and file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    pub fn tag(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }

    /// Recommended compressed format for textures shipped to this platform.
    pub fn compression(&self) -> TextureCompression {
        match self {
            Platform::Android => TextureCompression::Etc2,
            Platform::Ios => TextureCompression::Astc4x4,
        }
    }
}

/// Compressed-format advice recorded on conversion outputs. The pipeline
/// itself always bakes RGBA8; compression happens downstream at import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureCompression {
    Etc2,
    Astc4x4,
}

/// Settings for the flat-lit target style: a single albedo with lighting
/// baked out, no dynamic features.
#[derive(Debug, Clone)]
pub struct FlatLitSettings {
    /// Cap on baked texture dimensions; 0 disables reduction.
    pub max_texture_size: u32,
    /// Lower bound applied to baked main-color RGB, so fully black shadow
    /// tints stay readable on unlit mobile shaders.
    pub main_brightness_floor: f32,
    /// Fold the source's shadow tint into the baked albedo.
    pub fold_shadow: bool,
}

impl Default for FlatLitSettings {
    fn default() -> Self {
        Self {
            max_texture_size: 1024,
            main_brightness_floor: 0.0,
            fold_shadow: true,
        }
    }
}

/// Settings for the matcap-lit target style: flat-lit plus a matcap layer
/// attenuating the albedo and a rim layer folded into emission.
#[derive(Debug, Clone)]
pub struct MatcapLitSettings {
    pub max_texture_size: u32,
    pub main_brightness_floor: f32,
    pub fold_shadow: bool,
    pub bake_matcap: bool,
    pub bake_rim: bool,
}

impl Default for MatcapLitSettings {
    fn default() -> Self {
        Self {
            max_texture_size: 1024,
            main_brightness_floor: 0.0,
            fold_shadow: true,
            bake_matcap: true,
            bake_rim: true,
        }
    }
}

/// Settings for the physically-lit target style: albedo, normal, emission,
/// and a packed metallic/smoothness/occlusion mask.
#[derive(Debug, Clone)]
pub struct PhysicallyLitSettings {
    pub max_texture_size: u32,
    pub main_brightness_floor: f32,
    pub bake_normal: bool,
    pub bake_emission: bool,
    /// Merge single-channel masks into shared RGBA textures.
    pub pack_masks: bool,
}

impl Default for PhysicallyLitSettings {
    fn default() -> Self {
        Self {
            max_texture_size: 2048,
            main_brightness_floor: 0.0,
            bake_normal: true,
            bake_emission: true,
            pack_masks: true,
        }
    }
}

/// User-chosen conversion settings, one variant per target style.
#[derive(Debug, Clone)]
pub enum ConvertSettings {
    FlatLit(FlatLitSettings),
    MatcapLit(MatcapLitSettings),
    PhysicallyLit(PhysicallyLitSettings),
}

impl ConvertSettings {
    /// Style name as it appears in the cache file naming contract.
    pub fn type_name(&self) -> &'static str {
        match self {
            ConvertSettings::FlatLit(_) => "FlatLit",
            ConvertSettings::MatcapLit(_) => "MatcapLit",
            ConvertSettings::PhysicallyLit(_) => "PhysicallyLit",
        }
    }

    pub fn max_texture_size(&self) -> u32 {
        match self {
            ConvertSettings::FlatLit(s) => s.max_texture_size,
            ConvertSettings::MatcapLit(s) => s.max_texture_size,
            ConvertSettings::PhysicallyLit(s) => s.max_texture_size,
        }
    }

    pub fn brightness_floor(&self) -> f32 {
        match self {
            ConvertSettings::FlatLit(s) => s.main_brightness_floor,
            ConvertSettings::MatcapLit(s) => s.main_brightness_floor,
            ConvertSettings::PhysicallyLit(s) => s.main_brightness_floor,
        }
    }

    /// Whether single-channel masks should be merged into packed textures.
    pub fn pack_masks(&self) -> bool {
        match self {
            ConvertSettings::PhysicallyLit(s) => s.pack_masks,
            _ => false,
        }
    }

    /// Serialization of every setting that affects a bake. Appended to cache
    /// keys so any knob change becomes a (safe) miss.
    pub fn cache_key(&self) -> String {
        match self {
            ConvertSettings::FlatLit(s) => format!(
                "FlatLit;size={};floor={};shadow={}",
                s.max_texture_size, s.main_brightness_floor, s.fold_shadow
            ),
            ConvertSettings::MatcapLit(s) => format!(
                "MatcapLit;size={};floor={};shadow={};matcap={};rim={}",
                s.max_texture_size,
                s.main_brightness_floor,
                s.fold_shadow,
                s.bake_matcap,
                s.bake_rim
            ),
            ConvertSettings::PhysicallyLit(s) => format!(
                "PhysicallyLit;size={};floor={};normal={};emission={};pack={}",
                s.max_texture_size,
                s.main_brightness_floor,
                s.bake_normal,
                s.bake_emission,
                s.pack_masks
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_reflects_every_field() {
        let base = ConvertSettings::FlatLit(FlatLitSettings::default());
        let mut resized = FlatLitSettings::default();
        resized.max_texture_size = 512;
        let resized = ConvertSettings::FlatLit(resized);
        assert_ne!(base.cache_key(), resized.cache_key());

        let mut unfolded = FlatLitSettings::default();
        unfolded.fold_shadow = false;
        assert_ne!(
            base.cache_key(),
            ConvertSettings::FlatLit(unfolded).cache_key()
        );
    }

    #[test]
    fn test_styles_have_distinct_keys() {
        let flat = ConvertSettings::FlatLit(FlatLitSettings::default());
        let matcap = ConvertSettings::MatcapLit(MatcapLitSettings::default());
        assert_ne!(flat.cache_key(), matcap.cache_key());
        assert_eq!(flat.type_name(), "FlatLit");
        assert_eq!(matcap.type_name(), "MatcapLit");
    }

    #[test]
    fn test_platform_tags() {
        assert_eq!(Platform::Android.tag(), "android");
        assert_eq!(Platform::Android.compression(), TextureCompression::Etc2);
        assert_eq!(Platform::Ios.compression(), TextureCompression::Astc4x4);
    }
}
