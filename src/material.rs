// src/material.rs
//! Source and output material models.
//!
//! A [`SourceMaterial`] is an immutable snapshot of a shader assignment: the
//! shader's declared name plus its property table in declaration order. The
//! pipeline only ever reads it. A [`ConvertedMaterial`] is what comes back:
//! the target style, final constant values, and handles to every baked
//! texture.

use std::path::PathBuf;
use std::sync::Arc;

use xxhash_rust::xxh3::Xxh3;

use crate::error::{ConvertError, Result};
use crate::packer::MaskChannel;
use crate::pix::PixelData;
use crate::settings::TextureCompression;

/// Features a target style can bake. Feature names participate in the cache
/// file naming contract and must stay stable across a generator version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    MainColor,
    Normal,
    Emission,
    Occlusion,
    Specular,
    Smoothness,
    Matcap,
    Rim,
    /// The channel-packed mask texture produced by the packer.
    PackedMask,
}

impl Feature {
    pub fn name(&self) -> &'static str {
        match self {
            Feature::MainColor => "main",
            Feature::Normal => "normal",
            Feature::Emission => "emission",
            Feature::Occlusion => "occlusion",
            Feature::Specular => "specular",
            Feature::Smoothness => "smoothness",
            Feature::Matcap => "matcap",
            Feature::Rim => "rim",
            Feature::PackedMask => "mask",
        }
    }
}

/// CPU-side RGBA8 pixels for a texture bound to a source material property.
/// Cheap to clone; the payload is shared.
#[derive(Debug, Clone)]
pub struct TextureData {
    width: u32,
    height: u32,
    pixels: Arc<Vec<u8>>,
}

impl TextureData {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(ConvertError::InvalidTexture(format!(
                "RGBA data length mismatch: expected {} bytes for {}x{}, got {}",
                expected,
                width,
                height,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels: Arc::new(pixels),
        })
    }

    /// 1×1 solid-color texture, useful as a neutral stand-in.
    pub fn solid(color: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: Arc::new(color.to_vec()),
        }
    }

    pub fn from_image(img: &image::DynamicImage) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            pixels: Arc::new(rgba.into_raw()),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Content hash over dimensions and pixel bytes. Feeds cache keys.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.update(&self.width.to_le_bytes());
        hasher.update(&self.height.to_le_bytes());
        hasher.update(&self.pixels);
        hasher.digest()
    }
}

/// A single declared shader property value.
#[derive(Debug, Clone)]
pub enum PropertyValue {
    Color([f32; 4]),
    Vector([f32; 4]),
    Float(f32),
    Texture(TextureData),
}

impl PropertyValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Color(_) => "Color",
            PropertyValue::Vector(_) => "Vector",
            PropertyValue::Float(_) => "Float",
            PropertyValue::Texture(_) => "Texture",
        }
    }
}

/// Immutable view of a shader assignment: name + ordered property table.
///
/// Declaration order is significant — it is part of the cache-key contract,
/// so the table is a `Vec` rather than a map. Property counts are small
/// enough that linear lookup wins anyway.
#[derive(Debug, Clone)]
pub struct SourceMaterial {
    shader_name: String,
    properties: Vec<(String, PropertyValue)>,
}

impl SourceMaterial {
    pub fn new(shader_name: impl Into<String>) -> Self {
        Self {
            shader_name: shader_name.into(),
            properties: Vec::new(),
        }
    }

    /// Builder-style property registration, in declaration order.
    pub fn with(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.push((name.into(), value));
        self
    }

    pub fn shader_name(&self) -> &str {
        &self.shader_name
    }

    pub fn properties(&self) -> &[(String, PropertyValue)] {
        &self.properties
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn color(&self, name: &str) -> Option<[f32; 4]> {
        match self.get(name) {
            Some(PropertyValue::Color(c)) => Some(*c),
            _ => None,
        }
    }

    pub fn vector(&self, name: &str) -> Option<[f32; 4]> {
        match self.get(name) {
            Some(PropertyValue::Vector(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name) {
            Some(PropertyValue::Float(f)) => Some(*f),
            _ => None,
        }
    }

    pub fn texture(&self, name: &str) -> Option<&TextureData> {
        match self.get(name) {
            Some(PropertyValue::Texture(t)) => Some(t),
            _ => None,
        }
    }

    /// Checked scalar read. Distinguishes an absent property from one with
    /// the wrong type so shader-package drift is diagnosable.
    pub fn require_float(&self, name: &str) -> Result<f32> {
        match self.get(name) {
            Some(PropertyValue::Float(f)) => Ok(*f),
            Some(other) => Err(ConvertError::PropertyWrongType {
                name: name.to_string(),
                expected: "Float",
                found: other.type_name(),
            }),
            None => Err(ConvertError::PropertyMissing {
                name: name.to_string(),
            }),
        }
    }

    pub fn require_color(&self, name: &str) -> Result<[f32; 4]> {
        match self.get(name) {
            Some(PropertyValue::Color(c)) => Ok(*c),
            Some(other) => Err(ConvertError::PropertyWrongType {
                name: name.to_string(),
                expected: "Color",
                found: other.type_name(),
            }),
            None => Err(ConvertError::PropertyMissing {
                name: name.to_string(),
            }),
        }
    }

    pub fn require_texture(&self, name: &str) -> Result<&TextureData> {
        match self.get(name) {
            Some(PropertyValue::Texture(t)) => Ok(t),
            Some(other) => Err(ConvertError::PropertyWrongType {
                name: name.to_string(),
                expected: "Texture",
                found: other.type_name(),
            }),
            None => Err(ConvertError::PropertyMissing {
                name: name.to_string(),
            }),
        }
    }
}

/// One generated texture in the conversion output.
#[derive(Debug, Clone)]
pub struct BakedTexture {
    pub feature: Feature,
    pub pixels: PixelData,
    /// Set when the texture was persisted as a standalone image file.
    pub path: Option<PathBuf>,
    /// Set when the texture lives inside a packed mask; the consuming shader
    /// must sample this channel.
    pub channel: Option<MaskChannel>,
}

/// The finished conversion: target style, final constants, baked textures.
/// Owned by the caller once returned.
#[derive(Debug, Clone)]
pub struct ConvertedMaterial {
    pub style: &'static str,
    pub main_color: [f32; 4],
    pub emission_color: [f32; 4],
    pub textures: Vec<BakedTexture>,
    pub compression: TextureCompression,
}

impl ConvertedMaterial {
    pub fn texture(&self, feature: Feature) -> Option<&BakedTexture> {
        self.textures.iter().find(|t| t.feature == feature)
    }
}
