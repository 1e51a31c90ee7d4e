// src/lib.rs
//! # matbake
//!
//! Bakes richly-parameterized desktop shader materials (layered toon
//! shaders with matcap, rim light, emission layers, metallic/gloss maps)
//! into a small set of mobile-compatible textures.
//!
//! Pipeline: classify the source shader into a family, read its properties
//! through a uniform wrapper, decide per feature whether a texture must be
//! baked, run GPU composition passes, pack single-channel masks into shared
//! RGBA targets, and serve repeat conversions from a content-addressed
//! cache.
//!
//! ```no_run
//! use matbake::{BakeCache, ConvertSettings, Converter, FlatLitSettings,
//!               GpuContext, Platform, PropertyValue, SourceMaterial};
//! use std::sync::Arc;
//!
//! # fn main() -> matbake::Result<()> {
//! let gpu = Arc::new(GpuContext::new()?);
//! let converter = Converter::new(gpu)
//!     .with_cache(BakeCache::new("cache", "texture cache").map_err(anyhow::Error::from)?);
//!
//! let material = SourceMaterial::new("lilToon")
//!     .with("_Color", PropertyValue::Color([1.0, 0.9, 0.8, 1.0]));
//! let settings = ConvertSettings::FlatLit(FlatLitSettings::default());
//!
//! let converted = converter.convert(&material, &settings, Platform::Android, None)?;
//! println!("{} baked textures", converted.textures.len());
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod cache;
pub mod color;
pub mod convert;
pub mod error;
pub mod family;
pub mod generators;
pub mod gpu;
pub mod material;
pub mod packer;
pub mod pix;
pub mod programs;
pub mod readback;
pub mod settings;

pub use cache::{BakeCache, CacheStats, GENERATOR_VERSION};
pub use convert::Converter;
pub use error::{ConvertError, Result};
pub use family::{classify, MaterialWrapper, ShaderFamily};
pub use gpu::GpuContext;
pub use material::{
    BakedTexture, ConvertedMaterial, Feature, PropertyValue, SourceMaterial, TextureData,
};
pub use packer::MaskChannel;
pub use pix::{PixelData, PixelFormat};
pub use readback::CompletionRequest;
pub use settings::{
    ConvertSettings, FlatLitSettings, MatcapLitSettings, PhysicallyLitSettings, Platform,
    TextureCompression,
};
