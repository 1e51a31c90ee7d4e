// src/error.rs
//! Error taxonomy for the baking pipeline.
//!
//! Correctness-affecting failures (missing capability, bad property type,
//! readback errors) are fatal and propagate to the caller. Cache and packing
//! failures never appear here — they are logged and degraded to a miss or a
//! skip at the call site.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConvertError {
    /// A target style asked for a feature the source family cannot supply.
    /// Not retried; the material must be converted with a different style.
    #[error("feature `{feature}` is not supported by the {family} shader family")]
    UnsupportedFeature {
        family: &'static str,
        feature: &'static str,
    },

    /// A required shader property is absent from the source material.
    /// Usually indicates shader-package version drift on the source side.
    #[error("shader property `{name}` not found on the source material")]
    PropertyMissing { name: String },

    /// A required shader property exists but holds a different value type.
    /// Kept distinct from [`ConvertError::PropertyMissing`] to aid triage.
    #[error("shader property `{name}` has the wrong type: expected {expected}, found {found}")]
    PropertyWrongType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A composition program was referenced by a name nobody registered.
    #[error("composition program `{0}` is not registered")]
    ProgramMissing(String),

    /// The GPU round-trip for a baked texture failed. Fatal — a silently
    /// missing texture would corrupt the visual result.
    #[error("GPU readback failed: {0}")]
    Readback(String),

    #[error("invalid texture data: {0}")]
    InvalidTexture(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Device/adapter plumbing failures from the GPU utility layer.
    #[error(transparent)]
    Gpu(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
