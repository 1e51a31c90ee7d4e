// src/pix.rs
//! Portable pixel payloads and the `.pix` cache-only serialization format.
//!
//! `.pix` is intentionally dumb: a fixed header followed by raw RGBA8 rows.
//! It exists so cached bakes round-trip without paying PNG encode/decode on
//! every lookup. Anything that fails validation decodes to an error; the
//! cache degrades that to a miss.

use thiserror::Error;

/// Magic prefix of every `.pix` file.
const PIX_MAGIC: &[u8; 4] = b"MBPX";
/// Bumped whenever the header layout changes.
const PIX_VERSION: u16 = 1;
/// Header: magic + version + width + height + format + mip flag.
const PIX_HEADER_LEN: usize = 4 + 2 + 4 + 4 + 1 + 1;

#[derive(Debug, Error)]
pub enum PixError {
    #[error("truncated pix data: {0} bytes")]
    Truncated(usize),
    #[error("bad magic bytes")]
    BadMagic,
    #[error("unsupported pix version {0}")]
    Version(u16),
    #[error("unknown pixel format tag {0}")]
    Format(u8),
    #[error("payload length mismatch: expected {expected}, got {got}")]
    Length { expected: usize, got: usize },
}

/// Pixel format of a baked payload. The pipeline bakes everything as RGBA8;
/// the enum keeps the header honest if that ever widens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PixelFormat {
    Rgba8 = 0,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::Rgba8 => 4,
        }
    }

    fn from_tag(tag: u8) -> Result<Self, PixError> {
        match tag {
            0 => Ok(PixelFormat::Rgba8),
            other => Err(PixError::Format(other)),
        }
    }
}

/// CPU-side pixels read back from a bake, plus the metadata needed to
/// re-upload or persist them.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelData {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Whether the consuming texture should get a generated mip chain.
    pub mipmaps: bool,
    pub bytes: Vec<u8>,
}

impl PixelData {
    pub fn new(width: u32, height: u32, bytes: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Rgba8,
            mipmaps: false,
            bytes,
        }
    }

    pub fn expected_len(&self) -> usize {
        (self.width * self.height * self.format.bytes_per_pixel()) as usize
    }

    /// Serialize into the `.pix` wire form.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PIX_HEADER_LEN + self.bytes.len());
        out.extend_from_slice(PIX_MAGIC);
        out.extend_from_slice(&PIX_VERSION.to_le_bytes());
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.push(self.format as u8);
        out.push(self.mipmaps as u8);
        out.extend_from_slice(&self.bytes);
        out
    }

    /// Parse the `.pix` wire form, validating header and payload length.
    pub fn decode(data: &[u8]) -> Result<Self, PixError> {
        if data.len() < PIX_HEADER_LEN {
            return Err(PixError::Truncated(data.len()));
        }
        if &data[0..4] != PIX_MAGIC {
            return Err(PixError::BadMagic);
        }
        let version = u16::from_le_bytes([data[4], data[5]]);
        if version != PIX_VERSION {
            return Err(PixError::Version(version));
        }
        let width = u32::from_le_bytes([data[6], data[7], data[8], data[9]]);
        let height = u32::from_le_bytes([data[10], data[11], data[12], data[13]]);
        let format = PixelFormat::from_tag(data[14])?;
        let mipmaps = data[15] != 0;

        let payload = &data[PIX_HEADER_LEN..];
        // Widen before multiplying so a corrupt header cannot overflow.
        let expected = width as u64 * height as u64 * format.bytes_per_pixel() as u64;
        if payload.len() as u64 != expected {
            return Err(PixError::Length {
                expected: expected as usize,
                got: payload.len(),
            });
        }

        Ok(Self {
            width,
            height,
            format,
            mipmaps,
            bytes: payload.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pix_roundtrip() {
        let pixels = PixelData {
            width: 2,
            height: 2,
            format: PixelFormat::Rgba8,
            mipmaps: true,
            bytes: vec![7u8; 16],
        };
        let encoded = pixels.encode();
        let decoded = PixelData::decode(&encoded).unwrap();
        assert_eq!(decoded, pixels);
    }

    #[test]
    fn test_pix_rejects_corruption() {
        let pixels = PixelData::new(2, 2, vec![1u8; 16]);
        let mut encoded = pixels.encode();

        // Truncated payload
        encoded.pop();
        assert!(matches!(
            PixelData::decode(&encoded),
            Err(PixError::Length { .. })
        ));

        // Bad magic
        let mut bad = pixels.encode();
        bad[0] = b'X';
        assert!(matches!(PixelData::decode(&bad), Err(PixError::BadMagic)));

        // Way too short
        assert!(matches!(
            PixelData::decode(&[0u8; 3]),
            Err(PixError::Truncated(3))
        ));
    }
}
