// src/buffer.rs
//! Transient GPU bake buffers.
//!
//! A [`BakeBuffer`] is a render target plus sample source owned by a single
//! bake call. Buffers release their GPU memory on drop, so every exit path
//! (success, cache-hit shortcut, error) cleans up the same way. Readback is
//! exposed both synchronously and as a deferred [`CompletionRequest`].

use std::path::Path;

use anyhow::Context;
use image::{ImageBuffer, Rgba};

use crate::error::Result;
use crate::gpu::GpuContext;
use crate::material::TextureData;
use crate::pix::PixelData;
use crate::readback::{CompletionRequest, PendingReadback};

/// All bakes render and read back in plain RGBA8; gamma handling happens in
/// the tint math, compression happens downstream at import.
pub const BAKE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Aspect-preserving reduction of `(width, height)` to fit `max_size`.
/// A zero cap or an already-fitting size passes through unchanged.
pub fn aspect_fit_reduction(width: u32, height: u32, max_size: u32) -> (u32, u32) {
    let largest = width.max(height);
    if max_size == 0 || largest <= max_size {
        return (width, height);
    }
    let scale = max_size as f32 / largest as f32;
    let w = ((width as f32 * scale).round() as u32).max(1);
    let h = ((height as f32 * scale).round() as u32).max(1);
    (w, h)
}

pub struct BakeBuffer {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl BakeBuffer {
    /// Allocate an empty bake target.
    pub fn new(gpu: &GpuContext, width: u32, height: u32, label: &str) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: BAKE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            width,
            height,
        }
    }

    /// Upload a source texture so a composition pass can sample it.
    pub fn upload(gpu: &GpuContext, data: &TextureData, label: &str) -> Self {
        let buffer = Self::new(gpu, data.width(), data.height(), label);
        buffer.write(gpu, data.pixels());
        buffer
    }

    /// Upload previously baked pixels (e.g. a cached mask consumed by a
    /// packing pass).
    pub fn upload_pixels(gpu: &GpuContext, pixels: &PixelData, label: &str) -> Self {
        let buffer = Self::new(gpu, pixels.width, pixels.height, label);
        buffer.write(gpu, &pixels.bytes);
        buffer
    }

    /// 1×1 solid-color buffer for unbound composition inputs.
    pub fn solid(gpu: &GpuContext, color: [u8; 4], label: &str) -> Self {
        let buffer = Self::new(gpu, 1, 1, label);
        buffer.write(gpu, &color);
        buffer
    }

    fn write(&self, gpu: &GpuContext, data: &[u8]) {
        gpu.queue.write_texture(
            wgpu::ImageCopyTexture {
                aspect: wgpu::TextureAspect::All,
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * self.width),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Enqueue a copy into a staging buffer and hand back a deferred
    /// completion request. The staging buffer travels with the request and
    /// is released when it resolves or is dropped.
    pub fn read_async(&self, gpu: &GpuContext) -> CompletionRequest {
        let unpadded_bytes_per_row = 4 * self.width;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = (unpadded_bytes_per_row + align - 1) / align * align;
        let buffer_size = (padded_bytes_per_row * self.height) as u64;

        let staging = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("bake_readback_staging"),
            size: buffer_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("bake_readback_encoder"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                aspect: wgpu::TextureAspect::All,
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::ImageCopyBuffer {
                buffer: &staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );

        gpu.queue.submit(std::iter::once(encoder.finish()));

        CompletionRequest::Pending(PendingReadback::new(
            gpu.device.clone(),
            staging,
            self.width,
            self.height,
            padded_bytes_per_row,
            unpadded_bytes_per_row,
        ))
    }

    /// Synchronous readback: enqueue and block in one call.
    pub fn read(&self, gpu: &GpuContext) -> Result<PixelData> {
        self.read_async(gpu).wait()
    }

    /// Read back and persist as PNG.
    pub fn save_png(&self, gpu: &GpuContext, path: impl AsRef<Path>) -> Result<()> {
        let pixels = self.read(gpu)?;
        save_pixels_png(&pixels, path)
    }
}

/// Persist already-read-back pixels as a PNG artifact.
pub fn save_pixels_png(pixels: &PixelData, path: impl AsRef<Path>) -> Result<()> {
    let img: ImageBuffer<Rgba<u8>, _> =
        ImageBuffer::from_raw(pixels.width, pixels.height, pixels.bytes.clone())
            .context("Pixel payload does not match its declared dimensions")?;
    img.save(path.as_ref())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_fit_within_cap_unchanged() {
        assert_eq!(aspect_fit_reduction(512, 512, 1024), (512, 512));
        assert_eq!(aspect_fit_reduction(1024, 1024, 1024), (1024, 1024));
    }

    #[test]
    fn test_aspect_fit_zero_cap_disables_reduction() {
        assert_eq!(aspect_fit_reduction(4096, 2048, 0), (4096, 2048));
    }

    #[test]
    fn test_aspect_fit_preserves_ratio() {
        assert_eq!(aspect_fit_reduction(2048, 1024, 1024), (1024, 512));
        assert_eq!(aspect_fit_reduction(1024, 2048, 512), (256, 512));
        // Rounding to nearest keeps the ratio within a pixel
        assert_eq!(aspect_fit_reduction(1000, 600, 500), (500, 300));
    }

    #[test]
    fn test_aspect_fit_never_hits_zero() {
        assert_eq!(aspect_fit_reduction(4096, 2, 64), (64, 1));
    }
}
