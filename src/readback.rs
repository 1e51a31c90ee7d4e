// src/readback.rs
//! Completion requests: one abstraction over "already have the pixels" and
//! "pixels arrive after a GPU round-trip".
//!
//! A deferred request owns its staging buffer; whichever way `wait` exits,
//! the buffer is dropped and its GPU memory released. Callers composing
//! dependent bakes call `wait` between them — the pipeline never reorders
//! passes on their behalf.

use std::sync::mpsc::Receiver;
use std::sync::Arc;

use crate::error::{ConvertError, Result};
use crate::pix::PixelData;

/// A bake result that is either resolved or still in flight on the GPU.
pub enum CompletionRequest {
    Ready(PixelData),
    Pending(PendingReadback),
}

impl CompletionRequest {
    /// Immediate form: the value was computed synchronously.
    pub fn ready(pixels: PixelData) -> Self {
        CompletionRequest::Ready(pixels)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, CompletionRequest::Ready(_))
    }

    /// Block until the result is available. A no-op for resolved requests;
    /// for deferred ones this forces the device to flush the transfer.
    pub fn wait(self) -> Result<PixelData> {
        match self {
            CompletionRequest::Ready(pixels) => Ok(pixels),
            CompletionRequest::Pending(pending) => pending.finish(),
        }
    }
}

/// An enqueued texture→buffer transfer with its mapping already requested.
pub struct PendingReadback {
    device: Arc<wgpu::Device>,
    staging: wgpu::Buffer,
    rx: Receiver<std::result::Result<(), wgpu::BufferAsyncError>>,
    width: u32,
    height: u32,
    padded_bytes_per_row: u32,
    unpadded_bytes_per_row: u32,
}

impl PendingReadback {
    /// Takes ownership of a staging buffer whose copy has been submitted.
    /// Registers the map callback immediately so `finish` only has to poll.
    pub(crate) fn new(
        device: Arc<wgpu::Device>,
        staging: wgpu::Buffer,
        width: u32,
        height: u32,
        padded_bytes_per_row: u32,
        unpadded_bytes_per_row: u32,
    ) -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        let slice = staging.slice(..);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        Self {
            device,
            staging,
            rx,
            width,
            height,
            padded_bytes_per_row,
            unpadded_bytes_per_row,
        }
    }

    fn finish(self) -> Result<PixelData> {
        let _ = self.device.poll(wgpu::Maintain::Wait);

        self.rx
            .recv()
            .map_err(|_| ConvertError::Readback("map channel closed before completion".into()))?
            .map_err(|e| ConvertError::Readback(format!("buffer map failed: {e:?}")))?;

        let slice = self.staging.slice(..);
        let mapped = slice.get_mapped_range();

        let mut bytes =
            Vec::with_capacity((self.unpadded_bytes_per_row * self.height) as usize);
        for row in 0..self.height {
            let start = (row * self.padded_bytes_per_row) as usize;
            let end = start + self.unpadded_bytes_per_row as usize;
            bytes.extend_from_slice(&mapped[start..end]);
        }

        drop(mapped);
        self.staging.unmap();

        Ok(PixelData::new(self.width, self.height, bytes))
    }
}
