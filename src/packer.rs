// src/packer.rs
//! Channel packing: merge independent single-channel masks into shared RGBA
//! textures to cut texture count and draw calls.
//!
//! Masks are grouped four at a time in input order. Within a group, channels
//! are handed out in the fixed priority order R, A, G, B — R and A survive
//! the downstream compressed formats with higher fidelity than G and B. The
//! order lives in [`CHANNEL_PRIORITY`] alone; retargeting a format family
//! with different characteristics only means changing that constant.

use crate::buffer::{aspect_fit_reduction, BakeBuffer};
use crate::error::Result;
use crate::gpu::GpuContext;
use crate::pix::PixelData;
use crate::programs::{CompositePass, ProgramLibrary, PROGRAM_SWIZZLE};

/// Output channel of a packed mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskChannel {
    R,
    G,
    B,
    A,
}

impl MaskChannel {
    pub fn name(&self) -> &'static str {
        match self {
            MaskChannel::R => "r",
            MaskChannel::G => "g",
            MaskChannel::B => "b",
            MaskChannel::A => "a",
        }
    }

    /// Color write mask restricting a packing pass to this channel.
    pub fn write_mask(&self) -> wgpu::ColorWrites {
        match self {
            MaskChannel::R => wgpu::ColorWrites::RED,
            MaskChannel::G => wgpu::ColorWrites::GREEN,
            MaskChannel::B => wgpu::ColorWrites::BLUE,
            MaskChannel::A => wgpu::ColorWrites::ALPHA,
        }
    }
}

/// Channel hand-out order within a group.
pub const CHANNEL_PRIORITY: [MaskChannel; 4] =
    [MaskChannel::R, MaskChannel::A, MaskChannel::G, MaskChannel::B];

/// Partition mask requests into packed groups and assign channels.
///
/// Pure planning: consecutive slots of at most 4, in input order; within a
/// group the 1st..4th present request gets R, A, G, B respectively, `None`
/// slots are skipped. Channel assignment is injective within a group.
pub fn plan_groups<T: Clone>(requests: &[Option<T>]) -> Vec<Vec<(T, MaskChannel)>> {
    requests
        .chunks(4)
        .map(|chunk| {
            chunk
                .iter()
                .flatten()
                .cloned()
                .zip(CHANNEL_PRIORITY)
                .collect::<Vec<_>>()
        })
        .filter(|group: &Vec<_>| !group.is_empty())
        .collect()
}

/// One baked single-channel mask headed into a packed group.
pub struct PackMember {
    pub pixels: PixelData,
    pub channel: MaskChannel,
}

/// Blit each member's mask value into its assigned channel of one shared
/// target. Each source is sampled at its own resolution; the target takes
/// the maximum dimensions among the members, capped by `max_size`.
pub fn pack_group(
    gpu: &GpuContext,
    programs: &ProgramLibrary,
    members: &[PackMember],
    max_size: u32,
) -> Result<PixelData> {
    let mut width = 1;
    let mut height = 1;
    for member in members {
        width = width.max(member.pixels.width);
        height = height.max(member.pixels.height);
    }
    let (width, height) = aspect_fit_reduction(width, height, max_size);

    let target = BakeBuffer::new(gpu, width, height, "packed_mask_target");

    for (index, member) in members.iter().enumerate() {
        let source = BakeBuffer::upload_pixels(gpu, &member.pixels, "packed_mask_source");

        let mut pass = CompositePass::new(PROGRAM_SWIZZLE);
        pass.tex_a = Some(&source);
        // Mask bakes are grayscale; red carries the value.
        pass.params.channels = [0, 0, 0, 0];
        pass.params.factors = [1.0, 0.0, 0.0, 0.0];
        pass.write_mask = member.channel.write_mask();
        pass.clear = index == 0;
        programs.run(gpu, &target, &pass)?;
    }

    target.read(gpu)
}
