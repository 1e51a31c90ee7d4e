// src/convert.rs
//! The conversion facade: classify, plan, bake, pack, assemble.
//!
//! One `Converter` owns the GPU program library and (optionally) a cache
//! handle. A single `convert` call drives one material's bake graph
//! sequentially: cache lookup per feature, composition passes on miss,
//! blocking waits between dependent bakes, and PNG persistence when a
//! destination is supplied.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::{self, BakeCache, CacheKey, CacheStats};
use crate::error::Result;
use crate::family::MaterialWrapper;
use crate::generators::{self, BakePlan, FeatureDecision, MaskPlanEntry};
use crate::gpu::GpuContext;
use crate::material::{BakedTexture, ConvertedMaterial, Feature, SourceMaterial};
use crate::packer;
use crate::pix::PixelData;
use crate::programs::ProgramLibrary;
use crate::readback::CompletionRequest;
use crate::settings::{ConvertSettings, Platform};

pub struct Converter {
    gpu: Arc<GpuContext>,
    programs: ProgramLibrary,
    cache: Option<BakeCache>,
}

impl Converter {
    pub fn new(gpu: Arc<GpuContext>) -> Self {
        let programs = ProgramLibrary::new(&gpu);
        Self {
            gpu,
            programs,
            cache: None,
        }
    }

    /// Attach a content-addressed cache. Without one every call re-bakes.
    pub fn with_cache(mut self, cache: BakeCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|c| c.stats())
    }

    /// Convert one material. `dest` requests PNG artifacts for every
    /// generated texture; without it results stay in cache-only form.
    pub fn convert(
        &self,
        material: &SourceMaterial,
        settings: &ConvertSettings,
        platform: Platform,
        dest: Option<&Path>,
    ) -> Result<ConvertedMaterial> {
        let wrapper = MaterialWrapper::build(material);
        log::debug!(
            "converting `{}` ({}) to {}",
            material.shader_name(),
            wrapper.family().name(),
            settings.type_name()
        );

        let plan = generators::plan(&wrapper, settings)?;

        let mut out = ConvertedMaterial {
            style: plan.style,
            main_color: [1.0, 1.0, 1.0, 1.0],
            emission_color: [0.0, 0.0, 0.0, 1.0],
            textures: Vec::new(),
            compression: platform.compression(),
        };

        for (feature, decision) in plan.features {
            match decision {
                FeatureDecision::NotUsed => {}
                FeatureDecision::Constant(value) => match feature {
                    Feature::MainColor => out.main_color = value,
                    Feature::Emission => out.emission_color = value,
                    _ => {}
                },
                FeatureDecision::Bake(bake) => {
                    let (pixels, key) =
                        self.bake_cached(material, settings, platform, feature.name(), &bake)?;
                    let path = self.persist(dest, &key, &pixels)?;
                    out.textures.push(BakedTexture {
                        feature,
                        pixels,
                        path,
                        channel: None,
                    });
                }
            }
        }

        self.bake_masks(material, settings, platform, dest, &plan.masks, &mut out)?;

        Ok(out)
    }

    /// Cache-first bake of one feature. Misses run the composition passes
    /// and block on the readback — bakes within one material are
    /// sequential, which also keeps dependent bakes ordered behind their
    /// inputs. Cache writes are best-effort.
    fn bake_cached(
        &self,
        material: &SourceMaterial,
        settings: &ConvertSettings,
        platform: Platform,
        feature: &str,
        plan: &BakePlan,
    ) -> Result<(PixelData, CacheKey)> {
        let key = cache::derive_key(material, settings, platform, feature);

        let cached = self.cache.as_ref().and_then(|c| c.try_get(&key));
        let fresh = cached.is_none();

        let request = match cached {
            Some(hit) => {
                log::debug!("cache hit: {}", key.file_stem());
                CompletionRequest::ready((*hit).clone())
            }
            None => generators::execute_plan(
                &self.gpu,
                &self.programs,
                plan,
                settings.max_texture_size(),
            )?,
        };
        let pixels = request.wait()?;

        if fresh {
            if let Some(cache) = &self.cache {
                if let Err(e) = cache.put(&key, &pixels) {
                    log::warn!("cache write failed for {}: {e}", key.file_stem());
                }
            }
        }

        Ok((pixels, key))
    }

    fn persist(
        &self,
        dest: Option<&Path>,
        key: &CacheKey,
        pixels: &PixelData,
    ) -> Result<Option<PathBuf>> {
        let Some(dir) = dest else {
            return Ok(None);
        };
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.png", key.file_stem()));
        crate::buffer::save_pixels_png(pixels, &path)?;
        Ok(Some(path))
    }

    fn bake_masks(
        &self,
        material: &SourceMaterial,
        settings: &ConvertSettings,
        platform: Platform,
        dest: Option<&Path>,
        masks: &[Option<MaskPlanEntry>],
        out: &mut ConvertedMaterial,
    ) -> Result<()> {
        if masks.iter().all(Option::is_none) {
            return Ok(());
        }

        if !settings.pack_masks() {
            for entry in masks.iter().flatten() {
                let (pixels, key) = self.bake_cached(
                    material,
                    settings,
                    platform,
                    entry.feature.name(),
                    &entry.plan,
                )?;
                let path = self.persist(dest, &key, &pixels)?;
                out.textures.push(BakedTexture {
                    feature: entry.feature,
                    pixels,
                    path,
                    channel: None,
                });
            }
            return Ok(());
        }

        let refs: Vec<Option<&MaskPlanEntry>> = masks.iter().map(|m| m.as_ref()).collect();
        let groups = packer::plan_groups(&refs);

        for (index, group) in groups.iter().enumerate() {
            let group_feature = format!("mask{index}");
            let key = cache::derive_key(material, settings, platform, &group_feature);

            let cached = self.cache.as_ref().and_then(|c| c.try_get(&key));
            let pixels = match cached {
                Some(hit) => (*hit).clone(),
                None => {
                    // Bake (and wait on) every member before the packing
                    // pass consumes it.
                    let mut members = Vec::with_capacity(group.len());
                    for (entry, channel) in group {
                        let (pixels, _) = self.bake_cached(
                            material,
                            settings,
                            platform,
                            entry.feature.name(),
                            &entry.plan,
                        )?;
                        members.push(packer::PackMember {
                            pixels,
                            channel: *channel,
                        });
                    }

                    match packer::pack_group(
                        &self.gpu,
                        &self.programs,
                        &members,
                        settings.max_texture_size(),
                    ) {
                        Ok(pixels) => {
                            if let Some(cache) = &self.cache {
                                if let Err(e) = cache.put(&key, &pixels) {
                                    log::warn!(
                                        "cache write failed for {}: {e}",
                                        key.file_stem()
                                    );
                                }
                            }
                            pixels
                        }
                        Err(e) => {
                            // Packing is an optimization; ship the masks
                            // unpacked rather than failing the conversion.
                            log::warn!("mask packing failed, shipping masks unpacked: {e}");
                            for (member, (entry, _)) in members.into_iter().zip(group) {
                                let member_key = cache::derive_key(
                                    material,
                                    settings,
                                    platform,
                                    entry.feature.name(),
                                );
                                let path = self.persist(dest, &member_key, &member.pixels)?;
                                out.textures.push(BakedTexture {
                                    feature: entry.feature,
                                    pixels: member.pixels,
                                    path,
                                    channel: None,
                                });
                            }
                            continue;
                        }
                    }
                }
            };

            let path = self.persist(dest, &key, &pixels)?;
            for (entry, channel) in group {
                out.textures.push(BakedTexture {
                    feature: entry.feature,
                    pixels: pixels.clone(),
                    path: path.clone(),
                    channel: Some(*channel),
                });
            }
        }

        Ok(())
    }
}
