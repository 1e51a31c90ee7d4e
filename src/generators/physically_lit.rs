// src/generators/physically_lit.rs
//! Physically-lit target style: albedo, normal, emission, plus the
//! single-channel metallic/smoothness/occlusion masks headed for the
//! channel packer. Requires a family with specular data; lighting stays
//! dynamic, so no shadow fold.

use super::{
    emission_plan, main_color_plan, metallic_mask, normal_plan, occlusion_mask, smoothness_mask,
    FeatureDecision, StylePlan,
};
use crate::error::{ConvertError, Result};
use crate::family::MaterialWrapper;
use crate::material::Feature;
use crate::settings::PhysicallyLitSettings;

pub fn plan(wrapper: &MaterialWrapper, settings: &PhysicallyLitSettings) -> Result<StylePlan> {
    let caps = wrapper.family().caps();

    if !caps.specular {
        return Err(ConvertError::UnsupportedFeature {
            family: wrapper.family().name(),
            feature: "specular",
        });
    }

    let main = main_color_plan(wrapper, settings.main_brightness_floor, false);
    let normal = if settings.bake_normal {
        normal_plan(wrapper)
    } else {
        FeatureDecision::NotUsed
    };
    let emission = if settings.bake_emission {
        emission_plan(wrapper)
    } else {
        FeatureDecision::NotUsed
    };

    // Packing order is fixed: metallic and smoothness land in the channels
    // the downstream compressed formats preserve best.
    let masks = vec![
        metallic_mask(wrapper),
        smoothness_mask(wrapper),
        occlusion_mask(wrapper),
    ];

    Ok(StylePlan {
        style: "PhysicallyLit",
        features: vec![
            (Feature::MainColor, main),
            (Feature::Normal, normal),
            (Feature::Emission, emission),
        ],
        masks,
    })
}
