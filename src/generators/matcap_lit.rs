// src/generators/matcap_lit.rs
//! Matcap-lit target style: flat-lit albedo attenuated by the matcap layer,
//! the matcap texture carried over to the target shader's matcap slot, and
//! the rim light folded into an emission texture.

use super::{
    apply_matcap_attenuation, main_color_plan, matcap_plan, rim_plan, FeatureDecision, StylePlan,
};
use crate::error::{ConvertError, Result};
use crate::family::MaterialWrapper;
use crate::material::Feature;
use crate::settings::MatcapLitSettings;

pub fn plan(wrapper: &MaterialWrapper, settings: &MatcapLitSettings) -> Result<StylePlan> {
    let caps = wrapper.family().caps();

    if settings.bake_matcap && !caps.matcap {
        return Err(ConvertError::UnsupportedFeature {
            family: wrapper.family().name(),
            feature: "matcap",
        });
    }
    if settings.bake_rim && !caps.rim {
        return Err(ConvertError::UnsupportedFeature {
            family: wrapper.family().name(),
            feature: "rim",
        });
    }

    // The attenuation math is only meaningful if the installed shader
    // version still declares these as scalars; drift surfaces here with a
    // missing-vs-wrong-type diagnostic instead of a silently wrong bake.
    if settings.bake_matcap && wrapper.use_matcap() {
        let source = wrapper.source();
        source.require_float("_MatCapBlendMode")?;
        source.require_float("_MatCapMainStrength")?;
    }

    let mut main = main_color_plan(wrapper, settings.main_brightness_floor, settings.fold_shadow);
    if settings.bake_matcap {
        apply_matcap_attenuation(wrapper, &mut main);
    }

    let matcap = if settings.bake_matcap {
        matcap_plan(wrapper)
    } else {
        FeatureDecision::NotUsed
    };
    let rim = if settings.bake_rim {
        rim_plan(wrapper)
    } else {
        FeatureDecision::NotUsed
    };

    Ok(StylePlan {
        style: "MatcapLit",
        features: vec![
            (Feature::MainColor, main),
            (Feature::Matcap, matcap),
            (Feature::Rim, rim),
        ],
        masks: Vec::new(),
    })
}
