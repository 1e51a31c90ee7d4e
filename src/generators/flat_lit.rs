// src/generators/flat_lit.rs
//! Flat-lit target style: everything collapses into a single albedo with
//! the shadow tint folded in. Works for every source family — an unverified
//! shader still yields its main texture/color pass-through.

use super::{main_color_plan, StylePlan};
use crate::error::Result;
use crate::family::MaterialWrapper;
use crate::material::Feature;
use crate::settings::FlatLitSettings;

pub fn plan(wrapper: &MaterialWrapper, settings: &FlatLitSettings) -> Result<StylePlan> {
    let main = main_color_plan(wrapper, settings.main_brightness_floor, settings.fold_shadow);

    Ok(StylePlan {
        style: "FlatLit",
        features: vec![(Feature::MainColor, main)],
        masks: Vec::new(),
    })
}
