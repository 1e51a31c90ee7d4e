// src/generators/mod.rs
//! Per-target-style feature generators.
//!
//! Each style module turns a wrapped material into a [`StylePlan`]: per
//! feature, the pure decision NotUsed / SkipWithConstant / BakeThenSet, and
//! for bakes the full pass list. Decisions depend only on the wrapper's
//! presence and toggle queries, so they are testable without a GPU. The
//! shared executor below turns a plan into composition passes and a
//! deferred readback.

pub mod flat_lit;
pub mod matcap_lit;
pub mod physically_lit;

use crate::buffer::{aspect_fit_reduction, BakeBuffer};
use crate::color::{lerp, matcap_attenuate, rim_intensity, tone_map_hdr};
use crate::error::Result;
use crate::family::MaterialWrapper;
use crate::gpu::GpuContext;
use crate::material::{Feature, TextureData};
use crate::programs::{
    BlendKind, CompositeParams, CompositePass, ProgramLibrary, PROGRAM_BLIT, PROGRAM_EMISSION,
    PROGRAM_MAIN_COLOR, PROGRAM_MATCAP, PROGRAM_MULTIPLY, PROGRAM_NORMAL, PROGRAM_RIM,
    PROGRAM_SWIZZLE,
};
use crate::readback::CompletionRequest;
use crate::settings::ConvertSettings;

/// One composition pass within a bake plan.
#[derive(Debug, Clone)]
pub struct PassPlan {
    pub program: &'static str,
    pub tex_a: Option<TextureData>,
    pub tex_b: Option<TextureData>,
    /// Read the previous pass's output as input A instead of `tex_a`.
    pub ping_pong: bool,
    pub params: CompositeParams,
    pub blend: BlendKind,
    pub clear: bool,
}

impl PassPlan {
    fn new(program: &'static str) -> Self {
        Self {
            program,
            tex_a: None,
            tex_b: None,
            ping_pong: false,
            params: CompositeParams::default(),
            blend: BlendKind::Replace,
            clear: true,
        }
    }
}

/// A feature bake: ordered passes plus the source resolution they sample.
#[derive(Debug, Clone)]
pub struct BakePlan {
    pub passes: Vec<PassPlan>,
    /// Max dimensions among contributing layers; the target resolution is
    /// this reduced aspect-fit to the settings cap.
    pub source_size: (u32, u32),
}

/// Outcome of a feature's decision function.
#[derive(Debug)]
pub enum FeatureDecision {
    NotUsed,
    /// The feature collapses to a constant on the output material.
    Constant([f32; 4]),
    Bake(BakePlan),
}

/// A single-channel mask bake headed for the packer.
#[derive(Debug, Clone)]
pub struct MaskPlanEntry {
    pub feature: Feature,
    pub plan: BakePlan,
}

/// Everything a style decided to do for one material.
#[derive(Debug)]
pub struct StylePlan {
    pub style: &'static str,
    pub features: Vec<(Feature, FeatureDecision)>,
    /// Mask requests in packing order; `None` slots are skipped by the
    /// packer but preserve ordering.
    pub masks: Vec<Option<MaskPlanEntry>>,
}

/// Dispatch to the style module matching the settings variant.
pub fn plan(wrapper: &MaterialWrapper, settings: &ConvertSettings) -> Result<StylePlan> {
    match settings {
        ConvertSettings::FlatLit(s) => flat_lit::plan(wrapper, s),
        ConvertSettings::MatcapLit(s) => matcap_lit::plan(wrapper, s),
        ConvertSettings::PhysicallyLit(s) => physically_lit::plan(wrapper, s),
    }
}

/// Execute a bake plan: allocate the target, run every pass, and hand back
/// the deferred readback. All transient buffers are dropped before this
/// returns except the staging buffer traveling inside the request.
pub fn execute_plan(
    gpu: &GpuContext,
    programs: &ProgramLibrary,
    plan: &BakePlan,
    max_size: u32,
) -> Result<CompletionRequest> {
    let (width, height) = aspect_fit_reduction(plan.source_size.0, plan.source_size.1, max_size);
    let mut target = BakeBuffer::new(gpu, width, height, "bake_target");

    for pass in &plan.passes {
        let upload_a = pass
            .tex_a
            .as_ref()
            .map(|t| BakeBuffer::upload(gpu, t, "bake_input_a"));
        let upload_b = pass
            .tex_b
            .as_ref()
            .map(|t| BakeBuffer::upload(gpu, t, "bake_input_b"));

        if pass.ping_pong {
            let next = BakeBuffer::new(gpu, width, height, "bake_target");
            let mut cp = CompositePass::new(pass.program);
            cp.tex_a = Some(&target);
            cp.tex_b = upload_b.as_ref();
            cp.params = pass.params;
            cp.blend = pass.blend;
            programs.run(gpu, &next, &cp)?;
            target = next;
        } else {
            let mut cp = CompositePass::new(pass.program);
            cp.tex_a = upload_a.as_ref();
            cp.tex_b = upload_b.as_ref();
            cp.params = pass.params;
            cp.blend = pass.blend;
            cp.clear = pass.clear;
            programs.run(gpu, &target, &cp)?;
        }
    }

    Ok(target.read_async(gpu))
}

/// Max dimensions among contributing layers; 1×1 when nothing is textured.
fn source_size(layers: &[Option<&TextureData>]) -> (u32, u32) {
    let mut width = 1;
    let mut height = 1;
    for layer in layers.iter().flatten() {
        width = width.max(layer.width());
        height = height.max(layer.height());
    }
    (width, height)
}

/// Main-color decision shared by every style: bake when a texture or a
/// shadow fold is involved, otherwise collapse to a constant computed with
/// the same math the shader would run.
fn main_color_plan(wrapper: &MaterialWrapper, floor: f32, fold_shadow: bool) -> FeatureDecision {
    let tex = wrapper.main_texture();
    let tint = tone_map_hdr(wrapper.main_color());
    let shadowed = fold_shadow && wrapper.use_shadow();

    let Some(tex) = tex else {
        let shadow_tint = tone_map_hdr(wrapper.shadow_tint());
        let weight = if shadowed { wrapper.shadow_strength() } else { 0.0 };
        let mut rgb = [tint[0], tint[1], tint[2]];
        for i in 0..3 {
            rgb[i] = lerp(rgb[i], rgb[i] * shadow_tint[i], weight).max(floor);
        }
        return FeatureDecision::Constant([rgb[0], rgb[1], rgb[2], tint[3]]);
    };

    // A plain tinted copy needs no shadow or floor math; the full program
    // only runs when either is in play.
    let program = if shadowed || floor > 0.0 {
        PROGRAM_MAIN_COLOR
    } else {
        PROGRAM_BLIT
    };

    let mut pass = PassPlan::new(program);
    pass.tex_a = Some(tex.clone());
    pass.params.tint_a = tint;
    pass.params.transform_a = wrapper.main_transform().to_vector();
    pass.params.factors[0] = floor;
    if shadowed {
        pass.params.tint_b = tone_map_hdr(wrapper.shadow_tint());
        pass.params.factors[1] = wrapper.shadow_strength();
    }

    FeatureDecision::Bake(BakePlan {
        source_size: source_size(&[Some(tex)]),
        passes: vec![pass],
    })
}

/// Append the matcap attenuation to a main-color decision, or fold it into
/// the constant when nothing is textured.
fn apply_matcap_attenuation(wrapper: &MaterialWrapper, main: &mut FeatureDecision) {
    let strength = wrapper.matcap_strength();
    if !wrapper.use_matcap() || strength <= 0.0 {
        return;
    }
    let class = wrapper.matcap_blend_class();

    match main {
        FeatureDecision::Bake(plan) => {
            let mut pass = PassPlan::new(PROGRAM_MATCAP);
            pass.ping_pong = true;
            pass.tex_b = wrapper.matcap_mask().cloned();
            pass.params.factors[0] = class.target();
            pass.params.factors[1] = class.weight(strength);
            plan.passes.push(pass);
        }
        FeatureDecision::Constant(c) => {
            for i in 0..3 {
                c[i] = matcap_attenuate(c[i], strength, class);
            }
        }
        FeatureDecision::NotUsed => {}
    }
}

/// Emission decision: bake when an emission map, a blend mask, or a second
/// emission layer is present; otherwise a constant for a plain emissive
/// color and NotUsed for black.
fn emission_plan(wrapper: &MaterialWrapper) -> FeatureDecision {
    if !wrapper.family().caps().emission || !wrapper.use_emission() {
        return FeatureDecision::NotUsed;
    }

    let map = wrapper.emission_map();
    let mask = wrapper.emission_blend_mask();
    let second = wrapper.use_emission_second();
    let color = wrapper.emission_color();

    if map.is_none() && mask.is_none() && !second {
        if color[0] > 0.0 || color[1] > 0.0 || color[2] > 0.0 {
            return FeatureDecision::Constant(tone_map_hdr(color));
        }
        return FeatureDecision::NotUsed;
    }

    let mut layers = vec![map, mask];
    let mut passes = Vec::new();

    let mut base = PassPlan::new(PROGRAM_EMISSION);
    base.tex_a = map.cloned();
    base.tex_b = mask.cloned();
    base.params.tint_a = tone_map_hdr(color);
    passes.push(base);

    if second {
        let second_map = wrapper.emission_second_map();
        let mut layer = PassPlan::new(PROGRAM_EMISSION);
        layer.tex_a = second_map.cloned();
        layer.params.tint_a = tone_map_hdr(wrapper.emission_second_color());
        layer.blend = BlendKind::Additive;
        layer.clear = false;
        passes.push(layer);
        layers.push(second_map);
    }

    FeatureDecision::Bake(BakePlan {
        source_size: source_size(&layers),
        passes,
    })
}

/// Normal decision: re-bake at target resolution when a map is present.
fn normal_plan(wrapper: &MaterialWrapper) -> FeatureDecision {
    if !wrapper.family().caps().normal {
        return FeatureDecision::NotUsed;
    }
    let Some(map) = wrapper.normal_map() else {
        return FeatureDecision::NotUsed;
    };

    let mut pass = PassPlan::new(PROGRAM_NORMAL);
    pass.tex_a = Some(map.clone());
    pass.params.factors[0] = wrapper.normal_strength();

    FeatureDecision::Bake(BakePlan {
        source_size: source_size(&[Some(map)]),
        passes: vec![pass],
    })
}

/// Matcap layer for styles whose target shader has a matcap slot.
fn matcap_plan(wrapper: &MaterialWrapper) -> FeatureDecision {
    if !wrapper.use_matcap() {
        return FeatureDecision::NotUsed;
    }
    let Some(tex) = wrapper.matcap_texture() else {
        return FeatureDecision::NotUsed;
    };

    let mut pass = PassPlan::new(PROGRAM_MULTIPLY);
    pass.tex_a = Some(tex.clone());
    pass.params.tint_a = tone_map_hdr(wrapper.matcap_color());

    FeatureDecision::Bake(BakePlan {
        source_size: source_size(&[Some(tex)]),
        passes: vec![pass],
    })
}

/// Rim light folded into an emission-style texture.
fn rim_plan(wrapper: &MaterialWrapper) -> FeatureDecision {
    if !wrapper.use_rim() {
        return FeatureDecision::NotUsed;
    }
    let color = wrapper.rim_color();
    let env = wrapper.rim_enable_lighting();
    let intensity = rim_intensity(env > 0.0, env, color[3]);
    if intensity <= 0.0 || (color[0] <= 0.0 && color[1] <= 0.0 && color[2] <= 0.0) {
        return FeatureDecision::NotUsed;
    }

    let main = wrapper.main_texture();
    let mut pass = PassPlan::new(PROGRAM_RIM);
    pass.tex_a = main.cloned();
    pass.params.tint_a = tone_map_hdr(color);
    pass.params.transform_a = wrapper.main_transform().to_vector();
    pass.params.factors[0] = intensity;

    FeatureDecision::Bake(BakePlan {
        source_size: source_size(&[main]),
        passes: vec![pass],
    })
}

/// Metallic mask: map red channel scaled by the metallic scalar; a missing
/// map degenerates to a flat value.
fn metallic_mask(wrapper: &MaterialWrapper) -> Option<MaskPlanEntry> {
    let map = wrapper.metallic_map();
    let scalar = wrapper.metallic();
    if map.is_none() && scalar <= 0.0 {
        return None;
    }

    let mut pass = PassPlan::new(PROGRAM_SWIZZLE);
    pass.tex_a = map.cloned();
    pass.params.channels[0] = 0;
    pass.params.factors[0] = scalar;

    Some(MaskPlanEntry {
        feature: Feature::Specular,
        plan: BakePlan {
            source_size: source_size(&[map]),
            passes: vec![pass],
        },
    })
}

fn smoothness_mask(wrapper: &MaterialWrapper) -> Option<MaskPlanEntry> {
    let map = wrapper.smoothness_map();
    let scalar = wrapper.smoothness();
    if map.is_none() && scalar <= 0.0 {
        return None;
    }

    let mut pass = PassPlan::new(PROGRAM_SWIZZLE);
    pass.tex_a = map.cloned();
    pass.params.channels[0] = wrapper.smoothness_source_channel();
    pass.params.factors[0] = scalar;

    Some(MaskPlanEntry {
        feature: Feature::Smoothness,
        plan: BakePlan {
            source_size: source_size(&[map]),
            passes: vec![pass],
        },
    })
}

/// Occlusion mask: the map's green channel remapped by occlusion strength
/// (`lerp(1, g, strength)`, expressed as scale + bias).
fn occlusion_mask(wrapper: &MaterialWrapper) -> Option<MaskPlanEntry> {
    if !wrapper.family().caps().occlusion {
        return None;
    }
    let map = wrapper.occlusion_map()?;
    let strength = wrapper.occlusion_strength();

    let mut pass = PassPlan::new(PROGRAM_SWIZZLE);
    pass.tex_a = Some(map.clone());
    pass.params.channels[0] = 1;
    pass.params.factors[0] = strength;
    pass.params.factors[1] = 1.0 - strength;

    Some(MaskPlanEntry {
        feature: Feature::Occlusion,
        plan: BakePlan {
            source_size: source_size(&[Some(map)]),
            passes: vec![pass],
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{PropertyValue, SourceMaterial, TextureData};
    use crate::settings::{
        FlatLitSettings, MatcapLitSettings, PhysicallyLitSettings,
    };

    fn tex() -> PropertyValue {
        PropertyValue::Texture(TextureData::solid([128, 128, 128, 255]))
    }

    #[test]
    fn test_main_color_constant_when_untextured() {
        let mat = SourceMaterial::new("liltoon")
            .with("_Color", PropertyValue::Color([0.5, 0.5, 0.5, 1.0]));
        let wrapper = MaterialWrapper::build(&mat);
        match main_color_plan(&wrapper, 0.0, true) {
            FeatureDecision::Constant(c) => assert_eq!(c, [0.5, 0.5, 0.5, 1.0]),
            _ => panic!("expected constant"),
        }
    }

    #[test]
    fn test_main_color_bakes_with_texture() {
        // Untinted copy goes through the plain blit program
        let mat = SourceMaterial::new("liltoon").with("_MainTex", tex());
        let wrapper = MaterialWrapper::build(&mat);
        match main_color_plan(&wrapper, 0.0, true) {
            FeatureDecision::Bake(plan) => {
                assert_eq!(plan.passes.len(), 1);
                assert_eq!(plan.passes[0].program, PROGRAM_BLIT);
            }
            _ => panic!("expected bake"),
        }

        // A folded shadow switches to the full main-color program
        let mat = SourceMaterial::new("liltoon")
            .with("_MainTex", tex())
            .with("_UseShadow", PropertyValue::Float(1.0))
            .with("_ShadowColor", PropertyValue::Color([0.5, 0.4, 0.6, 1.0]))
            .with("_ShadowStrength", PropertyValue::Float(0.8));
        let wrapper = MaterialWrapper::build(&mat);
        match main_color_plan(&wrapper, 0.0, true) {
            FeatureDecision::Bake(plan) => {
                assert_eq!(plan.passes[0].program, PROGRAM_MAIN_COLOR);
                assert_eq!(plan.passes[0].params.factors[1], 0.8);
            }
            _ => panic!("expected bake"),
        }
    }

    #[test]
    fn test_emission_requires_toggle_on_toon() {
        let mat = SourceMaterial::new("liltoon")
            .with("_EmissionColor", PropertyValue::Color([1.0, 0.0, 0.0, 1.0]))
            .with("_EmissionMap", tex());
        let wrapper = MaterialWrapper::build(&mat);
        assert!(matches!(emission_plan(&wrapper), FeatureDecision::NotUsed));
    }

    #[test]
    fn test_emission_decision_matrix() {
        // Map present: bake
        let mat = SourceMaterial::new("liltoon")
            .with("_UseEmission", PropertyValue::Float(1.0))
            .with("_EmissionColor", PropertyValue::Color([1.0, 1.0, 1.0, 1.0]))
            .with("_EmissionMap", tex());
        let wrapper = MaterialWrapper::build(&mat);
        assert!(matches!(emission_plan(&wrapper), FeatureDecision::Bake(_)));

        // Blend mask alone also forces a bake
        let mat = SourceMaterial::new("liltoon")
            .with("_UseEmission", PropertyValue::Float(1.0))
            .with("_EmissionColor", PropertyValue::Color([1.0, 1.0, 1.0, 1.0]))
            .with("_EmissionBlendMask", tex());
        let wrapper = MaterialWrapper::build(&mat);
        assert!(matches!(emission_plan(&wrapper), FeatureDecision::Bake(_)));

        // Second layer alone forces a bake with two passes
        let mat = SourceMaterial::new("liltoon")
            .with("_UseEmission", PropertyValue::Float(1.0))
            .with("_EmissionColor", PropertyValue::Color([1.0, 1.0, 1.0, 1.0]))
            .with("_UseEmission2nd", PropertyValue::Float(1.0))
            .with("_Emission2ndColor", PropertyValue::Color([0.0, 1.0, 0.0, 1.0]));
        let wrapper = MaterialWrapper::build(&mat);
        match emission_plan(&wrapper) {
            FeatureDecision::Bake(plan) => {
                assert_eq!(plan.passes.len(), 2);
                assert_eq!(plan.passes[1].blend, BlendKind::Additive);
                assert!(!plan.passes[1].clear);
            }
            _ => panic!("expected bake"),
        }

        // Plain emissive color: constant, tone-mapped
        let mat = SourceMaterial::new("liltoon")
            .with("_UseEmission", PropertyValue::Float(1.0))
            .with("_EmissionColor", PropertyValue::Color([2.0, 1.0, 0.5, 1.0]));
        let wrapper = MaterialWrapper::build(&mat);
        match emission_plan(&wrapper) {
            FeatureDecision::Constant(c) => {
                assert!((c[0] - 1.0).abs() < 1e-5);
            }
            _ => panic!("expected constant"),
        }

        // Black color, no maps: not used
        let mat = SourceMaterial::new("liltoon")
            .with("_UseEmission", PropertyValue::Float(1.0))
            .with("_EmissionColor", PropertyValue::Color([0.0, 0.0, 0.0, 1.0]));
        let wrapper = MaterialWrapper::build(&mat);
        assert!(matches!(emission_plan(&wrapper), FeatureDecision::NotUsed));
    }

    #[test]
    fn test_matcap_attenuation_on_constant() {
        let mat = SourceMaterial::new("liltoon")
            .with("_Color", PropertyValue::Color([0.8, 0.8, 0.8, 1.0]))
            .with("_UseMatCap", PropertyValue::Float(1.0))
            .with("_MatCapMainStrength", PropertyValue::Float(0.25));
        let wrapper = MaterialWrapper::build(&mat);
        let mut main = main_color_plan(&wrapper, 0.0, false);
        apply_matcap_attenuation(&wrapper, &mut main);
        match main {
            FeatureDecision::Constant(c) => {
                assert!((c[0] - 0.512).abs() < 1e-5);
                assert_eq!(c[3], 1.0);
            }
            _ => panic!("expected constant"),
        }
    }

    #[test]
    fn test_matcap_attenuation_appends_pass() {
        let mat = SourceMaterial::new("liltoon")
            .with("_MainTex", tex())
            .with("_UseMatCap", PropertyValue::Float(1.0))
            .with("_MatCapMainStrength", PropertyValue::Float(0.5))
            .with("_MatCapBlendMode", PropertyValue::Float(3.0));
        let wrapper = MaterialWrapper::build(&mat);
        let mut main = main_color_plan(&wrapper, 0.0, false);
        apply_matcap_attenuation(&wrapper, &mut main);
        match main {
            FeatureDecision::Bake(plan) => {
                assert_eq!(plan.passes.len(), 2);
                let pass = &plan.passes[1];
                assert_eq!(pass.program, PROGRAM_MATCAP);
                assert!(pass.ping_pong);
                // Multiplicative class: target 1, weight = strength
                assert_eq!(pass.params.factors[0], 1.0);
                assert_eq!(pass.params.factors[1], 0.5);
            }
            _ => panic!("expected bake"),
        }
    }

    #[test]
    fn test_rim_plan_uses_intensity_rule() {
        let mat = SourceMaterial::new("liltoon")
            .with("_MainTex", tex())
            .with("_UseRim", PropertyValue::Float(1.0))
            .with("_RimColor", PropertyValue::Color([1.0, 0.5, 0.5, 0.5]))
            .with("_RimEnableLighting", PropertyValue::Float(0.6));
        let wrapper = MaterialWrapper::build(&mat);
        match rim_plan(&wrapper) {
            FeatureDecision::Bake(plan) => {
                assert!((plan.passes[0].params.factors[0] - 0.15).abs() < 1e-5);
            }
            _ => panic!("expected bake"),
        }
    }

    #[test]
    fn test_mask_decisions() {
        // Scalar-only metallic still produces a mask
        let mat = SourceMaterial::new("Standard")
            .with("_Metallic", PropertyValue::Float(0.7));
        let wrapper = MaterialWrapper::build(&mat);
        let metallic = metallic_mask(&wrapper).unwrap();
        assert_eq!(metallic.feature, Feature::Specular);
        assert_eq!(metallic.plan.passes[0].params.factors[0], 0.7);

        // Standard reads smoothness from the gloss map's alpha channel
        let mat = SourceMaterial::new("Standard")
            .with("_Glossiness", PropertyValue::Float(0.4))
            .with("_MetallicGlossMap", tex());
        let wrapper = MaterialWrapper::build(&mat);
        let smoothness = smoothness_mask(&wrapper).unwrap();
        assert_eq!(smoothness.plan.passes[0].params.channels[0], 3);

        // Occlusion needs a map and the family capability
        let mat = SourceMaterial::new("Standard")
            .with("_OcclusionMap", tex())
            .with("_OcclusionStrength", PropertyValue::Float(0.5));
        let wrapper = MaterialWrapper::build(&mat);
        let occlusion = occlusion_mask(&wrapper).unwrap();
        assert_eq!(occlusion.plan.passes[0].params.factors, [0.5, 0.5, 0.0, 0.0]);

        let mat = SourceMaterial::new("liltoon").with("_OcclusionMap", tex());
        let wrapper = MaterialWrapper::build(&mat);
        assert!(occlusion_mask(&wrapper).is_none());

        // Zero metallic with no map: nothing to pack
        let mat = SourceMaterial::new("Standard");
        let wrapper = MaterialWrapper::build(&mat);
        assert!(metallic_mask(&wrapper).is_none());
    }

    #[test]
    fn test_style_capability_errors() {
        let standard = SourceMaterial::new("Standard");
        let wrapper = MaterialWrapper::build(&standard);
        let err = matcap_lit::plan(&wrapper, &MatcapLitSettings::default()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ConvertError::UnsupportedFeature { feature: "matcap", .. }
        ));

        let unknown = SourceMaterial::new("Custom/Foo");
        let wrapper = MaterialWrapper::build(&unknown);
        let err = physically_lit::plan(&wrapper, &PhysicallyLitSettings::default()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ConvertError::UnsupportedFeature { feature: "specular", .. }
        ));

        // Flat-lit converts anything
        assert!(flat_lit::plan(&wrapper, &FlatLitSettings::default()).is_ok());
    }

    #[test]
    fn test_matcap_precondition_diagnostics() {
        // Blend mode declared with the wrong type: shader-package drift
        let mat = SourceMaterial::new("liltoon")
            .with("_UseMatCap", PropertyValue::Float(1.0))
            .with("_MatCapBlendMode", tex())
            .with("_MatCapMainStrength", PropertyValue::Float(0.5));
        let wrapper = MaterialWrapper::build(&mat);
        let err = matcap_lit::plan(&wrapper, &MatcapLitSettings::default()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ConvertError::PropertyWrongType { expected: "Float", .. }
        ));

        // Strength missing entirely
        let mat = SourceMaterial::new("liltoon")
            .with("_UseMatCap", PropertyValue::Float(1.0))
            .with("_MatCapBlendMode", PropertyValue::Float(0.0));
        let wrapper = MaterialWrapper::build(&mat);
        let err = matcap_lit::plan(&wrapper, &MatcapLitSettings::default()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ConvertError::PropertyMissing { .. }
        ));
    }

    #[test]
    fn test_physically_lit_plan_shape() {
        let mat = SourceMaterial::new("Standard")
            .with("_MainTex", tex())
            .with("_BumpMap", tex())
            .with("_Metallic", PropertyValue::Float(1.0))
            .with("_OcclusionMap", tex());
        let wrapper = MaterialWrapper::build(&mat);
        let plan = physically_lit::plan(&wrapper, &PhysicallyLitSettings::default()).unwrap();
        assert_eq!(plan.style, "PhysicallyLit");
        assert_eq!(plan.masks.len(), 3);
        assert!(plan.masks[0].is_some()); // metallic
        assert!(plan.masks[2].is_some()); // occlusion
        assert!(plan
            .features
            .iter()
            .any(|(f, d)| *f == Feature::Normal && matches!(d, FeatureDecision::Bake(_))));
    }
}
