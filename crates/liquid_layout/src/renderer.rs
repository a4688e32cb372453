//! Per-tier effect strategies
//!
//! A [`LiquidRenderer`] owns the shader backend for one effect node and
//! answers the two questions the node's state machine asks: which dirty
//! fields matter on this tier, and what render effect to build from the
//! current parameters. Tiers without runtime shaders also decorate the
//! composited layer with a static approximation of the glass.

use std::fmt;
use std::path::Path as FsPath;

use liquid_core::{
    Brush, ClipShape, Color, ColorFilter, DrawContext, Gradient, LayerId, Point, Stroke,
};
use liquid_gpu::{
    create_backend, select_tier, BackendConfig, BackendStats, BlurEffect, CapabilityTier,
    LayerPool, RenderEffect, ShaderBackend, LIQUID_CONTENT_INPUT,
};
use tracing::{debug, trace};

use crate::error::Result;
use crate::fields::{DirtyMask, Field};
use crate::liquid::MIN_EFFECT_DIMENSION;
use crate::scope::{LiquidParams, LiquidScope};
use crate::units::Dp;

/// Effect construction for one capability tier
pub trait LiquidRenderer: fmt::Debug {
    fn tier(&self) -> CapabilityTier;

    /// Fields whose change needs a redraw
    fn invalidate_mask(&self) -> DirtyMask;

    /// Fields whose change needs a new render effect
    fn render_effect_mask(&self) -> DirtyMask;

    /// Build the render effect for `params`
    ///
    /// Called before the dirty mask is cleaned, so implementations may
    /// consult it to reuse parts of the previous effect.
    fn create_render_effect(&mut self, params: &LiquidParams) -> Option<RenderEffect>;

    /// Draw the composited layer
    fn draw_layer(
        &self,
        _params: &LiquidParams,
        _layers: &mut LayerPool,
        layer: LayerId,
        canvas: &mut dyn DrawContext,
    ) {
        canvas.draw_layer(layer);
    }

    /// Below this dimension the node skips the effect
    fn min_effect_dimension(&self) -> f32 {
        MIN_EFFECT_DIMENSION
    }

    fn backend_stats(&self) -> BackendStats;
}

// ─────────────────────────────────────────────────────────────────────────────
// Runtime shader tier
// ─────────────────────────────────────────────────────────────────────────────

/// Runtime shader, chained after a cached blur
#[derive(Debug)]
pub struct ShaderRenderer {
    backend: Box<dyn ShaderBackend>,
    blur: Option<BlurEffect>,
    blur_built: bool,
    min_dimension: f32,
}

impl ShaderRenderer {
    pub fn new(backend: Box<dyn ShaderBackend>) -> Self {
        Self {
            backend,
            blur: None,
            blur_built: false,
            min_dimension: MIN_EFFECT_DIMENSION,
        }
    }

    pub fn with_min_dimension(mut self, min_dimension: f32) -> Self {
        self.min_dimension = min_dimension;
        self
    }
}

impl LiquidRenderer for ShaderRenderer {
    fn tier(&self) -> CapabilityTier {
        self.backend.tier()
    }

    fn invalidate_mask(&self) -> DirtyMask {
        DirtyMask::INVALIDATE
    }

    fn render_effect_mask(&self) -> DirtyMask {
        DirtyMask::RENDER_EFFECT
    }

    fn create_render_effect(&mut self, params: &LiquidParams) -> Option<RenderEffect> {
        params.size()?;

        if !self.blur_built || params.dirty().contains(Field::Frost) {
            self.blur = self.backend.build_blur(params.frost_radius());
            self.blur_built = true;
        }
        let effect = self.backend.build_render_pipeline(
            &params.uniforms(),
            LIQUID_CONTENT_INPUT,
            self.blur.as_ref(),
        );
        trace!("Rebuilt liquid render effect for {:?}", params.dirty());
        effect
    }

    fn min_effect_dimension(&self) -> f32 {
        self.min_dimension
    }

    fn backend_stats(&self) -> BackendStats {
        self.backend.stats()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reduced tiers
// ─────────────────────────────────────────────────────────────────────────────

/// Blur or nothing, plus a tint, saturation and edge approximation
#[derive(Debug)]
pub struct FallbackRenderer {
    backend: Box<dyn ShaderBackend>,
    edge_stroke: Dp,
    min_dimension: f32,
}

/// Highlight colour of the approximated edge
const EDGE_HIGHLIGHT: u32 = 0x4DFF_FFFF;

impl FallbackRenderer {
    pub fn new(backend: Box<dyn ShaderBackend>, edge_stroke: Dp) -> Self {
        Self {
            backend,
            edge_stroke,
            min_dimension: MIN_EFFECT_DIMENSION,
        }
    }

    pub fn with_min_dimension(mut self, min_dimension: f32) -> Self {
        self.min_dimension = min_dimension;
        self
    }

    fn blur_supported(&self) -> bool {
        self.backend.tier().supports_blur()
    }
}

impl LiquidRenderer for FallbackRenderer {
    fn tier(&self) -> CapabilityTier {
        self.backend.tier()
    }

    fn invalidate_mask(&self) -> DirtyMask {
        if self.blur_supported() {
            DirtyMask::BLUR_ONLY_INVALIDATE
        } else {
            DirtyMask::BASIC_INVALIDATE
        }
    }

    fn render_effect_mask(&self) -> DirtyMask {
        if self.blur_supported() {
            DirtyMask::BLUR_ONLY_RENDER_EFFECT
        } else {
            DirtyMask::EMPTY
        }
    }

    fn create_render_effect(&mut self, params: &LiquidParams) -> Option<RenderEffect> {
        let blur = self.backend.build_blur(params.frost_radius())?;
        self.backend
            .build_render_pipeline(&params.uniforms(), LIQUID_CONTENT_INPUT, Some(&blur))
    }

    fn draw_layer(
        &self,
        params: &LiquidParams,
        layers: &mut LayerPool,
        layer: LayerId,
        canvas: &mut dyn DrawContext,
    ) {
        let Some(size) = params.size() else {
            canvas.draw_layer(layer);
            return;
        };
        let outline = params.shape().outline(size, params.density());

        if let Some(target) = layers.get_mut(layer) {
            let saturation = params.saturation();
            target.color_filter = (saturation != 1.0).then(|| ColorFilter::saturation(saturation));
        }

        canvas.push_clip(ClipShape::path(outline.clone()));
        canvas.draw_layer(layer);

        if let Some(tint) = params.tint() {
            canvas.fill_path(&outline, Brush::Solid(tint));
        }

        if params.edge() > 0.0 {
            let radius = size.min_dimension();
            let stroke = Stroke::new(self.edge_stroke.to_px(params.density()));
            let light = Color::from_argb(EDGE_HIGHLIGHT);
            for center in [Point::ZERO, Point::new(size.width, size.height)] {
                let gradient = Gradient::radial(center, radius, light, Color::TRANSPARENT);
                canvas.stroke_path(&outline, &stroke, Brush::Gradient(gradient));
            }
        }

        canvas.pop_clip();
    }

    fn min_effect_dimension(&self) -> f32 {
        self.min_dimension
    }

    fn backend_stats(&self) -> BackendStats {
        self.backend.stats()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Selection
// ─────────────────────────────────────────────────────────────────────────────

/// Build the renderer for a tier
///
/// The strategy follows the backend actually created, so a full tier whose
/// shader cannot be compiled gets the reduced renderer.
pub fn create_renderer(tier: CapabilityTier, config: &BackendConfig) -> Box<dyn LiquidRenderer> {
    let backend = create_backend(tier, config);
    debug!("Creating liquid renderer for {:?}", backend.tier());
    if backend.tier().supports_runtime_shader() {
        Box::new(ShaderRenderer::new(backend).with_min_dimension(config.min_effect_dimension))
    } else {
        Box::new(
            FallbackRenderer::new(backend, Dp(config.edge_stroke_dp))
                .with_min_dimension(config.min_effect_dimension),
        )
    }
}

/// Load a backend config and build the renderer it selects
///
/// Without a tier override the full tier is assumed.
pub fn load_renderer(path: impl AsRef<FsPath>) -> Result<Box<dyn LiquidRenderer>> {
    let config = BackendConfig::load(path)?;
    Ok(create_renderer(select_tier(&config, None), &config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use liquid_core::{DrawCommand, RecordingContext, Size};
    use liquid_gpu::RenderEffectKind;

    fn sized_params() -> LiquidParams {
        let mut params = LiquidParams::new();
        params.set_size(Some(Size::new(100.0, 100.0)));
        params
    }

    #[test]
    fn test_create_renderer_per_tier() {
        let config = BackendConfig::default();
        for tier in [CapabilityTier::Full, CapabilityTier::BlurOnly, CapabilityTier::Basic] {
            assert_eq!(create_renderer(tier, &config).tier(), tier);
        }
    }

    #[test]
    fn test_tier_masks() {
        let config = BackendConfig::default();
        let full = create_renderer(CapabilityTier::Full, &config);
        assert_eq!(full.render_effect_mask(), DirtyMask::RENDER_EFFECT);

        let blur_only = create_renderer(CapabilityTier::BlurOnly, &config);
        assert_eq!(blur_only.invalidate_mask(), DirtyMask::BLUR_ONLY_INVALIDATE);
        assert_eq!(blur_only.render_effect_mask(), DirtyMask::from(Field::Frost));

        let basic = create_renderer(CapabilityTier::Basic, &config);
        assert!(basic.render_effect_mask().is_empty());
        assert!(!basic.invalidate_mask().contains(Field::Frost));
    }

    #[test]
    fn test_shader_needs_size() {
        let mut renderer = ShaderRenderer::new(create_backend(
            CapabilityTier::Full,
            &BackendConfig::default(),
        ));
        assert!(renderer.create_render_effect(&LiquidParams::new()).is_none());
        assert!(renderer.create_render_effect(&sized_params()).is_some());
    }

    #[test]
    fn test_shader_reuses_blur_until_frost_changes() {
        let mut renderer = ShaderRenderer::new(create_backend(
            CapabilityTier::Full,
            &BackendConfig::default(),
        ));
        let mut params = sized_params();
        params.set_frost(Dp(6.0));
        let first = renderer.create_render_effect(&params).unwrap();
        params.clean();

        params.set_refraction(0.4);
        let second = renderer.create_render_effect(&params).unwrap();
        assert_ne!(first.id(), second.id());
        assert_eq!(
            first.blur().map(|b| b.id()),
            second.blur().map(|b| b.id())
        );
        params.clean();

        params.set_frost(Dp(12.0));
        let third = renderer.create_render_effect(&params).unwrap();
        assert_ne!(third.blur().map(|b| b.id()), second.blur().map(|b| b.id()));
        assert_eq!(third.blur().map(|b| b.radius()), Some(12.0));
        assert_eq!(renderer.backend_stats().blurs_built, 2);
    }

    #[test]
    fn test_small_frost_has_no_blur() {
        let mut renderer = ShaderRenderer::new(create_backend(
            CapabilityTier::Full,
            &BackendConfig::default(),
        ));
        let mut params = sized_params();
        params.set_frost(Dp(0.5));
        let effect = renderer.create_render_effect(&params).unwrap();
        assert!(effect.blur().is_none());
        assert!(matches!(effect.kind(), RenderEffectKind::RuntimeShader { .. }));
    }

    #[test]
    fn test_fallback_effect_is_blur() {
        let config = BackendConfig::default();
        let mut blur_only = create_renderer(CapabilityTier::BlurOnly, &config);
        let mut params = sized_params();
        assert!(blur_only.create_render_effect(&params).is_none());

        params.set_frost(Dp(3.0));
        let effect = blur_only.create_render_effect(&params).unwrap();
        assert!(matches!(effect.kind(), RenderEffectKind::Blur(_)));

        let mut basic = create_renderer(CapabilityTier::Basic, &config);
        assert!(basic.create_render_effect(&params).is_none());
    }

    #[test]
    fn test_fallback_draws_approximation() {
        let renderer = FallbackRenderer::new(
            create_backend(CapabilityTier::Basic, &BackendConfig::default()),
            Dp(4.0),
        );
        let mut params = sized_params();
        params.set_tint(Some(Color::RED));
        params.set_edge(0.1);
        params.set_saturation(0.5);
        params.set_density(crate::units::Density(2.0));

        let mut layers = LayerPool::new();
        let layer = layers.create_layer();
        let mut canvas = RecordingContext::new(Size::new(100.0, 100.0));
        renderer.draw_layer(&params, &mut layers, layer, &mut canvas);

        let commands = canvas.commands();
        assert!(matches!(commands[0], DrawCommand::PushClip(ClipShape::Path(_))));
        assert_eq!(commands[1], DrawCommand::DrawLayer(layer));
        assert!(matches!(
            &commands[2],
            DrawCommand::FillPath { brush: Brush::Solid(c), .. } if *c == Color::RED
        ));
        let strokes: Vec<_> = commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::StrokePath { stroke, .. } => Some(stroke.width),
                _ => None,
            })
            .collect();
        assert_eq!(strokes, vec![8.0, 8.0]);
        assert_eq!(commands.last(), Some(&DrawCommand::PopClip));
        assert_eq!(
            layers.get(layer).unwrap().color_filter,
            Some(ColorFilter::saturation(0.5))
        );
    }

    #[test]
    fn test_fallback_plain_layer() {
        let renderer = FallbackRenderer::new(
            create_backend(CapabilityTier::BlurOnly, &BackendConfig::default()),
            Dp(4.0),
        );
        let params = sized_params();
        let mut layers = LayerPool::new();
        let layer = layers.create_layer();
        let mut canvas = RecordingContext::new(Size::new(100.0, 100.0));
        renderer.draw_layer(&params, &mut layers, layer, &mut canvas);

        assert_eq!(canvas.commands().len(), 3);
        assert!(layers.get(layer).unwrap().color_filter.is_none());
    }
}
