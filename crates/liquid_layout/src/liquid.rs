//! Glass effect node
//!
//! The consumer side of the effect. Each pass the node:
//! 1. re-runs its configuration block against its [`LiquidParams`]
//! 2. lists the registry, minus its nearest ancestor surface
//! 3. rebuilds the render effect only when the dirty mask demands it
//! 4. composites the overlapping surfaces into its own layer
//! 5. draws that layer through the render effect, then its own content
//!
//! What counts as "demands it" is up to the node's [`LiquidRenderer`].

use std::any::Any;
use std::fmt;

use liquid_core::{
    Affine2D, DrawContext, LayerId, Point, ReactiveGraph, RecordingContext, Size,
};
use liquid_gpu::RenderEffect;
use tracing::{debug, trace};

use crate::fields::DirtyMask;
use crate::node::{ContentDrawScope, LayoutCoordinates, ModifierNode, NodeContext};
use crate::renderer::LiquidRenderer;
use crate::scope::{LiquidParams, LiquidScope};
use crate::state::{Liquefiable, LiquidState};

/// Configuration block; reads made through the graph are observed
pub type LiquidBlock = Box<dyn FnMut(&ReactiveGraph, &mut dyn LiquidScope)>;

/// Smallest dimension the effect is drawn at unless the renderer says otherwise
pub const MIN_EFFECT_DIMENSION: f32 = 1.0;

/// Lifecycle of a [`LiquidNode`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiquidNodeState {
    Detached,
    /// Attached with nothing to rebuild
    Idle,
    /// Parameters changed but no usable size is known yet
    PendingRecompute,
    /// Render effect matches the parameters
    PipelineValid,
}

pub struct LiquidNode {
    state: LiquidState,
    block: LiquidBlock,
    params: LiquidParams,
    renderer: Box<dyn LiquidRenderer>,
    render_effect: Option<RenderEffect>,
    layer: Option<LayerId>,
    lifecycle: LiquidNodeState,
    min_dimension: f32,
}

impl fmt::Debug for LiquidNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiquidNode")
            .field("lifecycle", &self.lifecycle)
            .field("tier", &self.renderer.tier())
            .field("dirty", &self.params.dirty())
            .field("layer", &self.layer)
            .finish_non_exhaustive()
    }
}

impl LiquidNode {
    pub fn new(
        state: LiquidState,
        block: impl FnMut(&ReactiveGraph, &mut dyn LiquidScope) + 'static,
        renderer: Box<dyn LiquidRenderer>,
    ) -> Self {
        Self {
            state,
            block: Box::new(block),
            params: LiquidParams::new(),
            min_dimension: renderer.min_effect_dimension(),
            renderer,
            render_effect: None,
            layer: None,
            lifecycle: LiquidNodeState::Detached,
        }
    }

    /// Skip the effect when the node is smaller than `min_dimension`
    pub fn with_min_dimension(mut self, min_dimension: f32) -> Self {
        self.min_dimension = min_dimension;
        self
    }

    pub fn params(&self) -> &LiquidParams {
        &self.params
    }

    /// Current render effect, rebuilt only when the dirty mask requires it
    pub fn render_effect(&self) -> Option<&RenderEffect> {
        self.render_effect.as_ref()
    }

    /// The node's compositing layer, once drawn
    pub fn layer(&self) -> Option<LayerId> {
        self.layer
    }

    pub fn lifecycle(&self) -> LiquidNodeState {
        self.lifecycle
    }

    pub fn renderer(&self) -> &dyn LiquidRenderer {
        self.renderer.as_ref()
    }

    pub fn state(&self) -> &LiquidState {
        &self.state
    }

    /// Swap the registry and block, then re-evaluate
    pub fn update(
        &mut self,
        cx: &mut NodeContext<'_>,
        state: LiquidState,
        block: impl FnMut(&ReactiveGraph, &mut dyn LiquidScope) + 'static,
    ) {
        self.state = state;
        self.block = Box::new(block);
        self.invalidate_liquid_block(cx);
    }

    /// Re-run the block and refresh the surface list
    pub fn invalidate_liquid_block(&mut self, cx: &mut NodeContext<'_>) {
        if self.lifecycle == LiquidNodeState::Detached {
            return;
        }
        self.params.set_density(cx.density);

        // Allows a node to be both surface and effect without sampling itself
        let ancestor = cx.nearest_ancestor_liquefiable().map(|l| l.id());
        let Self {
            state,
            block,
            params,
            ..
        } = self;
        cx.observe_reads(|graph| {
            block(graph, &mut *params);
            params.set_liquefiables(state.query(graph, None, ancestor));
        });

        self.invalidate_draw_if_needed(cx);
    }

    /// Whether the laid out size is large enough to build an effect for
    fn has_drawable_size(&self) -> bool {
        self.params
            .size()
            .is_some_and(|size| size.min_dimension() >= self.min_dimension)
    }

    fn invalidate_draw_if_needed(&mut self, cx: &mut NodeContext<'_>) {
        let dirty = self.params.dirty();
        if !self.has_drawable_size() {
            // Keep the mask so the first usable size rebuilds everything
            if !dirty.is_empty() {
                if self.lifecycle == LiquidNodeState::PipelineValid {
                    cx.invalidate_draw();
                }
                self.lifecycle = LiquidNodeState::PendingRecompute;
            }
            return;
        }
        if !dirty.intersects(self.renderer.invalidate_mask()) {
            return;
        }
        if dirty.intersects(self.renderer.render_effect_mask()) {
            self.render_effect = self.renderer.create_render_effect(&self.params);
            debug!(
                "Rebuilt render effect {:?} for {:?}",
                self.render_effect.as_ref().map(|e| e.id()),
                dirty
            );
        }
        // The renderer consults the mask, so clean strictly after it
        self.params.clean();
        self.lifecycle = LiquidNodeState::PipelineValid;
        cx.invalidate_draw();
    }

    fn record_liquefiables(&self, cx: &mut NodeContext<'_>, layer: LayerId, size: Size) {
        let bounds = self.params.bounds_in_root();
        let overlapping: Vec<Liquefiable> = self
            .params
            .liquefiables()
            .iter()
            .copied()
            .filter(|l| bounds.overlaps(&l.bounds(cx.graph)))
            .collect();

        let origin = self.params.position_on_screen().unwrap_or(Point::ZERO);
        let placement = Affine2D::rotation_degrees(self.params.inverse_rotation_z()).then(
            &Affine2D::scale(self.params.inverse_scale_x(), self.params.inverse_scale_y()),
        );

        let mut recording = RecordingContext::new(size);
        for liquefiable in overlapping {
            let Some(source) = liquefiable.layer(cx.graph) else {
                continue;
            };
            if cx.layers.is_released(source) {
                continue;
            }
            let offset = liquefiable.bounds(cx.graph).top_left() - origin;
            recording.push_transform(placement.then(&Affine2D::translation(offset.x, offset.y)));
            recording.draw_layer(source);
            recording.pop_transform();
        }

        if let Some(target) = cx.layers.get_mut(layer) {
            target.record(size, recording.take_commands());
        }
    }
}

impl ModifierNode for LiquidNode {
    fn on_attach(&mut self, cx: &mut NodeContext<'_>) {
        self.lifecycle = LiquidNodeState::Idle;
        self.invalidate_liquid_block(cx);
    }

    fn on_detach(&mut self, cx: &mut NodeContext<'_>) {
        if let Some(layer) = self.layer.take() {
            cx.layers.release_layer(layer);
        }
        self.render_effect = None;
        // Geometry comes back with the next layout
        self.params.set_size(None);
        self.params.set_position_on_screen(None);
        self.params.clean();
        // A reattached node has no effect, so everything is stale
        self.params.mark_dirty(DirtyMask::INVALIDATE);
        self.lifecycle = LiquidNodeState::Detached;
    }

    fn on_observed_reads_changed(&mut self, cx: &mut NodeContext<'_>) {
        self.invalidate_liquid_block(cx);
    }

    fn on_globally_positioned(&mut self, cx: &mut NodeContext<'_>, coordinates: &LayoutCoordinates) {
        if self.lifecycle == LiquidNodeState::Detached {
            return;
        }
        let transform = coordinates.transform_to_screen;
        let scale_x = transform.scale_x_magnitude();
        let scale_y = transform.scale_y_magnitude();

        self.params
            .set_position_on_screen(Some(coordinates.position_on_screen()));
        self.params.set_size(Some(coordinates.size));
        self.params
            .set_inverse_scale_x(if scale_x > 0.0 { 1.0 / scale_x } else { 0.0 });
        self.params
            .set_inverse_scale_y(if scale_y > 0.0 { 1.0 / scale_y } else { 0.0 });
        self.params
            .set_inverse_rotation_z(-transform.rotation_z_degrees());
        self.params.set_bounds_in_root(coordinates.bounds_in_root());

        self.invalidate_draw_if_needed(cx);
    }

    fn draw(&mut self, cx: &mut NodeContext<'_>, scope: &mut ContentDrawScope<'_>) {
        let size = scope.size;
        if size.min_dimension() < self.min_dimension {
            scope.draw_content(cx);
            return;
        }

        let layer = cx.layers.obtain(self.layer);
        if self.layer != Some(layer) {
            trace!("Liquid node compositing into {:?}", layer);
            self.layer = Some(layer);
        }
        self.record_liquefiables(cx, layer, size);

        if let Some(target) = cx.layers.get_mut(layer) {
            target.render_effect = self.render_effect.clone();
        }
        self.renderer
            .draw_layer(&self.params, cx.layers, layer, &mut *scope.canvas);

        // Own content is not part of the recording
        scope.draw_content(cx);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
