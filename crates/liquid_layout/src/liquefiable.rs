//! Surface node
//!
//! Wraps a subtree whose pixels glass nodes may sample. The node records its
//! content into an offscreen layer once per draw and publishes the layer and
//! its screen bounds through a [`Liquefiable`] registered in a [`LiquidState`].

use std::any::Any;

use liquid_core::{DrawContext, ReactiveGraph, RecordingContext, Rect};
use tracing::trace;

use crate::node::{ContentDrawScope, LayoutCoordinates, ModifierNode, NodeContext};
use crate::state::{Liquefiable, LiquidState};

/// Smallest dimension worth recording
pub const MIN_SURFACE_DIMENSION: f32 = 1.0;

pub struct LiquefiableNode {
    state: LiquidState,
    liquefiable: Liquefiable,
    attached: bool,
}

impl LiquefiableNode {
    pub fn new(graph: &mut ReactiveGraph, state: LiquidState) -> Self {
        Self {
            state,
            liquefiable: Liquefiable::new(graph),
            attached: false,
        }
    }

    pub fn state(&self) -> &LiquidState {
        &self.state
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Point the node at another registry, moving its registration if attached
    pub fn update(&mut self, cx: &mut NodeContext<'_>, state: LiquidState) {
        if self.state.ptr_eq(&state) {
            return;
        }
        if self.attached {
            self.state.unregister(cx.graph, self.liquefiable.id());
            state.register(cx.graph, self.liquefiable);
        }
        self.state = state;
    }

    fn release_layer(&mut self, cx: &mut NodeContext<'_>) {
        if let Some(layer) = self.liquefiable.layer_untracked(cx.graph) {
            cx.layers.release_layer(layer);
        }
        self.liquefiable.set_layer(cx.graph, None);
    }
}

impl ModifierNode for LiquefiableNode {
    fn on_attach(&mut self, cx: &mut NodeContext<'_>) {
        self.attached = true;
        self.state.register(cx.graph, self.liquefiable);
    }

    fn on_detach(&mut self, cx: &mut NodeContext<'_>) {
        self.attached = false;
        self.state.unregister(cx.graph, self.liquefiable.id());
        self.release_layer(cx);
        self.liquefiable.set_bounds(cx.graph, Rect::ZERO);
    }

    fn on_globally_positioned(&mut self, cx: &mut NodeContext<'_>, coordinates: &LayoutCoordinates) {
        let bounds = Rect::from_origin_size(coordinates.position_on_screen(), coordinates.size);
        self.liquefiable.set_bounds(cx.graph, bounds);
    }

    fn draw(&mut self, cx: &mut NodeContext<'_>, scope: &mut ContentDrawScope<'_>) {
        let size = scope.size;
        if size.min_dimension() < MIN_SURFACE_DIMENSION {
            // Nothing to sample; consumers see no layer
            if self.liquefiable.layer_untracked(cx.graph).is_some() {
                self.release_layer(cx);
            }
            scope.draw_content(cx);
            return;
        }

        let current = self.liquefiable.layer_untracked(cx.graph);
        let layer = cx.layers.obtain(current);
        if current != Some(layer) {
            trace!("Surface {:?} recording into {:?}", self.liquefiable.id(), layer);
            self.liquefiable.set_layer(cx.graph, Some(layer));
        }

        let mut recording = RecordingContext::new(size);
        scope.draw_content_into(cx, &mut recording);
        if let Some(target) = cx.layers.get_mut(layer) {
            target.record(size, recording.take_commands());
        }
        scope.canvas.draw_layer(layer);
    }

    fn liquefiable(&self) -> Option<Liquefiable> {
        Some(self.liquefiable)
    }

    fn dispose(&mut self, graph: &mut ReactiveGraph) {
        self.liquefiable.dispose(graph);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
