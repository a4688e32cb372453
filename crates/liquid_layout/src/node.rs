//! Host node contract
//!
//! The glass nodes are modifier nodes: a host UI tree owns them, calls the
//! lifecycle callbacks below, and hands them a [`NodeContext`] carrying the
//! reactive graph, the layer pool and the node's place in the tree.
//!
//! Callback order within a frame:
//! 1. `on_observed_reads_changed` for every modifier whose observed reads changed
//! 2. `on_globally_positioned` for every placed node
//! 3. `draw`, wrapping the rest of the chain and the node content

use std::any::Any;

use liquid_core::{
    Affine2D, DrawContext, ObserverId, Point, ReactiveGraph, Rect, Size,
};
use liquid_gpu::LayerPool;
use slotmap::{new_key_type, Key};

use crate::state::Liquefiable;
use crate::units::Density;

new_key_type! {
    /// Identifier of a node in the host tree
    pub struct NodeId;
}

/// Tree queries a node may make about its surroundings
pub trait NodeTree {
    /// Closest surface above modifier `index` of `node`: earlier modifiers of
    /// the same node first, then the modifiers of each parent in turn
    fn nearest_ancestor_liquefiable(&self, node: NodeId, index: usize) -> Option<Liquefiable>;
}

/// Where a node ended up after layout
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutCoordinates {
    pub size: Size,
    /// Local to screen transform
    pub transform_to_screen: Affine2D,
}

impl LayoutCoordinates {
    pub fn new(size: Size, transform_to_screen: Affine2D) -> Self {
        Self {
            size,
            transform_to_screen,
        }
    }

    /// Screen position of the local origin
    pub fn position_on_screen(&self) -> Point {
        self.transform_to_screen.transform_point(Point::ZERO)
    }

    /// Axis-aligned screen bounds of the node
    pub fn bounds_in_root(&self) -> Rect {
        self.transform_to_screen.map_rect(self.size.to_rect())
    }
}

/// Everything a modifier callback may touch
pub struct NodeContext<'a> {
    pub graph: &'a mut ReactiveGraph,
    pub layers: &'a mut LayerPool,
    pub density: Density,
    tree: &'a dyn NodeTree,
    node: NodeId,
    index: usize,
    observer: Option<ObserverId>,
    draw_invalidated: bool,
}

impl<'a> NodeContext<'a> {
    /// Context for the modifier at `index` of `node`
    ///
    /// Reads made through [`NodeContext::observe_reads`] are recorded on
    /// `observer`; without one they are not tracked.
    pub fn new(
        graph: &'a mut ReactiveGraph,
        layers: &'a mut LayerPool,
        tree: &'a dyn NodeTree,
        density: Density,
        node: NodeId,
        index: usize,
        observer: Option<ObserverId>,
    ) -> Self {
        Self {
            graph,
            layers,
            density,
            tree,
            node,
            index,
            observer,
            draw_invalidated: false,
        }
    }

    /// Context outside any tree, for driving a node directly
    pub fn detached(
        graph: &'a mut ReactiveGraph,
        layers: &'a mut LayerPool,
        tree: &'a dyn NodeTree,
    ) -> Self {
        Self::new(graph, layers, tree, Density::default(), NodeId::null(), 0, None)
    }

    /// Reborrow for another modifier of the same tree
    pub fn for_modifier(
        &mut self,
        node: NodeId,
        index: usize,
        observer: Option<ObserverId>,
    ) -> NodeContext<'_> {
        NodeContext {
            graph: &mut *self.graph,
            layers: &mut *self.layers,
            density: self.density,
            tree: self.tree,
            node,
            index,
            observer,
            draw_invalidated: false,
        }
    }

    /// Run `f`, re-arming `on_observed_reads_changed` on what it reads
    pub fn observe_reads<R>(&mut self, f: impl FnOnce(&mut ReactiveGraph) -> R) -> R {
        match self.observer {
            Some(observer) => self.graph.observe(observer, f),
            None => f(&mut *self.graph),
        }
    }

    /// Nearest surface above this modifier, looked up without tracking
    pub fn nearest_ancestor_liquefiable(&mut self) -> Option<Liquefiable> {
        let (tree, node, index) = (self.tree, self.node, self.index);
        self.graph
            .untracked(|_| tree.nearest_ancestor_liquefiable(node, index))
    }

    /// Ask the host to redraw this node
    pub fn invalidate_draw(&mut self) {
        self.draw_invalidated = true;
    }

    pub fn draw_invalidated(&self) -> bool {
        self.draw_invalidated
    }
}

/// The part of a node drawn after a modifier: later modifiers, then content
pub trait DrawContent {
    fn draw_content(&mut self, cx: &mut NodeContext<'_>, canvas: &mut dyn DrawContext);
}

/// What a modifier draws into
pub struct ContentDrawScope<'s> {
    pub size: Size,
    pub canvas: &'s mut dyn DrawContext,
    content: &'s mut dyn DrawContent,
}

impl<'s> ContentDrawScope<'s> {
    pub fn new(
        size: Size,
        canvas: &'s mut dyn DrawContext,
        content: &'s mut dyn DrawContent,
    ) -> Self {
        Self {
            size,
            canvas,
            content,
        }
    }

    /// Draw the wrapped content onto this scope's canvas
    pub fn draw_content(&mut self, cx: &mut NodeContext<'_>) {
        self.content.draw_content(cx, &mut *self.canvas);
    }

    /// Draw the wrapped content onto another canvas, e.g. a layer recording
    pub fn draw_content_into(&mut self, cx: &mut NodeContext<'_>, canvas: &mut dyn DrawContext) {
        self.content.draw_content(cx, canvas);
    }
}

/// A node attached to a host tree
pub trait ModifierNode: Any {
    fn on_attach(&mut self, _cx: &mut NodeContext<'_>) {}

    fn on_detach(&mut self, _cx: &mut NodeContext<'_>) {}

    /// Called after layout whenever the node is placed
    fn on_globally_positioned(
        &mut self,
        _cx: &mut NodeContext<'_>,
        _coordinates: &LayoutCoordinates,
    ) {
    }

    fn draw(&mut self, cx: &mut NodeContext<'_>, scope: &mut ContentDrawScope<'_>) {
        scope.draw_content(cx);
    }

    /// A value read through [`NodeContext::observe_reads`] changed
    fn on_observed_reads_changed(&mut self, _cx: &mut NodeContext<'_>) {}

    /// The surface this node publishes, if it is one
    fn liquefiable(&self) -> Option<Liquefiable> {
        None
    }

    /// Free reactive state; called once after the final detach
    fn dispose(&mut self, _graph: &mut ReactiveGraph) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Tree with no surfaces anywhere
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyTree;

impl NodeTree for EmptyTree {
    fn nearest_ancestor_liquefiable(&self, _node: NodeId, _index: usize) -> Option<Liquefiable> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liquid_core::{DrawCommand, LayerId, RecordingContext};

    struct Content;

    impl DrawContent for Content {
        fn draw_content(&mut self, _cx: &mut NodeContext<'_>, canvas: &mut dyn DrawContext) {
            canvas.pop_clip();
        }
    }

    struct FixedTree(Option<Liquefiable>);

    impl NodeTree for FixedTree {
        fn nearest_ancestor_liquefiable(&self, _node: NodeId, _index: usize) -> Option<Liquefiable> {
            self.0
        }
    }

    #[test]
    fn test_layout_coordinates() {
        let transform = Affine2D::translation(10.0, 20.0).then(&Affine2D::scale(2.0, 2.0));
        let coords = LayoutCoordinates::new(Size::new(5.0, 5.0), transform);
        assert_eq!(coords.position_on_screen(), Point::new(10.0, 20.0));
        assert_eq!(coords.bounds_in_root(), Rect::new(10.0, 20.0, 10.0, 10.0));
    }

    #[test]
    fn test_observe_reads_uses_observer() {
        let mut graph = ReactiveGraph::new();
        let mut layers = LayerPool::new();
        let signal = graph.create_signal(1);
        let observer = graph.create_observer();

        let mut cx = NodeContext::detached(&mut graph, &mut layers, &EmptyTree);
        cx.observe_reads(|g| g.get(signal));
        let mut cx = cx.for_modifier(NodeId::null(), 0, Some(observer));
        cx.observe_reads(|g| g.get(signal));
        assert_eq!(cx.graph.dependencies(observer), &[signal.id()]);
    }

    #[test]
    fn test_ancestor_lookup_is_untracked() {
        let mut graph = ReactiveGraph::new();
        let mut layers = LayerPool::new();
        let surface = Liquefiable::new(&mut graph);
        let tree = FixedTree(Some(surface));
        let observer = graph.create_observer();

        let mut cx = NodeContext::new(
            &mut graph,
            &mut layers,
            &tree,
            Density::default(),
            NodeId::null(),
            1,
            Some(observer),
        );
        let previous = cx.graph.start_tracking();
        assert_eq!(cx.nearest_ancestor_liquefiable(), Some(surface));
        assert!(cx.graph.is_tracking());
        cx.graph.finish_tracking(observer, previous);
        assert!(cx.graph.dependencies(observer).is_empty());
    }

    #[test]
    fn test_content_draw_scope() {
        let mut graph = ReactiveGraph::new();
        let mut layers = LayerPool::new();
        let mut cx = NodeContext::detached(&mut graph, &mut layers, &EmptyTree);
        let mut canvas = RecordingContext::new(Size::new(10.0, 10.0));
        let mut recording = RecordingContext::new(Size::new(10.0, 10.0));
        let mut content = Content;

        let mut scope = ContentDrawScope::new(Size::new(10.0, 10.0), &mut canvas, &mut content);
        scope.draw_content(&mut cx);
        scope.canvas.draw_layer(LayerId::default());
        scope.draw_content_into(&mut cx, &mut recording);

        assert_eq!(
            canvas.commands(),
            &[DrawCommand::PopClip, DrawCommand::DrawLayer(LayerId::default())]
        );
        assert_eq!(recording.commands(), &[DrawCommand::PopClip]);
        assert!(!cx.draw_invalidated());
        cx.invalidate_draw();
        assert!(cx.draw_invalidated());
    }
}
