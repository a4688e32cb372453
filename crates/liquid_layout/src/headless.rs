//! Headless host
//!
//! A minimal UI tree that drives [`ModifierNode`]s through the same
//! callbacks a real host would: attach and detach, observed-read
//! notifications, global positioning and a recording draw pass. Frames are
//! produced on demand with [`HeadlessHost::frame`] and can be inspected
//! as a list of [`DrawCommand`]s.

use std::cell::{Cell, Ref, RefCell};

use liquid_core::{
    Affine2D, Brush, Color, CornerRadius, DrawCommand, DrawContext, ObserverId, Point,
    ReactiveGraph, RecordingContext, Size,
};
use liquid_gpu::LayerPool;
use rustc_hash::FxHashMap;
use slotmap::{Key, SlotMap};
use tracing::{debug, trace, warn};

use crate::error::{LiquidError, Result};
use crate::liquefiable::LiquefiableNode;
use crate::liquid::LiquidNode;
use crate::node::{
    ContentDrawScope, DrawContent, LayoutCoordinates, ModifierNode, NodeContext, NodeId, NodeTree,
};
use crate::renderer::LiquidRenderer;
use crate::scope::LiquidScope;
use crate::state::{Liquefiable, LiquidState};
use crate::units::Density;

/// Observer notifications handled per frame before giving up
const MAX_FLUSH_ROUNDS: usize = 16;

/// Placement of a node relative to its parent
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeFrame {
    pub offset: Point,
    pub size: Size,
    /// Degrees, clockwise
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl NodeFrame {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            offset: Point::new(x, y),
            size: Size::new(width, height),
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_scale(mut self, scale_x: f32, scale_y: f32) -> Self {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self
    }

    /// Parent to local transform
    pub fn local_transform(&self) -> Affine2D {
        Affine2D::translation(self.offset.x, self.offset.y)
            .then(&Affine2D::rotation_degrees(self.rotation))
            .then(&Affine2D::scale(self.scale_x, self.scale_y))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ObserverRole {
    /// Reads made through `NodeContext::observe_reads`
    Block,
    /// Reads made while drawing
    Draw,
}

struct ModifierSlot {
    modifier: RefCell<Box<dyn ModifierNode>>,
    liquefiable: Option<Liquefiable>,
    block_observer: ObserverId,
    draw_observer: ObserverId,
}

struct HostNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    frame: NodeFrame,
    background: Option<Color>,
    chain: Vec<ModifierSlot>,
    draw_requests: Cell<u64>,
}

/// Ancestor lookups over the host's nodes
struct TreeView<'n> {
    nodes: &'n SlotMap<NodeId, HostNode>,
}

impl NodeTree for TreeView<'_> {
    fn nearest_ancestor_liquefiable(&self, node: NodeId, index: usize) -> Option<Liquefiable> {
        let mut current = self.nodes.get(node)?;
        let mut end = index.min(current.chain.len());
        loop {
            let found = current.chain[..end]
                .iter()
                .rev()
                .find_map(|slot| slot.liquefiable);
            if found.is_some() {
                return found;
            }
            current = self.nodes.get(current.parent?)?;
            end = current.chain.len();
        }
    }
}

/// Draws the chain of one node from `index` on, then its content
struct ChainContent<'n> {
    nodes: &'n SlotMap<NodeId, HostNode>,
    node: NodeId,
    index: usize,
}

impl DrawContent for ChainContent<'_> {
    fn draw_content(&mut self, cx: &mut NodeContext<'_>, canvas: &mut dyn DrawContext) {
        let Some(host) = self.nodes.get(self.node) else {
            return;
        };

        let Some(slot) = host.chain.get(self.index) else {
            if let Some(color) = host.background {
                canvas.fill_rect(host.frame.size.to_rect(), CornerRadius::ZERO, Brush::Solid(color));
            }
            for &child in &host.children {
                draw_node(self.nodes, child, cx, canvas);
            }
            return;
        };

        let mut next = ChainContent {
            nodes: self.nodes,
            node: self.node,
            index: self.index + 1,
        };
        let mut modifier_cx = cx.for_modifier(self.node, self.index, Some(slot.block_observer));
        let previous = modifier_cx.graph.start_tracking();
        {
            let mut modifier = slot.modifier.borrow_mut();
            let mut scope = ContentDrawScope::new(host.frame.size, &mut *canvas, &mut next);
            modifier.draw(&mut modifier_cx, &mut scope);
        }
        modifier_cx.graph.finish_tracking(slot.draw_observer, previous);
        if modifier_cx.draw_invalidated() {
            host.draw_requests.set(host.draw_requests.get() + 1);
        }
    }
}

fn draw_node(
    nodes: &SlotMap<NodeId, HostNode>,
    id: NodeId,
    cx: &mut NodeContext<'_>,
    canvas: &mut dyn DrawContext,
) {
    let Some(node) = nodes.get(id) else {
        return;
    };
    canvas.push_transform(node.frame.local_transform());
    ChainContent {
        nodes,
        node: id,
        index: 0,
    }
    .draw_content(cx, canvas);
    canvas.pop_transform();
}

/// In-memory host tree for driving glass nodes without a window
pub struct HeadlessHost {
    graph: ReactiveGraph,
    layers: LayerPool,
    density: Density,
    density_changed: bool,
    viewport: Size,
    nodes: SlotMap<NodeId, HostNode>,
    roots: Vec<NodeId>,
    observers: FxHashMap<ObserverId, (NodeId, usize, ObserverRole)>,
    needs_draw: bool,
    last_frame: Vec<DrawCommand>,
    frames_drawn: u64,
}

impl HeadlessHost {
    pub fn new(viewport: Size) -> Self {
        Self {
            graph: ReactiveGraph::new(),
            layers: LayerPool::new(),
            density: Density::default(),
            density_changed: false,
            viewport,
            nodes: SlotMap::with_key(),
            roots: Vec::new(),
            observers: FxHashMap::default(),
            needs_draw: true,
            last_frame: Vec::new(),
            frames_drawn: 0,
        }
    }

    pub fn graph(&self) -> &ReactiveGraph {
        &self.graph
    }

    /// The graph, for creating and writing signals read by blocks
    pub fn graph_mut(&mut self) -> &mut ReactiveGraph {
        &mut self.graph
    }

    pub fn layers(&self) -> &LayerPool {
        &self.layers
    }

    pub fn density(&self) -> Density {
        self.density
    }

    /// Change the density; every modifier re-evaluates on the next frame
    pub fn set_density(&mut self, density: Density) {
        if self.density != density {
            self.density = density;
            self.density_changed = true;
        }
    }

    /// Create a registry bound to this host's graph
    pub fn create_state(&mut self) -> LiquidState {
        LiquidState::new(&mut self.graph)
    }

    // =========================================================================
    // Tree
    // =========================================================================

    pub fn add_node(&mut self, parent: Option<NodeId>, frame: NodeFrame) -> Result<NodeId> {
        if let Some(parent) = parent {
            if !self.nodes.contains_key(parent) {
                return Err(LiquidError::UnknownNode(parent));
            }
        }
        let id = self.nodes.insert(HostNode {
            parent,
            children: Vec::new(),
            frame,
            background: None,
            chain: Vec::new(),
            draw_requests: Cell::new(0),
        });
        match parent.and_then(|p| self.nodes.get_mut(p)) {
            Some(parent) => parent.children.push(id),
            None => self.roots.push(id),
        }
        self.needs_draw = true;
        debug!("Added node {:?} under {:?}", id, parent);
        Ok(id)
    }

    pub fn set_frame(&mut self, id: NodeId, frame: NodeFrame) -> Result<()> {
        let node = self.nodes.get_mut(id).ok_or(LiquidError::UnknownNode(id))?;
        if node.frame != frame {
            node.frame = frame;
            self.needs_draw = true;
        }
        Ok(())
    }

    pub fn set_background(&mut self, id: NodeId, color: Color) -> Result<()> {
        let node = self.nodes.get_mut(id).ok_or(LiquidError::UnknownNode(id))?;
        node.background = Some(color);
        self.needs_draw = true;
        Ok(())
    }

    /// Append a modifier to a node's chain and attach it
    pub fn add_modifier(&mut self, id: NodeId, modifier: Box<dyn ModifierNode>) -> Result<usize> {
        if !self.nodes.contains_key(id) {
            return Err(LiquidError::UnknownNode(id));
        }
        let block_observer = self.graph.create_observer();
        let draw_observer = self.graph.create_observer();
        let node = self.nodes.get_mut(id).ok_or(LiquidError::UnknownNode(id))?;
        let index = node.chain.len();
        node.chain.push(ModifierSlot {
            liquefiable: modifier.liquefiable(),
            modifier: RefCell::new(modifier),
            block_observer,
            draw_observer,
        });
        self.observers
            .insert(block_observer, (id, index, ObserverRole::Block));
        self.observers
            .insert(draw_observer, (id, index, ObserverRole::Draw));

        self.with_cx(id, index, |modifier, cx| modifier.on_attach(cx))?;
        self.needs_draw = true;
        Ok(index)
    }

    /// Add a surface modifier publishing into `state`
    pub fn insert_liquefiable(&mut self, id: NodeId, state: LiquidState) -> Result<usize> {
        let node = LiquefiableNode::new(&mut self.graph, state);
        self.add_modifier(id, Box::new(node))
    }

    /// Add a glass modifier sampling from `state`
    pub fn insert_liquid(
        &mut self,
        id: NodeId,
        state: LiquidState,
        block: impl FnMut(&ReactiveGraph, &mut dyn LiquidScope) + 'static,
        renderer: Box<dyn LiquidRenderer>,
    ) -> Result<usize> {
        self.add_modifier(id, Box::new(LiquidNode::new(state, block, renderer)))
    }

    /// Detach and drop a node and its subtree
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        let parent = self
            .nodes
            .get(id)
            .ok_or(LiquidError::UnknownNode(id))?
            .parent;

        let mut subtree = vec![id];
        let mut cursor = 0;
        while cursor < subtree.len() {
            if let Some(node) = self.nodes.get(subtree[cursor]) {
                subtree.extend(node.children.iter().copied());
            }
            cursor += 1;
        }

        for &node in &subtree {
            let len = self.nodes.get(node).map_or(0, |n| n.chain.len());
            for index in 0..len {
                self.with_cx(node, index, |modifier, cx| modifier.on_detach(cx))?;
            }
        }

        for &node in &subtree {
            let Some(removed) = self.nodes.remove(node) else {
                continue;
            };
            for slot in removed.chain {
                slot.modifier.into_inner().dispose(&mut self.graph);
                for observer in [slot.block_observer, slot.draw_observer] {
                    self.graph.dispose_observer(observer);
                    self.observers.remove(&observer);
                }
            }
        }

        match parent.and_then(|p| self.nodes.get_mut(p)) {
            Some(parent) => parent.children.retain(|child| *child != id),
            None => self.roots.retain(|root| *root != id),
        }
        self.needs_draw = true;
        debug!("Removed node {:?} ({} nodes in subtree)", id, subtree.len());
        Ok(())
    }

    // =========================================================================
    // Modifier access
    // =========================================================================

    /// Borrow a modifier as its concrete type
    pub fn modifier<T: ModifierNode>(&self, id: NodeId, index: usize) -> Result<Ref<'_, T>> {
        let slot = self.slot(id, index)?;
        Ref::filter_map(slot.modifier.borrow(), |m| m.as_any().downcast_ref::<T>()).map_err(|_| {
            LiquidError::ModifierType {
                node: id,
                index,
                expected: std::any::type_name::<T>(),
            }
        })
    }

    /// Run `f` on a modifier with a live context, as the host would
    pub fn with_modifier<T: ModifierNode, R>(
        &mut self,
        id: NodeId,
        index: usize,
        f: impl FnOnce(&mut T, &mut NodeContext<'_>) -> R,
    ) -> Result<R> {
        self.with_cx(id, index, |modifier, cx| {
            modifier.as_any_mut().downcast_mut::<T>().map(|m| f(m, cx))
        })?
        .ok_or(LiquidError::ModifierType {
            node: id,
            index,
            expected: std::any::type_name::<T>(),
        })
    }

    /// Redraws requested by a node's modifiers so far
    pub fn draw_requests(&self, id: NodeId) -> Result<u64> {
        self.nodes
            .get(id)
            .map(|n| n.draw_requests.get())
            .ok_or(LiquidError::UnknownNode(id))
    }

    // =========================================================================
    // Frames
    // =========================================================================

    /// Run one frame: observers, layout, observers again, then draw if needed
    pub fn frame(&mut self) {
        self.flush_observers();
        self.layout();
        self.flush_observers();
        if self.needs_draw {
            self.draw();
        }
    }

    pub fn last_frame(&self) -> &[DrawCommand] {
        &self.last_frame
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Whether the next frame will draw
    pub fn needs_draw(&self) -> bool {
        self.needs_draw || self.graph.stats().pending_observers > 0
    }

    fn flush_observers(&mut self) {
        if std::mem::take(&mut self.density_changed) {
            let all: Vec<(NodeId, usize)> = self
                .nodes
                .iter()
                .flat_map(|(id, node)| (0..node.chain.len()).map(move |index| (id, index)))
                .collect();
            for (id, index) in all {
                self.dispatch(id, index, |modifier, cx| modifier.on_observed_reads_changed(cx));
            }
        }

        for _ in 0..MAX_FLUSH_ROUNDS {
            let invalidated = self.graph.take_invalidated();
            if invalidated.is_empty() {
                return;
            }
            for observer in invalidated {
                let Some(&(id, index, role)) = self.observers.get(&observer) else {
                    continue;
                };
                match role {
                    ObserverRole::Block => {
                        self.dispatch(id, index, |modifier, cx| {
                            modifier.on_observed_reads_changed(cx)
                        });
                    }
                    ObserverRole::Draw => self.needs_draw = true,
                }
            }
        }
        warn!(
            "Observers still invalidated after {} rounds; deferring to next frame",
            MAX_FLUSH_ROUNDS
        );
    }

    fn layout(&mut self) {
        let mut placed = Vec::new();
        let mut stack: Vec<(NodeId, Affine2D)> = self
            .roots
            .iter()
            .rev()
            .map(|&root| (root, Affine2D::IDENTITY))
            .collect();
        while let Some((id, parent_transform)) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            let transform = parent_transform.then(&node.frame.local_transform());
            placed.push((id, LayoutCoordinates::new(node.frame.size, transform)));
            stack.extend(node.children.iter().rev().map(|&child| (child, transform)));
        }

        for (id, coordinates) in placed {
            let len = self.nodes.get(id).map_or(0, |n| n.chain.len());
            for index in 0..len {
                self.dispatch(id, index, |modifier, cx| {
                    modifier.on_globally_positioned(cx, &coordinates)
                });
            }
        }
    }

    fn draw(&mut self) {
        let Self {
            graph,
            layers,
            nodes,
            roots,
            density,
            viewport,
            ..
        } = self;
        let tree = TreeView { nodes };
        let mut canvas = RecordingContext::new(*viewport);
        let mut cx = NodeContext::new(graph, layers, &tree, *density, NodeId::null(), 0, None);
        for &root in roots.iter() {
            draw_node(nodes, root, &mut cx, &mut canvas);
        }

        self.last_frame = canvas.take_commands();
        self.frames_drawn += 1;
        self.needs_draw = false;
        trace!(
            "Drew frame {} ({} commands)",
            self.frames_drawn,
            self.last_frame.len()
        );
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn slot(&self, id: NodeId, index: usize) -> Result<&ModifierSlot> {
        self.nodes
            .get(id)
            .ok_or(LiquidError::UnknownNode(id))?
            .chain
            .get(index)
            .ok_or(LiquidError::ModifierIndex { node: id, index })
    }

    /// Run a host callback, logging a slot that went away in the meantime
    fn dispatch(
        &mut self,
        id: NodeId,
        index: usize,
        f: impl FnOnce(&mut dyn ModifierNode, &mut NodeContext<'_>),
    ) {
        if let Err(err) = self.with_cx(id, index, f) {
            warn!("Skipping callback for modifier {} of {:?}: {}", index, id, err);
        }
    }

    fn with_cx<R>(
        &mut self,
        id: NodeId,
        index: usize,
        f: impl FnOnce(&mut dyn ModifierNode, &mut NodeContext<'_>) -> R,
    ) -> Result<R> {
        let Self {
            graph,
            layers,
            nodes,
            density,
            needs_draw,
            ..
        } = self;
        let node = nodes.get(id).ok_or(LiquidError::UnknownNode(id))?;
        let slot = node
            .chain
            .get(index)
            .ok_or(LiquidError::ModifierIndex { node: id, index })?;

        let tree = TreeView { nodes };
        let mut cx = NodeContext::new(
            graph,
            layers,
            &tree,
            *density,
            id,
            index,
            Some(slot.block_observer),
        );
        let result = {
            let mut modifier = slot.modifier.borrow_mut();
            f(&mut **modifier, &mut cx)
        };
        if cx.draw_invalidated() {
            node.draw_requests.set(node.draw_requests.get() + 1);
            *needs_draw = true;
        }
        Ok(result)
    }
}
