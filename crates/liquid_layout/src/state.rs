//! Sampling registry
//!
//! A [`LiquidState`] is the shared list of surfaces effect nodes may sample.
//! Surfaces register on attach and unregister on detach. Membership is
//! published through a single revision signal, so only nodes that actually
//! list the registry subscribe to it; each surface's bounds and layer live
//! in signals of their own.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use liquid_core::{LayerId, ReactiveGraph, Rect, Signal};
use tracing::debug;

/// Identity of a sampled surface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LiquefiableId(u64);

impl LiquefiableId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        LiquefiableId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A recordable surface: on-screen bounds plus the layer holding its pixels
///
/// A `None` layer means "nothing recorded", either because the surface has
/// not drawn yet or because it is too small to record.
#[derive(Clone, Copy, Debug)]
pub struct Liquefiable {
    id: LiquefiableId,
    bounds: Signal<Rect>,
    layer: Signal<Option<LayerId>>,
}

impl PartialEq for Liquefiable {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Liquefiable {}

impl Liquefiable {
    pub fn new(graph: &mut ReactiveGraph) -> Self {
        Self {
            id: LiquefiableId::next(),
            bounds: graph.create_signal(Rect::ZERO),
            layer: graph.create_signal(None),
        }
    }

    pub fn id(&self) -> LiquefiableId {
        self.id
    }

    /// Bounds in root coordinates, tracked
    pub fn bounds(&self, graph: &ReactiveGraph) -> Rect {
        graph.get(self.bounds).unwrap_or(Rect::ZERO)
    }

    /// Recorded layer, tracked
    pub fn layer(&self, graph: &ReactiveGraph) -> Option<LayerId> {
        graph.get(self.layer).flatten()
    }

    pub fn layer_untracked(&self, graph: &ReactiveGraph) -> Option<LayerId> {
        graph.get_untracked(self.layer).flatten()
    }

    pub fn set_bounds(&self, graph: &mut ReactiveGraph, bounds: Rect) {
        graph.set(self.bounds, bounds);
    }

    pub fn set_layer(&self, graph: &mut ReactiveGraph, layer: Option<LayerId>) {
        graph.set(self.layer, layer);
    }

    /// Release the backing signals; the handle reads as empty afterwards
    pub fn dispose(&self, graph: &mut ReactiveGraph) {
        graph.dispose_signal(self.bounds);
        graph.dispose_signal(self.layer);
    }
}

struct StateInner {
    entries: RefCell<IndexMap<LiquefiableId, Liquefiable>>,
    revision: Signal<u64>,
}

/// Shared registry of sampled surfaces
///
/// Cloning shares the registry. Iteration follows registration order until
/// an unregister, which may reorder the remaining entries.
#[derive(Clone)]
pub struct LiquidState {
    inner: Rc<StateInner>,
}

impl std::fmt::Debug for LiquidState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiquidState")
            .field("len", &self.len())
            .finish()
    }
}

impl LiquidState {
    pub fn new(graph: &mut ReactiveGraph) -> Self {
        Self {
            inner: Rc::new(StateInner {
                entries: RefCell::new(IndexMap::new()),
                revision: graph.create_signal(0),
            }),
        }
    }

    /// Add a surface; returns false if it was already present
    pub fn register(&self, graph: &mut ReactiveGraph, liquefiable: Liquefiable) -> bool {
        let inserted = self
            .inner
            .entries
            .borrow_mut()
            .insert(liquefiable.id, liquefiable)
            .is_none();
        if inserted {
            debug!("Registered liquefiable {:?} ({} total)", liquefiable.id, self.len());
            self.bump(graph);
        }
        inserted
    }

    /// Remove a surface; returns false if it was not present
    pub fn unregister(&self, graph: &mut ReactiveGraph, id: LiquefiableId) -> bool {
        let removed = self.inner.entries.borrow_mut().swap_remove(&id).is_some();
        if removed {
            debug!("Unregistered liquefiable {:?} ({} left)", id, self.len());
            self.bump(graph);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: LiquefiableId) -> bool {
        self.inner.entries.borrow().contains_key(&id)
    }

    /// All registered surfaces; subscribes the current observer to membership
    pub fn liquefiables(&self, graph: &ReactiveGraph) -> Vec<Liquefiable> {
        let _ = graph.get(self.inner.revision);
        self.inner.entries.borrow().values().copied().collect()
    }

    /// Registered surfaces, optionally limited to those overlapping `area`,
    /// never including `excluding`
    ///
    /// Subscribes to membership, and to bounds when `area` is given.
    pub fn query(
        &self,
        graph: &ReactiveGraph,
        area: Option<Rect>,
        excluding: Option<LiquefiableId>,
    ) -> Vec<Liquefiable> {
        self.liquefiables(graph)
            .into_iter()
            .filter(|l| Some(l.id) != excluding)
            .filter(|l| area.map_or(true, |area| l.bounds(graph).overlaps(&area)))
            .collect()
    }

    /// Whether both handles share one registry
    pub fn ptr_eq(&self, other: &LiquidState) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn bump(&self, graph: &mut ReactiveGraph) {
        graph.update(self.inner.revision, |revision| revision + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_unregister() {
        let mut graph = ReactiveGraph::new();
        let state = LiquidState::new(&mut graph);
        let a = Liquefiable::new(&mut graph);
        let b = Liquefiable::new(&mut graph);

        assert!(state.register(&mut graph, a));
        assert!(!state.register(&mut graph, a));
        assert!(state.register(&mut graph, b));
        assert_eq!(state.liquefiables(&graph), vec![a, b]);

        assert!(state.unregister(&mut graph, a.id()));
        assert!(!state.unregister(&mut graph, a.id()));
        assert!(!state.contains(a.id()));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_query_filters() {
        let mut graph = ReactiveGraph::new();
        let state = LiquidState::new(&mut graph);
        let near = Liquefiable::new(&mut graph);
        let far = Liquefiable::new(&mut graph);
        near.set_bounds(&mut graph, Rect::new(0.0, 0.0, 50.0, 50.0));
        far.set_bounds(&mut graph, Rect::new(500.0, 500.0, 50.0, 50.0));
        state.register(&mut graph, near);
        state.register(&mut graph, far);

        let area = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(state.query(&graph, Some(area), None), vec![near]);
        assert_eq!(state.query(&graph, None, Some(near.id())), vec![far]);
        assert!(state.query(&graph, Some(area), Some(near.id())).is_empty());
    }

    #[test]
    fn test_membership_invalidates_readers() {
        let mut graph = ReactiveGraph::new();
        let state = LiquidState::new(&mut graph);
        let reader = graph.create_observer();
        let surface = Liquefiable::new(&mut graph);

        graph.observe(reader, |g| state.liquefiables(g));
        state.register(&mut graph, surface);
        assert_eq!(graph.take_invalidated(), vec![reader]);

        // Bounds are not read by an unfiltered listing
        graph.observe(reader, |g| state.liquefiables(g));
        surface.set_bounds(&mut graph, Rect::new(1.0, 1.0, 2.0, 2.0));
        assert!(graph.take_invalidated().is_empty());
    }

    #[test]
    fn test_shared_handles() {
        let mut graph = ReactiveGraph::new();
        let state = LiquidState::new(&mut graph);
        let other = LiquidState::new(&mut graph);
        let surface = Liquefiable::new(&mut graph);

        let shared = state.clone();
        shared.register(&mut graph, surface);
        assert!(state.contains(surface.id()));
        assert!(state.ptr_eq(&shared));
        assert!(!state.ptr_eq(&other));
    }

    #[test]
    fn test_disposed_surface_reads_empty() {
        let mut graph = ReactiveGraph::new();
        let surface = Liquefiable::new(&mut graph);
        surface.set_bounds(&mut graph, Rect::new(0.0, 0.0, 5.0, 5.0));
        surface.dispose(&mut graph);
        assert_eq!(surface.bounds(&graph), Rect::ZERO);
        assert_eq!(surface.layer(&graph), None);
    }
}
