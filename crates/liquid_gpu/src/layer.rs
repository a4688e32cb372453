//! Offscreen graphics layers
//!
//! A layer is a recorded display list plus the post-process state applied
//! when it is composited: a render effect and a color filter. Layers live in
//! a [`LayerPool`]; nodes hold only [`LayerId`] handles and release them on
//! detach. A released id is never reissued.

use liquid_core::{ColorFilter, DrawCommand, LayerId, Size};
use slotmap::SlotMap;
use tracing::trace;

use crate::effect::RenderEffect;

/// A recorded offscreen layer
#[derive(Debug, Default)]
pub struct GraphicsLayer {
    size: Size,
    commands: Vec<DrawCommand>,
    /// Post-process filter applied when the layer is drawn
    pub render_effect: Option<RenderEffect>,
    /// Color filter applied when the layer is drawn
    pub color_filter: Option<ColorFilter>,
    record_count: u64,
}

impl GraphicsLayer {
    pub fn size(&self) -> Size {
        self.size
    }

    /// Commands captured by the last recording
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// How many times the layer has been recorded
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    /// Replace the layer content
    pub fn record(&mut self, size: Size, commands: Vec<DrawCommand>) {
        self.size = size;
        self.commands = commands;
        self.record_count += 1;
    }
}

/// Owner of every live offscreen layer
#[derive(Debug, Default)]
pub struct LayerPool {
    layers: SlotMap<LayerId, GraphicsLayer>,
    created: u64,
}

impl LayerPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_layer(&mut self) -> LayerId {
        self.created += 1;
        let id = self.layers.insert(GraphicsLayer::default());
        trace!("Created graphics layer {:?}", id);
        id
    }

    /// Free a layer; later lookups of `id` return `None`
    pub fn release_layer(&mut self, id: LayerId) {
        if self.layers.remove(id).is_some() {
            trace!("Released graphics layer {:?}", id);
        }
    }

    pub fn is_released(&self, id: LayerId) -> bool {
        !self.layers.contains_key(id)
    }

    /// Return `current` if it is still live, else a newly created layer
    pub fn obtain(&mut self, current: Option<LayerId>) -> LayerId {
        match current {
            Some(id) if !self.is_released(id) => id,
            _ => self.create_layer(),
        }
    }

    pub fn get(&self, id: LayerId) -> Option<&GraphicsLayer> {
        self.layers.get(id)
    }

    pub fn get_mut(&mut self, id: LayerId) -> Option<&mut GraphicsLayer> {
        self.layers.get_mut(id)
    }

    pub fn live_layers(&self) -> usize {
        self.layers.len()
    }

    /// Total layers ever created
    pub fn created_layers(&self) -> u64 {
        self.created
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obtain_reuses_live_layer() {
        let mut pool = LayerPool::new();
        let first = pool.obtain(None);
        assert_eq!(pool.obtain(Some(first)), first);
        assert_eq!(pool.created_layers(), 1);
    }

    #[test]
    fn test_obtain_replaces_released_layer() {
        let mut pool = LayerPool::new();
        let first = pool.create_layer();
        pool.release_layer(first);
        assert!(pool.is_released(first));

        let second = pool.obtain(Some(first));
        assert_ne!(first, second);
        assert_eq!(pool.live_layers(), 1);
    }

    #[test]
    fn test_record() {
        let mut pool = LayerPool::new();
        let id = pool.create_layer();
        let layer = pool.get_mut(id).unwrap();
        layer.record(Size::new(10.0, 10.0), vec![DrawCommand::PopClip]);

        let layer = pool.get(id).unwrap();
        assert_eq!(layer.record_count(), 1);
        assert_eq!(layer.commands().len(), 1);
        assert_eq!(layer.size(), Size::new(10.0, 10.0));
    }
}
