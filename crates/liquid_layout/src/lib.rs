//! Liquid Layout
//!
//! Glass effect nodes for a retained UI tree.
//!
//! # Features
//!
//! - **Surfaces**: `LiquefiableNode` records its subtree into a layer and
//!   publishes it through a shared `LiquidState` registry
//! - **Glass**: `LiquidNode` composites the overlapping surfaces into its own
//!   layer and draws it through a render effect built from `LiquidParams`
//! - **Dirty tracking**: every parameter maps to a `Field` bit, and effects are
//!   rebuilt only when the tier's mask intersects what changed
//! - **Tiers**: runtime shader, blur only, or a static approximation
//! - **Headless host**: `HeadlessHost` drives the nodes without a window
//!
//! # Example
//!
//! ```rust
//! use liquid_core::Size;
//! use liquid_gpu::{BackendConfig, CapabilityTier};
//! use liquid_layout::prelude::*;
//!
//! let mut host = HeadlessHost::new(Size::new(400.0, 400.0));
//! let state = host.create_state();
//!
//! let backdrop = host.add_node(None, NodeFrame::new(0.0, 0.0, 400.0, 400.0)).unwrap();
//! host.insert_liquefiable(backdrop, state.clone()).unwrap();
//!
//! let glass = host.add_node(None, NodeFrame::new(50.0, 50.0, 100.0, 100.0)).unwrap();
//! host.insert_liquid(
//!     glass,
//!     state,
//!     |_, scope| {
//!         scope.set_frost(Dp(8.0));
//!         scope.set_refraction(0.4);
//!     },
//!     create_renderer(CapabilityTier::Full, &BackendConfig::default()),
//! )
//! .unwrap();
//!
//! host.frame();
//! ```

pub mod error;
pub mod fields;
pub mod headless;
pub mod liquefiable;
pub mod liquid;
pub mod node;
pub mod renderer;
pub mod scope;
pub mod shape;
pub mod state;
pub mod units;

pub use error::{LiquidError, Result};
pub use fields::{DirtyMask, Field};
pub use headless::{HeadlessHost, NodeFrame};
pub use liquefiable::{LiquefiableNode, MIN_SURFACE_DIMENSION};
pub use liquid::{LiquidBlock, LiquidNode, LiquidNodeState, MIN_EFFECT_DIMENSION};
pub use node::{
    ContentDrawScope, DrawContent, EmptyTree, LayoutCoordinates, ModifierNode, NodeContext,
    NodeId, NodeTree,
};
pub use renderer::{create_renderer, load_renderer, FallbackRenderer, LiquidRenderer, ShaderRenderer};
pub use scope::{LiquidParams, LiquidScope};
pub use shape::{CornerSize, Outline, Shape};
pub use state::{Liquefiable, LiquefiableId, LiquidState};
pub use units::{Density, Dp};

/// Prelude for building glass trees
pub mod prelude {
    pub use crate::headless::{HeadlessHost, NodeFrame};
    pub use crate::liquid::{LiquidNode, LiquidNodeState};
    pub use crate::liquefiable::LiquefiableNode;
    pub use crate::renderer::{create_renderer, LiquidRenderer};
    pub use crate::scope::{LiquidParams, LiquidScope};
    pub use crate::shape::{CornerSize, Shape};
    pub use crate::state::{Liquefiable, LiquidState};
    pub use crate::units::{Density, Dp};
}
