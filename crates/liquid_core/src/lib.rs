//! Liquid Core
//!
//! Foundational primitives for the liquid glass effect:
//!
//! - **Reactive Signals**: fine-grained signals with read observers and an
//!   explicit untracked scope
//! - **Layer Model**: geometry, transforms, colours and offscreen layer handles
//! - **Draw Context**: a recording draw API shared by nodes and layers
//!
//! # Example
//!
//! ```rust
//! use liquid_core::reactive::ReactiveGraph;
//!
//! let mut graph = ReactiveGraph::new();
//! let count = graph.create_signal(0i32);
//! let observer = graph.create_observer();
//!
//! // Record the read
//! let seen = graph.observe(observer, |g| g.get(count));
//! assert_eq!(seen, Some(0));
//!
//! // Writing the signal queues the observer for the host
//! graph.set(count, 5);
//! assert_eq!(graph.take_invalidated(), vec![observer]);
//! ```

pub mod draw;
pub mod layer;
pub mod reactive;

pub use draw::{
    ColorFilter, DrawCommand, DrawContext, Path, PathCommand, RecordingContext, Stroke,
};
pub use layer::{
    Affine2D, Brush, ClipShape, Color, CornerRadius, Gradient, GradientStop, LayerId, Point, Rect,
    Size,
};
pub use reactive::{
    ObserverId, ReactiveGraph, ReactiveStats, Signal, SignalId,
};
