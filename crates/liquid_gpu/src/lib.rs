//! Liquid GPU Backend
//!
//! GPU side of the liquid glass effect.
//!
//! # Features
//!
//! - **Uniforms**: `LiquidUniforms`, the 64-byte block read by the glass shader
//! - **Shader**: `LIQUID_SHADER`, a WGSL lens with refraction, dispersion and edge light
//! - **Backends**: full (runtime shader + blur) and reduced (blur only or nothing)
//! - **Capability tiers**: detected once from wgpu downlevel capabilities or config
//! - **Layers**: offscreen display lists carrying a render effect and color filter

pub mod backend;
pub mod config;
pub mod effect;
pub mod error;
pub mod layer;
pub mod primitives;
pub mod shaders;

pub use backend::{
    compile_liquid_shader, create_backend, select_tier, BackendStats, CapabilityTier,
    FallbackBackend, RuntimeShaderBackend, ShaderBackend,
};
pub use config::BackendConfig;
pub use effect::{blur_sigma, BlurEffect, EffectId, RenderEffect, RenderEffectKind, ShaderProgram};
pub use error::{BackendError, Result};
pub use layer::{GraphicsLayer, LayerPool};
pub use primitives::LiquidUniforms;
pub use shaders::{LIQUID_CONTENT_INPUT, LIQUID_FRAGMENT_ENTRY, LIQUID_SHADER, LIQUID_VERTEX_ENTRY};
