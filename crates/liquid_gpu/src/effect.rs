//! Opaque render effect handles produced by a shader backend
//!
//! Handles carry a process-unique [`EffectId`]. Rebuilding an effect always
//! yields a new id, so callers can tell a reused pipeline from a rebuilt one
//! by comparing ids.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::primitives::LiquidUniforms;

/// Identity of a built effect object
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EffectId(pub u64);

impl EffectId {
    /// Allocate a fresh id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        EffectId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Gaussian blur standard deviation for a blur radius in pixels
pub fn blur_sigma(radius: f32) -> f32 {
    0.577_35 * radius + 0.5
}

/// A built blur filter; samples outside the input clamp to its edge
#[derive(Clone, Debug, PartialEq)]
pub struct BlurEffect {
    id: EffectId,
    radius: f32,
    sigma: f32,
}

impl BlurEffect {
    pub fn new(radius: f32) -> Self {
        Self {
            id: EffectId::next(),
            radius,
            sigma: blur_sigma(radius),
        }
    }

    pub fn id(&self) -> EffectId {
        self.id
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn sigma(&self) -> f32 {
        self.sigma
    }
}

/// Validated shader module shared by every effect a backend builds
#[derive(Debug)]
pub struct ShaderProgram {
    pub module: naga::Module,
    pub info: naga::valid::ModuleInfo,
}

/// What a render effect does to the layer it is attached to
#[derive(Clone, Debug)]
pub enum RenderEffectKind {
    /// The liquid glass program, reading the layer content through `blur` when present
    RuntimeShader {
        program: Arc<ShaderProgram>,
        uniforms: LiquidUniforms,
        content_input: &'static str,
        blur: Option<BlurEffect>,
    },
    /// Blur only, used when runtime shaders are unavailable
    Blur(BlurEffect),
}

/// An opaque post-process filter for a graphics layer
#[derive(Clone, Debug)]
pub struct RenderEffect {
    id: EffectId,
    kind: RenderEffectKind,
}

impl RenderEffect {
    pub fn new(kind: RenderEffectKind) -> Self {
        Self {
            id: EffectId::next(),
            kind,
        }
    }

    pub fn id(&self) -> EffectId {
        self.id
    }

    pub fn kind(&self) -> &RenderEffectKind {
        &self.kind
    }

    /// The blur stage of this effect, if any
    pub fn blur(&self) -> Option<&BlurEffect> {
        match &self.kind {
            RenderEffectKind::RuntimeShader { blur, .. } => blur.as_ref(),
            RenderEffectKind::Blur(blur) => Some(blur),
        }
    }

    /// Uniforms of the runtime shader stage, if any
    pub fn uniforms(&self) -> Option<&LiquidUniforms> {
        match &self.kind {
            RenderEffectKind::RuntimeShader { uniforms, .. } => Some(uniforms),
            RenderEffectKind::Blur(_) => None,
        }
    }
}

impl PartialEq for RenderEffect {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = BlurEffect::new(4.0);
        let b = BlurEffect::new(4.0);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.radius(), b.radius());
    }

    #[test]
    fn test_sigma() {
        assert!((blur_sigma(0.0) - 0.5).abs() < 1e-6);
        assert!((BlurEffect::new(10.0).sigma() - 6.2735).abs() < 1e-4);
    }

    #[test]
    fn test_blur_only_effect() {
        let blur = BlurEffect::new(3.0);
        let effect = RenderEffect::new(RenderEffectKind::Blur(blur.clone()));
        assert_eq!(effect.blur(), Some(&blur));
        assert!(effect.uniforms().is_none());
        assert_eq!(effect.clone(), effect);
    }
}
