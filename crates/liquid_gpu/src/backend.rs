//! Platform shader backends
//!
//! A backend builds the two kinds of GPU objects the glass effect needs: a
//! blur filter and a render pipeline combining the liquid program with an
//! optional blurred content input. Two implementations exist:
//!
//! - [`RuntimeShaderBackend`]: runs `LIQUID_SHADER`, chained after an optional blur
//! - [`FallbackBackend`]: no runtime shaders; offers a plain blur when the
//!   device can afford it, nothing otherwise
//!
//! [`create_backend`] picks one once, from a [`CapabilityTier`].

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::BackendConfig;
use crate::effect::{BlurEffect, RenderEffect, RenderEffectKind, ShaderProgram};
use crate::error::{BackendError, Result};
use crate::primitives::LiquidUniforms;
use crate::shaders::LIQUID_SHADER;

/// Supported level of shader and blur features
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityTier {
    /// Runtime shaders and blur
    Full,
    /// Blur without runtime shaders
    BlurOnly,
    /// Neither; static approximation only
    Basic,
}

impl CapabilityTier {
    /// Map an adapter's downlevel capabilities to a tier
    pub fn from_downlevel(caps: &wgpu::DownlevelCapabilities) -> Self {
        match caps.shader_model {
            wgpu::ShaderModel::Sm5 => CapabilityTier::Full,
            wgpu::ShaderModel::Sm4 => CapabilityTier::BlurOnly,
            _ => CapabilityTier::Basic,
        }
    }

    pub fn supports_runtime_shader(&self) -> bool {
        matches!(self, CapabilityTier::Full)
    }

    pub fn supports_blur(&self) -> bool {
        !matches!(self, CapabilityTier::Basic)
    }
}

/// Count of objects a backend has built
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BackendStats {
    pub pipelines_built: u64,
    pub blurs_built: u64,
}

/// Builds blur and render pipeline objects for the glass effect
pub trait ShaderBackend: fmt::Debug {
    /// Tier this backend implements
    fn tier(&self) -> CapabilityTier;

    /// Build a blur of `radius` pixels, or `None` when no blur applies
    fn build_blur(&mut self, radius: f32) -> Option<BlurEffect>;

    /// Build the render pipeline for one set of uniforms
    ///
    /// `content_input` names the shader input the layer content is bound to;
    /// `blur`, when present, is applied to that content first.
    fn build_render_pipeline(
        &mut self,
        uniforms: &LiquidUniforms,
        content_input: &'static str,
        blur: Option<&BlurEffect>,
    ) -> Option<RenderEffect>;

    fn stats(&self) -> BackendStats;
}

// ─────────────────────────────────────────────────────────────────────────────
// Full capability
// ─────────────────────────────────────────────────────────────────────────────

/// Parse and validate `LIQUID_SHADER`
pub fn compile_liquid_shader() -> Result<ShaderProgram> {
    let module = naga::front::wgsl::parse_str(LIQUID_SHADER)
        .map_err(|e| BackendError::ShaderParse(e.emit_to_string(LIQUID_SHADER)))?;
    let info = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|e| BackendError::ShaderValidation(e.to_string()))?;
    Ok(ShaderProgram { module, info })
}

/// The compiled program, shared by every full backend in the process
fn shared_program() -> Result<Arc<ShaderProgram>> {
    static PROGRAM: OnceLock<Arc<ShaderProgram>> = OnceLock::new();
    if let Some(program) = PROGRAM.get() {
        return Ok(program.clone());
    }
    let compiled = Arc::new(compile_liquid_shader()?);
    debug!("Compiled liquid shader");
    Ok(PROGRAM.get_or_init(|| compiled).clone())
}

/// Backend with runtime shader support
#[derive(Debug)]
pub struct RuntimeShaderBackend {
    program: Arc<ShaderProgram>,
    min_blur_radius: f32,
    stats: BackendStats,
}

impl RuntimeShaderBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        Ok(Self {
            program: shared_program()?,
            min_blur_radius: config.min_blur_radius,
            stats: BackendStats::default(),
        })
    }

    pub fn program(&self) -> &Arc<ShaderProgram> {
        &self.program
    }
}

impl ShaderBackend for RuntimeShaderBackend {
    fn tier(&self) -> CapabilityTier {
        CapabilityTier::Full
    }

    fn build_blur(&mut self, radius: f32) -> Option<BlurEffect> {
        if radius < self.min_blur_radius {
            return None;
        }
        self.stats.blurs_built += 1;
        Some(BlurEffect::new(radius))
    }

    fn build_render_pipeline(
        &mut self,
        uniforms: &LiquidUniforms,
        content_input: &'static str,
        blur: Option<&BlurEffect>,
    ) -> Option<RenderEffect> {
        self.stats.pipelines_built += 1;
        Some(RenderEffect::new(RenderEffectKind::RuntimeShader {
            program: self.program.clone(),
            uniforms: *uniforms,
            content_input,
            blur: blur.cloned(),
        }))
    }

    fn stats(&self) -> BackendStats {
        self.stats
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reduced capability
// ─────────────────────────────────────────────────────────────────────────────

/// Backend without runtime shaders
///
/// Uniforms are ignored; the pipeline is the blur alone when one is given.
#[derive(Debug)]
pub struct FallbackBackend {
    blur_supported: bool,
    stats: BackendStats,
}

impl FallbackBackend {
    pub fn blur_only() -> Self {
        Self {
            blur_supported: true,
            stats: BackendStats::default(),
        }
    }

    pub fn basic() -> Self {
        Self {
            blur_supported: false,
            stats: BackendStats::default(),
        }
    }
}

impl ShaderBackend for FallbackBackend {
    fn tier(&self) -> CapabilityTier {
        if self.blur_supported {
            CapabilityTier::BlurOnly
        } else {
            CapabilityTier::Basic
        }
    }

    fn build_blur(&mut self, radius: f32) -> Option<BlurEffect> {
        if !self.blur_supported || radius <= 0.0 {
            return None;
        }
        self.stats.blurs_built += 1;
        Some(BlurEffect::new(radius))
    }

    fn build_render_pipeline(
        &mut self,
        _uniforms: &LiquidUniforms,
        _content_input: &'static str,
        blur: Option<&BlurEffect>,
    ) -> Option<RenderEffect> {
        let blur = blur?.clone();
        self.stats.pipelines_built += 1;
        Some(RenderEffect::new(RenderEffectKind::Blur(blur)))
    }

    fn stats(&self) -> BackendStats {
        self.stats
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Selection
// ─────────────────────────────────────────────────────────────────────────────

/// Resolve the tier: configured override, then adapter capabilities, then full
pub fn select_tier(
    config: &BackendConfig,
    detected: Option<&wgpu::DownlevelCapabilities>,
) -> CapabilityTier {
    config
        .tier
        .or_else(|| detected.map(CapabilityTier::from_downlevel))
        .unwrap_or(CapabilityTier::Full)
}

/// Build the backend for a tier
///
/// A full backend whose shader fails to compile degrades to blur-only.
pub fn create_backend(tier: CapabilityTier, config: &BackendConfig) -> Box<dyn ShaderBackend> {
    let backend: Box<dyn ShaderBackend> = match tier {
        CapabilityTier::Full => match RuntimeShaderBackend::new(config) {
            Ok(backend) => Box::new(backend),
            Err(err) => {
                warn!("Runtime shader unavailable, falling back to blur only: {}", err);
                Box::new(FallbackBackend::blur_only())
            }
        },
        CapabilityTier::BlurOnly => Box::new(FallbackBackend::blur_only()),
        CapabilityTier::Basic => Box::new(FallbackBackend::basic()),
    };
    debug!("Selected {:?} shader backend", backend.tier());
    backend
}
