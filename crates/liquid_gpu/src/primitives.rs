//! GPU data layouts for the liquid glass shader

use liquid_core::{Color, Size};

/// Uniform block consumed by `LIQUID_SHADER` (matches shader `LiquidUniforms` struct)
///
/// Memory layout:
/// - size: `vec2<f32>`          (8 bytes)
/// - refraction: `f32`          (4 bytes)
/// - curve: `f32`               (4 bytes)
/// - corner_radii: `vec4<f32>`  (16 bytes)
/// - tint: `vec4<f32>`          (16 bytes)
/// - edge: `f32`                (4 bytes)
/// - saturation: `f32`          (4 bytes)
/// - dispersion: `f32`          (4 bytes)
/// - _padding: `f32`            (4 bytes)
/// Total: 64 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LiquidUniforms {
    /// Effect size in pixels (width, height)
    pub size: [f32; 2],
    /// Refraction depth, as a fraction of the minimum dimension
    pub refraction: f32,
    /// Lens curvature
    pub curve: f32,
    /// Corner radii normalized by the minimum dimension
    /// (bottom-end, top-end, bottom-start, top-start)
    pub corner_radii: [f32; 4],
    /// Tint color (RGBA, non-premultiplied), unpacked from its ARGB value
    pub tint: [f32; 4],
    /// Edge highlight width
    pub edge: f32,
    /// Saturation multiplier
    pub saturation: f32,
    /// Chromatic dispersion amount
    pub dispersion: f32,
    pub _padding: f32,
}

impl Default for LiquidUniforms {
    fn default() -> Self {
        Self {
            size: [0.0, 0.0],
            refraction: 0.25,
            curve: 0.25,
            corner_radii: [0.5; 4],
            tint: [0.0; 4],
            edge: 0.0,
            saturation: 1.0,
            dispersion: 0.0,
            _padding: 0.0,
        }
    }
}

impl LiquidUniforms {
    pub fn with_size(mut self, size: Size) -> Self {
        self.size = [size.width, size.height];
        self
    }

    pub fn with_corner_radii(mut self, radii: [f32; 4]) -> Self {
        self.corner_radii = radii;
        self
    }

    pub fn with_refraction(mut self, refraction: f32) -> Self {
        self.refraction = refraction;
        self
    }

    pub fn with_curve(mut self, curve: f32) -> Self {
        self.curve = curve;
        self
    }

    pub fn with_edge(mut self, edge: f32) -> Self {
        self.edge = edge;
        self
    }

    /// Tint from its packed 0xAARRGGBB form
    pub fn with_tint_argb(mut self, argb: u32) -> Self {
        self.tint = Color::from_argb(argb).to_array();
        self
    }

    pub fn with_saturation(mut self, saturation: f32) -> Self {
        self.saturation = saturation;
        self
    }

    pub fn with_dispersion(mut self, dispersion: f32) -> Self {
        self.dispersion = dispersion;
        self
    }

    /// Raw bytes for a uniform buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
