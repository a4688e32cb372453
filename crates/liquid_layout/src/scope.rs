//! Effect parameters
//!
//! [`LiquidScope`] is what a configuration block sees. [`LiquidParams`] is
//! the single long-lived implementation each effect node owns: every setter
//! is equality gated and records the field it owns in a [`DirtyMask`].
//!
//! Three fields are tracked on derived values rather than on the input:
//! - Frost on the pixel radius (`frost * density`)
//! - Shape on the normalized corner radii, only once a size is known
//! - Tint on the packed ARGB value, so transparent and unspecified are equal

use liquid_core::{Color, Point, Rect, Size};
use liquid_gpu::{blur_sigma, LiquidUniforms};

use crate::fields::{DirtyMask, Field};
use crate::shape::Shape;
use crate::state::Liquefiable;
use crate::units::{Density, Dp};

/// Configurable glass parameters
///
/// Negative and NaN inputs are stored as zero.
pub trait LiquidScope {
    /// Blur radius applied to sampled content
    fn frost(&self) -> Dp;
    fn set_frost(&mut self, frost: Dp);

    fn shape(&self) -> &Shape;
    fn set_shape(&mut self, shape: Shape);

    /// Depth of the refracting rim, relative to the minimum dimension
    fn refraction(&self) -> f32;
    fn set_refraction(&mut self, refraction: f32);

    /// Strength of the lens curvature
    fn curve(&self) -> f32;
    fn set_curve(&mut self, curve: f32);

    /// Width of the edge highlight
    fn edge(&self) -> f32;
    fn set_edge(&mut self, edge: f32);

    /// `None` leaves the sampled colours untinted
    fn tint(&self) -> Option<Color>;
    fn set_tint(&mut self, tint: Option<Color>);

    fn saturation(&self) -> f32;
    fn set_saturation(&mut self, saturation: f32);

    /// Chromatic aberration toward the edges
    fn dispersion(&self) -> f32;
    fn set_dispersion(&mut self, dispersion: f32);
}

fn non_negative(value: f32) -> f32 {
    // f32::max returns the non-NaN operand
    value.max(0.0)
}

/// Parameter state of one effect node
#[derive(Debug)]
pub struct LiquidParams {
    frost: Dp,
    shape: Shape,
    refraction: f32,
    curve: f32,
    edge: f32,
    tint: Option<Color>,
    saturation: f32,
    dispersion: f32,

    density: Density,
    size: Option<Size>,
    position_on_screen: Option<Point>,
    inverse_scale_x: f32,
    inverse_scale_y: f32,
    inverse_rotation_z: f32,
    bounds_in_root: Rect,
    liquefiables: Vec<Liquefiable>,

    // Derived
    frost_radius: f32,
    corner_radii: [f32; 4],
    tint_argb: u32,

    dirty: DirtyMask,
}

impl Default for LiquidParams {
    fn default() -> Self {
        Self {
            frost: Dp::ZERO,
            shape: Shape::Circle,
            refraction: 0.25,
            curve: 0.25,
            edge: 0.0,
            tint: None,
            saturation: 1.0,
            dispersion: 0.0,
            density: Density::default(),
            size: None,
            position_on_screen: None,
            inverse_scale_x: 1.0,
            inverse_scale_y: 1.0,
            inverse_rotation_z: 0.0,
            bounds_in_root: Rect::ZERO,
            liquefiables: Vec::new(),
            frost_radius: 0.0,
            corner_radii: [0.0; 4],
            tint_argb: 0,
            dirty: DirtyMask::EMPTY,
        }
    }
}

impl LiquidParams {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Node-driven fields
    // =========================================================================

    pub fn density(&self) -> Density {
        self.density
    }

    pub fn set_density(&mut self, density: Density) {
        if self.density != density {
            self.density = density;
            self.update_frost_radius();
        }
    }

    /// `None` until the node has been measured
    pub fn size(&self) -> Option<Size> {
        self.size
    }

    pub fn set_size(&mut self, size: Option<Size>) {
        if self.size != size {
            self.dirty.insert(Field::Size);
            self.size = size;
            if size.is_some() {
                self.update_corner_radii();
            }
        }
    }

    pub fn position_on_screen(&self) -> Option<Point> {
        self.position_on_screen
    }

    pub fn set_position_on_screen(&mut self, position: Option<Point>) {
        if self.position_on_screen != position {
            self.dirty.insert(Field::PositionOnScreen);
            self.position_on_screen = position;
        }
    }

    pub fn inverse_scale_x(&self) -> f32 {
        self.inverse_scale_x
    }

    pub fn set_inverse_scale_x(&mut self, scale: f32) {
        if self.inverse_scale_x != scale {
            self.dirty.insert(Field::ScaleX);
            self.inverse_scale_x = scale;
        }
    }

    pub fn inverse_scale_y(&self) -> f32 {
        self.inverse_scale_y
    }

    pub fn set_inverse_scale_y(&mut self, scale: f32) {
        if self.inverse_scale_y != scale {
            self.dirty.insert(Field::ScaleY);
            self.inverse_scale_y = scale;
        }
    }

    /// Degrees that undo the node's own screen rotation
    pub fn inverse_rotation_z(&self) -> f32 {
        self.inverse_rotation_z
    }

    pub fn set_inverse_rotation_z(&mut self, degrees: f32) {
        if self.inverse_rotation_z != degrees {
            self.dirty.insert(Field::Rotation);
            self.inverse_rotation_z = degrees;
        }
    }

    /// Untracked: only used to filter surfaces at draw time
    pub fn bounds_in_root(&self) -> Rect {
        self.bounds_in_root
    }

    pub fn set_bounds_in_root(&mut self, bounds: Rect) {
        self.bounds_in_root = bounds;
    }

    /// Surfaces this node may sample
    pub fn liquefiables(&self) -> &[Liquefiable] {
        &self.liquefiables
    }

    pub fn set_liquefiables(&mut self, liquefiables: Vec<Liquefiable>) {
        if self.liquefiables != liquefiables {
            self.dirty.insert(Field::Liquefiables);
            self.liquefiables = liquefiables;
        }
    }

    // =========================================================================
    // Derived values
    // =========================================================================

    /// Frost in pixels
    pub fn frost_radius(&self) -> f32 {
        self.frost_radius
    }

    pub fn sigma(&self) -> f32 {
        blur_sigma(self.frost_radius)
    }

    /// Normalized radii: bottom-end, top-end, bottom-start, top-start
    pub fn corner_radii(&self) -> [f32; 4] {
        self.corner_radii
    }

    /// Packed tint, 0 when unspecified
    pub fn tint_argb(&self) -> u32 {
        self.tint_argb
    }

    /// Uniform block for the current values
    pub fn uniforms(&self) -> LiquidUniforms {
        LiquidUniforms::default()
            .with_size(self.size.unwrap_or(Size::ZERO))
            .with_corner_radii(self.corner_radii)
            .with_refraction(self.refraction)
            .with_curve(self.curve)
            .with_edge(self.edge)
            .with_tint_argb(self.tint_argb)
            .with_saturation(self.saturation)
            .with_dispersion(self.dispersion)
    }

    // =========================================================================
    // Dirty tracking
    // =========================================================================

    /// Fields changed since the last [`LiquidParams::clean`]
    pub fn dirty(&self) -> DirtyMask {
        self.dirty
    }

    pub fn clean(&mut self) {
        self.dirty.clear();
    }

    /// Force fields dirty, e.g. so a reattached node rebuilds
    pub fn mark_dirty(&mut self, mask: DirtyMask) {
        self.dirty |= mask;
    }

    fn update_frost_radius(&mut self) {
        let radius = self.frost.to_px(self.density);
        if self.frost_radius != radius {
            self.dirty.insert(Field::Frost);
            self.frost_radius = radius;
        }
    }

    fn update_corner_radii(&mut self) {
        let Some(size) = self.size else {
            return;
        };
        let radii = self.shape.corner_radii(size, self.density);
        if self.corner_radii != radii {
            self.dirty.insert(Field::Shape);
            self.corner_radii = radii;
        }
    }
}

impl LiquidScope for LiquidParams {
    fn frost(&self) -> Dp {
        self.frost
    }

    fn set_frost(&mut self, frost: Dp) {
        let frost = Dp(non_negative(frost.0));
        if self.frost != frost {
            self.frost = frost;
            self.update_frost_radius();
        }
    }

    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn set_shape(&mut self, shape: Shape) {
        if self.shape != shape {
            self.shape = shape;
            self.update_corner_radii();
        }
    }

    fn refraction(&self) -> f32 {
        self.refraction
    }

    fn set_refraction(&mut self, refraction: f32) {
        let refraction = non_negative(refraction);
        if self.refraction != refraction {
            self.dirty.insert(Field::Refraction);
            self.refraction = refraction;
        }
    }

    fn curve(&self) -> f32 {
        self.curve
    }

    fn set_curve(&mut self, curve: f32) {
        let curve = non_negative(curve);
        if self.curve != curve {
            self.dirty.insert(Field::Curve);
            self.curve = curve;
        }
    }

    fn edge(&self) -> f32 {
        self.edge
    }

    fn set_edge(&mut self, edge: f32) {
        let edge = non_negative(edge);
        if self.edge != edge {
            self.dirty.insert(Field::Edge);
            self.edge = edge;
        }
    }

    fn tint(&self) -> Option<Color> {
        self.tint
    }

    fn set_tint(&mut self, tint: Option<Color>) {
        if self.tint != tint {
            self.tint = tint;
            let argb = tint.map_or(0, |color| color.to_argb());
            if self.tint_argb != argb {
                self.dirty.insert(Field::Tint);
                self.tint_argb = argb;
            }
        }
    }

    fn saturation(&self) -> f32 {
        self.saturation
    }

    fn set_saturation(&mut self, saturation: f32) {
        let saturation = non_negative(saturation);
        if self.saturation != saturation {
            self.dirty.insert(Field::Saturation);
            self.saturation = saturation;
        }
    }

    fn dispersion(&self) -> f32 {
        self.dispersion
    }

    fn set_dispersion(&mut self, dispersion: f32) {
        let dispersion = non_negative(dispersion);
        if self.dispersion != dispersion {
            self.dirty.insert(Field::Dispersion);
            self.dispersion = dispersion;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::CornerSize;

    fn assert_only(params: &LiquidParams, field: Field) {
        assert_eq!(params.dirty(), DirtyMask::from(field));
        assert!(params.dirty().intersects(DirtyMask::INVALIDATE));
    }

    #[test]
    fn test_defaults() {
        let params = LiquidParams::new();
        assert_eq!(params.frost(), Dp::ZERO);
        assert_eq!(params.shape(), &Shape::Circle);
        assert_eq!(params.refraction(), 0.25);
        assert_eq!(params.curve(), 0.25);
        assert_eq!(params.edge(), 0.0);
        assert_eq!(params.tint(), None);
        assert_eq!(params.saturation(), 1.0);
        assert_eq!(params.dispersion(), 0.0);
        assert_eq!(params.tint_argb(), 0);
        assert_eq!(params.size(), None);
        assert_eq!(params.position_on_screen(), None);
        assert_eq!(params.inverse_scale_x(), 1.0);
        assert_eq!(params.inverse_scale_y(), 1.0);
        assert_eq!(params.inverse_rotation_z(), 0.0);
        assert_eq!(params.bounds_in_root(), Rect::ZERO);
        assert!(params.liquefiables().is_empty());
        assert!(params.dirty().is_empty());
    }

    #[test]
    fn test_frost() {
        let mut params = LiquidParams::new();
        params.set_frost(Dp(10.0));
        assert_eq!(params.frost_radius(), 10.0);
        assert_only(&params, Field::Frost);
        assert!(params.dirty().intersects(DirtyMask::RENDER_EFFECT));
        assert!((params.sigma() - 6.2735).abs() < 1e-4);
    }

    #[test]
    fn test_shader_fields_set_their_own_bit() {
        let cases: [(fn(&mut LiquidParams), Field); 5] = [
            (|p| p.set_refraction(0.5), Field::Refraction),
            (|p| p.set_curve(0.5), Field::Curve),
            (|p| p.set_edge(0.5), Field::Edge),
            (|p| p.set_saturation(1.5), Field::Saturation),
            (|p| p.set_dispersion(0.5), Field::Dispersion),
        ];
        for (set, field) in cases {
            let mut params = LiquidParams::new();
            set(&mut params);
            assert_only(&params, field);
            assert!(params.dirty().intersects(DirtyMask::RENDER_EFFECT));
        }
    }

    #[test]
    fn test_layout_fields_only_need_redraw() {
        let cases: [(fn(&mut LiquidParams), Field); 4] = [
            (
                |p| p.set_position_on_screen(Some(Point::new(4.0, 2.0))),
                Field::PositionOnScreen,
            ),
            (|p| p.set_inverse_rotation_z(-30.0), Field::Rotation),
            (|p| p.set_inverse_scale_x(0.5), Field::ScaleX),
            (|p| p.set_inverse_scale_y(0.5), Field::ScaleY),
        ];
        for (set, field) in cases {
            let mut params = LiquidParams::new();
            set(&mut params);
            assert_only(&params, field);
            assert!(!params.dirty().intersects(DirtyMask::RENDER_EFFECT));
        }
    }

    #[test]
    fn test_equal_values_stay_clean() {
        let mut params = LiquidParams::new();
        params.set_frost(Dp::ZERO);
        params.set_shape(Shape::Circle);
        params.set_refraction(0.25);
        params.set_curve(0.25);
        params.set_edge(0.0);
        params.set_tint(None);
        params.set_saturation(1.0);
        params.set_dispersion(0.0);
        params.set_density(Density(1.0));
        params.set_size(None);
        params.set_position_on_screen(None);
        params.set_inverse_scale_x(1.0);
        params.set_inverse_scale_y(1.0);
        params.set_inverse_rotation_z(0.0);
        params.set_liquefiables(Vec::new());
        assert!(params.dirty().is_empty());
    }

    #[test]
    fn test_tint_tracks_packed_value() {
        let mut params = LiquidParams::new();
        params.set_tint(Some(Color::TRANSPARENT));
        assert_eq!(params.tint(), Some(Color::TRANSPARENT));
        assert!(params.dirty().is_empty());

        params.set_tint(Some(Color::RED));
        assert_eq!(params.tint_argb(), 0xFFFF_0000);
        assert_only(&params, Field::Tint);
    }

    #[test]
    fn test_shape_needs_size() {
        let mut params = LiquidParams::new();
        params.set_shape(Shape::rounded(CornerSize::Percent(5.0)));
        assert_eq!(params.corner_radii(), [0.0; 4]);
        assert!(params.dirty().is_empty());

        params.set_size(Some(Size::new(50.0, 50.0)));
        assert!(params.dirty().contains(Field::Size));
        assert!(params.dirty().contains(Field::Shape));
        for radius in params.corner_radii() {
            assert!((radius - 0.05).abs() < 1e-6);
        }
    }

    #[test]
    fn test_shape_after_size() {
        let mut params = LiquidParams::new();
        params.set_size(Some(Size::new(50.0, 50.0)));
        assert_eq!(params.corner_radii(), [0.5; 4]);
        params.clean();

        params.set_shape(Shape::Rectangle);
        assert_only(&params, Field::Shape);
        assert_eq!(params.corner_radii(), [0.0; 4]);
    }

    #[test]
    fn test_negative_inputs_clamp_to_zero() {
        let mut params = LiquidParams::new();
        params.set_frost(Dp(-4.0));
        params.set_dispersion(-1.0);
        params.set_edge(f32::NAN);
        assert_eq!(params.frost(), Dp::ZERO);
        assert_eq!(params.frost_radius(), 0.0);
        assert_eq!(params.dispersion(), 0.0);
        assert_eq!(params.edge(), 0.0);
        assert!(params.dirty().is_empty());

        params.set_refraction(-0.5);
        assert_eq!(params.refraction(), 0.0);
        assert_only(&params, Field::Refraction);
    }

    #[test]
    fn test_density_rederives_frost() {
        let mut params = LiquidParams::new();
        params.set_frost(Dp(8.0));
        params.clean();

        params.set_density(Density(2.0));
        assert_eq!(params.frost_radius(), 16.0);
        assert_only(&params, Field::Frost);
        params.clean();

        params.set_density(Density(1.0));
        assert_eq!(params.frost_radius(), 8.0);
        assert_only(&params, Field::Frost);
    }

    #[test]
    fn test_clean() {
        let mut params = LiquidParams::new();
        params.set_frost(Dp(2.0));
        params.set_tint(Some(Color::BLUE));
        params.set_size(Some(Size::new(10.0, 10.0)));
        params.set_inverse_rotation_z(12.0);
        assert!(!params.dirty().is_empty());

        params.clean();
        assert!(params.dirty().is_empty());
    }

    #[test]
    fn test_uniforms() {
        let mut params = LiquidParams::new();
        params.set_size(Some(Size::new(100.0, 40.0)));
        params.set_tint(Some(Color::RED));
        params.set_dispersion(0.3);

        let uniforms = params.uniforms();
        assert_eq!(uniforms.size, [100.0, 40.0]);
        assert_eq!(uniforms.corner_radii, [0.5; 4]);
        assert_eq!(uniforms.tint, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(uniforms.dispersion, 0.3);
    }
}
