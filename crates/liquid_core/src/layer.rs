//! Geometry and paint types shared by the glass effect pipeline
//!
//! Everything the effect nodes measure or draw is expressed with these
//! types: positions and bounds in screen pixels, the screen transform of a
//! node, colours with their packed ARGB form, and the brushes/clips used by
//! the reduced-capability approximation.

use slotmap::new_key_type;

// ─────────────────────────────────────────────────────────────────────────────
// Core Geometry Types
// ─────────────────────────────────────────────────────────────────────────────

/// 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// 2D size
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// The smaller of width and height
    pub fn min_dimension(&self) -> f32 {
        self.width.min(self.height)
    }

    /// Convert to a Rect at the origin (0, 0)
    pub const fn to_rect(self) -> Rect {
        Rect {
            origin: Point::ZERO,
            size: self,
        }
    }
}

impl From<Size> for Rect {
    fn from(size: Size) -> Self {
        size.to_rect()
    }
}

/// 2D rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        origin: Point::ZERO,
        size: Size::ZERO,
    };

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn x(&self) -> f32 {
        self.origin.x
    }

    pub fn y(&self) -> f32 {
        self.origin.y
    }

    pub fn width(&self) -> f32 {
        self.size.width
    }

    pub fn height(&self) -> f32 {
        self.size.height
    }

    pub fn right(&self) -> f32 {
        self.origin.x + self.size.width
    }

    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.height
    }

    pub fn top_left(&self) -> Point {
        self.origin
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.right(), self.bottom())
    }

    /// Whether the two rects share any interior area
    ///
    /// Rects that only touch along an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.right() > other.x()
            && other.right() > self.x()
            && self.bottom() > other.y()
            && other.bottom() > self.y()
    }

    /// Smallest rect containing every given point
    pub fn bounding(points: &[Point]) -> Rect {
        let Some(first) = points.first() else {
            return Rect::ZERO;
        };
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// 2D affine transformation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2D {
    /// Matrix elements [a, b, c, d, tx, ty]
    /// | a  c  tx |
    /// | b  d  ty |
    /// | 0  0   1 |
    pub elements: [f32; 6],
}

impl Default for Affine2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2D {
    pub const IDENTITY: Affine2D = Affine2D {
        elements: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    pub fn translation(x: f32, y: f32) -> Self {
        Self {
            elements: [1.0, 0.0, 0.0, 1.0, x, y],
        }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            elements: [sx, 0.0, 0.0, sy, 0.0, 0.0],
        }
    }

    /// Rotation by `angle` radians, clockwise in screen space
    pub fn rotation(angle: f32) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Self {
            elements: [c, s, -s, c, 0.0, 0.0],
        }
    }

    pub fn rotation_degrees(degrees: f32) -> Self {
        Self::rotation(degrees.to_radians())
    }

    pub fn transform_point(&self, point: Point) -> Point {
        let [a, b, c, d, tx, ty] = self.elements;
        Point::new(
            a * point.x + c * point.y + tx,
            b * point.x + d * point.y + ty,
        )
    }

    /// Concatenate this transform with another (self * other)
    /// The resulting transform first applies `other`, then `self`.
    pub fn then(&self, other: &Affine2D) -> Affine2D {
        let [a1, b1, c1, d1, tx1, ty1] = self.elements;
        let [a2, b2, c2, d2, tx2, ty2] = other.elements;

        Affine2D {
            elements: [
                a1 * a2 + c1 * b2,
                b1 * a2 + d1 * b2,
                a1 * c2 + c1 * d2,
                b1 * c2 + d1 * d2,
                a1 * tx2 + c1 * ty2 + tx1,
                b1 * tx2 + d1 * ty2 + ty1,
            ],
        }
    }

    /// Length of the transformed x basis vector
    pub fn scale_x_magnitude(&self) -> f32 {
        let [a, b, ..] = self.elements;
        (a * a + b * b).sqrt()
    }

    /// Length of the transformed y basis vector
    pub fn scale_y_magnitude(&self) -> f32 {
        let [_, _, c, d, ..] = self.elements;
        (c * c + d * d).sqrt()
    }

    /// Rotation of the x basis vector in degrees
    pub fn rotation_z_degrees(&self) -> f32 {
        let [a, b, ..] = self.elements;
        b.atan2(a).to_degrees()
    }

    /// Axis-aligned bounds of `rect` after transformation
    pub fn map_rect(&self, rect: Rect) -> Rect {
        Rect::bounding(&[
            self.transform_point(rect.top_left()),
            self.transform_point(Point::new(rect.right(), rect.y())),
            self.transform_point(rect.bottom_right()),
            self.transform_point(Point::new(rect.x(), rect.bottom())),
        ])
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Color and Visual Types
// ─────────────────────────────────────────────────────────────────────────────

/// RGBA color, non-premultiplied, channels in 0..=1
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Self::rgb(r, g, b)
    }

    /// Unpack a 0xAARRGGBB value
    pub fn from_argb(argb: u32) -> Self {
        let a = ((argb >> 24) & 0xFF) as f32 / 255.0;
        let mut color = Self::from_hex(argb);
        color.a = a;
        color
    }

    /// Pack into 0xAARRGGBB, 8 bits per channel
    ///
    /// Distinct colours can share a packed value (every fully transparent
    /// black variant packs to 0); the packed value is what the shader sees.
    pub fn to_argb(&self) -> u32 {
        fn channel(v: f32) -> u32 {
            (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u32
        }
        (channel(self.a) << 24) | (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Gradient stop
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient (0.0 to 1.0)
    pub offset: f32,
    /// Color at this stop
    pub color: Color,
}

impl GradientStop {
    pub fn new(offset: f32, color: Color) -> Self {
        Self {
            offset: offset.clamp(0.0, 1.0),
            color,
        }
    }
}

/// Gradient type
#[derive(Clone, Debug, PartialEq)]
pub enum Gradient {
    /// Radial gradient from center outward
    Radial {
        center: Point,
        radius: f32,
        stops: Vec<GradientStop>,
    },
}

impl Gradient {
    /// Create a simple radial gradient with two colors
    pub fn radial(center: Point, radius: f32, from: Color, to: Color) -> Self {
        Gradient::Radial {
            center,
            radius,
            stops: vec![GradientStop::new(0.0, from), GradientStop::new(1.0, to)],
        }
    }

    pub fn stops(&self) -> &[GradientStop] {
        let Gradient::Radial { stops, .. } = self;
        stops
    }
}

/// Brush for filling or stroking shapes
#[derive(Clone, Debug, PartialEq)]
pub enum Brush {
    Solid(Color),
    Gradient(Gradient),
}

impl From<Color> for Brush {
    fn from(color: Color) -> Self {
        Brush::Solid(color)
    }
}

impl From<Gradient> for Brush {
    fn from(gradient: Gradient) -> Self {
        Brush::Gradient(gradient)
    }
}

/// Corner radii for rounded rectangles, in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CornerRadius {
    pub top_left: f32,
    pub top_right: f32,
    pub bottom_right: f32,
    pub bottom_left: f32,
}

impl CornerRadius {
    pub const ZERO: CornerRadius = CornerRadius {
        top_left: 0.0,
        top_right: 0.0,
        bottom_right: 0.0,
        bottom_left: 0.0,
    };

    /// Order: top_left, top_right, bottom_right, bottom_left (clockwise from top-left)
    pub fn new(top_left: f32, top_right: f32, bottom_right: f32, bottom_left: f32) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    pub fn uniform(radius: f32) -> Self {
        Self::new(radius, radius, radius, radius)
    }

    pub fn to_array(&self) -> [f32; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }
}

impl From<f32> for CornerRadius {
    fn from(radius: f32) -> Self {
        Self::uniform(radius)
    }
}

/// Clip region
#[derive(Clone, Debug, PartialEq)]
pub enum ClipShape {
    /// Outline path clip
    Path(crate::draw::Path),
}

impl ClipShape {
    pub fn path(path: crate::draw::Path) -> Self {
        ClipShape::Path(path)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Offscreen Layers
// ─────────────────────────────────────────────────────────────────────────────

new_key_type! {
    /// Handle to an offscreen graphics layer owned by a layer pool
    pub struct LayerId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlaps_is_strict() {
        let a = Rect::new(0.0, 0.0, 50.0, 50.0);
        assert!(a.overlaps(&Rect::new(25.0, 25.0, 50.0, 50.0)));
        assert!(!a.overlaps(&Rect::new(50.0, 0.0, 10.0, 10.0)));
        assert!(!a.overlaps(&Rect::ZERO));
    }

    #[test]
    fn test_argb_packing() {
        assert_eq!(Color::RED.to_argb(), 0xFFFF_0000);
        assert_eq!(Color::TRANSPARENT.to_argb(), 0);
        assert_eq!(Color::rgba(1.0, 1.0, 1.0, 0.0).to_argb(), 0x00FF_FFFF);
        assert_eq!(Color::from_argb(0x4DFF_FFFF).to_argb(), 0x4DFF_FFFF);
    }

    #[test]
    fn test_transform_decomposition() {
        let m = Affine2D::rotation_degrees(30.0).then(&Affine2D::scale(2.0, 3.0));
        assert!((m.scale_x_magnitude() - 2.0).abs() < 1e-5);
        assert!((m.scale_y_magnitude() - 3.0).abs() < 1e-5);
        assert!((m.rotation_z_degrees() - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_then_order() {
        let m = Affine2D::translation(10.0, 0.0).then(&Affine2D::scale(2.0, 2.0));
        assert_eq!(m.transform_point(Point::new(1.0, 1.0)), Point::new(12.0, 2.0));
    }

    #[test]
    fn test_map_rect() {
        let m = Affine2D::translation(5.0, 5.0);
        assert_eq!(
            m.map_rect(Rect::new(0.0, 0.0, 10.0, 20.0)),
            Rect::new(5.0, 5.0, 10.0, 20.0)
        );
    }
}
