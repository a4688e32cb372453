//! Effect outlines
//!
//! A [`Shape`] yields two things: the per-corner radii the glass shader
//! reads, normalized by the minimum dimension, and the outline path the
//! reduced-capability approximation clips and tints with.

use std::fmt;
use std::rc::Rc;

use liquid_core::{CornerRadius, Path, Size};

use crate::units::{Density, Dp};

/// Size of one rounded corner
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CornerSize {
    Px(f32),
    Dp(Dp),
    /// Percent of the minimum dimension, clamped to 0..=100
    Percent(f32),
}

impl CornerSize {
    pub fn to_px(&self, size: Size, density: Density) -> f32 {
        match *self {
            CornerSize::Px(px) => px,
            CornerSize::Dp(dp) => dp.to_px(density),
            CornerSize::Percent(percent) => size.min_dimension() * percent.clamp(0.0, 100.0) / 100.0,
        }
    }
}

/// Outline provider for shapes the glass shader has no corner model for
pub trait Outline: fmt::Debug {
    fn outline(&self, size: Size, density: Density) -> Path;
}

/// Outline of a glass effect
#[derive(Clone, Debug)]
pub enum Shape {
    /// Fully rounded ends
    Circle,
    /// Independent corners, start/end in left-to-right layout
    RoundedCorners {
        top_start: CornerSize,
        top_end: CornerSize,
        bottom_end: CornerSize,
        bottom_start: CornerSize,
    },
    Rectangle,
    /// Anything else; the shader treats it as square-cornered
    Custom(Rc<dyn Outline>),
}

impl Default for Shape {
    fn default() -> Self {
        Shape::Circle
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Shape::Circle, Shape::Circle) | (Shape::Rectangle, Shape::Rectangle) => true,
            (
                Shape::RoundedCorners {
                    top_start: a0,
                    top_end: a1,
                    bottom_end: a2,
                    bottom_start: a3,
                },
                Shape::RoundedCorners {
                    top_start: b0,
                    top_end: b1,
                    bottom_end: b2,
                    bottom_start: b3,
                },
            ) => a0 == b0 && a1 == b1 && a2 == b2 && a3 == b3,
            (Shape::Custom(a), Shape::Custom(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Shape {
    /// Same size for every corner
    pub fn rounded(corner: CornerSize) -> Self {
        Shape::RoundedCorners {
            top_start: corner,
            top_end: corner,
            bottom_end: corner,
            bottom_start: corner,
        }
    }

    /// Corner radii for the shader, normalized by the minimum dimension
    ///
    /// Order: bottom-end, top-end, bottom-start, top-start.
    pub fn corner_radii(&self, size: Size, density: Density) -> [f32; 4] {
        match self {
            Shape::Circle => [0.5; 4],
            Shape::RoundedCorners {
                top_start,
                top_end,
                bottom_end,
                bottom_start,
            } => {
                let min_dimension = size.min_dimension();
                if min_dimension <= 0.0 {
                    return [0.0; 4];
                }
                [bottom_end, top_end, bottom_start, top_start]
                    .map(|corner| corner.to_px(size, density) / min_dimension)
            }
            Shape::Rectangle | Shape::Custom(_) => [0.0; 4],
        }
    }

    /// Outline path in local pixels
    pub fn outline(&self, size: Size, density: Density) -> Path {
        let rect = size.to_rect();
        match self {
            Shape::Circle => Path::rounded_rect(rect, size.min_dimension() / 2.0),
            Shape::RoundedCorners {
                top_start,
                top_end,
                bottom_end,
                bottom_start,
            } => Path::rounded_rect(
                rect,
                CornerRadius::new(
                    top_start.to_px(size, density),
                    top_end.to_px(size, density),
                    bottom_end.to_px(size, density),
                    bottom_start.to_px(size, density),
                ),
            ),
            Shape::Rectangle => Path::rect(rect),
            Shape::Custom(outline) => outline.outline(size, density),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liquid_core::Rect;

    #[derive(Debug)]
    struct Diamond;

    impl Outline for Diamond {
        fn outline(&self, size: Size, _density: Density) -> Path {
            Path::new()
                .move_to(size.width / 2.0, 0.0)
                .line_to(size.width, size.height / 2.0)
                .line_to(size.width / 2.0, size.height)
                .line_to(0.0, size.height / 2.0)
                .close()
        }
    }

    #[test]
    fn test_circle_radii() {
        let radii = Shape::Circle.corner_radii(Size::new(100.0, 40.0), Density::default());
        assert_eq!(radii, [0.5; 4]);
    }

    #[test]
    fn test_percent_corners() {
        let shape = Shape::rounded(CornerSize::Percent(5.0));
        let radii = shape.corner_radii(Size::new(50.0, 50.0), Density::default());
        for r in radii {
            assert!((r - 0.05).abs() < 1e-6);
        }
    }

    #[test]
    fn test_corner_order() {
        let shape = Shape::RoundedCorners {
            top_start: CornerSize::Px(1.0),
            top_end: CornerSize::Px(2.0),
            bottom_end: CornerSize::Px(3.0),
            bottom_start: CornerSize::Dp(Dp(2.0)),
        };
        let radii = shape.corner_radii(Size::new(10.0, 20.0), Density(2.0));
        assert_eq!(radii, [0.3, 0.2, 0.4, 0.1]);
    }

    #[test]
    fn test_degenerate_size_gives_zero_radii() {
        let shape = Shape::rounded(CornerSize::Px(4.0));
        assert_eq!(shape.corner_radii(Size::ZERO, Density::default()), [0.0; 4]);
    }

    #[test]
    fn test_other_shapes_have_square_corners() {
        let size = Size::new(10.0, 10.0);
        assert_eq!(Shape::Rectangle.corner_radii(size, Density::default()), [0.0; 4]);

        let custom = Shape::Custom(Rc::new(Diamond));
        assert_eq!(custom.corner_radii(size, Density::default()), [0.0; 4]);
        assert_eq!(custom.outline(size, Density::default()).commands().len(), 5);
    }

    #[test]
    fn test_custom_equality_is_identity() {
        let diamond: Rc<dyn Outline> = Rc::new(Diamond);
        assert_eq!(Shape::Custom(diamond.clone()), Shape::Custom(diamond));
        assert_ne!(Shape::Custom(Rc::new(Diamond)), Shape::Custom(Rc::new(Diamond)));
    }

    #[test]
    fn test_rectangle_outline() {
        let path = Shape::Rectangle.outline(Size::new(4.0, 2.0), Density::default());
        assert_eq!(path, Path::rect(Rect::new(0.0, 0.0, 4.0, 2.0)));
    }
}
