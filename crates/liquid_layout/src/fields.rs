//! Dirty-field tracking for effect parameters
//!
//! Every tracked parameter owns one bit of a [`DirtyMask`]. Two unions group
//! the bits: [`DirtyMask::RENDER_EFFECT`] (the render effect must be rebuilt)
//! and [`DirtyMask::INVALIDATE`] (a redraw is needed). Reduced capability
//! tiers declare narrower masks of their own.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// A tracked effect parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Field {
    Frost = 0,
    Shape = 1,
    Refraction = 2,
    Curve = 3,
    Edge = 4,
    Size = 5,
    Tint = 6,
    Saturation = 7,
    Dispersion = 8,
    PositionOnScreen = 9,
    Rotation = 10,
    ScaleX = 11,
    ScaleY = 12,
    Liquefiables = 13,
}

impl Field {
    pub const ALL: [Field; 14] = [
        Field::Frost,
        Field::Shape,
        Field::Refraction,
        Field::Curve,
        Field::Edge,
        Field::Size,
        Field::Tint,
        Field::Saturation,
        Field::Dispersion,
        Field::PositionOnScreen,
        Field::Rotation,
        Field::ScaleX,
        Field::ScaleY,
        Field::Liquefiables,
    ];

    pub const fn bit(self) -> u32 {
        1 << self as u32
    }
}

/// Set of changed fields
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DirtyMask(u32);

impl DirtyMask {
    pub const EMPTY: DirtyMask = DirtyMask(0);

    /// Fields that feed the render effect
    pub const RENDER_EFFECT: DirtyMask = DirtyMask::of(&[
        Field::Frost,
        Field::Shape,
        Field::Refraction,
        Field::Curve,
        Field::Edge,
        Field::Size,
        Field::Tint,
        Field::Saturation,
        Field::Dispersion,
    ]);

    /// Fields whose change needs a redraw
    pub const INVALIDATE: DirtyMask = DirtyMask::RENDER_EFFECT.union(DirtyMask::of(&[
        Field::PositionOnScreen,
        Field::Rotation,
        Field::ScaleX,
        Field::ScaleY,
        Field::Liquefiables,
    ]));

    /// Redraw fields when neither runtime shaders nor blur exist
    pub const BASIC_INVALIDATE: DirtyMask = DirtyMask::of(&[
        Field::Shape,
        Field::Edge,
        Field::Size,
        Field::Tint,
        Field::Saturation,
        Field::PositionOnScreen,
        Field::Rotation,
        Field::ScaleX,
        Field::ScaleY,
        Field::Liquefiables,
    ]);

    /// Redraw fields when only blur exists
    pub const BLUR_ONLY_INVALIDATE: DirtyMask =
        DirtyMask::BASIC_INVALIDATE.union(DirtyMask::of(&[Field::Frost]));

    /// Render effect fields when only blur exists
    pub const BLUR_ONLY_RENDER_EFFECT: DirtyMask = DirtyMask::of(&[Field::Frost]);

    pub const fn of(fields: &[Field]) -> DirtyMask {
        let mut bits = 0;
        let mut i = 0;
        while i < fields.len() {
            bits |= fields[i].bit();
            i += 1;
        }
        DirtyMask(bits)
    }

    pub const fn union(self, other: DirtyMask) -> DirtyMask {
        DirtyMask(self.0 | other.0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, field: Field) -> bool {
        self.0 & field.bit() != 0
    }

    /// Whether any bit is shared with `other`
    pub const fn intersects(self, other: DirtyMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, field: Field) {
        self.0 |= field.bit();
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub fn fields(self) -> impl Iterator<Item = Field> {
        Field::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl From<Field> for DirtyMask {
    fn from(field: Field) -> Self {
        DirtyMask(field.bit())
    }
}

impl BitOr for DirtyMask {
    type Output = DirtyMask;

    fn bitor(self, rhs: DirtyMask) -> DirtyMask {
        self.union(rhs)
    }
}

impl BitOrAssign for DirtyMask {
    fn bitor_assign(&mut self, rhs: DirtyMask) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for DirtyMask {
    type Output = DirtyMask;

    fn bitand(self, rhs: DirtyMask) -> DirtyMask {
        DirtyMask(self.0 & rhs.0)
    }
}

impl fmt::Debug for DirtyMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.fields()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_positions() {
        assert_eq!(Field::Frost.bit(), 1);
        assert_eq!(Field::Dispersion.bit(), 1 << 8);
        assert_eq!(Field::Liquefiables.bit(), 1 << 13);
    }

    #[test]
    fn test_render_effect_mask() {
        assert_eq!(DirtyMask::RENDER_EFFECT.bits(), 0x1FF);
        assert!(!DirtyMask::RENDER_EFFECT.contains(Field::PositionOnScreen));
    }

    #[test]
    fn test_invalidate_covers_render_effect() {
        assert_eq!(DirtyMask::INVALIDATE.bits(), 0x3FFF);
        assert_eq!(
            DirtyMask::INVALIDATE & DirtyMask::RENDER_EFFECT,
            DirtyMask::RENDER_EFFECT
        );
    }

    #[test]
    fn test_reduced_masks() {
        for field in [Field::Refraction, Field::Curve, Field::Dispersion] {
            assert!(!DirtyMask::BLUR_ONLY_INVALIDATE.contains(field));
            assert!(!DirtyMask::BASIC_INVALIDATE.contains(field));
        }
        assert!(DirtyMask::BLUR_ONLY_INVALIDATE.contains(Field::Frost));
        assert!(!DirtyMask::BASIC_INVALIDATE.contains(Field::Frost));
    }

    #[test]
    fn test_insert_and_clear() {
        let mut mask = DirtyMask::EMPTY;
        mask.insert(Field::Tint);
        mask |= Field::Edge.into();
        assert!(mask.contains(Field::Tint));
        assert!(mask.intersects(DirtyMask::RENDER_EFFECT));
        assert_eq!(mask.fields().collect::<Vec<_>>(), vec![Field::Edge, Field::Tint]);

        mask.clear();
        assert!(mask.is_empty());
    }
}
