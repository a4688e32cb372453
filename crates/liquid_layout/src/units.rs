//! Density-independent lengths

/// Pixels per density-independent unit
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Density(pub f32);

impl Default for Density {
    fn default() -> Self {
        Density(1.0)
    }
}

/// A density-independent length
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Dp(pub f32);

impl Dp {
    pub const ZERO: Dp = Dp(0.0);

    pub fn to_px(self, density: Density) -> f32 {
        self.0 * density.0
    }
}
