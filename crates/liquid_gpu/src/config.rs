//! Backend configuration
//!
//! Loaded from a TOML document such as:
//!
//! ```toml
//! tier = "blur_only"
//! min_blur_radius = 1.0
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::backend::CapabilityTier;
use crate::error::Result;

/// Tunables for backend selection and the reduced-capability approximation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Force a capability tier instead of detecting it
    #[serde(default)]
    pub tier: Option<CapabilityTier>,
    /// Smallest frost radius (px) the full backend blurs
    #[serde(default = "default_min_blur_radius")]
    pub min_blur_radius: f32,
    /// Stroke width (dp) of the reduced-tier edge highlight
    #[serde(default = "default_edge_stroke_dp")]
    pub edge_stroke_dp: f32,
    /// Below this minimum dimension (px) nodes skip all effect work
    #[serde(default = "default_min_effect_dimension")]
    pub min_effect_dimension: f32,
}

fn default_min_blur_radius() -> f32 {
    1.0
}

fn default_edge_stroke_dp() -> f32 {
    4.0
}

fn default_min_effect_dimension() -> f32 {
    1.0
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            tier: None,
            min_blur_radius: default_min_blur_radius(),
            edge_stroke_dp: default_edge_stroke_dp(),
            min_effect_dimension: default_min_effect_dimension(),
        }
    }
}

impl BackendConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn with_tier(mut self, tier: CapabilityTier) -> Self {
        self.tier = Some(tier);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = BackendConfig::from_toml_str("").unwrap();
        assert_eq!(config, BackendConfig::default());
    }

    #[test]
    fn test_parse_overrides() {
        let config = BackendConfig::from_toml_str(
            r#"
            tier = "blur_only"
            edge_stroke_dp = 2.5
            "#,
        )
        .unwrap();
        assert_eq!(config.tier, Some(CapabilityTier::BlurOnly));
        assert_eq!(config.edge_stroke_dp, 2.5);
        assert_eq!(config.min_blur_radius, 1.0);
    }

    #[test]
    fn test_unknown_tier_is_rejected() {
        assert!(BackendConfig::from_toml_str("tier = \"ultra\"").is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(BackendConfig::load("/nonexistent/liquid.toml").is_err());
    }
}
