//! Brush configuration.

use brushwork_math::{Aabb3, Tolerance};
use serde::{Deserialize, Serialize};

use crate::{BrushError, Result};

/// Settings shared by every brush of a map.
///
/// ```toml
/// world_half_extent = 8192.0
///
/// [tolerance]
/// linear = 1e-5
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushConfig {
    /// Distance and parallelism thresholds for every classification.
    pub tolerance: Tolerance,
    /// Half size of the cube brushes are seeded from.
    pub world_half_extent: f64,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::DEFAULT,
            world_half_extent: 16384.0,
        }
    }
}

impl BrushConfig {
    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every threshold and the world size are finite and
    /// positive.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("tolerance.linear", self.tolerance.linear),
            ("tolerance.angular", self.tolerance.angular),
            ("world_half_extent", self.world_half_extent),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(BrushError::InvalidConfig { field, value });
            }
        }
        Ok(())
    }

    /// The seed cube centred on the origin.
    pub fn world_bounds(&self) -> Aabb3 {
        Aabb3::cube(self.world_half_extent)
    }
}
