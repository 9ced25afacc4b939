use crate::core::error::ValidationError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Numeric policy shared by every ledger component.
///
/// `tolerance` is used for custom-sum checks, percent-sum checks and as the
/// netting epsilon. `scale` is the number of decimal places of the minor
/// currency unit that split shares are rounded to.
///
/// # Examples
///
/// ```
/// use expense_ledger::core::config::LedgerConfig;
/// use rust_decimal_macros::dec;
///
/// let config = LedgerConfig::default();
/// assert_eq!(config.tolerance, dec!(0.01));
/// assert_eq!(config.minor_unit(), dec!(0.01));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub tolerance: Decimal,
    pub scale: u32,
}

/// Largest supported minor-unit scale.
pub const MAX_SCALE: u32 = 10;

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            tolerance: dec!(0.01),
            scale: 2,
        }
    }
}

impl LedgerConfig {
    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    /// Smallest representable amount at the configured scale.
    pub fn minor_unit(&self) -> Decimal {
        Decimal::new(1, self.scale)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tolerance < Decimal::ZERO {
            return Err(ValidationError::InvalidConfig(format!(
                "tolerance must not be negative, got {}",
                self.tolerance
            )));
        }
        if self.scale > MAX_SCALE {
            return Err(ValidationError::InvalidConfig(format!(
                "scale must be at most {}, got {}",
                MAX_SCALE, self.scale
            )));
        }
        Ok(())
    }
}
