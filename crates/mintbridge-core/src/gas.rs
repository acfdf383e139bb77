//! Gas price and gas limit policy

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Integer multipliers applied to the node's gas price and estimates.
///
/// Both are `value * num / den`, floored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasPolicy {
    /// Gas price multiplier numerator
    pub price_num: u64,
    /// Gas price multiplier denominator
    pub price_den: u64,
    /// Gas limit buffer numerator
    pub limit_num: u64,
    /// Gas limit buffer denominator
    pub limit_den: u64,
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self {
            price_num: 12,
            price_den: 10,
            limit_num: 12,
            limit_den: 10,
        }
    }
}

impl GasPolicy {
    /// Reject zero denominators and multipliers below one
    pub fn validate(&self) -> CoreResult<()> {
        if self.price_den == 0 || self.limit_den == 0 {
            return Err(CoreError::Configuration("gas multiplier denominator is zero".into()));
        }
        if self.price_num < self.price_den || self.limit_num < self.limit_den {
            return Err(CoreError::Configuration("gas multipliers must be at least 1".into()));
        }
        Ok(())
    }

    /// Price to offer for a node-reported base price
    pub fn gas_price(&self, base: u128) -> u128 {
        match self.price_den {
            0 => base,
            den => base.saturating_mul(self.price_num as u128) / den as u128,
        }
    }

    /// Safety-buffered gas limit for an estimate
    pub fn buffered_limit(&self, estimate: u64) -> u64 {
        if self.limit_den == 0 {
            return estimate;
        }
        let scaled = estimate as u128 * self.limit_num as u128 / self.limit_den as u128;
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }
}
