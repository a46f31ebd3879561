//! Engine behaviour switches.

use crate::error::EngineError;
use chrono::Duration;

/// Profit multiplier converting price-scale units into account currency.
pub const DEFAULT_ACCOUNT_MULTIPLIER: f64 = 10.0;

/// Starting balance of a fresh engine.
pub const DEFAULT_INITIAL_BALANCE: f64 = 50_000.0;

/// Options selecting which order-management rules run each tick.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// Ratchet stop-losses toward price as it moves in the order's favour.
    pub use_trailing_stop: bool,
    /// Close orders once they have been held for `hold_duration`.
    pub use_time_based_close: bool,
    /// When false, orders carry no stop-loss at all.
    pub stop_loss_enabled: bool,
    /// Fraction of the take-profit distance kept as trailing distance, in `[0, 1]`.
    pub trail_fraction: f64,
    pub hold_duration: Duration,
    pub account_multiplier: f64,
    pub initial_balance: f64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            use_trailing_stop: false,
            use_time_based_close: false,
            stop_loss_enabled: true,
            trail_fraction: 0.0,
            hold_duration: Duration::zero(),
            account_multiplier: DEFAULT_ACCOUNT_MULTIPLIER,
            initial_balance: DEFAULT_INITIAL_BALANCE,
        }
    }
}

impl EngineOptions {
    /// Stop-loss, trailing stop and time-based close all enabled.
    pub fn full(trail_fraction: f64, hold_duration: Duration) -> Self {
        Self {
            use_trailing_stop: true,
            use_time_based_close: true,
            stop_loss_enabled: true,
            trail_fraction,
            hold_duration,
            ..Self::default()
        }
    }

    /// Orders exit only on take-profit or explicit close.
    pub fn take_profit_only() -> Self {
        Self {
            stop_loss_enabled: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(0.0..=1.0).contains(&self.trail_fraction) {
            return Err(EngineError::InvalidOptions(format!(
                "trail_fraction {} outside [0, 1]",
                self.trail_fraction
            )));
        }
        if !self.account_multiplier.is_finite() {
            return Err(EngineError::InvalidOptions(
                "account_multiplier must be finite".into(),
            ));
        }
        if !self.initial_balance.is_finite() {
            return Err(EngineError::InvalidOptions(
                "initial_balance must be finite".into(),
            ));
        }
        if self.use_time_based_close && self.hold_duration < Duration::zero() {
            return Err(EngineError::InvalidOptions(
                "hold_duration must not be negative".into(),
            ));
        }
        Ok(())
    }
}
