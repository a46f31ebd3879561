//! Symbol metadata registry: per-instrument trading constants.
//!
//! Distances are configured in "points" and converted to price units by
//! dividing by the symbol's digit scale (`price = points / digits`).

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Registration input for one symbol, as it appears in run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSpec {
    pub symbol: String,
    /// Digit scale, e.g. 10000 for EURUSD, 100 for USDJPY, 10 for XAUUSD.
    pub digits: f64,
    pub tp_points: f64,
    pub sl_points: f64,
    pub spread_points: f64,
    pub lot: f64,
}

/// Trading constants for a registered symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolMetadata {
    pub symbol: String,
    /// Price-to-profit multiplier; also the divisor converting points to price.
    pub scale: f64,
    /// Default take-profit distance in price units.
    pub default_tp: f64,
    /// Default stop-loss distance in price units.
    pub default_sl: f64,
    /// Fixed spread in price units, paid on Buy entries.
    pub spread: f64,
    pub lot_size: f64,
}

impl SymbolMetadata {
    pub fn points_to_price(&self, points: f64) -> f64 {
        points / self.scale
    }

    pub fn default_tp_points(&self) -> f64 {
        self.default_tp * self.scale
    }

    pub fn default_sl_points(&self) -> f64 {
        self.default_sl * self.scale
    }
}

/// Lookup table from symbol name to [`SymbolMetadata`].
///
/// Built once before a simulation starts and handed to the engine; the engine
/// never mutates it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolRegistry {
    symbols: BTreeMap<String, SymbolMetadata>,
}

impl SymbolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from configuration specs, in order.
    pub fn from_specs<'a>(specs: impl IntoIterator<Item = &'a SymbolSpec>) -> Self {
        let mut registry = Self::new();
        for spec in specs {
            registry.register_spec(spec);
        }
        registry
    }

    /// Register a symbol. Re-registering an existing symbol silently overwrites it.
    pub fn register(
        &mut self,
        symbol: &str,
        digits: f64,
        tp_points: f64,
        sl_points: f64,
        spread_points: f64,
        lot: f64,
    ) -> &SymbolMetadata {
        let meta = SymbolMetadata {
            symbol: symbol.to_string(),
            scale: digits,
            default_tp: tp_points / digits,
            default_sl: sl_points / digits,
            spread: spread_points / digits,
            lot_size: lot,
        };
        self.symbols.insert(symbol.to_string(), meta);
        &self.symbols[symbol]
    }

    pub fn register_spec(&mut self, spec: &SymbolSpec) -> &SymbolMetadata {
        self.register(
            &spec.symbol,
            spec.digits,
            spec.tp_points,
            spec.sl_points,
            spec.spread_points,
            spec.lot,
        )
    }

    pub fn lookup(&self, symbol: &str) -> Result<&SymbolMetadata, EngineError> {
        self.symbols
            .get(symbol)
            .ok_or_else(|| EngineError::SymbolNotFound(symbol.to_string()))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains_key(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
