//! Serializable run configuration, loaded from TOML.
//!
//! ```toml
//! [engine]
//! use_trailing_stop = true
//! trail_fraction = 0.5
//!
//! [data]
//! dir = "data"
//! reference_symbol = "EURUSD"
//!
//! [run]
//! start = "2024-01-02T00:00:00"
//! end = "2024-01-05T00:00:00"
//! tick_minutes = 1
//!
//! [[symbols]]
//! symbol = "EURUSD"
//! digits = 10000
//! tp_points = 50
//! sl_points = 30
//! spread_points = 10
//! lot = 0.1
//!
//! [[orders]]
//! at = "2024-01-02T10:00:00"
//! side = "Buy"
//! symbol = "EURUSD"
//! volume = 1.0
//! ```

use backsim_core::{EngineOptions, Side, SymbolRegistry, SymbolSpec};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

/// Timestamp format used by the CSV loader unless the config overrides it.
pub const DEFAULT_DATE_FORMAT: &str = "%Y.%m.%d %H:%M";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything needed to reproduce one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestConfig {
    #[serde(default)]
    pub engine: EngineSection,
    pub data: DataSection,
    pub run: RunSection,
    pub symbols: Vec<SymbolSpec>,
    /// The order plan: entries are placed once the clock reaches `at`.
    #[serde(default)]
    pub orders: Vec<PlannedOrder>,
}

/// Engine switches as they appear in `[engine]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineSection {
    pub use_trailing_stop: bool,
    pub use_time_based_close: bool,
    pub stop_loss_enabled: bool,
    pub trail_fraction: f64,
    /// Holding-time limit for time-based close.
    pub hold_minutes: i64,
    pub account_multiplier: f64,
    pub initial_balance: f64,
}

impl Default for EngineSection {
    fn default() -> Self {
        let options = EngineOptions::default();
        Self {
            use_trailing_stop: options.use_trailing_stop,
            use_time_based_close: options.use_time_based_close,
            stop_loss_enabled: options.stop_loss_enabled,
            trail_fraction: options.trail_fraction,
            hold_minutes: options.hold_duration.num_minutes(),
            account_multiplier: options.account_multiplier,
            initial_balance: options.initial_balance,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataSection {
    /// Directory holding one `<SYMBOL>.csv` per registered symbol.
    pub dir: PathBuf,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Symbol whose data drives gap skipping. Defaults to the first `[[symbols]]` entry.
    #[serde(default)]
    pub reference_symbol: Option<String>,
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSection {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default = "default_tick_minutes")]
    pub tick_minutes: i64,
    /// Close everything still open when the run reaches `end`.
    #[serde(default = "default_true")]
    pub close_at_end: bool,
}

fn default_tick_minutes() -> i64 {
    1
}

fn default_true() -> bool {
    true
}

/// One scripted order. Distances default to the symbol's registered values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedOrder {
    pub at: NaiveDateTime,
    pub side: Side,
    pub symbol: String,
    pub volume: f64,
    #[serde(default)]
    pub tp_points: Option<f64>,
    #[serde(default)]
    pub sl_points: Option<f64>,
    #[serde(default)]
    pub label: Option<String>,
}

impl BacktestConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Deterministic hash of the canonical JSON form of this config.
    ///
    /// Two runs with identical configs share a run id.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    pub fn reference_symbol(&self) -> Option<&str> {
        self.data
            .reference_symbol
            .as_deref()
            .or_else(|| self.symbols.first().map(|s| s.symbol.as_str()))
    }

    pub fn symbol_names(&self) -> Vec<&str> {
        self.symbols.iter().map(|s| s.symbol.as_str()).collect()
    }

    pub fn tick_delta(&self) -> Duration {
        Duration::minutes(self.run.tick_minutes)
    }

    pub fn to_engine_options(&self) -> EngineOptions {
        let e = &self.engine;
        EngineOptions {
            use_trailing_stop: e.use_trailing_stop,
            use_time_based_close: e.use_time_based_close,
            stop_loss_enabled: e.stop_loss_enabled,
            trail_fraction: e.trail_fraction,
            hold_duration: Duration::minutes(e.hold_minutes),
            account_multiplier: e.account_multiplier,
            initial_balance: e.initial_balance,
        }
    }

    pub fn registry(&self) -> SymbolRegistry {
        SymbolRegistry::from_specs(&self.symbols)
    }

    /// Check the config for problems that would only surface mid-run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::Invalid("at least one [[symbols]] entry is required".into()));
        }

        let mut seen = BTreeSet::new();
        for spec in &self.symbols {
            if !seen.insert(spec.symbol.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "symbol '{}' is registered twice",
                    spec.symbol
                )));
            }
            if !(spec.digits.is_finite() && spec.digits > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "symbol '{}' has non-positive digits {}",
                    spec.symbol, spec.digits
                )));
            }
        }

        match self.reference_symbol() {
            Some(reference) if seen.contains(reference) => {}
            Some(reference) => {
                return Err(ConfigError::Invalid(format!(
                    "reference symbol '{reference}' is not registered"
                )))
            }
            None => return Err(ConfigError::Invalid("no reference symbol".into())),
        }

        if self.run.tick_minutes <= 0 {
            return Err(ConfigError::Invalid(format!(
                "tick_minutes must be positive, got {}",
                self.run.tick_minutes
            )));
        }
        if self.run.start >= self.run.end {
            return Err(ConfigError::Invalid(format!(
                "run start {} must be before end {}",
                self.run.start, self.run.end
            )));
        }

        self.to_engine_options()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        for (i, planned) in self.orders.iter().enumerate() {
            if !seen.contains(planned.symbol.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "order #{i} uses unregistered symbol '{}'",
                    planned.symbol
                )));
            }
            if !(planned.volume.is_finite() && planned.volume > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "order #{i} has non-positive volume {}",
                    planned.volume
                )));
            }
        }

        Ok(())
    }
}
