//! Calculation value store port trait.
//!
//! Parameters each indicator and strategy ran with, persisted between runs.
//! Entries are JSON objects so every indicator can carry its own fields.

use crate::domain::error::GoInvestError;
use crate::domain::indicator::{IndicatorName, StrategyName};
use serde_json::{Map, Value};

pub type ConfigEntry = Map<String, Value>;

/// Top-level section every config document must contain.
pub const CALC_SECTION: &str = "ValueInCalculation";

/// Field naming the strategy inside its own entry; stripped on read.
pub const STRATEGY_NAME_FIELD: &str = "strategy_name";

pub trait CalcConfigPort {
    /// Indicator entry, or `None` if the indicator never ran.
    /// Fails with `MissingConfigSection` if the document has no
    /// `ValueInCalculation` section.
    fn read_indicator(&self, indicator: IndicatorName)
    -> Result<Option<ConfigEntry>, GoInvestError>;

    /// Strategy entry without its `strategy_name` field.
    fn read_strategy(
        &self,
        indicator: IndicatorName,
        strategy: StrategyName,
    ) -> Result<Option<ConfigEntry>, GoInvestError>;

    /// Replaces the whole indicator entry, nested strategy entries included.
    fn write_indicator(
        &self,
        indicator: IndicatorName,
        entry: ConfigEntry,
    ) -> Result<(), GoInvestError>;

    /// Replaces one strategy entry under its indicator.
    fn write_strategy(
        &self,
        indicator: IndicatorName,
        strategy: StrategyName,
        entry: ConfigEntry,
    ) -> Result<(), GoInvestError>;
}
