//! Indicator cache port trait.
//!
//! Entries are addressed by an explicit [`IndicatorKey`] rather than by
//! matching fragments of file names, so one instrument code being a prefix of
//! another never causes the wrong entry to be read or invalidated.

use crate::domain::error::GoInvestError;
use crate::domain::indicator::{IndicatorName, IndicatorTable, StrategyName};
use crate::domain::price::{Period, ProductType};
use crate::domain::signal::JudgmentTable;
use chrono::NaiveDate;

/// Identity of one persisted indicator table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndicatorKey {
    pub product_type: ProductType,
    pub code: String,
    pub period: Period,
    pub indicator: IndicatorName,
    pub date: NaiveDate,
}

impl IndicatorKey {
    /// True when `other` names the same series, whatever its date.
    pub fn same_series(&self, other: &IndicatorKey) -> bool {
        self.product_type == other.product_type
            && self.code == other.code
            && self.period == other.period
            && self.indicator == other.indicator
    }
}

pub trait IndicatorStore {
    fn put(&self, key: &IndicatorKey, table: &IndicatorTable) -> Result<(), GoInvestError>;

    fn get(&self, key: &IndicatorKey) -> Result<Option<IndicatorTable>, GoInvestError>;

    /// Most recent entry of the series named by `key` dated on or before
    /// `key.date`.
    fn latest(&self, key: &IndicatorKey) -> Result<Option<IndicatorTable>, GoInvestError>;

    /// Removes every entry of the series named by `key` whose date differs
    /// from `key.date`. Returns the number of entries removed.
    fn invalidate_stale(&self, key: &IndicatorKey) -> Result<usize, GoInvestError>;

    fn put_judgment(
        &self,
        product_type: ProductType,
        code: &str,
        indicator: IndicatorName,
        strategy: StrategyName,
        table: &JudgmentTable,
    ) -> Result<(), GoInvestError>;
}
